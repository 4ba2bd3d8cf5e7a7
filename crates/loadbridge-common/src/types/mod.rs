//! Native-side values delivered by the browser engine's load callbacks.

mod error_code;
mod handles;
mod transition;

pub use error_code::ErrorCode;
pub use handles::{Browser, Frame};
pub use transition::{TransitionQualifiers, TransitionSource, TransitionType};
