pub mod errors;
pub mod id;
pub mod types;

pub use errors::{BridgeError, ConfigError, LoadBridgeError};
pub use id::{BrowserId, FrameId};
pub use types::{
    Browser, ErrorCode, Frame, TransitionQualifiers, TransitionSource, TransitionType,
};

pub type Result<T> = std::result::Result<T, LoadBridgeError>;
