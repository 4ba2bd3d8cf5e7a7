//! Forwards browser load lifecycle callbacks into a listener object that
//! lives in another runtime.
//!
//! The pieces:
//! - [`RuntimeBridge`] / [`RuntimeEnv`]: the injected translation service
//!   that turns native handles, enums and strings into listener-runtime values
//! - [`Forwarder`]: owns the durable listener reference and implements the
//!   native [`LoadHandler`] callbacks
//! - [`listener`]: the listener method table (names and signatures)
//! - [`RecordingBridge`]: an in-process runtime that journals everything
//! - `JniBridge` (feature `jni`): the Java runtime

pub mod bridge;
pub mod config;
pub mod events;
pub mod forwarder;
pub mod handler;
#[cfg(feature = "jni")]
pub mod jni_bridge;
pub mod listener;
pub mod recording;

pub use bridge::{Arg, RuntimeBridge, RuntimeEnv};
pub use config::{load_config, LoadBridgeConfig};
pub use events::LoadEvent;
pub use forwarder::{Delivery, DropReason, Forwarder};
pub use handler::LoadHandler;
#[cfg(feature = "jni")]
pub use jni_bridge::JniBridge;
pub use listener::ListenerMethod;
pub use recording::RecordingBridge;
