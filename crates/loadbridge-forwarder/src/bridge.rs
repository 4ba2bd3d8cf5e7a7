//! The translation service between the native engine and the listener
//! runtime.
//!
//! A [`RuntimeBridge`] hands out a [`RuntimeEnv`] for the calling thread.
//! Everything that crosses into the listener runtime goes through the env:
//! durable (global) references, transient values, and the method call
//! itself.

use loadbridge_common::{BridgeError, Browser, ErrorCode, Frame, TransitionType};

use crate::listener::ListenerMethod;

/// Entry point into a listener runtime.
pub trait RuntimeBridge: Send + Sync {
    /// Durable reference, valid across callbacks and threads until released.
    type Global: Send + Sync;

    /// An execution context attached to the current thread.
    type Env<'a>: RuntimeEnv<Global = Self::Global>
    where
        Self: 'a;

    /// The execution context for the current thread.
    ///
    /// `None` is a normal outcome, typically while the runtime shuts down.
    fn current_env(&self) -> Option<Self::Env<'_>>;
}

/// Operations available inside an attached execution context.
pub trait RuntimeEnv {
    type Global;

    /// A transient value. Consumed by [`RuntimeEnv::release`], so it can be
    /// released at most once.
    type Value;

    fn new_global(&mut self, object: &Self::Value) -> Result<Self::Global, BridgeError>;

    fn release_global(&mut self, global: Self::Global);

    /// The listener-runtime wrapper for a browser.
    fn browser(&mut self, browser: &Browser) -> Result<Self::Value, BridgeError>;

    /// A fresh listener-runtime wrapper for a frame.
    fn frame(&mut self, frame: &Frame) -> Result<Self::Value, BridgeError>;

    /// The enum constant for a transition type, or `None` if the listener
    /// runtime has no constant for it.
    fn transition_type(&mut self, transition: TransitionType) -> Option<Self::Value>;

    /// The enum constant for an error code, or `None` if unmapped.
    fn error_code(&mut self, code: ErrorCode) -> Option<Self::Value>;

    fn string(&mut self, s: &str) -> Result<Self::Value, BridgeError>;

    /// Invoke a void method on `target`, passing `args` positionally.
    fn call_void(
        &mut self,
        target: &Self::Global,
        method: &ListenerMethod,
        args: &[Arg<'_, Self::Value>],
    ) -> Result<(), BridgeError>;

    fn release(&mut self, value: Self::Value);
}

/// A positional argument to a listener call.
#[derive(Debug)]
pub enum Arg<'a, V> {
    Object(&'a V),
    Null,
    Bool(bool),
    Int(i32),
}

impl<V> Clone for Arg<'_, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<V> Copy for Arg<'_, V> {}
