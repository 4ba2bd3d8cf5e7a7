//! The load-event forwarder.
//!
//! `Forwarder` holds a durable reference to one listener object and turns
//! every native load callback into a call on that listener. Each notification
//! attaches to the runtime, translates its arguments, calls the listener and
//! releases whatever it translated. A missing environment or an enum value the
//! listener runtime cannot represent drops the notification without the
//! listener ever hearing about it.

use std::mem::ManuallyDrop;
use std::sync::Arc;

use loadbridge_common::{BridgeError, Browser, ErrorCode, Frame, TransitionType};
use tracing::{debug, trace, warn};

use crate::bridge::{RuntimeBridge, RuntimeEnv};
use crate::events::LoadEvent;
use crate::handler::LoadHandler;
use crate::listener::{
    ListenerMethod, ON_LOADING_STATE_CHANGE, ON_LOAD_END, ON_LOAD_ERROR, ON_LOAD_START,
};

mod transients;

use transients::{Param, Transients};

/// Outcome of a single notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// The listener method was invoked and returned normally.
    Delivered,
    /// The listener method was invoked and failed (e.g. threw).
    ListenerFailed,
    /// The listener was never invoked.
    Dropped(DropReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// No execution environment for the current thread.
    EnvUnavailable,
    /// An enum argument has no counterpart in the listener runtime.
    Untranslatable(&'static str),
    /// The bridge failed to build an argument.
    BridgeFailure,
}

/// Why a notification did not complete.
enum Undelivered {
    Untranslatable(&'static str),
    Bridge(BridgeError),
    Listener(BridgeError),
}

impl From<BridgeError> for Undelivered {
    fn from(e: BridgeError) -> Self {
        Self::Bridge(e)
    }
}

/// Forwards native load callbacks to a listener in another runtime.
///
/// Notification methods take `&self` and may run concurrently on any engine
/// thread. Dropping the forwarder releases the listener reference; ownership
/// guarantees no notification is in flight at that point.
pub struct Forwarder<B: RuntimeBridge> {
    bridge: Arc<B>,
    listener: ManuallyDrop<B::Global>,
}

impl<B: RuntimeBridge> Forwarder<B> {
    /// Take a durable reference to `listener`, a value living in `env`.
    pub fn new<E>(bridge: Arc<B>, env: &mut E, listener: &E::Value) -> Result<Self, BridgeError>
    where
        E: RuntimeEnv<Global = B::Global>,
    {
        let listener = env.new_global(listener)?;
        debug!("load listener attached");
        Ok(Self {
            bridge,
            listener: ManuallyDrop::new(listener),
        })
    }

    /// Forward a recorded native callback and report what happened to it.
    pub fn forward(&self, event: &LoadEvent) -> Delivery {
        let browser = event.browser();
        match event {
            LoadEvent::LoadingStateChange {
                is_loading,
                can_go_back,
                can_go_forward,
                ..
            } => self.forward_loading_state_change(&browser, *is_loading, *can_go_back, *can_go_forward),
            LoadEvent::LoadStart {
                frame,
                transition_type,
                ..
            } => self.forward_load_start(&browser, frame.as_ref(), *transition_type),
            LoadEvent::LoadEnd {
                frame,
                http_status_code,
                ..
            } => self.forward_load_end(&browser, frame.as_ref(), *http_status_code),
            LoadEvent::LoadError {
                frame,
                error_code,
                failed_url,
                ..
            } => self.forward_load_error(
                &browser,
                frame.as_ref(),
                *error_code,
                &event.error_text(),
                failed_url,
            ),
        }
    }

    /// Forward a loading-state change. The three flags pass through as-is.
    pub fn forward_loading_state_change(
        &self,
        browser: &Browser,
        is_loading: bool,
        can_go_back: bool,
        can_go_forward: bool,
    ) -> Delivery {
        let method = &ON_LOADING_STATE_CHANGE;
        let Some(mut env) = self.bridge.current_env() else {
            return dropped(method, browser, DropReason::EnvUnavailable);
        };

        let outcome = loading_state_change(
            &mut env,
            &*self.listener,
            browser,
            is_loading,
            can_go_back,
            can_go_forward,
        );
        finish(method, browser, outcome)
    }

    /// Forward the start of a navigation.
    ///
    /// The transition type is translated before anything else, so an unknown
    /// transition costs no frame or browser wrappers. Only the enum constant
    /// reaches the listener; qualifier flags are not part of the contract.
    pub fn forward_load_start(
        &self,
        browser: &Browser,
        frame: Option<&Frame>,
        transition_type: TransitionType,
    ) -> Delivery {
        let method = &ON_LOAD_START;
        let Some(mut env) = self.bridge.current_env() else {
            return dropped(method, browser, DropReason::EnvUnavailable);
        };

        let outcome = load_start(&mut env, &*self.listener, browser, frame, transition_type);
        finish(method, browser, outcome)
    }

    /// Forward the end of a navigation with its HTTP status code.
    pub fn forward_load_end(
        &self,
        browser: &Browser,
        frame: Option<&Frame>,
        http_status_code: i32,
    ) -> Delivery {
        let method = &ON_LOAD_END;
        let Some(mut env) = self.bridge.current_env() else {
            return dropped(method, browser, DropReason::EnvUnavailable);
        };

        let outcome = load_end(&mut env, &*self.listener, browser, frame, http_status_code);
        finish(method, browser, outcome)
    }

    /// Forward a failed navigation.
    pub fn forward_load_error(
        &self,
        browser: &Browser,
        frame: Option<&Frame>,
        error_code: ErrorCode,
        error_text: &str,
        failed_url: &str,
    ) -> Delivery {
        let method = &ON_LOAD_ERROR;
        let Some(mut env) = self.bridge.current_env() else {
            return dropped(method, browser, DropReason::EnvUnavailable);
        };

        let outcome = load_error(
            &mut env, &*self.listener, browser, frame, error_code, error_text, failed_url,
        );
        finish(method, browser, outcome)
    }
}

impl<B: RuntimeBridge> Drop for Forwarder<B> {
    fn drop(&mut self) {
        // The destroying thread may differ from the creating one, so attach
        // afresh instead of reusing any earlier context.
        match self.bridge.current_env() {
            Some(mut env) => {
                // SAFETY: `listener` is taken exactly once, here, and the
                // field is never read again.
                let listener = unsafe { ManuallyDrop::take(&mut self.listener) };
                env.release_global(listener);
                debug!("load listener released");
            }
            None => {
                // Left in its ManuallyDrop: the reference leaks.
                warn!("no execution environment at teardown, listener reference leaked");
            }
        }
    }
}

impl<B: RuntimeBridge> LoadHandler for Forwarder<B> {
    fn on_loading_state_change(
        &self,
        browser: &Browser,
        is_loading: bool,
        can_go_back: bool,
        can_go_forward: bool,
    ) {
        self.forward_loading_state_change(browser, is_loading, can_go_back, can_go_forward);
    }

    fn on_load_start(&self, browser: &Browser, frame: Option<&Frame>, transition_type: TransitionType) {
        self.forward_load_start(browser, frame, transition_type);
    }

    fn on_load_end(&self, browser: &Browser, frame: Option<&Frame>, http_status_code: i32) {
        self.forward_load_end(browser, frame, http_status_code);
    }

    fn on_load_error(
        &self,
        browser: &Browser,
        frame: Option<&Frame>,
        error_code: ErrorCode,
        error_text: &str,
        failed_url: &str,
    ) {
        self.forward_load_error(browser, frame, error_code, error_text, failed_url);
    }
}

// =============================================================================
// NOTIFICATIONS
// =============================================================================

fn loading_state_change<E: RuntimeEnv>(
    env: &mut E,
    listener: &E::Global,
    browser: &Browser,
    is_loading: bool,
    can_go_back: bool,
    can_go_forward: bool,
) -> Result<(), Undelivered> {
    let mut scope = Transients::new(env);
    let browser = scope.translate(|env| env.browser(browser))?;

    scope
        .call(
            listener,
            &ON_LOADING_STATE_CHANGE,
            &[
                Param::Held(browser),
                Param::Bool(is_loading),
                Param::Bool(can_go_back),
                Param::Bool(can_go_forward),
            ],
        )
        .map_err(Undelivered::Listener)
}

fn load_start<E: RuntimeEnv>(
    env: &mut E,
    listener: &E::Global,
    browser: &Browser,
    frame: Option<&Frame>,
    transition_type: TransitionType,
) -> Result<(), Undelivered> {
    let mut scope = Transients::new(env);
    let transition_type = scope.translate(|env| {
        env.transition_type(transition_type)
            .ok_or(Undelivered::Untranslatable("transition type"))
    })?;
    let frame = frame
        .map(|frame| scope.translate(|env| env.frame(frame)))
        .transpose()?;
    let browser = scope.translate(|env| env.browser(browser))?;

    scope
        .call(
            listener,
            &ON_LOAD_START,
            &[
                Param::Held(browser),
                frame.into(),
                Param::Held(transition_type),
            ],
        )
        .map_err(Undelivered::Listener)
}

fn load_end<E: RuntimeEnv>(
    env: &mut E,
    listener: &E::Global,
    browser: &Browser,
    frame: Option<&Frame>,
    http_status_code: i32,
) -> Result<(), Undelivered> {
    let mut scope = Transients::new(env);
    let frame = frame
        .map(|frame| scope.translate(|env| env.frame(frame)))
        .transpose()?;
    let browser = scope.translate(|env| env.browser(browser))?;

    scope
        .call(
            listener,
            &ON_LOAD_END,
            &[
                Param::Held(browser),
                frame.into(),
                Param::Int(http_status_code),
            ],
        )
        .map_err(Undelivered::Listener)
}

fn load_error<E: RuntimeEnv>(
    env: &mut E,
    listener: &E::Global,
    browser: &Browser,
    frame: Option<&Frame>,
    error_code: ErrorCode,
    error_text: &str,
    failed_url: &str,
) -> Result<(), Undelivered> {
    let mut scope = Transients::new(env);
    let frame = frame
        .map(|frame| scope.translate(|env| env.frame(frame)))
        .transpose()?;
    let error_text = scope.translate(|env| env.string(error_text))?;
    let failed_url = scope.translate(|env| env.string(failed_url))?;
    let browser = scope.translate(|env| env.browser(browser))?;
    let error_code = scope.translate(|env| {
        env.error_code(error_code)
            .ok_or(Undelivered::Untranslatable("error code"))
    })?;

    scope
        .call(
            listener,
            &ON_LOAD_ERROR,
            &[
                Param::Held(browser),
                frame.into(),
                Param::Held(error_code),
                Param::Held(error_text),
                Param::Held(failed_url),
            ],
        )
        .map_err(Undelivered::Listener)
}

fn dropped(method: &ListenerMethod, browser: &Browser, reason: DropReason) -> Delivery {
    trace!(method = method.name, browser_id = browser.id.0, ?reason, "notification dropped");
    Delivery::Dropped(reason)
}

fn finish(
    method: &ListenerMethod,
    browser: &Browser,
    outcome: Result<(), Undelivered>,
) -> Delivery {
    match outcome {
        Ok(()) => {
            trace!(method = method.name, browser_id = browser.id.0, "notification delivered");
            Delivery::Delivered
        }
        Err(Undelivered::Listener(e)) => {
            debug!(method = method.name, browser_id = browser.id.0, "listener failed: {e}");
            Delivery::ListenerFailed
        }
        Err(Undelivered::Untranslatable(what)) => {
            dropped(method, browser, DropReason::Untranslatable(what))
        }
        Err(Undelivered::Bridge(e)) => {
            warn!(method = method.name, browser_id = browser.id.0, "bridge failure: {e}");
            Delivery::Dropped(DropReason::BridgeFailure)
        }
    }
}

#[cfg(test)]
mod tests;
