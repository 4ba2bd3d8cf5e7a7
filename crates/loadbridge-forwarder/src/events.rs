//! Native load callbacks as plain data.

use loadbridge_common::{Browser, BrowserId, ErrorCode, Frame, TransitionType};
use serde::{Deserialize, Serialize};

use crate::handler::LoadHandler;

/// One native load callback with its arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LoadEvent {
    LoadingStateChange {
        browser: BrowserId,
        is_loading: bool,
        #[serde(default)]
        can_go_back: bool,
        #[serde(default)]
        can_go_forward: bool,
    },
    LoadStart {
        browser: BrowserId,
        #[serde(default)]
        frame: Option<Frame>,
        #[serde(default = "link_transition")]
        transition_type: TransitionType,
    },
    LoadEnd {
        browser: BrowserId,
        #[serde(default)]
        frame: Option<Frame>,
        http_status_code: i32,
    },
    LoadError {
        browser: BrowserId,
        #[serde(default)]
        frame: Option<Frame>,
        error_code: ErrorCode,
        /// Defaults to the network stack's text for `error_code`.
        #[serde(default)]
        error_text: Option<String>,
        failed_url: String,
    },
}

fn link_transition() -> TransitionType {
    TransitionType(0)
}

impl LoadEvent {
    pub fn browser(&self) -> Browser {
        let id = match self {
            Self::LoadingStateChange { browser, .. }
            | Self::LoadStart { browser, .. }
            | Self::LoadEnd { browser, .. }
            | Self::LoadError { browser, .. } => *browser,
        };
        Browser { id }
    }

    /// Name of the native callback this event stands for.
    pub fn callback_name(&self) -> &'static str {
        match self {
            Self::LoadingStateChange { .. } => "on_loading_state_change",
            Self::LoadStart { .. } => "on_load_start",
            Self::LoadEnd { .. } => "on_load_end",
            Self::LoadError { .. } => "on_load_error",
        }
    }

    /// Deliver this event to `handler` through the matching callback.
    pub fn dispatch<H: LoadHandler + ?Sized>(&self, handler: &H) {
        let browser = self.browser();
        match self {
            Self::LoadingStateChange {
                is_loading,
                can_go_back,
                can_go_forward,
                ..
            } => handler.on_loading_state_change(&browser, *is_loading, *can_go_back, *can_go_forward),
            Self::LoadStart {
                frame,
                transition_type,
                ..
            } => handler.on_load_start(&browser, frame.as_ref(), *transition_type),
            Self::LoadEnd {
                frame,
                http_status_code,
                ..
            } => handler.on_load_end(&browser, frame.as_ref(), *http_status_code),
            Self::LoadError {
                frame,
                error_code,
                failed_url,
                ..
            } => handler.on_load_error(
                &browser,
                frame.as_ref(),
                *error_code,
                &self.error_text(),
                failed_url,
            ),
        }
    }

    /// Error text of a `LoadError`, defaulting to the network stack's text
    /// for its code. Empty for every other event.
    pub fn error_text(&self) -> String {
        match self {
            Self::LoadError {
                error_code,
                error_text,
                ..
            } => error_text
                .clone()
                .unwrap_or_else(|| error_code.description()),
            _ => String::new(),
        }
    }
}
