use loadbridge_common::{Browser, ErrorCode, Frame, TransitionType};

/// The native load callbacks, as the browser engine delivers them.
///
/// Implementations are called on engine threads, possibly concurrently.
pub trait LoadHandler {
    fn on_loading_state_change(
        &self,
        browser: &Browser,
        is_loading: bool,
        can_go_back: bool,
        can_go_forward: bool,
    );

    fn on_load_start(&self, browser: &Browser, frame: Option<&Frame>, transition_type: TransitionType);

    fn on_load_end(&self, browser: &Browser, frame: Option<&Frame>, http_status_code: i32);

    fn on_load_error(
        &self,
        browser: &Browser,
        frame: Option<&Frame>,
        error_code: ErrorCode,
        error_text: &str,
        failed_url: &str,
    );
}
