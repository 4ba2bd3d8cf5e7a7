//! Tests for notification forwarding, drop semantics and reference hygiene.

use std::collections::HashMap;
use std::sync::Arc;

use loadbridge_common::{BrowserId, FrameId, TransitionQualifiers, TransitionSource};

use super::*;
use crate::bridge::Arg;
use crate::listener::ALL;
use crate::recording::{
    JournalEntry, ManagedValue, RecordedArg, RecordingBridge, ERROR_CODE_CLASS,
    TRANSITION_TYPE_CLASS,
};

fn setup() -> (Arc<RecordingBridge>, Forwarder<RecordingBridge>) {
    let bridge = Arc::new(RecordingBridge::new());
    let forwarder = bridge.forwarder("client").unwrap();
    bridge.clear_journal();
    (bridge, forwarder)
}

fn browser() -> Browser {
    Browser::new(1)
}

fn main_frame() -> Frame {
    Frame::main("main", "https://example.com/")
}

/// Short label for a managed value, for order assertions.
fn label(value: &ManagedValue) -> String {
    match value {
        ManagedValue::Listener { name } => format!("listener:{name}"),
        ManagedValue::Browser { id } => format!("browser:{}", id.0),
        ManagedValue::Frame { id, .. } => format!("frame:{id}"),
        ManagedValue::Enum { constant, .. } => format!("enum:{constant}"),
        ManagedValue::Str { value } => format!("str:{value}"),
    }
}

/// Labels of translated values, in acquisition order.
fn acquired(bridge: &RecordingBridge) -> Vec<String> {
    bridge
        .journal()
        .iter()
        .filter_map(|e| match e {
            JournalEntry::Translate { value, .. } => Some(label(value)),
            _ => None,
        })
        .collect()
}

/// Labels of released values, in release order.
fn released(bridge: &RecordingBridge) -> Vec<String> {
    let mut by_handle = HashMap::new();
    let mut out = Vec::new();
    for entry in bridge.journal() {
        match entry {
            JournalEntry::Translate { handle, value } => {
                by_handle.insert(handle, label(&value));
            }
            JournalEntry::Release { handle } => {
                out.push(by_handle.get(&handle).cloned().unwrap_or_default());
            }
            _ => {}
        }
    }
    out
}

fn enum_arg(class: &'static str, constant: &'static str) -> RecordedArg {
    RecordedArg::Object(ManagedValue::Enum { class, constant })
}

fn browser_arg(id: i32) -> RecordedArg {
    RecordedArg::Object(ManagedValue::Browser { id: BrowserId(id) })
}

fn frame_arg(frame: &Frame) -> RecordedArg {
    RecordedArg::Object(ManagedValue::Frame {
        id: frame.id.clone(),
        url: frame.url.clone(),
        is_main: frame.is_main,
    })
}

fn str_arg(s: &str) -> RecordedArg {
    RecordedArg::Object(ManagedValue::Str {
        value: s.to_string(),
    })
}

// -- Loading state --

#[test]
fn loading_state_booleans_pass_through() {
    let (bridge, fwd) = setup();
    for bits in 0..8u8 {
        let (loading, back, forward) = (bits & 1 != 0, bits & 2 != 0, bits & 4 != 0);
        let delivery = fwd.forward_loading_state_change(&browser(), loading, back, forward);
        assert_eq!(delivery, Delivery::Delivered);

        let call = bridge.calls().pop().unwrap();
        assert_eq!(call.method, "onLoadingStateChange");
        assert_eq!(
            call.args,
            vec![
                browser_arg(1),
                RecordedArg::Bool(loading),
                RecordedArg::Bool(back),
                RecordedArg::Bool(forward),
            ]
        );
    }
    assert_eq!(bridge.live_values(), 0);
}

#[test]
fn loading_state_translates_only_browser() {
    let (bridge, fwd) = setup();
    fwd.forward_loading_state_change(&browser(), true, false, false);
    assert_eq!(acquired(&bridge), vec!["browser:1"]);
    assert_eq!(released(&bridge), vec!["browser:1"]);
}

// -- Load start --

#[test]
fn load_start_passes_browser_frame_transition() {
    let (bridge, fwd) = setup();
    let frame = main_frame();
    let delivery = fwd.forward_load_start(&browser(), Some(&frame), TransitionType(0));
    assert_eq!(delivery, Delivery::Delivered);

    let calls = bridge.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].listener, "client");
    assert_eq!(calls[0].method, "onLoadStart");
    assert_eq!(
        calls[0].args,
        vec![
            browser_arg(1),
            frame_arg(&frame),
            enum_arg(TRANSITION_TYPE_CLASS, "TT_LINK"),
        ]
    );
}

#[test]
fn load_start_translates_transition_first() {
    let (bridge, fwd) = setup();
    fwd.forward_load_start(&browser(), Some(&main_frame()), TransitionType(1));
    assert_eq!(
        acquired(&bridge),
        vec!["enum:TT_EXPLICIT", "frame:main", "browser:1"]
    );
    assert_eq!(
        released(&bridge),
        vec!["browser:1", "frame:main", "enum:TT_EXPLICIT"]
    );
}

#[test]
fn load_start_unknown_transition_drops_before_other_translation() {
    let (bridge, fwd) = setup();
    let delivery = fwd.forward_load_start(&browser(), Some(&main_frame()), TransitionType(0x42));
    assert_eq!(
        delivery,
        Delivery::Dropped(DropReason::Untranslatable("transition type"))
    );
    assert!(bridge.calls().is_empty());
    assert!(acquired(&bridge).is_empty());
    assert_eq!(bridge.live_values(), 0);
}

#[test]
fn load_start_unmapped_transition_drops() {
    let (bridge, fwd) = setup();
    bridge.unmap_transition_source(TransitionSource::FormSubmit);
    let delivery = fwd.forward_load_start(&browser(), None, TransitionType(7));
    assert!(matches!(delivery, Delivery::Dropped(DropReason::Untranslatable(_))));
    assert!(bridge.calls().is_empty());
    assert!(acquired(&bridge).is_empty());
}

#[test]
fn load_start_withholds_qualifiers() {
    let (bridge, fwd) = setup();
    let tt = TransitionType::new(
        TransitionSource::Link,
        TransitionQualifiers::SERVER_REDIRECT | TransitionQualifiers::CHAIN_END,
    );
    fwd.forward_load_start(&browser(), None, tt);
    let call = bridge.calls().pop().unwrap();
    assert_eq!(call.args[2], enum_arg(TRANSITION_TYPE_CLASS, "TT_LINK"));
}

#[test]
fn load_start_without_frame_passes_null() {
    let (bridge, fwd) = setup();
    fwd.forward_load_start(&browser(), None, TransitionType(0));
    let call = bridge.calls().pop().unwrap();
    assert_eq!(call.args[1], RecordedArg::Null);
    assert_eq!(acquired(&bridge), vec!["enum:TT_LINK", "browser:1"]);
    assert_eq!(bridge.live_values(), 0);
}

// -- Load end --

#[test]
fn load_end_passes_status_code() {
    let (bridge, fwd) = setup();
    let frame = main_frame();
    for status in [200, 0, 404, -1] {
        assert_eq!(
            fwd.forward_load_end(&browser(), Some(&frame), status),
            Delivery::Delivered
        );
        let call = bridge.calls().pop().unwrap();
        assert_eq!(call.method, "onLoadEnd");
        assert_eq!(
            call.args,
            vec![browser_arg(1), frame_arg(&frame), RecordedArg::Int(status)]
        );
    }
    assert_eq!(bridge.live_values(), 0);
}

// -- Load error --

#[test]
fn load_error_passes_five_args_in_order() {
    let (bridge, fwd) = setup();
    let frame = main_frame();
    let delivery = fwd.forward_load_error(
        &browser(),
        Some(&frame),
        ErrorCode::NAME_NOT_RESOLVED,
        "net::ERR_NAME_NOT_RESOLVED",
        "http://invalid.example",
    );
    assert_eq!(delivery, Delivery::Delivered);

    let call = bridge.calls().pop().unwrap();
    assert_eq!(call.method, "onLoadError");
    assert_eq!(
        call.args,
        vec![
            browser_arg(1),
            frame_arg(&frame),
            enum_arg(ERROR_CODE_CLASS, "ERR_NAME_NOT_RESOLVED"),
            str_arg("net::ERR_NAME_NOT_RESOLVED"),
            str_arg("http://invalid.example"),
        ]
    );
}

#[test]
fn load_error_releases_in_reverse_acquisition_order() {
    let (bridge, fwd) = setup();
    fwd.forward_load_error(
        &browser(),
        Some(&main_frame()),
        ErrorCode::TIMED_OUT,
        "timed out",
        "https://slow.example/",
    );

    let acquired = acquired(&bridge);
    assert_eq!(
        acquired,
        vec![
            "frame:main",
            "str:timed out",
            "str:https://slow.example/",
            "browser:1",
            "enum:ERR_TIMED_OUT",
        ]
    );
    let mut expected = acquired.clone();
    expected.reverse();
    assert_eq!(released(&bridge), expected);
    assert_eq!(bridge.live_values(), 0);
}

#[test]
fn load_error_releases_everything_when_listener_throws() {
    let (bridge, fwd) = setup();
    bridge.throw_from(&ON_LOAD_ERROR);
    let delivery = fwd.forward_load_error(
        &browser(),
        Some(&main_frame()),
        ErrorCode::FAILED,
        "failed",
        "https://example.com/",
    );
    assert_eq!(delivery, Delivery::ListenerFailed);
    assert!(bridge.calls()[0].threw);
    assert_eq!(released(&bridge).len(), 5);
    assert_eq!(bridge.live_values(), 0);
}

#[test]
fn load_error_unmapped_code_drops_and_cleans_up() {
    let (bridge, fwd) = setup();
    let delivery = fwd.forward_load_error(
        &browser(),
        Some(&main_frame()),
        ErrorCode(-9999),
        "weird",
        "https://example.com/",
    );
    assert_eq!(
        delivery,
        Delivery::Dropped(DropReason::Untranslatable("error code"))
    );
    assert!(bridge.calls().is_empty());
    assert_eq!(released(&bridge).len(), 4);
    assert_eq!(bridge.live_values(), 0);
}

// -- Environment --

#[test]
fn no_environment_drops_everything_silently() {
    let (bridge, fwd) = setup();
    bridge.set_env_available(false);
    let frame = main_frame();

    let deliveries = [
        fwd.forward_loading_state_change(&browser(), true, true, true),
        fwd.forward_load_start(&browser(), Some(&frame), TransitionType(0)),
        fwd.forward_load_end(&browser(), Some(&frame), 200),
        fwd.forward_load_error(&browser(), Some(&frame), ErrorCode::FAILED, "x", "y"),
    ];
    for d in deliveries {
        assert_eq!(d, Delivery::Dropped(DropReason::EnvUnavailable));
    }
    assert!(bridge.journal().is_empty());
    assert_eq!(bridge.live_values(), 0);

    bridge.set_env_available(true);
}

#[test]
fn later_notifications_unaffected_by_a_drop() {
    let (bridge, fwd) = setup();
    bridge.set_env_available(false);
    fwd.forward_load_end(&browser(), None, 200);
    bridge.set_env_available(true);
    assert_eq!(fwd.forward_load_end(&browser(), None, 200), Delivery::Delivered);
    assert_eq!(bridge.calls().len(), 1);
}

// -- Listener lifetime --

#[test]
fn drop_releases_listener_once() {
    let bridge = Arc::new(RecordingBridge::new());
    let fwd = bridge.forwarder("client").unwrap();
    assert_eq!(bridge.live_globals(), 1);
    drop(fwd);
    assert_eq!(bridge.live_globals(), 0);

    let releases = bridge
        .journal()
        .into_iter()
        .filter(|e| matches!(e, JournalEntry::ReleaseGlobal { .. }))
        .count();
    assert_eq!(releases, 1);
}

#[test]
fn repeated_construction_never_double_releases() {
    let bridge = Arc::new(RecordingBridge::new());
    let mut env = bridge.current_env().unwrap();
    let listener = env.new_listener("shared");

    for _ in 0..3 {
        let fwd = Forwarder::new(Arc::clone(&bridge), &mut env, &listener).unwrap();
        drop(fwd);
    }
    env.release(listener);

    let mut released_globals = Vec::new();
    let mut created_globals = Vec::new();
    for entry in bridge.journal() {
        match entry {
            JournalEntry::NewGlobal { global, .. } => created_globals.push(global),
            JournalEntry::ReleaseGlobal { global } => released_globals.push(global),
            _ => {}
        }
    }
    assert_eq!(created_globals.len(), 3);
    assert_eq!(released_globals, created_globals);
    assert_eq!(bridge.live_globals(), 0);
}

#[test]
fn drop_without_environment_leaks_instead_of_releasing() {
    let bridge = Arc::new(RecordingBridge::new());
    let fwd = bridge.forwarder("client").unwrap();
    bridge.set_env_available(false);
    drop(fwd);
    bridge.set_env_available(true);

    assert_eq!(bridge.live_globals(), 1);
    assert!(!bridge
        .journal()
        .iter()
        .any(|e| matches!(e, JournalEntry::ReleaseGlobal { .. })));
}

#[test]
fn construction_without_environment_fails() {
    let bridge = Arc::new(RecordingBridge::new());
    bridge.set_env_available(false);
    assert!(matches!(
        bridge.forwarder("client"),
        Err(BridgeError::EnvUnavailable)
    ));
}

// -- Native callback surface --

#[test]
fn load_handler_impl_forwards() {
    let (bridge, fwd) = setup();
    let handler: &dyn LoadHandler = &fwd;
    let frame = Frame::child("sub", "https://ads.example/");
    handler.on_loading_state_change(&browser(), true, false, false);
    handler.on_load_start(&browser(), Some(&frame), TransitionType(3));
    handler.on_load_end(&browser(), Some(&frame), 204);
    handler.on_load_error(&browser(), None, ErrorCode::ABORTED, "aborted", "https://x/");

    let methods: Vec<_> = bridge.calls().iter().map(|c| c.method).collect();
    let expected: Vec<_> = ALL.iter().map(|m| m.name).collect();
    assert_eq!(methods, expected);
}

#[test]
fn concurrent_notifications_from_engine_threads() {
    let (bridge, fwd) = setup();
    std::thread::scope(|s| {
        for id in 0..8 {
            let fwd = &fwd;
            s.spawn(move || {
                let browser = Browser::new(id);
                let frame = Frame::main(format!("f{id}"), "https://example.com/");
                for _ in 0..25 {
                    fwd.forward_loading_state_change(&browser, true, false, false);
                    fwd.forward_load_start(&browser, Some(&frame), TransitionType(0));
                    fwd.forward_load_end(&browser, Some(&frame), 200);
                    fwd.forward_loading_state_change(&browser, false, true, false);
                }
            });
        }
    });

    assert_eq!(bridge.calls().len(), 8 * 25 * 4);
    assert_eq!(bridge.live_values(), 0);
    assert_eq!(bridge.live_globals(), 1);
}

// -- Transients guard --

#[test]
fn transients_release_in_reverse_on_drop() {
    let bridge = RecordingBridge::new();
    let mut env = bridge.current_env().unwrap();
    {
        let mut scope = Transients::new(&mut env);
        for s in ["a", "b", "c"] {
            scope
                .translate(|env| env.string(s))
                .unwrap();
        }
        assert_eq!(scope.len(), 3);
    }
    assert_eq!(released(&bridge), vec!["str:c", "str:b", "str:a"]);
}

#[test]
fn transients_hold_nothing_on_failed_translation() {
    let bridge = RecordingBridge::new();
    let mut env = bridge.current_env().unwrap();
    let mut scope = Transients::new(&mut env);
    let result = scope.translate(|env| env.error_code(ErrorCode(-31337)).ok_or("unmapped"));
    assert_eq!(result.unwrap_err(), "unmapped");
    assert_eq!(scope.len(), 0);
    drop(scope);
    assert!(released(&bridge).is_empty());
}

#[test]
fn frame_ids_survive_translation() {
    let (bridge, fwd) = setup();
    let frame = Frame {
        id: FrameId::new("7-3"),
        url: "https://example.com/embed".into(),
        is_main: false,
    };
    fwd.forward_load_end(&browser(), Some(&frame), 200);
    assert_eq!(bridge.calls()[0].args[1], frame_arg(&frame));
}

// -- Recorded events --

#[test]
fn forward_reports_delivery_per_event() {
    let (bridge, fwd) = setup();
    bridge.unmap_transition_source(TransitionSource::Reload);

    let start = LoadEvent::LoadStart {
        browser: BrowserId(1),
        frame: None,
        transition_type: TransitionType(8),
    };
    let error = LoadEvent::LoadError {
        browser: BrowserId(1),
        frame: None,
        error_code: ErrorCode::CONNECTION_REFUSED,
        error_text: None,
        failed_url: "http://localhost:1/".into(),
    };

    assert_eq!(
        fwd.forward(&start),
        Delivery::Dropped(DropReason::Untranslatable("transition type"))
    );
    assert_eq!(fwd.forward(&error), Delivery::Delivered);
    let call = bridge.calls().pop().unwrap();
    assert_eq!(call.args[3], str_arg("net::ERR_CONNECTION_REFUSED"));
}

// -- Unwinding --

/// An env whose listener calls panic. Values are their own labels.
#[derive(Default)]
struct PanickingEnv {
    acquired: Vec<String>,
    released: Vec<String>,
}

impl PanickingEnv {
    fn acquire(&mut self, label: String) -> String {
        self.acquired.push(label.clone());
        label
    }
}

impl RuntimeEnv for PanickingEnv {
    type Global = ();
    type Value = String;

    fn new_global(&mut self, _object: &String) -> Result<(), BridgeError> {
        Ok(())
    }

    fn release_global(&mut self, _global: ()) {}

    fn browser(&mut self, browser: &Browser) -> Result<String, BridgeError> {
        Ok(self.acquire(format!("browser:{}", browser.id.0)))
    }

    fn frame(&mut self, frame: &Frame) -> Result<String, BridgeError> {
        Ok(self.acquire(format!("frame:{}", frame.id)))
    }

    fn transition_type(&mut self, transition: TransitionType) -> Option<String> {
        let name = transition.source()?.name();
        Some(self.acquire(format!("enum:{name}")))
    }

    fn error_code(&mut self, code: ErrorCode) -> Option<String> {
        let name = code.name()?;
        Some(self.acquire(format!("enum:{name}")))
    }

    fn string(&mut self, s: &str) -> Result<String, BridgeError> {
        Ok(self.acquire(format!("str:{s}")))
    }

    fn call_void(
        &mut self,
        _target: &(),
        method: &ListenerMethod,
        _args: &[Arg<'_, String>],
    ) -> Result<(), BridgeError> {
        panic!("listener blew up in {}", method.name);
    }

    fn release(&mut self, value: String) {
        self.released.push(value);
    }
}

#[test]
fn load_error_releases_everything_when_the_call_unwinds() {
    use std::panic::{catch_unwind, AssertUnwindSafe};

    let mut env = PanickingEnv::default();
    let result = catch_unwind(AssertUnwindSafe(|| {
        load_error(
            &mut env,
            &(),
            &browser(),
            Some(&main_frame()),
            ErrorCode::NAME_NOT_RESOLVED,
            "net::ERR_NAME_NOT_RESOLVED",
            "http://invalid.example",
        )
    }));
    assert!(result.is_err());

    assert_eq!(
        env.acquired,
        vec![
            "frame:main",
            "str:net::ERR_NAME_NOT_RESOLVED",
            "str:http://invalid.example",
            "browser:1",
            "enum:ERR_NAME_NOT_RESOLVED",
        ]
    );
    let mut expected = env.acquired.clone();
    expected.reverse();
    assert_eq!(env.released, expected);
}

#[test]
fn load_start_releases_everything_when_the_call_unwinds() {
    use std::panic::{catch_unwind, AssertUnwindSafe};

    let mut env = PanickingEnv::default();
    let result = catch_unwind(AssertUnwindSafe(|| {
        load_start(&mut env, &(), &browser(), None, TransitionType(1))
    }));
    assert!(result.is_err());
    assert_eq!(env.acquired, vec!["enum:TT_EXPLICIT", "browser:1"]);
    assert_eq!(env.released, vec!["browser:1", "enum:TT_EXPLICIT"]);
}
