//! An in-process listener runtime that journals every interaction.
//!
//! `RecordingBridge` stands in for a managed runtime: objects live in a
//! handle table, enum translation follows a configurable partial mapping, and
//! every acquisition, release and listener call lands in a journal. The CLI
//! replays scenarios through it and the tests assert against it.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use loadbridge_common::{
    BridgeError, Browser, BrowserId, ErrorCode, Frame, FrameId, TransitionSource, TransitionType,
};
use serde::Serialize;
use tracing::warn;

use crate::bridge::{Arg, RuntimeBridge, RuntimeEnv};
use crate::forwarder::Forwarder;
use crate::listener::ListenerMethod;

pub const TRANSITION_TYPE_CLASS: &str = "CefRequest$TransitionType";
pub const ERROR_CODE_CLASS: &str = "CefLoadHandler$ErrorCode";

/// An object in the recording runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ManagedValue {
    Listener { name: String },
    Browser { id: BrowserId },
    Frame { id: FrameId, url: String, is_main: bool },
    Enum { class: &'static str, constant: &'static str },
    Str { value: String },
}

/// A listener argument with handles resolved to the objects they point at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum RecordedArg {
    Object(ManagedValue),
    Null,
    Bool(bool),
    Int(i32),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListenerCall {
    pub listener: String,
    pub method: &'static str,
    pub args: Vec<RecordedArg>,
    pub threw: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum JournalEntry {
    NewGlobal { global: u64, object: u64 },
    ReleaseGlobal { global: u64 },
    Translate { handle: u64, value: ManagedValue },
    TranslateFailed { what: &'static str },
    Call(ListenerCall),
    Release { handle: u64 },
}

/// Transient handle into the recording runtime.
#[derive(Debug, PartialEq, Eq)]
pub struct ObjectRef(u64);

impl ObjectRef {
    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Durable handle into the recording runtime.
#[derive(Debug, PartialEq, Eq)]
pub struct GlobalHandle(u64);

impl GlobalHandle {
    pub fn id(&self) -> u64 {
        self.0
    }
}

#[derive(Default)]
struct State {
    next_handle: u64,
    locals: HashMap<u64, ManagedValue>,
    globals: HashMap<u64, ManagedValue>,
    journal: Vec<JournalEntry>,
    unmapped_sources: HashSet<TransitionSource>,
    unmapped_error_codes: HashSet<ErrorCode>,
    throwing_methods: HashSet<&'static str>,
}

impl State {
    fn allocate(&mut self) -> u64 {
        self.next_handle += 1;
        self.next_handle
    }

    fn new_local(&mut self, value: ManagedValue) -> ObjectRef {
        let handle = self.allocate();
        self.journal.push(JournalEntry::Translate {
            handle,
            value: value.clone(),
        });
        self.locals.insert(handle, value);
        ObjectRef(handle)
    }

    fn resolve(&self, value: &ObjectRef) -> Result<ManagedValue, BridgeError> {
        self.locals
            .get(&value.0)
            .cloned()
            .ok_or(BridgeError::UnknownObject(value.0))
    }
}

/// See the module docs.
#[derive(Default)]
pub struct RecordingBridge {
    state: Mutex<State>,
    env_unavailable: AtomicBool,
}

impl RecordingBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a forwarder for a fresh listener object called `name`.
    ///
    /// The listener's own transient reference is released once the forwarder
    /// holds its durable one.
    pub fn forwarder(self: &Arc<Self>, name: &str) -> Result<Forwarder<Self>, BridgeError> {
        let mut env = self.current_env().ok_or(BridgeError::EnvUnavailable)?;
        let listener = env.new_listener(name);
        let forwarder = Forwarder::new(Arc::clone(self), &mut env, &listener);
        env.release(listener);
        forwarder
    }

    /// Make `current_env` report no environment, as during runtime teardown.
    pub fn set_env_available(&self, available: bool) {
        self.env_unavailable.store(!available, Ordering::SeqCst);
    }

    /// Pretend the listener runtime has no constant for `source`.
    pub fn unmap_transition_source(&self, source: TransitionSource) {
        self.lock().unmapped_sources.insert(source);
    }

    /// Pretend the listener runtime has no constant for `code`.
    pub fn unmap_error_code(&self, code: ErrorCode) {
        self.lock().unmapped_error_codes.insert(code);
    }

    /// Make the listener throw from `method`.
    pub fn throw_from(&self, method: &ListenerMethod) {
        self.lock().throwing_methods.insert(method.name);
    }

    pub fn journal(&self) -> Vec<JournalEntry> {
        self.lock().journal.clone()
    }

    pub fn clear_journal(&self) {
        self.lock().journal.clear();
    }

    /// Every listener call made so far, in order.
    pub fn calls(&self) -> Vec<ListenerCall> {
        self.lock()
            .journal
            .iter()
            .filter_map(|entry| match entry {
                JournalEntry::Call(call) => Some(call.clone()),
                _ => None,
            })
            .collect()
    }

    /// Transient values that have been created and not yet released.
    pub fn live_values(&self) -> usize {
        self.lock().locals.len()
    }

    /// Durable references that have been created and not yet released.
    pub fn live_globals(&self) -> usize {
        self.lock().globals.len()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl RuntimeBridge for RecordingBridge {
    type Global = GlobalHandle;
    type Env<'a>
        = RecordingEnv<'a>
    where
        Self: 'a;

    fn current_env(&self) -> Option<RecordingEnv<'_>> {
        if self.env_unavailable.load(Ordering::SeqCst) {
            return None;
        }
        Some(RecordingEnv { bridge: self })
    }
}

/// Execution context of the recording runtime.
pub struct RecordingEnv<'a> {
    bridge: &'a RecordingBridge,
}

impl RecordingEnv<'_> {
    /// Create a listener object, returned as a transient reference.
    pub fn new_listener(&mut self, name: &str) -> ObjectRef {
        self.bridge.lock().new_local(ManagedValue::Listener {
            name: name.to_string(),
        })
    }
}

impl RuntimeEnv for RecordingEnv<'_> {
    type Global = GlobalHandle;
    type Value = ObjectRef;

    fn new_global(&mut self, object: &ObjectRef) -> Result<GlobalHandle, BridgeError> {
        let mut state = self.bridge.lock();
        let value = state.resolve(object)?;
        let global = state.allocate();
        state.globals.insert(global, value);
        state.journal.push(JournalEntry::NewGlobal {
            global,
            object: object.0,
        });
        Ok(GlobalHandle(global))
    }

    fn release_global(&mut self, global: GlobalHandle) {
        let mut state = self.bridge.lock();
        if state.globals.remove(&global.0).is_none() {
            warn!(global = global.0, "release of unknown global reference");
        }
        state.journal.push(JournalEntry::ReleaseGlobal { global: global.0 });
    }

    fn browser(&mut self, browser: &Browser) -> Result<ObjectRef, BridgeError> {
        Ok(self
            .bridge
            .lock()
            .new_local(ManagedValue::Browser { id: browser.id }))
    }

    fn frame(&mut self, frame: &Frame) -> Result<ObjectRef, BridgeError> {
        Ok(self.bridge.lock().new_local(ManagedValue::Frame {
            id: frame.id.clone(),
            url: frame.url.clone(),
            is_main: frame.is_main,
        }))
    }

    fn transition_type(&mut self, transition: TransitionType) -> Option<ObjectRef> {
        let mut state = self.bridge.lock();
        match transition.source() {
            Some(source) if !state.unmapped_sources.contains(&source) => {
                Some(state.new_local(ManagedValue::Enum {
                    class: TRANSITION_TYPE_CLASS,
                    constant: source.name(),
                }))
            }
            _ => {
                state.journal.push(JournalEntry::TranslateFailed {
                    what: "transition type",
                });
                None
            }
        }
    }

    fn error_code(&mut self, code: ErrorCode) -> Option<ObjectRef> {
        let mut state = self.bridge.lock();
        match code.name() {
            Some(name) if !state.unmapped_error_codes.contains(&code) => {
                Some(state.new_local(ManagedValue::Enum {
                    class: ERROR_CODE_CLASS,
                    constant: name,
                }))
            }
            _ => {
                state.journal.push(JournalEntry::TranslateFailed { what: "error code" });
                None
            }
        }
    }

    fn string(&mut self, s: &str) -> Result<ObjectRef, BridgeError> {
        Ok(self.bridge.lock().new_local(ManagedValue::Str {
            value: s.to_string(),
        }))
    }

    fn call_void(
        &mut self,
        target: &GlobalHandle,
        method: &ListenerMethod,
        args: &[Arg<'_, ObjectRef>],
    ) -> Result<(), BridgeError> {
        let mut state = self.bridge.lock();
        let listener = match state.globals.get(&target.0) {
            Some(ManagedValue::Listener { name }) => name.clone(),
            Some(_) => return Err(BridgeError::Other("call target is not a listener".into())),
            None => return Err(BridgeError::UnknownObject(target.0)),
        };
        if args.len() != method.arity() {
            return Err(BridgeError::Other(format!(
                "{} takes {} arguments, got {}",
                method.name,
                method.arity(),
                args.len()
            )));
        }

        let args = args
            .iter()
            .map(|arg| match *arg {
                Arg::Object(value) => state.resolve(value).map(RecordedArg::Object),
                Arg::Null => Ok(RecordedArg::Null),
                Arg::Bool(b) => Ok(RecordedArg::Bool(b)),
                Arg::Int(i) => Ok(RecordedArg::Int(i)),
            })
            .collect::<Result<Vec<_>, _>>()?;

        let threw = state.throwing_methods.contains(method.name);
        state.journal.push(JournalEntry::Call(ListenerCall {
            listener,
            method: method.name,
            args,
            threw,
        }));

        if threw {
            return Err(BridgeError::ListenerThrew {
                method: method.name,
            });
        }
        Ok(())
    }

    fn release(&mut self, value: ObjectRef) {
        let mut state = self.bridge.lock();
        if state.locals.remove(&value.0).is_none() {
            warn!(handle = value.0, "release of unknown transient value");
        }
        state.journal.push(JournalEntry::Release { handle: value.0 });
    }
}
