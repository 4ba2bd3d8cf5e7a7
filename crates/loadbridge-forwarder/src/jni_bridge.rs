//! Java listener runtime over JNI.
//!
//! Browsers are looked up in a registry of Java browser objects that the host
//! fills in as browsers are created. Frames are constructed fresh per call.
//! Enum values resolve as static fields of the configured Java enum classes.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use jni::objects::{GlobalRef, JObject, JValue};
use jni::{JNIEnv, JavaVM};
use loadbridge_common::{
    BridgeError, Browser, BrowserId, ConfigError, ErrorCode, Frame, TransitionType,
};
use tracing::{debug, trace};

use crate::bridge::{Arg, RuntimeBridge, RuntimeEnv};
use crate::config::JniConfig;
use crate::listener::ListenerMethod;

pub struct JniBridge {
    vm: JavaVM,
    config: JniConfig,
    browsers: RwLock<HashMap<BrowserId, GlobalRef>>,
}

impl JniBridge {
    /// Fails if `config` names no frame class.
    pub fn new(vm: JavaVM, config: JniConfig) -> Result<Self, ConfigError> {
        config.require_frame_class()?;
        Ok(Self {
            vm,
            config,
            browsers: RwLock::new(HashMap::new()),
        })
    }

    /// Wrap an env handed to a native method, e.g. to construct a forwarder
    /// from the listener object passed in by Java.
    pub fn wrap<'a>(&'a self, env: JNIEnv<'a>) -> JniEnv<'a> {
        JniEnv { env, bridge: self }
    }

    /// Associate the Java browser object for `id`.
    pub fn register_browser(
        &self,
        env: &JNIEnv<'_>,
        id: BrowserId,
        browser: &JObject<'_>,
    ) -> Result<(), BridgeError> {
        let global = env.new_global_ref(browser).map_err(jni_error)?;
        self.browsers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, global);
        debug!(browser_id = id.0, "java browser registered");
        Ok(())
    }

    pub fn unregister_browser(&self, id: BrowserId) -> bool {
        self.browsers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id)
            .is_some()
    }
}

impl RuntimeBridge for JniBridge {
    type Global = GlobalRef;
    type Env<'a>
        = JniEnv<'a>
    where
        Self: 'a;

    fn current_env(&self) -> Option<JniEnv<'_>> {
        match self.vm.attach_current_thread_as_daemon() {
            Ok(env) => Some(JniEnv { env, bridge: self }),
            Err(e) => {
                trace!("no jni env: {e}");
                None
            }
        }
    }
}

/// A JNI env attached to the current thread.
pub struct JniEnv<'a> {
    env: JNIEnv<'a>,
    bridge: &'a JniBridge,
}

impl<'a> JniEnv<'a> {
    /// Look up `constant` on the Java enum `class`. A missing constant leaves
    /// a pending `NoSuchFieldError`, which is cleared here.
    fn enum_constant(&mut self, class: &str, constant: &str) -> Option<JObject<'a>> {
        let sig = format!("L{class};");
        match self
            .env
            .get_static_field(class, constant, sig.as_str())
            .and_then(|v| v.l())
        {
            Ok(obj) if !obj.is_null() => Some(obj),
            Ok(_) => None,
            Err(e) => {
                trace!(class, constant, "enum constant lookup failed: {e}");
                self.clear_exception();
                None
            }
        }
    }

    fn clear_exception(&mut self) {
        if self.env.exception_check().unwrap_or(false) {
            let _ = self.env.exception_clear();
        }
    }
}

impl<'a> RuntimeEnv for JniEnv<'a> {
    type Global = GlobalRef;
    type Value = JObject<'a>;

    fn new_global(&mut self, object: &JObject<'a>) -> Result<GlobalRef, BridgeError> {
        self.env.new_global_ref(object).map_err(jni_error)
    }

    fn release_global(&mut self, global: GlobalRef) {
        // GlobalRef deletes the underlying reference when dropped.
        drop(global);
    }

    fn browser(&mut self, browser: &Browser) -> Result<JObject<'a>, BridgeError> {
        let browsers = self
            .bridge
            .browsers
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        let global = browsers.get(&browser.id).ok_or_else(|| {
            BridgeError::Other(format!("no java object registered for {}", browser.id))
        })?;
        self.env.new_local_ref(global.as_obj()).map_err(jni_error)
    }

    fn frame(&mut self, frame: &Frame) -> Result<JObject<'a>, BridgeError> {
        let id = JObject::from(self.env.new_string(frame.id.as_str()).map_err(jni_error)?);
        let url = JObject::from(self.env.new_string(&frame.url).map_err(jni_error)?);

        let config = &self.bridge.config;
        let result = self.env.new_object(
            config.frame_class.as_str(),
            config.frame_constructor.as_str(),
            &[
                JValue::Object(&id),
                JValue::Object(&url),
                JValue::Bool(u8::from(frame.is_main)),
            ],
        );

        let _ = self.env.delete_local_ref(url);
        let _ = self.env.delete_local_ref(id);
        if result.is_err() {
            self.clear_exception();
        }
        result.map_err(jni_error)
    }

    fn transition_type(&mut self, transition: TransitionType) -> Option<JObject<'a>> {
        let source = transition.source()?;
        let bridge = self.bridge;
        self.enum_constant(&bridge.config.transition_type_class, source.name())
    }

    fn error_code(&mut self, code: ErrorCode) -> Option<JObject<'a>> {
        let name = code.name()?;
        let bridge = self.bridge;
        self.enum_constant(&bridge.config.error_code_class, name)
    }

    fn string(&mut self, s: &str) -> Result<JObject<'a>, BridgeError> {
        self.env
            .new_string(s)
            .map(JObject::from)
            .map_err(jni_error)
    }

    fn call_void(
        &mut self,
        target: &GlobalRef,
        method: &ListenerMethod,
        args: &[Arg<'_, JObject<'a>>],
    ) -> Result<(), BridgeError> {
        let null = JObject::null();
        let jargs: Vec<JValue<'_, '_>> = args
            .iter()
            .map(|arg| match *arg {
                Arg::Object(obj) => JValue::Object(obj),
                Arg::Null => JValue::Object(&null),
                Arg::Bool(b) => JValue::Bool(u8::from(b)),
                Arg::Int(i) => JValue::Int(i),
            })
            .collect();

        match self
            .env
            .call_method(target.as_obj(), method.name, method.signature, &jargs)
        {
            Ok(_) => Ok(()),
            Err(jni::errors::Error::JavaException) => {
                let _ = self.env.exception_describe();
                let _ = self.env.exception_clear();
                Err(BridgeError::ListenerThrew {
                    method: method.name,
                })
            }
            Err(e) => {
                self.clear_exception();
                Err(jni_error(e))
            }
        }
    }

    fn release(&mut self, value: JObject<'a>) {
        let _ = self.env.delete_local_ref(value);
    }
}

fn jni_error(e: jni::errors::Error) -> BridgeError {
    BridgeError::Jni(e.to_string())
}
