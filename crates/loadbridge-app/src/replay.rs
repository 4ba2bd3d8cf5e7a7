//! Replay a scenario of native load events through a recording runtime.
//!
//! A scenario is a TOML file with an `[[event]]` array of load events and an
//! optional `[runtime]` section that shapes how the listener runtime behaves:
//!
//! ```toml
//! [runtime]
//! unmapped_transition_sources = [8]
//! unmapped_error_codes = [-105]
//! throw_from = ["onLoadEnd"]
//!
//! [[event]]
//! type = "loading_state_change"
//! browser = 1
//! is_loading = true
//! ```

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use loadbridge_common::{ErrorCode, LoadBridgeError, Result, TransitionSource};
use loadbridge_forwarder::recording::ListenerCall;
use loadbridge_forwarder::{Delivery, ListenerMethod, LoadEvent, RecordingBridge};
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Scenario {
    pub runtime: RuntimeSettings,
    pub event: Vec<LoadEvent>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RuntimeSettings {
    /// Raw transition sources the listener runtime has no constant for.
    pub unmapped_transition_sources: Vec<u32>,
    /// Net error codes the listener runtime has no constant for.
    pub unmapped_error_codes: Vec<i32>,
    /// Listener methods that throw when invoked.
    pub throw_from: Vec<String>,
}

/// Totals printed after a replay.
#[derive(Debug, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub events: usize,
    pub delivered: usize,
    pub listener_failed: usize,
    pub dropped: usize,
    pub leaked_values: usize,
    pub leaked_globals: usize,
}

impl Scenario {
    pub fn from_toml(content: &str) -> Result<Self> {
        let scenario: Scenario =
            toml::from_str(content).map_err(|e| LoadBridgeError::Scenario(e.to_string()))?;
        if scenario.event.is_empty() {
            return Err(LoadBridgeError::Scenario("scenario has no events".into()));
        }
        Ok(scenario)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    fn bridge(&self) -> Result<Arc<RecordingBridge>> {
        let bridge = Arc::new(RecordingBridge::new());
        let runtime = &self.runtime;

        for &raw in &runtime.unmapped_transition_sources {
            let source = TransitionSource::from_raw(raw).ok_or_else(|| {
                LoadBridgeError::Scenario(format!("unknown transition source {raw}"))
            })?;
            bridge.unmap_transition_source(source);
        }
        for &code in &runtime.unmapped_error_codes {
            bridge.unmap_error_code(ErrorCode(code));
        }
        for name in &runtime.throw_from {
            let method = ListenerMethod::by_name(name).ok_or_else(|| {
                LoadBridgeError::Scenario(format!("unknown listener method {name}"))
            })?;
            bridge.throw_from(&method);
        }
        Ok(bridge)
    }
}

/// Feed every event through a fresh forwarder, writing each listener call to
/// `out` as a JSON line as it happens.
pub fn run(scenario: &Scenario, out: &mut impl Write) -> Result<Summary> {
    let bridge = scenario.bridge()?;
    let forwarder = bridge.forwarder("replay")?;
    let mut summary = Summary {
        events: scenario.event.len(),
        ..Summary::default()
    };
    let mut seen = 0;

    for event in &scenario.event {
        let delivery = forwarder.forward(event);
        tracing::debug!(callback = event.callback_name(), ?delivery, "replayed event");
        match delivery {
            Delivery::Delivered => summary.delivered += 1,
            Delivery::ListenerFailed => summary.listener_failed += 1,
            Delivery::Dropped(_) => summary.dropped += 1,
        }

        let calls = bridge.calls();
        for call in &calls[seen..] {
            write_call(out, call)?;
        }
        seen = calls.len();
    }

    drop(forwarder);
    summary.leaked_values = bridge.live_values();
    summary.leaked_globals = bridge.live_globals();
    Ok(summary)
}

fn write_call(out: &mut impl Write, call: &ListenerCall) -> Result<()> {
    let line = serde_json::to_string(call)
        .map_err(|e| LoadBridgeError::Other(format!("failed to serialize call: {e}")))?;
    writeln!(out, "{line}")?;
    Ok(())
}
