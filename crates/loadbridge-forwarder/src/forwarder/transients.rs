use loadbridge_common::BridgeError;

use crate::bridge::{Arg, RuntimeEnv};
use crate::listener::ListenerMethod;

/// Index of a value held by [`Transients`].
#[derive(Debug, Clone, Copy)]
pub(super) struct Slot(usize);

/// A listener argument before it is resolved against the held values.
#[derive(Debug, Clone, Copy)]
pub(super) enum Param {
    Held(Slot),
    Null,
    Bool(bool),
    Int(i32),
}

impl From<Option<Slot>> for Param {
    fn from(slot: Option<Slot>) -> Self {
        slot.map_or(Param::Null, Param::Held)
    }
}

/// Owns the transient values created for one notification and releases them
/// in reverse acquisition order when dropped.
pub(super) struct Transients<'s, E: RuntimeEnv> {
    env: &'s mut E,
    held: Vec<E::Value>,
}

impl<'s, E: RuntimeEnv> Transients<'s, E> {
    pub(super) fn new(env: &'s mut E) -> Self {
        Self {
            env,
            held: Vec::with_capacity(5),
        }
    }

    pub(super) fn hold(&mut self, value: E::Value) -> Slot {
        self.held.push(value);
        Slot(self.held.len() - 1)
    }

    /// Run one translation and hold its result. Nothing is held on failure.
    pub(super) fn translate<Err>(
        &mut self,
        f: impl FnOnce(&mut E) -> Result<E::Value, Err>,
    ) -> Result<Slot, Err> {
        let value = f(&mut *self.env)?;
        Ok(self.hold(value))
    }

    pub(super) fn call(
        &mut self,
        target: &E::Global,
        method: &ListenerMethod,
        params: &[Param],
    ) -> Result<(), BridgeError> {
        let args: Vec<Arg<'_, E::Value>> = params
            .iter()
            .map(|param| match *param {
                Param::Held(Slot(i)) => Arg::Object(&self.held[i]),
                Param::Null => Arg::Null,
                Param::Bool(b) => Arg::Bool(b),
                Param::Int(i) => Arg::Int(i),
            })
            .collect();
        self.env.call_void(target, method, &args)
    }

    #[cfg(test)]
    pub(super) fn len(&self) -> usize {
        self.held.len()
    }
}

impl<E: RuntimeEnv> Drop for Transients<'_, E> {
    fn drop(&mut self) {
        while let Some(value) = self.held.pop() {
            self.env.release(value);
        }
    }
}
