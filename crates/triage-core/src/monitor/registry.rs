//! In-flight diagnosis registry.
//!
//! At most one diagnosis per trace at a time, across the scheduler and the
//! on-demand path. Claiming is reject-not-block: a second caller gets
//! `AlreadyInProgress` immediately. The claim is released by guard drop, so
//! a panicking diagnosis cannot leak its slot.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::domain::{Trace, TraceId, TriageError};

#[derive(Clone, Default)]
pub struct InFlightRegistry {
    inner: Arc<Mutex<HashMap<TraceId, String>>>,
}

impl InFlightRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the trace for one diagnosis run. The stored fingerprint records
    /// which version of the trace is being worked on.
    pub fn claim(&self, trace: &Trace) -> Result<InFlightGuard, TriageError> {
        let mut inner = self.inner.lock().unwrap_or_else(|p| p.into_inner());
        if inner.contains_key(&trace.trace_id) {
            return Err(TriageError::AlreadyInProgress(trace.trace_id.clone()));
        }
        inner.insert(trace.trace_id.clone(), trace.fingerprint());
        Ok(InFlightGuard {
            inner: self.inner.clone(),
            trace_id: trace.trace_id.clone(),
        })
    }

    pub fn in_flight(&self) -> usize {
        self.inner.lock().unwrap_or_else(|p| p.into_inner()).len()
    }
}

/// Held for the duration of one diagnosis; releases the claim on drop.
pub struct InFlightGuard {
    inner: Arc<Mutex<HashMap<TraceId, String>>>,
    trace_id: TraceId,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.inner
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .remove(&self.trace_id);
    }
}
