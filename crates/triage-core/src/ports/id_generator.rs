//! ID generation port.
//!
//! ULIDs sort by time and can be generated without coordination. The
//! generator composes a `Clock` so a fixed clock yields IDs with a
//! deterministic timestamp component.

use ulid::Ulid;

use crate::domain::ids::{DiagnosisId, RunId};
use crate::ports::Clock;

pub trait IdGenerator: Send + Sync {
    fn run_id(&self) -> RunId;
    fn diagnosis_id(&self) -> DiagnosisId;
}

pub struct UlidGenerator<C> {
    clock: C,
}

impl<C: Clock> UlidGenerator<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }

    fn next(&self) -> Ulid {
        let timestamp_ms = self.clock.now().timestamp_millis() as u64;
        Ulid::from_parts(timestamp_ms, rand::random())
    }
}

impl<C: Clock> IdGenerator for UlidGenerator<C> {
    fn run_id(&self) -> RunId {
        RunId::from(self.next())
    }

    fn diagnosis_id(&self) -> DiagnosisId {
        DiagnosisId::from(self.next())
    }
}
