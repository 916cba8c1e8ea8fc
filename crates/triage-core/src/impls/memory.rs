//! In-memory result store and cursor store.
//!
//! Backs tests and the demo wiring. Append-only like the port demands;
//! queries clone out of the locked state, newest first.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::domain::{
    DiagnosisResult, FulfillmentCheck, IntentClassification, MonitoringRun, SessionId, TraceId,
    TriageError,
};
use crate::ports::{ClassificationFilter, CursorStore, ResultFilter, ResultStore, Watermark};

#[derive(Default)]
struct State {
    classifications: Vec<(SessionId, IntentClassification)>,
    fulfillments: Vec<(SessionId, FulfillmentCheck)>,
    diagnoses: Vec<(SessionId, DiagnosisResult)>,
    runs: Vec<MonitoringRun>,
    watermark: Option<Watermark>,
}

#[derive(Clone)]
pub struct InMemoryStore {
    state: Arc<Mutex<State>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State::default())),
        }
    }

}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ResultStore for InMemoryStore {
    async fn save_classification(
        &self,
        session_id: &SessionId,
        record: IntentClassification,
    ) -> Result<(), TriageError> {
        self.state
            .lock()
            .await
            .classifications
            .push((session_id.clone(), record));
        Ok(())
    }

    async fn save_fulfillment(
        &self,
        session_id: &SessionId,
        record: FulfillmentCheck,
    ) -> Result<(), TriageError> {
        self.state
            .lock()
            .await
            .fulfillments
            .push((session_id.clone(), record));
        Ok(())
    }

    async fn save_diagnosis(
        &self,
        session_id: &SessionId,
        record: DiagnosisResult,
    ) -> Result<(), TriageError> {
        self.state
            .lock()
            .await
            .diagnoses
            .push((session_id.clone(), record));
        Ok(())
    }

    async fn save_run(&self, record: MonitoringRun) -> Result<(), TriageError> {
        self.state.lock().await.runs.push(record);
        Ok(())
    }

    async fn diagnoses_for(&self, trace_id: &TraceId) -> Result<Vec<DiagnosisResult>, TriageError> {
        let state = self.state.lock().await;
        let mut out: Vec<DiagnosisResult> = state
            .diagnoses
            .iter()
            .filter(|(_, d)| &d.trace_id == trace_id)
            .map(|(_, d)| d.clone())
            .collect();
        out.reverse();
        Ok(out)
    }

    async fn last_diagnosis_at(
        &self,
        trace_id: &TraceId,
    ) -> Result<Option<DateTime<Utc>>, TriageError> {
        let state = self.state.lock().await;
        Ok(state
            .diagnoses
            .iter()
            .filter(|(_, d)| &d.trace_id == trace_id)
            .map(|(_, d)| d.run_at)
            .max())
    }

    async fn fulfillments(
        &self,
        filter: &ResultFilter,
    ) -> Result<Vec<FulfillmentCheck>, TriageError> {
        let state = self.state.lock().await;
        let mut out: Vec<FulfillmentCheck> = state
            .fulfillments
            .iter()
            .filter(|(sid, check)| filter.matches(check, sid))
            .map(|(_, check)| check.clone())
            .collect();
        out.reverse();
        Ok(out)
    }

    async fn classifications(
        &self,
        filter: &ClassificationFilter,
    ) -> Result<Vec<IntentClassification>, TriageError> {
        let state = self.state.lock().await;
        let mut out: Vec<IntentClassification> = state
            .classifications
            .iter()
            .filter(|(sid, record)| filter.matches(record, sid))
            .map(|(_, record)| record.clone())
            .collect();
        out.reverse();
        Ok(out)
    }

    async fn runs(&self, limit: usize) -> Result<Vec<MonitoringRun>, TriageError> {
        let state = self.state.lock().await;
        Ok(state.runs.iter().rev().take(limit).cloned().collect())
    }

    async fn runs_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<MonitoringRun>, TriageError> {
        let state = self.state.lock().await;
        Ok(state
            .runs
            .iter()
            .rev()
            .filter(|run| run.started_at >= from && run.started_at <= to)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl CursorStore for InMemoryStore {
    async fn load(&self) -> Result<Watermark, TriageError> {
        Ok(self
            .state
            .lock()
            .await
            .watermark
            .clone()
            .unwrap_or_else(Watermark::origin))
    }

    async fn advance(&self, from: &Watermark, to: &Watermark) -> Result<bool, TriageError> {
        let mut state = self.state.lock().await;
        let current = state.watermark.clone().unwrap_or_else(Watermark::origin);
        if &current != from {
            return Ok(false);
        }
        state.watermark = Some(to.clone());
        Ok(true)
    }
}
