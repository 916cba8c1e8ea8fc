//! ResultStore port - durable storage for every record the pipeline emits.
//!
//! All records are append-only. Queries serve the dashboard, the cooldown
//! check, and export collaborators; everything is addressable by trace id,
//! session id, and time range.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{
    DiagnosisResult, FulfillmentCheck, Intent, IntentClassification, MonitoringRun, SessionId,
    TraceId, TriageError, Verdict,
};

/// Filter for stored fulfillment/diagnosis results.
/// Empty fields mean "no constraint".
#[derive(Debug, Clone, Default)]
pub struct ResultFilter {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub verdict: Option<Verdict>,
    pub intent: Option<Intent>,
    pub trace_id: Option<TraceId>,
    pub session_id: Option<SessionId>,
}

impl ResultFilter {
    pub fn matches(&self, check: &FulfillmentCheck, session_id: &SessionId) -> bool {
        if let Some(tid) = &self.trace_id
            && tid != &check.trace_id
        {
            return false;
        }
        if let Some(from) = self.from
            && check.checked_at < from
        {
            return false;
        }
        if let Some(to) = self.to
            && check.checked_at > to
        {
            return false;
        }
        if let Some(verdict) = self.verdict
            && check.verdict != verdict
        {
            return false;
        }
        if let Some(intent) = self.intent
            && check.intent != intent
        {
            return false;
        }
        if let Some(sid) = &self.session_id
            && sid != session_id
        {
            return false;
        }
        true
    }
}

/// Filter for stored intent classifications.
/// Empty fields mean "no constraint".
#[derive(Debug, Clone, Default)]
pub struct ClassificationFilter {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub trace_id: Option<TraceId>,
    pub session_id: Option<SessionId>,
}

impl ClassificationFilter {
    pub fn matches(&self, record: &IntentClassification, session_id: &SessionId) -> bool {
        if let Some(from) = self.from
            && record.classified_at < from
        {
            return false;
        }
        if let Some(to) = self.to
            && record.classified_at > to
        {
            return false;
        }
        if let Some(tid) = &self.trace_id
            && tid != &record.trace_id
        {
            return false;
        }
        if let Some(sid) = &self.session_id
            && sid != session_id
        {
            return false;
        }
        true
    }
}

#[async_trait]
pub trait ResultStore: Send + Sync {
    async fn save_classification(
        &self,
        session_id: &SessionId,
        record: IntentClassification,
    ) -> Result<(), TriageError>;

    async fn save_fulfillment(
        &self,
        session_id: &SessionId,
        record: FulfillmentCheck,
    ) -> Result<(), TriageError>;

    async fn save_diagnosis(
        &self,
        session_id: &SessionId,
        record: DiagnosisResult,
    ) -> Result<(), TriageError>;

    async fn save_run(&self, record: MonitoringRun) -> Result<(), TriageError>;

    /// All diagnoses for one trace, newest first.
    async fn diagnoses_for(&self, trace_id: &TraceId) -> Result<Vec<DiagnosisResult>, TriageError>;

    /// Timestamp of the most recent diagnosis for a trace (cooldown check).
    async fn last_diagnosis_at(
        &self,
        trace_id: &TraceId,
    ) -> Result<Option<DateTime<Utc>>, TriageError>;

    /// Fulfillment checks matching a filter, newest first.
    async fn fulfillments(
        &self,
        filter: &ResultFilter,
    ) -> Result<Vec<FulfillmentCheck>, TriageError>;

    /// Intent classifications matching a filter, newest first.
    async fn classifications(
        &self,
        filter: &ClassificationFilter,
    ) -> Result<Vec<IntentClassification>, TriageError>;

    /// Monitoring runs, newest first.
    async fn runs(&self, limit: usize) -> Result<Vec<MonitoringRun>, TriageError>;

    /// Monitoring runs whose start falls inside the range, newest first.
    async fn runs_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<MonitoringRun>, TriageError>;
}
