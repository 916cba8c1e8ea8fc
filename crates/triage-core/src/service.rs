//! Pipeline assembly and the on-demand diagnosis API.
//!
//! `TriagePipeline` runs the classify, verify, diagnose sequence for one
//! trace and persists every stage's record. Both the monitoring scheduler
//! and `TriageService` drive the same pipeline, sharing one in-flight
//! registry so a trace is never diagnosed twice concurrently.

use std::sync::Arc;

use chrono::Duration;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::classify::classify_intent;
use crate::diagnose::DiagnosisEngine;
use crate::domain::{DiagnosisResult, Trace, TraceId, TriageError, Verdict};
use crate::monitor::InFlightRegistry;
use crate::ports::{Clock, IntentModel, ResultStore, SessionFeed, SystemOfRecord};
use crate::verify::Verifier;

/// What processing one trace amounted to.
#[derive(Debug)]
pub enum PipelineOutcome {
    /// Verified; the verdict did not call for a diagnosis.
    NotDiagnosed(Verdict),
    /// A recent diagnosis exists and the cooldown has not elapsed.
    CoolingDown,
    Diagnosed(Box<DiagnosisResult>),
}

impl PipelineOutcome {
    pub fn diagnosis(&self) -> Option<&DiagnosisResult> {
        match self {
            PipelineOutcome::Diagnosed(d) => Some(d),
            _ => None,
        }
    }
}

pub struct TriagePipeline {
    model: Arc<dyn IntentModel>,
    record: Arc<dyn SystemOfRecord>,
    engine: DiagnosisEngine,
    store: Arc<dyn ResultStore>,
    clock: Arc<dyn Clock>,
    registry: InFlightRegistry,
    cooldown: Duration,
}

impl TriagePipeline {
    pub fn new(
        model: Arc<dyn IntentModel>,
        record: Arc<dyn SystemOfRecord>,
        engine: DiagnosisEngine,
        store: Arc<dyn ResultStore>,
        clock: Arc<dyn Clock>,
        registry: InFlightRegistry,
        cooldown: Duration,
    ) -> Self {
        Self {
            model,
            record,
            engine,
            store,
            clock,
            registry,
            cooldown,
        }
    }

    pub fn registry(&self) -> &InFlightRegistry {
        &self.registry
    }

    /// Classify, verify, and (when warranted) diagnose one trace.
    ///
    /// `enforce_cooldown` is set by the scheduler; the on-demand path skips
    /// the cooldown because an operator asked explicitly.
    pub async fn process(
        &self,
        trace: &Trace,
        cancel: &watch::Receiver<bool>,
        enforce_cooldown: bool,
    ) -> Result<PipelineOutcome, TriageError> {
        let _guard = self.registry.claim(trace)?;

        let classification = classify_intent(self.model.as_ref(), self.clock.as_ref(), trace).await?;
        self.store
            .save_classification(&trace.session_id, classification.clone())
            .await?;

        let verifier = Verifier::new(self.record.as_ref(), self.clock.as_ref());
        let check = verifier.verify_fulfillment(trace, &classification).await;
        self.store
            .save_fulfillment(&trace.session_id, check.clone())
            .await?;

        if !check.verdict.needs_diagnosis() {
            debug!(trace_id = %trace.trace_id, verdict = ?check.verdict, "no diagnosis needed");
            return Ok(PipelineOutcome::NotDiagnosed(check.verdict));
        }

        if enforce_cooldown
            && let Some(last) = self.store.last_diagnosis_at(&trace.trace_id).await?
            && self.clock.now() - last < self.cooldown
        {
            debug!(trace_id = %trace.trace_id, "within cooldown, skipping re-diagnosis");
            return Ok(PipelineOutcome::CoolingDown);
        }

        let result = self.engine.diagnose(trace, &check, cancel).await;
        info!(
            trace_id = %trace.trace_id,
            category = ?result.category,
            confidence = result.confidence,
            complete = result.complete,
            "diagnosis finished"
        );
        self.store
            .save_diagnosis(&trace.session_id, result.clone())
            .await?;
        Ok(PipelineOutcome::Diagnosed(Box::new(result)))
    }
}

/// Operator-facing entry point for a single trace.
pub struct TriageService {
    feed: Arc<dyn SessionFeed>,
    pipeline: Arc<TriagePipeline>,
    store: Arc<dyn ResultStore>,
}

impl TriageService {
    pub fn new(
        feed: Arc<dyn SessionFeed>,
        pipeline: Arc<TriagePipeline>,
        store: Arc<dyn ResultStore>,
    ) -> Self {
        Self {
            feed,
            pipeline,
            store,
        }
    }

    /// Diagnose one trace now, bypassing the scheduler's cooldown. Rejected
    /// with `AlreadyInProgress` when a run for this trace is in flight.
    pub async fn diagnose_trace(&self, trace_id: &TraceId) -> Result<PipelineOutcome, TriageError> {
        let trace = self
            .feed
            .trace(trace_id)
            .await
            .map_err(|e| TriageError::Feed(e.to_string()))?
            .ok_or_else(|| TriageError::TraceNotFound(trace_id.clone()))?;

        let (_running, cancel) = watch::channel(false);
        self.pipeline.process(&trace, &cancel, false).await
    }

    /// Every diagnosis ever run for this trace, newest first.
    pub async fn history(&self, trace_id: &TraceId) -> Result<Vec<DiagnosisResult>, TriageError> {
        self.store.diagnoses_for(trace_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::time::Duration as StdDuration;

    use crate::diagnose::ExpertRegistry;
    use crate::domain::{
        Category, Intent, RecordedRequest, SessionId, Step, StepResponse, StepStatus,
    };
    use crate::impls::{InMemoryFeed, InMemoryRecord, InMemoryStore, StaticCatalog};
    use crate::ports::{
        CatalogEntry, CatalogKind, ClassificationFilter, ClassifyError, ReferenceCatalog,
        SystemClock, UlidGenerator,
    };
    use crate::replay::{MockTarget, ReplayHarness};

    struct FixedModel(Intent);

    #[async_trait]
    impl IntentModel for FixedModel {
        async fn classify(&self, _trace: &Trace) -> Result<(Intent, u8), ClassifyError> {
            Ok((self.0, 90))
        }
    }

    fn failing_trace(id: &str) -> Trace {
        Trace {
            trace_id: TraceId::new(id),
            session_id: SessionId::new("sess_svc"),
            captured_at: Utc::now(),
            steps: vec![Step {
                name: "create_order".to_string(),
                status: StepStatus::Fail,
                request: RecordedRequest {
                    method: "POST".to_string(),
                    path: "/orders".to_string(),
                    payload: serde_json::json!({"items": ["X1"]}),
                },
                response: Some(StepResponse {
                    status_code: 400,
                    body: serde_json::json!({"error": "invalid_item", "code": "X1"}),
                    latency_ms: 70,
                }),
            }],
        }
    }

    fn wire(trace: &Trace, store: InMemoryStore, feed: InMemoryFeed) -> TriageService {
        let catalog: Arc<dyn ReferenceCatalog> = Arc::new(StaticCatalog::new().with_entry(
            CatalogKind::MenuItem,
            CatalogEntry {
                code: "X1".to_string(),
                available: false,
                alternatives: vec!["P12".to_string()],
            },
        ));
        let engine = DiagnosisEngine::new(
            ExpertRegistry::with_defaults(catalog),
            ReplayHarness::new(
                Arc::new(MockTarget::from_trace(trace)),
                StdDuration::from_secs(5),
            ),
            Arc::new(SystemClock),
            Arc::new(UlidGenerator::new(SystemClock)),
        );
        let pipeline = Arc::new(TriagePipeline::new(
            Arc::new(FixedModel(Intent::PlaceOrder)),
            Arc::new(InMemoryRecord::new()),
            engine,
            Arc::new(store.clone()),
            Arc::new(SystemClock),
            InFlightRegistry::new(),
            Duration::minutes(30),
        ));
        TriageService::new(Arc::new(feed), pipeline, Arc::new(store))
    }

    #[tokio::test]
    async fn on_demand_diagnosis_runs_the_full_pipeline() {
        let trace = failing_trace("tr_svc");
        let feed = InMemoryFeed::new();
        feed.push(trace.clone());
        let store = InMemoryStore::new();
        let service = wire(&trace, store.clone(), feed);

        let outcome = service.diagnose_trace(&trace.trace_id).await.unwrap();
        let diagnosis = outcome.diagnosis().expect("diagnosis expected");
        assert_eq!(diagnosis.category, Category::InvalidMenuItem);

        // every stage persisted its record
        let classifications = store
            .classifications(&ClassificationFilter {
                trace_id: Some(trace.trace_id.clone()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(classifications.len(), 1);
        let history = service.history(&trace.trace_id).await.unwrap();
        assert_eq!(history.len(), 1);
    }

    #[tokio::test]
    async fn unknown_trace_is_not_found() {
        let trace = failing_trace("tr_svc");
        let service = wire(&trace, InMemoryStore::new(), InMemoryFeed::new());
        let err = service
            .diagnose_trace(&TraceId::new("tr_missing"))
            .await
            .unwrap_err();
        assert!(matches!(err, TriageError::TraceNotFound(_)));
    }

    #[tokio::test]
    async fn rerun_produces_a_second_record_not_an_edit() {
        let trace = failing_trace("tr_svc");
        let feed = InMemoryFeed::new();
        feed.push(trace.clone());
        let service = wire(&trace, InMemoryStore::new(), feed);

        service.diagnose_trace(&trace.trace_id).await.unwrap();
        service.diagnose_trace(&trace.trace_id).await.unwrap();

        let history = service.history(&trace.trace_id).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_ne!(history[0].diagnosis_id, history[1].diagnosis_id);
    }
}
