//! Diagnosis engine.
//!
//! Orchestrates one investigation: pick the category, run its expert, replay
//! (the corrected request for fixable categories, the original request
//! otherwise), score confidence, and render resolution steps. The engine is
//! infallible by contract: whatever goes wrong inside becomes data on the
//! `DiagnosisResult`, not an error.

pub mod confidence;
pub mod expert;
pub mod experts;
pub mod matchers;
pub mod resolution;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::watch;
use tracing::{info, warn};

use crate::domain::{
    Category, CheckStatus, DiagnosisResult, FixProposal, FixTestResult, FulfillmentCheck,
    InvestigationCheck, ReplayResult, Trace, TriageError,
};
use crate::ports::{Clock, IdGenerator, ReferenceCatalog};
use crate::replay::{ErrorSignature, ReplayHarness};

pub use expert::{CategoryExpert, CorrectedRequest, Findings, InvestigationContext};
pub use matchers::match_category;

/// Category-to-expert map. Registration of a second expert for the same
/// category is rejected, never silently shadowed.
pub struct ExpertRegistry {
    experts: HashMap<Category, Arc<dyn CategoryExpert>>,
}

impl ExpertRegistry {
    pub fn new() -> Self {
        Self {
            experts: HashMap::new(),
        }
    }

    /// All eight built-in experts.
    pub fn with_defaults(catalog: Arc<dyn ReferenceCatalog>) -> Self {
        let mut registry = Self::new();
        let result: Result<(), TriageError> = (|| {
            registry.register(Arc::new(experts::MenuItemExpert::new(catalog.clone())))?;
            registry.register(Arc::new(experts::CouponExpert::new(catalog.clone())))?;
            registry.register(Arc::new(experts::AddressExpert::new(catalog.clone())))?;
            registry.register(Arc::new(experts::StoreClosedExpert::new(catalog)))?;
            registry.register(Arc::new(experts::TimeoutExpert))?;
            registry.register(Arc::new(experts::ServiceErrorExpert))?;
            registry.register(Arc::new(experts::SchemaExpert))?;
            registry.register(Arc::new(experts::OtherExpert))?;
            Ok(())
        })();
        debug_assert!(result.is_ok(), "built-in experts cannot collide");
        registry
    }

    pub fn register(&mut self, expert: Arc<dyn CategoryExpert>) -> Result<(), TriageError> {
        let category = expert.category();
        if self.experts.contains_key(&category) {
            return Err(TriageError::DuplicateExpert(category));
        }
        self.experts.insert(category, expert);
        Ok(())
    }

    fn get(&self, category: Category) -> Option<&Arc<dyn CategoryExpert>> {
        self.experts
            .get(&category)
            .or_else(|| self.experts.get(&Category::Other))
    }
}

impl Default for ExpertRegistry {
    fn default() -> Self {
        Self::new()
    }
}

pub struct DiagnosisEngine {
    experts: ExpertRegistry,
    harness: ReplayHarness,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
}

impl DiagnosisEngine {
    pub fn new(
        experts: ExpertRegistry,
        harness: ReplayHarness,
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdGenerator>,
    ) -> Self {
        Self {
            experts,
            harness,
            clock,
            ids,
        }
    }

    /// Run one full diagnosis. `cancel` flips to true on shutdown; a
    /// cancelled run still returns a result, marked `complete = false`.
    /// Cancellation interrupts an in-flight investigation or replay call,
    /// it does not just gate between stages.
    pub async fn diagnose(
        &self,
        trace: &Trace,
        check: &FulfillmentCheck,
        cancel: &watch::Receiver<bool>,
    ) -> DiagnosisResult {
        let mut cancel = cancel.clone();
        let started = Instant::now();
        let run_at = self.clock.now();
        let diagnosis_id = self.ids.diagnosis_id();

        let Some(failing_step) = trace.last_failing_step().or_else(|| trace.terminal_step())
        else {
            // Nothing recorded to investigate; still produce an artifact.
            return DiagnosisResult {
                diagnosis_id,
                trace_id: trace.trace_id.clone(),
                run_at,
                category: Category::Other,
                confidence: 0,
                root_cause: "trace has no steps to investigate".to_string(),
                explanation: "The session recorded no tool calls; the failure signal came \
                     from the fulfillment check alone."
                    .to_string(),
                investigation: vec![InvestigationCheck::new(
                    "locate failing step",
                    CheckStatus::Warn,
                    "trace is empty",
                )],
                problematic_items: Vec::new(),
                replay: None,
                fix_proposal: None,
                resolution: resolution::steps(Category::Other, &[], None, None),
                duration_ms: started.elapsed().as_millis() as u64,
                complete: true,
            };
        };

        let category = match_category(failing_step);
        info!(trace_id = %trace.trace_id, ?category, "diagnosis started");

        if *cancel.borrow() {
            return self.cancelled(diagnosis_id, trace, run_at, category, Findings::new(
                "diagnosis cancelled before investigation",
                "Shutdown arrived before the investigation could start.",
            ), started);
        }

        let ctx = InvestigationContext {
            trace,
            failing_step,
            check,
        };
        let findings = match self.experts.get(category) {
            Some(expert) => {
                tokio::select! {
                    findings = expert.investigate(&ctx) => findings,
                    _ = cancel_requested(&mut cancel) => {
                        return self.cancelled(
                            diagnosis_id,
                            trace,
                            run_at,
                            category,
                            Findings::new(
                                "diagnosis cancelled during investigation",
                                "Shutdown arrived while the investigation was running.",
                            ),
                            started,
                        );
                    }
                }
            }
            None => {
                warn!(?category, "no expert registered, not even a fallback");
                let mut f = Findings::new(
                    "no expert available for this category",
                    "The registry has no expert for this category and no fallback.",
                );
                f.push_check("select expert", CheckStatus::Error, format!("{category:?}"));
                f
            }
        };

        if *cancel.borrow() {
            return self.cancelled(diagnosis_id, trace, run_at, category, findings, started);
        }

        // Fixable categories replay the corrected request to verify the fix;
        // everything else replays the original to tell transient from
        // persistent.
        let original = ErrorSignature::of_step(failing_step);
        let (replay, fix_proposal) = if category.is_remediable() {
            match findings.correction.clone() {
                Some(correction) => {
                    let result = tokio::select! {
                        result = self.harness.replay(&correction.request, &original, category) => result,
                        _ = cancel_requested(&mut cancel) => {
                            return self.cancelled(diagnosis_id, trace, run_at, category, findings, started);
                        }
                    };
                    let proposal = FixProposal {
                        description: correction.description,
                        changes: correction.changes,
                        test_result: Some(FixTestResult {
                            success: result.success,
                            status_code: result.status_code,
                            response_time_ms: result.response_time_ms,
                            note: result.error_message.clone(),
                        }),
                    };
                    (Some(result), Some(proposal))
                }
                None => (Some(ReplayResult::not_performed()), None),
            }
        } else {
            let result = tokio::select! {
                result = self.harness.replay(&failing_step.request, &original, category) => result,
                _ = cancel_requested(&mut cancel) => {
                    return self.cancelled(diagnosis_id, trace, run_at, category, findings, started);
                }
            };
            (Some(result), None)
        };

        let confidence = confidence::score(category, &findings.checks);
        let resolution = resolution::steps(
            category,
            &findings.problematic_items,
            replay.as_ref(),
            fix_proposal.as_ref(),
        );

        DiagnosisResult {
            diagnosis_id,
            trace_id: trace.trace_id.clone(),
            run_at,
            category,
            confidence,
            root_cause: findings.root_cause,
            explanation: findings.explanation,
            investigation: findings.checks,
            problematic_items: findings.problematic_items,
            replay,
            fix_proposal,
            resolution,
            duration_ms: started.elapsed().as_millis() as u64,
            complete: true,
        }
    }

    fn cancelled(
        &self,
        diagnosis_id: crate::domain::DiagnosisId,
        trace: &Trace,
        run_at: chrono::DateTime<chrono::Utc>,
        category: Category,
        findings: Findings,
        started: Instant,
    ) -> DiagnosisResult {
        warn!(trace_id = %trace.trace_id, "diagnosis cancelled mid-run");
        let confidence = confidence::score(category, &findings.checks);
        DiagnosisResult {
            diagnosis_id,
            trace_id: trace.trace_id.clone(),
            run_at,
            category,
            confidence,
            root_cause: findings.root_cause,
            explanation: findings.explanation,
            investigation: findings.checks,
            problematic_items: findings.problematic_items,
            replay: None,
            fix_proposal: None,
            resolution: Vec::new(),
            duration_ms: started.elapsed().as_millis() as u64,
            complete: false,
        }
    }
}

/// Resolves once `cancel` reads true. A dropped sender means cancellation
/// can never arrive, so the future stays pending instead of firing.
async fn cancel_requested(cancel: &mut watch::Receiver<bool>) {
    if cancel.wait_for(|stop| *stop).await.is_err() {
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::time::Duration;

    use crate::domain::{
        Intent, RecordedRequest, SessionId, Step, StepResponse, StepStatus, TraceId,
    };
    use crate::ports::{
        CatalogEntry, CatalogKind, LookupError, SystemClock, UlidGenerator,
    };
    use crate::replay::MockTarget;

    struct TestCatalog;

    #[async_trait]
    impl ReferenceCatalog for TestCatalog {
        async fn lookup(
            &self,
            kind: CatalogKind,
            code: &str,
        ) -> Result<Option<CatalogEntry>, LookupError> {
            match (kind, code) {
                (CatalogKind::MenuItem, "X1") => Ok(Some(CatalogEntry {
                    code: "X1".to_string(),
                    available: false,
                    alternatives: vec!["P12".to_string()],
                })),
                (CatalogKind::MenuItem, "P12") => Ok(Some(CatalogEntry {
                    code: "P12".to_string(),
                    available: true,
                    alternatives: vec![],
                })),
                _ => Ok(None),
            }
        }

        async fn store_open(&self) -> Result<bool, LookupError> {
            Ok(true)
        }
    }

    fn invalid_item_trace() -> Trace {
        Trace {
            trace_id: TraceId::new("tr_x1"),
            session_id: SessionId::new("sess_x1"),
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
                    latency_ms: 60,
                }),
            }],
        }
    }

    fn engine_for(trace: &Trace) -> DiagnosisEngine {
        let catalog: Arc<dyn ReferenceCatalog> = Arc::new(TestCatalog);
        DiagnosisEngine::new(
            ExpertRegistry::with_defaults(catalog),
            ReplayHarness::new(Arc::new(MockTarget::from_trace(trace)), Duration::from_secs(5)),
            Arc::new(SystemClock),
            Arc::new(UlidGenerator::new(SystemClock)),
        )
    }

    fn unfulfilled_check(trace: &Trace) -> FulfillmentCheck {
        FulfillmentCheck::unfulfilled(
            trace.trace_id.clone(),
            Intent::PlaceOrder,
            "last attempt failed with status 400",
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn invalid_item_failure_gets_a_verified_fix() {
        let trace = invalid_item_trace();
        let engine = engine_for(&trace);
        let (_, cancel) = watch::channel(false);

        let result = engine
            .diagnose(&trace, &unfulfilled_check(&trace), &cancel)
            .await;

        assert_eq!(result.category, Category::InvalidMenuItem);
        assert!(result.complete);
        assert_eq!(result.problematic_items[0].code, "X1");
        assert_eq!(result.problematic_items[0].alternatives, vec!["P12"]);

        // corrected payload differs from the recorded one, so the mock accepts it
        let fix = result.fix_proposal.expect("fix expected");
        assert!(fix.is_verified());
        assert!(result.replay.unwrap().success);
        assert!(result
            .resolution
            .iter()
            .any(|s| s.contains("verified by replay")));
        assert!(result.confidence >= 40);
    }

    #[tokio::test]
    async fn server_error_replays_the_original_request() {
        let mut trace = invalid_item_trace();
        trace.steps[0].response = Some(StepResponse {
            status_code: 500,
            body: serde_json::json!({"error": "internal"}),
            latency_ms: 120,
        });
        let engine = engine_for(&trace);
        let (_, cancel) = watch::channel(false);

        let result = engine
            .diagnose(&trace, &unfulfilled_check(&trace), &cancel)
            .await;

        assert_eq!(result.category, Category::ServiceError);
        // identical payload, so the mock returns the recorded 500 again
        let replay = result.replay.expect("replay expected");
        assert!(replay.performed);
        assert!(replay.same_error);
        assert!(result.fix_proposal.is_none());
    }

    struct HangingExpert;

    #[async_trait]
    impl CategoryExpert for HangingExpert {
        fn category(&self) -> Category {
            Category::ServiceError
        }

        async fn investigate(&self, _ctx: &InvestigationContext<'_>) -> Findings {
            std::future::pending().await
        }
    }

    struct HangingTarget;

    #[async_trait]
    impl crate::ports::ReplayTarget for HangingTarget {
        fn kind(&self) -> crate::domain::TargetKind {
            crate::domain::TargetKind::Mock
        }

        async fn send(
            &self,
            _request: &RecordedRequest,
        ) -> Result<crate::ports::TargetResponse, crate::ports::TargetError> {
            std::future::pending().await
        }
    }

    fn server_error_trace() -> Trace {
        let mut trace = invalid_item_trace();
        trace.steps[0].response = Some(StepResponse {
            status_code: 500,
            body: serde_json::json!({"error": "internal"}),
            latency_ms: 120,
        });
        trace
    }

    #[tokio::test]
    async fn cancellation_yields_an_incomplete_result() {
        let trace = invalid_item_trace();
        let engine = engine_for(&trace);
        let (tx, cancel) = watch::channel(false);
        tx.send(true).unwrap();

        let result = engine
            .diagnose(&trace, &unfulfilled_check(&trace), &cancel)
            .await;

        assert!(!result.complete);
        assert!(result.replay.is_none());
    }

    #[tokio::test]
    async fn cancellation_interrupts_a_running_investigation() {
        let trace = server_error_trace();
        let mut registry = ExpertRegistry::new();
        registry.register(Arc::new(HangingExpert)).unwrap();
        let engine = DiagnosisEngine::new(
            registry,
            ReplayHarness::new(Arc::new(MockTarget::from_trace(&trace)), Duration::from_secs(5)),
            Arc::new(SystemClock),
            Arc::new(UlidGenerator::new(SystemClock)),
        );
        let (tx, cancel) = watch::channel(false);
        let check = unfulfilled_check(&trace);

        let (result, _) = tokio::join!(engine.diagnose(&trace, &check, &cancel), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            tx.send(true).unwrap();
        });

        assert!(!result.complete);
        assert!(result.replay.is_none());
    }

    #[tokio::test]
    async fn cancellation_interrupts_a_running_replay() {
        let trace = server_error_trace();
        let catalog: Arc<dyn ReferenceCatalog> = Arc::new(TestCatalog);
        let engine = DiagnosisEngine::new(
            ExpertRegistry::with_defaults(catalog),
            ReplayHarness::new(Arc::new(HangingTarget), Duration::from_secs(60)),
            Arc::new(SystemClock),
            Arc::new(UlidGenerator::new(SystemClock)),
        );
        let (tx, cancel) = watch::channel(false);
        let check = unfulfilled_check(&trace);

        let (result, _) = tokio::join!(engine.diagnose(&trace, &check, &cancel), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            tx.send(true).unwrap();
        });

        assert!(!result.complete);
        assert!(result.replay.is_none());
        // the expert still ran; its findings survive on the record
        assert_eq!(result.category, Category::ServiceError);
        assert!(!result.investigation.is_empty());
    }

    #[tokio::test]
    async fn empty_trace_still_produces_an_artifact() {
        let trace = Trace {
            trace_id: TraceId::new("tr_empty"),
            session_id: SessionId::new("sess_empty"),
            captured_at: Utc::now(),
            steps: vec![],
        };
        let engine = engine_for(&trace);
        let (_, cancel) = watch::channel(false);

        let result = engine
            .diagnose(&trace, &unfulfilled_check(&trace), &cancel)
            .await;

        assert_eq!(result.category, Category::Other);
        assert!(result.complete);
        assert_eq!(result.confidence, 0);
    }

    #[test]
    fn duplicate_expert_registration_is_rejected() {
        let mut registry = ExpertRegistry::new();
        registry.register(Arc::new(experts::TimeoutExpert)).unwrap();
        let err = registry
            .register(Arc::new(experts::TimeoutExpert))
            .unwrap_err();
        assert!(matches!(err, TriageError::DuplicateExpert(Category::Timeout)));
    }

    #[test]
    fn unknown_category_falls_back_to_other_expert() {
        let mut registry = ExpertRegistry::new();
        registry.register(Arc::new(experts::OtherExpert)).unwrap();
        assert!(registry.get(Category::InvalidCoupon).is_some());
    }
}
