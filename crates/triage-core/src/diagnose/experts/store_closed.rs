//! Store-closed expert.
//!
//! Nothing to correct in the payload; the investigation establishes whether
//! the closure is still in effect, which drives the resolution timing.

use std::sync::Arc;

use async_trait::async_trait;

use crate::diagnose::expert::{CategoryExpert, Findings, InvestigationContext};
use crate::domain::{Category, CheckStatus};
use crate::ports::ReferenceCatalog;

pub struct StoreClosedExpert {
    catalog: Arc<dyn ReferenceCatalog>,
}

impl StoreClosedExpert {
    pub fn new(catalog: Arc<dyn ReferenceCatalog>) -> Self {
        Self { catalog }
    }
}

#[async_trait]
impl CategoryExpert for StoreClosedExpert {
    fn category(&self) -> Category {
        Category::StoreClosed
    }

    async fn investigate(&self, ctx: &InvestigationContext<'_>) -> Findings {
        let mut findings = Findings::new(
            "the store was not accepting orders",
            "The order endpoint rejected the request because the store was closed \
             when the session ran.",
        );

        let closure_code = ctx
            .failing_step
            .response
            .as_ref()
            .and_then(|r| r.body.get("error").and_then(|v| v.as_str()))
            .unwrap_or("store_closed");
        findings.push_check(
            "closure reported by endpoint",
            CheckStatus::Pass,
            format!("error code: {closure_code}"),
        );

        match self.catalog.store_open().await {
            Ok(false) => {
                findings.push_check(
                    "store open now",
                    CheckStatus::Fail,
                    "store still reports closed",
                );
            }
            Ok(true) => {
                findings.push_check(
                    "store open now",
                    CheckStatus::Warn,
                    "store is open now; the failure was time dependent",
                );
                findings.explanation = "The store was closed when the session ran but has \
                     since opened; a resubmission would likely succeed."
                    .to_string();
            }
            Err(err) => {
                findings.push_check("store open now", CheckStatus::Error, err.to_string());
            }
        }

        findings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    use crate::domain::{
        FulfillmentCheck, Intent, RecordedRequest, SessionId, Step, StepResponse, StepStatus,
        Trace, TraceId,
    };
    use crate::ports::{CatalogEntry, CatalogKind, LookupError};

    struct StoreState(bool);

    #[async_trait]
    impl ReferenceCatalog for StoreState {
        async fn lookup(
            &self,
            _kind: CatalogKind,
            _code: &str,
        ) -> Result<Option<CatalogEntry>, LookupError> {
            Ok(None)
        }

        async fn store_open(&self) -> Result<bool, LookupError> {
            Ok(self.0)
        }
    }

    fn ctx_parts() -> (Trace, FulfillmentCheck) {
        let step = Step {
            name: "create_order".to_string(),
            status: StepStatus::Fail,
            request: RecordedRequest {
                method: "POST".to_string(),
                path: "/orders".to_string(),
                payload: serde_json::json!({"items": ["P12"]}),
            },
            response: Some(StepResponse {
                status_code: 409,
                body: serde_json::json!({"error": "store_closed"}),
                latency_ms: 18,
            }),
        };
        let trace = Trace {
            trace_id: TraceId::new("tr_s"),
            session_id: SessionId::new("sess_s"),
            captured_at: Utc::now(),
            steps: vec![step],
        };
        let check = FulfillmentCheck::unfulfilled(
            TraceId::new("tr_s"),
            Intent::PlaceOrder,
            "store closed",
            Utc::now(),
        );
        (trace, check)
    }

    #[tokio::test]
    async fn still_closed_is_a_definitive_fail_check() {
        let (trace, check) = ctx_parts();
        let ctx = InvestigationContext {
            trace: &trace,
            failing_step: &trace.steps[0],
            check: &check,
        };
        let findings = StoreClosedExpert::new(Arc::new(StoreState(false)))
            .investigate(&ctx)
            .await;
        assert!(findings
            .checks
            .iter()
            .any(|c| c.label == "store open now" && c.status == CheckStatus::Fail));
        assert!(findings.correction.is_none());
    }

    #[tokio::test]
    async fn reopened_store_is_a_warn() {
        let (trace, check) = ctx_parts();
        let ctx = InvestigationContext {
            trace: &trace,
            failing_step: &trace.steps[0],
            check: &check,
        };
        let findings = StoreClosedExpert::new(Arc::new(StoreState(true)))
            .investigate(&ctx)
            .await;
        assert!(findings
            .checks
            .iter()
            .any(|c| c.label == "store open now" && c.status == CheckStatus::Warn));
    }
}
