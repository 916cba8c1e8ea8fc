//! Invalid-address expert.
//!
//! Validates the delivery address against the address catalog. No automatic
//! fix is drafted unless the catalog itself names a deliverable variant; a
//! guessed address must never be resubmitted without the customer.

use std::sync::Arc;

use async_trait::async_trait;

use crate::diagnose::expert::{CategoryExpert, CorrectedRequest, Findings, InvestigationContext};
use crate::domain::{Category, CheckStatus, FixChange, ProblematicItem};
use crate::ports::{CatalogKind, ReferenceCatalog};

pub struct AddressExpert {
    catalog: Arc<dyn ReferenceCatalog>,
}

impl AddressExpert {
    pub fn new(catalog: Arc<dyn ReferenceCatalog>) -> Self {
        Self { catalog }
    }
}

#[async_trait]
impl CategoryExpert for AddressExpert {
    fn category(&self) -> Category {
        Category::InvalidAddress
    }

    async fn investigate(&self, ctx: &InvestigationContext<'_>) -> Findings {
        let mut findings = Findings::new(
            "the delivery address was rejected",
            "The order endpoint refused the request because of its delivery address.",
        );

        let Some(address) = ctx.failing_step.request.payload["address"]
            .as_str()
            .map(str::to_string)
        else {
            findings.push_check(
                "extract delivery address",
                CheckStatus::Warn,
                "the failing request carries no address field",
            );
            return findings;
        };
        findings.push_check(
            "extract delivery address",
            CheckStatus::Pass,
            format!("address: {address}"),
        );

        match self.catalog.lookup(CatalogKind::Address, &address).await {
            Ok(None) => {
                findings.push_check(
                    "address lookup",
                    CheckStatus::Fail,
                    "address unknown or outside every delivery area",
                );
                findings.root_cause = format!("address {address:?} is not deliverable");
                findings.problematic_items.push(ProblematicItem {
                    code: address,
                    reason: "unknown or outside delivery area".to_string(),
                    alternatives: Vec::new(),
                });
            }
            Ok(Some(entry)) if !entry.available => {
                findings.push_check(
                    "address lookup",
                    CheckStatus::Fail,
                    "known address, delivery currently suspended there",
                );
                findings.root_cause = format!("delivery to {address:?} is currently suspended");
                if let Some(alt) = entry.alternatives.first() {
                    let mut corrected = ctx.failing_step.request.clone();
                    corrected.payload["address"] = serde_json::Value::String(alt.clone());
                    findings.correction = Some(CorrectedRequest {
                        description: format!(
                            "use the catalog's deliverable variant {alt:?} (confirm with the customer)"
                        ),
                        changes: vec![FixChange {
                            field: "address".to_string(),
                            from: serde_json::Value::String(address.clone()),
                            to: serde_json::Value::String(alt.clone()),
                        }],
                        request: corrected,
                    });
                }
                findings.problematic_items.push(ProblematicItem {
                    code: address,
                    reason: "delivery suspended".to_string(),
                    alternatives: entry.alternatives,
                });
            }
            Ok(Some(_)) => {
                findings.push_check(
                    "address lookup",
                    CheckStatus::Pass,
                    "catalog says deliverable",
                );
                findings.root_cause =
                    "address rejected despite the catalog calling it deliverable".to_string();
                findings.explanation = "The endpoint and the address catalog disagree; the \
                     rejection may depend on order contents or time of day."
                    .to_string();
            }
            Err(err) => {
                findings.push_check("address lookup", CheckStatus::Error, err.to_string());
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
    use crate::ports::{CatalogEntry, LookupError};

    struct FailingCatalog;

    #[async_trait]
    impl ReferenceCatalog for FailingCatalog {
        async fn lookup(
            &self,
            _kind: CatalogKind,
            _code: &str,
        ) -> Result<Option<CatalogEntry>, LookupError> {
            Err(LookupError::Transient("catalog down".to_string()))
        }

        async fn store_open(&self) -> Result<bool, LookupError> {
            Err(LookupError::Transient("catalog down".to_string()))
        }
    }

    #[tokio::test]
    async fn catalog_outage_degrades_to_error_check() {
        let step = Step {
            name: "create_order".to_string(),
            status: StepStatus::Fail,
            request: RecordedRequest {
                method: "POST".to_string(),
                path: "/orders".to_string(),
                payload: serde_json::json!({"address": "1 Nowhere Ln"}),
            },
            response: Some(StepResponse {
                status_code: 400,
                body: serde_json::json!({"error": "invalid_address"}),
                latency_ms: 20,
            }),
        };
        let trace = Trace {
            trace_id: TraceId::new("tr_a"),
            session_id: SessionId::new("sess_a"),
            captured_at: Utc::now(),
            steps: vec![step],
        };
        let check = FulfillmentCheck::unfulfilled(
            TraceId::new("tr_a"),
            Intent::PlaceOrder,
            "address rejected",
            Utc::now(),
        );
        let ctx = InvestigationContext {
            trace: &trace,
            failing_step: &trace.steps[0],
            check: &check,
        };

        let findings = AddressExpert::new(Arc::new(FailingCatalog))
            .investigate(&ctx)
            .await;
        assert!(findings.has_error_check());
        assert!(findings.correction.is_none());
    }
}
