//! The category-expert seam.
//!
//! One expert per failure category. Experts only investigate: they run
//! read-only checks and, when possible, construct a corrected request.
//! Replaying that request and scoring confidence are the engine's job.

use async_trait::async_trait;

use crate::domain::{
    Category, CheckStatus, FixChange, FulfillmentCheck, InvestigationCheck, ProblematicItem,
    RecordedRequest, Step, Trace,
};

/// Everything an expert may look at. Read-only.
pub struct InvestigationContext<'a> {
    pub trace: &'a Trace,
    pub failing_step: &'a Step,
    pub check: &'a FulfillmentCheck,
}

/// A corrected request an expert believes would succeed, with the
/// field-level edits that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrectedRequest {
    pub description: String,
    pub changes: Vec<FixChange>,
    pub request: RecordedRequest,
}

/// What one expert concluded.
#[derive(Debug, Clone, PartialEq)]
pub struct Findings {
    pub checks: Vec<InvestigationCheck>,
    pub root_cause: String,
    pub explanation: String,
    pub problematic_items: Vec<ProblematicItem>,
    /// Present only when the expert could actually build a fix.
    pub correction: Option<CorrectedRequest>,
}

impl Findings {
    pub fn new(root_cause: impl Into<String>, explanation: impl Into<String>) -> Self {
        Self {
            checks: Vec::new(),
            root_cause: root_cause.into(),
            explanation: explanation.into(),
            problematic_items: Vec::new(),
            correction: None,
        }
    }

    pub fn push_check(
        &mut self,
        label: impl Into<String>,
        status: CheckStatus,
        detail: impl Into<String>,
    ) {
        self.checks.push(InvestigationCheck::new(label, status, detail));
    }

    pub fn has_error_check(&self) -> bool {
        self.checks.iter().any(|c| c.status == CheckStatus::Error)
    }
}

#[async_trait]
pub trait CategoryExpert: Send + Sync {
    fn category(&self) -> Category;

    /// Investigate one failure. Infallible: lookup failures become checks
    /// with `error` status, never a propagated error.
    async fn investigate(&self, ctx: &InvestigationContext<'_>) -> Findings;
}
