//! Fallback expert for failures no pattern matched.
//!
//! Records what was observed so the escalation ticket is self-contained,
//! and nothing more. Confidence scoring already treats this category as
//! weak evidence.

use async_trait::async_trait;

use crate::diagnose::expert::{CategoryExpert, Findings, InvestigationContext};
use crate::domain::{Category, CheckStatus};

pub struct OtherExpert;

#[async_trait]
impl CategoryExpert for OtherExpert {
    fn category(&self) -> Category {
        Category::Other
    }

    async fn investigate(&self, ctx: &InvestigationContext<'_>) -> Findings {
        let mut findings = Findings::new(
            "unclassified failure",
            "The terminal failure matched no known error pattern; manual \
             investigation is required.",
        );

        match &ctx.failing_step.response {
            Some(r) => {
                findings.root_cause = format!(
                    "unclassified failure (status {}) on {}",
                    r.status_code, ctx.failing_step.request.path
                );
                findings.push_check(
                    "capture terminal response",
                    CheckStatus::Pass,
                    format!("status {}, body: {}", r.status_code, r.body),
                );
            }
            None => {
                findings.push_check(
                    "capture terminal response",
                    CheckStatus::Warn,
                    "the failing step recorded no response",
                );
            }
        }

        if let Some(gap) = &ctx.check.gap {
            findings.push_check("fulfillment gap", CheckStatus::Pass, gap.clone());
        }

        findings
    }
}
