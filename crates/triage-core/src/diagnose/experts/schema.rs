//! Schema-mismatch expert.
//!
//! Reads the endpoint's validation error for the offending field. When the
//! body also states what it expected, a corrected payload can be drafted.

use async_trait::async_trait;

use crate::diagnose::expert::{CategoryExpert, CorrectedRequest, Findings, InvestigationContext};
use crate::domain::{Category, CheckStatus, FixChange};

pub struct SchemaExpert;

#[async_trait]
impl CategoryExpert for SchemaExpert {
    fn category(&self) -> Category {
        Category::SchemaMismatch
    }

    async fn investigate(&self, ctx: &InvestigationContext<'_>) -> Findings {
        let mut findings = Findings::new(
            "the request payload does not match the endpoint's schema",
            "The endpoint rejected the payload at validation, before any business \
             logic ran.",
        );

        let Some(body) = ctx.failing_step.response.as_ref().map(|r| &r.body) else {
            findings.push_check(
                "validation error body",
                CheckStatus::Warn,
                "no response body to read the violation from",
            );
            return findings;
        };

        let Some(field) = body.get("field").and_then(|v| v.as_str()) else {
            findings.push_check(
                "validation error body",
                CheckStatus::Warn,
                "the error does not name the offending field",
            );
            return findings;
        };
        findings.push_check(
            "validation error body",
            CheckStatus::Fail,
            format!("offending field: {field}"),
        );
        findings.root_cause = format!("payload field {field:?} violates the endpoint schema");

        if let Some(expected) = body.get("expected")
            && ctx.failing_step.request.payload.is_object()
        {
            let from = ctx.failing_step.request.payload[field].clone();
            let mut corrected = ctx.failing_step.request.clone();
            corrected.payload[field] = expected.clone();
            findings.push_check(
                "expected value stated",
                CheckStatus::Pass,
                format!("endpoint expects {expected}"),
            );
            findings.correction = Some(CorrectedRequest {
                description: format!("set {field} to the value the endpoint expects"),
                changes: vec![FixChange {
                    field: field.to_string(),
                    from,
                    to: expected.clone(),
                }],
                request: corrected,
            });
        } else {
            findings.push_check(
                "expected value stated",
                CheckStatus::Warn,
                "the error names the field but not what it expects",
            );
        }

        findings
    }
}
