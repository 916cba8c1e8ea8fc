//! Service-error expert.
//!
//! A 5xx is the downstream's fault. The only useful question the trace can
//! answer is whether the endpoint worked at any point during the session.

use async_trait::async_trait;

use crate::diagnose::expert::{CategoryExpert, Findings, InvestigationContext};
use crate::domain::{Category, CheckStatus, StepStatus};

pub struct ServiceErrorExpert;

#[async_trait]
impl CategoryExpert for ServiceErrorExpert {
    fn category(&self) -> Category {
        Category::ServiceError
    }

    async fn investigate(&self, ctx: &InvestigationContext<'_>) -> Findings {
        let status = ctx
            .failing_step
            .response
            .as_ref()
            .map(|r| r.status_code)
            .unwrap_or_default();
        let path = &ctx.failing_step.request.path;

        let mut findings = Findings::new(
            format!("{path} returned server error {status}"),
            "The downstream service failed internally; nothing in the request \
             payload caused this.",
        );

        findings.push_check(
            "terminal response",
            CheckStatus::Pass,
            format!("status {status}"),
        );

        if let Some(detail) = ctx
            .failing_step
            .response
            .as_ref()
            .and_then(|r| r.body.get("error").and_then(|v| v.as_str()))
        {
            findings.push_check(
                "error body",
                CheckStatus::Pass,
                format!("downstream reported: {detail}"),
            );
        }

        let worked_earlier = ctx.trace.steps.iter().any(|s| {
            s.status == StepStatus::Success && s.request.path == ctx.failing_step.request.path
        });
        if worked_earlier {
            findings.push_check(
                "endpoint history this session",
                CheckStatus::Warn,
                "the same endpoint succeeded earlier in the session; failure may be \
                 transient or state dependent",
            );
        } else {
            findings.push_check(
                "endpoint history this session",
                CheckStatus::Pass,
                "the endpoint never succeeded during this session",
            );
        }

        findings
    }
}
