//! Timeout expert.
//!
//! Distinguishes a single slow terminal call from session-wide slowness by
//! reading the recorded latencies. No payload fix exists for a timeout.

use async_trait::async_trait;

use crate::diagnose::expert::{CategoryExpert, Findings, InvestigationContext};
use crate::domain::{Category, CheckStatus};
use crate::replay::ErrorSignature;

pub struct TimeoutExpert;

#[async_trait]
impl CategoryExpert for TimeoutExpert {
    fn category(&self) -> Category {
        Category::Timeout
    }

    async fn investigate(&self, ctx: &InvestigationContext<'_>) -> Findings {
        let path = &ctx.failing_step.request.path;
        let mut findings = Findings::new(
            format!("call to {path} timed out"),
            "The downstream endpoint did not answer within the agent's deadline.",
        );

        match &ctx.failing_step.response {
            Some(r) => findings.push_check(
                "terminal call latency",
                CheckStatus::Pass,
                format!("gave up after {}ms with status {}", r.latency_ms, r.status_code),
            ),
            None => findings.push_check(
                "terminal call latency",
                CheckStatus::Pass,
                "no response was recorded at all",
            ),
        }

        let timed_out = ctx
            .trace
            .steps
            .iter()
            .filter(|s| s.is_failure() && ErrorSignature::of_step(s).timed_out())
            .count();
        if timed_out > 1 {
            findings.push_check(
                "scope of slowness",
                CheckStatus::Fail,
                format!("{timed_out} calls in this session timed out; endpoint-wide slowness"),
            );
            findings.explanation = "Multiple calls in the same session timed out; this looks \
                 like sustained downstream slowness rather than one unlucky request."
                .to_string();
        } else {
            findings.push_check(
                "scope of slowness",
                CheckStatus::Pass,
                "only the terminal call timed out",
            );
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

    fn timed_out_step(name: &str) -> Step {
        Step {
            name: name.to_string(),
            status: StepStatus::Fail,
            request: RecordedRequest {
                method: "POST".to_string(),
                path: "/orders".to_string(),
                payload: serde_json::json!({}),
            },
            response: Some(StepResponse {
                status_code: 504,
                body: serde_json::json!({}),
                latency_ms: 30000,
            }),
        }
    }

    #[tokio::test]
    async fn repeated_timeouts_mark_endpoint_wide_slowness() {
        let trace = Trace {
            trace_id: TraceId::new("tr_t"),
            session_id: SessionId::new("sess_t"),
            captured_at: Utc::now(),
            steps: vec![timed_out_step("create_order"), timed_out_step("create_order")],
        };
        let check = FulfillmentCheck::unfulfilled(
            TraceId::new("tr_t"),
            Intent::PlaceOrder,
            "timed out",
            Utc::now(),
        );
        let ctx = InvestigationContext {
            trace: &trace,
            failing_step: &trace.steps[1],
            check: &check,
        };
        let findings = TimeoutExpert.investigate(&ctx).await;
        assert!(findings
            .checks
            .iter()
            .any(|c| c.label == "scope of slowness" && c.status == CheckStatus::Fail));
        assert!(findings.correction.is_none());
    }
}
