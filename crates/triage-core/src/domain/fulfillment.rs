//! Fulfillment: did the classified intent actually happen downstream?

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::TraceId;
use super::intent::Intent;

/// Verdict of one fulfillment check.
///
/// `Error` is deliberately distinct from `Unfulfilled`: it means the
/// system-of-record lookup failed after retries, so we do not know. The
/// operator sees "needs manual check", not "found a real problem".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Fulfilled,
    Unfulfilled,
    Partial,
    Error,
}

impl Verdict {
    /// Does this verdict trigger a diagnosis?
    pub fn needs_diagnosis(self) -> bool {
        matches!(self, Verdict::Unfulfilled | Verdict::Partial)
    }
}

/// One verification run for one trace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FulfillmentCheck {
    pub trace_id: TraceId,
    pub intent: Intent,
    pub verdict: Verdict,

    /// Specific gap description when not fulfilled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gap: Option<String>,

    /// Sub-goals left unmet (only meaningful for `Partial`).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unmet_goals: Vec<String>,

    pub checked_at: DateTime<Utc>,
}

impl FulfillmentCheck {
    pub fn fulfilled(trace_id: TraceId, intent: Intent, at: DateTime<Utc>) -> Self {
        Self {
            trace_id,
            intent,
            verdict: Verdict::Fulfilled,
            gap: None,
            unmet_goals: Vec::new(),
            checked_at: at,
        }
    }

    pub fn unfulfilled(
        trace_id: TraceId,
        intent: Intent,
        gap: impl Into<String>,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            trace_id,
            intent,
            verdict: Verdict::Unfulfilled,
            gap: Some(gap.into()),
            unmet_goals: Vec::new(),
            checked_at: at,
        }
    }

    pub fn partial(
        trace_id: TraceId,
        intent: Intent,
        unmet_goals: Vec<String>,
        at: DateTime<Utc>,
    ) -> Self {
        let gap = format!("unmet sub-goals: {}", unmet_goals.join(", "));
        Self {
            trace_id,
            intent,
            verdict: Verdict::Partial,
            gap: Some(gap),
            unmet_goals,
            checked_at: at,
        }
    }

    pub fn error(
        trace_id: TraceId,
        intent: Intent,
        detail: impl Into<String>,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            trace_id,
            intent,
            verdict: Verdict::Error,
            gap: Some(detail.into()),
            unmet_goals: Vec::new(),
            checked_at: at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::fulfilled(Verdict::Fulfilled, false)]
    #[case::unfulfilled(Verdict::Unfulfilled, true)]
    #[case::partial(Verdict::Partial, true)]
    #[case::error(Verdict::Error, false)]
    fn only_unfulfilled_and_partial_trigger_diagnosis(
        #[case] verdict: Verdict,
        #[case] expected: bool,
    ) {
        assert_eq!(verdict.needs_diagnosis(), expected);
    }

    #[test]
    fn partial_names_the_unmet_goals() {
        let check = FulfillmentCheck::partial(
            TraceId::new("t"),
            Intent::PlaceOrder,
            vec!["item P12".to_string(), "item Q4".to_string()],
            Utc::now(),
        );
        assert_eq!(check.verdict, Verdict::Partial);
        assert_eq!(check.unmet_goals.len(), 2);
        assert!(check.gap.as_deref().unwrap().contains("P12"));
    }

    #[test]
    fn verdict_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&Verdict::Unfulfilled).unwrap(),
            "\"unfulfilled\""
        );
    }
}
