//! Caller intent: what the session was trying to accomplish.
//!
//! The vocabulary is closed and domain-specific. A classification that cannot
//! be made (provider down, malformed response) degrades to `Unknown` with
//! confidence 0 instead of failing the pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::TraceId;

/// Closed intent vocabulary for the ordering domain.
///
/// Serialized SCREAMING_SNAKE_CASE to match the labels the classifier is
/// constrained to emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Intent {
    PlaceOrder,
    ModifyOrder,
    CancelOrder,
    QueryOrder,
    Unknown,
}

impl Intent {
    /// Parse a classifier label. Anything outside the vocabulary is `None`
    /// (the caller decides whether that degrades to `Unknown`).
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim() {
            "PLACE_ORDER" => Some(Intent::PlaceOrder),
            "MODIFY_ORDER" => Some(Intent::ModifyOrder),
            "CANCEL_ORDER" => Some(Intent::CancelOrder),
            "QUERY_ORDER" => Some(Intent::QueryOrder),
            "UNKNOWN" => Some(Intent::Unknown),
            _ => None,
        }
    }

    /// All labels the LLM prompt is constrained to.
    pub fn vocabulary() -> &'static [&'static str] {
        &[
            "PLACE_ORDER",
            "MODIFY_ORDER",
            "CANCEL_ORDER",
            "QUERY_ORDER",
            "UNKNOWN",
        ]
    }

    /// Intents that mutate the system of record (their fulfillment must be
    /// confirmed downstream, not just observed in the trace).
    pub fn is_mutating(self) -> bool {
        matches!(
            self,
            Intent::PlaceOrder | Intent::ModifyOrder | Intent::CancelOrder
        )
    }
}

/// One classification of one trace. Recomputed, never mutated: a re-run
/// appends a new record and the old one is retained for audit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentClassification {
    pub trace_id: TraceId,
    pub intent: Intent,
    /// 0..=100. 0 means the classifier could not run.
    pub confidence: u8,
    pub classified_at: DateTime<Utc>,
}

impl IntentClassification {
    /// The degraded classification used when the provider is unavailable.
    pub fn unknown(trace_id: TraceId, at: DateTime<Utc>) -> Self {
        Self {
            trace_id,
            intent: Intent::Unknown,
            confidence: 0,
            classified_at: at,
        }
    }
}
