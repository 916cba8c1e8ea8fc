//! The central diagnostic artifact and its pieces.
//!
//! A `DiagnosisResult` is immutable once written: a re-run produces a new
//! record keyed by `(trace_id, run_at)`, never an in-place edit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{DiagnosisId, TraceId};
use super::replay::ReplayResult;

/// Closed failure-category set. Unclassifiable failures map to `Other`;
/// the field is never absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    InvalidMenuItem,
    InvalidCoupon,
    InvalidAddress,
    StoreClosed,
    Timeout,
    ServiceError,
    SchemaMismatch,
    Other,
}

impl Category {
    /// Can a corrected single request fix this? `StoreClosed` and `Timeout`
    /// cannot be remediated by changing the payload; `ServiceError` and
    /// `Other` have nothing to correct.
    pub fn is_remediable(self) -> bool {
        matches!(
            self,
            Category::InvalidMenuItem
                | Category::InvalidCoupon
                | Category::InvalidAddress
                | Category::SchemaMismatch
        )
    }

    pub fn all() -> &'static [Category] {
        &[
            Category::InvalidMenuItem,
            Category::InvalidCoupon,
            Category::InvalidAddress,
            Category::StoreClosed,
            Category::Timeout,
            Category::ServiceError,
            Category::SchemaMismatch,
            Category::Other,
        ]
    }
}

/// Status of one investigation check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    Pass,
    Fail,
    Warn,
    Skip,
    Error,
}

impl CheckStatus {
    /// Pass/Fail are definitive findings; Warn/Skip/Error are not.
    pub fn is_definitive(self) -> bool {
        matches!(self, CheckStatus::Pass | CheckStatus::Fail)
    }
}

/// One executed (or skipped) investigation check, in execution order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestigationCheck {
    pub label: String,
    pub status: CheckStatus,
    pub detail: String,
}

impl InvestigationCheck {
    pub fn new(label: impl Into<String>, status: CheckStatus, detail: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            status,
            detail: detail.into(),
        }
    }

    pub fn skipped(label: impl Into<String>) -> Self {
        Self::new(label, CheckStatus::Skip, "root cause already confirmed")
    }
}

/// A referenced item the investigation found to be the problem.
/// Only meaningful for item/validation-type failures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProblematicItem {
    pub code: String,
    pub reason: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alternatives: Vec<String>,
}

/// One field-level change in a corrected request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixChange {
    pub field: String,
    pub from: serde_json::Value,
    pub to: serde_json::Value,
}

/// Outcome of replaying the corrected payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixTestResult {
    pub success: bool,
    pub status_code: u16,
    pub response_time_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// A corrected-request proposal. Only emitted when the expert could actually
/// construct one; `test_result` only ever comes from an executed replay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixProposal {
    pub description: String,
    pub changes: Vec<FixChange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_result: Option<FixTestResult>,
}

impl FixProposal {
    /// A proposal without a passing test is still surfaced, but unverified.
    pub fn is_verified(&self) -> bool {
        self.test_result.as_ref().map(|t| t.success).unwrap_or(false)
    }
}

/// The central diagnostic artifact, keyed by `(trace_id, run_at)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosisResult {
    pub diagnosis_id: DiagnosisId,
    pub trace_id: TraceId,
    pub run_at: DateTime<Utc>,
    pub category: Category,
    /// 0..=100.
    pub confidence: u8,
    pub root_cause: String,
    pub explanation: String,
    pub investigation: Vec<InvestigationCheck>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub problematic_items: Vec<ProblematicItem>,
    /// `None` means replay was not performed for this diagnosis.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replay: Option<ReplayResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fix_proposal: Option<FixProposal>,
    /// Ordered human-actionable steps.
    pub resolution: Vec<String>,
    pub duration_ms: u64,
    /// False when the run was cancelled mid-investigation.
    pub complete: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn category_serializes_screaming_snake() {
        assert_eq!(
            serde_json::to_string(&Category::InvalidMenuItem).unwrap(),
            "\"INVALID_MENU_ITEM\""
        );
        assert_eq!(
            serde_json::to_string(&Category::Other).unwrap(),
            "\"OTHER\""
        );
    }

    #[rstest]
    #[case::menu(Category::InvalidMenuItem, true)]
    #[case::coupon(Category::InvalidCoupon, true)]
    #[case::address(Category::InvalidAddress, true)]
    #[case::schema(Category::SchemaMismatch, true)]
    #[case::store_closed(Category::StoreClosed, false)]
    #[case::timeout(Category::Timeout, false)]
    #[case::service(Category::ServiceError, false)]
    #[case::other(Category::Other, false)]
    fn remediability_per_category(#[case] category: Category, #[case] expected: bool) {
        assert_eq!(category.is_remediable(), expected);
    }

    #[test]
    fn every_category_label_roundtrips() {
        for c in Category::all() {
            let s = serde_json::to_string(c).unwrap();
            let back: Category = serde_json::from_str(&s).unwrap();
            assert_eq!(*c, back);
        }
    }

    #[test]
    fn proposal_without_test_is_unverified() {
        let p = FixProposal {
            description: "swap item".to_string(),
            changes: vec![],
            test_result: None,
        };
        assert!(!p.is_verified());
    }

    #[test]
    fn proposal_with_passing_test_is_verified() {
        let p = FixProposal {
            description: "swap item".to_string(),
            changes: vec![],
            test_result: Some(FixTestResult {
                success: true,
                status_code: 200,
                response_time_ms: 12,
                note: None,
            }),
        };
        assert!(p.is_verified());
    }

    #[rstest]
    #[case::pass(CheckStatus::Pass, true)]
    #[case::fail(CheckStatus::Fail, true)]
    #[case::warn(CheckStatus::Warn, false)]
    #[case::skip(CheckStatus::Skip, false)]
    #[case::error(CheckStatus::Error, false)]
    fn definitive_statuses(#[case] status: CheckStatus, #[case] expected: bool) {
        assert_eq!(status.is_definitive(), expected);
    }
}
