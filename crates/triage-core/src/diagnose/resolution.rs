//! Resolution step templates.
//!
//! Ordered, human-actionable steps derived from the category, the items the
//! investigation flagged, and what the replay showed. Operators read these
//! verbatim in the dashboard, so wording stays concrete.

use crate::domain::{Category, FixProposal, ProblematicItem, ReplayResult, ReplayVerdict};

pub fn steps(
    category: Category,
    items: &[ProblematicItem],
    replay: Option<&ReplayResult>,
    fix: Option<&FixProposal>,
) -> Vec<String> {
    let mut out = Vec::new();
    let codes = || {
        items
            .iter()
            .map(|i| i.code.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    };

    match category {
        Category::InvalidMenuItem => {
            out.push(format!(
                "Contact the customer: item(s) {} could not be ordered",
                codes()
            ));
            for item in items {
                if !item.alternatives.is_empty() {
                    out.push(format!(
                        "Offer alternatives for {}: {}",
                        item.code,
                        item.alternatives.join(", ")
                    ));
                }
            }
        }
        Category::InvalidCoupon => {
            out.push(format!(
                "Inform the customer that coupon {} was rejected",
                codes()
            ));
            out.push("Resubmit the order without the coupon or with a currently valid one".to_string());
        }
        Category::InvalidAddress => {
            out.push("Confirm the delivery address with the customer".to_string());
            if items.iter().any(|i| !i.alternatives.is_empty()) {
                out.push("Suggest the nearest deliverable address from the investigation findings".to_string());
            }
        }
        Category::StoreClosed => {
            out.push("No retry will help until the store reopens".to_string());
            out.push("Schedule resubmission for the store's business hours".to_string());
        }
        Category::Timeout => {
            out.push("Check downstream latency dashboards for the affected endpoint".to_string());
            if matches!(
                replay.and_then(ReplayResult::verdict),
                Some(ReplayVerdict::Succeeded)
            ) {
                out.push("The call now succeeds on replay; the timeout was transient. Resubmit the original request".to_string());
            } else {
                out.push("Retry once the endpoint's latency recovers".to_string());
            }
        }
        Category::ServiceError => {
            out.push("Escalate to the owning service team with the trace id and response body".to_string());
            if matches!(
                replay.and_then(ReplayResult::verdict),
                Some(ReplayVerdict::SameError)
            ) {
                out.push("The failure still reproduces; hold retries until the service recovers".to_string());
            }
        }
        Category::SchemaMismatch => {
            out.push("Update the agent's request template so the payload matches the endpoint's schema".to_string());
        }
        Category::Other => {
            out.push("Manual investigation required; the failure matched no known category".to_string());
            out.push("Attach the trace and the investigation checks to the escalation ticket".to_string());
        }
    }

    if let Some(fix) = fix {
        if fix.is_verified() {
            out.push(
                "Resubmit using the corrected request; the fix was verified by replay".to_string(),
            );
        } else {
            out.push("A corrected request was drafted but not verified; review before resubmitting".to_string());
        }
    }

    if matches!(
        replay.and_then(ReplayResult::verdict),
        Some(ReplayVerdict::DifferentError)
    ) {
        out.push("Replay surfaced a different failure; investigate the new error before acting on the above".to_string());
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FixTestResult;

    fn item(code: &str, alternatives: &[&str]) -> ProblematicItem {
        ProblematicItem {
            code: code.to_string(),
            reason: "not available".to_string(),
            alternatives: alternatives.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn menu_item_steps_name_codes_and_alternatives() {
        let steps = steps(
            Category::InvalidMenuItem,
            &[item("X1", &["P12", "P13"])],
            None,
            None,
        );
        assert!(steps[0].contains("X1"));
        assert!(steps.iter().any(|s| s.contains("P12")));
    }

    #[test]
    fn verified_fix_adds_resubmit_step() {
        let fix = FixProposal {
            description: "swap item".to_string(),
            changes: vec![],
            test_result: Some(FixTestResult {
                success: true,
                status_code: 200,
                response_time_ms: 15,
                note: None,
            }),
        };
        let steps = steps(Category::InvalidMenuItem, &[item("X1", &[])], None, Some(&fix));
        assert!(steps.iter().any(|s| s.contains("verified by replay")));
    }

    #[test]
    fn different_error_replay_appends_warning() {
        let replay = ReplayResult {
            performed: true,
            success: false,
            same_error: false,
            status_code: 500,
            response_time_ms: 30,
            error_message: None,
        };
        let steps = steps(Category::InvalidMenuItem, &[item("X1", &[])], Some(&replay), None);
        assert!(steps.last().unwrap().contains("different failure"));
    }

    #[test]
    fn every_category_produces_at_least_one_step() {
        for c in Category::all() {
            assert!(!steps(*c, &[], None, None).is_empty(), "{c:?}");
        }
    }
}
