//! Invalid-coupon expert.
//!
//! Checks the coupon code the order carried against the coupon catalog.
//! A rejected coupon is always fixable: worst case, drop it.

use std::sync::Arc;

use async_trait::async_trait;

use crate::diagnose::expert::{CategoryExpert, CorrectedRequest, Findings, InvestigationContext};
use crate::domain::{Category, CheckStatus, FixChange, ProblematicItem};
use crate::ports::{CatalogKind, ReferenceCatalog};

pub struct CouponExpert {
    catalog: Arc<dyn ReferenceCatalog>,
}

impl CouponExpert {
    pub fn new(catalog: Arc<dyn ReferenceCatalog>) -> Self {
        Self { catalog }
    }
}

#[async_trait]
impl CategoryExpert for CouponExpert {
    fn category(&self) -> Category {
        Category::InvalidCoupon
    }

    async fn investigate(&self, ctx: &InvestigationContext<'_>) -> Findings {
        let mut findings = Findings::new(
            "the coupon on the order was rejected",
            "The order endpoint refused the request because of its coupon code.",
        );

        let Some(code) = ctx.failing_step.request.payload["coupon"]
            .as_str()
            .map(str::to_string)
        else {
            findings.push_check(
                "extract coupon code",
                CheckStatus::Warn,
                "the failing request carries no coupon field",
            );
            return findings;
        };
        findings.push_check(
            "extract coupon code",
            CheckStatus::Pass,
            format!("coupon: {code}"),
        );

        let reason = match self.catalog.lookup(CatalogKind::Coupon, &code).await {
            Ok(None) => {
                findings.push_check(
                    format!("coupon lookup {code}"),
                    CheckStatus::Fail,
                    "no such coupon",
                );
                Some(("does not exist", Vec::new()))
            }
            Ok(Some(entry)) if !entry.available => {
                findings.push_check(
                    format!("coupon lookup {code}"),
                    CheckStatus::Fail,
                    "expired or no longer redeemable",
                );
                Some(("expired or no longer redeemable", entry.alternatives))
            }
            Ok(Some(_)) => {
                findings.push_check(
                    format!("coupon lookup {code}"),
                    CheckStatus::Pass,
                    "catalog says redeemable",
                );
                None
            }
            Err(err) => {
                findings.push_check(
                    format!("coupon lookup {code}"),
                    CheckStatus::Error,
                    err.to_string(),
                );
                return findings;
            }
        };

        let Some((why, alternatives)) = reason else {
            findings.root_cause =
                "coupon rejected despite the catalog calling it redeemable".to_string();
            findings.explanation = "The endpoint and the coupon catalog disagree; the coupon \
                 may have per-order conditions the catalog does not model."
                .to_string();
            return findings;
        };

        findings.root_cause = format!("coupon {code} {why}");
        findings.problematic_items.push(ProblematicItem {
            code: code.clone(),
            reason: why.to_string(),
            alternatives: alternatives.clone(),
        });

        // Substitute a replacement coupon when the catalog offers one,
        // otherwise drop the coupon entirely.
        let mut corrected = ctx.failing_step.request.clone();
        let (to, description) = match alternatives.first() {
            Some(alt) => {
                corrected.payload["coupon"] = serde_json::Value::String(alt.clone());
                (
                    serde_json::Value::String(alt.clone()),
                    format!("replace coupon {code} with {alt}"),
                )
            }
            None => {
                if let Some(obj) = corrected.payload.as_object_mut() {
                    obj.remove("coupon");
                }
                (
                    serde_json::Value::Null,
                    format!("drop the rejected coupon {code}"),
                )
            }
        };
        findings.correction = Some(CorrectedRequest {
            description,
            changes: vec![FixChange {
                field: "coupon".to_string(),
                from: serde_json::Value::String(code),
                to,
            }],
            request: corrected,
        });

        findings
    }
}
