//! Invalid-menu-item expert.
//!
//! Looks every ordered item code up in the menu catalog, flags the ones that
//! do not exist or are not orderable, and drafts a corrected order when every
//! flagged item has a catalog alternative.

use std::sync::Arc;

use async_trait::async_trait;

use crate::diagnose::expert::{CategoryExpert, CorrectedRequest, Findings, InvestigationContext};
use crate::domain::{Category, CheckStatus, FixChange, ProblematicItem, RecordedRequest};
use crate::ports::{CatalogKind, ReferenceCatalog};

pub struct MenuItemExpert {
    catalog: Arc<dyn ReferenceCatalog>,
}

impl MenuItemExpert {
    pub fn new(catalog: Arc<dyn ReferenceCatalog>) -> Self {
        Self { catalog }
    }
}

pub(crate) fn item_codes(payload: &serde_json::Value) -> Vec<String> {
    payload["items"]
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

fn substituted_request(
    request: &RecordedRequest,
    substitutions: &[(String, String)],
) -> RecordedRequest {
    let mut corrected = request.clone();
    if let Some(items) = corrected.payload["items"].as_array_mut() {
        for item in items.iter_mut() {
            if let Some(code) = item.as_str() {
                if let Some((_, replacement)) = substitutions.iter().find(|(bad, _)| bad == code) {
                    *item = serde_json::Value::String(replacement.clone());
                }
            }
        }
    }
    corrected
}

#[async_trait]
impl CategoryExpert for MenuItemExpert {
    fn category(&self) -> Category {
        Category::InvalidMenuItem
    }

    async fn investigate(&self, ctx: &InvestigationContext<'_>) -> Findings {
        let mut findings = Findings::new(
            "an ordered item was rejected by the menu",
            "The order endpoint rejected the request because at least one item code \
             is not currently orderable.",
        );

        let codes = item_codes(&ctx.failing_step.request.payload);
        if codes.is_empty() {
            findings.push_check(
                "extract ordered items",
                CheckStatus::Warn,
                "the failing request carries no item codes",
            );
            return findings;
        }
        findings.push_check(
            "extract ordered items",
            CheckStatus::Pass,
            format!("ordered: {}", codes.join(", ")),
        );

        let mut substitutions: Vec<(String, String)> = Vec::new();
        let mut unfixable = false;

        for code in &codes {
            match self.catalog.lookup(CatalogKind::MenuItem, code).await {
                Ok(None) => {
                    findings.push_check(
                        format!("menu lookup {code}"),
                        CheckStatus::Fail,
                        "no such item in the menu",
                    );
                    findings.problematic_items.push(ProblematicItem {
                        code: code.clone(),
                        reason: "not in the menu".to_string(),
                        alternatives: Vec::new(),
                    });
                    unfixable = true;
                }
                Ok(Some(entry)) if !entry.available => {
                    findings.push_check(
                        format!("menu lookup {code}"),
                        CheckStatus::Fail,
                        "listed but not currently orderable",
                    );
                    if let Some(alt) = entry.alternatives.first() {
                        substitutions.push((code.clone(), alt.clone()));
                    } else {
                        unfixable = true;
                    }
                    findings.problematic_items.push(ProblematicItem {
                        code: code.clone(),
                        reason: "not currently orderable".to_string(),
                        alternatives: entry.alternatives,
                    });
                }
                Ok(Some(_)) => {
                    findings.push_check(
                        format!("menu lookup {code}"),
                        CheckStatus::Pass,
                        "available",
                    );
                }
                Err(err) => {
                    findings.push_check(
                        format!("menu lookup {code}"),
                        CheckStatus::Error,
                        err.to_string(),
                    );
                }
            }
        }

        if findings.problematic_items.is_empty() {
            findings.root_cause =
                "order rejected as invalid item, but every ordered item checks out".to_string();
            findings.explanation = "The endpoint reported an invalid item, yet the catalog \
                 says all ordered items are available. The catalog and the endpoint may be \
                 out of sync."
                .to_string();
            return findings;
        }

        let flagged = findings
            .problematic_items
            .iter()
            .map(|i| i.code.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        findings.root_cause = format!("item(s) {flagged} cannot be ordered");
        findings
            .checks
            .push(crate::domain::InvestigationCheck::skipped(
                "cross-check recent successful orders",
            ));

        if !substitutions.is_empty() && !unfixable {
            let corrected = substituted_request(&ctx.failing_step.request, &substitutions);
            findings.correction = Some(CorrectedRequest {
                description: "replace unavailable item(s) with catalog alternatives".to_string(),
                changes: vec![FixChange {
                    field: "items".to_string(),
                    from: ctx.failing_step.request.payload["items"].clone(),
                    to: corrected.payload["items"].clone(),
                }],
                request: corrected,
            });
        }

        findings
    }
}
