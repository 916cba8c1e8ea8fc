//! Failure-category matching.
//!
//! An ordered first-match table over the failing step's error signature.
//! Earlier rules are more specific; the last rule always matches, so every
//! failure gets a category.

use crate::domain::{Category, Step};
use crate::replay::ErrorSignature;

/// Keyword rules, checked in order against the machine error text.
const CODE_RULES: &[(&[&str], Category)] = &[
    (
        &["invalid_item", "item_not_found", "unknown_item", "sold_out"],
        Category::InvalidMenuItem,
    ),
    (
        &["invalid_coupon", "coupon_expired", "expired_coupon", "coupon_not_found"],
        Category::InvalidCoupon,
    ),
    (
        &["invalid_address", "address_not_found", "out_of_delivery_area", "undeliverable"],
        Category::InvalidAddress,
    ),
    (
        &["store_closed", "outside_business_hours", "closed"],
        Category::StoreClosed,
    ),
    (&["timeout", "timed_out"], Category::Timeout),
    (
        &["schema", "validation_error", "missing_field", "type_error", "invalid_payload"],
        Category::SchemaMismatch,
    ),
];

/// Classify the failing step. Total: unmatched failures are `Other`.
pub fn match_category(step: &Step) -> Category {
    let signature = ErrorSignature::of_step(step);

    if signature.timed_out() {
        return Category::Timeout;
    }

    // The body may carry the machine code in `code`, `error`, or both;
    // scan everything it offered.
    let texts = error_texts(step);
    for (keywords, category) in CODE_RULES {
        for text in &texts {
            if keywords.iter().any(|kw| text.contains(kw)) {
                return *category;
            }
        }
    }

    match signature.status_code {
        s if (500..600).contains(&s) => Category::ServiceError,
        422 => Category::SchemaMismatch,
        _ => Category::Other,
    }
}

fn error_texts(step: &Step) -> Vec<String> {
    let Some(response) = &step.response else {
        return Vec::new();
    };
    ["error", "code", "message"]
        .iter()
        .filter_map(|field| response.body.get(field))
        .filter_map(|v| v.as_str())
        .map(str::to_lowercase)
        .collect()
}
