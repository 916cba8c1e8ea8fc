//! Error signatures: the comparable shape of a failure.
//!
//! Extracted once from the recorded failing step and once from the replay
//! response, then compared under a per-category rule to decide `same_error`.

use serde_json::Value;

use crate::domain::{Category, Step};

/// Structured summary of one failed (or succeeded) call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorSignature {
    pub status_code: u16,
    /// Machine error code from the body (`code`, falling back to `error`).
    pub error_code: Option<String>,
}

impl ErrorSignature {
    pub fn of_response(status_code: u16, body: &Value) -> Self {
        let error_code = body
            .get("code")
            .and_then(Value::as_str)
            .or_else(|| body.get("error").and_then(Value::as_str))
            .map(str::to_string);
        Self {
            status_code,
            error_code,
        }
    }

    /// Signature of a recorded step. A step with no response at all (transport
    /// failure) reads as status 0, which the timeout rule treats as timed out.
    pub fn of_step(step: &Step) -> Self {
        match &step.response {
            Some(r) => Self::of_response(r.status_code, &r.body),
            None => Self {
                status_code: 0,
                error_code: None,
            },
        }
    }

    /// No response, gateway timeout, or request timeout all count as a
    /// timed-out call for comparison purposes.
    pub fn timed_out(&self) -> bool {
        matches!(self.status_code, 0 | 408 | 504)
            || self.error_code.as_deref() == Some("timeout")
    }

    fn is_server_error(&self) -> bool {
        (500..600).contains(&self.status_code)
    }

    /// Is `other` "the same failure" as `self`, for this failure category?
    ///
    /// Validation categories require both the status and the machine code to
    /// match; infrastructure categories compare at the granularity that is
    /// actually stable across runs (5xx class, timed-out-or-not).
    pub fn same_error(&self, other: &ErrorSignature, category: Category) -> bool {
        match category {
            Category::InvalidMenuItem
            | Category::InvalidCoupon
            | Category::InvalidAddress
            | Category::SchemaMismatch => {
                self.status_code == other.status_code && self.error_code == other.error_code
            }
            Category::StoreClosed => {
                self.error_code.is_some() && self.error_code == other.error_code
            }
            Category::Timeout => self.timed_out() && other.timed_out(),
            Category::ServiceError => self.is_server_error() && other.is_server_error(),
            Category::Other => self.status_code == other.status_code,
        }
    }
}
