//! Heuristic intent model: step names in, intent out.
//!
//! No network, fully deterministic. Used by tests and the demo binary where
//! calling a real LLM provider is not wanted.

use async_trait::async_trait;

use crate::domain::{Intent, Trace};
use crate::ports::{ClassifyError, IntentModel};

pub struct HeuristicIntentModel;

#[async_trait]
impl IntentModel for HeuristicIntentModel {
    async fn classify(&self, trace: &Trace) -> Result<(Intent, u8), ClassifyError> {
        // Last matching step wins: the session's final attempt is what the
        // caller ultimately wanted.
        for step in trace.steps.iter().rev() {
            let intent = match step.name.as_str() {
                "create_order" => Intent::PlaceOrder,
                "update_order" => Intent::ModifyOrder,
                "cancel_order" => Intent::CancelOrder,
                "get_order" => Intent::QueryOrder,
                _ => continue,
            };
            return Ok((intent, 70));
        }
        Ok((Intent::Unknown, 25))
    }
}
