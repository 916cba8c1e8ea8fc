//! Fulfillment verifier: did the classified intent actually happen?
//!
//! The verifier only inspects recorded step outputs plus, for mutating
//! intents, one read-only existence lookup against the system of record.
//! It never calls mutating endpoints.

use tracing::{debug, warn};

use crate::domain::{
    FulfillmentCheck, Intent, IntentClassification, Step, StepStatus, Trace,
};
use crate::ports::{Clock, LookupError, RecordQuery, SystemOfRecord};

/// Read lookups are retried this many times on transient failure before the
/// check is marked `error`.
const LOOKUP_RETRIES: u32 = 2;

pub struct Verifier<'a> {
    record: &'a dyn SystemOfRecord,
    clock: &'a dyn Clock,
}

impl<'a> Verifier<'a> {
    pub fn new(record: &'a dyn SystemOfRecord, clock: &'a dyn Clock) -> Self {
        Self { record, clock }
    }

    /// Walk the trace's steps in order looking for evidence the intent was
    /// realized. A later successful step fully supersedes an earlier failed
    /// attempt at the same sub-goal (retries within a session are not
    /// failures).
    pub async fn verify_fulfillment(
        &self,
        trace: &Trace,
        classification: &IntentClassification,
    ) -> FulfillmentCheck {
        let now = self.clock.now();
        let trace_id = trace.trace_id.clone();
        let intent = classification.intent;

        if intent == Intent::Unknown {
            return FulfillmentCheck::unfulfilled(trace_id, intent, "intent undetermined", now);
        }

        let attempts: Vec<&Step> = trace
            .steps
            .iter()
            .filter(|s| step_matches_intent(intent, s))
            .collect();

        if attempts.is_empty() {
            return FulfillmentCheck::unfulfilled(
                trace_id,
                intent,
                format!("no step attempted the {intent:?} operation"),
                now,
            );
        }

        // Sub-goals are the distinct item codes the session asked for;
        // a sub-goal is met once any successful attempt covers it.
        let requested = requested_items(&attempts);
        let succeeded: Vec<&Step> = attempts
            .iter()
            .copied()
            .filter(|s| s.status == StepStatus::Success)
            .collect();

        if succeeded.is_empty() {
            let gap = attempts
                .last()
                .and_then(|s| s.response.as_ref())
                .map(|r| format!("last attempt failed with status {}", r.status_code))
                .unwrap_or_else(|| "last attempt never completed".to_string());
            return FulfillmentCheck::unfulfilled(trace_id, intent, gap, now);
        }

        if !requested.is_empty() {
            let met = covered_items(&succeeded);
            let unmet: Vec<String> = requested
                .iter()
                .filter(|code| !met.contains(*code))
                .cloned()
                .collect();
            if !unmet.is_empty() {
                let unmet = unmet
                    .into_iter()
                    .map(|code| format!("item {code}"))
                    .collect();
                return FulfillmentCheck::partial(trace_id, intent, unmet, now);
            }
        }

        // The trace says it worked; for mutating intents, confirm the record
        // actually persisted downstream.
        if intent.is_mutating()
            && let Some(last_success) = succeeded.last()
        {
            let query = RecordQuery {
                session_id: trace.session_id.clone(),
                trace_id: trace_id.clone(),
                entity: "order".to_string(),
                params: last_success.request.payload.clone(),
            };
            match self.lookup_with_retries(&query).await {
                Ok(true) => {}
                Ok(false) => {
                    return FulfillmentCheck::unfulfilled(
                        trace_id,
                        intent,
                        "step reported success but no matching record exists downstream",
                        now,
                    );
                }
                Err(err) => {
                    warn!(trace_id = %trace_id, error = %err, "record lookup failed after retries");
                    return FulfillmentCheck::error(
                        trace_id,
                        intent,
                        format!("system-of-record lookup failed: {err}"),
                        now,
                    );
                }
            }
        }

        FulfillmentCheck::fulfilled(trace_id, intent, now)
    }

    async fn lookup_with_retries(&self, query: &RecordQuery) -> Result<bool, LookupError> {
        let mut attempt = 0;
        loop {
            match self.record.entity_exists(query).await {
                Ok(found) => return Ok(found),
                Err(LookupError::Transient(msg)) if attempt < LOOKUP_RETRIES => {
                    attempt += 1;
                    debug!(attempt, error = %msg, "transient lookup failure, retrying");
                }
                Err(err) => return Err(err),
            }
        }
    }
}

/// Does this step attempt the operation the intent is about?
fn step_matches_intent(intent: Intent, step: &Step) -> bool {
    match intent {
        Intent::PlaceOrder => step.name == "create_order",
        Intent::ModifyOrder => step.name == "update_order",
        Intent::CancelOrder => step.name == "cancel_order",
        Intent::QueryOrder => step.name == "get_order",
        Intent::Unknown => false,
    }
}

/// Distinct item codes across all attempts, in first-seen order.
fn requested_items(attempts: &[&Step]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for step in attempts {
        for code in item_codes(step) {
            if !out.contains(&code) {
                out.push(code);
            }
        }
    }
    out
}

/// Item codes covered by successful attempts.
fn covered_items(succeeded: &[&Step]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for step in succeeded {
        for code in item_codes(step) {
            if !out.contains(&code) {
                out.push(code);
            }
        }
    }
    out
}

fn item_codes(step: &Step) -> Vec<String> {
    step.request.payload["items"]
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}
