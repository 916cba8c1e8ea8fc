//! Dashboard snapshot: fulfillment health over a time window.
//!
//! Read-only aggregation over the result store. The snapshot is a plain
//! serializable value so callers can render it, ship it, or just print it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::domain::{
    Category, FulfillmentCheck, Intent, MonitoringRun, TraceId, TriageError, Verdict,
};
use crate::ports::{Clock, ResultFilter, ResultStore};

const RECENT_FAILURE_LIMIT: usize = 10;
const TREND_EPSILON: f64 = 0.05;

/// Pass-rate direction across the two halves of the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Improving,
    Stable,
    Degrading,
    /// Not enough data in one of the halves.
    Unknown,
}

/// One unfulfilled/partial check, with its latest diagnosis if any.
#[derive(Debug, Clone, Serialize)]
pub struct FailureSummary {
    pub trace_id: TraceId,
    pub intent: Intent,
    pub verdict: Verdict,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gap: Option<String>,
    pub checked_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<u8>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardSnapshot {
    pub generated_at: DateTime<Utc>,
    pub window_minutes: i64,
    pub cycle_active: bool,
    pub checks_total: usize,
    pub fulfilled: usize,
    /// Fulfilled over all conclusive checks; `None` when there were none.
    /// `error` verdicts are inconclusive and excluded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pass_rate: Option<f64>,
    pub trend: Trend,
    pub recent_failures: Vec<FailureSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_run: Option<MonitoringRun>,
}

pub struct StatusBoard {
    store: Arc<dyn ResultStore>,
    clock: Arc<dyn Clock>,
    cycle_active: Arc<AtomicBool>,
}

impl StatusBoard {
    pub fn new(
        store: Arc<dyn ResultStore>,
        clock: Arc<dyn Clock>,
        cycle_active: Arc<AtomicBool>,
    ) -> Self {
        Self {
            store,
            clock,
            cycle_active,
        }
    }

    pub async fn snapshot(&self, window: Duration) -> Result<DashboardSnapshot, TriageError> {
        let now = self.clock.now();
        let from = now - window;

        let filter = ResultFilter {
            from: Some(from),
            to: Some(now),
            ..Default::default()
        };
        let checks = self.store.fulfillments(&filter).await?;

        let conclusive: Vec<&FulfillmentCheck> = checks
            .iter()
            .filter(|c| c.verdict != Verdict::Error)
            .collect();
        let fulfilled = conclusive
            .iter()
            .filter(|c| c.verdict == Verdict::Fulfilled)
            .count();
        let pass_rate = if conclusive.is_empty() {
            None
        } else {
            Some(fulfilled as f64 / conclusive.len() as f64)
        };

        let midpoint = now - window / 2;
        let trend = trend_between(
            pass_rate_of(conclusive.iter().filter(|c| c.checked_at < midpoint)),
            pass_rate_of(conclusive.iter().filter(|c| c.checked_at >= midpoint)),
        );

        let mut recent_failures = Vec::new();
        for check in checks
            .iter()
            .filter(|c| c.verdict.needs_diagnosis())
            .take(RECENT_FAILURE_LIMIT)
        {
            let latest = self.store.diagnoses_for(&check.trace_id).await?;
            let latest = latest.first();
            recent_failures.push(FailureSummary {
                trace_id: check.trace_id.clone(),
                intent: check.intent,
                verdict: check.verdict,
                gap: check.gap.clone(),
                checked_at: check.checked_at,
                category: latest.map(|d| d.category),
                confidence: latest.map(|d| d.confidence),
            });
        }

        let last_run = self.store.runs(1).await?.into_iter().next();

        Ok(DashboardSnapshot {
            generated_at: now,
            window_minutes: window.num_minutes(),
            cycle_active: self.cycle_active.load(Ordering::SeqCst),
            checks_total: checks.len(),
            fulfilled,
            pass_rate,
            trend,
            recent_failures,
            last_run,
        })
    }
}

fn pass_rate_of<'a>(checks: impl Iterator<Item = &'a &'a FulfillmentCheck>) -> Option<f64> {
    let mut total = 0usize;
    let mut fulfilled = 0usize;
    for check in checks {
        total += 1;
        if check.verdict == Verdict::Fulfilled {
            fulfilled += 1;
        }
    }
    (total > 0).then(|| fulfilled as f64 / total as f64)
}

fn trend_between(earlier: Option<f64>, later: Option<f64>) -> Trend {
    match (earlier, later) {
        (Some(a), Some(b)) if b - a > TREND_EPSILON => Trend::Improving,
        (Some(a), Some(b)) if a - b > TREND_EPSILON => Trend::Degrading,
        (Some(_), Some(_)) => Trend::Stable,
        _ => Trend::Unknown,
    }
}
