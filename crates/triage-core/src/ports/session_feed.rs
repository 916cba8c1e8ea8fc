//! SessionFeed port - the paginated source of completed sessions.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::Trace;

/// Opaque cursor into the session feed. RFC3339 timestamp of the last
/// successfully processed session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Watermark(String);

impl Watermark {
    /// Cursor before everything; the first cycle starts here.
    pub fn origin() -> Self {
        Self("1970-01-01T00:00:00Z".to_string())
    }

    pub fn at(ts: DateTime<Utc>) -> Self {
        Self(ts.to_rfc3339())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("session feed unreachable: {0}")]
    Unreachable(String),
}

/// One page of completed sessions.
#[derive(Debug, Clone)]
pub struct FeedPage {
    /// Traces for sessions completed after the requested watermark,
    /// oldest first.
    pub traces: Vec<Trace>,
    /// Cursor positioned after the last trace in this page. Equal to the
    /// requested watermark when the page is empty and `now` otherwise only
    /// if the feed chooses to fast-forward.
    pub next: Watermark,
}

/// Cursor-based read of completed sessions.
#[async_trait]
pub trait SessionFeed: Send + Sync {
    async fn completed_since(
        &self,
        watermark: &Watermark,
        limit: usize,
    ) -> Result<FeedPage, FeedError>;

    /// Fetch one trace by id (on-demand diagnosis path).
    async fn trace(&self, trace_id: &crate::domain::TraceId) -> Result<Option<Trace>, FeedError>;
}
