//! In-memory session feed, paginated by capture time.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{Trace, TraceId};
use crate::ports::{FeedError, FeedPage, SessionFeed, Watermark};

#[derive(Clone, Default)]
pub struct InMemoryFeed {
    traces: Arc<Mutex<Vec<Trace>>>,
}

impl InMemoryFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, trace: Trace) {
        self.traces
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(trace);
    }

    fn parse(watermark: &Watermark) -> Result<DateTime<Utc>, FeedError> {
        DateTime::parse_from_rfc3339(watermark.as_str())
            .map(|t| t.with_timezone(&Utc))
            .map_err(|e| FeedError::Unreachable(format!("bad watermark: {e}")))
    }
}

#[async_trait]
impl SessionFeed for InMemoryFeed {
    async fn completed_since(
        &self,
        watermark: &Watermark,
        limit: usize,
    ) -> Result<FeedPage, FeedError> {
        let since = Self::parse(watermark)?;
        let mut page: Vec<Trace> = self
            .traces
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .iter()
            .filter(|t| t.captured_at > since)
            .cloned()
            .collect();
        page.sort_by_key(|t| t.captured_at);
        page.truncate(limit);

        let next = page
            .last()
            .map(|t| Watermark::at(t.captured_at))
            .unwrap_or_else(|| watermark.clone());
        Ok(FeedPage {
            traces: page,
            next,
        })
    }

    async fn trace(&self, trace_id: &TraceId) -> Result<Option<Trace>, FeedError> {
        Ok(self
            .traces
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .iter()
            .find(|t| &t.trace_id == trace_id)
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    use crate::domain::SessionId;

    fn trace(id: &str, captured_at: DateTime<Utc>) -> Trace {
        Trace {
            trace_id: TraceId::new(id),
            session_id: SessionId::new("sess_f"),
            captured_at,
            steps: vec![],
        }
    }

    #[tokio::test]
    async fn pages_are_oldest_first_and_bounded() {
        let feed = InMemoryFeed::new();
        let now = Utc::now();
        feed.push(trace("tr_2", now - Duration::minutes(1)));
        feed.push(trace("tr_1", now - Duration::minutes(2)));
        feed.push(trace("tr_3", now));

        let page = feed.completed_since(&Watermark::origin(), 2).await.unwrap();
        assert_eq!(page.traces.len(), 2);
        assert_eq!(page.traces[0].trace_id.as_str(), "tr_1");
        assert_eq!(page.next, Watermark::at(now - Duration::minutes(1)));
    }

    #[tokio::test]
    async fn empty_page_keeps_the_watermark() {
        let feed = InMemoryFeed::new();
        let wm = Watermark::at(Utc::now());
        let page = feed.completed_since(&wm, 10).await.unwrap();
        assert!(page.traces.is_empty());
        assert_eq!(page.next, wm);
    }

    #[tokio::test]
    async fn watermark_excludes_already_processed_sessions() {
        let feed = InMemoryFeed::new();
        let now = Utc::now();
        feed.push(trace("tr_1", now - Duration::minutes(2)));
        feed.push(trace("tr_2", now));

        let wm = Watermark::at(now - Duration::minutes(2));
        let page = feed.completed_since(&wm, 10).await.unwrap();
        assert_eq!(page.traces.len(), 1);
        assert_eq!(page.traces[0].trace_id.as_str(), "tr_2");
    }
}
