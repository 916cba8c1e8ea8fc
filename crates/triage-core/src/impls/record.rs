//! In-memory system of record.
//!
//! Stores (session, entity) pairs that "exist downstream". The verifier's
//! read-only lookup is the only consumer.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::domain::SessionId;
use crate::ports::{LookupError, RecordQuery, SystemOfRecord};

#[derive(Clone, Default)]
pub struct InMemoryRecord {
    entities: Arc<Mutex<HashSet<(SessionId, String)>>>,
}

impl InMemoryRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, session_id: SessionId, entity: impl Into<String>) {
        self.entities
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .insert((session_id, entity.into()));
    }
}

#[async_trait]
impl SystemOfRecord for InMemoryRecord {
    async fn entity_exists(&self, query: &RecordQuery) -> Result<bool, LookupError> {
        Ok(self
            .entities
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .contains(&(query.session_id.clone(), query.entity.clone())))
    }
}
