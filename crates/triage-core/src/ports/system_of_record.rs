//! SystemOfRecord port - read-only persistence check.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{SessionId, TraceId};

/// Parameters for an existence query against the system of record.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordQuery {
    pub session_id: SessionId,
    pub trace_id: TraceId,
    /// Entity kind, e.g. "order".
    pub entity: String,
    /// Matching parameters (item codes, totals, ...).
    pub params: serde_json::Value,
}

#[derive(Debug, Error)]
pub enum LookupError {
    /// Worth retrying: network blip, 5xx from the record system.
    #[error("transient lookup failure: {0}")]
    Transient(String),

    /// Not worth retrying: bad query, auth, unknown entity kind.
    #[error("permanent lookup failure: {0}")]
    Permanent(String),
}

/// "Does an entity matching these parameters exist?"
///
/// Must be idempotent and side-effect-free; the verifier never calls
/// mutating endpoints.
#[async_trait]
pub trait SystemOfRecord: Send + Sync {
    async fn entity_exists(&self, query: &RecordQuery) -> Result<bool, LookupError>;
}
