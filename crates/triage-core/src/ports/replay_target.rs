//! ReplayTarget port - where a recorded request gets re-executed.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{RecordedRequest, TargetKind};

/// Raw response from a replay target.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetResponse {
    pub status_code: u16,
    pub body: serde_json::Value,
}

#[derive(Debug, Error)]
pub enum TargetError {
    #[error("target unreachable: {0}")]
    Unreachable(String),
}

/// One of the three interchangeable endpoints (mock, sandbox, direct).
/// All accept the same `RecordedRequest` shape, so the harness never changes
/// call-construction logic per target.
#[async_trait]
pub trait ReplayTarget: Send + Sync {
    fn kind(&self) -> TargetKind;

    /// Single attempt; the harness applies the timeout budget around this.
    async fn send(&self, request: &RecordedRequest) -> Result<TargetResponse, TargetError>;
}
