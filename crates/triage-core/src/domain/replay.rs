//! Replay results: what happened when we re-executed a recorded request.

use serde::{Deserialize, Serialize};

/// Which target a replay was (or would be) sent to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    /// Deterministic, no external call. Same input, same output.
    Mock,
    /// Sandbox / test environment.
    Sandbox,
    /// Live endpoint.
    Direct,
}

/// Outcome classification of a performed replay.
/// Exactly one of these holds whenever `performed == true`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplayVerdict {
    /// The operation now succeeds.
    Succeeded,
    /// Still broken the same way as the original failure.
    SameError,
    /// Broke differently: the surface problem was masked by a deeper one,
    /// or the environment state changed.
    DifferentError,
}

/// Result of one replay attempt (a single attempt; retries are a caller
/// concern).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayResult {
    pub performed: bool,
    pub success: bool,
    pub same_error: bool,
    /// 0 when no HTTP response was obtained (timeout, unreachable).
    pub status_code: u16,
    pub response_time_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl ReplayResult {
    /// The "not performed" placeholder recorded when a category has no
    /// single-request fix to test.
    pub fn not_performed() -> Self {
        Self {
            performed: false,
            success: false,
            same_error: false,
            status_code: 0,
            response_time_ms: 0,
            error_message: None,
        }
    }

    pub fn timeout(elapsed_ms: u64) -> Self {
        Self {
            performed: true,
            success: false,
            same_error: false,
            status_code: 0,
            response_time_ms: elapsed_ms,
            error_message: Some("timeout".to_string()),
        }
    }

    /// Mutually exclusive, exhaustive classification. `None` only when the
    /// replay was never performed.
    pub fn verdict(&self) -> Option<ReplayVerdict> {
        if !self.performed {
            return None;
        }
        Some(if self.success {
            ReplayVerdict::Succeeded
        } else if self.same_error {
            ReplayVerdict::SameError
        } else {
            ReplayVerdict::DifferentError
        })
    }
}
