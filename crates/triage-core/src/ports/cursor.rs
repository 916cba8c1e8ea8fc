//! CursorStore port - the monitoring high-water-mark.
//!
//! The watermark lives outside process memory so a crash/restart resumes
//! instead of reprocessing or skipping. `advance` is compare-and-swap: a
//! concurrent cycle that lost the race must not clobber the winner.

use async_trait::async_trait;

use crate::domain::TriageError;
use crate::ports::session_feed::Watermark;

#[async_trait]
pub trait CursorStore: Send + Sync {
    async fn load(&self) -> Result<Watermark, TriageError>;

    /// Atomically replace `from` with `to`. Returns `Ok(false)` when the
    /// stored watermark no longer equals `from` (CAS miss); the caller must
    /// not treat that as an error; it simply does not advance.
    async fn advance(&self, from: &Watermark, to: &Watermark) -> Result<bool, TriageError>;
}
