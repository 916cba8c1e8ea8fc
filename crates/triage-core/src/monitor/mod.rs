//! Monitoring scheduler.
//!
//! Polls the session feed on a fixed interval, pushes every new trace
//! through the pipeline with bounded concurrency, and records one
//! `MonitoringRun` per cycle whatever happens. The feed cursor only moves
//! past traces that were actually processed, so a crashed cycle reprocesses
//! instead of skipping.

pub mod registry;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Semaphore};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use crate::domain::{MonitoringRun, Trace, TriageError};
use crate::ports::{Clock, CursorStore, IdGenerator, ResultStore, SessionFeed, Watermark};
use crate::service::{PipelineOutcome, TriagePipeline};

pub use registry::{InFlightGuard, InFlightRegistry};

pub struct MonitoringScheduler {
    feed: Arc<dyn SessionFeed>,
    cursor: Arc<dyn CursorStore>,
    store: Arc<dyn ResultStore>,
    pipeline: Arc<TriagePipeline>,
    ids: Arc<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
    interval: Duration,
    page_limit: usize,
    concurrency: usize,
    cycle_active: Arc<AtomicBool>,
}

impl MonitoringScheduler {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        feed: Arc<dyn SessionFeed>,
        cursor: Arc<dyn CursorStore>,
        store: Arc<dyn ResultStore>,
        pipeline: Arc<TriagePipeline>,
        ids: Arc<dyn IdGenerator>,
        clock: Arc<dyn Clock>,
        interval: Duration,
        page_limit: usize,
        concurrency: usize,
    ) -> Self {
        Self {
            feed,
            cursor,
            store,
            pipeline,
            ids,
            clock,
            interval,
            page_limit,
            concurrency,
            cycle_active: Arc::new(AtomicBool::new(false)),
        }
    }

    /// True while a cycle is running. Shared with the status dashboard.
    pub fn cycle_flag(&self) -> Arc<AtomicBool> {
        self.cycle_active.clone()
    }

    /// Run cycles until shutdown. The first cycle starts immediately.
    pub fn spawn(self: Arc<Self>) -> SchedulerHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let mut changed_rx = shutdown_rx.clone();
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        self.run_cycle(&shutdown_rx).await;
                    }
                    _ = changed_rx.changed() => {
                        if *changed_rx.borrow() {
                            info!("monitoring scheduler stopping");
                            break;
                        }
                    }
                }
            }
        });
        SchedulerHandle {
            shutdown: shutdown_tx,
            task,
        }
    }

    /// One polling cycle. Always persists a `MonitoringRun`, error included.
    pub async fn run_cycle(&self, cancel: &watch::Receiver<bool>) -> MonitoringRun {
        self.cycle_active.store(true, Ordering::SeqCst);
        let run = self.cycle_inner(cancel).await;
        self.cycle_active.store(false, Ordering::SeqCst);

        if let Err(err) = self.store.save_run(run.clone()).await {
            error!(error = %err, "failed to persist monitoring run");
        }
        run
    }

    async fn cycle_inner(&self, cancel: &watch::Receiver<bool>) -> MonitoringRun {
        let mut run = MonitoringRun::new(self.ids.run_id(), self.clock.now());

        let watermark = match self.cursor.load().await {
            Ok(w) => w,
            Err(err) => {
                error!(error = %err, "cannot load feed cursor");
                run.error = Some(err.to_string());
                return run;
            }
        };

        let page = match self.feed.completed_since(&watermark, self.page_limit).await {
            Ok(page) => page,
            Err(err) => {
                error!(error = %err, "session feed unavailable, will retry next cycle");
                run.error = Some(err.to_string());
                return run;
            }
        };
        run.sessions_scanned = page.traces.len();
        if page.traces.is_empty() {
            // Nothing new since the watermark. Still advance to now so the
            // scanned-and-quiet span is not re-read every cycle.
            let to = Watermark::at(self.clock.now());
            if !self.cursor.advance(&watermark, &to).await.unwrap_or(false) {
                warn!("watermark advance lost a race or failed; next cycle re-reads the feed");
            }
            return run;
        }

        let handles = self.spawn_workers(&page.traces, cancel);

        // The cursor may only move past the longest prefix of traces that
        // were actually handled; one stuck trace is reprocessed next cycle
        // rather than silently skipped.
        let mut advance_to: Option<Watermark> = None;
        let mut blocked = false;
        for (trace, handle) in page.traces.iter().zip(handles) {
            match handle.await {
                Ok(Ok(outcome)) => {
                    match outcome {
                        PipelineOutcome::Diagnosed(_) => {
                            run.failures_found += 1;
                            run.diagnoses_triggered += 1;
                        }
                        PipelineOutcome::CoolingDown => run.failures_found += 1,
                        PipelineOutcome::NotDiagnosed(_) => {}
                    }
                    if !blocked {
                        advance_to = Some(Watermark::at(trace.captured_at));
                    }
                }
                // Someone else holds the claim; their run covers this trace.
                Ok(Err(TriageError::AlreadyInProgress(_))) => {
                    if !blocked {
                        advance_to = Some(Watermark::at(trace.captured_at));
                    }
                }
                Ok(Err(err)) => {
                    warn!(trace_id = %trace.trace_id, error = %err, "trace left for next cycle");
                    blocked = true;
                }
                Err(join_err) => {
                    error!(trace_id = %trace.trace_id, error = %join_err, "pipeline task panicked");
                    blocked = true;
                }
            }
        }

        if let Some(to) = advance_to
            && !self.cursor.advance(&watermark, &to).await.unwrap_or(false)
        {
            warn!("watermark advance lost a race or failed; next cycle re-reads the feed");
        }

        info!(
            scanned = run.sessions_scanned,
            failures = run.failures_found,
            diagnosed = run.diagnoses_triggered,
            "monitoring cycle finished"
        );
        run
    }

    fn spawn_workers(
        &self,
        traces: &[Trace],
        cancel: &watch::Receiver<bool>,
    ) -> Vec<JoinHandle<Result<PipelineOutcome, TriageError>>> {
        let semaphore = Arc::new(Semaphore::new(self.concurrency.max(1)));
        traces
            .iter()
            .cloned()
            .map(|trace| {
                let semaphore = semaphore.clone();
                let pipeline = self.pipeline.clone();
                let cancel = cancel.clone();
                tokio::spawn(async move {
                    let _permit = semaphore
                        .acquire_owned()
                        .await
                        .map_err(|_| TriageError::Store("scheduler semaphore closed".to_string()))?;
                    pipeline.process(&trace, &cancel, true).await
                })
            })
            .collect()
    }
}

/// Handle to a spawned scheduler. Dropping it does not stop the scheduler;
/// call `shutdown`.
pub struct SchedulerHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        let _ = self.task.await;
    }
}
