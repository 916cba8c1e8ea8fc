//! Demo wiring: the whole triage pipeline on in-memory adapters.
//!
//! Seeds a few completed agent sessions (one broken order among them), runs
//! one monitoring cycle, asks for an on-demand diagnosis, and prints the
//! dashboard. No network, no external services.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use triage_core::diagnose::DiagnosisEngine;
use triage_core::domain::{
    RecordedRequest, SessionId, Step, StepResponse, StepStatus, Trace, TraceId,
};
use triage_core::impls::{
    HeuristicIntentModel, InMemoryFeed, InMemoryRecord, InMemoryStore, StaticCatalog,
};
use triage_core::ports::{CatalogEntry, CatalogKind, ReferenceCatalog, SystemClock, UlidGenerator};
use triage_core::{
    ExpertRegistry, InFlightRegistry, MockTarget, MonitoringScheduler, ReplayHarness, StatusBoard,
    TriageConfig, TriagePipeline, TriageService,
};

fn order_step(status: StepStatus, code: u16, body: serde_json::Value, items: &[&str]) -> Step {
    Step {
        name: "create_order".to_string(),
        status,
        request: RecordedRequest {
            method: "POST".to_string(),
            path: "/orders".to_string(),
            payload: serde_json::json!({"items": items}),
        },
        response: Some(StepResponse {
            status_code: code,
            body,
            latency_ms: 64,
        }),
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = TriageConfig::from_env().expect("config");

    // (A) collaborators: feed, store, system of record, catalog
    let feed = InMemoryFeed::new();
    let store = InMemoryStore::new();
    let record = InMemoryRecord::new();
    let catalog: Arc<dyn ReferenceCatalog> = Arc::new(
        StaticCatalog::new()
            .with_entry(
                CatalogKind::MenuItem,
                CatalogEntry {
                    code: "P12".to_string(),
                    available: true,
                    alternatives: vec![],
                },
            )
            .with_entry(
                CatalogKind::MenuItem,
                CatalogEntry {
                    code: "X1".to_string(),
                    available: false,
                    alternatives: vec!["P12".to_string()],
                },
            ),
    );

    // (B) seed two completed sessions: one healthy, one broken order
    let now = Utc::now();
    let healthy = Trace {
        trace_id: TraceId::new("tr_healthy"),
        session_id: SessionId::new("sess_healthy"),
        captured_at: now - ChronoDuration::minutes(3),
        steps: vec![order_step(
            StepStatus::Success,
            201,
            serde_json::json!({"order_id": "ord_1"}),
            &["P12"],
        )],
    };
    record.insert(healthy.session_id.clone(), "order");
    let broken = Trace {
        trace_id: TraceId::new("tr_broken"),
        session_id: SessionId::new("sess_broken"),
        captured_at: now - ChronoDuration::minutes(1),
        steps: vec![order_step(
            StepStatus::Fail,
            400,
            serde_json::json!({"error": "invalid_item", "code": "X1"}),
            &["X1"],
        )],
    };
    feed.push(healthy);
    feed.push(broken.clone());

    // (C) assemble the pipeline around a deterministic mock replay target
    let engine = DiagnosisEngine::new(
        ExpertRegistry::with_defaults(catalog),
        ReplayHarness::new(
            Arc::new(MockTarget::from_trace(&broken)),
            config.replay_timeout(),
        ),
        Arc::new(SystemClock),
        Arc::new(UlidGenerator::new(SystemClock)),
    );
    let pipeline = Arc::new(TriagePipeline::new(
        Arc::new(HeuristicIntentModel),
        Arc::new(record),
        engine,
        Arc::new(store.clone()),
        Arc::new(SystemClock),
        InFlightRegistry::new(),
        config.cooldown(),
    ));
    let scheduler = Arc::new(MonitoringScheduler::new(
        Arc::new(feed.clone()),
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        pipeline.clone(),
        Arc::new(UlidGenerator::new(SystemClock)),
        Arc::new(SystemClock),
        config.monitor_interval(),
        config.page_limit,
        config.concurrency,
    ));

    // (D) one monitoring cycle over the seeded feed
    let (_running, cancel) = watch::channel(false);
    let run = scheduler.run_cycle(&cancel).await;
    println!(
        "monitoring run:\n{}",
        serde_json::to_string_pretty(&run).expect("serialize run")
    );

    // (E) operator asks for the broken trace again, bypassing the cooldown
    let service = TriageService::new(
        Arc::new(feed),
        pipeline,
        Arc::new(store.clone()),
    );
    let outcome = service
        .diagnose_trace(&broken.trace_id)
        .await
        .expect("on-demand diagnosis");
    if let Some(diagnosis) = outcome.diagnosis() {
        println!(
            "on-demand diagnosis:\n{}",
            serde_json::to_string_pretty(diagnosis).expect("serialize diagnosis")
        );
    }

    // (F) dashboard over the last hour
    let board = StatusBoard::new(
        Arc::new(store),
        Arc::new(SystemClock),
        scheduler.cycle_flag(),
    );
    let snapshot = board
        .snapshot(ChronoDuration::hours(1))
        .await
        .expect("snapshot");
    println!(
        "dashboard:\n{}",
        serde_json::to_string_pretty(&snapshot).expect("serialize snapshot")
    );

    // (G) show the scheduler lifecycle: spawn, then graceful shutdown
    let handle = scheduler.spawn();
    tokio::time::sleep(Duration::from_millis(20)).await;
    handle.shutdown().await;
}
