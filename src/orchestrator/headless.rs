//! Single headless run for text and JSON modes.
//!
//! Drives the engine directly, folds every event through the reducer and records a
//! timeline, so no transition is lost to snapshot coalescing.

use crate::engine::{injector_for, RunEngine};
use crate::model::{RunEvent, RunOutcome, RunReport, SimConfig, Snapshot, TimelineEntry};
use crate::state::reduce;
use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Run one simulation to completion (or cancellation), calling `on_entry` for each
/// recorded transition as it happens.
pub(crate) async fn run_once(
    cfg: &SimConfig,
    cancel: CancellationToken,
    mut on_entry: impl FnMut(&TimelineEntry),
) -> Result<RunReport> {
    const RUN_ID: u64 = 1;

    let started_at = Instant::now();
    let mut snapshot = Snapshot::default();
    let mut timeline = Vec::new();
    let mut record = |event: RunEvent, snapshot: &mut Snapshot| {
        *snapshot = reduce(snapshot, &event);
        let entry = TimelineEntry {
            elapsed_ms: started_at.elapsed().as_millis() as u64,
            event,
            snapshot: *snapshot,
        };
        on_entry(&entry);
        timeline.push(entry);
    };

    record(RunEvent::Started { run_id: RUN_ID }, &mut snapshot);

    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<RunEvent>();
    let engine = RunEngine::new(cfg, injector_for(cfg));
    let handle = tokio::spawn(async move { engine.run(RUN_ID, event_tx, cancel).await });

    while let Some(ev) = event_rx.recv().await {
        record(ev, &mut snapshot);
    }

    let outcome = handle.await.context("run engine task failed")?;
    if outcome == RunOutcome::Cancelled {
        record(RunEvent::Stopped, &mut snapshot);
    }

    Ok(RunReport {
        timestamp_utc: time::OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_else(|_| "now".into()),
        config: cfg.clone(),
        outcome,
        snapshot,
        timeline,
    })
}
