//! Run lifecycle controller.
//!
//! Owns the session snapshot, start/stop orchestration, and publishes every new
//! snapshot for presentation layers.

use crate::engine::{injector_for, RunEngine};
use crate::model::{RunEvent, RunOutcome, RunStatus, SimConfig, Snapshot, StopMode};
use crate::state::reduce;
use anyhow::Result;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

/// Commands emitted by UI layers to control the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UiCommand {
    Start,
    Stop,
    Quit,
}

/// Internal handle for a running engine task.
struct RunCtx {
    run_id: u64,
    cancel: CancellationToken,
    handle: Option<tokio::task::JoinHandle<RunOutcome>>,
}

pub(crate) struct RunController {
    cfg: SimConfig,
    snapshot: Snapshot,
    snapshot_tx: watch::Sender<Snapshot>,
    event_tx: UnboundedSender<RunEvent>,
    run_ctx: Option<RunCtx>,
}

impl RunController {
    pub(crate) fn new(
        cfg: SimConfig,
        event_tx: UnboundedSender<RunEvent>,
        snapshot_tx: watch::Sender<Snapshot>,
    ) -> Self {
        let snapshot = *snapshot_tx.borrow();
        Self {
            cfg,
            snapshot,
            snapshot_tx,
            event_tx,
            run_ctx: None,
        }
    }

    /// Begin a new run unless one is already running. Returns whether it started.
    pub(crate) fn start(&mut self) -> bool {
        if self.snapshot.run_status == RunStatus::Running {
            debug!(run_id = self.snapshot.run_id, "start ignored: run in flight");
            return false;
        }
        // A run detached by a reset-mode stop can no longer affect state; stop it.
        if let Some(prev) = self.run_ctx.take() {
            prev.cancel.cancel();
        }

        let run_id = self.snapshot.run_id + 1;
        self.publish(&RunEvent::Started { run_id });

        let cancel = CancellationToken::new();
        let engine = RunEngine::new(&self.cfg, injector_for(&self.cfg));
        let event_tx = self.event_tx.clone();
        let token = cancel.clone();
        let handle = tokio::spawn(async move { engine.run(run_id, event_tx, token).await });
        self.run_ctx = Some(RunCtx {
            run_id,
            cancel,
            handle: Some(handle),
        });
        info!(run_id, "run started");
        true
    }

    /// Reset every status, whatever the current state.
    pub(crate) fn stop(&mut self) {
        match self.cfg.stop_mode {
            StopMode::Cancel => {
                if let Some(ctx) = self.run_ctx.take() {
                    ctx.cancel.cancel();
                    debug!(run_id = ctx.run_id, "in-flight run cancelled");
                }
            }
            StopMode::Reset => {
                if self.snapshot.run_status == RunStatus::Running {
                    warn!(
                        run_id = self.snapshot.run_id,
                        "reset without cancel: in-flight run may overwrite the reset"
                    );
                }
            }
        }
        self.publish(&RunEvent::Stopped);
        info!("stopped and reset");
    }

    /// Fold an engine event into the snapshot. Events from runs other than the
    /// current one are dropped.
    pub(crate) fn apply(&mut self, ev: &RunEvent) {
        let current = self.run_ctx.as_ref().map(|ctx| ctx.run_id);
        if ev.run_id().is_some() && ev.run_id() != current {
            trace!(?ev, "dropping event from inactive run");
            return;
        }
        self.publish(ev);
    }

    pub(crate) fn shutdown(&mut self) {
        if let Some(ctx) = self.run_ctx.take() {
            ctx.cancel.cancel();
        }
    }

    #[cfg(test)]
    pub(crate) fn snapshot(&self) -> Snapshot {
        self.snapshot
    }

    fn publish(&mut self, ev: &RunEvent) {
        let next = reduce(&self.snapshot, ev);
        if next != self.snapshot {
            self.snapshot = next;
            self.snapshot_tx.send_replace(next);
        }
    }
}

/// Orchestrate runs based on UI commands and publish snapshots back to presentation layers.
pub(crate) async fn run_controller(
    cfg: SimConfig,
    snapshot_tx: watch::Sender<Snapshot>,
    mut cmd_rx: UnboundedReceiver<UiCommand>,
) -> Result<()> {
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<RunEvent>();
    let start_on_launch = cfg.start_on_launch;
    let mut ctl = RunController::new(cfg, event_tx, snapshot_tx);
    if start_on_launch {
        ctl.start();
    }

    let res = loop {
        tokio::select! {
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(UiCommand::Start) => {
                        ctl.start();
                    }
                    Some(UiCommand::Stop) => ctl.stop(),
                    Some(UiCommand::Quit) | None => {
                        ctl.shutdown();
                        break Ok(());
                    }
                }
            }
            Some(ev) = event_rx.recv() => ctl.apply(&ev),
            // Do not take the JoinHandle before this branch wins; otherwise it can be dropped
            // if another select branch is chosen, and we'll never observe completion.
            maybe_done = async {
                if let Some(ctx) = &mut ctl.run_ctx {
                    if let Some(h) = ctx.handle.as_mut() {
                        return Some((ctx.run_id, h.await));
                    }
                }
                futures::future::pending().await
            } => {
                if let Some((run_id, join_res)) = maybe_done {
                    if let Some(ctx) = &mut ctl.run_ctx {
                        ctx.handle.take();
                    }
                    match join_res {
                        Ok(outcome) => debug!(run_id, ?outcome, "engine task finished"),
                        Err(e) => error!(run_id, "engine task join failed: {e}"),
                    }
                }
            }
        }
    };

    res
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Step, StepStatus};
    use std::time::Duration;

    struct Harness {
        cmd_tx: UnboundedSender<UiCommand>,
        snap_rx: watch::Receiver<Snapshot>,
        task: tokio::task::JoinHandle<Result<()>>,
    }

    impl Harness {
        fn spawn(cfg: SimConfig) -> Self {
            let (snap_tx, snap_rx) = watch::channel(Snapshot::default());
            let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
            let task = tokio::spawn(run_controller(cfg, snap_tx, cmd_rx));
            Self {
                cmd_tx,
                snap_rx,
                task,
            }
        }

        fn send(&self, cmd: UiCommand) {
            self.cmd_tx.send(cmd).unwrap();
        }

        fn snapshot(&self) -> Snapshot {
            *self.snap_rx.borrow()
        }

        async fn quit(self) {
            self.send(UiCommand::Quit);
            self.task.await.unwrap().unwrap();
        }
    }

    fn never_fails() -> SimConfig {
        SimConfig {
            failure_rate: 0.0,
            ..Default::default()
        }
    }

    async fn advance(ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn all_steps_succeed() {
        let h = Harness::spawn(never_fails());
        h.send(UiCommand::Start);
        advance(8_100).await;

        let s = h.snapshot();
        assert_eq!(s.run_status, RunStatus::Completed);
        assert!(s.steps.all(StepStatus::Completed));
        h.quit().await;
    }

    #[tokio::test(start_paused = true)]
    async fn failure_at_pubmed() {
        let h = Harness::spawn(SimConfig {
            fail_at: Some(Step::Pubmed),
            ..Default::default()
        });
        h.send(UiCommand::Start);
        advance(10_000).await;

        let s = h.snapshot();
        assert_eq!(s.run_status, RunStatus::Error);
        assert_eq!(s.steps.get(Step::Schedule), StepStatus::Completed);
        assert_eq!(s.steps.get(Step::Terraform), StepStatus::Completed);
        assert_eq!(s.steps.get(Step::Pubmed), StepStatus::Error);
        assert_eq!(s.steps.get(Step::Email), StepStatus::Idle);
        h.quit().await;
    }

    #[tokio::test(start_paused = true)]
    async fn start_while_running_is_ignored() {
        let h = Harness::spawn(never_fails());
        h.send(UiCommand::Start);
        advance(600).await;
        let before = h.snapshot();
        assert_eq!(before.steps.get(Step::Schedule), StepStatus::Running);

        h.send(UiCommand::Start);
        h.send(UiCommand::Start);
        advance(10).await;
        assert_eq!(h.snapshot(), before);
        h.quit().await;
    }

    #[tokio::test(start_paused = true)]
    async fn steps_run_one_at_a_time_in_order() {
        let mut h = Harness::spawn(never_fails());
        h.send(UiCommand::Start);

        let mut seen_running = Vec::new();
        while h.snap_rx.changed().await.is_ok() {
            let s = *h.snap_rx.borrow_and_update();
            let running: Vec<_> = s
                .steps
                .iter()
                .filter(|(_, st)| *st == StepStatus::Running)
                .map(|(step, _)| step)
                .collect();
            assert!(running.len() <= 1);
            if let Some(step) = running.first() {
                if seen_running.last() != Some(step) {
                    seen_running.push(*step);
                }
            }
            if s.run_status == RunStatus::Completed {
                break;
            }
        }
        assert_eq!(seen_running, Step::ALL);
        h.quit().await;
    }

    #[tokio::test(start_paused = true)]
    async fn stop_mid_run_resets_and_stays_reset() {
        let h = Harness::spawn(never_fails());
        h.send(UiCommand::Start);
        advance(3_000).await;
        assert_eq!(h.snapshot().steps.get(Step::Schedule), StepStatus::Completed);

        h.send(UiCommand::Stop);
        advance(10).await;
        let s = h.snapshot();
        assert_eq!(s.run_status, RunStatus::Stopped);
        assert!(s.steps.all(StepStatus::Idle));

        // Nothing from the cancelled run lands afterwards.
        advance(10_000).await;
        let s = h.snapshot();
        assert_eq!(s.run_status, RunStatus::Stopped);
        assert!(s.steps.all(StepStatus::Idle));
        h.quit().await;
    }

    #[tokio::test(start_paused = true)]
    async fn reset_mode_lets_in_flight_run_overwrite() {
        let h = Harness::spawn(SimConfig {
            stop_mode: StopMode::Reset,
            ..never_fails()
        });
        h.send(UiCommand::Start);
        advance(3_000).await;
        h.send(UiCommand::Stop);
        advance(10).await;
        assert!(h.snapshot().steps.all(StepStatus::Idle));

        // The detached run finishes on top of the reset: schedule stays idle, the
        // step that was running when stopped completes, and so does the run.
        advance(10_000).await;
        let s = h.snapshot();
        assert_eq!(s.run_status, RunStatus::Completed);
        assert_eq!(s.steps.get(Step::Schedule), StepStatus::Idle);
        assert_eq!(s.steps.get(Step::Terraform), StepStatus::Completed);
        assert_eq!(s.steps.get(Step::Pubmed), StepStatus::Completed);
        assert_eq!(s.steps.get(Step::Email), StepStatus::Completed);

        // A completed detached run does not block the next start.
        h.send(UiCommand::Start);
        advance(10).await;
        let s = h.snapshot();
        assert_eq!(s.run_status, RunStatus::Running);
        assert_eq!(s.run_id, 2);
        h.quit().await;
    }

    #[tokio::test(start_paused = true)]
    async fn stop_when_idle_is_harmless() {
        let h = Harness::spawn(never_fails());
        h.send(UiCommand::Stop);
        advance(10).await;
        assert_eq!(h.snapshot(), Snapshot::default());
        h.quit().await;
    }

    #[tokio::test(start_paused = true)]
    async fn restart_after_stop_gets_new_run_id() {
        let h = Harness::spawn(never_fails());
        h.send(UiCommand::Start);
        advance(1_000).await;
        h.send(UiCommand::Stop);
        h.send(UiCommand::Start);
        advance(8_100).await;

        let s = h.snapshot();
        assert_eq!(s.run_id, 2);
        assert_eq!(s.run_status, RunStatus::Completed);
        h.quit().await;
    }

    #[tokio::test(start_paused = true)]
    async fn start_on_launch_begins_immediately() {
        let h = Harness::spawn(SimConfig {
            start_on_launch: true,
            ..never_fails()
        });
        advance(10).await;
        assert_eq!(h.snapshot().run_status, RunStatus::Running);
        h.quit().await;
    }

    #[tokio::test(start_paused = true)]
    async fn controller_drops_events_for_other_runs() {
        let (snap_tx, _snap_rx) = watch::channel(Snapshot::default());
        let (event_tx, _event_rx) = mpsc::unbounded_channel();
        let mut ctl = RunController::new(never_fails(), event_tx, snap_tx);
        assert!(ctl.start());
        ctl.apply(&RunEvent::StepRunning {
            run_id: 7,
            step: Step::Schedule,
        });
        assert!(ctl.snapshot().steps.all(StepStatus::Idle));
        ctl.shutdown();
    }
}
