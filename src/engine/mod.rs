pub mod failure;

pub use failure::{injector_for, FailureInjector};

use crate::model::{RunEvent, RunOutcome, SimConfig, Step};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Walks the pipeline steps for one run, emitting a [`RunEvent`] per transition.
pub struct RunEngine {
    setup_delay: Duration,
    work_delay: Duration,
    failures: Box<dyn FailureInjector>,
}

impl RunEngine {
    pub fn new(cfg: &SimConfig, failures: Box<dyn FailureInjector>) -> Self {
        Self {
            setup_delay: cfg.setup_delay,
            work_delay: cfg.work_delay,
            failures,
        }
    }

    /// Run every step in order. Returns early with `Cancelled` as soon as the token
    /// fires during a delay; nothing is emitted after that.
    pub async fn run(
        mut self,
        run_id: u64,
        event_tx: mpsc::UnboundedSender<RunEvent>,
        cancel: CancellationToken,
    ) -> RunOutcome {
        for step in Step::ALL {
            if !pause(self.setup_delay, &cancel).await {
                debug!(run_id, %step, "run cancelled before step");
                return RunOutcome::Cancelled;
            }
            let _ = event_tx.send(RunEvent::StepRunning { run_id, step });
            debug!(run_id, %step, "step running");

            if !pause(self.work_delay, &cancel).await {
                debug!(run_id, %step, "run cancelled during step");
                return RunOutcome::Cancelled;
            }

            if self.failures.should_fail(step) {
                info!(run_id, %step, "simulated step failure");
                let _ = event_tx.send(RunEvent::StepFailed { run_id, step });
                return RunOutcome::Failed(step);
            }
            let _ = event_tx.send(RunEvent::StepCompleted { run_id, step });
            debug!(run_id, %step, "step completed");
        }

        let _ = event_tx.send(RunEvent::RunCompleted { run_id });
        info!(run_id, "run completed");
        RunOutcome::Completed
    }
}

/// Sleep for `d` unless cancelled first. Returns false on cancellation.
async fn pause(d: Duration, cancel: &CancellationToken) -> bool {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(d) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::failure::{FailAt, ScriptedOutcomes};
    use super::*;
    use crate::model::{RunStatus, Snapshot, StepStatus};
    use crate::state::reduce;
    use tokio::time::Instant;

    fn cfg() -> SimConfig {
        SimConfig::default()
    }

    async fn collect(mut rx: mpsc::UnboundedReceiver<RunEvent>) -> Vec<RunEvent> {
        let mut out = Vec::new();
        while let Some(ev) = rx.recv().await {
            out.push(ev);
        }
        out
    }

    #[tokio::test(start_paused = true)]
    async fn successful_run_emits_steps_in_order() {
        let (tx, rx) = mpsc::unbounded_channel();
        let engine = RunEngine::new(&cfg(), Box::new(ScriptedOutcomes::new([])));
        let outcome = engine.run(1, tx, CancellationToken::new()).await;
        assert_eq!(outcome, RunOutcome::Completed);

        let events = collect(rx).await;
        let mut expected = Vec::new();
        for step in Step::ALL {
            expected.push(RunEvent::StepRunning { run_id: 1, step });
            expected.push(RunEvent::StepCompleted { run_id: 1, step });
        }
        expected.push(RunEvent::RunCompleted { run_id: 1 });
        assert_eq!(events, expected);
    }

    #[tokio::test(start_paused = true)]
    async fn each_step_waits_setup_then_work_delay() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let start = Instant::now();
        RunEngine::new(&cfg(), Box::new(ScriptedOutcomes::new([])))
            .run(1, tx, CancellationToken::new())
            .await;
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(4 * (500 + 1500)));
        assert!(elapsed < Duration::from_millis(4 * (500 + 1500) + 50));
    }

    #[tokio::test(start_paused = true)]
    async fn failure_stops_the_run_at_that_step() {
        let (tx, rx) = mpsc::unbounded_channel();
        let engine = RunEngine::new(&cfg(), Box::new(FailAt(Step::Pubmed)));
        let outcome = engine.run(9, tx, CancellationToken::new()).await;
        assert_eq!(outcome, RunOutcome::Failed(Step::Pubmed));

        let events = collect(rx).await;
        assert_eq!(
            events.last(),
            Some(&RunEvent::StepFailed {
                run_id: 9,
                step: Step::Pubmed
            })
        );
        assert!(!events
            .iter()
            .any(|e| matches!(e, RunEvent::StepRunning { step: Step::Email, .. })));

        let snap = std::iter::once(RunEvent::Started { run_id: 9 })
            .chain(events)
            .fold(Snapshot::default(), |s, e| reduce(&s, &e));
        assert_eq!(snap.run_status, RunStatus::Error);
        assert_eq!(snap.steps.get(Step::Email), StepStatus::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_preempts_the_pending_delay() {
        let (tx, rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let engine = RunEngine::new(&cfg(), Box::new(ScriptedOutcomes::new([])));
        let handle = tokio::spawn(engine.run(1, tx, cancel.clone()));

        // Mid-way through terraform's work delay.
        tokio::time::sleep(Duration::from_millis(2000 + 500 + 700)).await;
        cancel.cancel();
        assert_eq!(handle.await.unwrap(), RunOutcome::Cancelled);

        let events = collect(rx).await;
        assert_eq!(
            events,
            vec![
                RunEvent::StepRunning { run_id: 1, step: Step::Schedule },
                RunEvent::StepCompleted { run_id: 1, step: Step::Schedule },
                RunEvent::StepRunning { run_id: 1, step: Step::Terraform },
            ]
        );
    }
}
