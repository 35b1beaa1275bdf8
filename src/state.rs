//! Snapshot reducer.
//!
//! Every state change in a session goes through [`reduce`]. The function is pure:
//! presentation layers only ever see snapshots produced here.

use crate::model::{RunEvent, RunStatus, Snapshot, StatusMap, Step, StepStatus};

/// Apply one event to a snapshot and return the next snapshot.
///
/// While the run is live, events that would break an invariant (a second running
/// step, a step event for another run, a step event after the run finished) leave
/// the snapshot unchanged. Once a reset has detached the run, its events are
/// written as they arrive.
pub fn reduce(snapshot: &Snapshot, event: &RunEvent) -> Snapshot {
    match *event {
        RunEvent::Started { run_id } => Snapshot {
            run_id,
            run_status: RunStatus::Running,
            steps: StatusMap::default(),
        },
        RunEvent::Stopped => Snapshot {
            run_id: snapshot.run_id,
            run_status: RunStatus::Stopped,
            steps: StatusMap::default(),
        },
        RunEvent::StepRunning { run_id, step } => match writer(snapshot, run_id) {
            Some(Writer::Live)
                if snapshot.steps.running().is_none()
                    && snapshot.steps.get(step) == StepStatus::Idle =>
            {
                with_step(snapshot, step, StepStatus::Running)
            }
            Some(Writer::Detached) => with_step(snapshot, step, StepStatus::Running),
            _ => *snapshot,
        },
        RunEvent::StepCompleted { run_id, step } => match writer(snapshot, run_id) {
            Some(Writer::Live) if snapshot.steps.get(step) == StepStatus::Running => {
                with_step(snapshot, step, StepStatus::Completed)
            }
            Some(Writer::Detached) => with_step(snapshot, step, StepStatus::Completed),
            _ => *snapshot,
        },
        RunEvent::StepFailed { run_id, step } => match writer(snapshot, run_id) {
            Some(Writer::Live) if snapshot.steps.get(step) == StepStatus::Running => Snapshot {
                run_status: RunStatus::Error,
                ..with_step(snapshot, step, StepStatus::Error)
            },
            Some(Writer::Detached) => Snapshot {
                run_status: RunStatus::Error,
                ..with_step(snapshot, step, StepStatus::Error)
            },
            _ => *snapshot,
        },
        RunEvent::RunCompleted { run_id } => match writer(snapshot, run_id) {
            Some(Writer::Live) if snapshot.steps.all(StepStatus::Completed) => Snapshot {
                run_status: RunStatus::Completed,
                ..*snapshot
            },
            Some(Writer::Detached) => Snapshot {
                run_status: RunStatus::Completed,
                ..*snapshot
            },
            _ => *snapshot,
        },
    }
}

/// How a step event for the snapshot's own run is written.
enum Writer {
    /// The run is in flight and every invariant is checked.
    Live,
    /// The run was reset without being cancelled; its writes land unchecked.
    Detached,
}

fn writer(snapshot: &Snapshot, run_id: u64) -> Option<Writer> {
    if snapshot.run_id != run_id || snapshot.run_status.is_terminal() {
        return None;
    }
    if snapshot.run_status == RunStatus::Running {
        Some(Writer::Live)
    } else {
        Some(Writer::Detached)
    }
}

fn with_step(snapshot: &Snapshot, step: Step, status: StepStatus) -> Snapshot {
    Snapshot {
        steps: snapshot.steps.with(step, status),
        ..*snapshot
    }
}
