use crate::model::{RunStatus, Snapshot, StopMode};

const SPINNER: [&str; 4] = ["◐", "◓", "◑", "◒"];

pub struct UiState {
    pub tab: usize,
    pub info: String,
    pub snapshot: Snapshot,
    /// Render tick counter; drives spinners and edge animation only.
    pub frame: u64,
    pub stop_mode: StopMode,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            tab: 0,
            info: "Press s to start the simulation".into(),
            snapshot: Snapshot::default(),
            frame: 0,
            stop_mode: StopMode::Cancel,
        }
    }
}

impl UiState {
    /// Take a newly published snapshot and refresh the status line.
    pub fn apply_snapshot(&mut self, next: Snapshot) {
        let prev = self.snapshot;
        self.snapshot = next;
        if next.run_id != prev.run_id && next.run_status == RunStatus::Running {
            self.info = format!("Run #{} started", next.run_id);
        } else if next.run_status != prev.run_status {
            self.info = match next.run_status {
                RunStatus::Stopped => "Stopped and reset".into(),
                RunStatus::Running => format!("Run #{} running", next.run_id),
                RunStatus::Completed => "Workflow completed".into(),
                RunStatus::Error => "Workflow failed".into(),
            };
        } else if let Some(step) = next.steps.running() {
            self.info = format!("{} running…", step.label());
        }
    }

    pub fn tick(&mut self) {
        self.frame = self.frame.wrapping_add(1);
    }

    pub fn spinner(&self) -> &'static str {
        SPINNER[(self.frame % SPINNER.len() as u64) as usize]
    }

    /// Start is disabled while a run is in flight.
    pub fn can_start(&self) -> bool {
        self.snapshot.run_status != RunStatus::Running
    }
}
