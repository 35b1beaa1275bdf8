use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// One stage of the simulated pipeline. The set and its order are fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Step {
    Schedule,
    Terraform,
    Pubmed,
    Email,
}

impl Step {
    /// All steps in execution order.
    pub const ALL: [Step; 4] = [Step::Schedule, Step::Terraform, Step::Pubmed, Step::Email];

    pub fn index(self) -> usize {
        match self {
            Step::Schedule => 0,
            Step::Terraform => 1,
            Step::Pubmed => 2,
            Step::Email => 3,
        }
    }

    pub fn id(self) -> &'static str {
        match self {
            Step::Schedule => "schedule",
            Step::Terraform => "terraform",
            Step::Pubmed => "pubmed",
            Step::Email => "email",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Step::Schedule => "Schedule Trigger",
            Step::Terraform => "Execute Terraform",
            Step::Pubmed => "Scrape Research",
            Step::Email => "Send Email Update",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Step::Schedule => "Daily at 9 AM",
            Step::Terraform => "Apply AWS configs",
            Step::Pubmed => "Fetch from PubMed API",
            Step::Email => "Daily digest to you & GF",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            Step::Schedule => "⚙",
            Step::Terraform => "☁",
            Step::Pubmed => "⚕",
            Step::Email => "✉",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    #[default]
    Idle,
    Running,
    Completed,
    Error,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    #[default]
    Stopped,
    Running,
    Completed,
    Error,
}

impl RunStatus {
    /// A finished run: no step event may change it anymore.
    pub fn is_terminal(self) -> bool {
        matches!(self, RunStatus::Completed | RunStatus::Error)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunStatus::Stopped => "stopped",
            RunStatus::Running => "running",
            RunStatus::Completed => "completed",
            RunStatus::Error => "error",
        };
        f.write_str(s)
    }
}

/// Step -> status mapping with one slot per step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct StatusMap([StepStatus; 4]);

impl StatusMap {
    pub fn get(&self, step: Step) -> StepStatus {
        self.0[step.index()]
    }

    pub fn with(mut self, step: Step, status: StepStatus) -> Self {
        self.0[step.index()] = status;
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (Step, StepStatus)> + '_ {
        Step::ALL.iter().map(move |s| (*s, self.get(*s)))
    }

    /// The step currently marked running, if any.
    pub fn running(&self) -> Option<Step> {
        self.iter()
            .find(|(_, st)| *st == StepStatus::Running)
            .map(|(s, _)| s)
    }

    pub fn all(&self, status: StepStatus) -> bool {
        self.0.iter().all(|s| *s == status)
    }
}

impl Serialize for StatusMap {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(Step::ALL.len()))?;
        for (step, status) in self.iter() {
            map.serialize_entry(step.id(), &status)?;
        }
        map.end()
    }
}

/// Immutable state of one session: the aggregate run and every step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    /// Bumped by every accepted start; tags engine events.
    pub run_id: u64,
    pub run_status: RunStatus,
    pub steps: StatusMap,
}

/// State transitions produced by the controller and the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RunEvent {
    Started { run_id: u64 },
    StepRunning { run_id: u64, step: Step },
    StepCompleted { run_id: u64, step: Step },
    StepFailed { run_id: u64, step: Step },
    RunCompleted { run_id: u64 },
    Stopped,
}

impl RunEvent {
    /// Run this event belongs to; `None` for controller-level events.
    pub fn run_id(&self) -> Option<u64> {
        match *self {
            RunEvent::Started { run_id }
            | RunEvent::StepRunning { run_id, .. }
            | RunEvent::StepCompleted { run_id, .. }
            | RunEvent::StepFailed { run_id, .. }
            | RunEvent::RunCompleted { run_id } => Some(run_id),
            RunEvent::Stopped => None,
        }
    }

    /// Render a human-readable message for UI/CLI layers.
    pub fn to_message(&self) -> String {
        match self {
            RunEvent::Started { run_id } => format!("Run #{run_id} started"),
            RunEvent::StepRunning { step, .. } => format!("{} running…", step.label()),
            RunEvent::StepCompleted { step, .. } => format!("{} completed", step.label()),
            RunEvent::StepFailed { step, .. } => format!("{} failed", step.label()),
            RunEvent::RunCompleted { run_id } => format!("Run #{run_id} completed"),
            RunEvent::Stopped => "Stopped and reset".to_string(),
        }
    }
}

/// What `stop()` does to an in-flight run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StopMode {
    /// Cancel the pending resumption, then reset.
    #[default]
    Cancel,
    /// Reset only; the in-flight run keeps writing afterwards.
    Reset,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    #[serde(with = "humantime_serde")]
    pub setup_delay: Duration,
    #[serde(with = "humantime_serde")]
    pub work_delay: Duration,
    pub failure_rate: f64,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub fail_at: Option<Step>,
    pub stop_mode: StopMode,
    pub start_on_launch: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            setup_delay: Duration::from_millis(500),
            work_delay: Duration::from_millis(1500),
            failure_rate: 0.1,
            seed: None,
            fail_at: None,
            stop_mode: StopMode::Cancel,
            start_on_launch: false,
        }
    }
}

/// How a single engine run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "step", rename_all = "lowercase")]
pub enum RunOutcome {
    Completed,
    Failed(Step),
    Cancelled,
}

/// One entry of a headless run's timeline.
#[derive(Debug, Clone, Serialize)]
pub struct TimelineEntry {
    pub elapsed_ms: u64,
    pub event: RunEvent,
    pub snapshot: Snapshot,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub timestamp_utc: String,
    pub config: SimConfig,
    pub outcome: RunOutcome,
    pub snapshot: Snapshot,
    pub timeline: Vec<TimelineEntry>,
}
