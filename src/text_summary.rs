//! Text summary builder for CLI output.
//!
//! Formats progress lines while a headless run is going and the final diagram once it ends.

use crate::content;
use crate::diagram::{build_diagram, render_text};
use crate::model::{RunOutcome, RunReport, RunStatus, TimelineEntry};

/// Pre-formatted lines for text output.
pub(crate) struct TextSummary {
    pub lines: Vec<String>,
}

/// One progress line for a recorded transition.
pub(crate) fn progress_line(entry: &TimelineEntry) -> String {
    format!(
        "[{:>6} ms] {} (run: {})",
        entry.elapsed_ms,
        entry.event.to_message(),
        entry.snapshot.run_status
    )
}

/// Build the final text summary of a headless run.
pub(crate) fn build_text_summary(report: &RunReport) -> TextSummary {
    let mut lines = vec![content::TITLE.to_string(), content::SUBTITLE.to_string(), String::new()];

    lines.extend(render_text(&build_diagram(&report.snapshot.steps)));
    lines.push(String::new());

    let outcome = match report.outcome {
        RunOutcome::Completed => "all steps completed".to_string(),
        RunOutcome::Failed(step) => format!("failed at {}", step.label()),
        RunOutcome::Cancelled => "cancelled".to_string(),
    };
    lines.push(format!(
        "Run status: {} ({outcome})",
        report.snapshot.run_status
    ));
    if report.snapshot.run_status == RunStatus::Error {
        lines.push(format!("! {}", content::ERROR_BANNER));
    }

    for panel in &content::FEATURE_PANELS {
        lines.push(String::new());
        lines.push(panel.title.to_string());
        lines.extend(panel.features.iter().map(|feat| format!("  + {feat}")));
    }

    lines.push(String::new());
    lines.push("Setup".to_string());
    for (i, (label, value)) in content::setup_instructions().into_iter().enumerate() {
        lines.push(format!("  {}. {label}: {value}", i + 1));
    }
    lines.push("Tech Used".to_string());
    lines.extend(content::TECH_USED.iter().map(|tech| format!("  - {tech}")));

    lines.push(String::new());
    lines.push(content::footer(content::current_year()));

    TextSummary { lines }
}
