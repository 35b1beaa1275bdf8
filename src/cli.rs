use crate::model::{SimConfig, Step, StopMode, TimelineEntry};
use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Output line routing for stdout/stderr writer.
enum OutputLine {
    Stdout(String),
    Stderr(String),
}

/// Spawn a blocking writer for stdout/stderr to avoid blocking async tasks.
fn spawn_output_writer() -> (
    mpsc::UnboundedSender<OutputLine>,
    tokio::task::JoinHandle<()>,
) {
    let (tx, mut rx) = mpsc::unbounded_channel::<OutputLine>();
    let handle = tokio::task::spawn_blocking(move || {
        let stdout = std::io::stdout();
        let stderr = std::io::stderr();
        let mut out = std::io::LineWriter::new(stdout.lock());
        let mut err = std::io::LineWriter::new(stderr.lock());

        while let Some(line) = rx.blocking_recv() {
            match line {
                OutputLine::Stdout(msg) => {
                    let _ = writeln!(out, "{}", msg);
                }
                OutputLine::Stderr(msg) => {
                    let _ = writeln!(err, "{}", msg);
                }
            }
        }

        let _ = out.flush();
        let _ = err.flush();
    });
    (tx, handle)
}

#[derive(Debug, Parser, Clone)]
#[command(
    name = "workflow-sim",
    version,
    about = "Simulated automation pipeline with a live status diagram"
)]
pub struct Cli {
    /// Run one simulation and print a JSON report (no TUI)
    #[arg(long)]
    pub json: bool,

    /// Run one simulation and print a text summary (no TUI)
    #[arg(long)]
    pub text: bool,

    /// Delay before each step starts
    #[arg(long, default_value = "500ms")]
    pub setup_delay: humantime::Duration,

    /// Simulated work time of each step
    #[arg(long, default_value = "1500ms")]
    pub work_delay: humantime::Duration,

    /// Probability that a step fails, between 0 and 1
    #[arg(long, default_value_t = 0.1)]
    pub failure_rate: f64,

    /// Seed for the failure draws (reproducible runs)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Always fail at this step (overrides --failure-rate)
    #[arg(long, value_enum)]
    pub fail_at: Option<Step>,

    /// What stop does to a run in flight: cancel it, or only reset the statuses
    #[arg(long, value_enum, default_value_t = StopMode::Cancel)]
    pub stop_mode: StopMode,

    /// Start a run as soon as the TUI opens
    #[arg(long, default_value_t = false, action = clap::ArgAction::Set)]
    pub start_on_launch: bool,

    /// Debug logging (RUST_LOG overrides)
    #[arg(short, long)]
    pub verbose: bool,
}

pub async fn run(args: Cli) -> Result<()> {
    if args.json && args.text {
        return Err(anyhow::anyhow!("--json and --text are mutually exclusive"));
    }
    let cfg = build_config(&args)?;

    if !args.json && !args.text {
        #[cfg(feature = "tui")]
        {
            return crate::tui::run(cfg, args.verbose).await;
        }
        #[cfg(not(feature = "tui"))]
        {
            // Fallback when built without TUI support.
            crate::logging::init_stderr(args.verbose);
            return run_text(cfg).await;
        }
    }

    crate::logging::init_stderr(args.verbose);
    if args.json {
        return run_json(cfg).await;
    }
    run_text(cfg).await
}

/// Build a validated `SimConfig` from CLI arguments.
pub fn build_config(args: &Cli) -> Result<SimConfig> {
    if !(0.0..=1.0).contains(&args.failure_rate) {
        return Err(anyhow::anyhow!(
            "--failure-rate must be between 0 and 1, got {}",
            args.failure_rate
        ));
    }
    Ok(SimConfig {
        setup_delay: Duration::from(args.setup_delay),
        work_delay: Duration::from(args.work_delay),
        failure_rate: args.failure_rate,
        seed: args.seed,
        fail_at: args.fail_at,
        stop_mode: args.stop_mode,
        start_on_launch: args.start_on_launch,
    })
}

/// Cancel the headless run on Ctrl-C so it ends in the stopped state.
fn cancel_on_ctrl_c() -> CancellationToken {
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received, stopping run");
            token.cancel();
        }
    });
    cancel
}

async fn run_json(cfg: SimConfig) -> Result<()> {
    let report = crate::orchestrator::run_once(&cfg, cancel_on_ctrl_c(), |_| {})
        .await
        .context("simulation failed")?;
    let out = serde_json::to_string_pretty(&report)?;
    println!("{out}");
    Ok(())
}

async fn run_text(cfg: SimConfig) -> Result<()> {
    let (out_tx, out_handle) = spawn_output_writer();

    let progress_tx = out_tx.clone();
    let report = crate::orchestrator::run_once(&cfg, cancel_on_ctrl_c(), |entry: &TimelineEntry| {
        let _ = progress_tx.send(OutputLine::Stderr(crate::text_summary::progress_line(entry)));
    })
    .await
    .context("simulation failed")?;

    let summary = crate::text_summary::build_text_summary(&report);
    for line in summary.lines {
        let _ = out_tx.send(OutputLine::Stdout(line));
    }
    drop(progress_tx);
    drop(out_tx);
    let _ = out_handle.await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_demo_timings() {
        let args = Cli::parse_from(["workflow-sim"]);
        let cfg = build_config(&args).unwrap();
        assert_eq!(cfg.setup_delay, Duration::from_millis(500));
        assert_eq!(cfg.work_delay, Duration::from_millis(1500));
        assert_eq!(cfg.failure_rate, 0.1);
        assert_eq!(cfg.stop_mode, StopMode::Cancel);
        assert!(!cfg.start_on_launch);
    }

    #[test]
    fn parses_step_and_stop_mode() {
        let args = Cli::parse_from([
            "workflow-sim",
            "--fail-at",
            "pubmed",
            "--stop-mode",
            "reset",
            "--work-delay",
            "2s",
        ]);
        let cfg = build_config(&args).unwrap();
        assert_eq!(cfg.fail_at, Some(Step::Pubmed));
        assert_eq!(cfg.stop_mode, StopMode::Reset);
        assert_eq!(cfg.work_delay, Duration::from_secs(2));
    }

    #[test]
    fn rejects_out_of_range_failure_rate() {
        let args = Cli::parse_from(["workflow-sim", "--failure-rate", "1.5"]);
        assert!(build_config(&args).is_err());
    }
}
