mod diagram;
mod help;
mod state;

use crate::content::{self, PanelAccent};
use crate::model::{RunStatus, SimConfig, Snapshot};
use crate::orchestrator::{self, UiCommand};
use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Tabs},
    Terminal,
};
use self::state::UiState;
use std::{io, time::Duration, time::Instant};
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio::sync::watch;

pub async fn run(cfg: SimConfig, verbose: bool) -> Result<()> {
    let _log_guard = crate::logging::init_file(verbose);
    tracing::info!(?cfg, "starting tui");

    let (snapshot_tx, snapshot_rx) = watch::channel(Snapshot::default());
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<UiCommand>();

    // TUI runs in a dedicated thread to keep all blocking I/O out of the Tokio runtime.
    let stop_mode = cfg.stop_mode;
    let ui_handle = std::thread::spawn(move || run_threaded(stop_mode, snapshot_rx, cmd_tx));

    let res = orchestrator::run_controller(cfg, snapshot_tx, cmd_rx).await;

    let join_res = tokio::task::spawn_blocking(move || ui_handle.join()).await;
    if let Ok(joined) = join_res {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e),
            Err(_) => return Err(anyhow::anyhow!("TUI thread panicked")),
        }
    }

    res
}

/// Run the TUI loop on a dedicated thread.
fn run_threaded(
    stop_mode: crate::model::StopMode,
    mut snapshot_rx: watch::Receiver<Snapshot>,
    cmd_tx: UnboundedSender<UiCommand>,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).ok();

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;
    terminal.clear().ok();

    // UiState is owned by the UI thread only; snapshots arrive through the watch channel.
    let mut state = UiState {
        stop_mode,
        ..Default::default()
    };

    let tick_rate = Duration::from_millis(100);
    let mut last_tick = Instant::now();

    let res = loop {
        if snapshot_rx.has_changed().unwrap_or(false) {
            let next = *snapshot_rx.borrow_and_update();
            state.apply_snapshot(next);
        }

        if last_tick.elapsed() >= tick_rate {
            state.tick();
            terminal.draw(|f| draw(f.area(), f, &state)).ok();
            last_tick = Instant::now();
        }

        // Poll input with a short timeout to avoid blocking the render loop.
        if event::poll(Duration::from_millis(10)).unwrap_or(false) {
            if let Ok(Event::Key(k)) = event::read() {
                if k.kind != KeyEventKind::Press {
                    continue;
                }
                match (k.modifiers, k.code) {
                    (_, KeyCode::Char('q')) | (KeyModifiers::CONTROL, KeyCode::Char('c')) => {
                        let _ = cmd_tx.send(UiCommand::Quit);
                        break Ok(());
                    }
                    (_, KeyCode::Char('s')) | (_, KeyCode::Enter) => {
                        if state.can_start() {
                            state.info = "Start requested…".into();
                            let _ = cmd_tx.send(UiCommand::Start);
                        } else {
                            state.info = "A run is already in progress".into();
                        }
                    }
                    (_, KeyCode::Char('x')) | (_, KeyCode::Backspace) => {
                        let _ = cmd_tx.send(UiCommand::Stop);
                    }
                    (_, KeyCode::Tab) => {
                        state.tab = (state.tab + 1) % 2;
                    }
                    (_, KeyCode::Char('?')) => {
                        state.tab = 1;
                    }
                    _ => {}
                }
            }
        }
    };

    disable_raw_mode().ok();
    let mut stdout = io::stdout();
    execute!(stdout, LeaveAlternateScreen).ok();
    res
}

fn draw(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)].as_ref())
        .split(area);

    let tabs = Tabs::new(vec![Line::from("Dashboard"), Line::from("Help")])
        .select(state.tab)
        .block(Block::default().borders(Borders::ALL).title(brand_title()))
        .highlight_style(Style::default().fg(Color::Yellow));
    f.render_widget(tabs, chunks[0]);

    match state.tab {
        0 => draw_dashboard(chunks[1], f, state),
        _ => help::draw_help(chunks[1], f, state.stop_mode),
    }
}

fn brand_title() -> Line<'static> {
    let mut spans = vec![Span::styled(
        format!(" ⚡ {} ", content::BRAND),
        Style::default().add_modifier(Modifier::BOLD),
    )];
    for (label, _) in content::NAV_LINKS {
        spans.push(Span::styled(format!("· {label} "), Style::default().fg(Color::Gray)));
    }
    Line::from(spans)
}

fn draw_dashboard(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let main = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(5), // Title, subtitle, controls, banner
                Constraint::Min(0),    // Diagram + panels
                Constraint::Length(4), // Status row + footer
            ]
            .as_ref(),
        )
        .split(area);

    draw_header(main[0], f, state);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)].as_ref())
        .split(main[1]);

    let diagram = crate::diagram::build_diagram(&state.snapshot.steps);
    diagram::draw_diagram(f, body[0], &diagram, state.spinner(), state.frame);

    let panels = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(7),
                Constraint::Length(7),
                Constraint::Min(0),
            ]
            .as_ref(),
        )
        .split(body[1]);
    for (i, panel) in content::FEATURE_PANELS.iter().enumerate() {
        draw_feature_panel(panels[i], f, panel);
    }
    draw_setup(panels[2], f);

    draw_status(main[2], f, state);
}

fn draw_header(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let start_style = if state.can_start() {
        Style::default().fg(Color::Green)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let mut lines = vec![
        Line::from(Span::styled(
            content::TITLE,
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(content::SUBTITLE, Style::default().fg(Color::Gray))),
        Line::from(vec![
            Span::styled("[s] ▶ Start Simulation", start_style),
            Span::raw("    "),
            Span::styled("[x] ⏸ Stop & Reset", Style::default().fg(Color::Red)),
        ]),
    ];
    if state.snapshot.run_status == RunStatus::Error {
        lines.push(Line::from(Span::styled(
            format!("⚠ {}", content::ERROR_BANNER),
            Style::default()
                .fg(Color::White)
                .bg(Color::Red)
                .add_modifier(Modifier::BOLD),
        )));
    }
    let p = Paragraph::new(lines).alignment(Alignment::Center);
    f.render_widget(p, area);
}

fn draw_feature_panel(area: Rect, f: &mut ratatui::Frame, panel: &content::FeaturePanel) {
    let (icon, color) = match panel.accent {
        PanelAccent::Study => ("📖", Color::Blue),
        PanelAccent::Medical => ("⚕", Color::Green),
    };
    let lines: Vec<Line> = panel
        .features
        .iter()
        .map(|feat| {
            Line::from(vec![
                Span::styled("✔ ", Style::default().fg(color)),
                Span::raw(*feat),
            ])
        })
        .collect();
    let p = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(color))
            .title(format!("{icon} {}", panel.title)),
    );
    f.render_widget(p, area);
}

fn draw_setup(area: Rect, f: &mut ratatui::Frame) {
    let mut lines: Vec<Line> = content::setup_instructions()
        .into_iter()
        .enumerate()
        .map(|(i, (label, value))| {
            Line::from(vec![
                Span::styled(format!("{}. {label}: ", i + 1), Style::default().fg(Color::Gray)),
                Span::styled(value, Style::default().fg(Color::Cyan)),
            ])
        })
        .collect();
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Tech Used",
        Style::default().add_modifier(Modifier::BOLD),
    )));
    for tech in content::TECH_USED {
        lines.push(Line::from(format!("• {tech}")));
    }
    let p = Paragraph::new(lines)
        .wrap(ratatui::widgets::Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title("Setup"));
    f.render_widget(p, area);
}

fn draw_status(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let run_color = match state.snapshot.run_status {
        RunStatus::Stopped => Color::Gray,
        RunStatus::Running => Color::Blue,
        RunStatus::Completed => Color::Green,
        RunStatus::Error => Color::Red,
    };
    let line = Line::from(vec![
        Span::styled("Run: ", Style::default().fg(Color::Gray)),
        Span::styled(state.snapshot.run_status.to_string(), Style::default().fg(run_color)),
        Span::raw("   "),
        Span::styled("#", Style::default().fg(Color::Gray)),
        Span::raw(state.snapshot.run_id.to_string()),
        Span::raw("   "),
        Span::styled("Stop mode: ", Style::default().fg(Color::Gray)),
        Span::raw(format!("{:?}", state.stop_mode).to_lowercase()),
        Span::raw("   "),
        Span::styled("Info: ", Style::default().fg(Color::Gray)),
        Span::raw(state.info.clone()),
    ]);
    let footer = Line::from(Span::styled(
        content::footer(content::current_year()),
        Style::default().fg(Color::DarkGray),
    ));
    let status = Paragraph::new(vec![line, footer]).block(Block::default().borders(Borders::ALL).title("Status"));
    f.render_widget(status, area);
}
