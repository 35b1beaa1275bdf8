use crate::content;
use crate::model::StopMode;
use ratatui::{
    layout::Rect,
    style::Color,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

fn key_line(key: &'static str, pad: usize, text: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::raw("  "),
        Span::styled(key, Style::default().fg(Color::Magenta)),
        Span::raw(" ".repeat(pad)),
        Span::raw(text),
    ])
}

pub fn draw_help(area: Rect, f: &mut Frame, stop_mode: StopMode) {
    let mut lines = vec![
        Line::from("Keybinds:"),
        key_line("s / Enter", 5, "Start simulation"),
        key_line("x / Backspace", 1, "Stop & reset"),
        key_line("tab", 11, "Switch tabs"),
        key_line("?", 13, "Show this help"),
        key_line("q / Ctrl-C", 4, "Quit"),
        Line::from(""),
        Line::from("Stop mode:"),
    ];
    lines.push(match stop_mode {
        StopMode::Cancel => Line::from("  cancel: stop pre-empts the pending step, the reset always sticks"),
        StopMode::Reset => Line::from(vec![
            Span::raw("  reset: "),
            Span::styled(
                "statuses reset but the run in flight keeps going and may repaint nodes or finish",
                Style::default().fg(Color::Yellow),
            ),
        ]),
    });
    lines.push(Line::from(""));
    lines.push(Line::from("Setup (for a real n8n install):"));
    for (label, value) in content::setup_instructions() {
        lines.push(Line::from(vec![
            Span::raw("  "),
            Span::styled(format!("{label}: "), Style::default().fg(Color::Gray)),
            Span::styled(value, Style::default().fg(Color::Cyan)),
        ]));
    }

    let p = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title("Help"));
    f.render_widget(p, area);
}
