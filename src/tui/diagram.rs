use crate::diagram::{Diagram, DiagramNode, Edge, NodeStyle};
use crate::model::StepStatus;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph},
    Frame,
};

pub fn style_color(style: NodeStyle) -> Color {
    let (r, g, b) = style.rgb();
    Color::Rgb(r, g, b)
}

fn status_text(status: StepStatus) -> &'static str {
    match status {
        StepStatus::Idle => "idle",
        StepStatus::Running => "running",
        StepStatus::Completed => "completed",
        StepStatus::Error => "error",
    }
}

/// Draw the pipeline top to bottom: node boxes joined by edge arrows.
pub fn draw_diagram(f: &mut Frame, area: Rect, diagram: &Diagram, spinner: &str, frame: u64) {
    let outer = Block::default().borders(Borders::ALL).title("Workflow");
    let inner = outer.inner(area);
    f.render_widget(outer, area);

    let mut constraints = Vec::with_capacity(diagram.nodes.len() * 2);
    for i in 0..diagram.nodes.len() {
        if i > 0 {
            constraints.push(Constraint::Length(1));
        }
        constraints.push(Constraint::Length(4));
    }
    constraints.push(Constraint::Min(0));

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(inner);

    for (i, node) in diagram.nodes.iter().enumerate() {
        let node_row = if i == 0 { 0 } else { i * 2 };
        if i > 0 {
            draw_edge(f, rows[node_row - 1], &diagram.edges[i - 1], diagram, frame);
        }
        draw_node(f, centered(rows[node_row], 44), node, spinner);
    }
}

fn draw_node(f: &mut Frame, area: Rect, node: &DiagramNode, spinner: &str) {
    let color = style_color(node.style);
    let mut border = Style::default().fg(color);
    if node.style.is_animated() {
        border = border.add_modifier(Modifier::BOLD);
    }
    let icon = if node.style.is_animated() {
        spinner
    } else {
        node.icon
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(border)
        .title(Line::from(vec![
            Span::styled(format!(" {icon} "), Style::default().fg(color)),
            Span::styled(
                node.label,
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw(" "),
        ]));
    let body = Paragraph::new(vec![
        Line::from(Span::styled(
            node.description,
            Style::default().fg(Color::Gray),
        )),
        Line::from(Span::styled(
            status_text(node.status),
            Style::default().fg(color),
        )),
    ])
    .block(block);
    f.render_widget(body, area);
}

fn draw_edge(f: &mut Frame, area: Rect, edge: &Edge, diagram: &Diagram, frame: u64) {
    let source = &diagram.nodes[edge.source.index()];
    let flowing = edge.animated && source.status == StepStatus::Completed;
    let glyph = if flowing && frame % 2 == 0 { "┆" } else { "│" };
    let color = if flowing {
        style_color(NodeStyle::Success)
    } else {
        Color::DarkGray
    };
    let p = Paragraph::new(Line::from(Span::styled(
        format!("{glyph}▼"),
        Style::default().fg(color),
    )))
    .alignment(Alignment::Center);
    f.render_widget(p, area);
}

fn centered(area: Rect, width: u16) -> Rect {
    let w = width.min(area.width);
    Rect {
        x: area.x + (area.width - w) / 2,
        width: w,
        ..area
    }
}
