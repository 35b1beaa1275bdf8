//! Pipeline diagram: four fixed nodes, three fixed edges, node style derived from status.
//!
//! Everything here is a pure function of a [`StatusMap`]; the TUI and text mode
//! draw the resulting [`Diagram`] their own way.

use crate::model::{StatusMap, Step, StepStatus};

/// Visual classification of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeStyle {
    Neutral,
    Highlighted,
    Success,
    Failure,
}

impl NodeStyle {
    pub fn for_status(status: StepStatus) -> Self {
        match status {
            StepStatus::Idle => NodeStyle::Neutral,
            StepStatus::Running => NodeStyle::Highlighted,
            StepStatus::Completed => NodeStyle::Success,
            StepStatus::Error => NodeStyle::Failure,
        }
    }

    /// Palette color as RGB.
    pub fn rgb(self) -> (u8, u8, u8) {
        match self {
            NodeStyle::Neutral => (0xE5, 0xE7, 0xEB),
            NodeStyle::Highlighted => (0x3B, 0x82, 0xF6),
            NodeStyle::Success => (0x10, 0xB9, 0x81),
            NodeStyle::Failure => (0xEF, 0x44, 0x44),
        }
    }

    /// Running nodes are drawn with a spinner.
    pub fn is_animated(self) -> bool {
        self == NodeStyle::Highlighted
    }

    /// Short marker for text renderings.
    pub fn marker(self) -> &'static str {
        match self {
            NodeStyle::Neutral => "[ ]",
            NodeStyle::Highlighted => "[~]",
            NodeStyle::Success => "[✓]",
            NodeStyle::Failure => "[✗]",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagramNode {
    pub step: Step,
    pub label: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub status: StepStatus,
    pub style: NodeStyle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    pub source: Step,
    pub target: Step,
    pub animated: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagram {
    pub nodes: [DiagramNode; 4],
    pub edges: [Edge; 3],
}

pub const EDGES: [Edge; 3] = [
    Edge {
        source: Step::Schedule,
        target: Step::Terraform,
        animated: true,
    },
    Edge {
        source: Step::Terraform,
        target: Step::Pubmed,
        animated: true,
    },
    Edge {
        source: Step::Pubmed,
        target: Step::Email,
        animated: true,
    },
];

pub fn build_diagram(steps: &StatusMap) -> Diagram {
    Diagram {
        nodes: Step::ALL.map(|step| {
            let status = steps.get(step);
            DiagramNode {
                step,
                label: step.label(),
                description: step.description(),
                icon: step.icon(),
                status,
                style: NodeStyle::for_status(status),
            }
        }),
        edges: EDGES,
    }
}

/// Plain-text rendering: one line per node, arrows between them.
pub fn render_text(diagram: &Diagram) -> Vec<String> {
    let mut lines = Vec::with_capacity(diagram.nodes.len() * 2);
    for (i, node) in diagram.nodes.iter().enumerate() {
        if i > 0 {
            lines.push("      │".to_string());
        }
        lines.push(format!(
            "{} {} {:<18} {:<26} {:?}",
            node.style.marker(),
            node.icon,
            node.label,
            node.description,
            node.status
        ));
    }
    lines
}
