//! Static copy shown around the diagram. Nothing here is executed or validated.

pub const TITLE: &str = "The 2025 n8n Workflow";
pub const SUBTITLE: &str =
    "A visual simulation of an automated Terraform learning & medical research pipeline.";
pub const ERROR_BANNER: &str = "Workflow simulation failed! Please reset and try again.";

pub const BRAND: &str = "Terraform Medicine n8n";
/// Navbar links as (label, target).
pub const NAV_LINKS: [(&str, &str); 3] = [
    ("Features", "#features"),
    ("Setup", "#setup"),
    ("GitHub", "https://github.com/aaradhysharma/N8N"),
];

/// Accent used when drawing a feature panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelAccent {
    Study,
    Medical,
}

pub struct FeaturePanel {
    pub title: &'static str,
    pub accent: PanelAccent,
    pub features: &'static [&'static str],
}

pub const FEATURE_PANELS: [FeaturePanel; 2] = [
    FeaturePanel {
        title: "Terraform Study Features",
        accent: PanelAccent::Study,
        features: &[
            "Daily AWS infrastructure practice",
            "Terraform Associate exam questions",
            "State management exercises",
            "Module creation challenges",
            "Cost optimization tracking",
        ],
    },
    FeaturePanel {
        title: "Medical Research Integration",
        accent: PanelAccent::Medical,
        features: &[
            "PubMed API integration",
            "Research paper summaries",
            "Medical terminology learning",
            "Clinical trial updates",
            "Research methodology tips",
        ],
    },
];

pub const N8N_URL: &str = "http://localhost:5678";
pub const WORKFLOW_FILE: &str = "workflows/terraform-study.json";
pub const RESEARCH_GUIDE_URL: &str =
    "https://docs.google.com/document/d/1wApYQBXRGIj9ISJtOJ4j0bdqxbccK-OYx38rjlhrA38/edit";

/// Setup steps for a human operator, as (label, value) pairs.
pub fn setup_instructions() -> [(&'static str, &'static str); 4] {
    [
        ("n8n running at", N8N_URL),
        ("Import workflow", WORKFLOW_FILE),
        ("Credentials", "Configure AWS & email credentials in n8n"),
        ("Study doc (Research Guide)", RESEARCH_GUIDE_URL),
    ]
}

pub const TECH_USED: [&str; 5] = [
    "Next.js & React",
    "Tailwind CSS",
    "React Flow for charting",
    "Vercel for deployment",
    "n8n for automation",
];

pub fn footer(year: i32) -> String {
    format!("© {year} {BRAND}. Built with Next.js & Vercel.")
}

pub fn current_year() -> i32 {
    time::OffsetDateTime::now_utc().year()
}
