//! Markdown and JSON dashboard generation.
//!
//! This module renders a [`Dashboard`] pass into a Markdown document or
//! pretty-printed JSON.

use crate::models::{
    AgentRow, Comparison, Dashboard, DashboardMetadata, MetricDef, SummaryTable, Trending,
};
use anyhow::Result;

/// Layout knobs of the Markdown output.
#[derive(Debug, Clone, Copy)]
pub struct Layout {
    /// Agents per table block of the individual metrics grid.
    pub agent_columns: usize,
    /// Cells per row of the summary grid.
    pub summary_columns: usize,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            agent_columns: 4,
            summary_columns: 3,
        }
    }
}

/// Generate a complete Markdown dashboard.
pub fn generate_markdown_report(dashboard: &Dashboard, layout: Layout) -> String {
    let mut output = String::new();

    output.push_str(&format!("# 📊 {}\n\n", dashboard.metadata.title));
    output.push_str(
        "Monitor and analyze a detailed set of metrics for your AI agents. \
         Values are regenerated on every run.\n\n",
    );

    output.push_str(&generate_metadata_section(&dashboard.metadata));
    output.push_str(&generate_agents_section(
        dashboard.table.metrics(),
        dashboard.table.rows(),
        layout.agent_columns,
    ));
    output.push_str(&generate_summary_section(
        &dashboard.summary,
        layout.summary_columns,
    ));

    if let Some(ref comparison) = dashboard.comparison {
        output.push_str(&generate_comparison_section(comparison));
    }

    output.push_str(&generate_trending_section(&dashboard.trending));
    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &DashboardMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Agents:** {}\n", metadata.agent_count));
    section.push_str(&format!("- **Metrics:** {}\n", metadata.metric_count));
    if let Some(seed) = metadata.seed {
        section.push_str(&format!("- **Seed:** `{}`\n", seed));
    }
    section.push('\n');

    section
}

/// Generate the individual agent metrics grid.
///
/// Agents are laid out `columns` per table, one row per metric.
fn generate_agents_section(metrics: &[MetricDef], rows: &[AgentRow], columns: usize) -> String {
    let mut section = String::new();

    section.push_str("## 🗄 Individual Agent Metrics\n\n");

    for block in rows.chunks(columns.max(1)) {
        section.push_str("| Metric |");
        for row in block {
            section.push_str(&format!(" {} |", row.agent));
        }
        section.push_str("\n|:---|");
        section.push_str(&":---:|".repeat(block.len()));
        section.push('\n');

        for (index, def) in metrics.iter().enumerate() {
            section.push_str(&format!("| {} |", def.name));
            for row in block {
                section.push_str(&format!(" {} |", row.readings[index].value));
            }
            section.push('\n');
        }
        section.push('\n');
    }

    section
}

/// Generate the overall summary grid.
fn generate_summary_section(summary: &SummaryTable, columns: usize) -> String {
    let columns = columns.max(1);
    let mut section = String::new();

    section.push_str("## 📊 Overall Metrics Summary\n\n");

    section.push('|');
    section.push_str(&" |".repeat(columns));
    section.push_str("\n|");
    section.push_str(&":---|".repeat(columns));
    section.push('\n');

    for chunk in summary.entries.chunks(columns) {
        section.push('|');
        for entry in chunk {
            section.push_str(&format!(
                " **{}** ({}): {} |",
                entry.metric,
                entry.kind.aggregate_label(),
                entry.value
            ));
        }
        section.push_str(&" |".repeat(columns - chunk.len()));
        section.push('\n');
    }
    section.push('\n');

    section
}

/// Generate the agent comparison section.
fn generate_comparison_section(comparison: &Comparison) -> String {
    let mut section = String::new();

    section.push_str("## 🔀 Compare Agent Metrics\n\n");
    section.push_str(&format!(
        "**{} for {}:** {}\n\n",
        comparison.metric, comparison.agent, comparison.value
    ));

    section
}

/// Generate the trending metric section.
fn generate_trending_section(trending: &Trending) -> String {
    let mut section = String::new();

    section.push_str("## 🔄 Trending Metrics\n\n");
    section.push_str(&format!(
        "The trending metric today is: **{}**\n\n",
        trending.metric
    ));

    if !trending.agents.is_empty() {
        section.push_str("| Agent | Value |\n");
        section.push_str("|:---|:---:|\n");
        for reading in &trending.agents {
            section.push_str(&format!("| {} | {} |\n", reading.agent, reading.value));
        }
        section.push('\n');
    }

    section
}

/// Generate the dashboard footer.
fn generate_footer() -> String {
    let mut footer = String::new();

    footer.push_str("---\n\n");
    footer.push_str("*Demo data: every value is randomly generated and carries no meaning.*\n");

    footer
}

/// Generate a JSON dashboard.
pub fn generate_json_report(dashboard: &Dashboard) -> Result<String> {
    serde_json::to_string_pretty(dashboard).map_err(Into::into)
}
