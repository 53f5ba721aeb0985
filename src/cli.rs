//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use std::path::PathBuf;

/// Agentboard - randomized AI agent metrics dashboard
///
/// Generates a fresh table of per-agent metrics on every run, summarizes
/// it (totals for counts, averages for rates) and renders the dashboard
/// as Markdown or JSON.
///
/// Examples:
///   agentboard
///   agentboard --seed 42 --format json
///   agentboard --agent "Agent C" --metric "Tasks Completed"
///   agentboard --agents Ada,Grace,Linus --trending-agents 2
///   agentboard --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Path to configuration file
    ///
    /// If not specified, looks for .agentboard.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output file path for the dashboard (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Seed for a reproducible render pass
    #[arg(long, value_name = "SEED", env = "AGENTBOARD_SEED")]
    pub seed: Option<u64>,

    /// Agent to compare (requires --metric)
    #[arg(long, value_name = "NAME", requires = "metric")]
    pub agent: Option<String>,

    /// Metric to compare (requires --agent)
    #[arg(long, value_name = "NAME", requires = "agent")]
    pub metric: Option<String>,

    /// Number of roster agents listed under the trending metric
    #[arg(long, value_name = "COUNT")]
    pub trending_agents: Option<usize>,

    /// Agent roster override (comma-separated)
    ///
    /// Example: --agents "Ada,Grace,Linus"
    #[arg(long, value_name = "NAMES", value_delimiter = ',')]
    pub agents: Option<Vec<String>>,

    /// Dashboard title override
    #[arg(long, value_name = "TEXT")]
    pub title: Option<String>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (errors only)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .agentboard.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if self.trending_agents == Some(0) {
            return Err("Trending agents must be at least 1".to_string());
        }

        if let Some(ref agents) = self.agents {
            if agents.iter().any(|a| a.trim().is_empty()) {
                return Err("Agent names in --agents must not be blank".to_string());
            }
        }

        for (flag, value) in [("--agent", &self.agent), ("--metric", &self.metric)] {
            if matches!(value, Some(v) if v.trim().is_empty()) {
                return Err(format!("{} must not be blank", flag));
            }
        }

        Ok(())
    }

    /// Returns the comparison pair, if both halves were given.
    pub fn comparison(&self) -> Option<(String, String)> {
        match (&self.agent, &self.metric) {
            (Some(agent), Some(metric)) => Some((agent.clone(), metric.clone())),
            _ => None,
        }
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
