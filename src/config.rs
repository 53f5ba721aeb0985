//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.agentboard.toml` files.

use crate::analysis::{AggregatorError, MetricsAggregator};
use crate::models::MetricDef;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file name.
pub const CONFIG_FILE_NAME: &str = ".agentboard.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Agent roster.
    #[serde(default)]
    pub roster: RosterConfig,

    /// Metric definitions, in display order.
    #[serde(default = "default_metrics")]
    pub metrics: Vec<MetricDef>,

    /// Dashboard layout settings.
    #[serde(default)]
    pub dashboard: DashboardConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            roster: RosterConfig::default(),
            metrics: default_metrics(),
            dashboard: DashboardConfig::default(),
        }
    }
}

/// Agent roster settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterConfig {
    /// Agent identifiers, in display order.
    #[serde(default = "default_agents")]
    pub agents: Vec<String>,
}

impl Default for RosterConfig {
    fn default() -> Self {
        Self {
            agents: default_agents(),
        }
    }
}

fn default_agents() -> Vec<String> {
    (b'A'..=b'Z')
        .map(|c| format!("Agent {}", c as char))
        .collect()
}

fn default_metrics() -> Vec<MetricDef> {
    const COUNT_MIN: u64 = 10;
    const COUNT_MAX: u64 = 500;
    const RATE_MIN: f64 = 1.0;
    const RATE_MAX: f64 = 100.0;

    let count = |name: &str| MetricDef::count(name, COUNT_MIN, COUNT_MAX);
    let rate = |name: &str| MetricDef::rate(name, RATE_MIN, RATE_MAX);

    vec![
        count("Emails Sent"),
        count("Calls Answered"),
        count("Posts Created"),
        count("Search Queries"),
        count("Tasks Completed"),
        rate("Response Time (ms)"),
        count("Customer Interactions"),
        count("Errors Logged"),
        count("Active Sessions"),
        count("Training Hours"),
        rate("Feedback Ratings (%)"),
        count("Lead Conversions"),
        count("Social Media Mentions"),
    ]
}

/// Dashboard layout settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Dashboard title.
    #[serde(default = "default_title")]
    pub title: String,

    /// Agents per block of the individual metrics grid.
    #[serde(default = "default_agent_columns")]
    pub agent_columns: usize,

    /// Cells per row of the summary grid.
    #[serde(default = "default_summary_columns")]
    pub summary_columns: usize,

    /// Roster agents listed under the trending metric.
    #[serde(default = "default_trending_agents")]
    pub trending_agents: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            agent_columns: default_agent_columns(),
            summary_columns: default_summary_columns(),
            trending_agents: default_trending_agents(),
        }
    }
}

fn default_title() -> String {
    "AI Agent Metrics Dashboard".to_string()
}

fn default_agent_columns() -> usize {
    4
}

fn default_summary_columns() -> usize {
    3
}

fn default_trending_agents() -> usize {
    5
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from a directory.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(CONFIG_FILE_NAME);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Try to load configuration from the current directory.
    pub fn load_default() -> Result<Option<Self>> {
        Self::load_from_dir(Path::new("."))
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, and only
    /// override when explicitly provided.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref agents) = args.agents {
            self.roster.agents = agents.iter().map(|a| a.trim().to_string()).collect();
        }

        if let Some(n) = args.trending_agents {
            self.dashboard.trending_agents = n;
        }

        if let Some(ref title) = args.title {
            self.dashboard.title = title.clone();
        }
    }

    /// Validate the dashboard layout settings.
    pub fn validate(&self) -> Result<(), AggregatorError> {
        let counts = [
            ("agent_columns", self.dashboard.agent_columns),
            ("summary_columns", self.dashboard.summary_columns),
            ("trending_agents", self.dashboard.trending_agents),
        ];

        for (field, value) in counts {
            if value == 0 {
                return Err(AggregatorError::Configuration(format!(
                    "dashboard.{} must be at least 1",
                    field
                )));
            }
        }

        Ok(())
    }

    /// Validate the whole configuration into an aggregator.
    pub fn build_aggregator(&self) -> Result<MetricsAggregator> {
        self.validate().context("Invalid dashboard settings")?;
        MetricsAggregator::new(self.roster.agents.clone(), self.metrics.clone())
            .context("Invalid roster or metric definitions")
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
