//! Data models for the agent dashboard.
//!
//! This module contains the metric definitions, the per-agent value table,
//! the summary table and the rendered dashboard structure.

use crate::analysis::aggregator::validate_definitions;
use crate::analysis::{AggregatorError, LookupKey};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How values of a metric are generated and aggregated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "lowercase")]
pub enum MetricPolicy {
    /// Integer values in `min..=max`, summed across agents.
    Count { min: u64, max: u64 },
    /// Real values in `min..=max` rounded to 2 decimals, averaged across agents.
    ///
    /// Draws snap to the 2-decimal values inside the bounds, so at least one
    /// such value must exist.
    Rate { min: f64, max: f64 },
}

impl MetricPolicy {
    /// Returns the policy kind without its bounds.
    pub fn kind(&self) -> PolicyKind {
        match self {
            MetricPolicy::Count { .. } => PolicyKind::Count,
            MetricPolicy::Rate { .. } => PolicyKind::Rate,
        }
    }

    /// Whether a value has the right kind and lies within the bounds.
    pub fn contains(&self, value: MetricValue) -> bool {
        match (*self, value) {
            (MetricPolicy::Count { min, max }, MetricValue::Count(v)) => (min..=max).contains(&v),
            (MetricPolicy::Rate { min, max }, MetricValue::Rate(v)) => (min..=max).contains(&v),
            _ => false,
        }
    }
}

/// Policy kind, used for labelling summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyKind {
    Count,
    Rate,
}

impl PolicyKind {
    /// Label of the aggregate this kind produces.
    pub fn aggregate_label(&self) -> &'static str {
        match self {
            PolicyKind::Count => "Total",
            PolicyKind::Rate => "Average",
        }
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicyKind::Count => write!(f, "count"),
            PolicyKind::Rate => write!(f, "rate"),
        }
    }
}

/// A named metric tracked for every agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricDef {
    /// Display name, also the lookup key.
    pub name: String,
    /// Value policy with its bounds.
    #[serde(flatten)]
    pub policy: MetricPolicy,
}

impl MetricDef {
    /// Creates a count metric.
    pub fn count(name: impl Into<String>, min: u64, max: u64) -> Self {
        Self {
            name: name.into(),
            policy: MetricPolicy::Count { min, max },
        }
    }

    /// Creates a rate metric.
    pub fn rate(name: impl Into<String>, min: f64, max: f64) -> Self {
        Self {
            name: name.into(),
            policy: MetricPolicy::Rate { min, max },
        }
    }
}

/// A single generated or aggregated value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Count(u64),
    Rate(f64),
}

impl MetricValue {
    /// Returns the value as a float.
    pub fn as_f64(&self) -> f64 {
        match *self {
            MetricValue::Count(v) => v as f64,
            MetricValue::Rate(v) => v,
        }
    }

    /// Returns the policy kind this value belongs to.
    pub fn kind(&self) -> PolicyKind {
        match self {
            MetricValue::Count(_) => PolicyKind::Count,
            MetricValue::Rate(_) => PolicyKind::Rate,
        }
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricValue::Count(v) => write!(f, "{}", v),
            MetricValue::Rate(v) => write!(f, "{:.2}", v),
        }
    }
}

/// One agent's value for one metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub metric: String,
    pub value: MetricValue,
}

/// All readings of one agent, in metric order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentRow {
    pub agent: String,
    pub readings: Vec<Reading>,
}

/// The full agent x metric value matrix for one render pass.
///
/// Every row holds exactly one reading per metric, in the order of
/// `metrics`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricTable {
    metrics: Vec<MetricDef>,
    rows: Vec<AgentRow>,
}

impl MetricTable {
    /// Builds a table from explicit per-agent values.
    ///
    /// The roster and metrics are checked like an aggregator's, and each
    /// row must carry one in-range value per metric, in metric order.
    #[allow(dead_code)] // Builder for tables that were not generated
    pub fn from_rows<A>(
        metrics: Vec<MetricDef>,
        rows: Vec<(A, Vec<MetricValue>)>,
    ) -> Result<Self, AggregatorError>
    where
        A: Into<String>,
    {
        let rows: Vec<(String, Vec<MetricValue>)> =
            rows.into_iter().map(|(a, v)| (a.into(), v)).collect();
        let agents: Vec<String> = rows.iter().map(|(a, _)| a.clone()).collect();
        validate_definitions(&agents, &metrics)?;

        let mut agent_rows = Vec::with_capacity(rows.len());
        for (agent, values) in rows {
            if values.len() != metrics.len() {
                return Err(AggregatorError::Configuration(format!(
                    "agent '{}' has {} values for {} metrics",
                    agent,
                    values.len(),
                    metrics.len()
                )));
            }

            let readings = metrics
                .iter()
                .zip(values)
                .map(|(def, value)| {
                    if !def.policy.contains(value) {
                        return Err(AggregatorError::Configuration(format!(
                            "value {} for '{}' of agent '{}' is not a {} value in range",
                            value,
                            def.name,
                            agent,
                            def.policy.kind()
                        )));
                    }
                    Ok(Reading {
                        metric: def.name.clone(),
                        value,
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;

            agent_rows.push(AgentRow { agent, readings });
        }

        Ok(Self {
            metrics,
            rows: agent_rows,
        })
    }

    /// Internal constructor for rows already known to match `metrics`.
    pub(crate) fn from_parts(metrics: Vec<MetricDef>, rows: Vec<AgentRow>) -> Self {
        Self { metrics, rows }
    }

    /// Metric definitions, in column order.
    pub fn metrics(&self) -> &[MetricDef] {
        &self.metrics
    }

    /// Agent rows, in roster order.
    pub fn rows(&self) -> &[AgentRow] {
        &self.rows
    }

    /// Returns the row of an agent.
    pub fn row(&self, agent: &str) -> Option<&AgentRow> {
        self.rows.iter().find(|r| r.agent == agent)
    }

    /// Returns the column index of a metric.
    pub fn metric_index(&self, metric: &str) -> Option<usize> {
        self.metrics.iter().position(|m| m.name == metric)
    }

    /// Iterates over every agent's value of the metric at `index`.
    pub fn column(&self, index: usize) -> impl Iterator<Item = MetricValue> + '_ {
        self.rows.iter().map(move |r| r.readings[index].value)
    }

    /// Returns the stored value for an (agent, metric) pair.
    pub fn value(&self, agent: &str, metric: &str) -> Result<MetricValue, AggregatorError> {
        let row = self.row(agent).ok_or_else(|| AggregatorError::NotFound {
            key: LookupKey::Agent,
            name: agent.to_string(),
        })?;
        let index = self
            .metric_index(metric)
            .ok_or_else(|| AggregatorError::NotFound {
                key: LookupKey::Metric,
                name: metric.to_string(),
            })?;
        Ok(row.readings[index].value)
    }
}

/// The aggregate of one metric across all agents.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryEntry {
    pub metric: String,
    pub kind: PolicyKind,
    pub value: MetricValue,
}

/// Per-metric aggregates, in metric order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SummaryTable {
    pub entries: Vec<SummaryEntry>,
}

impl SummaryTable {
    /// Returns the aggregate of a metric.
    #[allow(dead_code)] // Accessor for library-style callers
    pub fn get(&self, metric: &str) -> Option<MetricValue> {
        self.entries
            .iter()
            .find(|e| e.metric == metric)
            .map(|e| e.value)
    }

    #[allow(dead_code)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Value of one metric for one agent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentReading {
    pub agent: String,
    pub value: MetricValue,
}

/// The selected agent/metric pair of the comparison section.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comparison {
    pub agent: String,
    pub metric: String,
    pub value: MetricValue,
}

/// The trending metric and the leading roster agents' values for it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trending {
    pub metric: String,
    pub agents: Vec<AgentReading>,
}

/// Metadata about one render pass.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardMetadata {
    /// Dashboard title.
    pub title: String,
    /// Date and time of generation.
    pub generated_at: DateTime<Utc>,
    /// Number of agents in the roster.
    pub agent_count: usize,
    /// Number of configured metrics.
    pub metric_count: usize,
    /// Seed of a reproducible pass.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

/// Everything rendered by one pass.
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub metadata: DashboardMetadata,
    pub table: MetricTable,
    pub summary: SummaryTable,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comparison: Option<Comparison>,
    pub trending: Trending,
}
