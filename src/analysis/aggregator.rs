//! Metric generation and aggregation.
//!
//! This module draws random per-agent values for a validated roster and
//! metric set, and computes the per-metric summary across all agents.

use crate::models::{
    AgentReading, AgentRow, MetricDef, MetricPolicy, MetricTable, MetricValue, PolicyKind,
    Reading, SummaryEntry, SummaryTable,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;
use tracing::debug;

/// Which half of a lookup key was not found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupKey {
    Agent,
    Metric,
}

impl fmt::Display for LookupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupKey::Agent => write!(f, "Agent"),
            LookupKey::Metric => write!(f, "Metric"),
        }
    }
}

/// Errors raised by the aggregator.
#[derive(Debug, Error, PartialEq)]
pub enum AggregatorError {
    /// The agent or metric is not part of the configured sets.
    #[error("{key} not found: '{name}'")]
    NotFound { key: LookupKey, name: String },

    /// The roster or metric definitions are malformed.
    #[error("Invalid configuration: {0}")]
    Configuration(String),
}

/// Generates metric tables for a fixed roster and metric set.
///
/// Holds only its validated configuration; every call to
/// [`MetricsAggregator::generate`] produces an independent table.
#[derive(Debug, Clone)]
pub struct MetricsAggregator {
    agents: Vec<String>,
    metrics: Vec<MetricDef>,
}

impl MetricsAggregator {
    /// Validates the roster and metric definitions.
    pub fn new(agents: Vec<String>, metrics: Vec<MetricDef>) -> Result<Self, AggregatorError> {
        validate_definitions(&agents, &metrics)?;
        Ok(Self { agents, metrics })
    }

    /// Configured agents, in roster order.
    pub fn agents(&self) -> &[String] {
        &self.agents
    }

    /// Configured metrics, in display order.
    pub fn metrics(&self) -> &[MetricDef] {
        &self.metrics
    }

    /// Draws a fresh table from the thread-local RNG.
    pub fn generate(&self) -> MetricTable {
        self.generate_with(&mut rand::thread_rng())
    }

    /// Draws a fresh table from the given RNG.
    pub fn generate_with<R: Rng + ?Sized>(&self, rng: &mut R) -> MetricTable {
        let rows = self
            .agents
            .iter()
            .map(|agent| AgentRow {
                agent: agent.clone(),
                readings: self
                    .metrics
                    .iter()
                    .map(|def| Reading {
                        metric: def.name.clone(),
                        value: draw_value(&def.policy, rng),
                    })
                    .collect(),
            })
            .collect();

        debug!(
            "Generated {} x {} metric table",
            self.agents.len(),
            self.metrics.len()
        );

        MetricTable::from_parts(self.metrics.clone(), rows)
    }

    /// Picks the trending metric. A seed makes the choice reproducible.
    pub fn pick_trending(&self, seed: Option<u64>) -> &MetricDef {
        match seed {
            Some(seed) => self.pick_trending_with(&mut StdRng::seed_from_u64(seed)),
            None => self.pick_trending_with(&mut rand::thread_rng()),
        }
    }

    /// Picks the trending metric using the given RNG.
    pub fn pick_trending_with<R: Rng + ?Sized>(&self, rng: &mut R) -> &MetricDef {
        // `new` guarantees a non-empty metric set.
        let index = rng.gen_range(0..self.metrics.len());
        &self.metrics[index]
    }
}

/// Checks a roster and metric set before any value is drawn.
///
/// Besides emptiness, blank and duplicate names, this bounds every metric
/// so that drawing values and summarizing `agents.len()` of them can
/// neither panic nor overflow.
pub(crate) fn validate_definitions(
    agents: &[String],
    metrics: &[MetricDef],
) -> Result<(), AggregatorError> {
    if agents.is_empty() {
        return Err(AggregatorError::Configuration(
            "at least one agent is required".to_string(),
        ));
    }
    if metrics.is_empty() {
        return Err(AggregatorError::Configuration(
            "at least one metric is required".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for agent in agents {
        if agent.trim().is_empty() {
            return Err(AggregatorError::Configuration(
                "agent names must not be blank".to_string(),
            ));
        }
        if !seen.insert(agent.as_str()) {
            return Err(AggregatorError::Configuration(format!(
                "duplicate agent '{}'",
                agent
            )));
        }
    }

    let mut seen = HashSet::new();
    for def in metrics {
        validate_metric(def, agents.len())?;
        if !seen.insert(def.name.as_str()) {
            return Err(AggregatorError::Configuration(format!(
                "duplicate metric '{}'",
                def.name
            )));
        }
    }

    Ok(())
}

fn validate_metric(def: &MetricDef, agent_count: usize) -> Result<(), AggregatorError> {
    let invalid = |reason: String| {
        Err(AggregatorError::Configuration(format!(
            "metric '{}' {}",
            def.name, reason
        )))
    };

    if def.name.trim().is_empty() {
        return Err(AggregatorError::Configuration(
            "metric names must not be blank".to_string(),
        ));
    }

    match def.policy {
        MetricPolicy::Count { min, max } => {
            if min > max {
                return invalid(format!("has min {} above max {}", min, max));
            }
            if max.checked_mul(agent_count as u64).is_none() {
                return invalid(format!(
                    "max {} overflows the total of {} agents",
                    max, agent_count
                ));
            }
        }
        MetricPolicy::Rate { min, max } => {
            // `Uniform::new_inclusive` divides the span by `1 - EPSILON`.
            if !((max - min) / (1.0 - f64::EPSILON)).is_finite() {
                return invalid("has a non-finite range".to_string());
            }
            if min > max {
                return invalid(format!("has min {} above max {}", min, max));
            }
            let magnitude = max.abs().max(min.abs());
            if !(magnitude * 100.0 * agent_count as f64).is_finite() {
                return invalid(format!(
                    "bounds are too large to average over {} agents",
                    agent_count
                ));
            }
            if ceil2(min) > floor2(max) {
                return invalid(format!(
                    "has no 2-decimal value between {} and {}",
                    min, max
                ));
            }
        }
    }

    Ok(())
}

fn draw_value<R: Rng + ?Sized>(policy: &MetricPolicy, rng: &mut R) -> MetricValue {
    match *policy {
        MetricPolicy::Count { min, max } => MetricValue::Count(rng.gen_range(min..=max)),
        MetricPolicy::Rate { min, max } => {
            let raw: f64 = rng.gen_range(min..=max);
            MetricValue::Rate(round2(raw).clamp(ceil2(min), floor2(max)))
        }
    }
}

/// Smallest 2-decimal value not below `value`.
fn ceil2(value: f64) -> f64 {
    let mut hundredths = (value * 100.0).round();
    if hundredths / 100.0 < value {
        hundredths += 1.0;
    }
    hundredths / 100.0
}

/// Largest 2-decimal value not above `value`.
fn floor2(value: f64) -> f64 {
    let mut hundredths = (value * 100.0).round();
    if hundredths / 100.0 > value {
        hundredths -= 1.0;
    }
    hundredths / 100.0
}

/// Rounds to 2 decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Sums count metrics and averages rate metrics across all agents.
pub fn summarize(table: &MetricTable) -> SummaryTable {
    let agent_count = table.rows().len();

    let entries = table
        .metrics()
        .iter()
        .enumerate()
        .map(|(index, def)| {
            let kind = def.policy.kind();
            let value = match kind {
                PolicyKind::Count => MetricValue::Count(
                    table
                        .column(index)
                        .map(|v| match v {
                            MetricValue::Count(n) => n,
                            MetricValue::Rate(r) => r as u64,
                        })
                        .sum(),
                ),
                PolicyKind::Rate => {
                    let total: f64 = table.column(index).map(|v| v.as_f64()).sum();
                    MetricValue::Rate(round2(total / agent_count as f64))
                }
            };

            SummaryEntry {
                metric: def.name.clone(),
                kind,
                value,
            }
        })
        .collect();

    SummaryTable { entries }
}

/// Returns the value stored for an (agent, metric) pair.
pub fn lookup(table: &MetricTable, agent: &str, metric: &str) -> Result<MetricValue, AggregatorError> {
    table.value(agent, metric)
}

/// Returns the first `n` roster agents' values for a metric.
pub fn leading_agents(
    table: &MetricTable,
    metric: &str,
    n: usize,
) -> Result<Vec<AgentReading>, AggregatorError> {
    let index = table
        .metric_index(metric)
        .ok_or_else(|| AggregatorError::NotFound {
            key: LookupKey::Metric,
            name: metric.to_string(),
        })?;

    Ok(table
        .rows()
        .iter()
        .take(n)
        .map(|row| AgentReading {
            agent: row.agent.clone(),
            value: row.readings[index].value,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn default_like_metrics() -> Vec<MetricDef> {
        vec![
            MetricDef::count("Emails Sent", 10, 500),
            MetricDef::rate("Response Time (ms)", 1.0, 100.0),
            MetricDef::count("Tasks Completed", 10, 500),
            MetricDef::rate("Feedback Ratings (%)", 1.0, 100.0),
        ]
    }

    fn create_test_aggregator() -> MetricsAggregator {
        MetricsAggregator::new(roster(&["A", "B", "C"]), default_like_metrics()).unwrap()
    }

    #[test]
    fn test_generated_values_within_range() {
        let aggregator = create_test_aggregator();

        for _ in 0..50 {
            let table = aggregator.generate();
            assert_eq!(table.rows().len(), 3);

            for row in table.rows() {
                assert_eq!(row.readings.len(), aggregator.metrics().len());
                for (def, reading) in aggregator.metrics().iter().zip(&row.readings) {
                    assert_eq!(reading.metric, def.name);
                    assert!(
                        def.policy.contains(reading.value),
                        "{} out of range for {}",
                        reading.value,
                        def.name
                    );
                }
            }
        }
    }

    #[test]
    fn test_rate_values_have_two_decimals() {
        let aggregator = create_test_aggregator();
        let table = aggregator.generate_with(&mut StdRng::seed_from_u64(7));

        for value in table.column(1) {
            let v = value.as_f64();
            assert!((v * 100.0 - (v * 100.0).round()).abs() < 1e-6);
        }
    }

    #[test]
    fn test_degenerate_ranges() {
        let aggregator = MetricsAggregator::new(
            roster(&["A", "B"]),
            vec![
                MetricDef::count("Fixed", 7, 7),
                MetricDef::rate("Fixed Rate", 12.5, 12.5),
            ],
        )
        .unwrap();

        let table = aggregator.generate();
        for row in table.rows() {
            assert_eq!(row.readings[0].value, MetricValue::Count(7));
            assert_eq!(row.readings[1].value, MetricValue::Rate(12.5));
        }
    }

    #[test]
    fn test_seeded_generation_is_reproducible() {
        let aggregator = create_test_aggregator();
        let first = aggregator.generate_with(&mut StdRng::seed_from_u64(42));
        let second = aggregator.generate_with(&mut StdRng::seed_from_u64(42));
        assert_eq!(first, second);
    }

    #[test]
    fn test_unseeded_generation_varies() {
        let aggregator = MetricsAggregator::new(
            roster(&["A", "B", "C", "D", "E"]),
            vec![MetricDef::count("Wide", 0, u64::MAX / 5)],
        )
        .unwrap();

        let tables: Vec<_> = (0..5).map(|_| aggregator.generate()).collect();
        assert!(tables.windows(2).any(|w| w[0] != w[1]));
    }

    #[test]
    fn test_summarize_count_is_sum() {
        let table = MetricTable::from_rows(
            vec![MetricDef::count("Tasks Completed", 10, 500)],
            vec![
                ("A", vec![MetricValue::Count(10)]),
                ("B", vec![MetricValue::Count(20)]),
            ],
        )
        .unwrap();

        let summary = summarize(&table);
        assert_eq!(summary.get("Tasks Completed"), Some(MetricValue::Count(30)));
        assert_eq!(summary.entries[0].kind, PolicyKind::Count);
    }

    #[test]
    fn test_summarize_rate_is_mean() {
        let table = MetricTable::from_rows(
            vec![MetricDef::rate("Feedback Ratings (%)", 1.0, 100.0)],
            vec![
                ("A", vec![MetricValue::Rate(50.0)]),
                ("B", vec![MetricValue::Rate(60.0)]),
            ],
        )
        .unwrap();

        let summary = summarize(&table);
        assert_eq!(
            summary.get("Feedback Ratings (%)"),
            Some(MetricValue::Rate(55.0))
        );
    }

    #[test]
    fn test_summarize_rate_rounds_mean() {
        let table = MetricTable::from_rows(
            vec![MetricDef::rate("Response Time (ms)", 1.0, 100.0)],
            vec![
                ("A", vec![MetricValue::Rate(10.0)]),
                ("B", vec![MetricValue::Rate(10.0)]),
                ("C", vec![MetricValue::Rate(10.01)]),
            ],
        )
        .unwrap();

        let summary = summarize(&table);
        assert_eq!(
            summary.get("Response Time (ms)"),
            Some(MetricValue::Rate(10.0))
        );
    }

    #[test]
    fn test_summarize_matches_generated_table() {
        let aggregator = create_test_aggregator();
        let table = aggregator.generate();
        let summary = summarize(&table);

        assert_eq!(summary.len(), aggregator.metrics().len());
        for (index, (def, entry)) in aggregator
            .metrics()
            .iter()
            .zip(&summary.entries)
            .enumerate()
        {
            assert_eq!(entry.metric, def.name);
            match def.policy {
                MetricPolicy::Count { .. } => {
                    let expected: u64 = table
                        .column(index)
                        .map(|v| v.as_f64() as u64)
                        .sum();
                    assert_eq!(entry.value, MetricValue::Count(expected));
                }
                MetricPolicy::Rate { .. } => {
                    let total: f64 = table.column(index).map(|v| v.as_f64()).sum();
                    assert_eq!(entry.value, MetricValue::Rate(round2(total / 3.0)));
                }
            }
        }
    }

    #[test]
    fn test_lookup() {
        let aggregator = create_test_aggregator();
        let table = aggregator.generate();

        for row in table.rows() {
            for reading in &row.readings {
                assert_eq!(
                    lookup(&table, &row.agent, &reading.metric),
                    Ok(reading.value)
                );
            }
        }

        assert_eq!(
            lookup(&table, "Z", "Emails Sent"),
            Err(AggregatorError::NotFound {
                key: LookupKey::Agent,
                name: "Z".to_string(),
            })
        );
        assert_eq!(
            lookup(&table, "A", "Coffee Breaks"),
            Err(AggregatorError::NotFound {
                key: LookupKey::Metric,
                name: "Coffee Breaks".to_string(),
            })
        );
    }

    #[test]
    fn test_not_found_message() {
        let err = AggregatorError::NotFound {
            key: LookupKey::Agent,
            name: "Agent Q".to_string(),
        };
        assert_eq!(err.to_string(), "Agent not found: 'Agent Q'");
    }

    #[test]
    fn test_pick_trending_is_member() {
        let aggregator = create_test_aggregator();

        for seed in 0..20 {
            let picked = aggregator.pick_trending(Some(seed));
            assert!(aggregator.metrics().contains(picked));
        }
        for _ in 0..20 {
            let picked = aggregator.pick_trending(None);
            assert!(aggregator.metrics().contains(picked));
        }

        assert_eq!(
            aggregator.pick_trending(Some(3)),
            aggregator.pick_trending(Some(3))
        );
    }

    #[test]
    fn test_leading_agents() {
        let aggregator = create_test_aggregator();
        let table = aggregator.generate();

        let leading = leading_agents(&table, "Emails Sent", 2).unwrap();
        assert_eq!(leading.len(), 2);
        assert_eq!(leading[0].agent, "A");
        assert_eq!(leading[1].agent, "B");
        assert_eq!(
            leading[1].value,
            lookup(&table, "B", "Emails Sent").unwrap()
        );

        // Capped at roster size.
        assert_eq!(leading_agents(&table, "Emails Sent", 10).unwrap().len(), 3);
        assert!(leading_agents(&table, "Nope", 2).is_err());
    }

    #[test]
    fn test_new_rejects_empty_roster() {
        let result = MetricsAggregator::new(Vec::new(), default_like_metrics());
        assert!(matches!(result, Err(AggregatorError::Configuration(_))));
    }

    #[test]
    fn test_new_rejects_empty_metrics() {
        let result = MetricsAggregator::new(roster(&["A"]), Vec::new());
        assert!(matches!(result, Err(AggregatorError::Configuration(_))));
    }

    #[test]
    fn test_new_rejects_inverted_ranges() {
        let count = MetricsAggregator::new(roster(&["A"]), vec![MetricDef::count("X", 10, 5)]);
        assert!(matches!(count, Err(AggregatorError::Configuration(_))));

        let rate = MetricsAggregator::new(roster(&["A"]), vec![MetricDef::rate("Y", 2.0, 1.0)]);
        assert!(matches!(rate, Err(AggregatorError::Configuration(_))));

        let nan = MetricsAggregator::new(
            roster(&["A"]),
            vec![MetricDef::rate("Z", f64::NAN, 1.0)],
        );
        assert!(matches!(nan, Err(AggregatorError::Configuration(_))));
    }

    #[test]
    fn test_new_rejects_duplicates() {
        let agents = MetricsAggregator::new(roster(&["A", "A"]), default_like_metrics());
        assert!(matches!(agents, Err(AggregatorError::Configuration(_))));

        let metrics = MetricsAggregator::new(
            roster(&["A"]),
            vec![MetricDef::count("X", 1, 2), MetricDef::count("X", 1, 2)],
        );
        assert!(matches!(metrics, Err(AggregatorError::Configuration(_))));
    }

    #[test]
    fn test_new_rejects_count_total_overflow() {
        let big = i64::MAX as u64;
        let result = MetricsAggregator::new(
            roster(&["A", "B", "C"]),
            vec![MetricDef::count("Big", big, big)],
        );
        assert!(matches!(result, Err(AggregatorError::Configuration(_))));

        // The largest max whose total still fits.
        let fits = u64::MAX / 3;
        let aggregator = MetricsAggregator::new(
            roster(&["A", "B", "C"]),
            vec![MetricDef::count("Big", fits, fits)],
        )
        .unwrap();
        let summary = summarize(&aggregator.generate());
        assert_eq!(summary.get("Big"), Some(MetricValue::Count(fits * 3)));
    }

    #[test]
    fn test_new_rejects_unsampleable_rate_range() {
        let result = MetricsAggregator::new(
            roster(&["A"]),
            vec![MetricDef::rate("R", 0.0, f64::MAX)],
        );
        assert!(matches!(result, Err(AggregatorError::Configuration(_))));
    }

    #[test]
    fn test_new_rejects_rate_mean_overflow() {
        let result = MetricsAggregator::new(
            roster(&["A", "B", "C"]),
            vec![MetricDef::rate("R", 1e308, 1e308)],
        );
        assert!(matches!(result, Err(AggregatorError::Configuration(_))));

        let aggregator = MetricsAggregator::new(
            roster(&["A", "B", "C"]),
            vec![MetricDef::rate("R", 0.0, 1e12)],
        )
        .unwrap();
        let summary = summarize(&aggregator.generate());
        assert!(summary.get("R").unwrap().as_f64().is_finite());
    }

    #[test]
    fn test_new_rejects_rate_range_without_two_decimal_value() {
        let result = MetricsAggregator::new(
            roster(&["A"]),
            vec![MetricDef::rate("Narrow", 0.001, 0.009)],
        );
        assert!(matches!(result, Err(AggregatorError::Configuration(_))));
    }

    #[test]
    fn test_rate_values_stay_on_two_decimal_grid_inside_bounds() {
        let aggregator = MetricsAggregator::new(
            roster(&["A", "B", "C", "D"]),
            vec![MetricDef::rate("Fine", 0.001, 0.029)],
        )
        .unwrap();

        for seed in 0..50 {
            let table = aggregator.generate_with(&mut StdRng::seed_from_u64(seed));
            for value in table.column(0) {
                let v = value.as_f64();
                assert!((0.001..=0.029).contains(&v), "{} out of bounds", v);
                assert!(v == 0.01 || v == 0.02, "{} not on the 2-decimal grid", v);
            }
        }
    }

    #[test]
    fn test_two_decimal_bounds() {
        assert_eq!(ceil2(0.001), 0.01);
        assert_eq!(ceil2(0.29), 0.29);
        assert_eq!(floor2(0.57), 0.57);
        assert_eq!(floor2(0.029), 0.02);
        assert_eq!(ceil2(-0.005), 0.0);
    }
}
