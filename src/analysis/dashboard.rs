//! Assembly of one dashboard render pass.

use crate::analysis::aggregator::{
    leading_agents, lookup, summarize, AggregatorError, MetricsAggregator,
};
use crate::models::{Comparison, Dashboard, DashboardMetadata, Trending};
use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info};

/// Inputs of a render pass beyond the aggregator itself.
#[derive(Debug, Clone)]
pub struct DashboardRequest {
    /// Dashboard title.
    pub title: String,
    /// Seed for a reproducible pass.
    pub seed: Option<u64>,
    /// Agent and metric of the comparison section.
    pub compare: Option<(String, String)>,
    /// Number of roster agents listed under the trending metric.
    pub trending_agents: usize,
}

/// Generates a fresh table and derives every dashboard section from it.
pub fn build_dashboard(
    aggregator: &MetricsAggregator,
    request: &DashboardRequest,
) -> Result<Dashboard, AggregatorError> {
    let table = match request.seed {
        Some(seed) => {
            debug!("Using seed {}", seed);
            aggregator.generate_with(&mut StdRng::seed_from_u64(seed))
        }
        None => aggregator.generate(),
    };

    let summary = summarize(&table);

    let comparison = match request.compare {
        Some((ref agent, ref metric)) => Some(Comparison {
            agent: agent.clone(),
            metric: metric.clone(),
            value: lookup(&table, agent, metric)?,
        }),
        None => None,
    };

    let trending_metric = aggregator.pick_trending(request.seed).name.clone();
    let trending = Trending {
        agents: leading_agents(&table, &trending_metric, request.trending_agents)?,
        metric: trending_metric,
    };
    info!("Trending metric: {}", trending.metric);

    let metadata = DashboardMetadata {
        title: request.title.clone(),
        generated_at: Utc::now(),
        agent_count: aggregator.agents().len(),
        metric_count: aggregator.metrics().len(),
        seed: request.seed,
    };

    Ok(Dashboard {
        metadata,
        table,
        summary,
        comparison,
        trending,
    })
}
