//! Discovery metrics aggregation.
//!
//! Pure computations over the worker map: overall yield, total recall,
//! and a per-iteration discovery-velocity series for the bar chart. All
//! counts are worker-local; recall is deliberately not deduplicated
//! against the entity map.

use std::collections::{BTreeMap, BTreeSet};

use crate::session::WorkerState;

/// Iteration attributed to history entries that carry no iteration number.
const DEFAULT_ITERATION: u64 = 1;

/// Minimum vertical scale for the velocity chart, so sparse discovery
/// does not degenerate into full-height bars.
const MIN_CHART_CEILING: u64 = 10;

/// Aggregated discovery metrics for one snapshot's workers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiscoveryMetrics {
    /// Entities found per page fetched, across all workers. Zero when no
    /// pages have been fetched yet.
    pub yield_rate: f64,
    /// Total entities found across all workers (worker-local counts).
    pub recall: u64,
    /// Total pages fetched across all workers.
    pub pages_fetched: u64,
    /// New entities per iteration, summed over every worker's query
    /// history.
    pub velocity: BTreeMap<u64, u64>,
}

impl DiscoveryMetrics {
    /// Computes metrics from the worker map of a snapshot.
    #[must_use]
    pub fn from_workers(workers: &BTreeMap<String, WorkerState>) -> Self {
        let mut pages_fetched = 0u64;
        let mut recall = 0u64;
        let mut velocity: BTreeMap<u64, u64> = BTreeMap::new();

        for worker in workers.values() {
            pages_fetched += worker.pages_fetched;
            recall += worker.entities_found;

            for entry in &worker.query_history {
                let iteration = entry.iteration.unwrap_or(DEFAULT_ITERATION);
                *velocity.entry(iteration).or_insert(0) += entry.new_entities;
            }
        }

        let yield_rate = if pages_fetched == 0 {
            0.0
        } else {
            #[allow(clippy::cast_precision_loss)]
            {
                recall as f64 / pages_fetched as f64
            }
        };

        Self {
            yield_rate,
            recall,
            pages_fetched,
            velocity,
        }
    }

    /// Yield rate rendered with 2-decimal precision.
    #[must_use]
    pub fn yield_display(&self) -> String {
        format!("{:.2}", self.yield_rate)
    }

    /// Vertical scale for the velocity chart: the maximum bucket value,
    /// floored at a minimum of 10.
    #[must_use]
    pub fn chart_ceiling(&self) -> u64 {
        self.velocity
            .values()
            .copied()
            .max()
            .unwrap_or(0)
            .max(MIN_CHART_CEILING)
    }
}

/// Union of every worker's pending URL queue: the links discovered but
/// not yet explored, across the whole session.
#[must_use]
pub fn discovery_frontier(workers: &BTreeMap<String, WorkerState>) -> BTreeSet<String> {
    workers
        .values()
        .flat_map(|worker| worker.personal_queue.iter().cloned())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{QueryHistoryEntry, WorkerStatus};

    fn worker(id: &str, pages: u64, found: u64) -> WorkerState {
        WorkerState {
            id: id.to_string(),
            session_id: None,
            strategy: "broad_english".to_string(),
            status: WorkerStatus::Active,
            pages_fetched: pages,
            entities_found: found,
            new_entities: 0,
            page_budget: 50,
            personal_queue: Vec::new(),
            query_history: Vec::new(),
            search_events: Vec::new(),
        }
    }

    fn history(iteration: Option<u64>, new_entities: u64) -> QueryHistoryEntry {
        QueryHistoryEntry {
            query: "CDK12 inhibitor preclinical".to_string(),
            iteration,
            results_count: 10,
            new_entities,
        }
    }

    #[test]
    fn yield_and_recall_match_worked_example() {
        let mut workers = BTreeMap::new();
        workers.insert("w-1".to_string(), worker("w-1", 10, 2));
        workers.insert("w-2".to_string(), worker("w-2", 20, 3));

        let metrics = DiscoveryMetrics::from_workers(&workers);
        assert_eq!(metrics.recall, 5);
        assert_eq!(metrics.pages_fetched, 30);
        assert_eq!(metrics.yield_display(), "0.17");
    }

    #[test]
    fn yield_is_zero_without_pages() {
        let mut workers = BTreeMap::new();
        workers.insert("w-1".to_string(), worker("w-1", 0, 0));

        let metrics = DiscoveryMetrics::from_workers(&workers);
        assert_eq!(metrics.yield_rate, 0.0);
        assert_eq!(metrics.yield_display(), "0.00");
    }

    #[test]
    fn velocity_buckets_by_iteration() {
        let mut w1 = worker("w-1", 10, 5);
        w1.query_history.push(history(Some(1), 3));
        w1.query_history.push(history(Some(2), 5));
        let mut w2 = worker("w-2", 8, 2);
        w2.query_history.push(history(Some(1), 2));

        let mut workers = BTreeMap::new();
        workers.insert("w-1".to_string(), w1);
        workers.insert("w-2".to_string(), w2);

        let metrics = DiscoveryMetrics::from_workers(&workers);
        assert_eq!(metrics.velocity.get(&1), Some(&5));
        assert_eq!(metrics.velocity.get(&2), Some(&5));
    }

    #[test]
    fn missing_iteration_defaults_to_one() {
        let mut w = worker("w-1", 5, 4);
        w.query_history.push(history(None, 4));
        w.query_history.push(history(Some(1), 1));

        let mut workers = BTreeMap::new();
        workers.insert("w-1".to_string(), w);

        let metrics = DiscoveryMetrics::from_workers(&workers);
        assert_eq!(metrics.velocity.get(&1), Some(&5));
    }

    #[test]
    fn chart_ceiling_is_floored() {
        let mut w = worker("w-1", 5, 3);
        w.query_history.push(history(Some(1), 3));

        let mut workers = BTreeMap::new();
        workers.insert("w-1".to_string(), w);

        let metrics = DiscoveryMetrics::from_workers(&workers);
        assert_eq!(metrics.chart_ceiling(), 10);
    }

    #[test]
    fn chart_ceiling_tracks_busiest_iteration() {
        let mut w = worker("w-1", 40, 30);
        w.query_history.push(history(Some(1), 12));
        w.query_history.push(history(Some(2), 27));

        let mut workers = BTreeMap::new();
        workers.insert("w-1".to_string(), w);

        let metrics = DiscoveryMetrics::from_workers(&workers);
        assert_eq!(metrics.chart_ceiling(), 27);
    }

    #[test]
    fn frontier_unions_worker_queues() {
        let mut w1 = worker("w-1", 1, 0);
        w1.personal_queue.push("https://a.example/1".to_string());
        w1.personal_queue.push("https://b.example/2".to_string());
        let mut w2 = worker("w-2", 1, 0);
        w2.personal_queue.push("https://b.example/2".to_string());

        let mut workers = BTreeMap::new();
        workers.insert("w-1".to_string(), w1);
        workers.insert("w-2".to_string(), w2);

        let frontier = discovery_frontier(&workers);
        assert_eq!(frontier.len(), 2);
        assert!(frontier.contains("https://a.example/1"));
    }

    #[test]
    fn empty_worker_map_yields_empty_metrics() {
        let metrics = DiscoveryMetrics::from_workers(&BTreeMap::new());
        assert_eq!(metrics.recall, 0);
        assert!(metrics.velocity.is_empty());
        assert_eq!(metrics.chart_ceiling(), 10);
    }
}
