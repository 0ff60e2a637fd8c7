//! Monotonic-invariant reconciliation between snapshots.
//!
//! Several counters in a session are monotonic: the orchestrator's
//! iteration count, each worker's `pages_fetched` and `entities_found`,
//! and each entity's `mention_count`. A decrease between two snapshots of
//! the same session indicates a stale or corrupted fetch, not real state.
//!
//! Reconciliation never rejects a whole snapshot: the offending field is
//! retained at its previous value, the rest of the snapshot is applied,
//! and the anomaly is reported so the poller can log it for the operator.
//! Workers and entities disappearing from their maps is allowed (workers
//! are killed mid-session) and is not a violation.

use crate::error::Error;
use crate::session::SessionSnapshot;

/// One observed violation of a monotonic invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// The session iteration counter went backwards.
    IterationCount {
        /// Value in the currently displayed snapshot.
        previous: u64,
        /// Value observed in the new snapshot.
        observed: u64,
    },
    /// A worker's fetched-page counter went backwards.
    PagesFetched {
        /// Worker id.
        worker_id: String,
        /// Value in the currently displayed snapshot.
        previous: u64,
        /// Value observed in the new snapshot.
        observed: u64,
    },
    /// A worker's found-entity counter went backwards.
    EntitiesFound {
        /// Worker id.
        worker_id: String,
        /// Value in the currently displayed snapshot.
        previous: u64,
        /// Value observed in the new snapshot.
        observed: u64,
    },
    /// An entity's mention counter went backwards.
    MentionCount {
        /// Entity canonical name.
        entity: String,
        /// Value in the currently displayed snapshot.
        previous: u64,
        /// Value observed in the new snapshot.
        observed: u64,
    },
}

impl Violation {
    /// Converts the violation into its error representation for logging.
    #[must_use]
    pub fn into_error(self) -> Error {
        Error::consistency(self.to_string())
    }
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IterationCount { previous, observed } => write!(
                f,
                "iteration_count decreased from {previous} to {observed}"
            ),
            Self::PagesFetched {
                worker_id,
                previous,
                observed,
            } => write!(
                f,
                "worker {worker_id}: pages_fetched decreased from {previous} to {observed}"
            ),
            Self::EntitiesFound {
                worker_id,
                previous,
                observed,
            } => write!(
                f,
                "worker {worker_id}: entities_found decreased from {previous} to {observed}"
            ),
            Self::MentionCount {
                entity,
                previous,
                observed,
            } => write!(
                f,
                "entity {entity}: mention_count decreased from {previous} to {observed}"
            ),
        }
    }
}

/// Applies a new snapshot on top of the currently displayed one,
/// enforcing the monotonic invariants field by field.
///
/// Returns the snapshot to display and every violation that was repaired.
/// The returned snapshot is the incoming one with any regressed counter
/// reset to its previous value; when no violation occurred it is the
/// incoming snapshot unchanged.
#[must_use]
pub fn reconcile(
    previous: &SessionSnapshot,
    mut incoming: SessionSnapshot,
) -> (SessionSnapshot, Vec<Violation>) {
    let mut violations = Vec::new();

    if incoming.iteration_count < previous.iteration_count {
        violations.push(Violation::IterationCount {
            previous: previous.iteration_count,
            observed: incoming.iteration_count,
        });
        incoming.iteration_count = previous.iteration_count;
    }

    for (worker_id, worker) in &mut incoming.workers {
        let Some(prior) = previous.workers.get(worker_id) else {
            continue;
        };
        if worker.pages_fetched < prior.pages_fetched {
            violations.push(Violation::PagesFetched {
                worker_id: worker_id.clone(),
                previous: prior.pages_fetched,
                observed: worker.pages_fetched,
            });
            worker.pages_fetched = prior.pages_fetched;
        }
        if worker.entities_found < prior.entities_found {
            violations.push(Violation::EntitiesFound {
                worker_id: worker_id.clone(),
                previous: prior.entities_found,
                observed: worker.entities_found,
            });
            worker.entities_found = prior.entities_found;
        }
    }

    for (name, entity) in &mut incoming.entities {
        let Some(prior) = previous.entities.get(name) else {
            continue;
        };
        if entity.mention_count < prior.mention_count {
            violations.push(Violation::MentionCount {
                entity: name.clone(),
                previous: prior.mention_count,
                observed: entity.mention_count,
            });
            entity.mention_count = prior.mention_count;
        }
    }

    (incoming, violations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{
        Entity, ResearchPlan, SessionStatus, VerificationStatus, WorkerState, WorkerStatus,
    };
    use std::collections::{BTreeMap, BTreeSet};

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

    fn entity(name: &str, mentions: u64) -> Entity {
        Entity {
            canonical_name: name.to_string(),
            aliases: BTreeSet::new(),
            drug_class: None,
            clinical_phase: None,
            attributes: BTreeMap::new(),
            evidence: Vec::new(),
            mention_count: mentions,
            verification_status: VerificationStatus::Unverified,
            rejection_reason: None,
            confidence_score: 0.0,
        }
    }

    fn snapshot(iteration: u64) -> SessionSnapshot {
        SessionSnapshot {
            id: "s-1".to_string(),
            topic: "topic".to_string(),
            status: SessionStatus::Running,
            iteration_count: iteration,
            entities: BTreeMap::new(),
            workers: BTreeMap::new(),
            plan: ResearchPlan::default(),
            logs: Vec::new(),
            visited_urls: BTreeSet::new(),
        }
    }

    #[test]
    fn clean_snapshot_passes_through() {
        let prev = snapshot(2);
        let next = snapshot(3);
        let (applied, violations) = reconcile(&prev, next.clone());
        assert_eq!(applied, next);
        assert!(violations.is_empty());
    }

    #[test]
    fn iteration_regression_is_repaired() {
        let prev = snapshot(4);
        let next = snapshot(2);
        let (applied, violations) = reconcile(&prev, next);
        assert_eq!(applied.iteration_count, 4);
        assert_eq!(
            violations,
            vec![Violation::IterationCount {
                previous: 4,
                observed: 2
            }]
        );
    }

    #[test]
    fn worker_counter_regression_keeps_rest_of_snapshot() {
        let mut prev = snapshot(1);
        prev.workers.insert("w-1".to_string(), worker("w-1", 20, 5));

        let mut next = snapshot(2);
        next.workers.insert("w-1".to_string(), worker("w-1", 10, 7));
        next.logs.push("iteration 2 started".to_string());

        let (applied, violations) = reconcile(&prev, next);
        // Regressed field pinned, everything else applied.
        assert_eq!(applied.workers["w-1"].pages_fetched, 20);
        assert_eq!(applied.workers["w-1"].entities_found, 7);
        assert_eq!(applied.iteration_count, 2);
        assert_eq!(applied.logs.len(), 1);
        assert_eq!(violations.len(), 1);
    }

    #[test]
    fn mention_count_regression_is_repaired() {
        let mut prev = snapshot(1);
        prev.entities
            .insert("BMS-986158".to_string(), entity("BMS-986158", 6));

        let mut next = snapshot(1);
        next.entities
            .insert("BMS-986158".to_string(), entity("BMS-986158", 3));

        let (applied, violations) = reconcile(&prev, next);
        assert_eq!(applied.entities["BMS-986158"].mention_count, 6);
        assert!(matches!(
            violations.as_slice(),
            [Violation::MentionCount { .. }]
        ));
    }

    #[test]
    fn disappearing_worker_is_not_a_violation() {
        let mut prev = snapshot(1);
        prev.workers.insert("w-1".to_string(), worker("w-1", 20, 5));
        prev.workers.insert("w-2".to_string(), worker("w-2", 9, 1));

        let mut next = snapshot(2);
        next.workers.insert("w-1".to_string(), worker("w-1", 25, 6));

        let (applied, violations) = reconcile(&prev, next);
        assert!(violations.is_empty());
        assert_eq!(applied.workers.len(), 1);
    }

    #[test]
    fn violation_renders_through_error_taxonomy() {
        let violation = Violation::PagesFetched {
            worker_id: "w-1".to_string(),
            previous: 20,
            observed: 10,
        };
        let err = violation.into_error();
        assert!(err.to_string().contains("pages_fetched decreased"));
    }
}
