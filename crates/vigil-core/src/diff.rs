//! Structural change detection between snapshots.
//!
//! The poller re-fetches on a fixed interval, so most fetches return a
//! payload identical to what is already on screen. Replacing the displayed
//! snapshot anyway would flicker the view and waste downstream
//! recomputation, so a new snapshot is applied only when it differs
//! meaningfully.
//!
//! Comparison is an explicit recursive walk over the typed state rather
//! than serialize-and-compare: order matters for log lines, query
//! histories, and evidence (their order is meaningful), while the entity
//! and worker maps compare by key set and per-key value. `BTreeMap`
//! storage makes the map comparison independent of server key order by
//! construction.

use crate::session::{SessionSnapshot, SessionStatus};

/// What changed between the displayed snapshot and a newly fetched one.
///
/// Carried on the update event so the operator log can say *why* the view
/// refreshed, not just that it did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSummary {
    /// Status transition, when the status changed.
    pub status_change: Option<(SessionStatus, SessionStatus)>,
    /// How far the iteration counter advanced.
    pub iterations_advanced: u64,
    /// Entities present in the new snapshot but not the old one.
    pub entities_added: usize,
    /// Entities present in both whose contents differ.
    pub entities_changed: usize,
    /// Entities present in the old snapshot but not the new one.
    pub entities_removed: usize,
    /// Whether any worker state differs (including added/removed workers).
    pub workers_changed: bool,
    /// Log lines appended since the displayed snapshot.
    pub log_lines_appended: usize,
    /// Whether the strategic plan differs.
    pub plan_changed: bool,
    /// Newly visited URLs.
    pub urls_added: usize,
    /// Catch-all for fields not covered above (topic, reordered logs).
    pub other_changed: bool,
}

impl ChangeSummary {
    /// Returns true when any component of the snapshot differs.
    #[must_use]
    pub fn is_change(&self) -> bool {
        self.status_change.is_some()
            || self.iterations_advanced > 0
            || self.entities_added > 0
            || self.entities_changed > 0
            || self.entities_removed > 0
            || self.workers_changed
            || self.log_lines_appended > 0
            || self.plan_changed
            || self.urls_added > 0
            || self.other_changed
    }
}

impl std::fmt::Display for ChangeSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut parts = Vec::new();
        if let Some((from, to)) = &self.status_change {
            parts.push(format!("status {from} -> {to}"));
        }
        if self.iterations_advanced > 0 {
            parts.push(format!("+{} iterations", self.iterations_advanced));
        }
        if self.entities_added > 0 {
            parts.push(format!("+{} entities", self.entities_added));
        }
        if self.entities_changed > 0 {
            parts.push(format!("{} entities updated", self.entities_changed));
        }
        if self.entities_removed > 0 {
            parts.push(format!("-{} entities", self.entities_removed));
        }
        if self.workers_changed {
            parts.push("workers updated".to_string());
        }
        if self.log_lines_appended > 0 {
            parts.push(format!("+{} log lines", self.log_lines_appended));
        }
        if self.plan_changed {
            parts.push("plan updated".to_string());
        }
        if self.urls_added > 0 {
            parts.push(format!("+{} urls", self.urls_added));
        }
        if parts.is_empty() {
            write!(f, "no change")
        } else {
            write!(f, "{}", parts.join(", "))
        }
    }
}

/// Compares the displayed snapshot against a newly fetched one.
///
/// Returns `None` when the snapshots are structurally identical (the new
/// one should be discarded) and a [`ChangeSummary`] otherwise. Feeding the
/// same snapshot twice always yields `None`, so the detector never
/// triggers a redundant replace.
#[must_use]
pub fn detect_change(current: &SessionSnapshot, incoming: &SessionSnapshot) -> Option<ChangeSummary> {
    let mut summary = ChangeSummary::default();

    if current.status != incoming.status {
        summary.status_change = Some((current.status, incoming.status));
    }
    summary.iterations_advanced = incoming
        .iteration_count
        .saturating_sub(current.iteration_count);

    for (name, entity) in &incoming.entities {
        match current.entities.get(name) {
            None => summary.entities_added += 1,
            Some(prior) if prior != entity => summary.entities_changed += 1,
            Some(_) => {}
        }
    }
    summary.entities_removed = current
        .entities
        .keys()
        .filter(|name| !incoming.entities.contains_key(*name))
        .count();

    summary.workers_changed = current.workers != incoming.workers;

    // Log order is meaningful: an append extends the displayed sequence,
    // anything else is a rewrite and still counts as a change.
    if incoming.logs.len() > current.logs.len()
        && incoming.logs[..current.logs.len()] == current.logs[..]
    {
        summary.log_lines_appended = incoming.logs.len() - current.logs.len();
    } else if incoming.logs != current.logs {
        summary.other_changed = true;
    }

    summary.plan_changed = current.plan != incoming.plan;
    summary.urls_added = incoming
        .visited_urls
        .difference(&current.visited_urls)
        .count();

    if current.topic != incoming.topic
        || current.id != incoming.id
        || current.visited_urls != incoming.visited_urls && summary.urls_added == 0
        || incoming.iteration_count < current.iteration_count
    {
        summary.other_changed = true;
    }

    summary.is_change().then_some(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{Entity, ResearchPlan, VerificationStatus};
    use std::collections::{BTreeMap, BTreeSet};

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

    fn snapshot() -> SessionSnapshot {
        SessionSnapshot {
            id: "s-1".to_string(),
            topic: "topic".to_string(),
            status: SessionStatus::Running,
            iteration_count: 1,
            entities: BTreeMap::new(),
            workers: BTreeMap::new(),
            plan: ResearchPlan::default(),
            logs: vec!["worker spawned".to_string()],
            visited_urls: BTreeSet::new(),
        }
    }

    #[test]
    fn identical_snapshots_are_not_a_change() {
        let snap = snapshot();
        assert!(detect_change(&snap, &snap.clone()).is_none());
    }

    #[test]
    fn detector_is_idempotent() {
        let current = snapshot();
        let mut incoming = snapshot();
        incoming.iteration_count = 2;

        assert!(detect_change(&current, &incoming).is_some());
        // Once applied, re-feeding the same snapshot never replaces again.
        assert!(detect_change(&incoming, &incoming.clone()).is_none());
    }

    #[test]
    fn appended_logs_are_counted() {
        let current = snapshot();
        let mut incoming = snapshot();
        incoming.logs.push("Found 3 new entities".to_string());
        incoming.logs.push("iteration 2 started".to_string());

        let summary = detect_change(&current, &incoming).unwrap();
        assert_eq!(summary.log_lines_appended, 2);
        assert!(!summary.other_changed);
    }

    #[test]
    fn rewritten_logs_are_a_change_without_append_count() {
        let current = snapshot();
        let mut incoming = snapshot();
        incoming.logs[0] = "rewritten".to_string();

        let summary = detect_change(&current, &incoming).unwrap();
        assert_eq!(summary.log_lines_appended, 0);
        assert!(summary.other_changed);
    }

    #[test]
    fn entity_additions_and_updates_are_distinguished() {
        let mut current = snapshot();
        current
            .entities
            .insert("A".to_string(), entity("A", 2));

        let mut incoming = snapshot();
        incoming.entities.insert("A".to_string(), entity("A", 5));
        incoming.entities.insert("B".to_string(), entity("B", 1));

        let summary = detect_change(&current, &incoming).unwrap();
        assert_eq!(summary.entities_added, 1);
        assert_eq!(summary.entities_changed, 1);
        assert_eq!(summary.entities_removed, 0);
    }

    #[test]
    fn status_transition_is_reported() {
        let current = snapshot();
        let mut incoming = snapshot();
        incoming.status = SessionStatus::VerificationPending;

        let summary = detect_change(&current, &incoming).unwrap();
        assert_eq!(
            summary.status_change,
            Some((SessionStatus::Running, SessionStatus::VerificationPending))
        );
    }

    #[test]
    fn summary_display_reads_like_a_log_line() {
        let current = snapshot();
        let mut incoming = snapshot();
        incoming.iteration_count = 3;
        incoming.entities.insert("A".to_string(), entity("A", 1));

        let summary = detect_change(&current, &incoming).unwrap();
        let line = summary.to_string();
        assert!(line.contains("+2 iterations"));
        assert!(line.contains("+1 entities"));
    }
}
