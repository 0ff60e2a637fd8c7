//! Progress-stage derivation.
//!
//! Maps session status and iteration count onto a fixed five-stage
//! progress sequence: Preparation, Discovery, Deep Dive, Verification,
//! Completed. Pure and total: every (status, iteration) pair produces the
//! same five stages, with earlier stages always marked done before later
//! ones.
//!
//! When the session ends in a failure-shaped status, the first stage that
//! is neither done nor active is overwritten in place with a Failed stage
//! (the last stage when all are done). Exactly one stage is ever shown as
//! failed and all prior progress stays visible.

use crate::session::SessionStatus;

/// Number of stages in the progress sequence.
pub const STAGE_COUNT: usize = 5;

/// Discovery iterations belong to the broad Discovery stage; anything
/// beyond this count is the Deep Dive.
const DISCOVERY_ITERATION_LIMIT: u64 = 2;

/// Identity of a progress stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageKind {
    /// Session created, orchestrator preparing.
    Preparation,
    /// Broad initial discovery (first iterations).
    Discovery,
    /// Focused follow-up iterations.
    DeepDive,
    /// Entity verification.
    Verification,
    /// Research finished.
    Completed,
    /// The stage at which the session failed. Only produced by the
    /// terminal-failure override.
    Failed,
}

impl std::fmt::Display for StageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Preparation => "Preparation",
            Self::Discovery => "Discovery",
            Self::DeepDive => "Deep Dive",
            Self::Verification => "Verification",
            Self::Completed => "Completed",
            Self::Failed => "Failed",
        };
        write!(f, "{s}")
    }
}

/// One stage of the progress sequence with its display flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stage {
    /// Which stage this is.
    pub kind: StageKind,
    /// The session is currently in this stage.
    pub is_active: bool,
    /// This stage has been passed.
    pub is_done: bool,
}

impl Stage {
    const fn new(kind: StageKind, is_active: bool, is_done: bool) -> Self {
        Self {
            kind,
            is_active,
            is_done,
        }
    }
}

/// Derives the five-stage progress sequence for a session.
#[must_use]
pub fn derive_stages(status: SessionStatus, iteration_count: u64) -> [Stage; STAGE_COUNT] {
    use SessionStatus as S;

    let deep_dive_started = iteration_count > DISCOVERY_ITERATION_LIMIT;
    let past_discovery = matches!(status, S::VerificationPending | S::Completed);

    let mut stages = [
        Stage::new(
            StageKind::Preparation,
            status == S::Initialized,
            status != S::Initialized,
        ),
        Stage::new(
            StageKind::Discovery,
            status == S::Running && !deep_dive_started,
            deep_dive_started || past_discovery,
        ),
        Stage::new(
            StageKind::DeepDive,
            status == S::Running && deep_dive_started,
            past_discovery,
        ),
        Stage::new(
            StageKind::Verification,
            status == S::VerificationPending,
            status == S::Completed,
        ),
        Stage::new(StageKind::Completed, status == S::Completed, false),
    ];

    if status.is_failure() {
        let slot = stages
            .iter()
            .position(|stage| !stage.is_done && !stage.is_active)
            .unwrap_or(STAGE_COUNT - 1);
        stages[slot] = Stage::new(StageKind::Failed, true, false);
    }

    stages
}

#[cfg(test)]
mod tests {
    use super::*;

    fn active_kinds(stages: &[Stage]) -> Vec<StageKind> {
        stages
            .iter()
            .filter(|s| s.is_active)
            .map(|s| s.kind)
            .collect()
    }

    #[test]
    fn initialized_session_is_in_preparation() {
        let stages = derive_stages(SessionStatus::Initialized, 0);
        assert_eq!(stages[0].kind, StageKind::Preparation);
        assert!(stages[0].is_active);
        assert!(!stages[0].is_done);
        assert_eq!(active_kinds(&stages), vec![StageKind::Preparation]);
    }

    #[test]
    fn early_iterations_are_discovery() {
        for iteration in [0, 1, 2] {
            let stages = derive_stages(SessionStatus::Running, iteration);
            assert!(stages[0].is_done, "preparation done once running");
            assert_eq!(active_kinds(&stages), vec![StageKind::Discovery]);
            assert!(!stages[1].is_done);
        }
    }

    #[test]
    fn later_iterations_are_deep_dive() {
        let stages = derive_stages(SessionStatus::Running, 3);
        assert!(stages[1].is_done, "discovery done once iterations pass 2");
        assert_eq!(active_kinds(&stages), vec![StageKind::DeepDive]);
    }

    #[test]
    fn verification_pending_closes_earlier_stages() {
        let stages = derive_stages(SessionStatus::VerificationPending, 5);
        assert!(stages[0].is_done);
        assert!(stages[1].is_done);
        assert!(stages[2].is_done);
        assert_eq!(active_kinds(&stages), vec![StageKind::Verification]);
        assert!(!stages[3].is_done);
    }

    #[test]
    fn completed_session_activates_final_stage() {
        let stages = derive_stages(SessionStatus::Completed, 7);
        assert!(stages[..4].iter().all(|s| s.is_done));
        assert_eq!(active_kinds(&stages), vec![StageKind::Completed]);
    }

    #[test]
    fn exactly_one_stage_active_for_every_input() {
        let statuses = [
            SessionStatus::Initialized,
            SessionStatus::Running,
            SessionStatus::VerificationPending,
            SessionStatus::Completed,
            SessionStatus::Failed,
            SessionStatus::Killed,
            SessionStatus::Cancelled,
            SessionStatus::TimedOut,
        ];
        for status in statuses {
            for iteration in 0..6 {
                let stages = derive_stages(status, iteration);
                let active = stages.iter().filter(|s| s.is_active).count();
                assert_eq!(active, 1, "status {status}, iteration {iteration}");
            }
        }
    }

    #[test]
    fn earlier_stages_done_before_later_ones() {
        let statuses = [
            SessionStatus::Initialized,
            SessionStatus::Running,
            SessionStatus::VerificationPending,
            SessionStatus::Completed,
        ];
        for status in statuses {
            for iteration in 0..6 {
                let stages = derive_stages(status, iteration);
                let mut seen_not_done = false;
                for stage in &stages {
                    if stage.is_done {
                        assert!(!seen_not_done, "status {status}, iteration {iteration}");
                    } else {
                        seen_not_done = true;
                    }
                }
            }
        }
    }

    #[test]
    fn failure_during_discovery_rewrites_discovery() {
        let stages = derive_stages(SessionStatus::Failed, 1);
        assert!(stages[0].is_done, "preparation progress preserved");
        assert_eq!(stages[1].kind, StageKind::Failed);
        assert!(stages[1].is_active);
        assert!(!stages[1].is_done);
        assert!(stages[2..].iter().all(|s| !s.is_done && !s.is_active));
    }

    #[test]
    fn failure_during_deep_dive_rewrites_deep_dive() {
        let stages = derive_stages(SessionStatus::Killed, 4);
        assert!(stages[0].is_done);
        assert!(stages[1].is_done, "discovery progress preserved");
        assert_eq!(stages[2].kind, StageKind::Failed);
        assert!(stages[2].is_active);
    }

    #[test]
    fn failure_before_any_iteration_rewrites_discovery() {
        // Cancelled before discovery got anywhere: preparation counts as
        // done (status left initialized), so discovery takes the mark.
        let stages = derive_stages(SessionStatus::Cancelled, 0);
        assert!(stages[0].is_done);
        assert_eq!(stages[1].kind, StageKind::Failed);
        assert!(stages[1].is_active);
    }

    #[test]
    fn exactly_one_failed_stage_for_failure_statuses() {
        for status in [
            SessionStatus::Failed,
            SessionStatus::Killed,
            SessionStatus::Cancelled,
            SessionStatus::TimedOut,
        ] {
            for iteration in 0..8 {
                let stages = derive_stages(status, iteration);
                let failed = stages
                    .iter()
                    .filter(|s| s.kind == StageKind::Failed)
                    .count();
                assert_eq!(failed, 1, "status {status}, iteration {iteration}");
            }
        }
    }
}
