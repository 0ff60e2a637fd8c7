//! Typed shape of a research session snapshot.
//!
//! A snapshot is the full server-side view of one research session at a
//! point in time: global status, the entity knowledge base, per-worker
//! search state, the strategic plan, and the operator log. Snapshots are
//! created fresh on every successful fetch and never mutated in place;
//! the previously displayed snapshot is retained only for comparison.
//!
//! Maps are `BTreeMap` and sets are `BTreeSet` so iteration order is
//! deterministic: ranking ties, structural comparison, and rendered row
//! order are all stable across re-fetches of identical data.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Lifecycle status of a research session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Session record created, orchestrator not yet running.
    Initialized,
    /// Workers are actively searching and extracting.
    Running,
    /// Discovery finished, entity verification in progress.
    VerificationPending,
    /// Research finished successfully.
    Completed,
    /// Research failed.
    Failed,
    /// Orchestrator was killed.
    Killed,
    /// Session was cancelled by the operator.
    Cancelled,
    /// Session exceeded its time budget.
    TimedOut,
}

impl SessionStatus {
    /// Returns true when polling should stop for this status.
    ///
    /// Only `completed` and `failed` are terminal for the scheduler; a
    /// killed or timed-out session may still be resurrected server-side,
    /// so the poller keeps watching it.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Returns true for every failure-shaped status.
    ///
    /// These trigger the Failed stage override in the progress view.
    #[must_use]
    pub const fn is_failure(self) -> bool {
        matches!(
            self,
            Self::Failed | Self::Killed | Self::Cancelled | Self::TimedOut
        )
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Initialized => "initialized",
            Self::Running => "running",
            Self::VerificationPending => "verification_pending",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Killed => "killed",
            Self::Cancelled => "cancelled",
            Self::TimedOut => "timed_out",
        };
        write!(f, "{s}")
    }
}

/// Full server-side view of one research session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Session identifier (slug plus short unique suffix).
    pub id: String,
    /// The research topic as entered by the operator.
    pub topic: String,
    /// Current lifecycle status.
    pub status: SessionStatus,
    /// Orchestrator iteration counter. Monotonic; may skip values but
    /// never decreases between snapshots of the same session.
    #[serde(default)]
    pub iteration_count: u64,
    /// Discovered entities, keyed by canonical name.
    #[serde(default)]
    pub entities: BTreeMap<String, Entity>,
    /// Worker search state, keyed by worker id. The key set may shrink
    /// between snapshots when workers are killed.
    #[serde(default)]
    pub workers: BTreeMap<String, WorkerState>,
    /// Current strategic plan.
    #[serde(default)]
    pub plan: ResearchPlan,
    /// Operator log lines, append-only from the server's perspective.
    #[serde(default)]
    pub logs: Vec<String>,
    /// URLs already visited by any worker.
    #[serde(default)]
    pub visited_urls: BTreeSet<String>,
}

impl SessionSnapshot {
    /// Checks the map-key invariants of the snapshot contract.
    ///
    /// Entity map keys must equal each entity's own canonical name and
    /// worker map keys must equal each worker's own id. A mismatch means
    /// the payload cannot be trusted and is rejected as malformed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedResponse`] on the first violated invariant.
    pub fn validate(&self) -> Result<()> {
        for (key, entity) in &self.entities {
            if *key != entity.canonical_name {
                return Err(Error::malformed(format!(
                    "entity map key '{key}' does not match canonical name '{}'",
                    entity.canonical_name
                )));
            }
        }
        for (key, worker) in &self.workers {
            if *key != worker.id {
                return Err(Error::malformed(format!(
                    "worker map key '{key}' does not match worker id '{}'",
                    worker.id
                )));
            }
        }
        Ok(())
    }
}

/// Activity status reported by an individual search worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkerStatus {
    /// Worker is searching normally.
    Active,
    /// Worker is finding new entities at a healthy rate.
    Productive,
    /// Worker's novelty rate is dropping.
    Declining,
    /// Worker has used up its productive queries.
    Exhausted,
    /// Worker's strategy yielded nothing; candidate for killing.
    DeadEnd,
    /// Status label the client does not recognize.
    #[serde(other)]
    Unknown,
}

impl Default for WorkerStatus {
    fn default() -> Self {
        Self::Active
    }
}

impl std::fmt::Display for WorkerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Active => "ACTIVE",
            Self::Productive => "PRODUCTIVE",
            Self::Declining => "DECLINING",
            Self::Exhausted => "EXHAUSTED",
            Self::DeadEnd => "DEAD_END",
            Self::Unknown => "UNKNOWN",
        };
        write!(f, "{s}")
    }
}

/// State and metrics of an individual search worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerState {
    /// Worker identifier.
    pub id: String,
    /// Owning session id, when the server reports it.
    #[serde(default)]
    pub session_id: Option<String>,
    /// Strategy label (e.g. `broad_english`, `specific_code_name`).
    #[serde(default)]
    pub strategy: String,
    /// Current activity status.
    #[serde(default)]
    pub status: WorkerStatus,
    /// Pages fetched so far. Monotonic per worker.
    #[serde(default)]
    pub pages_fetched: u64,
    /// Entities extracted so far. Monotonic per worker.
    #[serde(default)]
    pub entities_found: u64,
    /// Entities found in the most recent iteration.
    #[serde(default)]
    pub new_entities: u64,
    /// Fixed page ceiling used for progress-percentage computation.
    #[serde(default)]
    pub page_budget: u64,
    /// URLs queued for this worker to visit next.
    #[serde(default)]
    pub personal_queue: Vec<String>,
    /// Executed queries, in execution order.
    #[serde(default)]
    pub query_history: Vec<QueryHistoryEntry>,
    /// Per-engine search events, in execution order.
    #[serde(default)]
    pub search_events: Vec<SearchEngineEvent>,
}

impl WorkerState {
    /// Progress through the page budget as a percentage, capped at 100.
    ///
    /// A zero budget reports zero progress rather than dividing by zero.
    #[must_use]
    pub fn progress_percent(&self) -> u64 {
        if self.page_budget == 0 {
            return 0;
        }
        (self.pages_fetched.saturating_mul(100) / self.page_budget).min(100)
    }
}

/// One executed search query and its outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryHistoryEntry {
    /// The query text.
    pub query: String,
    /// Iteration in which the query ran. Entries without an iteration
    /// are attributed to iteration 1 by the velocity aggregation.
    #[serde(default)]
    pub iteration: Option<u64>,
    /// Raw result count returned by the search engine.
    #[serde(default)]
    pub results_count: u64,
    /// Previously unknown entities this query surfaced.
    #[serde(default)]
    pub new_entities: u64,
}

/// One search-engine invocation observed by a worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchEngineEvent {
    /// Search engine name.
    pub engine: String,
    /// The query text sent to the engine.
    pub query: String,
    /// Raw result count.
    #[serde(default)]
    pub results: u64,
    /// Previously unknown entities surfaced by this call.
    #[serde(default)]
    pub new_entities: u64,
}

/// Verification outcome for a discovered entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerificationStatus {
    /// Confirmed against independent evidence.
    Verified,
    /// Not yet checked.
    Unverified,
    /// Checked but the evidence is inconclusive.
    Uncertain,
    /// Checked and ruled out.
    Rejected,
    /// Status label the client does not recognize; ranks last.
    #[serde(other)]
    Unknown,
}

impl VerificationStatus {
    /// Display priority: lower sorts earlier in the ranked entity table.
    #[must_use]
    pub const fn priority(self) -> u8 {
        match self {
            Self::Verified => 0,
            Self::Unverified => 1,
            Self::Uncertain => 2,
            Self::Rejected => 3,
            Self::Unknown => 4,
        }
    }
}

impl Default for VerificationStatus {
    fn default() -> Self {
        Self::Unverified
    }
}

impl std::fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Verified => "VERIFIED",
            Self::Unverified => "UNVERIFIED",
            Self::Uncertain => "UNCERTAIN",
            Self::Rejected => "REJECTED",
            Self::Unknown => "UNKNOWN",
        };
        write!(f, "{s}")
    }
}

/// A discovered entity with its metadata and supporting evidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Canonical name; unique key across the entity map.
    pub canonical_name: String,
    /// Raw strings found in text (code names, synonyms).
    #[serde(default)]
    pub aliases: BTreeSet<String>,
    /// Drug class, when known.
    #[serde(default)]
    pub drug_class: Option<String>,
    /// Clinical phase, when known.
    #[serde(default)]
    pub clinical_phase: Option<String>,
    /// Free-form structured attributes (target, modality, geography...).
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    /// Verbatim excerpts backing the entity, in extraction order.
    #[serde(default)]
    pub evidence: Vec<EvidenceSnippet>,
    /// Times this entity was extracted. Monotonic per entity.
    #[serde(default)]
    pub mention_count: u64,
    /// Verification outcome.
    #[serde(default)]
    pub verification_status: VerificationStatus,
    /// Why the entity was rejected, when it was.
    #[serde(default)]
    pub rejection_reason: Option<String>,
    /// Verification confidence in `0.0..=1.0`.
    #[serde(default)]
    pub confidence_score: f64,
}

/// Verbatim text evidence with its source and extraction time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceSnippet {
    /// URL of the page the excerpt was taken from.
    pub source_url: String,
    /// The excerpt itself.
    pub content: String,
    /// When the excerpt was extracted.
    pub timestamp: DateTime<Utc>,
}

/// Coverage gap identified by the planner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gap {
    /// What is missing.
    pub description: String,
    /// How urgently it should be filled.
    #[serde(default)]
    pub priority: GapPriority,
    /// Why the planner believes this is a gap.
    #[serde(default)]
    pub reasoning: String,
}

/// Priority of a coverage gap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GapPriority {
    /// Nice to fill eventually.
    Low,
    /// Should be addressed this session.
    Medium,
    /// Blocks a credible result.
    High,
}

impl Default for GapPriority {
    fn default() -> Self {
        Self::Low
    }
}

impl std::fmt::Display for GapPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        };
        write!(f, "{s}")
    }
}

/// The orchestrator's current strategic understanding.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResearchPlan {
    /// Current working hypothesis.
    #[serde(default)]
    pub current_hypothesis: String,
    /// Summary of findings so far.
    #[serde(default)]
    pub findings_summary: String,
    /// Open coverage gaps, in planner order.
    #[serde(default)]
    pub gaps: Vec<Gap>,
    /// Planned next steps, in planner order.
    #[serde(default)]
    pub next_steps: Vec<String>,
    /// The planner's strategic rationale, when provided.
    #[serde(default)]
    pub reasoning: Option<String>,
}
