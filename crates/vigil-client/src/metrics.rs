//! Observability metrics for the polling controller.
//!
//! Exposed via the `metrics` crate facade. Name and label constants live
//! here so dashboards and tests reference the same strings.
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `vigil_poll_fetches_total` | Counter | `outcome` | Snapshot fetch attempts by outcome |
//! | `vigil_poll_updates_total` | Counter | - | Snapshots that replaced the displayed state |
//! | `vigil_poll_unchanged_total` | Counter | - | Fetches discarded as structurally identical |
//! | `vigil_poll_stopped_total` | Counter | `reason` | Poller terminations by reason |
//! | `vigil_poll_consistency_repairs_total` | Counter | - | Monotonic-invariant repairs applied |

/// Metric names as constants for consistency.
pub mod names {
    /// Counter: snapshot fetch attempts by outcome.
    pub const POLL_FETCHES_TOTAL: &str = "vigil_poll_fetches_total";
    /// Counter: snapshots that replaced the displayed state.
    pub const POLL_UPDATES_TOTAL: &str = "vigil_poll_updates_total";
    /// Counter: fetches discarded as structurally identical.
    pub const POLL_UNCHANGED_TOTAL: &str = "vigil_poll_unchanged_total";
    /// Counter: poller terminations by reason.
    pub const POLL_STOPPED_TOTAL: &str = "vigil_poll_stopped_total";
    /// Counter: monotonic-invariant repairs applied to incoming snapshots.
    pub const POLL_CONSISTENCY_REPAIRS_TOTAL: &str = "vigil_poll_consistency_repairs_total";
}

/// Label keys and values.
pub mod labels {
    /// Label key: fetch outcome.
    pub const OUTCOME: &str = "outcome";
    /// Label key: stop reason.
    pub const REASON: &str = "reason";

    /// Outcome value: fetch succeeded.
    pub const OUTCOME_OK: &str = "ok";
    /// Outcome value: transport failure or timeout.
    pub const OUTCOME_NETWORK_ERROR: &str = "network_error";
    /// Outcome value: payload failed the snapshot contract.
    pub const OUTCOME_MALFORMED: &str = "malformed_response";
    /// Outcome value: session unknown to the server.
    pub const OUTCOME_NOT_FOUND: &str = "not_found";
    /// Outcome value: any failure outside the fetch taxonomy.
    pub const OUTCOME_OTHER: &str = "other";
}
