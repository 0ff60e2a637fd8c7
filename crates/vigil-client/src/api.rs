//! Wire types for the backend's HTTP surface.
//!
//! The snapshot payload itself is [`vigil_core::session::SessionSnapshot`];
//! this module holds the envelope types for the remaining operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use vigil_core::session::SessionStatus;

/// Response after starting a research session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartResponse {
    /// Identifier of the newly created session.
    pub session_id: String,
    /// Human-readable confirmation from the server.
    #[serde(default)]
    pub message: String,
}

/// One entry in the research-session history listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    /// Session identifier.
    pub session_id: String,
    /// Research topic.
    pub topic: String,
    /// Lifecycle status at listing time.
    pub status: SessionStatus,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
    /// Entities discovered so far.
    #[serde(default)]
    pub entities_count: u64,
    /// Accumulated backend cost, when the server reports it.
    #[serde(default)]
    pub total_cost: Option<f64>,
}
