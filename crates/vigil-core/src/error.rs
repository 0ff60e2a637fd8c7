//! Error types and result alias for vigil.
//!
//! The taxonomy mirrors the failure modes a dashboard client actually
//! distinguishes: transport failures, unknown sessions, contract-violating
//! payloads, and monotonic-invariant violations between snapshots. The
//! polling controller decides which of these are fatal; none of them are
//! here.

use std::fmt;

/// The result type used throughout vigil.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while synchronizing session state.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A transport-level failure, including timeouts.
    #[error("network error: {message}")]
    Network {
        /// Description of the transport failure.
        message: String,
        /// The underlying cause, if any.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The server does not know the requested session.
    #[error("session not found: {session_id}")]
    NotFound {
        /// The session identifier that was looked up.
        session_id: String,
    },

    /// The payload does not match the session state contract.
    #[error("malformed response: {message}")]
    MalformedResponse {
        /// Description of the contract violation.
        message: String,
    },

    /// A monotonic invariant was violated by a newly fetched snapshot.
    ///
    /// Never fatal to the display: the offending field is retained at its
    /// previous value and the rest of the snapshot is applied.
    #[error("data consistency violation: {message}")]
    DataConsistency {
        /// Description of the violated invariant.
        message: String,
    },

    /// The client was constructed with invalid configuration.
    #[error("configuration error: {message}")]
    Configuration {
        /// Description of the configuration problem.
        message: String,
    },
}

impl Error {
    /// Creates a new network error with the given message.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new network error with a source cause.
    #[must_use]
    pub fn network_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Network {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a new not-found error for the given session.
    #[must_use]
    pub fn not_found(session_id: impl fmt::Display) -> Self {
        Self::NotFound {
            session_id: session_id.to_string(),
        }
    }

    /// Creates a new malformed-response error.
    #[must_use]
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            message: message.into(),
        }
    }

    /// Creates a new data-consistency error.
    #[must_use]
    pub fn consistency(message: impl Into<String>) -> Self {
        Self::DataConsistency {
            message: message.into(),
        }
    }

    /// Creates a new configuration error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Returns true when the error is fatal on a background refresh.
    ///
    /// Only an unknown session stops polling; transport and payload
    /// failures are logged and the previous snapshot stays on screen.
    #[must_use]
    pub fn is_fatal_on_refresh(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
