//! # vigil-core
//!
//! Client-side state model and derived-metrics engine for the vigil
//! research dashboard.
//!
//! The backend (a multi-worker research agent discovering and verifying
//! biomedical entities) is an external collaborator reached over a small
//! read-only HTTP surface. This crate owns everything on the client side
//! that is not transport or presentation:
//!
//! - **Session model**: the typed shape of a session snapshot
//! - **Consistency**: monotonic-invariant reconciliation between snapshots
//! - **Change detection**: structural comparison that gates re-renders
//! - **Derived views**: progress stages, discovery metrics, entity ranking
//!
//! All derivation functions are pure and synchronous; they read a snapshot
//! and never mutate it. The polling controller that produces snapshots
//! lives in `vigil-client`.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]

pub mod consistency;
pub mod diff;
pub mod discovery;
pub mod error;
pub mod observability;
pub mod ranking;
pub mod session;
pub mod stage;

pub use error::{Error, Result};
pub use session::{
    Entity, EvidenceSnippet, Gap, GapPriority, QueryHistoryEntry, ResearchPlan, SearchEngineEvent,
    SessionSnapshot, SessionStatus, VerificationStatus, WorkerState, WorkerStatus,
};
