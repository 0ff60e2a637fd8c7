//! # vigil-client
//!
//! Transport and polling layer for the vigil research dashboard.
//!
//! - [`client::ResearchClient`] speaks the backend's read-mostly HTTP
//!   surface: start a session, fetch a snapshot, list history, export CSV.
//! - [`poller::SessionPoller`] owns the repeat-fetch loop for one watched
//!   session: an explicit state machine that schedules fetches, routes
//!   results through consistency reconciliation and change detection, and
//!   delivers updates over an event channel.
//!
//! The poller depends on the transport only through the
//! [`client::SnapshotSource`] trait, so tests drive it with a scripted
//! source instead of a live server.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]

pub mod api;
pub mod client;
pub mod metrics;
pub mod poller;

pub use api::{SessionSummary, StartResponse};
pub use client::{ResearchClient, SnapshotSource};
pub use poller::{PollEvent, PollerConfig, PollerHandle, PollerState, SessionPoller, StopReason};
