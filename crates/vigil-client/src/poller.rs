//! Polling controller for one watched session.
//!
//! An explicit state machine drives the repeat-fetch loop:
//!
//! ```text
//! Idle → Loading → Displaying ⇄ Refreshing → Stopped
//! ```
//!
//! The controller fetches once on start, then re-fetches on a fixed
//! interval until the displayed status is terminal, the session
//! disappears server-side, or the viewer cancels. Each successful refresh
//! passes through monotonic-consistency reconciliation and structural
//! change detection before it may replace the displayed snapshot; an
//! unchanged payload is discarded without an event.
//!
//! At most one fetch is ever in flight per controller: the loop awaits
//! each fetch before scheduling the next, so snapshots apply in strict
//! sequential order with no sequence numbers. Cancellation is
//! cooperative: a shared liveness flag is checked both before scheduling
//! the next fetch and before applying a just-completed fetch's result.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use metrics::counter;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, trace, warn};

use vigil_core::consistency::reconcile;
use vigil_core::diff::{ChangeSummary, detect_change};
use vigil_core::error::Error;
use vigil_core::observability::poll_span;
use vigil_core::session::{SessionSnapshot, SessionStatus};

use crate::client::SnapshotSource;
use crate::metrics::{labels, names};

/// Default interval between background refreshes.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Polling controller states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PollerState {
    /// Created, initial fetch not yet issued.
    Idle,
    /// Initial fetch in flight; nothing to display yet.
    Loading,
    /// A snapshot is on display; next refresh is scheduled.
    Displaying,
    /// A background refresh is in flight; previous snapshot stays up.
    Refreshing,
    /// No further fetches will ever be issued.
    Stopped,
}

impl PollerState {
    /// Returns true if the transition from self to target is valid.
    #[must_use]
    pub fn can_transition_to(self, target: Self) -> bool {
        match self {
            Self::Idle => matches!(target, Self::Loading),
            Self::Loading => matches!(target, Self::Displaying | Self::Stopped),
            Self::Displaying => matches!(target, Self::Refreshing | Self::Stopped),
            Self::Refreshing => matches!(target, Self::Displaying | Self::Stopped),
            Self::Stopped => false,
        }
    }
}

impl std::fmt::Display for PollerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Displaying => "displaying",
            Self::Refreshing => "refreshing",
            Self::Stopped => "stopped",
        };
        write!(f, "{s}")
    }
}

/// Why a poller stopped issuing fetches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// The displayed snapshot reached a terminal status.
    Terminal(SessionStatus),
    /// The server no longer knows the session.
    SessionDeleted,
    /// The viewer tore the controller down.
    Cancelled,
    /// The very first fetch failed; there was never anything to display.
    InitialFetchFailed(String),
}

impl StopReason {
    fn metric_label(&self) -> &'static str {
        match self {
            Self::Terminal(_) => "terminal",
            Self::SessionDeleted => "session_deleted",
            Self::Cancelled => "cancelled",
            Self::InitialFetchFailed(_) => "initial_fetch_failed",
        }
    }
}

/// Events delivered to the viewer of a polled session.
#[derive(Debug, Clone)]
pub enum PollEvent {
    /// The initial snapshot arrived.
    Loaded(Arc<SessionSnapshot>),
    /// A refresh produced a meaningfully different snapshot.
    Updated {
        /// The new displayed snapshot.
        snapshot: Arc<SessionSnapshot>,
        /// What changed, for operator logs.
        summary: ChangeSummary,
    },
    /// A background refresh failed non-fatally; the previous snapshot
    /// stays on display and polling continues.
    RefreshFailed {
        /// Rendered error message.
        message: String,
    },
    /// The poller stopped; no further events will arrive.
    Stopped(StopReason),
}

/// Configuration for a session poller.
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Interval between background refreshes.
    pub interval: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// Handle to a spawned session poller.
///
/// Dropping the handle cancels the poller cooperatively; an in-flight
/// fetch result is discarded on arrival and no further fetch is issued.
#[derive(Debug)]
pub struct PollerHandle {
    events: mpsc::UnboundedReceiver<PollEvent>,
    alive: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

impl PollerHandle {
    /// Receives the next poll event, or `None` once the poller is gone.
    pub async fn next_event(&mut self) -> Option<PollEvent> {
        self.events.recv().await
    }

    /// Cancels the poller. Never aborts an in-flight fetch; the loop
    /// notices the flag at its next checkpoint and exits.
    pub fn stop(&self) {
        self.alive.store(false, Ordering::SeqCst);
    }

    /// Returns true while the poller task is still running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Spawns polling controllers.
pub struct SessionPoller;

impl SessionPoller {
    /// Spawns a poller for the given session on the current runtime.
    #[must_use]
    pub fn spawn(
        source: Arc<dyn SnapshotSource>,
        session_id: impl Into<String>,
        config: PollerConfig,
    ) -> PollerHandle {
        let session_id = session_id.into();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let alive = Arc::new(AtomicBool::new(true));

        let worker = PollWorker {
            source,
            session_id: session_id.clone(),
            config,
            events: events_tx,
            alive: Arc::clone(&alive),
            state: PollerState::Idle,
        };
        let task = tokio::spawn(worker.run().instrument(poll_span(&session_id)));

        PollerHandle {
            events: events_rx,
            alive,
            task,
        }
    }
}

struct PollWorker {
    source: Arc<dyn SnapshotSource>,
    session_id: String,
    config: PollerConfig,
    events: mpsc::UnboundedSender<PollEvent>,
    alive: Arc<AtomicBool>,
    state: PollerState,
}

impl PollWorker {
    fn transition(&mut self, target: PollerState) {
        debug_assert!(
            self.state.can_transition_to(target),
            "invalid poller transition {} -> {}",
            self.state,
            target
        );
        trace!(from = %self.state, to = %target, "poller transition");
        self.state = target;
    }

    fn alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    fn emit(&self, event: PollEvent) {
        // A closed channel means the viewer is gone; the liveness flag
        // will stop the loop at its next checkpoint.
        let _ = self.events.send(event);
    }

    fn stop(&mut self, reason: StopReason) {
        counter!(
            names::POLL_STOPPED_TOTAL,
            labels::REASON => reason.metric_label(),
        )
        .increment(1);
        self.emit(PollEvent::Stopped(reason));
        self.transition(PollerState::Stopped);
    }

    async fn run(mut self) {
        self.transition(PollerState::Loading);

        let initial = self.source.fetch(&self.session_id).await;
        record_fetch_outcome(&initial);
        let mut displayed = match initial {
            Ok(snapshot) => Arc::new(snapshot),
            Err(err) => {
                // No prior snapshot to fall back to: surface and stop.
                self.stop(StopReason::InitialFetchFailed(err.to_string()));
                return;
            }
        };
        self.emit(PollEvent::Loaded(Arc::clone(&displayed)));
        self.transition(PollerState::Displaying);

        loop {
            if displayed.status.is_terminal() {
                debug!(status = %displayed.status, "session finished, polling stops");
                self.stop(StopReason::Terminal(displayed.status));
                return;
            }
            if !self.alive() {
                self.stop(StopReason::Cancelled);
                return;
            }

            tokio::time::sleep(self.config.interval).await;
            if !self.alive() {
                self.stop(StopReason::Cancelled);
                return;
            }

            self.transition(PollerState::Refreshing);
            let result = self.source.fetch(&self.session_id).await;
            record_fetch_outcome(&result);

            if !self.alive() {
                // The viewer went away while the fetch was in flight;
                // discard the result on arrival.
                self.stop(StopReason::Cancelled);
                return;
            }

            match result {
                Ok(incoming) => {
                    let (applied, violations) = reconcile(&displayed, incoming);
                    for violation in violations {
                        counter!(names::POLL_CONSISTENCY_REPAIRS_TOTAL).increment(1);
                        warn!(%violation, "kept previous value for regressed field");
                    }

                    if let Some(summary) = detect_change(&displayed, &applied) {
                        debug!(%summary, "applying updated snapshot");
                        counter!(names::POLL_UPDATES_TOTAL).increment(1);
                        displayed = Arc::new(applied);
                        self.emit(PollEvent::Updated {
                            snapshot: Arc::clone(&displayed),
                            summary,
                        });
                    } else {
                        trace!("snapshot unchanged, discarding");
                        counter!(names::POLL_UNCHANGED_TOTAL).increment(1);
                    }
                    self.transition(PollerState::Displaying);
                }
                Err(err) if err.is_fatal_on_refresh() => {
                    warn!(error = %err, "session gone from server, polling stops");
                    self.stop(StopReason::SessionDeleted);
                    return;
                }
                Err(err) => {
                    warn!(error = %err, "background refresh failed, keeping previous snapshot");
                    self.emit(PollEvent::RefreshFailed {
                        message: err.to_string(),
                    });
                    self.transition(PollerState::Displaying);
                }
            }
        }
    }
}

fn record_fetch_outcome<T>(result: &Result<T, Error>) {
    let outcome = match result {
        Ok(_) => labels::OUTCOME_OK,
        Err(Error::Network { .. }) => labels::OUTCOME_NETWORK_ERROR,
        Err(Error::MalformedResponse { .. }) => labels::OUTCOME_MALFORMED,
        Err(Error::NotFound { .. }) => labels::OUTCOME_NOT_FOUND,
        Err(_) => labels::OUTCOME_OTHER,
    };
    counter!(names::POLL_FETCHES_TOTAL, labels::OUTCOME => outcome).increment(1);
}
