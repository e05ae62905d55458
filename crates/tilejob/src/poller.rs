//! Follows one backend job until it reaches a terminal status.
//!
//! The poller runs as its own task and is the only writer of a
//! `watch` channel carrying the current [`PollView`]. Cancelling the token
//! (or dropping the [`PollTask`]) stops it between polls or mid-request; a
//! response that arrives after cancellation is never published.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::backend::TileBackend;
use crate::types::{JobHandle, JobStatus, ProgressSnapshot};

const UNKNOWN_ERROR: &str = "Unknown error";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PollState {
    #[default]
    Idle,
    Polling,
    Done,
}

#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    Completed(ProgressSnapshot),
    Failed { message: String, snapshot: ProgressSnapshot },
    /// The opt-in poll deadline passed before the job finished.
    TimedOut { last: Option<ProgressSnapshot> },
}

impl JobOutcome {
    pub fn snapshot(&self) -> Option<&ProgressSnapshot> {
        match self {
            JobOutcome::Completed(s) => Some(s),
            JobOutcome::Failed { snapshot, .. } => Some(snapshot),
            JobOutcome::TimedOut { last } => last.as_ref(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, JobOutcome::Completed(_))
    }

    /// The outcome a terminal snapshot stands for; a non-terminal one is
    /// handed back unchanged.
    pub fn classify(snap: ProgressSnapshot) -> Result<JobOutcome, ProgressSnapshot> {
        match snap.status {
            JobStatus::Completed => Ok(JobOutcome::Completed(snap)),
            JobStatus::Error => {
                let message = snap
                    .error
                    .clone()
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| UNKNOWN_ERROR.to_string());
                Ok(JobOutcome::Failed { message, snapshot: snap })
            }
            _ => Err(snap),
        }
    }
}

/// What observers see: the state, the latest snapshot and, once `Done`,
/// the outcome.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PollView {
    pub state: PollState,
    pub snapshot: Option<ProgressSnapshot>,
    pub outcome: Option<JobOutcome>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollerConfig {
    pub interval: Duration,
    pub first_poll_delay: Duration,
    /// Unset means poll until the job ends or the task is cancelled.
    pub max_poll_duration: Option<Duration>,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(1500),
            first_poll_delay: Duration::from_millis(500),
            max_poll_duration: None,
        }
    }
}

pub struct ProgressPoller {
    backend: Arc<dyn TileBackend>,
    config: PollerConfig,
}

impl ProgressPoller {
    pub fn new(backend: Arc<dyn TileBackend>, config: PollerConfig) -> Self {
        Self { backend, config }
    }

    pub fn start(&self, handle: JobHandle) -> PollTask {
        self.start_with_token(handle, CancellationToken::new())
    }

    /// Starts polling under a child of `parent`. Cancelling `parent` stops the
    /// poll; dropping the task leaves `parent` untouched.
    pub fn start_with_token(&self, handle: JobHandle, parent: CancellationToken) -> PollTask {
        let cancel = parent.child_token();
        let (tx, rx) = watch::channel(PollView { state: PollState::Polling, ..PollView::default() });

        let backend = self.backend.clone();
        let config = self.config;
        let token = cancel.clone();
        let join = tokio::spawn(async move {
            let outcome = poll_until_done(backend, &handle, config, &token, &tx).await;
            if outcome.is_none() {
                debug!(session_id=%handle, "poller cancelled");
            }
            outcome
        });

        PollTask { cancel, rx, join: Some(join) }
    }
}

/// Handle to a running poller. Dropping it cancels the poll.
pub struct PollTask {
    cancel: CancellationToken,
    rx: watch::Receiver<PollView>,
    join: Option<JoinHandle<Option<JobOutcome>>>,
}

impl PollTask {
    pub fn subscribe(&self) -> watch::Receiver<PollView> {
        self.rx.clone()
    }

    pub fn view(&self) -> PollView {
        self.rx.borrow().clone()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Waits for the poller to stop. `None` if it was cancelled first.
    pub async fn finish(mut self) -> Option<JobOutcome> {
        let join = self.join.take()?;
        join.await.ok().flatten()
    }
}

impl Drop for PollTask {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn poll_until_done(
    backend: Arc<dyn TileBackend>,
    handle: &JobHandle,
    config: PollerConfig,
    cancel: &CancellationToken,
    tx: &watch::Sender<PollView>,
) -> Option<JobOutcome> {
    let deadline = config.max_poll_duration.map(|d| Instant::now() + d);
    let expiry = async move {
        match deadline {
            Some(at) => time::sleep_until(at).await,
            None => std::future::pending::<()>().await,
        }
    };
    tokio::pin!(expiry);

    let mut last: Option<ProgressSnapshot> = None;

    tokio::select! {
        biased;
        _ = cancel.cancelled() => return None,
        _ = &mut expiry => return conclude(tx, handle, JobOutcome::TimedOut { last }),
        _ = time::sleep(config.first_poll_delay) => {}
    }

    let mut ticks = time::interval_at(Instant::now() + config.interval, config.interval);
    ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        let polled = tokio::select! {
            biased;
            _ = cancel.cancelled() => return None,
            _ = &mut expiry => return conclude(tx, handle, JobOutcome::TimedOut { last }),
            r = backend.progress(handle) => r,
        };

        match polled {
            Ok(snap) => match JobOutcome::classify(snap) {
                Ok(outcome) => return conclude(tx, handle, outcome),
                Err(snap) => {
                    debug!(
                        session_id=%handle,
                        status=%snap.status,
                        downloaded=snap.downloaded_tiles,
                        total=snap.total_tiles,
                        "progress"
                    );
                    last = Some(snap.clone());
                    tx.send_modify(|v| v.snapshot = Some(snap));
                }
            },
            // next tick retries
            Err(e) => warn!(session_id=%handle, "progress poll failed: {e}"),
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return None,
            _ = &mut expiry => return conclude(tx, handle, JobOutcome::TimedOut { last }),
            _ = ticks.tick() => {}
        }
    }
}

fn conclude(tx: &watch::Sender<PollView>, handle: &JobHandle, outcome: JobOutcome) -> Option<JobOutcome> {
    match &outcome {
        JobOutcome::Completed(s) => info!(session_id=%handle, tiles=s.downloaded_tiles, "download completed"),
        JobOutcome::Failed { message, .. } => warn!(session_id=%handle, "download failed: {message}"),
        JobOutcome::TimedOut { .. } => warn!(session_id=%handle, "gave up polling: deadline passed"),
    }

    tx.send_modify(|v| {
        v.state = PollState::Done;
        if let Some(s) = outcome.snapshot() {
            v.snapshot = Some(s.clone());
        }
        v.outcome = Some(outcome.clone());
    });
    Some(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_view_is_idle() {
        let v = PollView::default();
        assert_eq!(v.state, PollState::Idle);
        assert!(v.snapshot.is_none());
        assert!(v.outcome.is_none());
    }

    #[test]
    fn classify_only_terminal_statuses() {
        let running = ProgressSnapshot { status: JobStatus::Running, ..Default::default() };
        assert_eq!(JobOutcome::classify(running.clone()), Err(running));

        let failed = ProgressSnapshot { status: JobStatus::Error, error: Some("  ".into()), ..Default::default() };
        match JobOutcome::classify(failed) {
            Ok(JobOutcome::Failed { message, .. }) => assert_eq!(message, "Unknown error"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn outcome_exposes_its_snapshot() {
        let snap = ProgressSnapshot { status: JobStatus::Completed, ..Default::default() };
        assert!(JobOutcome::Completed(snap.clone()).is_success());
        assert_eq!(JobOutcome::Completed(snap.clone()).snapshot(), Some(&snap));
        assert_eq!(JobOutcome::TimedOut { last: None }.snapshot(), None);
        assert!(!JobOutcome::Failed { message: "x".into(), snapshot: snap }.is_success());
    }
}
