use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::backend::TileBackend;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    #[default]
    Unknown,
    Online,
    Offline(String),
}

impl ConnectionStatus {
    pub fn is_online(&self) -> bool {
        matches!(self, ConnectionStatus::Online)
    }
}

impl std::fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionStatus::Unknown => f.write_str("unknown"),
            ConnectionStatus::Online => f.write_str("online"),
            ConnectionStatus::Offline(reason) => write!(f, "offline ({reason})"),
        }
    }
}

/// Periodic `GET /health` on its own cadence, independent of any job.
pub struct HealthMonitor {
    cancel: CancellationToken,
    rx: watch::Receiver<ConnectionStatus>,
    join: JoinHandle<()>,
}

impl HealthMonitor {
    pub fn spawn(backend: Arc<dyn TileBackend>, every: Duration) -> Self {
        Self::spawn_with_token(backend, every, CancellationToken::new())
    }

    /// Runs under a child of `parent`, so shutting the monitor down never
    /// cancels the caller's token.
    pub fn spawn_with_token(backend: Arc<dyn TileBackend>, every: Duration, parent: CancellationToken) -> Self {
        let cancel = parent.child_token();
        let (tx, rx) = watch::channel(ConnectionStatus::Unknown);
        let token = cancel.clone();

        let join = tokio::spawn(async move {
            let mut ticks = tokio::time::interval(every);
            ticks.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    _ = ticks.tick() => {}
                }

                let checked = tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    r = backend.health() => r,
                };
                let next = match checked {
                    Ok(()) => ConnectionStatus::Online,
                    Err(e) => ConnectionStatus::Offline(e.to_string()),
                };

                tx.send_if_modified(|current| {
                    if *current == next {
                        return false;
                    }
                    match &next {
                        ConnectionStatus::Online => info!("tile server online"),
                        ConnectionStatus::Offline(reason) => warn!(%reason, "tile server offline"),
                        ConnectionStatus::Unknown => {}
                    }
                    *current = next;
                    true
                });
            }
        });

        Self { cancel, rx, join }
    }

    pub fn status(&self) -> ConnectionStatus {
        self.rx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ConnectionStatus> {
        self.rx.clone()
    }

    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        let _ = (&mut self.join).await;
    }
}

impl Drop for HealthMonitor {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
