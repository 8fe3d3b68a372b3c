//! Periodic backend liveness polling

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::backend::BackendClient;
use crate::types::ConnectivityStatus;

/// Background poller publishing [`ConnectivityStatus`].
///
/// Starts in `Checking`. Probes fire on a fixed schedule regardless of outcome or
/// probe duration. Stopping prevents new probes; a probe already in flight finishes and its
/// result is dropped. Dropping the monitor stops it.
#[derive(Debug)]
pub struct HealthMonitor {
    status: watch::Receiver<ConnectivityStatus>,
    cancel: CancellationToken,
    _task: JoinHandle<()>,
}

impl HealthMonitor {
    /// Spawn the polling task. Must be called inside a tokio runtime.
    pub fn start(backend: BackendClient, interval: Duration) -> Self {
        let (tx, rx) = watch::channel(ConnectivityStatus::Checking);
        let cancel = CancellationToken::new();
        let task = tokio::spawn(poll(backend, interval, tx, cancel.clone()));
        Self {
            status: rx,
            cancel,
            _task: task,
        }
    }

    /// Latest published status
    pub fn status(&self) -> ConnectivityStatus {
        *self.status.borrow()
    }

    /// Receiver that observes every status change
    pub fn subscribe(&self) -> watch::Receiver<ConnectivityStatus> {
        self.status.clone()
    }

    pub fn stop(&self) {
        self.cancel.cancel();
    }
}

impl Drop for HealthMonitor {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn poll(
    backend: BackendClient,
    interval: Duration,
    tx: watch::Sender<ConnectivityStatus>,
    cancel: CancellationToken,
) {
    let mut ticker = time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let outcome = backend.probe().await;
        if cancel.is_cancelled() {
            debug!("health monitor stopped, discarding probe result");
            break;
        }

        let next = match outcome {
            Ok(()) => ConnectivityStatus::Connected,
            Err(e) => {
                debug!(error = %e, "probe failed");
                ConnectivityStatus::Disconnected
            }
        };
        let previous = tx.send_replace(next);
        if previous != next {
            debug!(from = ?previous, to = ?next, "connectivity changed");
        }
    }
}
