//! Periodic refresh: a timer task that asks the event loop to re-run the
//! current query, plus the bookkeeping shown in the header.
//!
//! The scheduler only emits [`AppEvent::RefreshTick`]; whether a tick turns into a
//! request is decided by the controller's in-flight guard, so a slow server never
//! causes ticks to pile up. The task is aborted when the scheduler is dropped.

use crate::classify::RunsError;
use crate::events::AppEvent;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Notify};
use tokio::task::JoinHandle;
use tokio::time;

/// Default cadence between background refreshes.
pub const DEFAULT_REFRESH_SECS: u64 = 15;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshState {
    pub last_refreshed_at: Option<DateTime<Utc>>,
    pub is_refreshing: bool,
    pub last_error: Option<RunsError>,
}

impl RefreshState {
    pub fn begin(&mut self) {
        self.is_refreshing = true;
    }

    pub fn succeeded(&mut self, at: DateTime<Utc>) {
        self.is_refreshing = false;
        self.last_refreshed_at = Some(at);
        self.last_error = None;
    }

    pub fn failed(&mut self, error: RunsError) {
        self.is_refreshing = false;
        self.last_error = Some(error);
    }

    /// Response dropped without being applied.
    pub fn abandoned(&mut self) {
        self.is_refreshing = false;
    }
}

pub struct RefreshScheduler {
    reset: Arc<Notify>,
    handle: JoinHandle<()>,
}

impl RefreshScheduler {
    pub fn start(interval: Duration, tx: mpsc::UnboundedSender<AppEvent>) -> Self {
        let interval = interval.max(Duration::from_secs(1));
        let reset = Arc::new(Notify::new());
        let reset_rx = reset.clone();
        let handle = tokio::spawn(async move {
            loop {
                // A reset restarts the countdown without emitting a tick.
                tokio::select! {
                    () = time::sleep(interval) => {
                        if tx.send(AppEvent::RefreshTick).is_err() {
                            tracing::debug!("refresh scheduler: channel closed");
                            return;
                        }
                    }
                    () = reset_rx.notified() => {}
                }
            }
        });
        Self { reset, handle }
    }

    /// Restart the countdown, e.g. after a manual refresh.
    pub fn reset(&self) {
        self.reset.notify_one();
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
