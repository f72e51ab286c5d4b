use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use tokio::sync::Notify;

/// Cancels the sessions of one orchestrator from any thread. Cancellation is sticky.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    inner: Arc<CancelState>,
}

#[derive(Debug, Default)]
struct CancelState {
    cancelled: AtomicBool,
    notify: Notify,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::Release);
        self.inner.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
    }

    pub async fn cancelled(&self) {
        loop {
            let notified = self.inner.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}

/// Deadline plus cancellation flag, consulted by every unit before each probe.
#[derive(Debug)]
pub struct SessionGate {
    deadline: Instant,
    cancel: CancelHandle,
}

impl SessionGate {
    pub fn new(deadline: Instant, cancel: CancelHandle) -> Self {
        Self { deadline, cancel }
    }

    pub fn with_budget(budget: Duration) -> Self {
        Self::new(Instant::now() + budget, CancelHandle::new())
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// `true` while another probe may start.
    pub fn next(&self) -> bool {
        !self.cancel.is_cancelled() && Instant::now() < self.deadline
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Sleeps for `pause`, waking early at the deadline or on cancellation.
    pub async fn pause(&self, pause: Duration) {
        let until = (Instant::now() + pause).min(self.deadline);
        tokio::select! {
            _ = tokio::time::sleep_until(until.into()) => {}
            _ = self.cancel.cancelled() => {}
        }
    }
}
