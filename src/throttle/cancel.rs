//! Cooperative cancellation for blocking rate waits.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use super::WaitError;

#[derive(Debug, Default)]
struct Signal {
    cancelled: Mutex<bool>,
    cond: Condvar,
}

/// A cloneable cancellation handle, optionally carrying a deadline.
///
/// Every clone observes the same signal: calling [`cancel`](Self::cancel) on
/// any of them wakes all threads sleeping in [`sleep`](Self::sleep).
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    signal: Option<Arc<Signal>>,
    deadline: Option<Instant>,
}

impl CancelToken {
    /// A token that fires only when [`cancel`](Self::cancel) is called.
    pub fn new() -> Self {
        Self {
            signal: Some(Arc::new(Signal::default())),
            deadline: None,
        }
    }

    /// A token that never fires. Used by decorators built without one.
    pub fn never() -> Self {
        Self::default()
    }

    /// A cancellable token that also expires at `deadline`.
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
            ..Self::new()
        }
    }

    /// A cancellable token that expires `timeout` from now. A timeout past
    /// what `Instant` can represent means no deadline at all.
    pub fn with_timeout(timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => Self::with_deadline(deadline),
            None => Self::new(),
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Fire the token. A no-op on [`never`](Self::never) tokens.
    pub fn cancel(&self) {
        if let Some(signal) = &self.signal {
            *signal.cancelled.lock() = true;
            signal.cond.notify_all();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.signal
            .as_ref()
            .map(|signal| *signal.cancelled.lock())
            .unwrap_or(false)
    }

    /// Fail if the token has fired or its deadline has passed.
    pub fn check(&self, requested: usize) -> Result<(), WaitError> {
        if self.is_cancelled() {
            return Err(WaitError::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => {
                Err(WaitError::DeadlineExceeded { requested })
            }
            _ => Ok(()),
        }
    }

    /// Time left before the deadline, if there is one.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// Block for `duration`, returning early with `Cancelled` if the token fires.
    pub fn sleep(&self, duration: Duration) -> Result<(), WaitError> {
        if duration.is_zero() {
            return Ok(());
        }
        let Some(signal) = &self.signal else {
            std::thread::sleep(duration);
            return Ok(());
        };

        let until = Instant::now().checked_add(duration);
        let mut cancelled = signal.cancelled.lock();
        while !*cancelled {
            match until {
                Some(until) => {
                    if signal.cond.wait_until(&mut cancelled, until).timed_out() {
                        return Ok(());
                    }
                }
                // Unrepresentable wake-up time: only a cancel ends the sleep.
                None => signal.cond.wait(&mut cancelled),
            }
        }
        Err(WaitError::Cancelled)
    }
}
