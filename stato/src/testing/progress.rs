use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::Notify;

/// Where a tester stands with respect to its declared expectations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Outcome {
    /// Expectations remain; the count is what is still outstanding.
    Pending(usize),
    Complete,
    /// At least one mismatch was recorded; the count is how many.
    Failed(usize),
}

/// Something a [`Done`](super::Done) future can wait on.
pub(crate) trait Progress: Send + Sync + 'static {
    fn name(&self) -> &'static str;
    fn outcome(&self) -> Outcome;
    fn notifier(&self) -> &Notify;
}

/// Tester state shared between the store task (which observes) and the
/// test task (which declares expectations and awaits completion).
pub(crate) struct Shared<T> {
    state: Mutex<T>,
    notify: Notify,
}

impl<T> Shared<T> {
    pub(crate) fn new(state: T) -> Self {
        Self {
            state: Mutex::new(state),
            notify: Notify::new(),
        }
    }

    /// Panics inside validators are caught before they can poison the lock,
    /// but a poisoned lock is still usable for reporting.
    pub(crate) fn lock(&self) -> MutexGuard<'_, T> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Wake every `done()` waiter so it re-checks the outcome.
    pub(crate) fn notify(&self) {
        self.notify.notify_waiters();
    }

    pub(crate) fn notifier(&self) -> &Notify {
        &self.notify
    }
}
