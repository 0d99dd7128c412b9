use std::{
    fmt,
    future::{Future, IntoFuture},
    pin::Pin,
    sync::Arc,
    time::Duration,
};

use tokio_util::sync::CancellationToken;

use crate::{Error, Result};

use super::progress::{Outcome, Progress};

/// Default timeout for `done()` futures.
pub const DEFAULT_DONE_TIMEOUT: Duration = Duration::from_secs(1);

/// Completion future of a tester.
///
/// Created by [`ActionTester::done`](super::ActionTester::done) or
/// [`StateTester::done`](super::StateTester::done). Resolves `Ok(())` once
/// every declared expectation has been consumed with no mismatch. Resolves
/// with [`Error::ExpectationsFailed`] as soon as any mismatch is recorded,
/// even when expectations remain. If neither happens within the timeout,
/// resolves with [`Error::DoneTimeout`].
///
/// A single tester may hand out several `Done` futures; all of them observe
/// the same outcome.
///
/// # Example
///
/// ```ignore
/// tester.done().await?;
///
/// tester.done()
///     .within(Duration::from_millis(200))
///     .cancel_on(shutdown.clone())
///     .await?;
/// ```
#[must_use = "a Done future does nothing unless awaited"]
pub struct Done {
    progress: Arc<dyn Progress>,
    timeout: Duration,
    cancel: Option<CancellationToken>,
}

impl Done {
    pub(crate) fn new(progress: Arc<dyn Progress>) -> Self {
        Self {
            progress,
            timeout: DEFAULT_DONE_TIMEOUT,
            cancel: None,
        }
    }

    /// Override the default 1-second timeout.
    pub fn within(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Stop waiting with [`Error::DoneCancelled`] once `token` is cancelled.
    pub fn cancel_on(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    fn settled(&self) -> Option<Result> {
        match self.progress.outcome() {
            Outcome::Complete => Some(Ok(())),
            Outcome::Failed(count) => Some(Err(Error::ExpectationsFailed(self.progress.name(), count))),
            Outcome::Pending(_) => None,
        }
    }

    async fn run(self) -> Result {
        let deadline = tokio::time::Instant::now() + self.timeout;
        let cancel = self.cancel.clone().unwrap_or_default();

        loop {
            // Register interest before checking, so a notification landing
            // between the check and the await is not lost.
            let notified = self.progress.notifier().notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if let Some(result) = self.settled() {
                return result;
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    return Err(Error::DoneCancelled(self.progress.name()));
                }
                _ = &mut notified => {}
                _ = tokio::time::sleep_until(deadline) => {
                    return match self.progress.outcome() {
                        Outcome::Pending(outstanding) => Err(Error::DoneTimeout(
                            self.progress.name(),
                            self.timeout,
                            outstanding,
                        )),
                        _ => self.settled().unwrap_or(Ok(())),
                    };
                }
            }
        }
    }
}

impl IntoFuture for Done {
    type Output = Result;
    type IntoFuture = Pin<Box<dyn Future<Output = Result> + Send>>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(self.run())
    }
}

impl fmt::Debug for Done {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Done")
            .field("tester", &self.progress.name())
            .field("timeout", &self.timeout)
            .field("cancellable", &self.cancel.is_some())
            .finish()
    }
}
