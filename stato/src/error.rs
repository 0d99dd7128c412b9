use std::sync::Arc;

use tokio::sync::mpsc::error::{SendError, TrySendError};

use crate::{Action, SourceId};

/// The single error type for all stato operations.
///
/// Every fallible stato API returns `stato::Result<T>` (alias for
/// `Result<T, stato::Error>`). Errors from lower layers (Tokio channels,
/// task joins) are mapped into variants of this enum so callers only
/// need to handle one error type.
///
/// Tester mismatches are not errors of this kind: they are recorded as
/// [`Mismatch`](crate::testing::Mismatch) values inside the tester and
/// surface here only through `done()`.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    #[error("Mailbox closed")]
    MailboxClosed,

    #[error("Store has already started.")]
    StoreAlreadyStarted,

    #[error("The mailbox is full")]
    MailboxFull,

    #[error("Effect '{0}' already exists.")]
    DuplicateEffectName(SourceId),

    #[error("External error: {0}")]
    External(#[source] Arc<dyn std::error::Error + Send + Sync>),

    #[error("Internal stato error {0}")]
    Internal(#[source] Arc<dyn std::error::Error + Send + Sync>),

    #[cfg(feature = "test-harness")]
    #[error("{0} expectations failed with {1} mismatch(es), see logged errors")]
    ExpectationsFailed(&'static str, usize),

    #[cfg(feature = "test-harness")]
    #[error("{0} expectations not met within {1:?}: {2} outstanding")]
    DoneTimeout(&'static str, std::time::Duration, usize),

    #[cfg(feature = "test-harness")]
    #[error("waiting on {0} expectations was cancelled")]
    DoneCancelled(&'static str),
}

impl Error {
    pub fn external(e: impl std::error::Error + Send + Sync + 'static) -> Self {
        Error::External(Arc::new(e))
    }

    pub(crate) fn internal(e: impl std::error::Error + Send + Sync + 'static) -> Self {
        Error::Internal(Arc::new(e))
    }
}

impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::MailboxClosed, Self::MailboxClosed) => true,
            (Self::MailboxFull, Self::MailboxFull) => true,
            (Self::StoreAlreadyStarted, Self::StoreAlreadyStarted) => true,
            (Self::DuplicateEffectName(a), Self::DuplicateEffectName(b)) => a == b,
            (Self::External(a), Self::External(b)) => Arc::ptr_eq(a, b),
            (Self::Internal(a), Self::Internal(b)) => Arc::ptr_eq(a, b),
            #[cfg(feature = "test-harness")]
            (Self::ExpectationsFailed(a1, a2), Self::ExpectationsFailed(b1, b2)) => {
                a1 == b1 && a2 == b2
            }
            #[cfg(feature = "test-harness")]
            (Self::DoneTimeout(a1, a2, a3), Self::DoneTimeout(b1, b2, b3)) => {
                a1 == b1 && a2 == b2 && a3 == b3
            }
            #[cfg(feature = "test-harness")]
            (Self::DoneCancelled(a), Self::DoneCancelled(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Error {}

impl<P> From<SendError<Arc<Action<P>>>> for Error {
    fn from(_e: SendError<Arc<Action<P>>>) -> Self {
        Error::MailboxClosed
    }
}

impl<P> From<TrySendError<Arc<Action<P>>>> for Error {
    fn from(e: TrySendError<Arc<Action<P>>>) -> Self {
        match e {
            TrySendError::Full(_) => Error::MailboxFull,
            TrySendError::Closed(_) => Error::MailboxClosed,
        }
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(e: tokio::task::JoinError) -> Self {
        Error::internal(e)
    }
}
