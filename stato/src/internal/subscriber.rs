use std::sync::Arc;

use tokio::sync::mpsc::Sender;

use super::Subscription;
use crate::{Action, SourceId};

/// An effect's mailbox as seen from the action loop.
#[derive(Debug)]
pub(crate) struct Subscriber<P> {
    pub(crate) source: SourceId,
    pub(crate) subscription: Subscription,
    pub(crate) sender: Sender<Arc<Action<P>>>,
}

impl<P> Subscriber<P> {
    pub(crate) fn new(
        source: SourceId,
        subscription: Subscription,
        sender: Sender<Arc<Action<P>>>,
    ) -> Self {
        Self {
            source,
            subscription,
            sender,
        }
    }

    #[inline]
    pub(crate) fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

impl<P> PartialEq for Subscriber<P> {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}
