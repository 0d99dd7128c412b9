use std::sync::Arc;

use futures_util::{FutureExt, StreamExt, stream::SelectAll};
use tokio::{
    select,
    sync::mpsc::{Receiver, error::TrySendError},
};
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;

use super::Subscriber;
use crate::{Action, Error, Payload, Reducer, Result, SourceId, StateGetter};

type Inbound<P> = Arc<Action<P>>;
pub(crate) type Listener<S> = Box<dyn FnMut(&S) + Send>;

/// The store's single consumer: reduces each inbound action, notifies
/// state listeners, then routes the action to subscribed effects.
pub(crate) struct ActionLoop<S, P> {
    reducer: Box<dyn Reducer<S, P>>,
    state: StateGetter<S>,
    listeners: Vec<Listener<S>>,
    senders: SelectAll<ReceiverStream<Inbound<P>>>,
    subscribers: Vec<Subscriber<P>>,
    cancel_token: Arc<CancellationToken>,
}

impl<S, P> ActionLoop<S, P>
where
    S: Clone + Send + Sync + 'static,
    P: Payload,
{
    pub(crate) fn new(
        reducer: Box<dyn Reducer<S, P>>,
        state: StateGetter<S>,
        cancel_token: Arc<CancellationToken>,
    ) -> Self {
        Self {
            reducer,
            state,
            listeners: Vec::new(),
            senders: SelectAll::new(),
            subscribers: Vec::new(),
            cancel_token,
        }
    }

    pub(crate) fn add_listener(&mut self, listener: Listener<S>) {
        self.listeners.push(listener);
    }

    pub(crate) fn add_subscriber(&mut self, subscriber: Subscriber<P>) -> Result<()> {
        if self.subscribers.contains(&subscriber) {
            return Err(Error::DuplicateEffectName(subscriber.source.clone()));
        }
        self.subscribers.push(subscriber);
        Ok(())
    }

    pub(crate) fn add_sender(&mut self, receiver: Receiver<Inbound<P>>) {
        self.senders.push(ReceiverStream::new(receiver));
    }

    fn process(&mut self, action: &Inbound<P>) {
        tracing::trace!(
            action_type = %action.action_type(),
            source = %action.meta().source_name(),
            action_id = %action.id(),
            "reducing action"
        );
        self.reduce(action);
        self.notify_listeners();
        self.route(action);
    }

    fn reduce(&mut self, action: &Action<P>) {
        let mut state = self.state.write();
        let current = state.clone();
        *state = self.reducer.reduce(current, action);
    }

    fn notify_listeners(&mut self) {
        if self.listeners.is_empty() {
            return;
        }
        // Listeners may read the store through a getter, so no lock is held here.
        let snapshot = self.state.get();
        for listener in self.listeners.iter_mut() {
            listener(&snapshot);
        }
    }

    fn route(&mut self, action: &Inbound<P>) {
        let mut to_be_closed: Option<Vec<SourceId>> = None;

        for subscriber in self
            .subscribers
            .iter()
            .filter(|s| s.subscription.accepts(action.action_type()))
            .filter(|s| !s.is_closed())
        {
            match subscriber.sender.try_send(action.clone()) {
                Ok(_) => {}
                Err(TrySendError::Full(_)) => {
                    tracing::error!(effect = %subscriber.source, action_id = %action.id(), "closing effect mailbox, it is full");
                    to_be_closed
                        .get_or_insert_with(Vec::new)
                        .push(subscriber.source.clone());
                }
                Err(TrySendError::Closed(_)) => {
                    tracing::warn!(effect = %subscriber.source, "effect mailbox closed, removing subscriber");
                    to_be_closed
                        .get_or_insert_with(Vec::new)
                        .push(subscriber.source.clone());
                }
            }
        }

        if let Some(to_be_closed) = to_be_closed {
            self.subscribers
                .retain(|s| !to_be_closed.contains(&s.source));
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        tracing::debug!(effects = self.subscribers.len(), "action loop started");
        loop {
            select! {
                biased;
                _ = self.cancel_token.cancelled() => break,
                maybe_action = self.senders.next() => {
                    match maybe_action {
                        Some(action) => self.process(&action),
                        // Every dispatcher is gone; nothing can arrive anymore.
                        None => {
                            self.cancel_token.cancelled().await;
                            break;
                        }
                    }
                },
            }
        }
        self.shutdown();
        tracing::debug!("action loop stopped");
        Ok(())
    }

    fn shutdown(&mut self) {
        // Best effort: reduce whatever is already buffered.
        while let Some(action) = self.senders.next().now_or_never().flatten() {
            self.process(&action);
        }
    }

    #[cfg(test)]
    pub(crate) fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}
