use std::{fmt, sync::Arc};

use tokio::sync::mpsc::Sender;

use crate::{
    Action, ActionId, Payload, Result, SourceId,
    internal::{Command, CommandSender},
};

/// Store-provided handle for an effect to interact with the store.
///
/// Use it to:
/// - `dispatch(action)`: emit an action tagged with this effect's source id
/// - `succeed(&action, payload)`: emit a `SUCCESS` follow-up linked to `action`
/// - `fail(&action, payload)`: emit an `ERROR` follow-up linked to `action`
/// - `stop()`: request shutdown of this effect
///
/// See also: [`Effect`](crate::Effect), [`Store`](crate::Store).
#[derive(Clone)]
pub struct Context<P> {
    source: SourceId,
    sender: Sender<Arc<Action<P>>>,
    cmd_sender: CommandSender,
}

impl<P: Payload> Context<P> {
    pub(crate) fn new(
        source: SourceId,
        sender: Sender<Arc<Action<P>>>,
        cmd_sender: CommandSender,
    ) -> Self {
        Self {
            source,
            sender,
            cmd_sender,
        }
    }

    /// Dispatch an action into the store, tagged with this effect's source id.
    /// Awaits channel capacity (backpressure) to avoid silent drops.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MailboxClosed`](crate::Error::MailboxClosed) if the
    /// store has shut down.
    pub async fn dispatch(&self, action: impl Into<Action<P>>) -> Result<ActionId> {
        let action = action.into().with_source(self.source.clone());
        let id = action.id();
        self.sender.send(Arc::new(action)).await?;
        Ok(id)
    }

    /// Dispatch a [`SUCCESS`](crate::ActionType::SUCCESS) follow-up of `related`.
    pub async fn succeed(&self, related: &Action<P>, payload: Option<P>) -> Result<ActionId> {
        self.dispatch(Action::success(related, payload)).await
    }

    /// Dispatch an [`ERROR`](crate::ActionType::ERROR) follow-up of `related`.
    pub async fn fail(&self, related: &Action<P>, payload: P) -> Result<ActionId> {
        self.dispatch(Action::error(related, payload)).await
    }

    /// Signal this effect to stop after the action it is handling.
    pub fn stop(&self) -> Result<()> {
        self.cmd_sender.send(Command::StopEffect(self.source.clone()))
    }

    #[inline]
    pub fn source_id(&self) -> &SourceId {
        &self.source
    }

    /// The effect's name as registered with the store.
    #[inline]
    pub fn name(&self) -> &str {
        self.source.as_str()
    }

    /// Whether this effect's channel into the store has no remaining capacity.
    ///
    /// Each effect has its own channel into the action loop, so this reflects
    /// only this effect's backlog.
    #[inline]
    pub fn is_sender_full(&self) -> bool {
        self.sender.capacity() == 0
    }
}

impl<P> fmt::Debug for Context<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("source", &self.source)
            .field("sender", &self.sender)
            .finish_non_exhaustive()
    }
}
