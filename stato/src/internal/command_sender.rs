use tokio::sync::broadcast;

use super::Command;
use crate::{Error, Result};

#[repr(transparent)]
#[derive(Clone, Debug)]
pub struct CommandSender(broadcast::Sender<Command>);

impl CommandSender {
    pub fn send(&self, cmd: Command) -> Result {
        self.0.send(cmd).map_err(Error::internal)?;
        Ok(())
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Command> {
        self.0.subscribe()
    }

    pub fn receiver_count(&self) -> usize {
        self.0.receiver_count()
    }
}

impl From<broadcast::Sender<Command>> for CommandSender {
    fn from(sender: broadcast::Sender<Command>) -> Self {
        CommandSender(sender)
    }
}
