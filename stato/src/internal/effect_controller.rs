use std::sync::Arc;

use tokio::{
    select,
    sync::{broadcast, mpsc::Receiver},
};

use crate::{Action, Context, Effect, Result, internal::Command};

pub(crate) struct EffectController<F: Effect> {
    pub(crate) effect: F,
    pub(crate) receiver: Receiver<Arc<Action<F::Payload>>>,
    pub(crate) ctx: Context<F::Payload>,
    pub(crate) max_actions_per_tick: usize,
    pub(crate) command_rx: broadcast::Receiver<Command>,
}

impl<F: Effect> EffectController<F> {
    pub async fn run(&mut self) -> Result<()> {
        self.effect.on_start().await?;
        loop {
            select! {
                biased;

                Ok(cmd) = self.command_rx.recv() => match cmd {
                    Command::StopEffect(ref id) if id == self.ctx.source_id() => break,
                    Command::StopRuntime => break,
                    _ => {}
                },

                maybe_action = self.receiver.recv() => {
                    let Some(action) = maybe_action else {
                        break;
                    };

                    let res = self.effect.handle_action(&action).await;
                    self.handle_error(res)?;

                    let mut cnt = 1;
                    while cnt < self.max_actions_per_tick {
                        let Ok(action) = self.receiver.try_recv() else {
                            break;
                        };
                        let res = self.effect.handle_action(&action).await;
                        self.handle_error(res)?;
                        cnt += 1;
                    }
                }
            }
        }

        tracing::debug!(effect = %self.ctx.source_id(), "effect stopped");
        self.effect.on_shutdown().await
    }

    #[inline]
    fn handle_error<R>(&self, result: Result<R>) -> Result<()> {
        if let Err(e) = result {
            tracing::error!(effect = %self.ctx.source_id(), error = %e, "effect failed to handle action");
            self.effect.on_error(e)?;
        }
        Ok(())
    }
}
