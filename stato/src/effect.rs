use core::marker::Send;
use std::future::Future;

use crate::{Action, Error, Payload, Result};

/// Asynchronous side-effect handler reacting to dispatched actions.
///
/// Effects run in their own task and see every action their
/// [`Subscribe`](crate::Subscribe) selection accepts, after the reducer has
/// processed it. They typically perform I/O and report back by dispatching a
/// follow-up through their [`Context`](crate::Context):
///
/// ```ignore
/// struct Auth {
///     ctx: Context<AuthPayload>,
/// }
///
/// impl Effect for Auth {
///     type Payload = AuthPayload;
///
///     async fn handle_action(&mut self, action: &Action<AuthPayload>) -> Result {
///         match check(action.payload()).await {
///             Ok(session) => self.ctx.succeed(action, Some(session)).await?,
///             Err(reason) => self.ctx.fail(action, reason).await?,
///         };
///         Ok(())
///     }
/// }
/// ```
///
/// # Lifecycle Hooks
///
/// - [`on_start`](Self::on_start)  - Called once before the first action
/// - [`on_shutdown`](Self::on_shutdown)  - Called once after the effect stops
/// - [`on_error`](Self::on_error)  - Handle errors (swallow or propagate)
///
/// Methods return futures but can be implemented as `async fn` directly.
/// No `#[async_trait]` macro is required.
pub trait Effect: Send + 'static {
    type Payload: Payload;

    /// Handle a single dispatched action.
    ///
    /// Return `Ok(())` when processing succeeds, or an error to signal
    /// failure; errors go through [`on_error`](Self::on_error).
    fn handle_action(
        &mut self,
        action: &Action<Self::Payload>,
    ) -> impl Future<Output = Result<()>> + Send {
        let _ = action;
        async { Ok(()) }
    }

    /// Lifecycle hook called once before the effect receives actions.
    fn on_start(&mut self) -> impl Future<Output = Result<()>> + Send {
        async { Ok(()) }
    }

    /// Lifecycle hook called once after the effect stops.
    fn on_shutdown(&mut self) -> impl Future<Output = Result<()>> + Send {
        async { Ok(()) }
    }

    /// Called when [`handle_action`](Self::handle_action) returns an error.
    ///
    /// Return `Ok(())` to swallow the error and keep handling actions,
    /// or `Err(error)` to propagate and stop the effect. By default all
    /// errors propagate.
    ///
    /// # Example
    ///
    /// ```rust
    /// use stato::{Effect, Error, Result};
    /// # struct Audit;
    /// # impl Effect for Audit {
    /// #     type Payload = ();
    /// fn on_error(&self, error: Error) -> Result<()> {
    ///     eprintln!("audit failed: {}", error);
    ///     Ok(())
    /// }
    /// # }
    /// ```
    fn on_error(&self, error: Error) -> Result<()> {
        Err(error)
    }
}
