use std::sync::Arc;

use tokio::{
    sync::{
        Mutex, Notify, broadcast,
        mpsc::{self, Sender, channel},
    },
    task::JoinSet,
};
use tokio_util::sync::CancellationToken;

use crate::{
    Action, ActionId, Config, Context, Effect, Error, Payload, Reducer, Result, SourceId,
    StateGetter, Subscribe,
    internal::{ActionLoop, Command, CommandSender, EffectController, Subscriber},
};

/// Owns the application state, its reducer, state listeners and effects.
///
/// A `Store` is the unidirectional pipeline: every dispatched action is
/// reduced into the next state, then every state listener is notified, then
/// the action is routed to each effect subscribed to its type. Effects may
/// dispatch further actions, which re-enter the same pipeline.
///
/// # Registration
///
/// ```ignore
/// let mut store = Store::new(Config::default(), Session::default(), session_reducer);
///
/// // Effect reacting to specific action types
/// store.add_effect("auth", |ctx| Auth { ctx }, &["LOGIN"])?;
///
/// // State listener
/// store.subscribe(|state: &Session| println!("{state:?}"))?;
/// ```
///
/// # Runtime Control
///
/// - [`start()`](Self::start) spawns the action loop and effect tasks and returns immediately.
/// - [`dispatch(action)`](Self::dispatch) sends an action into the loop.
/// - [`state()`](Self::state) / [`getter()`](Self::getter) read the current state.
/// - [`stop()`](Self::stop) graceful shutdown, consumes the store.
///
/// Registration must happen before `start()`.
pub struct Store<S, P: Payload> {
    config: Arc<Config>,
    action_loop: Arc<Mutex<ActionLoop<S, P>>>,
    sender: Sender<Arc<Action<P>>>,
    state: StateGetter<S>,
    tasks: JoinSet<Result<()>>,
    start_notifier: Arc<Notify>,
    cancel_token: Arc<CancellationToken>,
    cmd_sender: CommandSender,
    effects: Vec<SourceId>,
    started: bool,
}

impl<S, P> Store<S, P>
where
    S: Clone + Send + Sync + 'static,
    P: Payload,
{
    /// Create a store with the given configuration, initial state and reducer.
    pub fn new<R>(config: Config, initial_state: S, reducer: R) -> Self
    where
        R: Reducer<S, P>,
    {
        let config = Arc::new(config);
        let (tx, rx) = channel::<Arc<Action<P>>>(config.store_channel_capacity());
        let state = StateGetter::new(initial_state);
        let cancel_token = Arc::new(CancellationToken::new());
        let (cmd_sender, _) = broadcast::channel(32);

        let mut action_loop = ActionLoop::new(Box::new(reducer), state.clone(), cancel_token.clone());
        action_loop.add_sender(rx);

        Self {
            config,
            action_loop: Arc::new(Mutex::new(action_loop)),
            sender: tx,
            state,
            tasks: JoinSet::new(),
            start_notifier: Arc::new(Notify::new()),
            cancel_token,
            cmd_sender: cmd_sender.into(),
            effects: Vec::new(),
            started: false,
        }
    }

    /// Register a state listener, called with the new state after every
    /// reduced action.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StoreAlreadyStarted`] if called after [`start()`](Self::start).
    pub fn subscribe<L>(&mut self, listener: L) -> Result<()>
    where
        L: FnMut(&S) + Send + 'static,
    {
        let mut action_loop = self.registration_lock()?;
        action_loop.add_listener(Box::new(listener));
        Ok(())
    }

    /// Register an effect with a factory that receives a [`Context<P>`].
    ///
    /// # Arguments
    ///
    /// * `name` - Effect identifier, used as the source of its dispatched actions
    /// * `factory` - Closure that receives a Context and returns the effect
    /// * `types` - Action types the effect receives
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateEffectName`] if an effect with the same name
    /// is already registered. Returns [`Error::StoreAlreadyStarted`] if
    /// called after [`start()`](Self::start).
    ///
    /// # Example
    ///
    /// ```ignore
    /// store.add_effect("auth", |ctx| Auth::new(ctx), &["LOGIN", "LOGOUT"])?;
    /// ```
    pub fn add_effect<F, Fac, Sub>(&mut self, name: &str, factory: Fac, types: Sub) -> Result<SourceId>
    where
        F: Effect<Payload = P>,
        Fac: FnOnce(Context<P>) -> F,
        Sub: Into<Subscribe<P>>,
    {
        let source = SourceId::new(name);
        if self.effects.contains(&source) || source == SourceId::STORE {
            return Err(Error::DuplicateEffectName(source));
        }

        let (inbound_tx, inbound_rx) =
            mpsc::channel::<Arc<Action<P>>>(self.config.store_channel_capacity());
        let (mailbox_tx, mailbox_rx) =
            mpsc::channel::<Arc<Action<P>>>(self.config.default_effect_channel_capacity());

        let subscriber = Subscriber::new(source.clone(), types.into().0, mailbox_tx);
        {
            let mut action_loop = self.registration_lock()?;
            action_loop.add_subscriber(subscriber)?;
            action_loop.add_sender(inbound_rx);
        }

        let ctx = Context::new(source.clone(), inbound_tx, self.cmd_sender.clone());
        let effect = factory(ctx.clone());

        let mut controller = EffectController {
            effect,
            receiver: mailbox_rx,
            ctx,
            max_actions_per_tick: self.config.max_actions_per_tick(),
            command_rx: self.cmd_sender.subscribe(),
        };

        let notified = self.start_notifier.clone().notified_owned();
        self.tasks.spawn(async move {
            notified.await;
            controller.run().await
        });

        self.effects.push(source.clone());
        tracing::debug!(effect = %source, "effect registered");
        Ok(source)
    }

    fn registration_lock(&self) -> Result<tokio::sync::MutexGuard<'_, ActionLoop<S, P>>> {
        if self.started {
            return Err(Error::StoreAlreadyStarted);
        }
        self.action_loop
            .try_lock()
            .map_err(|_| Error::StoreAlreadyStarted)
    }

    /// Start the action loop in a background task. This returns immediately.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StoreAlreadyStarted`] when called twice.
    pub async fn start(&mut self) -> Result<()> {
        if self.started {
            return Err(Error::StoreAlreadyStarted);
        }
        self.started = true;
        let action_loop = self.action_loop.clone();
        self.tasks
            .spawn(async move { action_loop.lock().await.run().await });
        self.start_notifier.notify_waiters();
        tracing::debug!(effects = self.effects.len(), "store started");
        Ok(())
    }

    /// Dispatch an action into the store.
    ///
    /// Accepts a pre-built [`Action`] or anything convertible into one (an
    /// [`ActionType`](crate::ActionType) or a `&'static str` type tag). The
    /// action is tagged with the store's source id. Returns the action id.
    ///
    /// Actions dispatched before [`start()`](Self::start) are buffered.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MailboxClosed`] if the action loop has shut down.
    pub async fn dispatch(&self, action: impl Into<Action<P>>) -> Result<ActionId> {
        let action = action.into().with_source(SourceId::store());
        let id = action.id();
        self.sender.send(Arc::new(action)).await?;
        Ok(id)
    }

    /// Returns a snapshot of the current state.
    pub fn state(&self) -> S {
        self.state.get()
    }

    /// Returns a cloneable accessor to the current state.
    pub fn getter(&self) -> StateGetter<S> {
        self.state.clone()
    }

    /// Returns the store's configuration.
    pub fn config(&self) -> &Config {
        self.config.as_ref()
    }

    /// Request a graceful shutdown, then await all tasks.
    ///
    /// # Shutdown Process
    ///
    /// 1. Waits for the store's inbound channel to drain (up to 10 ms)
    /// 2. Cancels the action loop, which reduces whatever is still buffered
    /// 3. Sends `StopRuntime` to effects and waits for their tasks to complete
    ///
    /// # Errors
    ///
    /// Returns [`Error::Internal`] if a task panicked, or the first error an
    /// effect propagated.
    pub async fn stop(mut self) -> Result<()> {
        use tokio::time::*;
        let start = Instant::now();
        let timeout = Duration::from_millis(10);
        let max = self.sender.max_capacity();

        while start.elapsed() < timeout {
            if self.sender.capacity() == max {
                break;
            }
            sleep(Duration::from_micros(100)).await;
        }

        self.cancel_token.cancel();
        if self.started {
            let _ = self.action_loop.lock().await;
        }

        if self.cmd_sender.receiver_count() > 0 {
            self.cmd_sender.send(Command::StopRuntime)?;
        }
        // Unblocks effect tasks still waiting for a start that never happened.
        self.start_notifier.notify_waiters();

        while let Some(res) = self.tasks.join_next().await {
            res??;
        }
        tracing::debug!("store stopped");
        Ok(())
    }
}

impl<S, P: Payload> Drop for Store<S, P> {
    fn drop(&mut self) {
        self.cancel_token.cancel();
        if self.cmd_sender.receiver_count() > 0 {
            let _ = self.cmd_sender.send(Command::StopRuntime);
        }
    }
}

impl<S, P: Payload> std::fmt::Debug for Store<S, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("effects", &self.effects)
            .field("started", &self.started)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ActionType;
    use std::time::Duration;

    #[derive(Clone, Debug, PartialEq)]
    enum Msg {
        Amount(u32),
        Reason(String),
    }

    fn ledger(total: u32, action: &Action<Msg>) -> u32 {
        match (action.action_type().as_str(), action.payload()) {
            ("DEPOSIT", Some(Msg::Amount(n))) => total + n,
            _ => total,
        }
    }

    /// Confirms every deposit, rejects zero amounts.
    struct Bank {
        ctx: Context<Msg>,
    }

    impl Effect for Bank {
        type Payload = Msg;

        async fn handle_action(&mut self, action: &Action<Msg>) -> Result {
            match action.payload() {
                Some(Msg::Amount(0)) => {
                    self.ctx.fail(action, Msg::Reason("empty".into())).await?;
                }
                _ => {
                    self.ctx.succeed(action, None).await?;
                }
            }
            Ok(())
        }
    }

    struct Idle;
    impl Effect for Idle {
        type Payload = Msg;
    }

    async fn wait_for(getter: &StateGetter<Vec<ActionType>>, len: usize) {
        for _ in 0..100 {
            if getter.with(|s| s.len()) >= len {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    #[tokio::test]
    async fn dispatch_reduces_state() {
        let mut store = Store::new(Config::default(), 0_u32, ledger);
        store.start().await.unwrap();
        store.dispatch(Action::new("DEPOSIT").with_payload(Msg::Amount(3))).await.unwrap();
        store.dispatch(Action::new("DEPOSIT").with_payload(Msg::Amount(4))).await.unwrap();
        store.dispatch("AUDIT").await.unwrap();

        let getter = store.getter();
        for _ in 0..100 {
            if getter.get() == 7 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(store.state(), 7);
        store.stop().await.unwrap();
    }

    #[tokio::test]
    async fn effects_dispatch_linked_follow_ups() {
        let log = |mut seen: Vec<ActionType>, action: &Action<Msg>| {
            seen.push(action.action_type().clone());
            seen
        };
        let mut store = Store::new(Config::default(), Vec::new(), log);
        store.add_effect("bank", |ctx| Bank { ctx }, &["DEPOSIT"]).unwrap();
        store.start().await.unwrap();

        store.dispatch(Action::new("DEPOSIT").with_payload(Msg::Amount(5))).await.unwrap();
        wait_for(&store.getter(), 2).await;
        store.dispatch(Action::new("DEPOSIT").with_payload(Msg::Amount(0))).await.unwrap();
        wait_for(&store.getter(), 4).await;

        assert_eq!(
            store.state(),
            vec![
                ActionType::from("DEPOSIT"),
                ActionType::SUCCESS,
                ActionType::from("DEPOSIT"),
                ActionType::ERROR,
            ]
        );
        store.stop().await.unwrap();
    }

    #[tokio::test]
    async fn zero_channel_capacities_still_run() {
        let log = |mut seen: Vec<ActionType>, action: &Action<Msg>| {
            seen.push(action.action_type().clone());
            seen
        };
        let config = Config::default()
            .with_store_channel_capacity(0)
            .with_default_effect_channel_capacity(0);
        let mut store = Store::new(config, Vec::new(), log);
        store.add_effect("bank", |ctx| Bank { ctx }, &["DEPOSIT"]).unwrap();
        store.start().await.unwrap();

        store.dispatch(Action::new("DEPOSIT").with_payload(Msg::Amount(3))).await.unwrap();
        store.dispatch(Action::new("DEPOSIT").with_payload(Msg::Amount(4))).await.unwrap();
        wait_for(&store.getter(), 4).await;

        assert_eq!(store.state().len(), 4);
        store.stop().await.unwrap();
    }

    #[tokio::test]
    async fn listeners_see_every_reduced_state() {
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = seen.clone();
        let mut store = Store::new(Config::default(), 0_u32, ledger);
        store.subscribe(move |total: &u32| sink.lock().unwrap().push(*total)).unwrap();
        store.start().await.unwrap();

        store.dispatch(Action::new("DEPOSIT").with_payload(Msg::Amount(2))).await.unwrap();
        store.dispatch("NOOP").await.unwrap();
        store.stop().await.unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![2, 2]);
    }

    #[tokio::test]
    async fn registration_rules() {
        let mut store = Store::new(Config::default(), 0_u32, ledger);
        store.add_effect("idle", |_| Idle, Subscribe::none()).unwrap();
        assert_eq!(
            store.add_effect("idle", |_| Idle, Subscribe::all()),
            Err(Error::DuplicateEffectName(SourceId::new("idle")))
        );
        assert!(store.add_effect(SourceId::STORE, |_| Idle, Subscribe::all()).is_err());

        store.start().await.unwrap();
        assert_eq!(store.start().await, Err(Error::StoreAlreadyStarted));
        assert_eq!(
            store.add_effect("late", |_| Idle, Subscribe::all()),
            Err(Error::StoreAlreadyStarted)
        );
        assert_eq!(store.subscribe(|_: &u32| {}), Err(Error::StoreAlreadyStarted));
        store.stop().await.unwrap();
    }

    #[tokio::test]
    async fn stop_without_start_completes() {
        let mut store = Store::new(Config::default(), 0_u32, ledger);
        store.add_effect("idle", |_| Idle, Subscribe::all()).unwrap();
        store.stop().await.unwrap();
    }
}
