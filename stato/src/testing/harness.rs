use std::{fmt, time::Duration};

use crate::{
    Action, ActionId, Config, Context, Effect, Payload, Reducer, Result, SourceId, StateGetter,
    StatusState, Store, Subscribe,
};

use super::{ActionTester, StateTester};

/// A store wired to an [`ActionTester`] and a [`StateTester`].
///
/// The store's reducer is the action tester (optionally layered over an
/// application reducer); the state tester listens to the store from
/// [`start`](Self::start) on, checking state changes once at least one state
/// expectation has been declared. Effects are registered as on a plain
/// [`Store`].
///
/// # Example
///
/// ```ignore
/// let mut test = Harness::with_reducer(Session::default(), session_reducer)?;
/// test.add_effect("auth", |ctx| Auth { ctx }, &["LOGIN"])?;
///
/// test.actions().expect("LOGIN").then_on_success();
/// test.states().expect_state_after_action("LOGIN", Some(ActionResult::Ok));
///
/// test.start().await?;
/// test.dispatch(Action::new("LOGIN")).await?;
/// test.settle().await?;
/// test.stop().await?;
/// ```
pub struct Harness<S, P: Payload> {
    store: Store<S, P>,
    actions: ActionTester<S, P>,
    states: StateTester<S>,
}

impl<S, P> Harness<S, P>
where
    S: Clone + PartialEq + fmt::Debug + StatusState + Send + Sync + 'static,
    P: Payload,
{
    /// A harness whose reducer leaves the state to expectation validators.
    pub fn new(initial_state: S) -> Self {
        Self::with_config(Config::default(), initial_state, |state: S, _: &Action<P>| state)
    }

    /// A harness running `reducer` before the action tester sees each action.
    pub fn with_reducer<R: Reducer<S, P>>(initial_state: S, reducer: R) -> Self {
        Self::with_config(Config::default(), initial_state, reducer)
    }

    pub fn with_config<R: Reducer<S, P>>(config: Config, initial_state: S, reducer: R) -> Self {
        let actions = ActionTester::new();
        let states = StateTester::new();
        let store = Store::new(config, initial_state, actions.layer(reducer));
        Self {
            store,
            actions,
            states,
        }
    }

    pub fn actions(&self) -> &ActionTester<S, P> {
        &self.actions
    }

    pub fn states(&self) -> &StateTester<S> {
        &self.states
    }

    /// See [`Store::add_effect`].
    pub fn add_effect<F, Fac, Sub>(&mut self, name: &str, factory: Fac, types: Sub) -> Result<SourceId>
    where
        F: Effect<Payload = P>,
        Fac: FnOnce(Context<P>) -> F,
        Sub: Into<Subscribe<P>>,
    {
        self.store.add_effect(name, factory, types)
    }

    /// See [`Store::subscribe`].
    pub fn subscribe<L>(&mut self, listener: L) -> Result<()>
    where
        L: FnMut(&S) + Send + 'static,
    {
        self.store.subscribe(listener)
    }

    /// Install the state tester and start the store.
    ///
    /// State changes are fed to the state tester from its first declared
    /// expectation on; earlier changes are not checked.
    pub async fn start(&mut self) -> Result<()> {
        let states = self.states.clone();
        self.store.subscribe(move |state: &S| {
            if states.declared() > 0 {
                states.observe(state);
            }
        })?;
        self.store.start().await
    }

    pub async fn dispatch(&self, action: impl Into<Action<P>>) -> Result<ActionId> {
        self.store.dispatch(action).await
    }

    pub fn state(&self) -> S {
        self.store.state()
    }

    pub fn getter(&self) -> StateGetter<S> {
        self.store.getter()
    }

    /// Wait for both testers with the default timeout.
    pub async fn settle(&self) -> Result<()> {
        self.actions.done().await?;
        self.states.done().await
    }

    /// Wait for both testers, giving each up to `timeout`.
    pub async fn settle_within(&self, timeout: Duration) -> Result<()> {
        self.actions.done().within(timeout).await?;
        self.states.done().within(timeout).await
    }

    /// Stop the underlying store. See [`Store::stop`].
    pub async fn stop(self) -> Result<()> {
        self.store.stop().await
    }
}

impl<S, P: Payload> fmt::Debug for Harness<S, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Harness")
            .field("store", &self.store)
            .field("actions", &self.actions)
            .field("states", &self.states)
            .finish()
    }
}
