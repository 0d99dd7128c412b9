use std::{fmt, sync::Arc};

use tracing::{debug, error, trace};

use crate::{Action, ActionCategory, ActionType, Payload, Reducer};

use super::{
    Done, Mismatch,
    expectation_tree::{ExpectationNode, ExpectationTree, NodeId, PayloadCheck},
    progress::{Outcome, Progress, Shared},
    validator::guarded,
};

/// Running totals of observed actions.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ActionCounters {
    /// Every action passed to the tester, matched or not.
    pub total: u64,
    /// Matched generic actions.
    pub generic: u64,
    /// Matched `SUCCESS` actions.
    pub success: u64,
    /// Matched `ERROR` actions.
    pub error: u64,
}

impl ActionCounters {
    fn bump(&mut self, category: ActionCategory) -> u64 {
        let counter = match category {
            ActionCategory::Generic => &mut self.generic,
            ActionCategory::Success => &mut self.success,
            ActionCategory::Error => &mut self.error,
        };
        *counter += 1;
        *counter
    }
}

pub(crate) struct ActionLedger<S, P> {
    tree: ExpectationTree<S, P>,
    counters: ActionCounters,
    failures: Vec<Mismatch>,
}

impl<S, P: Payload> ActionLedger<S, P> {
    fn record(&mut self, mismatch: Mismatch, action: &Action<P>) {
        error!(
            action_type = %action.action_type(),
            action_id = %action.id(),
            payload = ?action.payload(),
            outstanding = ?self.tree.outstanding(),
            error = %mismatch,
            "action test failed"
        );
        self.failures.push(mismatch);
    }

    fn check_structure(&self, id: NodeId, action: &Action<P>) -> Result<(), Mismatch> {
        let expected = self.tree.node(id);
        if expected.action_type != *action.action_type() {
            return Err(Mismatch::ActionType {
                expected: expected.action_type.clone(),
                observed: action.action_type().clone(),
            });
        }
        if expected.validator.is_none() && !expected.payload.accepts(action.payload()) {
            return Err(Mismatch::Payload {
                action_type: action.action_type().clone(),
                expected: format!("{:?}", expected.payload),
                observed: format!("{:?}", action.payload()),
            });
        }
        follow_up_shape(action)
    }
}

/// Success and error actions must link back to the action they follow up;
/// errors must also say what went wrong.
fn follow_up_shape<P>(action: &Action<P>) -> Result<(), Mismatch> {
    match action.category() {
        ActionCategory::Generic => Ok(()),
        ActionCategory::Success if action.related().is_none() => Err(Mismatch::MissingRelatedAction {
            action_type: ActionType::SUCCESS,
        }),
        ActionCategory::Success => Ok(()),
        ActionCategory::Error if action.payload().is_none() => Err(Mismatch::MissingErrorPayload),
        ActionCategory::Error if action.related().is_none() => Err(Mismatch::MissingRelatedAction {
            action_type: ActionType::ERROR,
        }),
        ActionCategory::Error => Ok(()),
    }
}

/// Expectation tree over the actions a store processes.
///
/// Declare the actions you expect with [`expect`](Self::expect), chaining
/// follow-ups (`SUCCESS`, `ERROR` or generic) onto each handle. Install the
/// tester as the store's reducer via [`reducer`](Self::reducer) or wrap an
/// application reducer with [`layer`](Self::layer), then await
/// [`done`](Self::done).
///
/// Each observed action is matched against the first unseen expectation of
/// the same type, searching roots in declaration order and descending into
/// already-seen nodes. Actions matching nothing are ignored, unless they are
/// malformed follow-ups (a `SUCCESS` or `ERROR` without related action, an
/// `ERROR` without payload). On a match the structural checks run (type,
/// payload unless a validator is set, follow-up shape), then the validator.
/// Any failure is logged and recorded; the state passes through unchanged
/// and the reducer keeps going.
///
/// The tester is cheap to clone; clones share the same tree.
///
/// # Example
///
/// ```ignore
/// let actions = ActionTester::<AppState, Msg>::new();
/// actions
///     .expect("LOGIN")
///     .with_payload(Msg::Credentials("alice".into()))
///     .then_on_success()
///     .then_follow_up("FETCH_PROFILE");
///
/// let mut store = Store::new(Config::default(), AppState::default(), actions.layer(app_reducer));
/// store.start().await?;
/// store.dispatch(Action::new("LOGIN").with_payload(Msg::Credentials("alice".into()))).await?;
///
/// actions.done().await?;
/// ```
pub struct ActionTester<S, P> {
    shared: Arc<Shared<ActionLedger<S, P>>>,
}

impl<S, P> Clone for ActionTester<S, P> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<S, P> Default for ActionTester<S, P>
where
    S: Clone + Send + 'static,
    P: Payload,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<S, P> ActionTester<S, P>
where
    S: Clone + Send + 'static,
    P: Payload,
{
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared::new(ActionLedger {
                tree: ExpectationTree::new(),
                counters: ActionCounters::default(),
                failures: Vec::new(),
            })),
        }
    }

    /// Declare a new root expectation.
    pub fn expect(&self, action_type: impl Into<ActionType>) -> ExpectedAction<S, P> {
        let id = self
            .shared
            .lock()
            .tree
            .add_root(ExpectationNode::new(action_type.into()));
        self.shared.notify();
        ExpectedAction {
            shared: self.shared.clone(),
            id,
        }
    }

    /// Feed one processed action through the tester, returning the next state.
    ///
    /// This is what the tester's reducer does; call it directly to drive the
    /// tester without a store.
    pub fn observe(&self, state: S, action: &Action<P>) -> S {
        let next = self.observe_locked(state, action);
        self.shared.notify();
        next
    }

    fn observe_locked(&self, state: S, action: &Action<P>) -> S {
        let (id, counter, validator) = {
            let mut ledger = self.shared.lock();
            ledger.counters.total += 1;

            let related = action.related().map(|r| r.action_type());
            let Some(id) = ledger.tree.find(action.action_type(), related) else {
                debug!(
                    action_type = %action.action_type(),
                    total = ledger.counters.total,
                    "no expectation matches action"
                );
                if let Err(mismatch) = follow_up_shape(action) {
                    ledger.record(mismatch, action);
                }
                return state;
            };

            ledger.tree.mark_seen(id);
            if let Err(mismatch) = ledger.check_structure(id, action) {
                ledger.record(mismatch, action);
                return state;
            }

            let counter = ledger.counters.bump(action.category());
            trace!(
                action_type = %action.action_type(),
                counter,
                total = ledger.counters.total,
                "action matched expectation"
            );
            (id, counter, ledger.tree.node_mut(id).validator.take())
        };

        // The validator runs unlocked so it may query this tester.
        let (next, outcome) = match validator {
            None => (state, None),
            Some(mut validator) => {
                let outcome = guarded(|| validator(counter, state.clone(), action));
                match outcome {
                    Ok(next) => (next, Some((validator, None))),
                    Err(message) => (state, Some((validator, Some(message)))),
                }
            }
        };

        let mut ledger = self.shared.lock();
        if let Some((validator, panic)) = outcome {
            ledger.tree.node_mut(id).validator = Some(validator);
            if let Some(message) = panic {
                let mismatch = Mismatch::ValidatorPanicked {
                    action_type: action.action_type().clone(),
                    message,
                };
                ledger.record(mismatch, action);
                return next;
            }
        }

        let pruned = ledger.tree.prune();
        trace!(pruned, remaining = ledger.tree.len(), "expectation tree pruned");
        next
    }

    /// A reducer that feeds every action through this tester.
    pub fn reducer(&self) -> TesterReducer<S, P> {
        TesterReducer {
            tester: self.clone(),
        }
    }

    /// Wrap an application reducer: `inner` computes the state, then the
    /// tester observes the action against it.
    pub fn layer<R: Reducer<S, P>>(&self, inner: R) -> Layered<S, P, R> {
        Layered {
            inner,
            tester: self.clone(),
        }
    }

    /// Completion future. See [`Done`].
    pub fn done(&self) -> Done {
        Done::new(self.shared.clone())
    }

    pub fn counters(&self) -> ActionCounters {
        self.shared.lock().counters
    }

    /// Number of reachable expectations, seen or not.
    pub fn remaining(&self) -> usize {
        self.shared.lock().tree.len()
    }

    /// Types still waiting for a matching action, in depth-first order.
    pub fn outstanding(&self) -> Vec<ActionType> {
        self.shared.lock().tree.outstanding()
    }

    /// Returns true while no mismatch has been recorded.
    pub fn is_ok(&self) -> bool {
        self.shared.lock().failures.is_empty()
    }

    pub fn failures(&self) -> Vec<Mismatch> {
        self.shared.lock().failures.clone()
    }
}

impl<S, P> fmt::Debug for ActionTester<S, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ledger = self.shared.lock();
        f.debug_struct("ActionTester")
            .field("counters", &ledger.counters)
            .field("remaining", &ledger.tree.len())
            .field("failures", &ledger.failures.len())
            .finish()
    }
}

impl<S, P> Progress for Shared<ActionLedger<S, P>>
where
    S: 'static,
    P: Payload,
{
    fn name(&self) -> &'static str {
        "action"
    }

    fn outcome(&self) -> Outcome {
        let ledger = self.lock();
        if !ledger.failures.is_empty() {
            Outcome::Failed(ledger.failures.len())
        } else if ledger.tree.is_empty() {
            Outcome::Complete
        } else {
            Outcome::Pending(ledger.tree.outstanding().len())
        }
    }

    fn notifier(&self) -> &tokio::sync::Notify {
        Shared::notifier(self)
    }
}

/// Handle to one declared expectation.
///
/// Builder methods refine the expectation itself; `then_*` methods declare
/// follow-ups that only become matchable after this one was seen. Handles
/// stay valid after the expectation is consumed, but follow-ups declared
/// once it has been pruned can never match and are recorded as
/// [`Mismatch::DetachedExpectation`].
pub struct ExpectedAction<S, P> {
    shared: Arc<Shared<ActionLedger<S, P>>>,
    id: NodeId,
}

impl<S, P> Clone for ExpectedAction<S, P> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
            id: self.id,
        }
    }
}

impl<S, P> ExpectedAction<S, P>
where
    S: Clone + Send + 'static,
    P: Payload,
{
    /// Require the observed payload to equal `payload`.
    ///
    /// Ignored once a validator is set: the validator takes over payload
    /// checking.
    pub fn with_payload(self, payload: P) -> Self {
        self.shared.lock().tree.node_mut(self.id).payload = PayloadCheck::Equals(payload);
        self
    }

    /// Require the observed action to carry no payload.
    pub fn without_payload(self) -> Self {
        self.shared.lock().tree.node_mut(self.id).payload = PayloadCheck::Absent;
        self
    }

    /// Compute the next state with `validator` when this expectation matches.
    ///
    /// The first argument is the counter of the matched action's category.
    pub fn with_validator<F>(self, validator: F) -> Self
    where
        F: FnMut(u64, S, &Action<P>) -> S + Send + 'static,
    {
        self.shared.lock().tree.node_mut(self.id).validator = Some(Box::new(validator));
        self
    }

    /// Expect a `SUCCESS` following this action.
    pub fn then_on_success(&self) -> ExpectedAction<S, P> {
        self.then_follow_up(ActionType::SUCCESS)
    }

    /// Expect an `ERROR` following this action.
    pub fn then_on_error(&self) -> ExpectedAction<S, P> {
        self.then_follow_up(ActionType::ERROR)
    }

    /// Expect an action of `action_type` following this action.
    pub fn then_follow_up(&self, action_type: impl Into<ActionType>) -> ExpectedAction<S, P> {
        let action_type = action_type.into();
        let id = {
            let mut ledger = self.shared.lock();
            let (id, attached) = ledger
                .tree
                .add_child(self.id, ExpectationNode::new(action_type.clone()));
            if !attached {
                let mismatch = Mismatch::DetachedExpectation {
                    action_type: action_type.clone(),
                };
                error!(
                    action_type = %action_type,
                    parent = %ledger.tree.node(self.id).action_type,
                    error = %mismatch,
                    "action test failed"
                );
                ledger.failures.push(mismatch);
            }
            id
        };
        self.shared.notify();
        ExpectedAction {
            shared: self.shared.clone(),
            id,
        }
    }

    pub fn action_type(&self) -> ActionType {
        self.shared.lock().tree.node(self.id).action_type.clone()
    }

    /// Returns true once an action matched this expectation.
    pub fn is_seen(&self) -> bool {
        self.shared.lock().tree.is_seen(self.id)
    }
}

impl<S, P> fmt::Debug for ExpectedAction<S, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ledger = self.shared.lock();
        let node = ledger.tree.node(self.id);
        f.debug_struct("ExpectedAction")
            .field("action_type", &node.action_type)
            .field("seen", &ledger.tree.is_seen(self.id))
            .finish()
    }
}

/// Reducer returned by [`ActionTester::reducer`].
pub struct TesterReducer<S, P> {
    tester: ActionTester<S, P>,
}

impl<S, P> Reducer<S, P> for TesterReducer<S, P>
where
    S: Clone + Send + 'static,
    P: Payload,
{
    fn reduce(&mut self, state: S, action: &Action<P>) -> S {
        self.tester.observe(state, action)
    }
}

/// Reducer returned by [`ActionTester::layer`].
pub struct Layered<S, P, R> {
    inner: R,
    tester: ActionTester<S, P>,
}

impl<S, P, R> Reducer<S, P> for Layered<S, P, R>
where
    S: Clone + Send + 'static,
    P: Payload,
    R: Reducer<S, P>,
{
    fn reduce(&mut self, state: S, action: &Action<P>) -> S {
        let next = self.inner.reduce(state, action);
        self.tester.observe(next, action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    type Tester = ActionTester<u32, String>;

    fn payload(s: &str) -> String {
        s.to_string()
    }

    #[test]
    fn success_follow_up_consumes_tree() {
        let tester = Tester::new();
        tester
            .expect("LOGIN")
            .with_payload(payload("alice"))
            .then_on_success();

        let login = Action::new("LOGIN").with_payload(payload("alice"));
        tester.observe(0, &login);
        assert_eq!(tester.remaining(), 2);
        assert_eq!(tester.outstanding(), vec![ActionType::SUCCESS]);

        tester.observe(0, &Action::success(&login, None));
        assert_eq!(tester.remaining(), 0);
        assert!(tester.is_ok());
        assert_eq!(
            tester.counters(),
            ActionCounters {
                total: 2,
                generic: 1,
                success: 1,
                error: 0
            }
        );
    }

    #[test]
    fn unmatched_actions_are_ignored() {
        let tester = Tester::new();
        tester.expect("LOGIN");

        assert_eq!(tester.observe(7, &Action::new("NOISE")), 7);
        assert_eq!(tester.counters().total, 1);
        assert_eq!(tester.counters().generic, 0);
        assert_eq!(tester.remaining(), 1);
        assert!(tester.is_ok());
    }

    #[test]
    fn error_without_declared_child_is_ignored() {
        let tester = Tester::new();
        tester.expect("LOGIN");

        let login = Action::new("LOGIN");
        tester.observe(0, &login);
        tester.observe(0, &Action::error(&login, payload("denied")));

        assert!(tester.is_ok());
        assert_eq!(tester.counters().error, 0);
    }

    #[test]
    fn malformed_error_fails_even_without_match() {
        let tester = Tester::new();
        tester.expect("LOGIN");

        let login = Action::new("LOGIN");
        let bare_error = Action::new(ActionType::ERROR).with_related(&login);
        tester.observe(0, &bare_error);

        assert_eq!(tester.failures(), vec![Mismatch::MissingErrorPayload]);
        assert_eq!(tester.remaining(), 1);
    }

    #[test]
    fn payload_mismatch_is_recorded_and_state_kept() {
        let tester = Tester::new();
        tester.expect("LOGIN").with_payload(payload("alice"));

        let state = tester.observe(3, &Action::new("LOGIN").with_payload(payload("bob")));
        assert_eq!(state, 3);
        assert!(matches!(
            tester.failures().as_slice(),
            [Mismatch::Payload { expected, observed, .. }]
                if expected.contains("alice") && observed.contains("bob")
        ));
    }

    #[test]
    fn validator_replaces_payload_check() {
        let tester = Tester::new();
        tester
            .expect("LOGIN")
            .with_payload(payload("alice"))
            .with_validator(|_, state, _| state + 1);

        let state = tester.observe(0, &Action::new("LOGIN").with_payload(payload("bob")));
        assert_eq!(state, 1);
        assert!(tester.is_ok());
    }

    #[test]
    fn validator_panic_is_recorded() {
        let tester = Tester::new();
        tester
            .expect("LOGIN")
            .with_validator(|_, _, action: &Action<String>| {
                assert_eq!(action.payload().map(String::as_str), Some("alice"));
                1
            });

        let state = tester.observe(5, &Action::new("LOGIN").with_payload(payload("bob")));
        assert_eq!(state, 5);
        assert!(matches!(
            tester.failures().as_slice(),
            [Mismatch::ValidatorPanicked { action_type, .. }] if action_type.as_str() == "LOGIN"
        ));
    }

    #[test]
    fn validator_computes_next_state() {
        let tester = Tester::new();
        tester.expect("INC").with_validator(|counter, state, _| state + counter as u32);
        tester.expect("INC").with_validator(|counter, state, _| state + counter as u32);

        let state = tester.observe(0, &Action::new("INC"));
        let state = tester.observe(state, &Action::new("INC"));
        assert_eq!(state, 3);
        assert_eq!(tester.remaining(), 0);
    }

    #[test]
    fn structural_checks() {
        let tester = Tester::new();
        tester.expect("LOGIN").without_payload();
        tester.observe(0, &Action::new("LOGIN").with_payload(payload("alice")));
        assert!(matches!(tester.failures()[0], Mismatch::Payload { .. }));

        let tester = Tester::new();
        let login = tester.expect("LOGIN");
        login.then_on_success();
        let action = Action::new("LOGIN");
        tester.observe(0, &action);
        tester.observe(0, &Action::from(ActionType::SUCCESS));
        assert_eq!(
            tester.failures(),
            vec![Mismatch::MissingRelatedAction {
                action_type: ActionType::SUCCESS
            }]
        );
    }

    #[test]
    fn related_type_selects_follow_up_branch() {
        let tester = Tester::new();
        let login = tester.expect("LOGIN");
        let login_success = login.then_on_success();
        let fetch = tester.expect("FETCH");
        let fetch_success = fetch.then_on_success();

        let login_action = Action::new("LOGIN");
        let fetch_action = Action::new("FETCH");
        tester.observe(0, &login_action);
        tester.observe(0, &fetch_action);
        tester.observe(0, &Action::success(&fetch_action, None));

        assert!(fetch_success.is_seen());
        assert!(!login_success.is_seen());
        assert_eq!(tester.remaining(), 2);
    }

    #[test]
    fn follow_up_on_pruned_expectation_fails() {
        let tester = Tester::new();
        let login = tester.expect("LOGIN");
        tester.observe(0, &Action::new("LOGIN"));
        assert_eq!(tester.remaining(), 0);

        let late = login.then_on_success();
        assert!(!late.is_seen());
        assert_eq!(
            tester.failures(),
            vec![Mismatch::DetachedExpectation {
                action_type: ActionType::SUCCESS
            }]
        );
    }

    #[test]
    fn validator_may_query_its_own_tester() {
        let tester = Tester::new();
        let inner = tester.clone();
        let ping = tester.expect("PING").with_validator(move |counter, state, _| {
            assert_eq!(inner.counters().generic, counter);
            assert_eq!(inner.outstanding(), vec![ActionType::from("PONG")]);
            state + 1
        });
        tester.expect("PONG");

        assert_eq!(tester.observe(0, &Action::new("PING")), 1);
        assert!(ping.is_seen());
        assert!(tester.is_ok());
        assert_eq!(tester.outstanding(), vec![ActionType::from("PONG")]);
    }

    #[test]
    fn failed_structure_does_not_advance_counters() {
        let tester = Tester::new();
        tester.expect("INC").with_payload(payload("one"));
        tester
            .expect("INC")
            .with_validator(|counter, state, _| state + counter as u32);

        let state = tester.observe(0, &Action::new("INC").with_payload(payload("two")));
        let state = tester.observe(state, &Action::new("INC"));

        assert_eq!(state, 1);
        assert_eq!(tester.counters().generic, 1);
        assert_eq!(tester.failures().len(), 1);
    }

    #[test]
    fn layer_runs_inner_reducer_first() {
        let tester = Tester::new();
        tester.expect("INC").with_validator(|_, state, _| {
            assert_eq!(state, 10);
            state
        });

        let mut reducer = tester.layer(|state: u32, _: &Action<String>| state + 10);
        assert_eq!(reducer.reduce(0, &Action::new("INC")), 10);
        assert!(tester.is_ok());
    }

    #[tokio::test]
    async fn done_resolves_once_tree_is_consumed() {
        let tester = Tester::new();
        tester.expect("PING");
        let mut reducer = tester.reducer();

        let waiter = tokio::spawn(tester.done().into_future());
        tokio::task::yield_now().await;
        reducer.reduce(0, &Action::new("PING"));

        assert_eq!(waiter.await.unwrap(), Ok(()));
    }

    #[tokio::test]
    async fn done_rejects_on_mismatch() {
        let tester = Tester::new();
        tester.expect("PING").with_payload(payload("a"));
        tester.expect("PONG");
        tester.observe(0, &Action::new("PING"));

        assert_eq!(tester.done().await, Err(Error::ExpectationsFailed("action", 1)));
    }

    #[tokio::test(start_paused = true)]
    async fn done_times_out_on_missing_follow_up() {
        let tester = Tester::new();
        tester.expect("LOGIN").then_on_success();
        let login = Action::new("LOGIN");
        tester.observe(0, &login);
        tester.observe(0, &Action::error(&login, payload("denied")));

        let timeout = std::time::Duration::from_millis(20);
        assert_eq!(
            tester.done().within(timeout).await,
            Err(Error::DoneTimeout("action", timeout, 1))
        );
    }
}
