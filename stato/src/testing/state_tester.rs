use std::{collections::VecDeque, fmt, sync::Arc};

use tracing::{error, trace};

use crate::{ActionResult, ActionType, StatusState};

use super::{
    Done, Mismatch, StateExpectation,
    progress::{Outcome, Progress, Shared},
};

pub(crate) struct StateQueue<S> {
    queue: VecDeque<StateExpectation<S>>,
    iteration: u64,
    declared: usize,
    checking: usize,
    failures: Vec<Mismatch>,
}

/// FIFO of expected state changes.
///
/// Register [`listener`](Self::listener) with a store before starting it.
/// Every state change consumes the head of the queue, after its skip count
/// (relative to the moment it reached the head) has been exhausted. A state
/// change arriving when the queue is empty is a failure: the tester expects
/// exactly the changes it was told about.
///
/// # Example
///
/// ```ignore
/// let states = StateTester::<AppState>::new();
/// states.expect_state_after_action("LOGIN", Some(ActionResult::Ok));
/// states.expect_state(1, Some(logged_in));
///
/// store.subscribe(states.listener())?;
/// ```
pub struct StateTester<S> {
    shared: Arc<Shared<StateQueue<S>>>,
}

impl<S> Clone for StateTester<S> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<S> Default for StateTester<S>
where
    S: Clone + PartialEq + fmt::Debug + StatusState + Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<S> StateTester<S>
where
    S: Clone + PartialEq + fmt::Debug + StatusState + Send + 'static,
{
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared::new(StateQueue {
                queue: VecDeque::new(),
                iteration: 0,
                declared: 0,
                checking: 0,
                failures: Vec::new(),
            })),
        }
    }

    /// Expect a state change after skipping `skip` changes, optionally equal
    /// to `state`.
    pub fn expect_state(&self, skip: usize, state: Option<S>) {
        let mut expectation = StateExpectation::after_skipping(skip);
        if let Some(state) = state {
            expectation = expectation.with_state(state);
        }
        self.expect(expectation);
    }

    /// Expect the next state change to record `action_type` as its last
    /// action, optionally with `result`.
    pub fn expect_state_after_action(&self, action_type: impl Into<ActionType>, result: Option<ActionResult>) {
        let mut expectation = StateExpectation::after_action(action_type);
        if let Some(result) = result {
            expectation = expectation.with_result(result);
        }
        self.expect(expectation);
    }

    /// Queue a fully configured expectation.
    pub fn expect(&self, expectation: StateExpectation<S>) {
        {
            let mut queue = self.shared.lock();
            queue.declared += 1;
            queue.queue.push_back(expectation);
        }
        self.shared.notify();
    }

    /// Feed one state change through the tester.
    pub fn observe(&self, state: &S) {
        self.observe_locked(state);
        self.shared.notify();
    }

    fn observe_locked(&self, state: &S) {
        let (iteration, expectation) = {
            let mut queue = self.shared.lock();
            queue.iteration += 1;
            let iteration = queue.iteration;
            trace!(iteration, state = ?state, "state changed");

            if let Some(head) = queue.queue.front_mut()
                && head.skip > 0
            {
                head.skip -= 1;
                trace!(iteration, skip_left = head.skip, "state change skipped");
                return;
            }

            let expectation = queue.queue.pop_front();
            if expectation.is_some() {
                queue.checking += 1;
            }
            (iteration, expectation)
        };

        // Checks run unlocked so assertions may query this tester.
        let popped = expectation.is_some();
        let result = match expectation {
            Some(mut expectation) => expectation.check(iteration, state),
            None => Err(Mismatch::UnexpectedStateChange { iteration }),
        };

        let mut queue = self.shared.lock();
        if popped {
            queue.checking -= 1;
        }
        if let Err(mismatch) = result {
            error!(
                iteration,
                state = ?state,
                remaining = ?queue.queue,
                error = %mismatch,
                "state change test failed"
            );
            queue.failures.push(mismatch);
        }
    }

    /// Listener suitable for [`Store::subscribe`](crate::Store::subscribe).
    pub fn listener(&self) -> impl FnMut(&S) + Send + use<S> {
        let tester = self.clone();
        move |state: &S| tester.observe(state)
    }

    /// Adapter for stores whose listeners are notified without the state:
    /// `get_state` is called on every notification.
    pub fn on_state_change<G>(&self, get_state: G) -> impl FnMut() + Send + use<S, G>
    where
        G: Fn() -> S + Send + 'static,
    {
        let tester = self.clone();
        move || tester.observe(&get_state())
    }

    /// Completion future. See [`Done`].
    pub fn done(&self) -> Done {
        Done::new(self.shared.clone())
    }

    /// Number of state changes observed so far.
    pub fn iteration(&self) -> u64 {
        self.shared.lock().iteration
    }

    /// Number of queued expectations not yet consumed.
    pub fn remaining(&self) -> usize {
        self.shared.lock().queue.len()
    }

    /// Number of expectations ever queued.
    pub fn declared(&self) -> usize {
        self.shared.lock().declared
    }

    pub fn is_ok(&self) -> bool {
        self.shared.lock().failures.is_empty()
    }

    pub fn failures(&self) -> Vec<Mismatch> {
        self.shared.lock().failures.clone()
    }
}

impl<S> fmt::Debug for StateTester<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let queue = self.shared.lock();
        f.debug_struct("StateTester")
            .field("iteration", &queue.iteration)
            .field("remaining", &queue.queue.len())
            .field("failures", &queue.failures.len())
            .finish()
    }
}

impl<S: Send + 'static> Progress for Shared<StateQueue<S>> {
    fn name(&self) -> &'static str {
        "state"
    }

    fn outcome(&self) -> Outcome {
        let queue = self.lock();
        if !queue.failures.is_empty() {
            Outcome::Failed(queue.failures.len())
        } else if queue.queue.is_empty() && queue.checking == 0 {
            Outcome::Complete
        } else {
            Outcome::Pending(queue.queue.len() + queue.checking)
        }
    }

    fn notifier(&self) -> &tokio::sync::Notify {
        Shared::notifier(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ActionStatus, Error};

    #[derive(Debug, Clone, PartialEq, Default)]
    struct Session {
        user: Option<&'static str>,
        status: Option<ActionStatus>,
    }

    impl StatusState for Session {
        fn last_status(&self) -> Option<&ActionStatus> {
            self.status.as_ref()
        }
    }

    fn after(action_type: &'static str, result: ActionResult, user: Option<&'static str>) -> Session {
        Session {
            user,
            status: Some(ActionStatus::new(action_type, result)),
        }
    }

    #[test]
    fn skip_is_relative_to_the_queue_head() {
        let tester = StateTester::new();
        tester.expect_state(0, None);
        tester.expect_state(1, Some(after("LOGIN", ActionResult::Ok, Some("alice"))));

        tester.observe(&Session::default());
        tester.observe(&after("LOGIN", ActionResult::Ok, None));
        assert_eq!(tester.remaining(), 1);
        tester.observe(&after("LOGIN", ActionResult::Ok, Some("alice")));

        assert_eq!(tester.remaining(), 0);
        assert_eq!(tester.iteration(), 3);
        assert!(tester.is_ok());
    }

    #[test]
    fn last_action_and_result_are_checked() {
        let tester = StateTester::new();
        tester.expect_state_after_action("LOGIN", Some(ActionResult::Ok));
        tester.expect_state_after_action("LOGIN", None);
        tester.expect_state_after_action("LOGIN", None);

        tester.observe(&after("LOGIN", ActionResult::Error, None));
        tester.observe(&after("LOGIN", ActionResult::Error, None));
        tester.observe(&Session::default());

        assert_eq!(
            tester.failures(),
            vec![
                Mismatch::LastStatusResult {
                    iteration: 1,
                    action_type: ActionType::from("LOGIN"),
                    expected: ActionResult::Ok,
                    observed: ActionResult::Error,
                },
                Mismatch::MissingStatus { iteration: 3 },
            ]
        );
    }

    #[test]
    fn extra_state_change_fails() {
        let tester = StateTester::new();
        tester.expect_state(0, None);
        tester.observe(&Session::default());
        tester.observe(&Session::default());

        assert_eq!(
            tester.failures(),
            vec![Mismatch::UnexpectedStateChange { iteration: 2 }]
        );
    }

    #[test]
    fn custom_expectations() {
        let tester = StateTester::new();
        tester.expect(StateExpectation::new().at_iteration(1).with_assertion(
            |iteration, state: &Session, status| {
                assert_eq!(iteration, 1);
                assert!(state.user.is_none());
                assert!(status.is_none());
            },
        ));
        tester.expect(StateExpectation::new().at_iteration(3));
        tester.expect(
            StateExpectation::new().with_assertion(|_, state: &Session, _| assert!(state.user.is_some())),
        );

        tester.observe(&Session::default());
        tester.observe(&Session::default());
        tester.observe(&Session::default());

        let failures = tester.failures();
        assert_eq!(failures[0], Mismatch::Iteration { expected: 3, observed: 2 });
        assert!(matches!(failures[1], Mismatch::AssertionPanicked { iteration: 3, .. }));
    }

    #[test]
    fn listeners_feed_the_tester() {
        let tester = StateTester::new();
        tester.expect_state(0, Some(Session::default()));
        tester.expect_state(0, Some(after("LOGOUT", ActionResult::Ok, None)));

        let mut listener = tester.listener();
        listener(&Session::default());
        let mut on_change = tester.on_state_change(|| after("LOGOUT", ActionResult::Ok, None));
        on_change();

        assert!(tester.is_ok());
        assert_eq!(tester.remaining(), 0);
    }

    #[test]
    fn assertion_may_query_its_own_tester() {
        let tester = StateTester::new();
        let inner = tester.clone();
        tester.expect(StateExpectation::new().with_assertion(move |iteration, _: &Session, _| {
            assert_eq!(inner.iteration(), iteration);
            assert_eq!(inner.remaining(), 1);
            assert!(inner.is_ok());
        }));
        tester.expect_state(0, None);

        tester.observe(&Session::default());
        assert!(tester.is_ok());
        assert_eq!(tester.remaining(), 1);
    }

    #[tokio::test]
    async fn done_reports_failures_and_completion() {
        let tester = StateTester::new();
        tester.expect_state(0, None);
        let waiter = tokio::spawn(tester.done().into_future());
        tokio::task::yield_now().await;
        tester.observe(&Session::default());
        assert_eq!(waiter.await.unwrap(), Ok(()));

        tester.observe(&Session::default());
        assert_eq!(tester.done().await, Err(Error::ExpectationsFailed("state", 1)));
    }
}
