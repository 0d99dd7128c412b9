use std::fmt;

use crate::{ActionResult, ActionStatus, ActionType, StatusState};

use super::{Mismatch, StateAssertion, validator::guarded};

/// One expected state change, queued on a [`StateTester`](super::StateTester).
///
/// All checks are optional; an expectation with none set accepts any state.
///
/// ```ignore
/// states.expect(
///     StateExpectation::after_action("LOGIN")
///         .with_result(ActionResult::Ok)
///         .with_assertion(|_, state: &AppState, _| assert!(state.user.is_some())),
/// );
/// ```
pub struct StateExpectation<S> {
    pub(crate) skip: usize,
    iteration: Option<u64>,
    state: Option<S>,
    last_action: Option<ActionType>,
    last_result: Option<ActionResult>,
    assertion: Option<StateAssertion<S>>,
}

impl<S> Default for StateExpectation<S> {
    fn default() -> Self {
        Self {
            skip: 0,
            iteration: None,
            state: None,
            last_action: None,
            last_result: None,
            assertion: None,
        }
    }
}

impl<S> StateExpectation<S> {
    /// Expect the next state change, whatever it is.
    pub fn new() -> Self {
        Self::default()
    }

    /// Expect the state change that comes after letting `skip` changes pass.
    pub fn after_skipping(skip: usize) -> Self {
        Self::new().with_skip(skip)
    }

    /// Expect the next state change to record `action_type` as its last
    /// action.
    pub fn after_action(action_type: impl Into<ActionType>) -> Self {
        Self::new().with_last_action(action_type)
    }

    /// Number of state changes to let pass before this expectation applies,
    /// counted from the moment it reaches the head of the queue.
    pub fn with_skip(mut self, skip: usize) -> Self {
        self.skip = skip;
        self
    }

    /// Require the state change to be the `iteration`-th one observed
    /// (1-based, counted over the tester's lifetime).
    pub fn at_iteration(mut self, iteration: u64) -> Self {
        self.iteration = Some(iteration);
        self
    }

    /// Require the whole state to equal `state`.
    pub fn with_state(mut self, state: S) -> Self {
        self.state = Some(state);
        self
    }

    pub fn with_last_action(mut self, action_type: impl Into<ActionType>) -> Self {
        self.last_action = Some(action_type.into());
        self
    }

    pub fn with_result(mut self, result: ActionResult) -> Self {
        self.last_result = Some(result);
        self
    }

    pub fn with_assertion<F>(mut self, assertion: F) -> Self
    where
        F: FnMut(u64, &S, Option<&ActionStatus>) + Send + 'static,
    {
        self.assertion = Some(Box::new(assertion));
        self
    }
}

impl<S> StateExpectation<S>
where
    S: PartialEq + fmt::Debug + StatusState,
{
    pub(crate) fn check(&mut self, iteration: u64, state: &S) -> Result<(), Mismatch> {
        if let Some(expected) = self.iteration
            && expected != iteration
        {
            return Err(Mismatch::Iteration {
                expected,
                observed: iteration,
            });
        }

        if let Some(expected) = &self.state
            && expected != state
        {
            return Err(Mismatch::State {
                iteration,
                expected: format!("{expected:?}"),
                observed: format!("{state:?}"),
            });
        }

        let status = state.last_status();
        if self.last_action.is_some() || self.last_result.is_some() {
            let Some(status) = status else {
                return Err(Mismatch::MissingStatus { iteration });
            };
            if let Some(expected) = &self.last_action
                && *expected != status.action_type
            {
                return Err(Mismatch::LastActionType {
                    iteration,
                    expected: expected.clone(),
                    observed: status.action_type.clone(),
                });
            }
            if let Some(expected) = self.last_result
                && expected != status.result
            {
                return Err(Mismatch::LastStatusResult {
                    iteration,
                    action_type: status.action_type.clone(),
                    expected,
                    observed: status.result,
                });
            }
        }

        if let Some(assertion) = self.assertion.as_mut() {
            guarded(|| assertion(iteration, state, status))
                .map_err(|message| Mismatch::AssertionPanicked { iteration, message })?;
        }
        Ok(())
    }
}

impl<S: fmt::Debug> fmt::Debug for StateExpectation<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateExpectation")
            .field("skip", &self.skip)
            .field("iteration", &self.iteration)
            .field("state", &self.state)
            .field("last_action", &self.last_action)
            .field("last_result", &self.last_result)
            .field("assertion", &self.assertion.is_some())
            .finish()
    }
}
