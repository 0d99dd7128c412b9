use crate::{ActionResult, ActionType};

/// A divergence between declared expectations and observed behavior.
///
/// Testers never let a mismatch cross the reducer or listener boundary: it is
/// logged, recorded, and reported by `done()` as
/// [`Error::ExpectationsFailed`](crate::Error::ExpectationsFailed). Use
/// `failures()` on a tester to inspect the recorded values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Mismatch {
    #[error("expected action type {expected}, observed {observed}")]
    ActionType {
        expected: ActionType,
        observed: ActionType,
    },

    #[error("payload of {action_type} differs: expected {expected}, observed {observed}")]
    Payload {
        action_type: ActionType,
        expected: String,
        observed: String,
    },

    #[error("{action_type} action carries no related action")]
    MissingRelatedAction { action_type: ActionType },

    #[error("error action carries no payload")]
    MissingErrorPayload,

    #[error("validator for {action_type} panicked: {message}")]
    ValidatorPanicked {
        action_type: ActionType,
        message: String,
    },

    #[error("follow-up {action_type} declared on an expectation that was already consumed")]
    DetachedExpectation { action_type: ActionType },

    #[error("state change at iteration {iteration} exceeds the expected number of state changes")]
    UnexpectedStateChange { iteration: u64 },

    #[error("expected state change iteration {expected}, observed {observed}")]
    Iteration { expected: u64, observed: u64 },

    #[error("state at iteration {iteration} differs: expected {expected}, observed {observed}")]
    State {
        iteration: u64,
        expected: String,
        observed: String,
    },

    #[error("state at iteration {iteration} has no last action status")]
    MissingStatus { iteration: u64 },

    #[error("last action at iteration {iteration}: expected {expected}, observed {observed}")]
    LastActionType {
        iteration: u64,
        expected: ActionType,
        observed: ActionType,
    },

    #[error(
        "last status of {action_type} at iteration {iteration}: expected {expected}, observed {observed}"
    )]
    LastStatusResult {
        iteration: u64,
        action_type: ActionType,
        expected: ActionResult,
        observed: ActionResult,
    },

    #[error("state assertion at iteration {iteration} panicked: {message}")]
    AssertionPanicked { iteration: u64, message: String },
}
