use std::{
    any::Any,
    panic::{AssertUnwindSafe, catch_unwind},
};

use crate::{Action, ActionStatus};

/// Computes the next state when an expectation matches.
///
/// Receives the tester-wide counter of the matched action's category
/// (generic, success or error, already incremented), the current state and
/// the observed action. Assert freely inside: a panic is caught and recorded
/// as [`Mismatch::ValidatorPanicked`](super::Mismatch::ValidatorPanicked).
pub type ActionValidator<S, P> = Box<dyn FnMut(u64, S, &Action<P>) -> S + Send>;

/// Custom check run against a state change.
///
/// Receives the state-change iteration, the observed state and its last
/// status marker. A panic is recorded as
/// [`Mismatch::AssertionPanicked`](super::Mismatch::AssertionPanicked).
pub type StateAssertion<S> = Box<dyn FnMut(u64, &S, Option<&ActionStatus>) + Send>;

/// Run user-supplied test code, turning a panic into its message.
pub(crate) fn guarded<R>(f: impl FnOnce() -> R) -> Result<R, String> {
    catch_unwind(AssertUnwindSafe(f)).map_err(panic_message)
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guarded_passes_values_through() {
        assert_eq!(guarded(|| 21 * 2), Ok(42));
    }

    #[test]
    fn guarded_captures_assertion_messages() {
        let err = guarded(|| assert_eq!(1, 2, "numbers differ")).unwrap_err();
        assert!(err.contains("numbers differ"), "got: {err}");

        let err = guarded(|| panic!("plain")).unwrap_err();
        assert_eq!(err, "plain");
    }
}
