use std::fmt;

use crate::{Action, ActionCategory, ActionType};

/// Outcome of the last processed action, as recorded in application state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ActionResult {
    Ok,
    Error,
}

impl fmt::Display for ActionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionResult::Ok => write!(f, "OK"),
            ActionResult::Error => write!(f, "ERROR"),
        }
    }
}

/// "Last action processed" marker kept inside application state.
///
/// Reducers record it so that state assertions can check which action
/// produced the current state and whether it succeeded. See
/// [`StatusState`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActionStatus {
    pub action_type: ActionType,
    pub result: ActionResult,
}

impl ActionStatus {
    pub fn new(action_type: impl Into<ActionType>, result: ActionResult) -> Self {
        Self {
            action_type: action_type.into(),
            result,
        }
    }

    /// Derive the status a reducer would record for `action`.
    ///
    /// Success and error follow-ups report on the action they follow up
    /// (falling back to their own type when the link is missing); any other
    /// action reports itself as `Ok`.
    pub fn of<P>(action: &Action<P>) -> Self {
        let target = || {
            action
                .related()
                .map(|r| r.action_type().clone())
                .unwrap_or_else(|| action.action_type().clone())
        };
        match action.category() {
            ActionCategory::Generic => Self::new(action.action_type(), ActionResult::Ok),
            ActionCategory::Success => Self::new(target(), ActionResult::Ok),
            ActionCategory::Error => Self::new(target(), ActionResult::Error),
        }
    }
}

impl fmt::Display for ActionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.action_type, self.result)
    }
}

/// Application state that exposes its last-status marker.
///
/// Required by [`StateTester`](crate::testing::StateTester) to check
/// expectations declared with `expect_state_after_action`.
///
/// ```rust
/// use stato::{ActionStatus, StatusState};
///
/// #[derive(Clone, Debug, PartialEq, Default)]
/// struct Session {
///     user: Option<String>,
///     status: Option<ActionStatus>,
/// }
///
/// impl StatusState for Session {
///     fn last_status(&self) -> Option<&ActionStatus> {
///         self.status.as_ref()
///     }
/// }
/// ```
pub trait StatusState {
    fn last_status(&self) -> Option<&ActionStatus>;
}
