use std::{borrow::Cow, fmt, hash};

/// The type tag of an [`Action`](crate::Action).
///
/// Reducers, effect subscriptions and testers all route on this tag. Two
/// well-known tags mark follow-up actions: [`ActionType::SUCCESS`] and
/// [`ActionType::ERROR`]. A follow-up carries a link to the action that
/// triggered it in its [`Meta`](crate::Meta).
///
/// ```rust
/// use stato::{ActionCategory, ActionType};
///
/// let login = ActionType::from("LOGIN");
/// assert_eq!(login.category(), ActionCategory::Generic);
/// assert_eq!(ActionType::SUCCESS.category(), ActionCategory::Success);
/// assert_eq!(login, "LOGIN");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, hash::Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct ActionType(Cow<'static, str>);

impl ActionType {
    /// Generic success follow-up.
    pub const SUCCESS: ActionType = ActionType(Cow::Borrowed("SUCCESS"));

    /// Generic error follow-up. Error actions must carry a payload.
    pub const ERROR: ActionType = ActionType(Cow::Borrowed("ERROR"));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Which counter family this type belongs to.
    pub fn category(&self) -> ActionCategory {
        if *self == Self::SUCCESS {
            ActionCategory::Success
        } else if *self == Self::ERROR {
            ActionCategory::Error
        } else {
            ActionCategory::Generic
        }
    }

    #[inline]
    pub fn is_follow_up(&self) -> bool {
        self.category() != ActionCategory::Generic
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for ActionType {
    fn from(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }
}

impl From<String> for ActionType {
    fn from(name: String) -> Self {
        Self(Cow::Owned(name))
    }
}

impl From<&ActionType> for ActionType {
    fn from(value: &ActionType) -> Self {
        value.clone()
    }
}

impl PartialEq<str> for ActionType {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for ActionType {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

/// Classification of an action by its type tag.
///
/// Testers keep one counter per category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, hash::Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ActionCategory {
    Generic,
    Success,
    Error,
}

impl fmt::Display for ActionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionCategory::Generic => write!(f, "generic"),
            ActionCategory::Success => write!(f, "success"),
            ActionCategory::Error => write!(f, "error"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_known_types_are_categorized() {
        assert_eq!(ActionType::SUCCESS.category(), ActionCategory::Success);
        assert_eq!(ActionType::ERROR.category(), ActionCategory::Error);
        assert_eq!(ActionType::from("LOGIN").category(), ActionCategory::Generic);
    }

    #[test]
    fn owned_and_borrowed_names_compare_equal() {
        let borrowed = ActionType::from("SUCCESS");
        let owned = ActionType::from(String::from("SUCCESS"));
        assert_eq!(borrowed, owned);
        assert_eq!(owned, ActionType::SUCCESS);
        assert!(owned.is_follow_up());
    }
}
