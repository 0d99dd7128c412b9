use std::{fmt, hash};
use uuid::Uuid;

/// Unique identifier of a dispatched [`Action`](crate::Action).
///
/// Backed by a random UUID, so ids are unique but not ordered in time.
/// Use [`Meta::timestamp`](crate::Meta::timestamp) for ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, hash::Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActionId(u128);

impl ActionId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4().as_u128())
    }

    pub fn value(&self) -> u128 {
        self.0
    }
}

impl From<u128> for ActionId {
    fn from(value: u128) -> Self {
        ActionId(value)
    }
}

impl From<ActionId> for u128 {
    fn from(value: ActionId) -> Self {
        value.0
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", Uuid::from_u128(self.0))
    }
}

impl Default for ActionId {
    fn default() -> Self {
        ActionId::new()
    }
}
