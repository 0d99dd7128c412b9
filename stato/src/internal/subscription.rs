use std::collections::HashSet;

use crate::ActionType;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Subscription {
    All,
    Types(HashSet<ActionType>),
    None,
}

impl Subscription {
    pub(crate) fn accepts(&self, action_type: &ActionType) -> bool {
        match self {
            Subscription::All => true,
            Subscription::Types(types) => types.contains(action_type),
            Subscription::None => false,
        }
    }
}
