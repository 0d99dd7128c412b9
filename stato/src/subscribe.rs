use std::{collections::HashSet, marker::PhantomData};

use crate::{ActionType, internal::Subscription};

/// Specifies which action types an effect receives.
///
/// Use the static constructors to create subscriptions:
///
/// - [`Subscribe::all()`]  - receive every dispatched action (e.g. logging effects)
/// - [`Subscribe::none()`]  - receive nothing (e.g. pure producers)
/// - [`Subscribe::to`] - receive actions of specific types
///
/// For convenience, slices and arrays of action types convert to `Subscribe`
/// automatically:
///
/// ```ignore
/// // These are equivalent:
/// store.add_effect("auth", factory, &["LOGIN", "LOGOUT"])?;
/// store.add_effect("auth", factory, Subscribe::to(["LOGIN", "LOGOUT"]))?;
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscribe<P>(
    pub(crate) Subscription,
    PhantomData<fn() -> P>, // invariant over P
);

impl<P> Subscribe<P> {
    /// Subscribe to every action type.
    pub fn all() -> Self {
        Subscribe(Subscription::All, PhantomData)
    }

    /// Subscribe to nothing.
    pub fn none() -> Self {
        Subscribe(Subscription::None, PhantomData)
    }

    /// Subscribe to specific action types.
    ///
    /// Accepts any iterator of items convertible to [`ActionType`]:
    /// ```ignore
    /// Subscribe::to(["LOGIN", "LOGOUT"])
    /// Subscribe::to(vec![ActionType::SUCCESS])
    /// ```
    pub fn to<A: Into<ActionType>>(types: impl IntoIterator<Item = A>) -> Self {
        let set = types.into_iter().map(Into::into).collect::<HashSet<_>>();
        Subscribe(Subscription::Types(set), PhantomData)
    }
}

impl<P> From<&[&'static str]> for Subscribe<P> {
    fn from(types: &[&'static str]) -> Self {
        Subscribe::to(types.iter().copied())
    }
}

impl<P, const N: usize> From<[&'static str; N]> for Subscribe<P> {
    fn from(types: [&'static str; N]) -> Self {
        Subscribe::to(types)
    }
}

impl<P, const N: usize> From<&[&'static str; N]> for Subscribe<P> {
    fn from(types: &[&'static str; N]) -> Self {
        Subscribe::to(types.iter().copied())
    }
}

impl<P, const N: usize> From<[ActionType; N]> for Subscribe<P> {
    fn from(types: [ActionType; N]) -> Self {
        Subscribe::to(types)
    }
}

impl<P> From<ActionType> for Subscribe<P> {
    fn from(action_type: ActionType) -> Self {
        Subscribe::to([action_type])
    }
}
