use crate::Action;

/// Maps the current state and a dispatched action to the next state.
///
/// The store calls the reducer once per dispatched action, on the store's
/// action loop task, before notifying state listeners. Any
/// `FnMut(S, &Action<P>) -> S + Send + 'static` closure is a reducer:
///
/// ```rust
/// use stato::{Action, Reducer};
///
/// let mut counter = |count: u32, action: &Action<()>| match action.action_type().as_str() {
///     "INCREMENT" => count + 1,
///     _ => count,
/// };
/// assert_eq!(counter.reduce(1, &Action::new("INCREMENT")), 2);
/// ```
///
/// Reducers are also where testers hook in: see
/// [`ActionTester::reducer`](crate::testing::ActionTester::reducer).
pub trait Reducer<S, P>: Send + 'static {
    fn reduce(&mut self, state: S, action: &Action<P>) -> S;
}

impl<S, P, F> Reducer<S, P> for F
where
    F: FnMut(S, &Action<P>) -> S + Send + 'static,
{
    fn reduce(&mut self, state: S, action: &Action<P>) -> S {
        self(state, action)
    }
}
