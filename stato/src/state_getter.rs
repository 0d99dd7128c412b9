use std::{
    fmt,
    sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

/// Read access to the current state of a running [`Store`](crate::Store).
///
/// This is the `getState` accessor handed to listener-style subscriptions.
/// It is cheap to clone; every clone observes the same store.
///
/// ```ignore
/// let getter = store.getter();
/// let mut on_change = states.on_state_change(move || getter.get());
/// ```
pub struct StateGetter<S> {
    state: Arc<RwLock<S>>,
}

impl<S> StateGetter<S> {
    pub(crate) fn new(initial: S) -> Self {
        Self {
            state: Arc::new(RwLock::new(initial)),
        }
    }

    /// Run `f` against the current state without cloning it.
    pub fn with<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(&self.read())
    }

    pub(crate) fn read(&self) -> RwLockReadGuard<'_, S> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn write(&self) -> RwLockWriteGuard<'_, S> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<S: Clone> StateGetter<S> {
    /// Returns a snapshot of the current state.
    pub fn get(&self) -> S {
        self.read().clone()
    }
}

impl<S> Clone for StateGetter<S> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
        }
    }
}

impl<S: fmt::Debug> fmt::Debug for StateGetter<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("StateGetter").field(&*self.read()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_state() {
        let getter = StateGetter::new(1_u32);
        let other = getter.clone();
        *getter.write() = 2;
        assert_eq!(other.get(), 2);
        assert_eq!(other.with(|s| s + 1), 3);
    }
}
