use std::{hash::Hash, sync::Arc};

/// Identity of whoever dispatched an action.
///
/// Actions dispatched through [`Store::dispatch`](crate::Store::dispatch) carry
/// [`SourceId::STORE`]; actions dispatched by an effect carry the name the
/// effect was registered under. The id also names effects when stopping them.
///
/// `SourceId` is cheap to clone. Equality uses string comparison with a
/// fast-path for pointer equality when ids share the same allocation.
///
/// # Example
///
/// ```ignore
/// let auth = store.add_effect("auth", |ctx| AuthEffect { ctx }, &["LOGIN"])?;
///
/// // Later, on a dispatched action:
/// if action.meta().source() == &auth {
///     // dispatched by the auth effect
/// }
/// ```
#[derive(Debug, Clone, Ord, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SourceId(Arc<str>);

impl SourceId {
    /// Name used for actions dispatched directly on the store.
    pub const STORE: &'static str = "store";

    pub fn new(id: &str) -> Self {
        Self(Arc::from(id))
    }

    pub(crate) fn store() -> Self {
        Self::new(Self::STORE)
    }

    /// Returns the string representation of this source id.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl PartialEq for SourceId {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0 == other.0
    }
}

impl Eq for SourceId {}

impl std::fmt::Display for SourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Hash for SourceId {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl From<&str> for SourceId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for SourceId {
    fn from(s: String) -> Self {
        Self(Arc::from(s))
    }
}

impl PartialEq<str> for SourceId {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for SourceId {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}
