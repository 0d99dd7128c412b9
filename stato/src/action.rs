use std::{fmt, hash};

use crate::{ActionCategory, ActionId, ActionType, Meta, RelatedAction, SourceId};

/// The unit carried through the store's channels.
///
/// Every dispatched action travels as `Arc<Action<P>>` from its source through
/// the reducer, the state listeners and each subscribed effect. It pairs a
/// type tag and an optional payload with [`Meta`] (id, timestamp, source,
/// related action).
///
/// # Example
///
/// ```rust
/// use stato::{Action, ActionType};
///
/// let login = Action::new("LOGIN").with_payload("alice");
/// let done = Action::success(&login, None);
///
/// assert_eq!(done.action_type(), &ActionType::SUCCESS);
/// assert!(done.follows(&login));
/// ```
#[derive(Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(bound(
        serialize = "P: serde::Serialize",
        deserialize = "P: serde::de::DeserializeOwned"
    ))
)]
pub struct Action<P> {
    meta: Meta,
    action_type: ActionType,
    payload: Option<P>,
}

impl<P> Action<P> {
    /// Create an action without payload, tagged as dispatched by the store.
    pub fn new(action_type: impl Into<ActionType>) -> Self {
        Self {
            meta: Meta::new(SourceId::store(), None),
            action_type: action_type.into(),
            payload: None,
        }
    }

    /// Create a generic success follow-up of `related`.
    pub fn success(related: &Action<P>, payload: Option<P>) -> Self {
        Self {
            meta: Meta::new(SourceId::store(), Some(related.link())),
            action_type: ActionType::SUCCESS,
            payload,
        }
    }

    /// Create a generic error follow-up of `related`.
    pub fn error(related: &Action<P>, payload: P) -> Self {
        Self {
            meta: Meta::new(SourceId::store(), Some(related.link())),
            action_type: ActionType::ERROR,
            payload: Some(payload),
        }
    }

    pub fn with_payload(mut self, payload: P) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Link this action to the action it follows up.
    pub fn with_related(mut self, related: &Action<P>) -> Self {
        self.meta.set_related(related.link());
        self
    }

    /// Link this action to a related action known only by id and type.
    pub fn with_related_link(mut self, related: RelatedAction) -> Self {
        self.meta.set_related(related);
        self
    }

    pub(crate) fn with_source(mut self, source: SourceId) -> Self {
        self.meta.set_source(source);
        self
    }

    #[inline]
    pub fn action_type(&self) -> &ActionType {
        &self.action_type
    }

    #[inline]
    pub fn payload(&self) -> Option<&P> {
        self.payload.as_ref()
    }

    #[inline]
    pub fn meta(&self) -> &Meta {
        &self.meta
    }

    /// Shorthand for `self.meta().id()`.
    #[inline]
    pub fn id(&self) -> ActionId {
        self.meta.id()
    }

    #[inline]
    pub fn category(&self) -> ActionCategory {
        self.action_type.category()
    }

    /// Shorthand for `self.meta().related()`.
    #[inline]
    pub fn related(&self) -> Option<&RelatedAction> {
        self.meta.related()
    }

    /// Returns true if this action's related link points at `other`.
    pub fn follows(&self, other: &Action<P>) -> bool {
        self.related().is_some_and(|r| r.id() == other.id())
    }

    /// A link to this action, for use as another action's related action.
    pub fn link(&self) -> RelatedAction {
        RelatedAction::new(self.id(), self.action_type.clone())
    }
}

impl<P: PartialEq> PartialEq for Action<P> {
    fn eq(&self, other: &Self) -> bool {
        self.meta.id() == other.meta.id()
            && self.action_type == other.action_type
            && self.payload == other.payload
    }
}

impl<P: Eq> Eq for Action<P> {}

impl<P: hash::Hash> hash::Hash for Action<P> {
    fn hash<H: hash::Hasher>(&self, state: &mut H) {
        self.meta.id().hash(state);
        self.action_type.hash(state);
        self.payload.hash(state);
    }
}

impl<P: fmt::Debug> fmt::Debug for Action<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("type", &self.action_type)
            .field("payload", &self.payload)
            .field("id", &self.meta.id())
            .field("source", &self.meta.source_name())
            .field("related", &self.meta.related())
            .finish()
    }
}

impl<P: fmt::Display> fmt::Display for Action<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Action {{ type: {}", self.action_type)?;
        if let Some(payload) = &self.payload {
            write!(f, ", payload: {}", payload)?;
        }
        write!(f, ", source: {} }}", self.meta.source_name())
    }
}

impl<P> From<ActionType> for Action<P> {
    fn from(action_type: ActionType) -> Self {
        Action::new(action_type)
    }
}

impl<P> From<&'static str> for Action<P> {
    fn from(action_type: &'static str) -> Self {
        Action::new(action_type)
    }
}
