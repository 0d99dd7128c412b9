use std::{fmt, hash, time::SystemTime};

use crate::{ActionId, ActionType, SourceId};

/// Metadata attached to every [`Action`](crate::Action).
///
/// - `id`: unique action identifier (UUID v4, not monotonic).
/// - `timestamp`: creation time in nanoseconds since Unix epoch (`u64`).
/// - `source`: the store or effect that dispatched the action.
/// - `related`: optional link to the action this one follows up. Set by
///   [`Action::success`](crate::Action::success), [`Action::error`](crate::Action::error)
///   and [`Context::succeed`](crate::Context::succeed) / [`Context::fail`](crate::Context::fail).
#[derive(Debug, Clone, PartialEq, Eq, hash::Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Meta {
    id: ActionId,
    timestamp: u64,
    source: SourceId,
    related: Option<RelatedAction>,
}

/// Link from a follow-up action back to the action that triggered it.
#[derive(Debug, Clone, PartialEq, Eq, hash::Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RelatedAction {
    id: ActionId,
    action_type: ActionType,
}

impl RelatedAction {
    pub fn new(id: ActionId, action_type: ActionType) -> Self {
        Self { id, action_type }
    }

    #[inline]
    pub fn id(&self) -> ActionId {
        self.id
    }

    #[inline]
    pub fn action_type(&self) -> &ActionType {
        &self.action_type
    }
}

impl Meta {
    /// Construct metadata for the given source and optional related action.
    ///
    /// A system clock set before the Unix epoch yields a zero timestamp.
    pub fn new(source: SourceId, related: Option<RelatedAction>) -> Self {
        Self {
            id: ActionId::new(),
            timestamp: SystemTime::now()
                .duration_since(SystemTime::UNIX_EPOCH)
                .map(|d| d.as_nanos() as u64)
                .unwrap_or_default(),
            source,
            related,
        }
    }

    /// Unique identifier for this action.
    pub fn id(&self) -> ActionId {
        self.id
    }

    /// Timestamp in nanoseconds since Unix epoch (u64 truncation).
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    /// The store or effect that dispatched this action.
    pub fn source(&self) -> &SourceId {
        &self.source
    }

    /// Name of the store or effect that dispatched this action.
    pub fn source_name(&self) -> &str {
        self.source.as_str()
    }

    /// The action this one follows up, if any.
    pub fn related(&self) -> Option<&RelatedAction> {
        self.related.as_ref()
    }

    pub(crate) fn set_source(&mut self, source: SourceId) {
        self.source = source;
    }

    pub(crate) fn set_related(&mut self, related: RelatedAction) {
        self.related = Some(related);
    }
}

impl fmt::Display for Meta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Action Meta {{ id: {}, timestamp: {}, source: {}",
            self.id(),
            self.timestamp(),
            self.source_name(),
        )?;
        if let Some(related) = self.related() {
            write!(f, ", related: {} ({})", related.action_type(), related.id())?;
        }
        write!(f, "}}")?;
        Ok(())
    }
}
