//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Identity is a store-assigned surrogate key, so a freshly built entity has
/// none until it is persisted for the first time.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Copy + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier, `None` while transient.
    fn id(&self) -> Option<Self::Id>;

    /// True until the first successful persist.
    fn is_transient(&self) -> bool {
        self.id().is_none()
    }
}
