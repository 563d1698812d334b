use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU32, Ordering as AtomicOrdering};

static NEXT_TAG: AtomicU32 = AtomicU32::new(1);

/// Identifies one registry instance. Handles carry the tag of the registry
/// that issued them, so a handle from another registry never resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegistryTag(u32);

impl RegistryTag {
    pub(crate) fn next() -> Self {
        Self(NEXT_TAG.fetch_add(1, AtomicOrdering::Relaxed))
    }
}

impl fmt::Display for RegistryTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stable reference to an entity stored in a [`Registry`](super::store::Registry).
///
/// A handle is a `(registry tag, slot index)` pair. Slots are never reused, so
/// a handle stays valid across any number of further insertions and only
/// stops resolving once cleanup removes the entity it points to.
pub struct Handle<T> {
    registry: RegistryTag,
    index: usize,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    pub(crate) fn new(registry: RegistryTag, index: usize) -> Self {
        Self {
            registry,
            index,
            _marker: PhantomData,
        }
    }

    /// Tag of the registry that issued this handle
    #[must_use]
    pub fn registry(&self) -> RegistryTag {
        self.registry
    }

    /// Slot index inside the issuing registry (insertion order)
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }
}

// Manual impls: deriving would put bounds on `T`, which is only a marker.
impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.registry == other.registry && self.index == other.index
    }
}

impl<T> Eq for Handle<T> {}

impl<T> Hash for Handle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.registry.hash(state);
        self.index.hash(state);
    }
}

impl<T> PartialOrd for Handle<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Handle<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.registry, self.index).cmp(&(other.registry, other.index))
    }
}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({}:{})", self.registry, self.index)
    }
}
