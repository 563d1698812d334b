use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::Hash;

use super::handle::{Handle, RegistryTag};

/// An entity that can be deduplicated by an identity key.
///
/// Two registrations whose keys are equal refer to the same entity. The key
/// must not depend on fields that change through in-place modification
/// (scores, coverage), otherwise [`Registry::modify`] would corrupt the index.
pub trait Identified {
    type Key: Eq + Hash + Clone + fmt::Debug;

    fn identity_key(&self) -> Self::Key;
}

/// Outcome of [`Registry::update_key`]
#[derive(Debug, PartialEq, Eq)]
pub enum KeyUpdate<T> {
    /// The entity was modified and re-indexed under its new key
    Updated,
    /// The new key already belonged to another entity; the modified entity
    /// was removed and the surviving handle is returned
    Duplicate(Handle<T>),
    /// The handle did not resolve
    Missing,
}

/// Insert-or-find container for one entity type.
///
/// Entities live in an append-only arena; removal leaves an empty slot so
/// that handles are never invalidated by growth and never alias a later
/// entity.
#[derive(Debug)]
pub struct Registry<T: Identified> {
    tag: RegistryTag,

    /// Arena of entities; `None` marks a removed entry
    slots: Vec<Option<T>>,

    /// Index: identity key -> slot
    key_to_slot: HashMap<T::Key, usize>,

    /// Number of live entries
    live: usize,
}

impl<T: Identified> Registry<T> {
    /// Create an empty registry with a fresh tag
    pub fn new() -> Self {
        Self {
            tag: RegistryTag::next(),
            slots: Vec::new(),
            key_to_slot: HashMap::new(),
            live: 0,
        }
    }

    /// Insert `item` unless an entity with the same identity key exists.
    ///
    /// Returns the handle of the stored entity and whether it was newly
    /// inserted. An existing entity is left untouched.
    pub fn insert_or_get(&mut self, item: T) -> (Handle<T>, bool) {
        let key = item.identity_key();
        if let Some(&slot) = self.key_to_slot.get(&key) {
            return (Handle::new(self.tag, slot), false);
        }

        let slot = self.slots.len();
        self.key_to_slot.insert(key, slot);
        self.slots.push(Some(item));
        self.live += 1;
        (Handle::new(self.tag, slot), true)
    }

    /// Handle of the entity stored under `key`, if any
    pub fn find(&self, key: &T::Key) -> Option<Handle<T>> {
        self.key_to_slot
            .get(key)
            .map(|&slot| Handle::new(self.tag, slot))
    }

    /// True iff `handle` was issued by this registry and still resolves
    pub fn is_valid(&self, handle: Handle<T>) -> bool {
        self.get(handle).is_some()
    }

    /// Resolve a handle
    pub fn get(&self, handle: Handle<T>) -> Option<&T> {
        if handle.registry() != self.tag {
            return None;
        }
        self.slots.get(handle.index()).and_then(Option::as_ref)
    }

    /// Modify an entity in place without changing its identity key.
    ///
    /// Returns `false` if the handle does not resolve.
    pub fn modify(&mut self, handle: Handle<T>, f: impl FnOnce(&mut T)) -> bool {
        if handle.registry() != self.tag {
            return false;
        }
        match self.slots.get_mut(handle.index()).and_then(Option::as_mut) {
            Some(item) => {
                #[cfg(debug_assertions)]
                let before = item.identity_key();
                f(item);
                #[cfg(debug_assertions)]
                assert!(
                    before == item.identity_key(),
                    "in-place modification changed the identity key"
                );
                true
            }
            None => false,
        }
    }

    /// Modify an entity in a way that may change its identity key.
    ///
    /// If the new key collides with another live entity, the modified entity
    /// is removed and the other entity's handle is returned.
    pub fn update_key(&mut self, handle: Handle<T>, f: impl FnOnce(&mut T)) -> KeyUpdate<T> {
        if !self.is_valid(handle) {
            return KeyUpdate::Missing;
        }
        let slot = handle.index();
        let Some(item) = self.slots[slot].as_mut() else {
            return KeyUpdate::Missing;
        };

        let old_key = item.identity_key();
        f(item);
        let new_key = item.identity_key();
        if old_key == new_key {
            return KeyUpdate::Updated;
        }

        self.key_to_slot.remove(&old_key);
        if let Some(&other) = self.key_to_slot.get(&new_key) {
            self.slots[slot] = None;
            self.live -= 1;
            return KeyUpdate::Duplicate(Handle::new(self.tag, other));
        }
        self.key_to_slot.insert(new_key, slot);
        KeyUpdate::Updated
    }

    /// Remove an entity, returning it if the handle resolved
    pub fn remove(&mut self, handle: Handle<T>) -> Option<T> {
        if handle.registry() != self.tag {
            return None;
        }
        let item = self.slots.get_mut(handle.index())?.take()?;
        self.key_to_slot.remove(&item.identity_key());
        self.live -= 1;
        Some(item)
    }

    /// Keep only entities for which `keep` returns true.
    ///
    /// Returns the number of removed entities.
    pub fn retain(&mut self, mut keep: impl FnMut(Handle<T>, &T) -> bool) -> usize {
        let doomed: Vec<Handle<T>> = self
            .iter()
            .filter(|(handle, item)| !keep(*handle, item))
            .map(|(handle, _)| handle)
            .collect();
        for handle in &doomed {
            self.remove(*handle);
        }
        doomed.len()
    }

    /// Keep only entities whose handles are in `referenced`
    pub fn retain_referenced(&mut self, referenced: &HashSet<Handle<T>>) -> usize {
        self.retain(|handle, _| referenced.contains(&handle))
    }

    /// Live entities in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (Handle<T>, &T)> + '_ {
        let tag = self.tag;
        self.slots
            .iter()
            .enumerate()
            .filter_map(move |(slot, item)| {
                item.as_ref().map(|item| (Handle::new(tag, slot), item))
            })
    }

    /// Handles of all live entities in insertion order
    pub fn handles(&self) -> Vec<Handle<T>> {
        self.iter().map(|(handle, _)| handle).collect()
    }

    /// Number of live entities
    pub fn len(&self) -> usize {
        self.live
    }

    /// Check if the registry holds no live entities
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }
}

impl<T: Identified> Default for Registry<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[derive(Debug, Clone, PartialEq)]
    struct Named {
        name: String,
        weight: f64,
    }

    impl Named {
        fn new(name: &str, weight: f64) -> Self {
            Self {
                name: name.to_string(),
                weight,
            }
        }
    }

    impl Identified for Named {
        type Key = String;

        fn identity_key(&self) -> String {
            self.name.clone()
        }
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct Members(BTreeSet<u32>);

    impl Identified for Members {
        type Key = BTreeSet<u32>;

        fn identity_key(&self) -> BTreeSet<u32> {
            self.0.clone()
        }
    }

    #[test]
    fn test_insert_or_get_deduplicates() {
        let mut registry = Registry::new();
        let (first, inserted) = registry.insert_or_get(Named::new("a", 1.0));
        assert!(inserted);

        let (second, inserted) = registry.insert_or_get(Named::new("a", 2.0));
        assert!(!inserted);
        assert_eq!(first, second);
        assert_eq!(registry.len(), 1);
        // existing entry is not overwritten
        assert!((registry.get(first).unwrap().weight - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_handles_survive_growth() {
        let mut registry = Registry::new();
        let (first, _) = registry.insert_or_get(Named::new("first", 0.0));
        for i in 0..1000 {
            registry.insert_or_get(Named::new(&format!("n{i}"), 0.0));
        }
        assert_eq!(registry.get(first).unwrap().name, "first");
    }

    #[test]
    fn test_foreign_handle_is_invalid() {
        let mut a = Registry::new();
        let mut b = Registry::new();
        let (handle_a, _) = a.insert_or_get(Named::new("x", 0.0));
        b.insert_or_get(Named::new("x", 0.0));

        assert!(a.is_valid(handle_a));
        assert!(!b.is_valid(handle_a));
    }

    #[test]
    fn test_remove_invalidates_without_reuse() {
        let mut registry = Registry::new();
        let (a, _) = registry.insert_or_get(Named::new("a", 0.0));
        assert!(registry.remove(a).is_some());
        assert!(!registry.is_valid(a));
        assert!(registry.is_empty());

        // re-registering creates a new slot rather than reviving the old handle
        let (again, inserted) = registry.insert_or_get(Named::new("a", 0.0));
        assert!(inserted);
        assert_ne!(a, again);
        assert!(!registry.is_valid(a));
    }

    #[test]
    fn test_modify_in_place() {
        let mut registry = Registry::new();
        let (a, _) = registry.insert_or_get(Named::new("a", 0.0));
        assert!(registry.modify(a, |item| item.weight = 0.5));
        assert!((registry.get(a).unwrap().weight - 0.5).abs() < f64::EPSILON);

        registry.remove(a);
        assert!(!registry.modify(a, |item| item.weight = 1.0));
    }

    #[test]
    fn test_retain_preserves_order() {
        let mut registry = Registry::new();
        for name in ["a", "b", "c", "d"] {
            registry.insert_or_get(Named::new(name, 0.0));
        }
        let removed = registry.retain(|_, item| item.name != "b" && item.name != "d");
        assert_eq!(removed, 2);

        let names: Vec<&str> = registry.iter().map(|(_, item)| item.name.as_str()).collect();
        assert_eq!(names, vec!["a", "c"]);
    }

    #[test]
    fn test_update_key_reindexes() {
        let mut registry = Registry::new();
        let (h, _) = registry.insert_or_get(Members([1, 2].into_iter().collect()));

        let update = registry.update_key(h, |m| {
            m.0.remove(&2);
        });
        assert_eq!(update, KeyUpdate::Updated);
        assert_eq!(registry.find(&[1].into_iter().collect()), Some(h));
        assert_eq!(registry.find(&[1, 2].into_iter().collect()), None);
    }

    #[test]
    fn test_update_key_collision_drops_modified_entry() {
        let mut registry = Registry::new();
        let (keep, _) = registry.insert_or_get(Members([1].into_iter().collect()));
        let (merge, _) = registry.insert_or_get(Members([1, 3].into_iter().collect()));

        let update = registry.update_key(merge, |m| {
            m.0.remove(&3);
        });
        assert_eq!(update, KeyUpdate::Duplicate(keep));
        assert!(!registry.is_valid(merge));
        assert_eq!(registry.len(), 1);
    }
}
