//! This module provides `Registry`, the by-name container shared by machines (which
//! store states) and projects (which store machines).
//!
//! Entities live in append-only slots addressed by a typed `Handle`, while a hash
//! index maps the current name of every live entity to its slot. Handles stay valid
//! across renames and are never reused after a removal, so other parts of the graph
//! (transition destinations, simulation frames) can refer to an entity without owning
//! it.

use crate::types::ModelError;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::sync::atomic::{AtomicUsize, Ordering};

static NEXT_REGISTRY_ID: AtomicUsize = AtomicUsize::new(0);

mod sealed {
    /// Renaming is reserved to the owning `Registry`, which keeps its index in sync.
    pub trait Rename {
        fn rename(&mut self, name: String);
    }
}

pub(crate) use sealed::Rename;

/// An entity stored by name.
pub trait Named: sealed::Rename {
    /// Returns the current name of the entity.
    fn name(&self) -> &str;
}

/// A stable, non-owning reference to an entity stored in a `Registry`.
///
/// A handle only resolves in the registry that issued it (or a clone of that
/// registry); any other registry treats it as unknown.
pub struct Handle<T> {
    registry: usize,
    index: usize,
    marker: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    fn new(registry: usize, index: usize) -> Self {
        Self {
            registry,
            index,
            marker: PhantomData,
        }
    }

    /// Returns the slot index behind this handle.
    pub fn index(&self) -> usize {
        self.index
    }
}

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

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({}:{})", self.registry, self.index)
    }
}

/// Container that stores entities by their names and tracks their name changes.
/// Two live entities never share a name.
///
/// Removal leaves an empty slot behind rather than compacting, so memory grows with
/// the number of entities ever added. That is the price of handles that never
/// dangle onto a different entity.
///
/// A clone keeps the identity of its source, so handles taken before cloning
/// resolve in both copies.
#[derive(Debug, Clone)]
pub struct Registry<T> {
    id: usize,
    slots: Vec<Option<T>>,
    by_name: HashMap<String, usize>,
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self {
            id: NEXT_REGISTRY_ID.fetch_add(1, Ordering::Relaxed),
            slots: Vec::new(),
            by_name: HashMap::new(),
        }
    }
}

impl<T: Named> Registry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entity under its current name.
    ///
    /// # Returns
    ///
    /// * `Ok(Handle)` addressing the stored entity.
    /// * `Err(ModelError::NameInUse)` if the name is taken; the entity is dropped and
    ///   the registry is unchanged.
    pub fn add(&mut self, entity: T) -> Result<Handle<T>, ModelError> {
        let name = entity.name().to_string();
        if self.by_name.contains_key(&name) {
            return Err(ModelError::NameInUse(name));
        }

        let index = self.slots.len();
        self.slots.push(Some(entity));
        self.by_name.insert(name, index);
        Ok(Handle::new(self.id, index))
    }

    pub fn get(&self, name: &str) -> Option<&T> {
        self.by_name
            .get(name)
            .and_then(|&index| self.slots[index].as_ref())
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut T> {
        match self.by_name.get(name) {
            Some(&index) => self.slots[index].as_mut(),
            None => None,
        }
    }

    pub fn handle_of(&self, name: &str) -> Option<Handle<T>> {
        self.by_name
            .get(name)
            .map(|&index| Handle::new(self.id, index))
    }

    /// Resolves a handle. Returns `None` once the entity has been removed, or if the
    /// handle was issued by another registry.
    pub fn by_handle(&self, handle: Handle<T>) -> Option<&T> {
        if !self.issued(handle) {
            return None;
        }
        self.slots.get(handle.index).and_then(Option::as_ref)
    }

    pub fn by_handle_mut(&mut self, handle: Handle<T>) -> Option<&mut T> {
        if !self.issued(handle) {
            return None;
        }
        self.slots.get_mut(handle.index).and_then(Option::as_mut)
    }

    fn issued(&self, handle: Handle<T>) -> bool {
        handle.registry == self.id
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Removes an entity by name. Removing an unknown name does nothing.
    pub fn remove(&mut self, name: &str) -> Option<(Handle<T>, T)> {
        let index = self.by_name.remove(name)?;
        self.slots[index]
            .take()
            .map(|entity| (Handle::new(self.id, index), entity))
    }

    /// Renames the entity behind `handle`.
    ///
    /// The new name is reserved first; only when it is free is the entity renamed and
    /// re-keyed. Renaming to the entity's own current name counts as a clash, since
    /// the name is claimed.
    pub fn rename(&mut self, handle: Handle<T>, new_name: &str) -> Result<(), ModelError> {
        if self.by_name.contains_key(new_name) {
            return Err(ModelError::NameInUse(new_name.to_string()));
        }

        let entity = self
            .by_handle_mut(handle)
            .ok_or_else(|| ModelError::NotFound(format!("{:?}", handle)))?;

        let old_name = entity.name().to_string();
        entity.rename(new_name.to_string());
        self.by_name.remove(&old_name);
        self.by_name.insert(new_name.to_string(), handle.index);
        Ok(())
    }

    /// Iterates over the names of all live entities, in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.iter().map(|(_, entity)| entity.name())
    }

    /// Iterates over all live entities, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (Handle<T>, &T)> {
        let id = self.id;
        self.slots
            .iter()
            .enumerate()
            .filter_map(move |(index, slot)| {
                slot.as_ref().map(|entity| (Handle::new(id, index), entity))
            })
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Handle<T>, &mut T)> {
        let id = self.id;
        self.slots
            .iter_mut()
            .enumerate()
            .filter_map(move |(index, slot)| {
                slot.as_mut().map(|entity| (Handle::new(id, index), entity))
            })
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone)]
    struct Item {
        name: String,
    }

    impl Item {
        fn new(name: &str) -> Self {
            Self {
                name: name.to_string(),
            }
        }
    }

    impl Rename for Item {
        fn rename(&mut self, name: String) {
            self.name = name;
        }
    }

    impl Named for Item {
        fn name(&self) -> &str {
            &self.name
        }
    }

    #[test]
    fn test_add_and_get() {
        let mut registry = Registry::new();
        let handle = registry.add(Item::new("a")).unwrap();

        assert_eq!(registry.get("a").unwrap().name(), "a");
        assert_eq!(registry.handle_of("a"), Some(handle));
        assert_eq!(registry.by_handle(handle).unwrap().name(), "a");
        assert!(registry.get("b").is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_add_duplicate_name_fails() {
        let mut registry = Registry::new();
        registry.add(Item::new("a")).unwrap();

        let result = registry.add(Item::new("a"));
        assert_eq!(result.unwrap_err(), ModelError::NameInUse("a".to_string()));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_remove_is_noop_when_absent() {
        let mut registry = Registry::new();
        let handle = registry.add(Item::new("a")).unwrap();

        assert!(registry.remove("missing").is_none());
        assert_eq!(registry.len(), 1);

        let (removed_handle, removed) = registry.remove("a").unwrap();
        assert_eq!(removed_handle, handle);
        assert_eq!(removed.name(), "a");
        assert!(registry.by_handle(handle).is_none());
        assert!(registry.remove("a").is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_handles_are_not_reused() {
        let mut registry = Registry::new();
        let first = registry.add(Item::new("a")).unwrap();
        registry.remove("a");
        let second = registry.add(Item::new("a")).unwrap();

        assert_ne!(first, second);
        assert!(registry.by_handle(first).is_none());
    }

    #[test]
    fn test_rename_rekeys() {
        let mut registry = Registry::new();
        let handle = registry.add(Item::new("a")).unwrap();

        registry.rename(handle, "b").unwrap();

        assert!(registry.get("a").is_none());
        assert_eq!(registry.get("b").unwrap().name(), "b");
        assert_eq!(registry.handle_of("b"), Some(handle));
    }

    #[test]
    fn test_rename_to_taken_name_leaves_everything_unchanged() {
        let mut registry = Registry::new();
        let a = registry.add(Item::new("a")).unwrap();
        registry.add(Item::new("b")).unwrap();

        assert_eq!(
            registry.rename(a, "b"),
            Err(ModelError::NameInUse("b".to_string()))
        );
        assert_eq!(
            registry.rename(a, "a"),
            Err(ModelError::NameInUse("a".to_string()))
        );
        assert_eq!(registry.by_handle(a).unwrap().name(), "a");
        assert_eq!(registry.handle_of("a"), Some(a));

        // A rejected rename is retryable with a free name.
        registry.rename(a, "c").unwrap();
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["c", "b"]);
    }

    #[test]
    fn test_handle_from_other_registry_does_not_resolve() {
        let mut first = Registry::new();
        let mut second = Registry::new();
        let foreign = first.add(Item::new("a")).unwrap();
        let local = second.add(Item::new("b")).unwrap();

        assert_eq!(foreign.index(), local.index());
        assert_ne!(foreign, local);
        assert!(second.by_handle(foreign).is_none());
        assert!(second.by_handle_mut(foreign).is_none());
        assert!(matches!(
            second.rename(foreign, "c"),
            Err(ModelError::NotFound(_))
        ));
        assert_eq!(second.by_handle(local).unwrap().name(), "b");
    }

    #[test]
    fn test_clone_resolves_existing_handles() {
        let mut registry = Registry::new();
        let handle = registry.add(Item::new("a")).unwrap();
        let copy = registry.clone();

        assert_eq!(copy.by_handle(handle).unwrap().name(), "a");
    }

    #[test]
    fn test_rename_removed_handle_fails() {
        let mut registry = Registry::new();
        let handle = registry.add(Item::new("a")).unwrap();
        registry.remove("a");

        assert!(matches!(
            registry.rename(handle, "b"),
            Err(ModelError::NotFound(_))
        ));
        assert!(!registry.contains("b"));
    }
}
