//! Entity store - ordered, insertion-order collection of one entity kind
//!
//! The store never tracks a selection. Callers keep their own cursor in a
//! [`ViewState`](crate::core::view::ViewState) and resolve entities by id at
//! the moment they act on them.

use crate::core::entity::Entity;

#[derive(Debug, Clone, PartialEq)]
pub struct EntityStore<T> {
    entries: Vec<T>,
}

impl<T> Default for EntityStore<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T> EntityStore<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append at the end, returning the new index
    pub fn append(&mut self, entity: T) -> usize {
        self.entries.push(entity);
        self.entries.len() - 1
    }

    /// Remove the entity at `index`; later entities shift down by one
    pub fn remove_at(&mut self, index: usize) -> Option<T> {
        if index < self.entries.len() {
            Some(self.entries.remove(index))
        } else {
            None
        }
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.entries.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.entries.get_mut(index)
    }

    /// Iterate in insertion order
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.entries.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.entries.iter_mut()
    }

    pub fn count(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T: Entity> EntityStore<T> {
    /// Index of the entity with this id
    pub fn position(&self, id: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.id() == id)
    }

    pub fn find(&self, id: &str) -> Option<&T> {
        self.entries.iter().find(|e| e.id() == id)
    }

    pub fn find_mut(&mut self, id: &str) -> Option<&mut T> {
        self.entries.iter_mut().find(|e| e.id() == id)
    }

    pub fn contains_id(&self, id: &str) -> bool {
        self.position(id).is_some()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.id())
    }
}

impl<T> FromIterator<T> for EntityStore<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl<'a, T> IntoIterator for &'a EntityStore<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::value;
    use crate::entities::Item;

    fn store_of(ids: &[&str]) -> EntityStore<Item> {
        ids.iter()
            .map(|id| Item::new(id.to_string(), value::now()))
            .collect()
    }

    #[test]
    fn test_append_and_get() {
        let mut store = EntityStore::new();
        assert!(store.is_empty());
        let idx = store.append(Item::new("AAAAA".into(), value::now()));
        assert_eq!(idx, 0);
        assert_eq!(store.count(), 1);
        assert_eq!(store.get(0).map(|i| i.id()), Some("AAAAA"));
        assert!(store.get(1).is_none());
    }

    #[test]
    fn test_remove_shifts_down() {
        let mut store = store_of(&["AAAAA", "BBBBB", "CCCCC"]);
        let removed = store.remove_at(1).unwrap();
        assert_eq!(removed.id(), "BBBBB");
        assert_eq!(store.count(), 2);
        assert_eq!(store.get(1).map(|i| i.id()), Some("CCCCC"));
        assert!(store.remove_at(5).is_none());
    }

    #[test]
    fn test_iteration_is_restartable() {
        let store = store_of(&["AAAAA", "BBBBB"]);
        let first: Vec<_> = store.iter().map(|i| i.id()).collect();
        let second: Vec<_> = store.iter().map(|i| i.id()).collect();
        assert_eq!(first, second);
        assert_eq!(first, vec!["AAAAA", "BBBBB"]);
    }

    #[test]
    fn test_lookup_by_id() {
        let store = store_of(&["AAAAA", "BBBBB"]);
        assert_eq!(store.position("BBBBB"), Some(1));
        assert!(store.find("ZZZZZ").is_none());
        assert!(store.contains_id("AAAAA"));
        assert_eq!(store.ids().collect::<Vec<_>>(), vec!["AAAAA", "BBBBB"]);
    }
}
