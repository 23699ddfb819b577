//! View state - selection cursor, filters and sort order of one entity list
//!
//! The state is a plain value owned by the caller and passed into the
//! operations that need it. Nothing in the store or the inventory keeps a
//! hidden "current selection".

use crate::core::entity::Entity;
use crate::core::filter::{self, PageMode, Predicate};
use crate::core::sort::{self, SortKey};
use crate::core::store::EntityStore;
use crate::schema::FieldId;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewState {
    selected: Option<usize>,
    predicates: Vec<Predicate>,
    page_mode: PageMode,
    sort: Option<SortKey>,
}

impl ViewState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_filter_predicates(&mut self, predicates: Vec<Predicate>) {
        self.predicates = predicates;
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn set_page_mode(&mut self, mode: PageMode) {
        self.page_mode = mode;
    }

    pub fn page_mode(&self) -> PageMode {
        self.page_mode
    }

    /// Sort by a field; asking for the current field again flips direction
    ///
    /// Every call re-sorts the view, so callers should treat the returned key
    /// as a resort event (reset scroll position and the like).
    pub fn sort_by(&mut self, field: FieldId) -> SortKey {
        let key = match self.sort {
            Some(current) if current.field == field => SortKey {
                field,
                descending: !current.descending,
            },
            _ => SortKey::ascending(field),
        };
        self.sort = Some(key);
        key
    }

    pub fn set_sort(&mut self, key: Option<SortKey>) {
        self.sort = key;
    }

    pub fn sort_key(&self) -> Option<SortKey> {
        self.sort
    }

    /// Store index of the selected entity
    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn select(&mut self, index: Option<usize>) {
        self.selected = index;
    }

    /// Select the entity with this id, clearing the cursor if it is gone
    pub fn select_id<E: Entity>(&mut self, store: &EntityStore<E>, id: &str) {
        self.selected = store.position(id);
    }

    /// Resolve the cursor against the store as it is now
    pub fn selected_entity<'a, E: Entity>(&self, store: &'a EntityStore<E>) -> Option<&'a E> {
        self.selected.and_then(|idx| store.get(idx))
    }

    /// Fix the cursor after the entity at `removed` left a store that now
    /// holds `remaining` entities
    pub fn after_remove(&mut self, removed: usize, remaining: usize) {
        self.selected = match self.selected {
            None => None,
            Some(_) if remaining == 0 => None,
            Some(sel) if sel > removed => Some(sel - 1),
            Some(sel) => Some(sel.min(remaining - 1)),
        };
    }

    /// Pull a stale cursor back inside a store of `len` entities
    pub fn clamp(&mut self, len: usize) {
        if let Some(sel) = self.selected {
            self.selected = if len == 0 { None } else { Some(sel.min(len - 1)) };
        }
    }

    /// Store indices that pass the filters, in display order
    pub fn visible_indices<E: Entity>(&self, store: &EntityStore<E>) -> Vec<usize> {
        let mut indices: Vec<usize> = store
            .iter()
            .enumerate()
            .filter(|(_, e)| filter::matches(*e, &self.predicates, self.page_mode))
            .map(|(idx, _)| idx)
            .collect();
        if let Some(key) = self.sort {
            sort::sort_indices(store, &mut indices, key);
        }
        indices
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::value;
    use crate::entities::Item;

    fn store() -> EntityStore<Item> {
        [("AAAAA", "Zener", "3"), ("BBBBB", "Anode", "0"), ("CCCCC", "Mosfet", "7")]
            .iter()
            .map(|(id, name, qty)| {
                let mut item = Item::new(id.to_string(), value::now());
                item.set_field_text(FieldId::ItemName, name).unwrap();
                item.set_field_text(FieldId::ItemQuantity, qty).unwrap();
                item
            })
            .collect()
    }

    #[test]
    fn test_sort_by_toggles_direction() {
        let mut view = ViewState::new();
        assert!(!view.sort_by(FieldId::ItemName).descending);
        assert!(view.sort_by(FieldId::ItemName).descending);
        assert!(!view.sort_by(FieldId::ItemQuantity).descending);
    }

    #[test]
    fn test_visible_indices_filter_and_sort() {
        let store = store();
        let mut view = ViewState::new();
        assert_eq!(view.visible_indices(&store), vec![0, 1, 2]);

        view.sort_by(FieldId::ItemName);
        assert_eq!(view.visible_indices(&store), vec![1, 2, 0]);

        view.set_page_mode(PageMode::OutOfStock);
        assert_eq!(view.visible_indices(&store), vec![1]);

        view.set_page_mode(PageMode::Normal);
        view.set_filter_predicates(vec![Predicate::new(FieldId::ItemQuantity, "!>2")]);
        assert_eq!(view.visible_indices(&store), vec![2, 0]);
    }

    #[test]
    fn test_after_remove_decrements_later_selection() {
        let mut view = ViewState::new();
        view.select(Some(2));
        view.after_remove(0, 2);
        assert_eq!(view.selected(), Some(1));
    }

    #[test]
    fn test_after_remove_clamps_selected_last() {
        let mut view = ViewState::new();
        view.select(Some(2));
        view.after_remove(2, 2);
        assert_eq!(view.selected(), Some(1));
    }

    #[test]
    fn test_after_remove_keeps_earlier_selection() {
        let mut view = ViewState::new();
        view.select(Some(0));
        view.after_remove(1, 2);
        assert_eq!(view.selected(), Some(0));
    }

    #[test]
    fn test_after_remove_sole_entity_clears() {
        let mut view = ViewState::new();
        view.select(Some(0));
        view.after_remove(0, 0);
        assert_eq!(view.selected(), None);
    }

    #[test]
    fn test_clamp_and_resolve() {
        let store = store();
        let mut view = ViewState::new();
        view.select(Some(9));
        assert!(view.selected_entity(&store).is_none());
        view.clamp(store.count());
        assert_eq!(view.selected_entity(&store).map(|i| i.id()), Some("CCCCC"));

        view.select_id(&store, "BBBBB");
        assert_eq!(view.selected(), Some(1));
        view.select_id(&store, "ZZZZZ");
        assert_eq!(view.selected(), None);
    }
}
