//! Inventory - the item and product stores plus view preferences
//!
//! All creation, deletion and editing goes through [`Inventory`] so ids stay
//! unique across items and products and every edit is coerced against the
//! schema. [`SharedInventory`] wraps one for callers that load or save from
//! more than one thread.

use miette::Diagnostic;
use std::collections::HashSet;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};
use thiserror::Error;

use crate::core::entity::{EditError, Entity};
use crate::core::filter::{self, PageMode};
use crate::core::identity;
use crate::core::persistence::{self, product_file_name, HeldFiles, PersistenceWarning};
use crate::core::prefs::VisibilityPrefs;
use crate::core::store::EntityStore;
use crate::core::value::{self, Value};
use crate::core::view::ViewState;
use crate::entities::{Item, Part, Product};
use crate::schema::{EntityKind, FieldId, SchemaError};

/// Inventory operation errors
#[derive(Debug, Clone, PartialEq, Error, Diagnostic)]
pub enum InventoryError {
    #[error("No {kind} with id '{id}'")]
    #[diagnostic(
        code(inventario::inventory::not_found),
        help("the entity may have been deleted; list the inventory again to refresh ids")
    )]
    NotFound { kind: EntityKind, id: String },

    #[error("Product '{0}' cannot contain itself")]
    #[diagnostic(code(inventario::inventory::self_reference))]
    SelfReference(String),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Edit(#[from] EditError),
}

/// Headline numbers of an inventory
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Summary {
    pub items: usize,
    pub products: usize,
    /// Quantity times cost (price for products), summed
    pub stock_value: f64,
    pub low_stock: usize,
    pub out_of_stock: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Inventory {
    pub items: EntityStore<Item>,
    pub products: EntityStore<Product>,
    pub visibility: VisibilityPrefs,
    /// Files the load that produced this inventory could not read
    pub held: HeldFiles,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether any item or product already uses this id
    ///
    /// An id whose product file name is already in use counts as taken too.
    pub fn id_taken(&self, id: &str) -> bool {
        if self.items.contains_id(id) || self.products.contains_id(id) {
            return true;
        }
        let file = product_file_name(id);
        self.held.products.contains(&file)
            || self.products.ids().any(|other| product_file_name(other) == file)
    }

    /// A fresh id unused by every item and product
    pub fn generate_id(&self) -> String {
        identity::generate_id(|candidate| self.id_taken(candidate))
    }

    /// Create an item with a new id; returns the id
    ///
    /// Nothing is stored if any initial value is rejected.
    pub fn create_item(
        &mut self,
        initial: Vec<(FieldId, Value)>,
    ) -> Result<String, InventoryError> {
        let mut item = Item::new(self.generate_id(), value::now());
        for (field, value) in initial {
            item.set_field(field, value)?;
        }
        let id = item.id().to_string();
        self.items.append(item);
        Ok(id)
    }

    /// Create a product with a new id; returns the id
    pub fn create_product(
        &mut self,
        initial: Vec<(FieldId, Value)>,
    ) -> Result<String, InventoryError> {
        let mut product = Product::new(self.generate_id(), value::now());
        for (field, value) in initial {
            product.set_field(field, value)?;
        }
        let id = product.id().to_string();
        self.products.append(product);
        Ok(id)
    }

    /// Delete an item, resolving its position now and fixing the view cursor
    pub fn delete_item(&mut self, id: &str, view: &mut ViewState) -> Result<Item, InventoryError> {
        let idx = self.items.position(id).ok_or_else(|| not_found(EntityKind::Item, id))?;
        let removed = self
            .items
            .remove_at(idx)
            .ok_or_else(|| not_found(EntityKind::Item, id))?;
        view.after_remove(idx, self.items.count());
        Ok(removed)
    }

    /// Delete a product, resolving its position now and fixing the view cursor
    pub fn delete_product(
        &mut self,
        id: &str,
        view: &mut ViewState,
    ) -> Result<Product, InventoryError> {
        let idx = self
            .products
            .position(id)
            .ok_or_else(|| not_found(EntityKind::Product, id))?;
        let removed = self
            .products
            .remove_at(idx)
            .ok_or_else(|| not_found(EntityKind::Product, id))?;
        view.after_remove(idx, self.products.count());
        Ok(removed)
    }

    pub fn item_mut(&mut self, id: &str) -> Result<&mut Item, InventoryError> {
        self.items
            .find_mut(id)
            .ok_or_else(|| not_found(EntityKind::Item, id))
    }

    pub fn product_mut(&mut self, id: &str) -> Result<&mut Product, InventoryError> {
        self.products
            .find_mut(id)
            .ok_or_else(|| not_found(EntityKind::Product, id))
    }

    /// Coerce `text` and store it in an item or product field
    pub fn edit(&mut self, id: &str, field: FieldId, text: &str) -> Result<(), InventoryError> {
        match field.kind() {
            EntityKind::Item => self.item_mut(id)?.set_field_text(field, text)?,
            EntityKind::Product => self.product_mut(id)?.set_field_text(field, text)?,
            kind => return Err(EditError::from(SchemaError::WrongKind { field, kind }).into()),
        }
        Ok(())
    }

    /// Snapshot an item or product into a product's part list
    pub fn add_part(
        &mut self,
        product_id: &str,
        source_id: &str,
        used_quantity: u64,
    ) -> Result<(), InventoryError> {
        if product_id == source_id {
            return Err(InventoryError::SelfReference(product_id.to_string()));
        }
        let part = if let Some(item) = self.items.find(source_id) {
            Part::from_item(item, used_quantity)
        } else if let Some(product) = self.products.find(source_id) {
            Part::from_product(product, used_quantity)
        } else {
            return Err(not_found(EntityKind::Item, source_id));
        };
        self.product_mut(product_id)?.add_part(part);
        Ok(())
    }

    /// Items passing the view's filters, in display order
    pub fn view_items(&self, view: &ViewState) -> Vec<&Item> {
        view.visible_indices(&self.items)
            .into_iter()
            .filter_map(|idx| self.items.get(idx))
            .collect()
    }

    /// Products passing the view's filters, in display order
    pub fn view_products(&self, view: &ViewState) -> Vec<&Product> {
        view.visible_indices(&self.products)
            .into_iter()
            .filter_map(|idx| self.products.get(idx))
            .collect()
    }

    pub fn summary(&self) -> Summary {
        fn tally<E: Entity>(store: &EntityStore<E>, price: FieldId, summary: &mut Summary) {
            for entity in store {
                let unit = entity
                    .get_detail(price)
                    .and_then(Value::as_number)
                    .unwrap_or(0.0);
                summary.stock_value += unit * entity.quantity().unwrap_or(0) as f64;
                if filter::matches(entity, &[], PageMode::LowStock) {
                    summary.low_stock += 1;
                }
                if filter::matches(entity, &[], PageMode::OutOfStock) {
                    summary.out_of_stock += 1;
                }
            }
        }

        let mut summary = Summary {
            items: self.items.count(),
            products: self.products.count(),
            ..Summary::default()
        };
        tally(&self.items, FieldId::ItemCost, &mut summary);
        tally(&self.products, FieldId::ProductPrice, &mut summary);
        summary
    }

    /// Give every entity with a blank or repeated id a fresh one
    ///
    /// Products whose ids map to the same file name, or to a held product
    /// file, are renumbered as well. Returns how many ids were replaced.
    pub fn ensure_unique_ids(&mut self) -> usize {
        let mut taken: HashSet<String> = self
            .items
            .ids()
            .chain(self.products.ids())
            .map(String::from)
            .collect();
        let mut seen = HashSet::new();
        let replaced = reassign_ids(&mut self.items, &mut seen, &mut taken)
            + reassign_ids(&mut self.products, &mut seen, &mut taken);
        replaced + self.separate_product_files(&mut taken)
    }

    fn separate_product_files(&mut self, taken: &mut HashSet<String>) -> usize {
        let mut files: HashSet<String> = self.held.products.iter().cloned().collect();
        let mut replaced = 0;
        for product in self.products.iter_mut() {
            if files.insert(product_file_name(product.id())) {
                continue;
            }
            let fresh = identity::generate_id(|candidate| {
                taken.contains(candidate) || files.contains(&product_file_name(candidate))
            });
            tracing::debug!(
                old = %product.id(),
                new = %fresh,
                "replacing id whose product file is in use"
            );
            taken.insert(fresh.clone());
            files.insert(product_file_name(&fresh));
            let _ = product
                .details_mut()
                .set(FieldId::ProductId, Some(Value::Id(fresh)));
            replaced += 1;
        }
        replaced
    }
}

fn reassign_ids<E: Entity>(
    store: &mut EntityStore<E>,
    seen: &mut HashSet<String>,
    taken: &mut HashSet<String>,
) -> usize {
    let kind = E::KIND;
    let id_field = kind.schema().id_field();
    let mut replaced = 0;
    for entity in store.iter_mut() {
        let id = entity.id().to_string();
        if !id.is_empty() && seen.insert(id.clone()) {
            continue;
        }
        let fresh = identity::generate_id(|candidate| taken.contains(candidate));
        tracing::debug!(%kind, old = %id, new = %fresh, "replacing missing or duplicate id");
        taken.insert(fresh.clone());
        seen.insert(fresh.clone());
        let _ = entity.details_mut().set(id_field, Some(Value::Id(fresh)));
        replaced += 1;
    }
    replaced
}

fn not_found(kind: EntityKind, id: &str) -> InventoryError {
    InventoryError::NotFound {
        kind,
        id: id.to_string(),
    }
}

/// An inventory shared between a foreground user and background savers
///
/// Swapping in a freshly loaded inventory and snapshotting one for writing
/// are mutually exclusive, and at most one save runs at a time, so a
/// periodic autosave can never interleave with an explicit save.
#[derive(Debug, Default)]
pub struct SharedInventory {
    state: Mutex<Inventory>,
    writer: Mutex<()>,
}

impl SharedInventory {
    pub fn new(inventory: Inventory) -> Self {
        Self {
            state: Mutex::new(inventory),
            writer: Mutex::new(()),
        }
    }

    fn state(&self) -> MutexGuard<'_, Inventory> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn with<R>(&self, f: impl FnOnce(&Inventory) -> R) -> R {
        f(&self.state())
    }

    pub fn with_mut<R>(&self, f: impl FnOnce(&mut Inventory) -> R) -> R {
        f(&mut self.state())
    }

    /// Clone the current inventory
    pub fn snapshot(&self) -> Inventory {
        self.state().clone()
    }

    /// Replace the inventory, returning the previous one
    pub fn replace(&self, inventory: Inventory) -> Inventory {
        std::mem::replace(&mut *self.state(), inventory)
    }

    /// Load a directory and swap it in
    pub fn load(&self, dir: &Path) -> Vec<PersistenceWarning> {
        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let outcome = persistence::load(dir);
        self.replace(outcome.inventory);
        outcome.warnings
    }

    /// Write a snapshot of the current inventory
    pub fn save(&self, dir: &Path) -> Vec<PersistenceWarning> {
        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let snapshot = self.snapshot();
        persistence::save(dir, &snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn named(name: &str) -> Vec<(FieldId, Value)> {
        vec![(FieldId::ItemName, Value::Text(name.to_string()))]
    }

    #[test]
    fn test_create_item_assigns_id_and_values() {
        let mut inv = Inventory::new();
        let id = inv
            .create_item(vec![
                (FieldId::ItemName, Value::Text("Resistor".into())),
                (FieldId::ItemQuantity, Value::Int(10)),
            ])
            .unwrap();
        assert!(identity::is_generated_shape(&id));
        let item = inv.items.find(&id).unwrap();
        assert_eq!(item.name(), "Resistor");
        assert_eq!(item.quantity(), Some(10));
        assert!(item.get_detail(FieldId::ItemCreated).is_some());
    }

    #[test]
    fn test_create_rejects_immutable_initial_value() {
        let mut inv = Inventory::new();
        let err = inv
            .create_item(vec![(FieldId::ItemId, Value::Id("MINE1".into()))])
            .unwrap_err();
        assert!(matches!(err, InventoryError::Edit(_)));
        assert_eq!(inv.items.count(), 0);
    }

    #[test]
    fn test_ids_unique_across_kinds() {
        let mut inv = Inventory::new();
        let mut ids = HashSet::new();
        for n in 0..50 {
            ids.insert(inv.create_item(named(&format!("item {n}"))).unwrap());
            ids.insert(inv.create_product(vec![]).unwrap());
        }
        assert_eq!(ids.len(), 100);
    }

    #[test]
    fn test_delete_sole_selected_clears_cursor() {
        let mut inv = Inventory::new();
        let id = inv.create_item(named("Only")).unwrap();
        let mut view = ViewState::new();
        view.select(Some(0));

        inv.delete_item(&id, &mut view).unwrap();
        assert_eq!(view.selected(), None);
        assert_eq!(inv.items.count(), 0);
    }

    #[test]
    fn test_delete_resolves_by_id_at_action_time() {
        let mut inv = Inventory::new();
        let first = inv.create_item(named("First")).unwrap();
        let second = inv.create_item(named("Second")).unwrap();
        let mut view = ViewState::new();
        view.select_id(&inv.items, &second);

        // Something else removes the first item before the delete is confirmed
        inv.delete_item(&first, &mut view).unwrap();
        assert_eq!(view.selected(), Some(0));

        let removed = inv.delete_item(&second, &mut view).unwrap();
        assert_eq!(removed.name(), "Second");
        assert_eq!(view.selected(), None);
    }

    #[test]
    fn test_delete_unknown_id() {
        let mut inv = Inventory::new();
        let mut view = ViewState::new();
        assert_eq!(
            inv.delete_product("NOPE1", &mut view).unwrap_err(),
            InventoryError::NotFound {
                kind: EntityKind::Product,
                id: "NOPE1".to_string()
            }
        );
    }

    #[test]
    fn test_edit_through_coercion() {
        let mut inv = Inventory::new();
        let id = inv.create_item(named("Cap")).unwrap();
        inv.edit(&id, FieldId::ItemValue, "100 nF").unwrap();
        assert!(inv.edit(&id, FieldId::ItemQuantity, "-2").is_err());
        assert!(inv.edit(&id, FieldId::ProductName, "x").is_err());
        let item = inv.items.find(&id).unwrap();
        assert_eq!(item.detail_text(FieldId::ItemValue), Some("100 nF".to_string()));
    }

    #[test]
    fn test_add_part_from_item_and_product() {
        let mut inv = Inventory::new();
        let item = inv.create_item(named("Screw")).unwrap();
        let sub = inv.create_product(vec![]).unwrap();
        let top = inv.create_product(vec![]).unwrap();

        inv.add_part(&top, &item, 4).unwrap();
        inv.add_part(&top, &sub, 1).unwrap();
        assert_eq!(
            inv.add_part(&top, &top, 1).unwrap_err(),
            InventoryError::SelfReference(top.clone())
        );
        assert!(inv.add_part(&top, "NOPE1", 1).is_err());

        let product = inv.products.find(&top).unwrap();
        assert_eq!(product.parts().len(), 2);
        assert_eq!(product.parts()[0].name(), "Screw");
        assert_eq!(product.parts()[0].used_quantity(), 4);
    }

    #[test]
    fn test_summary() {
        let mut inv = Inventory::new();
        inv.create_item(vec![
            (FieldId::ItemQuantity, Value::Int(2)),
            (FieldId::ItemLowStock, Value::Int(5)),
            (FieldId::ItemCost, Value::Cost(1.5)),
        ])
        .unwrap();
        inv.create_item(vec![]).unwrap();
        inv.create_product(vec![
            (FieldId::ProductQuantity, Value::Int(1)),
            (FieldId::ProductPrice, Value::Cost(10.0)),
        ])
        .unwrap();

        let summary = inv.summary();
        assert_eq!(summary.items, 2);
        assert_eq!(summary.products, 1);
        assert!((summary.stock_value - 13.0).abs() < 1e-9);
        assert_eq!(summary.low_stock, 1);
        assert_eq!(summary.out_of_stock, 1);
    }

    #[test]
    fn test_ensure_unique_ids() {
        let mut inv = Inventory::new();
        let now = value::now();
        inv.items.append(Item::new("DUP01".into(), now));
        inv.items.append(Item::new("DUP01".into(), now));
        inv.products.append(Product::new("DUP01".into(), now));
        inv.products.append(Product::new(String::new(), now));

        assert_eq!(inv.ensure_unique_ids(), 3);
        let ids: HashSet<_> = inv.items.ids().chain(inv.products.ids()).collect();
        assert_eq!(ids.len(), 4);
        assert_eq!(inv.items.get(0).map(|i| i.id()), Some("DUP01"));
    }

    #[test]
    fn test_shared_inventory_serializes_saves() {
        let dir = tempdir().unwrap();
        let mut inv = Inventory::new();
        for n in 0..20 {
            inv.create_item(named(&format!("item {n}"))).unwrap();
        }
        let shared = Arc::new(SharedInventory::new(inv));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let shared = Arc::clone(&shared);
                let path = dir.path().to_path_buf();
                std::thread::spawn(move || shared.save(&path))
            })
            .collect();
        for handle in handles {
            assert!(handle.join().unwrap().is_empty());
        }

        let reloaded = SharedInventory::default();
        assert!(reloaded.load(dir.path()).is_empty());
        assert_eq!(reloaded.with(|inv| inv.items.count()), 20);
    }

    #[test]
    fn test_shared_replace_and_snapshot() {
        let shared = SharedInventory::default();
        shared.with_mut(|inv| inv.create_item(named("A")).map(|_| ())).unwrap();
        let previous = shared.replace(Inventory::new());
        assert_eq!(previous.items.count(), 1);
        assert_eq!(shared.snapshot().items.count(), 0);
    }
}
