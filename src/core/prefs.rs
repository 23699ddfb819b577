//! Column visibility preferences of the item and product views

use crate::schema::{EntityKind, FieldId, SchemaError};

/// One visibility flag per schema field, for the item and product views
///
/// Rows always match the live schema length: short rows are padded with
/// "visible" and long rows are cut, so a preferences file written by an older
/// or newer schema still lines up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibilityPrefs {
    items: Vec<bool>,
    products: Vec<bool>,
}

impl Default for VisibilityPrefs {
    fn default() -> Self {
        Self::from_rows(Vec::new(), Vec::new())
    }
}

impl VisibilityPrefs {
    /// Build from stored rows, aligning each to its schema
    pub fn from_rows(items: Vec<bool>, products: Vec<bool>) -> Self {
        Self {
            items: align(items, EntityKind::Item.schema().len()),
            products: align(products, EntityKind::Product.schema().len()),
        }
    }

    pub fn row(&self, kind: EntityKind) -> &[bool] {
        match kind {
            EntityKind::Item => self.items.as_slice(),
            EntityKind::Product => self.products.as_slice(),
            EntityKind::Part => &[],
        }
    }

    pub fn is_visible(&self, field: FieldId) -> bool {
        let kind = field.kind();
        kind.schema()
            .position(field)
            .and_then(|idx| self.row(kind).get(idx).copied())
            .unwrap_or(true)
    }

    pub fn set_visible(&mut self, field: FieldId, visible: bool) -> Result<(), SchemaError> {
        let kind = field.kind();
        let row = match kind {
            EntityKind::Item => &mut self.items,
            EntityKind::Product => &mut self.products,
            EntityKind::Part => {
                return Err(SchemaError::WrongKind { field, kind });
            }
        };
        if let Some(idx) = kind.schema().position(field) {
            row[idx] = visible;
        }
        Ok(())
    }

    /// Fields of a kind whose column is shown, in display order
    pub fn visible_fields(&self, kind: EntityKind) -> Vec<FieldId> {
        kind.schema()
            .fields()
            .iter()
            .map(|spec| spec.field)
            .filter(|field| self.is_visible(*field))
            .collect()
    }
}

fn align(mut row: Vec<bool>, len: usize) -> Vec<bool> {
    row.resize(len, true);
    row
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_all_visible() {
        let prefs = VisibilityPrefs::default();
        assert_eq!(prefs.row(EntityKind::Item).len(), EntityKind::Item.schema().len());
        assert!(prefs.row(EntityKind::Product).iter().all(|v| *v));
    }

    #[test]
    fn test_short_row_pads_visible() {
        let prefs = VisibilityPrefs::from_rows(vec![true, false], vec![]);
        assert!(prefs.is_visible(FieldId::ItemId));
        assert!(!prefs.is_visible(FieldId::ItemName));
        assert!(prefs.is_visible(FieldId::ItemModified));
    }

    #[test]
    fn test_long_row_is_cut() {
        let prefs = VisibilityPrefs::from_rows(vec![false; 40], vec![]);
        assert_eq!(prefs.row(EntityKind::Item).len(), EntityKind::Item.schema().len());
        assert!(prefs.visible_fields(EntityKind::Item).is_empty());
    }

    #[test]
    fn test_set_visible() {
        let mut prefs = VisibilityPrefs::default();
        prefs.set_visible(FieldId::ProductPrice, false).unwrap();
        assert!(!prefs.is_visible(FieldId::ProductPrice));
        assert!(!prefs
            .visible_fields(EntityKind::Product)
            .contains(&FieldId::ProductPrice));
        assert!(prefs.set_visible(FieldId::PartName, false).is_err());
    }
}
