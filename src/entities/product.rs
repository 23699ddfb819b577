//! Product entity - an assembly made of frozen part snapshots

use chrono::NaiveDateTime;

use crate::core::entity::{Details, Entity};
use crate::core::value::{Value, TIMESTAMP_FORMAT};
use crate::entities::item::Item;
use crate::schema::{EntityKind, FieldId};

/// A Part - snapshot of an item or product taken when it was added to a
/// product, plus how many of it the product uses
///
/// Parts keep no link to their origin: later edits to the item do not show up
/// here.
#[derive(Debug, Clone, PartialEq)]
pub struct Part {
    details: Details,
}

impl Entity for Part {
    const KIND: EntityKind = EntityKind::Part;

    fn details(&self) -> &Details {
        &self.details
    }

    fn details_mut(&mut self) -> &mut Details {
        &mut self.details
    }
}

impl Part {
    pub fn from_details(details: Details) -> Self {
        Self { details }
    }

    /// Snapshot id, name, description, cost and value of an item
    pub fn from_item(item: &Item, used_quantity: u64) -> Self {
        Self::snapshot(
            item.details(),
            &[
                (FieldId::ItemId, FieldId::PartId),
                (FieldId::ItemName, FieldId::PartName),
                (FieldId::ItemDescription, FieldId::PartDescription),
                (FieldId::ItemCost, FieldId::PartCost),
                (FieldId::ItemValue, FieldId::PartValue),
            ],
            used_quantity,
        )
    }

    /// Snapshot id, name, description and price of a product
    pub fn from_product(product: &Product, used_quantity: u64) -> Self {
        Self::snapshot(
            product.details(),
            &[
                (FieldId::ProductId, FieldId::PartId),
                (FieldId::ProductName, FieldId::PartName),
                (FieldId::ProductDescription, FieldId::PartDescription),
                (FieldId::ProductPrice, FieldId::PartCost),
            ],
            used_quantity,
        )
    }

    fn snapshot(source: &Details, mapping: &[(FieldId, FieldId)], used_quantity: u64) -> Self {
        let mut details = Details::new(EntityKind::Part);
        for (from, to) in mapping {
            let _ = details.set(*to, source.get(*from).cloned());
        }
        let _ = details.set(FieldId::PartUsedQuantity, Some(Value::Int(used_quantity)));
        Self { details }
    }

    pub fn name(&self) -> &str {
        self.get_detail(FieldId::PartName)
            .and_then(Value::as_str)
            .unwrap_or("")
    }

    pub fn used_quantity(&self) -> u64 {
        self.quantity().unwrap_or(0)
    }

    pub fn set_used_quantity(&mut self, used_quantity: u64) {
        let _ = self
            .details
            .set(FieldId::PartUsedQuantity, Some(Value::Int(used_quantity)));
    }

    /// Cost of this line: snapshot cost times used quantity
    pub fn line_cost(&self) -> f64 {
        let unit = self
            .get_detail(FieldId::PartCost)
            .and_then(Value::as_number)
            .unwrap_or(0.0);
        unit * self.used_quantity() as f64
    }
}

/// A Product entity - assembly owning an ordered list of parts
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    details: Details,
    parts: Vec<Part>,
}

impl Entity for Product {
    const KIND: EntityKind = EntityKind::Product;

    fn details(&self) -> &Details {
        &self.details
    }

    fn details_mut(&mut self) -> &mut Details {
        &mut self.details
    }
}

impl Product {
    /// Create a new product with its id and both timestamps assigned
    pub fn new(id: String, now: NaiveDateTime) -> Self {
        let mut details = Details::new(EntityKind::Product);
        let stamps = [
            (FieldId::ProductId, Value::Id(id)),
            (
                FieldId::ProductCreated,
                Value::Created(now.format(TIMESTAMP_FORMAT).to_string()),
            ),
            (FieldId::ProductModified, Value::Modified(now)),
        ];
        for (field, value) in stamps {
            let _ = details.set(field, Some(value));
        }
        Self {
            details,
            parts: Vec::new(),
        }
    }

    pub fn from_parts(details: Details, parts: Vec<Part>) -> Self {
        Self { details, parts }
    }

    pub fn name(&self) -> &str {
        self.get_detail(FieldId::ProductName)
            .and_then(Value::as_str)
            .unwrap_or("")
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    pub fn add_part(&mut self, part: Part) {
        self.parts.push(part);
        self.touch();
    }

    pub fn remove_part(&mut self, index: usize) -> Option<Part> {
        if index >= self.parts.len() {
            return None;
        }
        self.touch();
        Some(self.parts.remove(index))
    }

    pub fn part_mut(&mut self, index: usize) -> Option<&mut Part> {
        self.parts.get_mut(index)
    }

    /// Sum of every part's line cost
    pub fn parts_cost(&self) -> f64 {
        self.parts.iter().map(Part::line_cost).sum()
    }

    fn touch(&mut self) {
        let _ = self.details.set(
            FieldId::ProductModified,
            Some(Value::Modified(crate::core::value::now())),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at_noon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn resistor() -> Item {
        let mut item = Item::new("R0001".to_string(), at_noon());
        item.set_field_text(FieldId::ItemName, "Resistor").unwrap();
        item.set_field_text(FieldId::ItemCost, "0.10").unwrap();
        item.set_field_text(FieldId::ItemValue, "4.7 kΩ").unwrap();
        item
    }

    #[test]
    fn test_part_from_item_snapshots_fields() {
        let part = Part::from_item(&resistor(), 4);
        assert_eq!(part.id(), "R0001");
        assert_eq!(part.name(), "Resistor");
        assert_eq!(part.used_quantity(), 4);
        assert_eq!(
            part.detail_text(FieldId::PartValue),
            Some("4.7 kΩ".to_string())
        );
        assert!((part.line_cost() - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_part_is_frozen() {
        let mut item = resistor();
        let part = Part::from_item(&item, 1);
        item.set_field_text(FieldId::ItemName, "Renamed").unwrap();
        assert_eq!(part.name(), "Resistor");
    }

    #[test]
    fn test_part_from_product() {
        let mut sub = Product::new("SUB01".to_string(), at_noon());
        sub.set_field_text(FieldId::ProductName, "Sub assembly").unwrap();
        sub.set_field_text(FieldId::ProductPrice, "12").unwrap();

        let part = Part::from_product(&sub, 2);
        assert_eq!(part.id(), "SUB01");
        assert_eq!(part.name(), "Sub assembly");
        assert_eq!(part.get_detail(FieldId::PartValue), None);
        assert!((part.line_cost() - 24.0).abs() < 1e-9);
    }

    #[test]
    fn test_product_parts() {
        let mut product = Product::new("P0001".to_string(), at_noon());
        product.add_part(Part::from_item(&resistor(), 2));
        product.add_part(Part::from_item(&resistor(), 3));
        assert_eq!(product.parts().len(), 2);
        assert!((product.parts_cost() - 0.5).abs() < 1e-9);

        product.part_mut(0).unwrap().set_used_quantity(10);
        assert_eq!(product.parts()[0].used_quantity(), 10);

        assert!(product.remove_part(5).is_none());
        assert!(product.remove_part(0).is_some());
        assert_eq!(product.parts().len(), 1);
    }

    #[test]
    fn test_product_creation() {
        let product = Product::new("P0001".to_string(), at_noon());
        assert_eq!(product.id(), "P0001");
        assert_eq!(
            product.get_detail(FieldId::ProductCategory),
            Some(&Value::Category("Assembly".to_string()))
        );
        assert!(product.parts().is_empty());
    }
}
