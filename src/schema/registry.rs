//! Schema registry - the static, ordered field lists of every entity kind
//!
//! Each kind declares its detail fields as `(display_name, field_key, type_tag)`
//! triples. Keys are what gets written to file headers, so the display order
//! can change freely without touching stored data.

use miette::Diagnostic;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::schema::tag::TypeTag;

/// Categories an item can be filed under
pub const ITEM_CATEGORIES: &[&str] = &["Component", "Tool", "Material", "Consumable", "Other"];

/// Categories a product can be filed under
pub const PRODUCT_CATEGORIES: &[&str] = &["Assembly", "Kit", "Module", "Other"];

/// Schema lookup and field assignment errors
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum SchemaError {
    #[error("Unknown field '{0}'")]
    #[diagnostic(
        code(inventario::schema::unknown_field),
        help("run `inv schema` to list the field keys of every entity kind")
    )]
    UnknownField(String),

    #[error("Field '{field}' does not belong to {kind} entities")]
    #[diagnostic(code(inventario::schema::wrong_kind))]
    WrongKind { field: FieldId, kind: EntityKind },

    #[error("Field '{0}' cannot be changed after creation")]
    #[diagnostic(code(inventario::schema::immutable))]
    Immutable(FieldId),

    #[error("Field '{field}' expects a {expected} value")]
    #[diagnostic(code(inventario::schema::tag_mismatch))]
    TagMismatch { field: FieldId, expected: TypeTag },
}

/// The three entity kinds with a schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Item,
    Product,
    Part,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Item => "item",
            EntityKind::Product => "product",
            EntityKind::Part => "part",
        }
    }

    /// The schema declared for this kind
    pub fn schema(&self) -> &'static Schema {
        match self {
            EntityKind::Item => &ITEM_SCHEMA,
            EntityKind::Product => &PRODUCT_SCHEMA,
            EntityKind::Part => &PART_SCHEMA,
        }
    }

    pub fn all() -> &'static [EntityKind] {
        &[EntityKind::Item, EntityKind::Product, EntityKind::Part]
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "item" | "items" => Ok(EntityKind::Item),
            "product" | "products" => Ok(EntityKind::Product),
            "part" | "parts" => Ok(EntityKind::Part),
            _ => Err(format!("Unknown entity kind: {}", s)),
        }
    }
}

/// Closed set of every detail field known to the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldId {
    ItemId,
    ItemName,
    ItemDescription,
    ItemQuantity,
    ItemLowStock,
    ItemCost,
    ItemValue,
    ItemCategory,
    ItemLocation,
    ItemCreated,
    ItemModified,

    ProductId,
    ProductName,
    ProductDescription,
    ProductQuantity,
    ProductLowStock,
    ProductPrice,
    ProductCategory,
    ProductCreated,
    ProductModified,

    PartId,
    PartName,
    PartDescription,
    PartCost,
    PartValue,
    PartUsedQuantity,
}

impl FieldId {
    /// The stable key written to file headers
    pub fn key(&self) -> &'static str {
        match self {
            FieldId::ItemId => "item_id",
            FieldId::ItemName => "item_name",
            FieldId::ItemDescription => "item_description",
            FieldId::ItemQuantity => "item_quantity",
            FieldId::ItemLowStock => "item_low_stock",
            FieldId::ItemCost => "item_cost",
            FieldId::ItemValue => "item_value",
            FieldId::ItemCategory => "item_category",
            FieldId::ItemLocation => "item_location",
            FieldId::ItemCreated => "item_created",
            FieldId::ItemModified => "item_modified",
            FieldId::ProductId => "product_id",
            FieldId::ProductName => "product_name",
            FieldId::ProductDescription => "product_description",
            FieldId::ProductQuantity => "product_quantity",
            FieldId::ProductLowStock => "product_low_stock",
            FieldId::ProductPrice => "product_price",
            FieldId::ProductCategory => "product_category",
            FieldId::ProductCreated => "product_created",
            FieldId::ProductModified => "product_modified",
            FieldId::PartId => "part_id",
            FieldId::PartName => "part_name",
            FieldId::PartDescription => "part_description",
            FieldId::PartCost => "part_cost",
            FieldId::PartValue => "part_value",
            FieldId::PartUsedQuantity => "part_used_quantity",
        }
    }

    /// The entity kind whose schema declares this field
    pub fn kind(&self) -> EntityKind {
        match self {
            FieldId::ItemId
            | FieldId::ItemName
            | FieldId::ItemDescription
            | FieldId::ItemQuantity
            | FieldId::ItemLowStock
            | FieldId::ItemCost
            | FieldId::ItemValue
            | FieldId::ItemCategory
            | FieldId::ItemLocation
            | FieldId::ItemCreated
            | FieldId::ItemModified => EntityKind::Item,
            FieldId::ProductId
            | FieldId::ProductName
            | FieldId::ProductDescription
            | FieldId::ProductQuantity
            | FieldId::ProductLowStock
            | FieldId::ProductPrice
            | FieldId::ProductCategory
            | FieldId::ProductCreated
            | FieldId::ProductModified => EntityKind::Product,
            FieldId::PartId
            | FieldId::PartName
            | FieldId::PartDescription
            | FieldId::PartCost
            | FieldId::PartValue
            | FieldId::PartUsedQuantity => EntityKind::Part,
        }
    }

    /// The registry entry for this field
    pub fn spec(&self) -> &'static FieldSpec {
        let schema = self.kind().schema();
        // Every FieldId is declared by exactly one schema
        &schema.fields[schema.position(*self).unwrap_or(0)]
    }

    pub fn tag(&self) -> TypeTag {
        self.spec().tag
    }

    pub fn display_name(&self) -> &'static str {
        self.spec().display_name
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

impl FromStr for FieldId {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase();
        EntityKind::all()
            .iter()
            .flat_map(|kind| kind.schema().fields.iter())
            .find(|spec| spec.key() == key)
            .map(|spec| spec.field)
            .ok_or_else(|| SchemaError::UnknownField(s.to_string()))
    }
}

/// One named, typed attribute of a schema
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub display_name: &'static str,
    pub field: FieldId,
    pub tag: TypeTag,
}

impl FieldSpec {
    const fn new(display_name: &'static str, field: FieldId, tag: TypeTag) -> Self {
        Self {
            display_name,
            field,
            tag,
        }
    }

    pub fn key(&self) -> &'static str {
        self.field.key()
    }
}

/// Ordered field list of one entity kind, plus the roles some fields play
#[derive(Debug)]
pub struct Schema {
    pub kind: EntityKind,
    fields: &'static [FieldSpec],
    id: FieldId,
    quantity: FieldId,
    low_stock: Option<FieldId>,
    created: Option<FieldId>,
    modified: Option<FieldId>,
}

impl Schema {
    /// Fields in display order
    pub fn fields(&self) -> &'static [FieldSpec] {
        self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Field keys in display order
    pub fn keys(&self) -> impl Iterator<Item = &'static str> {
        self.fields.iter().map(|f| f.key())
    }

    /// Position of a field in this schema
    pub fn position(&self, field: FieldId) -> Option<usize> {
        self.fields.iter().position(|f| f.field == field)
    }

    /// Resolve a header key against this schema
    pub fn field_by_key(&self, key: &str) -> Result<FieldId, SchemaError> {
        let field = key.parse::<FieldId>()?;
        if field.kind() == self.kind {
            Ok(field)
        } else {
            Err(SchemaError::WrongKind {
                field,
                kind: self.kind,
            })
        }
    }

    pub fn contains(&self, field: FieldId) -> bool {
        field.kind() == self.kind
    }

    /// The immutable identifier field
    pub fn id_field(&self) -> FieldId {
        self.id
    }

    /// Stock quantity (used quantity for parts)
    pub fn quantity_field(&self) -> FieldId {
        self.quantity
    }

    /// Low-stock threshold, if this kind tracks stock
    pub fn low_stock_field(&self) -> Option<FieldId> {
        self.low_stock
    }

    pub fn created_field(&self) -> Option<FieldId> {
        self.created
    }

    pub fn modified_field(&self) -> Option<FieldId> {
        self.modified
    }
}

pub static ITEM_SCHEMA: Schema = Schema {
    kind: EntityKind::Item,
    fields: &[
        FieldSpec::new("ID", FieldId::ItemId, TypeTag::Id),
        FieldSpec::new("Name", FieldId::ItemName, TypeTag::Text),
        FieldSpec::new("Description", FieldId::ItemDescription, TypeTag::Text),
        FieldSpec::new("Quantity", FieldId::ItemQuantity, TypeTag::Int),
        FieldSpec::new("Low stock", FieldId::ItemLowStock, TypeTag::Int),
        FieldSpec::new("Cost", FieldId::ItemCost, TypeTag::Cost),
        FieldSpec::new("Value", FieldId::ItemValue, TypeTag::Measure),
        FieldSpec::new("Category", FieldId::ItemCategory, TypeTag::Category(ITEM_CATEGORIES)),
        FieldSpec::new("Location", FieldId::ItemLocation, TypeTag::Text),
        FieldSpec::new("Created", FieldId::ItemCreated, TypeTag::Created),
        FieldSpec::new("Modified", FieldId::ItemModified, TypeTag::Modified),
    ],
    id: FieldId::ItemId,
    quantity: FieldId::ItemQuantity,
    low_stock: Some(FieldId::ItemLowStock),
    created: Some(FieldId::ItemCreated),
    modified: Some(FieldId::ItemModified),
};

pub static PRODUCT_SCHEMA: Schema = Schema {
    kind: EntityKind::Product,
    fields: &[
        FieldSpec::new("ID", FieldId::ProductId, TypeTag::Id),
        FieldSpec::new("Name", FieldId::ProductName, TypeTag::Text),
        FieldSpec::new("Description", FieldId::ProductDescription, TypeTag::Text),
        FieldSpec::new("Quantity", FieldId::ProductQuantity, TypeTag::Int),
        FieldSpec::new("Low stock", FieldId::ProductLowStock, TypeTag::Int),
        FieldSpec::new("Price", FieldId::ProductPrice, TypeTag::Cost),
        FieldSpec::new(
            "Category",
            FieldId::ProductCategory,
            TypeTag::Category(PRODUCT_CATEGORIES),
        ),
        FieldSpec::new("Created", FieldId::ProductCreated, TypeTag::Created),
        FieldSpec::new("Modified", FieldId::ProductModified, TypeTag::Modified),
    ],
    id: FieldId::ProductId,
    quantity: FieldId::ProductQuantity,
    low_stock: Some(FieldId::ProductLowStock),
    created: Some(FieldId::ProductCreated),
    modified: Some(FieldId::ProductModified),
};

/// Fixed part layout written to product files, independent of the item and
/// product schemas
pub static PART_SCHEMA: Schema = Schema {
    kind: EntityKind::Part,
    fields: &[
        FieldSpec::new("ID", FieldId::PartId, TypeTag::Id),
        FieldSpec::new("Name", FieldId::PartName, TypeTag::Text),
        FieldSpec::new("Description", FieldId::PartDescription, TypeTag::Text),
        FieldSpec::new("Cost", FieldId::PartCost, TypeTag::Cost),
        FieldSpec::new("Value", FieldId::PartValue, TypeTag::Measure),
        FieldSpec::new("Used", FieldId::PartUsedQuantity, TypeTag::Int),
    ],
    id: FieldId::PartId,
    quantity: FieldId::PartUsedQuantity,
    low_stock: None,
    created: None,
    modified: None,
};

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_keys_unique_per_schema() {
        for kind in EntityKind::all() {
            let schema = kind.schema();
            let keys: HashSet<_> = schema.keys().collect();
            assert_eq!(keys.len(), schema.len(), "duplicate key in {} schema", kind);
        }
    }

    #[test]
    fn test_every_field_declared_by_its_kind() {
        for kind in EntityKind::all() {
            for spec in kind.schema().fields() {
                assert_eq!(spec.field.kind(), *kind);
                assert_eq!(spec.field.spec(), spec);
            }
        }
    }

    #[test]
    fn test_field_from_key() {
        assert_eq!("item_quantity".parse::<FieldId>(), Ok(FieldId::ItemQuantity));
        assert_eq!("PRODUCT_NAME".parse::<FieldId>(), Ok(FieldId::ProductName));
        assert_eq!(
            "item_colour".parse::<FieldId>(),
            Err(SchemaError::UnknownField("item_colour".to_string()))
        );
    }

    #[test]
    fn test_field_by_key_checks_kind() {
        assert_eq!(ITEM_SCHEMA.field_by_key("item_name"), Ok(FieldId::ItemName));
        assert_eq!(
            ITEM_SCHEMA.field_by_key("product_name"),
            Err(SchemaError::WrongKind {
                field: FieldId::ProductName,
                kind: EntityKind::Item,
            })
        );
    }

    #[test]
    fn test_field_tags() {
        assert_eq!(FieldId::ItemId.tag(), TypeTag::Id);
        assert_eq!(FieldId::ItemValue.tag(), TypeTag::Measure);
        assert_eq!(FieldId::ItemCategory.tag().choices(), ITEM_CATEGORIES);
        assert_eq!(FieldId::ProductPrice.tag(), TypeTag::Cost);
        assert_eq!(FieldId::PartUsedQuantity.tag(), TypeTag::Int);
    }

    #[test]
    fn test_schema_roles() {
        assert_eq!(ITEM_SCHEMA.id_field(), FieldId::ItemId);
        assert_eq!(ITEM_SCHEMA.low_stock_field(), Some(FieldId::ItemLowStock));
        assert_eq!(PRODUCT_SCHEMA.quantity_field(), FieldId::ProductQuantity);
        assert_eq!(PART_SCHEMA.low_stock_field(), None);
        assert_eq!(PART_SCHEMA.modified_field(), None);
    }

    #[test]
    fn test_kind_from_str() {
        assert_eq!("items".parse::<EntityKind>(), Ok(EntityKind::Item));
        assert_eq!("Product".parse::<EntityKind>(), Ok(EntityKind::Product));
        assert!("widget".parse::<EntityKind>().is_err());
    }
}
