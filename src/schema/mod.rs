//! Schema system - field registry and type tags

pub mod registry;
pub mod tag;

pub use registry::{
    EntityKind, FieldId, FieldSpec, Schema, SchemaError, ITEM_CATEGORIES, ITEM_SCHEMA,
    PART_SCHEMA, PRODUCT_CATEGORIES, PRODUCT_SCHEMA,
};
pub use tag::TypeTag;
