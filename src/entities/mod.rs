//! Entity type definitions
//!
//! Inventario tracks three kinds of entities:
//!
//! - [`Item`] - a tracked inventory unit with custom fields
//! - [`Product`] - an assembly that owns an ordered list of parts
//! - [`Part`] - a frozen snapshot of an item or product inside a product

pub mod item;
pub mod product;

pub use item::{CustomField, Item};
pub use product::{Part, Product};
