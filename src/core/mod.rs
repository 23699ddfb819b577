//! Core module - inventory model, view logic and persistence

pub mod config;
pub mod entity;
pub mod filter;
pub mod identity;
pub mod inventory;
pub mod persistence;
pub mod prefs;
pub mod sort;
pub mod store;
pub mod value;
pub mod view;

pub use config::Config;
pub use entity::{Details, EditError, Entity};
pub use filter::{PageMode, Predicate};
pub use inventory::{Inventory, InventoryError, SharedInventory, Summary};
pub use persistence::{HeldFiles, LoadOutcome, PersistenceWarning};
pub use prefs::VisibilityPrefs;
pub use sort::SortKey;
pub use store::EntityStore;
pub use value::{CoerceError, Value};
pub use view::ViewState;
