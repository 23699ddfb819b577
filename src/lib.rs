//! Inventario: a plain-file inventory tracker
//!
//! Items, products and their parts live in a directory of CSV files. The
//! library covers the typed field model, filtering, sorting and persistence;
//! the `inv` binary is a command line front end over it.

pub mod cli;
pub mod core;
pub mod entities;
pub mod schema;
