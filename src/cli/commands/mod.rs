//! CLI command implementations

pub mod utils;

pub mod columns;
pub mod completions;
pub mod init;
pub mod item;
pub mod product;
pub mod schema;
pub mod status;
