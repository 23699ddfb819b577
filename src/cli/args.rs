//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::cli::commands::{
    columns::ColumnsCommands, completions::CompletionsArgs, init::InitArgs, item::ItemCommands,
    product::ProductCommands, schema::SchemaArgs, status::StatusArgs,
};

#[derive(Parser)]
#[command(name = "inv")]
#[command(author, version, about = "Plain-file inventory tracker")]
#[command(long_about = "Track items, products and their parts in a directory of CSV files.")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(clap::Args, Clone, Debug)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "auto")]
    pub format: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Enable verbose output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Inventory directory (default: $INVENTARIO_PATH, the configured
    /// inventory, or the current directory)
    #[arg(long, short = 'I', global = true)]
    pub inventory: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new inventory directory
    Init(InitArgs),

    /// Item management
    #[command(subcommand)]
    Item(ItemCommands),

    /// Product management (assemblies of parts)
    #[command(subcommand)]
    Product(ProductCommands),

    /// Show or hide list columns
    #[command(subcommand)]
    Columns(ColumnsCommands),

    /// Show the field schema of an entity kind
    Schema(SchemaArgs),

    /// Show inventory totals
    Status(StatusArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Automatically detect based on context (tsv for lists, a detail view for show)
    #[default]
    Auto,
    /// Tab-separated values (for piping)
    Tsv,
    /// CSV format (for spreadsheets)
    Csv,
    /// JSON format (for programming)
    Json,
    /// Just IDs, one per line
    Id,
}
