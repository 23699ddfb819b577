//! `inv init` command - Initialize a new inventory directory

use console::style;
use miette::{IntoDiagnostic, Result};
use std::path::{Path, PathBuf};

use crate::cli::helpers::{is_inventory, print_warnings};
use crate::cli::GlobalOpts;
use crate::core::config::CONFIG_FILE;
use crate::core::persistence::{self, ITEMS_FILE, PREFERENCES_FILE, PRODUCTS_DIR};
use crate::core::{Config, Inventory};

#[derive(clap::Args, Debug)]
pub struct InitArgs {
    /// Directory to initialize (default: --inventory or the current directory)
    pub path: Option<PathBuf>,

    /// Currency symbol stored in the inventory's config.yaml
    #[arg(long)]
    pub currency: Option<String>,

    /// Low-stock threshold for new entities, stored in config.yaml
    #[arg(long)]
    pub low_stock_default: Option<u64>,

    /// Overwrite an existing inventory with an empty one
    #[arg(long)]
    pub force: bool,
}

pub fn run(args: InitArgs, global: &GlobalOpts) -> Result<()> {
    let path = match args.path.as_ref().or(global.inventory.as_ref()) {
        Some(path) => path.clone(),
        None => std::env::current_dir().into_diagnostic()?,
    };

    // Create directory if it doesn't exist
    if !path.exists() {
        std::fs::create_dir_all(&path).into_diagnostic()?;
        if !global.quiet {
            println!(
                "{} Created directory {}",
                style("✓").green(),
                style(path.display()).cyan()
            );
        }
    }

    if is_inventory(&path) && !args.force {
        println!(
            "{} Inventory already exists at {}",
            style("!").yellow(),
            style(path.display()).cyan()
        );
        println!();
        println!(
            "Use {} to replace it with an empty one",
            style("inv init --force").yellow()
        );
        return Ok(());
    }

    let warnings = persistence::save(&path, &Inventory::new());
    print_warnings(&warnings, global.quiet);
    if !warnings.is_empty() {
        return Err(miette::miette!(
            "Could not initialize inventory at {}",
            path.display()
        ));
    }

    if args.currency.is_some() || args.low_stock_default.is_some() {
        write_config(&path, args.currency, args.low_stock_default)?;
    }

    if !global.quiet {
        println!(
            "{} Initialized inventory at {}",
            style("✓").green(),
            style(path.display()).cyan()
        );
        println!();
        println!("Created:");
        for name in [ITEMS_FILE, PREFERENCES_FILE] {
            println!("  {}", name);
        }
        println!("  {}/", PRODUCTS_DIR);
        println!();
        println!("Next steps:");
        println!(
            "  {} Add your first item",
            style("inv item new --name \"...\"").yellow()
        );
        println!("  {} List the field keys", style("inv schema").yellow());
    }
    Ok(())
}

/// Write the inventory's own config file, keeping keys already in it
fn write_config(
    dir: &Path,
    currency: Option<String>,
    low_stock_default: Option<u64>,
) -> Result<()> {
    let path = dir.join(CONFIG_FILE);
    let mut config: Config = if path.exists() {
        let contents = std::fs::read_to_string(&path).into_diagnostic()?;
        serde_yml::from_str(&contents).into_diagnostic()?
    } else {
        Config::default()
    };
    if currency.is_some() {
        config.currency = currency;
    }
    if low_stock_default.is_some() {
        config.low_stock_default = low_stock_default;
    }
    let yaml = serde_yml::to_string(&config).into_diagnostic()?;
    std::fs::write(&path, yaml).into_diagnostic()?;
    Ok(())
}
