//! `inv status` command - inventory totals

use console::style;
use miette::{IntoDiagnostic, Result};

use crate::cli::helpers::Session;
use crate::cli::{GlobalOpts, OutputFormat};

#[derive(clap::Args, Debug)]
pub struct StatusArgs {}

pub fn run(_args: StatusArgs, global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;
    let summary = session.inventory.with(|inv| inv.summary());
    let currency = session.currency();

    match global.format {
        OutputFormat::Json => {
            let status = serde_json::json!({
                "inventory": session.dir.display().to_string(),
                "items": summary.items,
                "products": summary.products,
                "stock_value": summary.stock_value,
                "low_stock": summary.low_stock,
                "out_of_stock": summary.out_of_stock,
            });
            println!("{}", serde_json::to_string_pretty(&status).into_diagnostic()?);
        }
        OutputFormat::Csv => {
            println!("items,products,stock_value,low_stock,out_of_stock");
            println!(
                "{},{},{:.2},{},{}",
                summary.items,
                summary.products,
                summary.stock_value,
                summary.low_stock,
                summary.out_of_stock
            );
        }
        _ => {
            let width = 40;
            println!("{}", style("Inventory Status").bold().underlined());
            println!("{}", style(session.dir.display()).dim());
            println!("{}", "═".repeat(width));
            println!("{:<24} {}", "Items", style(summary.items).cyan());
            println!("{:<24} {}", "Products", style(summary.products).cyan());
            println!(
                "{:<24} {}",
                "Stock value",
                style(format!("{}{:.2}", currency, summary.stock_value)).cyan()
            );
            let low = if summary.low_stock > 0 {
                style(summary.low_stock).yellow()
            } else {
                style(summary.low_stock).green()
            };
            println!("{:<24} {}", "Low stock", low);
            let out = if summary.out_of_stock > 0 {
                style(summary.out_of_stock).red()
            } else {
                style(summary.out_of_stock).green()
            };
            println!("{:<24} {}", "Out of stock", out);
        }
    }
    Ok(())
}
