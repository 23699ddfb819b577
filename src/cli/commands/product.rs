//! `inv product` command - Product management

use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};
use tabled::{builder::Builder, settings::Style};

use crate::cli::commands::utils::{print_details, ListArgs};
use crate::cli::helpers::{confirm, initial_values, parse_assignment, truncate_str, Session};
use crate::cli::table::{json_value, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::entity::Entity;
use crate::core::value::{self, Value};
use crate::core::view::ViewState;
use crate::core::InventoryError;
use crate::entities::Product;
use crate::schema::{EntityKind, FieldId, PART_SCHEMA};

#[derive(Subcommand, Debug)]
pub enum ProductCommands {
    /// List products with filtering and sorting
    List(ListArgs),

    /// Create a new product
    New(NewArgs),

    /// Show a product's details and parts
    Show(ShowArgs),

    /// Change product fields
    Set(SetArgs),

    /// Add an item or another product as a part
    AddPart(AddPartArgs),

    /// Remove a part by its position in `product show`
    RemovePart(RemovePartArgs),

    /// Delete a product
    Delete(DeleteArgs),
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// Product name
    #[arg(long, short = 'n')]
    pub name: Option<String>,

    /// Quantity in stock
    #[arg(long)]
    pub quantity: Option<String>,

    /// Sale price
    #[arg(long)]
    pub price: Option<String>,

    /// Category (Assembly, Kit, Module, Other)
    #[arg(long, short = 'c')]
    pub category: Option<String>,

    /// Any other field as KEY=VALUE (repeatable)
    #[arg(long = "set", value_name = "KEY=VALUE")]
    pub set: Vec<String>,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Product ID
    pub id: String,
}

#[derive(clap::Args, Debug)]
pub struct SetArgs {
    /// Product ID
    pub id: String,

    /// Field assignments as KEY=VALUE; an empty VALUE clears the field
    #[arg(required = true, value_name = "KEY=VALUE")]
    pub assignments: Vec<String>,
}

#[derive(clap::Args, Debug)]
pub struct AddPartArgs {
    /// Product receiving the part
    pub product: String,

    /// Item or product ID to copy into the part list
    pub source: String,

    /// How many the product uses
    #[arg(long, short = 'n', default_value_t = 1)]
    pub quantity: u64,
}

#[derive(clap::Args, Debug)]
pub struct RemovePartArgs {
    /// Product ID
    pub product: String,

    /// Part number as shown by `product show` (starting at 1)
    pub position: usize,
}

#[derive(clap::Args, Debug)]
pub struct DeleteArgs {
    /// Product ID
    pub id: String,

    /// Skip confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

/// Run a product subcommand
pub fn run(cmd: ProductCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        ProductCommands::List(args) => run_list(args, global),
        ProductCommands::New(args) => run_new(args, global),
        ProductCommands::Show(args) => run_show(args, global),
        ProductCommands::Set(args) => run_set(args, global),
        ProductCommands::AddPart(args) => run_add_part(args, global),
        ProductCommands::RemovePart(args) => run_remove_part(args, global),
        ProductCommands::Delete(args) => run_delete(args, global),
    }
}

fn not_found(id: &str) -> InventoryError {
    InventoryError::NotFound {
        kind: EntityKind::Product,
        id: id.to_string(),
    }
}

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;
    let view = args.view(EntityKind::Product)?;

    session.inventory.with(|inv| -> Result<()> {
        let products = inv.view_products(&view);
        if args.count {
            println!("{}", products.len());
            return Ok(());
        }
        if products.is_empty() {
            if !global.quiet {
                println!("No products found.");
            }
            return Ok(());
        }

        let columns = args.columns(EntityKind::Product, &inv.visibility);
        let rows: Vec<TableRow> = products
            .iter()
            .map(|product| TableRow::from_entity(*product, &columns))
            .collect();
        TableFormatter::new(&columns, "product", session.currency())
            .with_summary(!global.quiet)
            .output(&rows, global.format)
    })
}

fn run_new(args: NewArgs, global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;

    let mut assignments = Vec::new();
    let named = [
        (FieldId::ProductName, args.name),
        (FieldId::ProductQuantity, args.quantity),
        (FieldId::ProductPrice, args.price),
        (FieldId::ProductCategory, args.category),
    ];
    for (field, text) in named {
        if let Some(text) = text {
            assignments.push(format!("{}={}", field.key(), text));
        }
    }
    assignments.extend(args.set);
    let mut initial = initial_values(EntityKind::Product, &assignments)?;

    if let Some(threshold) = session.config.low_stock_default {
        if !initial.iter().any(|(f, _)| *f == FieldId::ProductLowStock) {
            initial.push((FieldId::ProductLowStock, Value::Int(threshold)));
        }
    }

    let id = session.inventory.with_mut(|inv| inv.create_product(initial))?;
    session.save()?;

    match global.format {
        OutputFormat::Id => println!("{}", id),
        _ if global.quiet => {}
        _ => println!("{} Created product {}", style("✓").green(), style(&id).cyan()),
    }
    Ok(())
}

fn run_show(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;
    session.inventory.with(|inv| -> Result<()> {
        let product = inv.products.find(&args.id).ok_or_else(|| not_found(&args.id))?;
        let currency = session.currency();

        match global.format {
            OutputFormat::Json => print_json(product),
            OutputFormat::Tsv | OutputFormat::Auto => {
                let parts_cost = format!("{}{:.2}", currency, product.parts_cost());
                print_details(
                    product,
                    global.format,
                    currency,
                    &[("Parts cost".to_string(), parts_cost)],
                )?;
                println!();
                print_parts_table(product, currency);
                Ok(())
            }
            format => print_details(product, format, currency, &[]),
        }
    })
}

fn print_json(product: &Product) -> Result<()> {
    let mut map = serde_json::Map::new();
    for (spec, value) in product.details().iter() {
        map.insert(spec.key().to_string(), json_value(value));
    }
    let parts: Vec<serde_json::Value> = product
        .parts()
        .iter()
        .map(|part| {
            let fields: serde_json::Map<String, serde_json::Value> = part
                .details()
                .iter()
                .map(|(spec, value)| (spec.key().to_string(), json_value(value)))
                .collect();
            serde_json::Value::Object(fields)
        })
        .collect();
    map.insert("parts".to_string(), serde_json::Value::Array(parts));
    map.insert(
        "parts_cost".to_string(),
        serde_json::Value::from(product.parts_cost()),
    );
    let json = serde_json::to_string_pretty(&serde_json::Value::Object(map)).into_diagnostic()?;
    println!("{}", json);
    Ok(())
}

fn print_parts_table(product: &Product, currency: &str) {
    if product.parts().is_empty() {
        println!("{}", style("No parts.").dim());
        return;
    }

    let mut builder = Builder::default();
    let mut header = vec!["#".to_string()];
    header.extend(PART_SCHEMA.fields().iter().map(|spec| spec.display_name.to_string()));
    header.push("Line cost".to_string());
    builder.push_record(header);

    for (idx, part) in product.parts().iter().enumerate() {
        let mut record = vec![(idx + 1).to_string()];
        record.extend(part.details().iter().map(|(_, value)| {
            value
                .map(|v| truncate_str(&value::display(v, currency), 30))
                .unwrap_or_else(|| "-".to_string())
        }));
        record.push(format!("{}{:.2}", currency, part.line_cost()));
        builder.push_record(record);
    }

    println!("{}", builder.build().with(Style::rounded()));
}

fn run_set(args: SetArgs, global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;
    let mut changes = Vec::new();
    for assignment in &args.assignments {
        changes.push(parse_assignment(EntityKind::Product, assignment)?);
    }

    session.inventory.with_mut(|inv| -> Result<()> {
        // Apply to a copy first so a bad value changes nothing
        let mut product = inv
            .products
            .find(&args.id)
            .cloned()
            .ok_or_else(|| not_found(&args.id))?;
        for (field, text) in &changes {
            product.set_field_text(*field, text)?;
        }
        *inv.product_mut(&args.id)? = product;
        Ok(())
    })?;
    session.save()?;

    if !global.quiet {
        println!(
            "{} Updated {} field(s) of product {}",
            style("✓").green(),
            changes.len(),
            style(&args.id).cyan()
        );
    }
    Ok(())
}

fn run_add_part(args: AddPartArgs, global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;
    session
        .inventory
        .with_mut(|inv| inv.add_part(&args.product, &args.source, args.quantity))?;
    session.save()?;

    if !global.quiet {
        println!(
            "{} Added {} x {} to product {}",
            style("✓").green(),
            args.quantity,
            style(&args.source).cyan(),
            style(&args.product).cyan()
        );
    }
    Ok(())
}

fn run_remove_part(args: RemovePartArgs, global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;
    let removed = session.inventory.with_mut(|inv| -> Result<String> {
        let product = inv.product_mut(&args.product)?;
        let part = args
            .position
            .checked_sub(1)
            .and_then(|idx| product.remove_part(idx))
            .ok_or_else(|| {
                miette::miette!(
                    "Product {} has no part #{} ({} part(s))",
                    args.product,
                    args.position,
                    product.parts().len()
                )
            })?;
        Ok(part.name().to_string())
    })?;
    session.save()?;

    if !global.quiet {
        println!(
            "{} Removed part #{} ({}) from product {}",
            style("✓").green(),
            args.position,
            removed,
            style(&args.product).cyan()
        );
    }
    Ok(())
}

fn run_delete(args: DeleteArgs, global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;
    let name = session.inventory.with(|inv| {
        inv.products
            .find(&args.id)
            .map(|product| product.name().to_string())
            .ok_or_else(|| not_found(&args.id))
    })?;

    let prompt = format!("Delete product {} ({})?", args.id, name);
    if !confirm(&prompt, args.yes)? {
        println!("Aborted.");
        return Ok(());
    }

    // The files may have changed while the prompt was open
    session.reload();
    let mut view = ViewState::new();
    session
        .inventory
        .with_mut(|inv| inv.delete_product(&args.id, &mut view))?;
    session.save()?;

    if !global.quiet {
        println!(
            "{} Deleted product {}",
            style("✓").green(),
            style(&args.id).cyan()
        );
    }
    Ok(())
}
