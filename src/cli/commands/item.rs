//! `inv item` command - Item management

use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};

use crate::cli::commands::utils::{print_details, ListArgs};
use crate::cli::helpers::{confirm, initial_values, parse_assignment, Session};
use crate::cli::table::{TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::entity::Entity;
use crate::core::value::Value;
use crate::core::view::ViewState;
use crate::core::InventoryError;
use crate::schema::{EntityKind, FieldId};

#[derive(Subcommand, Debug)]
pub enum ItemCommands {
    /// List items with filtering and sorting
    List(ListArgs),

    /// Create a new item
    New(NewArgs),

    /// Show an item's details and custom fields
    Show(ShowArgs),

    /// Change item fields
    Set(SetArgs),

    /// Add, change or remove a custom field
    Custom(CustomArgs),

    /// Delete an item
    Delete(DeleteArgs),
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// Item name
    #[arg(long, short = 'n')]
    pub name: Option<String>,

    /// Quantity in stock
    #[arg(long)]
    pub quantity: Option<String>,

    /// Unit cost
    #[arg(long)]
    pub cost: Option<String>,

    /// Category (Component, Tool, Material, Consumable, Other)
    #[arg(long, short = 'c')]
    pub category: Option<String>,

    /// Any other field as KEY=VALUE (repeatable)
    #[arg(long = "set", value_name = "KEY=VALUE")]
    pub set: Vec<String>,

    /// Prompt for the name
    #[arg(long, short = 'i')]
    pub interactive: bool,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Item ID
    pub id: String,
}

#[derive(clap::Args, Debug)]
pub struct SetArgs {
    /// Item ID
    pub id: String,

    /// Field assignments as KEY=VALUE; an empty VALUE clears the field
    #[arg(required = true, value_name = "KEY=VALUE")]
    pub assignments: Vec<String>,
}

#[derive(clap::Args, Debug)]
pub struct CustomArgs {
    /// Item ID
    pub id: String,

    /// Custom field name
    pub name: String,

    /// New value (omit with --remove)
    #[arg(required_unless_present = "remove")]
    pub value: Option<String>,

    /// Remove the custom field instead
    #[arg(long, conflicts_with = "value")]
    pub remove: bool,
}

#[derive(clap::Args, Debug)]
pub struct DeleteArgs {
    /// Item ID
    pub id: String,

    /// Skip confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

/// Run an item subcommand
pub fn run(cmd: ItemCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        ItemCommands::List(args) => run_list(args, global),
        ItemCommands::New(args) => run_new(args, global),
        ItemCommands::Show(args) => run_show(args, global),
        ItemCommands::Set(args) => run_set(args, global),
        ItemCommands::Custom(args) => run_custom(args, global),
        ItemCommands::Delete(args) => run_delete(args, global),
    }
}

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;
    let view = args.view(EntityKind::Item)?;

    session.inventory.with(|inv| -> Result<()> {
        let items = inv.view_items(&view);
        if args.count {
            println!("{}", items.len());
            return Ok(());
        }
        if items.is_empty() {
            if !global.quiet {
                println!("No items found.");
            }
            return Ok(());
        }

        let columns = args.columns(EntityKind::Item, &inv.visibility);
        let rows: Vec<TableRow> = items
            .iter()
            .map(|item| TableRow::from_entity(*item, &columns))
            .collect();
        TableFormatter::new(&columns, "item", session.currency())
            .with_summary(!global.quiet)
            .output(&rows, global.format)
    })
}

fn run_new(args: NewArgs, global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;

    let name = match args.name {
        Some(name) => Some(name),
        None if args.interactive => Some(
            dialoguer::Input::<String>::with_theme(&dialoguer::theme::ColorfulTheme::default())
                .with_prompt("Item name")
                .interact_text()
                .into_diagnostic()?,
        ),
        None => None,
    };

    let mut assignments = Vec::new();
    let named = [
        (FieldId::ItemName, name),
        (FieldId::ItemQuantity, args.quantity),
        (FieldId::ItemCost, args.cost),
        (FieldId::ItemCategory, args.category),
    ];
    for (field, text) in named {
        if let Some(text) = text {
            assignments.push(format!("{}={}", field.key(), text));
        }
    }
    assignments.extend(args.set);
    let mut initial = initial_values(EntityKind::Item, &assignments)?;

    if let Some(threshold) = session.config.low_stock_default {
        if !initial.iter().any(|(f, _)| *f == FieldId::ItemLowStock) {
            initial.push((FieldId::ItemLowStock, Value::Int(threshold)));
        }
    }

    let id = session.inventory.with_mut(|inv| inv.create_item(initial))?;
    session.save()?;

    match global.format {
        OutputFormat::Id => println!("{}", id),
        _ if global.quiet => {}
        _ => println!("{} Created item {}", style("✓").green(), style(&id).cyan()),
    }
    Ok(())
}

fn run_show(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;
    session.inventory.with(|inv| -> Result<()> {
        let item = inv.items.find(&args.id).ok_or_else(|| InventoryError::NotFound {
            kind: EntityKind::Item,
            id: args.id.clone(),
        })?;
        let extra: Vec<(String, String)> = item
            .custom_fields()
            .iter()
            .map(|c| (c.name.clone(), c.value.clone()))
            .collect();
        print_details(item, global.format, session.currency(), &extra)
    })
}

fn run_set(args: SetArgs, global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;
    let mut changes = Vec::new();
    for assignment in &args.assignments {
        changes.push(parse_assignment(EntityKind::Item, assignment)?);
    }

    session.inventory.with_mut(|inv| -> Result<()> {
        // Validate everything on a copy so a bad value changes nothing
        let mut item = inv
            .items
            .find(&args.id)
            .cloned()
            .ok_or_else(|| InventoryError::NotFound {
                kind: EntityKind::Item,
                id: args.id.clone(),
            })?;
        for (field, text) in &changes {
            item.set_field_text(*field, text)?;
        }
        *inv.item_mut(&args.id)? = item;
        Ok(())
    })?;
    session.save()?;

    if !global.quiet {
        println!(
            "{} Updated {} field(s) of item {}",
            style("✓").green(),
            changes.len(),
            style(&args.id).cyan()
        );
    }
    Ok(())
}

fn run_custom(args: CustomArgs, global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;
    let removed = session.inventory.with_mut(|inv| -> Result<bool> {
        let item = inv.item_mut(&args.id)?;
        match args.value {
            Some(ref value) if !args.remove => {
                item.set_custom_field(&args.name, value);
                Ok(false)
            }
            _ => item.remove_custom_field(&args.name).map(|_| true).ok_or_else(|| {
                miette::miette!("Item {} has no custom field '{}'", args.id, args.name)
            }),
        }
    })?;
    session.save()?;

    if !global.quiet {
        let action = if removed { "Removed" } else { "Set" };
        println!(
            "{} {} custom field '{}' on item {}",
            style("✓").green(),
            action,
            args.name,
            style(&args.id).cyan()
        );
    }
    Ok(())
}

fn run_delete(args: DeleteArgs, global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;
    let name = session.inventory.with(|inv| {
        inv.items
            .find(&args.id)
            .map(|item| item.name().to_string())
            .ok_or_else(|| InventoryError::NotFound {
                kind: EntityKind::Item,
                id: args.id.clone(),
            })
    })?;

    let prompt = format!("Delete item {} ({})?", args.id, name);
    if !confirm(&prompt, args.yes)? {
        println!("Aborted.");
        return Ok(());
    }

    // The files may have changed while the prompt was open
    session.reload();
    let mut view = ViewState::new();
    session
        .inventory
        .with_mut(|inv| inv.delete_item(&args.id, &mut view))?;
    session.save()?;

    if !global.quiet {
        println!("{} Deleted item {}", style("✓").green(), style(&args.id).cyan());
    }
    Ok(())
}
