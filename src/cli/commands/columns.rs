//! `inv columns` command - list column visibility

use clap::Subcommand;
use console::style;
use miette::Result;

use crate::cli::helpers::Session;
use crate::cli::{GlobalOpts, OutputFormat};
use crate::schema::{EntityKind, FieldId};

#[derive(Subcommand, Debug)]
pub enum ColumnsCommands {
    /// Show which columns `list` prints
    List(ListArgs),

    /// Show columns again
    Show(ToggleArgs),

    /// Hide columns from `list`
    Hide(ToggleArgs),
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Only this kind (item or product)
    pub kind: Option<EntityKind>,
}

#[derive(clap::Args, Debug)]
pub struct ToggleArgs {
    /// Field keys, e.g. item_created product_price
    #[arg(required = true)]
    pub fields: Vec<FieldId>,
}

/// Run a columns subcommand
pub fn run(cmd: ColumnsCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        ColumnsCommands::List(args) => run_list(args, global),
        ColumnsCommands::Show(args) => run_toggle(args, true, global),
        ColumnsCommands::Hide(args) => run_toggle(args, false, global),
    }
}

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;
    let kinds: Vec<EntityKind> = match args.kind {
        Some(EntityKind::Part) => {
            return Err(miette::miette!("Part columns are always shown"));
        }
        Some(kind) => vec![kind],
        None => vec![EntityKind::Item, EntityKind::Product],
    };

    session.inventory.with(|inv| {
        for kind in kinds {
            for spec in kind.schema().fields() {
                let visible = inv.visibility.is_visible(spec.field);
                match global.format {
                    OutputFormat::Csv => println!("{},{}", spec.key(), visible),
                    OutputFormat::Id => {
                        if visible {
                            println!("{}", spec.key());
                        }
                    }
                    _ => {
                        let mark = if visible {
                            style("shown").green()
                        } else {
                            style("hidden").dim()
                        };
                        println!("{:<22} {}", spec.key(), mark);
                    }
                }
            }
        }
    });
    Ok(())
}

fn run_toggle(args: ToggleArgs, visible: bool, global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;
    session.inventory.with_mut(|inv| -> Result<()> {
        for field in &args.fields {
            inv.visibility.set_visible(*field, visible)?;
        }
        Ok(())
    })?;
    session.save()?;

    if !global.quiet {
        let keys: Vec<&str> = args.fields.iter().map(|f| f.key()).collect();
        println!(
            "{} {} {}",
            style("✓").green(),
            if visible { "Showing" } else { "Hiding" },
            keys.join(", ")
        );
    }
    Ok(())
}
