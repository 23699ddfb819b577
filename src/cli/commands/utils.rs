//! Shared utilities for CLI commands

use console::style;
use miette::{IntoDiagnostic, Result};

use crate::cli::helpers::{escape_csv, field_for};
use crate::cli::table::json_value;
use crate::cli::OutputFormat;
use crate::core::entity::Entity;
use crate::core::filter::{PageMode, Predicate};
use crate::core::sort::SortKey;
use crate::core::value;
use crate::core::view::ViewState;
use crate::core::VisibilityPrefs;
use crate::schema::{EntityKind, FieldId, SchemaError};

/// Filtering and sorting options shared by `item list` and `product list`
#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Filter on a field as KEY=TEXT (repeatable, all must match)
    ///
    /// TEXT is a case-insensitive substring, or `!>N` / `!<N` for a numeric
    /// comparison.
    #[arg(long = "filter", short = 'F', value_name = "KEY=TEXT")]
    pub filters: Vec<Predicate>,

    /// Stock page to show
    #[arg(long, default_value = "normal")]
    pub page: PageMode,

    /// Sort by field key
    #[arg(long, short = 's', value_name = "KEY")]
    pub sort: Option<String>,

    /// Reverse the sort order
    #[arg(long, short = 'r', requires = "sort")]
    pub reverse: bool,

    /// Show only the count
    #[arg(long)]
    pub count: bool,

    /// Include columns hidden with `inv columns hide`
    #[arg(long)]
    pub all_columns: bool,
}

impl ListArgs {
    /// Build the view these options describe for one entity kind
    pub fn view(&self, kind: EntityKind) -> Result<ViewState> {
        for predicate in &self.filters {
            if predicate.field.kind() != kind {
                return Err(SchemaError::WrongKind {
                    field: predicate.field,
                    kind,
                }
                .into());
            }
        }

        let mut view = ViewState::new();
        view.set_filter_predicates(self.filters.clone());
        view.set_page_mode(self.page);
        if let Some(ref key) = self.sort {
            view.set_sort(Some(SortKey {
                field: field_for(kind, key)?,
                descending: self.reverse,
            }));
        }
        Ok(view)
    }

    /// Columns to print: the visible ones unless `--all-columns`
    pub fn columns(&self, kind: EntityKind, prefs: &VisibilityPrefs) -> Vec<FieldId> {
        if self.all_columns {
            kind.schema().fields().iter().map(|spec| spec.field).collect()
        } else {
            prefs.visible_fields(kind)
        }
    }
}

/// Print every detail field of one entity
///
/// `extra` lines (custom fields, totals) follow the schema fields in the
/// human-readable view and are added as extra keys in JSON.
pub fn print_details<E: Entity>(
    entity: &E,
    format: OutputFormat,
    currency: &str,
    extra: &[(String, String)],
) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let mut map = serde_json::Map::new();
            for (spec, value) in entity.details().iter() {
                map.insert(spec.key().to_string(), json_value(value));
            }
            for (name, value) in extra {
                map.insert(name.clone(), serde_json::Value::String(value.clone()));
            }
            let json = serde_json::to_string_pretty(&serde_json::Value::Object(map))
                .into_diagnostic()?;
            println!("{}", json);
        }
        OutputFormat::Id => println!("{}", entity.id()),
        OutputFormat::Csv => {
            println!("key,value");
            for (spec, value) in entity.details().iter() {
                let text = value.map(value::format).unwrap_or_default();
                println!("{},{}", spec.key(), escape_csv(&text));
            }
            for (name, value) in extra {
                println!("{},{}", escape_csv(name), escape_csv(value));
            }
        }
        OutputFormat::Tsv | OutputFormat::Auto => {
            let label_width = entity
                .details()
                .iter()
                .map(|(spec, _)| spec.display_name.len())
                .chain(extra.iter().map(|(name, _)| name.chars().count()))
                .max()
                .unwrap_or(0);
            for (spec, value) in entity.details().iter() {
                let text = value
                    .map(|v| value::display(v, currency))
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "{:<width$}  {}",
                    style(spec.display_name).bold(),
                    text,
                    width = label_width
                );
            }
            for (name, value) in extra {
                println!("{:<width$}  {}", style(name).dim(), value, width = label_width);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        list: ListArgs,
    }

    fn parse(args: &[&str]) -> ListArgs {
        Harness::parse_from(std::iter::once("list").chain(args.iter().copied())).list
    }

    #[test]
    fn test_view_from_args() {
        let args = parse(&[
            "--filter",
            "item_name=res",
            "--page",
            "low-stock",
            "--sort",
            "item_quantity",
            "--reverse",
        ]);
        let view = args.view(EntityKind::Item).unwrap();
        assert_eq!(view.predicates(), &[Predicate::new(FieldId::ItemName, "res")]);
        assert_eq!(view.page_mode(), PageMode::LowStock);
        assert_eq!(
            view.sort_key(),
            Some(SortKey {
                field: FieldId::ItemQuantity,
                descending: true
            })
        );
    }

    #[test]
    fn test_filter_of_other_kind_rejected() {
        let args = parse(&["--filter", "product_name=kit"]);
        assert!(args.view(EntityKind::Item).is_err());
        assert!(args.view(EntityKind::Product).is_ok());
    }

    #[test]
    fn test_unknown_filter_key_rejected_by_parser() {
        assert!(Harness::try_parse_from(["list", "--filter", "colour=red"]).is_err());
    }

    #[test]
    fn test_columns_respect_preferences() {
        let mut prefs = VisibilityPrefs::default();
        prefs.set_visible(FieldId::ItemCreated, false).unwrap();
        let args = parse(&[]);
        assert!(!args.columns(EntityKind::Item, &prefs).contains(&FieldId::ItemCreated));
        let args = parse(&["--all-columns"]);
        assert!(args.columns(EntityKind::Item, &prefs).contains(&FieldId::ItemCreated));
    }
}
