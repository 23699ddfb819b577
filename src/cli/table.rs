//! Table formatting for `list` commands
//!
//! Columns are schema fields. TSV output sizes each column to its content,
//! capped at [`MAX_COLUMN_WIDTH`]; CSV and JSON carry the stored text so they
//! can be piped back into other tools.

use console::style;
use miette::{IntoDiagnostic, Result};

use crate::cli::helpers::{escape_csv, truncate_str};
use crate::cli::OutputFormat;
use crate::core::entity::Entity;
use crate::core::value::{self, Value};
use crate::schema::{FieldId, TypeTag};

/// Widest a TSV column grows before its cells are truncated
pub const MAX_COLUMN_WIDTH: usize = 32;

/// One entity's cells, aligned with the formatter's columns
pub struct TableRow {
    pub id: String,
    pub cells: Vec<Option<Value>>,
}

impl TableRow {
    pub fn from_entity<E: Entity>(entity: &E, columns: &[FieldId]) -> Self {
        Self {
            id: entity.id().to_string(),
            cells: columns
                .iter()
                .map(|field| entity.get_detail(*field).cloned())
                .collect(),
        }
    }
}

/// Table formatter that outputs rows in various formats
pub struct TableFormatter<'a> {
    columns: &'a [FieldId],
    entity_name: &'static str,
    currency: &'a str,
    show_summary: bool,
}

impl<'a> TableFormatter<'a> {
    pub fn new(columns: &'a [FieldId], entity_name: &'static str, currency: &'a str) -> Self {
        Self {
            columns,
            entity_name,
            currency,
            show_summary: true,
        }
    }

    /// Toggle the "N thing(s) found" line after TSV output
    pub fn with_summary(mut self, show: bool) -> Self {
        self.show_summary = show;
        self
    }

    /// Output rows in the specified format
    pub fn output(&self, rows: &[TableRow], format: OutputFormat) -> Result<()> {
        match format {
            OutputFormat::Tsv | OutputFormat::Auto => self.output_tsv(rows),
            OutputFormat::Csv => self.output_csv(rows),
            OutputFormat::Json => self.output_json(rows)?,
            OutputFormat::Id => {
                for row in rows {
                    println!("{}", row.id);
                }
            }
        }
        Ok(())
    }

    fn tsv_cell(&self, cell: Option<&Value>) -> String {
        cell.map(|v| value::display(v, self.currency))
            .unwrap_or_else(|| "-".to_string())
    }

    /// Column widths from the header and the widest cell
    fn calculate_widths(&self, rows: &[TableRow]) -> Vec<usize> {
        self.columns
            .iter()
            .enumerate()
            .map(|(idx, field)| {
                let content = rows
                    .iter()
                    .map(|r| {
                        self.tsv_cell(r.cells.get(idx).and_then(Option::as_ref))
                            .chars()
                            .count()
                    })
                    .max()
                    .unwrap_or(0);
                field
                    .display_name()
                    .chars()
                    .count()
                    .max(content)
                    .min(MAX_COLUMN_WIDTH)
            })
            .collect()
    }

    fn output_tsv(&self, rows: &[TableRow]) {
        let widths = self.calculate_widths(rows);

        let header: Vec<String> = self
            .columns
            .iter()
            .zip(&widths)
            .map(|(field, width)| {
                let name = field.display_name().to_uppercase();
                format!("{}{}", style(&name).bold(), pad(&name, *width))
            })
            .collect();
        println!("{}", header.join(" "));

        let total_width: usize = widths.iter().sum::<usize>() + widths.len().saturating_sub(1);
        println!("{}", "-".repeat(total_width));

        for row in rows {
            let parts: Vec<String> = widths
                .iter()
                .enumerate()
                .map(|(idx, width)| {
                    let text = truncate_str(
                        &self.tsv_cell(row.cells.get(idx).and_then(Option::as_ref)),
                        *width,
                    );
                    if self.columns.get(idx).is_some_and(|f| f.tag() == TypeTag::Id) {
                        format!("{}{}", style(&text).cyan(), pad(&text, *width))
                    } else {
                        format!("{}{}", text, pad(&text, *width))
                    }
                })
                .collect();
            println!("{}", parts.join(" ").trim_end());
        }

        if self.show_summary {
            println!();
            println!(
                "{} {}(s) found.",
                style(rows.len()).cyan(),
                self.entity_name
            );
        }
    }

    fn output_csv(&self, rows: &[TableRow]) {
        let keys: Vec<&str> = self.columns.iter().map(|f| f.key()).collect();
        println!("{}", keys.join(","));

        for row in rows {
            let values: Vec<String> = row
                .cells
                .iter()
                .map(|cell| {
                    cell.as_ref()
                        .map(|v| escape_csv(&value::format(v)))
                        .unwrap_or_default()
                })
                .collect();
            println!("{}", values.join(","));
        }
    }

    fn output_json(&self, rows: &[TableRow]) -> Result<()> {
        let records: Vec<serde_json::Value> = rows
            .iter()
            .map(|row| {
                let map: serde_json::Map<String, serde_json::Value> = self
                    .columns
                    .iter()
                    .zip(&row.cells)
                    .map(|(field, cell)| (field.key().to_string(), json_value(cell.as_ref())))
                    .collect();
                serde_json::Value::Object(map)
            })
            .collect();
        let json = serde_json::to_string_pretty(&records).into_diagnostic()?;
        println!("{}", json);
        Ok(())
    }
}

/// Numbers stay numbers in JSON; everything else is its stored text
pub fn json_value(value: Option<&Value>) -> serde_json::Value {
    match value {
        None => serde_json::Value::Null,
        Some(Value::Int(n)) => serde_json::Value::from(*n),
        Some(Value::Cost(c)) => serde_json::Value::from(*c),
        Some(other) => serde_json::Value::String(value::format(other)),
    }
}

/// Spaces that pad `text` out to `width` characters
///
/// Styled text carries escape codes, so `{:<width$}` would miscount it.
fn pad(text: &str, width: usize) -> String {
    " ".repeat(width.saturating_sub(text.chars().count()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::Item;

    fn item() -> Item {
        let mut item = Item::new("AB12C".to_string(), value::now());
        item.set_field_text(FieldId::ItemName, "A resistor with a very long descriptive name")
            .unwrap();
        item.set_field_text(FieldId::ItemCost, "1.5").unwrap();
        item
    }

    #[test]
    fn test_row_from_entity_follows_columns() {
        let columns = [FieldId::ItemCost, FieldId::ItemId, FieldId::ItemLocation];
        let row = TableRow::from_entity(&item(), &columns);
        assert_eq!(row.id, "AB12C");
        assert_eq!(row.cells[0], Some(Value::Cost(1.5)));
        assert_eq!(row.cells[1], Some(Value::Id("AB12C".to_string())));
        assert_eq!(row.cells[2], None);
    }

    #[test]
    fn test_widths_capped() {
        let columns = [FieldId::ItemId, FieldId::ItemName, FieldId::ItemCost];
        let rows = vec![TableRow::from_entity(&item(), &columns)];
        let formatter = TableFormatter::new(&columns, "item", "€");
        let widths = formatter.calculate_widths(&rows);
        assert_eq!(widths[0], "AB12C".len());
        assert_eq!(widths[1], MAX_COLUMN_WIDTH);
        assert_eq!(widths[2], "€1.50".chars().count());
    }

    #[test]
    fn test_json_value_types() {
        assert_eq!(json_value(None), serde_json::Value::Null);
        assert_eq!(json_value(Some(&Value::Int(4))), serde_json::json!(4));
        assert_eq!(json_value(Some(&Value::Cost(2.5))), serde_json::json!(2.5));
        assert_eq!(
            json_value(Some(&Value::Measure {
                magnitude: 4.7,
                unit: "kΩ".to_string()
            })),
            serde_json::json!("4.7 kΩ")
        );
    }
}
