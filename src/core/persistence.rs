//! Persistence - the CSV inventory directory
//!
//! Layout:
//!
//! ```text
//! <dir>/items.csv           header of item keys, one item per row,
//!                           then (name, value) custom pairs past the header
//! <dir>/preferences.csv     item view flags, product view flags
//! <dir>/products/<id>.csv   product keys, product values, part keys, parts
//! ```
//!
//! Loading never fails as a whole. Whatever cannot be read is skipped and
//! reported as a [`PersistenceWarning`], and each file is written
//! independently of the others. A file that exists but did not load is
//! recorded in [`HeldFiles`] and left untouched by the next save.

use csv::{ReaderBuilder, WriterBuilder};
use miette::Diagnostic;
use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::entity::{Details, Entity};
use crate::core::inventory::Inventory;
use crate::core::prefs::VisibilityPrefs;
use crate::core::value;
use crate::entities::{CustomField, Item, Part, Product};
use crate::schema::{EntityKind, FieldId, Schema, PART_SCHEMA};

pub const ITEMS_FILE: &str = "items.csv";
pub const PREFERENCES_FILE: &str = "preferences.csv";
pub const PRODUCTS_DIR: &str = "products";

/// Non-fatal problem met while loading or saving
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum PersistenceWarning {
    #[error("Cannot read {}: {reason}", .path.display())]
    #[diagnostic(code(inventario::persistence::file_unavailable), severity(Warning))]
    FileUnavailable { path: PathBuf, reason: String },

    #[error("Cannot write {}: {reason}", .path.display())]
    #[diagnostic(code(inventario::persistence::write_failed), severity(Warning))]
    WriteFailed { path: PathBuf, reason: String },

    #[error("Ignoring unknown column '{column}' in {}", .path.display())]
    #[diagnostic(code(inventario::persistence::unknown_column), severity(Warning))]
    UnknownColumn { path: PathBuf, column: String },

    #[error("{}:{row}: bad {field} cell left unset: {reason}", .path.display())]
    #[diagnostic(code(inventario::persistence::invalid_cell), severity(Warning))]
    InvalidCell {
        path: PathBuf,
        row: usize,
        field: FieldId,
        reason: String,
    },

    #[error("Skipping malformed {}: {reason}", .path.display())]
    #[diagnostic(code(inventario::persistence::malformed), severity(Warning))]
    Malformed { path: PathBuf, reason: String },

    #[error("{}:{row}: text is not valid UTF-8, replaced bad bytes", .path.display())]
    #[diagnostic(code(inventario::persistence::invalid_text), severity(Warning))]
    InvalidText { path: PathBuf, row: usize },

    #[error("{}:{row}: skipping unreadable row: {reason}", .path.display())]
    #[diagnostic(code(inventario::persistence::skipped_row), severity(Warning))]
    SkippedRow {
        path: PathBuf,
        row: usize,
        reason: String,
    },

    #[error("Left {} unchanged because it did not load", .path.display())]
    #[diagnostic(
        code(inventario::persistence::held),
        severity(Warning),
        help("fix or move the file by hand, then run the command again")
    )]
    Held { path: PathBuf },
}

/// Files the last load found but could not read
///
/// Saving never overwrites or removes these.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeldFiles {
    pub items: bool,
    pub preferences: bool,
    /// File names inside the products directory
    pub products: BTreeSet<String>,
}

impl HeldFiles {
    pub fn is_empty(&self) -> bool {
        !self.items && !self.preferences && self.products.is_empty()
    }
}

/// Why a file produced no rows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReadFailure {
    /// Not there at all
    Missing,
    /// There but unreadable
    Unreadable,
}

/// Result of loading an inventory directory
#[derive(Debug, Default)]
pub struct LoadOutcome {
    pub inventory: Inventory,
    pub warnings: Vec<PersistenceWarning>,
}

/// Collects warnings, logging each one as it arrives
#[derive(Default)]
struct Warnings(Vec<PersistenceWarning>);

impl Warnings {
    fn push(&mut self, warning: PersistenceWarning) {
        match warning {
            PersistenceWarning::InvalidCell { .. } => tracing::debug!("{}", warning),
            _ => tracing::warn!("{}", warning),
        }
        self.0.push(warning);
    }
}

type Rows = Vec<Vec<String>>;

/// Load every file of an inventory directory
pub fn load(dir: &Path) -> LoadOutcome {
    let mut warnings = Warnings::default();

    let mut held = HeldFiles::default();

    let items = load_items(&dir.join(ITEMS_FILE), &mut warnings).unwrap_or_else(|failure| {
        held.items = failure == ReadFailure::Unreadable;
        Vec::new()
    });
    let products = load_products(&dir.join(PRODUCTS_DIR), &mut warnings, &mut held.products);
    let visibility =
        load_preferences(&dir.join(PREFERENCES_FILE), &mut warnings).unwrap_or_else(|failure| {
            held.preferences = failure == ReadFailure::Unreadable;
            VisibilityPrefs::default()
        });

    let mut inventory = Inventory {
        items: items.into_iter().collect(),
        products: products.into_iter().collect(),
        visibility,
        held,
    };
    let regenerated = inventory.ensure_unique_ids();
    if regenerated > 0 {
        tracing::debug!(regenerated, dir = %dir.display(), "assigned fresh ids on load");
    }

    LoadOutcome {
        inventory,
        warnings: warnings.0,
    }
}

/// Write every file of an inventory directory
///
/// Product files of products no longer in the inventory are removed. Held
/// files are neither written nor removed; a held items or preferences file
/// is reported as [`PersistenceWarning::Held`].
pub fn save(dir: &Path, inventory: &Inventory) -> Vec<PersistenceWarning> {
    let mut warnings = Warnings::default();
    let products_dir = dir.join(PRODUCTS_DIR);
    if let Err(e) = fs::create_dir_all(&products_dir) {
        warnings.push(PersistenceWarning::WriteFailed {
            path: products_dir.clone(),
            reason: e.to_string(),
        });
    }

    let held = &inventory.held;
    let items_path = dir.join(ITEMS_FILE);
    if held.items {
        warnings.push(PersistenceWarning::Held { path: items_path });
    } else if let Err(e) = write_rows(&items_path, &item_rows(inventory)) {
        warnings.push(PersistenceWarning::WriteFailed {
            path: items_path,
            reason: e.to_string(),
        });
    }

    let prefs_path = dir.join(PREFERENCES_FILE);
    if held.preferences {
        warnings.push(PersistenceWarning::Held { path: prefs_path });
    } else if let Err(e) = write_rows(&prefs_path, &preference_rows(&inventory.visibility)) {
        warnings.push(PersistenceWarning::WriteFailed {
            path: prefs_path,
            reason: e.to_string(),
        });
    }

    // File names that must survive the stale sweep, written or not
    let mut keep: HashSet<String> = held.products.iter().cloned().collect();
    let mut written = HashSet::new();
    for product in &inventory.products {
        let name = product_file_name(product.id());
        let path = products_dir.join(&name);
        if held.products.contains(&name) {
            warnings.push(PersistenceWarning::Held { path });
            continue;
        }
        if !written.insert(name.clone()) {
            warnings.push(PersistenceWarning::WriteFailed {
                path,
                reason: format!("another product is already stored as {}", name),
            });
            continue;
        }
        if let Err(e) = write_rows(&path, &product_rows(product)) {
            warnings.push(PersistenceWarning::WriteFailed {
                path,
                reason: e.to_string(),
            });
        }
        keep.insert(name);
    }
    remove_stale_products(&products_dir, &keep, &mut warnings);

    warnings.0
}

/// File name of a product's CSV; path separators and leading dots are
/// replaced so an id can never escape the products directory
pub fn product_file_name(id: &str) -> String {
    let stem: String = id
        .chars()
        .enumerate()
        .map(|(n, c)| match c {
            '/' | '\\' | ':' => '_',
            '.' if n == 0 => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    format!("{}.csv", stem)
}

/// Read every record of a CSV file
///
/// Cells are decoded one at a time, so bad bytes cost only the bytes. A
/// record the parser rejects becomes an empty row, which keeps the row
/// positions of a product file intact. An I/O error partway through makes
/// the whole file unreadable.
fn read_rows(path: &Path, warnings: &mut Warnings) -> Result<Rows, ReadFailure> {
    if !path.exists() {
        warnings.push(PersistenceWarning::FileUnavailable {
            path: path.to_path_buf(),
            reason: "not found".to_string(),
        });
        return Err(ReadFailure::Missing);
    }
    let unreadable = |warnings: &mut Warnings, e: csv::Error| {
        warnings.push(PersistenceWarning::FileUnavailable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        });
        ReadFailure::Unreadable
    };

    let mut reader = match ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
    {
        Ok(reader) => reader,
        Err(e) => return Err(unreadable(warnings, e)),
    };

    let mut rows = Vec::new();
    for (idx, record) in reader.byte_records().enumerate() {
        let row = idx + 1;
        match record {
            Ok(record) => rows.push(
                record
                    .iter()
                    .map(|cell| decode_text(cell, path, row, warnings))
                    .collect(),
            ),
            Err(e) if matches!(e.kind(), csv::ErrorKind::Io(_)) => {
                return Err(unreadable(warnings, e));
            }
            Err(e) => {
                warnings.push(PersistenceWarning::SkippedRow {
                    path: path.to_path_buf(),
                    row,
                    reason: e.to_string(),
                });
                rows.push(Vec::new());
            }
        }
    }
    Ok(rows)
}

fn decode_text(cell: &[u8], path: &Path, row: usize, warnings: &mut Warnings) -> String {
    match std::str::from_utf8(cell) {
        Ok(text) => text.to_string(),
        Err(_) => {
            warnings.push(PersistenceWarning::InvalidText {
                path: path.to_path_buf(),
                row,
            });
            String::from_utf8_lossy(cell).into_owned()
        }
    }
}

fn write_rows(path: &Path, rows: &[Vec<String>]) -> Result<(), csv::Error> {
    let mut writer = WriterBuilder::new().flexible(true).from_path(path)?;
    for row in rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Map header cells to schema fields, warning about unknown keys
fn header_fields(
    header: &[String],
    schema: &Schema,
    path: &Path,
    warnings: &mut Warnings,
) -> Vec<Option<FieldId>> {
    header
        .iter()
        .map(|key| match schema.field_by_key(key.trim()) {
            Ok(field) => Some(field),
            Err(_) => {
                warnings.push(PersistenceWarning::UnknownColumn {
                    path: path.to_path_buf(),
                    column: key.clone(),
                });
                None
            }
        })
        .collect()
}

/// Decode one data row against its header into fresh details
fn decode_row(
    kind: EntityKind,
    columns: &[Option<FieldId>],
    row: &[String],
    location: (&Path, usize),
    warnings: &mut Warnings,
) -> Details {
    let mut details = Details::new(kind);
    for (field, text) in columns.iter().zip(row) {
        let Some(field) = *field else {
            continue;
        };
        match value::decode_cell(text, field.tag()) {
            Ok(decoded) => {
                let _ = details.set(field, decoded);
            }
            Err(e) => warnings.push(PersistenceWarning::InvalidCell {
                path: location.0.to_path_buf(),
                row: location.1,
                field,
                reason: e.to_string(),
            }),
        }
    }
    details
}

fn load_items(path: &Path, warnings: &mut Warnings) -> Result<Vec<Item>, ReadFailure> {
    let rows = read_rows(path, warnings)?;
    let Some((header, body)) = rows.split_first() else {
        return Ok(Vec::new());
    };
    let columns = header_fields(header, EntityKind::Item.schema(), path, warnings);

    let items = body
        .iter()
        .enumerate()
        .filter(|(_, row)| row.iter().any(|cell| !cell.is_empty()))
        .map(|(n, row)| {
            let details = decode_row(EntityKind::Item, &columns, row, (path, n + 2), warnings);
            let custom = row
                .get(columns.len()..)
                .unwrap_or_default()
                .chunks(2)
                .map(|pair| {
                    CustomField::new(pair[0].clone(), pair.get(1).cloned().unwrap_or_default())
                })
                .collect();
            Item::from_parts(details, custom)
        })
        .collect();
    Ok(items)
}

/// Load every product file; names of files that fail go into `held`
fn load_products(
    dir: &Path,
    warnings: &mut Warnings,
    held: &mut BTreeSet<String>,
) -> Vec<Product> {
    if !dir.is_dir() {
        warnings.push(PersistenceWarning::FileUnavailable {
            path: dir.to_path_buf(),
            reason: "not a directory".to_string(),
        });
        return Vec::new();
    }

    let entries = walkdir::WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "csv"));

    let mut products = Vec::new();
    for entry in entries {
        match load_product(entry.path(), warnings) {
            Some(product) => products.push(product),
            None => {
                held.insert(entry.file_name().to_string_lossy().into_owned());
            }
        }
    }
    products
}

fn load_product(path: &Path, warnings: &mut Warnings) -> Option<Product> {
    let rows = read_rows(path, warnings).ok()?;
    let blank = |row: &&Vec<String>| row.iter().all(|cell| cell.is_empty());
    let (Some(header), Some(values)) = (
        rows.first().filter(|row| !blank(row)),
        rows.get(1).filter(|row| !blank(row)),
    ) else {
        warnings.push(PersistenceWarning::Malformed {
            path: path.to_path_buf(),
            reason: "expected a header row and a value row".to_string(),
        });
        return None;
    };

    let columns = header_fields(header, EntityKind::Product.schema(), path, warnings);
    let details = decode_row(EntityKind::Product, &columns, values, (path, 2), warnings);

    let parts = match rows.get(2) {
        Some(part_header) => {
            let part_columns = header_fields(part_header, &PART_SCHEMA, path, warnings);
            rows.iter()
                .enumerate()
                .skip(3)
                .filter(|(_, row)| row.iter().any(|cell| !cell.is_empty()))
                .map(|(n, row)| {
                    Part::from_details(decode_row(
                        EntityKind::Part,
                        &part_columns,
                        row,
                        (path, n + 1),
                        warnings,
                    ))
                })
                .collect()
        }
        None => Vec::new(),
    };

    Some(Product::from_parts(details, parts))
}

fn load_preferences(path: &Path, warnings: &mut Warnings) -> Result<VisibilityPrefs, ReadFailure> {
    let rows = read_rows(path, warnings)?;
    let flags = |idx: usize| -> Vec<bool> {
        rows.get(idx)
            .map(|row| row.iter().map(|cell| parse_flag(cell)).collect())
            .unwrap_or_default()
    };
    Ok(VisibilityPrefs::from_rows(flags(0), flags(1)))
}

/// Anything not clearly "hidden" keeps the column visible
fn parse_flag(cell: &str) -> bool {
    !matches!(
        cell.trim().to_ascii_lowercase().as_str(),
        "false" | "0" | "no" | "hidden"
    )
}

fn encode_details(details: &Details) -> Vec<String> {
    details
        .iter()
        .map(|(spec, value)| value::encode_cell(value, spec.tag))
        .collect()
}

fn schema_keys(schema: &Schema) -> Vec<String> {
    schema.keys().map(String::from).collect()
}

fn item_rows(inventory: &Inventory) -> Rows {
    let mut rows = vec![schema_keys(EntityKind::Item.schema())];
    for item in &inventory.items {
        let mut row = encode_details(item.details());
        for custom in item.custom_fields() {
            row.push(custom.name.clone());
            row.push(custom.value.clone());
        }
        rows.push(row);
    }
    rows
}

fn product_rows(product: &Product) -> Rows {
    let mut rows = vec![
        schema_keys(EntityKind::Product.schema()),
        encode_details(product.details()),
        schema_keys(&PART_SCHEMA),
    ];
    rows.extend(product.parts().iter().map(|part| encode_details(part.details())));
    rows
}

fn preference_rows(prefs: &VisibilityPrefs) -> Rows {
    [EntityKind::Item, EntityKind::Product]
        .iter()
        .map(|kind| prefs.row(*kind).iter().map(|v| v.to_string()).collect())
        .collect()
}

fn remove_stale_products(dir: &Path, keep: &HashSet<String>, warnings: &mut Warnings) {
    let stale = walkdir::WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "csv"))
        .filter(|e| !keep.contains(e.file_name().to_string_lossy().as_ref()));

    for entry in stale {
        match fs::remove_file(entry.path()) {
            Ok(()) => tracing::debug!(path = %entry.path().display(), "removed stale product file"),
            Err(e) => warnings.push(PersistenceWarning::WriteFailed {
                path: entry.path().to_path_buf(),
                reason: e.to_string(),
            }),
        }
    }
}
