//! Shared helper functions for CLI commands
//!
//! This module contains utility functions that are used across multiple
//! command modules to avoid code duplication.

use console::style;
use miette::{IntoDiagnostic, Result};
use std::path::{Path, PathBuf};

use crate::cli::GlobalOpts;
use crate::core::persistence::{PersistenceWarning, ITEMS_FILE, PRODUCTS_DIR};
use crate::core::value::{self, Value};
use crate::core::{Config, SharedInventory};
use crate::schema::{EntityKind, FieldId};

/// An opened inventory directory plus the configuration that located it
pub struct Session {
    pub config: Config,
    pub dir: PathBuf,
    pub inventory: SharedInventory,
    quiet: bool,
}

impl Session {
    /// Resolve the inventory directory and load it
    ///
    /// Fails when the directory was never initialized; per-file problems are
    /// printed as warnings and the rest of the inventory still loads.
    pub fn open(global: &GlobalOpts) -> Result<Self> {
        let config = Config::load(global.inventory.as_deref());
        let dir = config.inventory_dir();
        if !is_inventory(&dir) {
            return Err(miette::miette!(
                "No inventory found at {} (run `inv init` to create one)",
                dir.display()
            ));
        }

        let inventory = SharedInventory::default();
        let warnings = inventory.load(&dir);
        print_warnings(&warnings, global.quiet);

        Ok(Self {
            config,
            dir,
            inventory,
            quiet: global.quiet,
        })
    }

    /// Reload from disk, dropping any unsaved changes
    pub fn reload(&self) {
        let warnings = self.inventory.load(&self.dir);
        print_warnings(&warnings, self.quiet);
    }

    /// Write the inventory back
    ///
    /// Any file that failed to write, or was held back because it did not
    /// load, fails the command.
    pub fn save(&self) -> Result<()> {
        let warnings = self.inventory.save(&self.dir);
        print_warnings(&warnings, self.quiet);
        let failed = warnings
            .iter()
            .filter(|w| {
                matches!(
                    w,
                    PersistenceWarning::WriteFailed { .. } | PersistenceWarning::Held { .. }
                )
            })
            .count();
        if failed > 0 {
            return Err(miette::miette!(
                "{} file(s) in {} could not be written",
                failed,
                self.dir.display()
            ));
        }
        Ok(())
    }

    pub fn currency(&self) -> &str {
        self.config.currency()
    }
}

/// Whether `dir` looks like an initialized inventory
pub fn is_inventory(dir: &Path) -> bool {
    dir.join(ITEMS_FILE).is_file() || dir.join(PRODUCTS_DIR).is_dir()
}

/// Print load/save warnings to stderr
pub fn print_warnings(warnings: &[PersistenceWarning], quiet: bool) {
    if quiet {
        return;
    }
    for warning in warnings {
        eprintln!("{} {}", style("!").yellow(), warning);
    }
}

/// Resolve a field key that must belong to `kind`
pub fn field_for(kind: EntityKind, key: &str) -> Result<FieldId> {
    Ok(kind.schema().field_by_key(key)?)
}

/// Split `key=value` into a field of `kind` and its raw text
pub fn parse_assignment(kind: EntityKind, assignment: &str) -> Result<(FieldId, String)> {
    let (key, text) = assignment
        .split_once('=')
        .ok_or_else(|| miette::miette!("Expected key=value, got '{}'", assignment))?;
    Ok((field_for(kind, key.trim())?, text.to_string()))
}

/// Parse `key=value` pairs into typed initial values for a new entity
///
/// Empty text is skipped, so the field keeps its default.
pub fn initial_values(kind: EntityKind, assignments: &[String]) -> Result<Vec<(FieldId, Value)>> {
    let mut values = Vec::new();
    for assignment in assignments {
        let (field, text) = parse_assignment(kind, assignment)?;
        if let Some(parsed) = value::decode_cell(&text, field.tag())? {
            values.push((field, parsed));
        }
    }
    Ok(values)
}

/// Ask before a destructive action; `--yes` skips the prompt
pub fn confirm(prompt: &str, assume_yes: bool) -> Result<bool> {
    if assume_yes {
        return Ok(true);
    }
    dialoguer::Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .into_diagnostic()
}

/// Truncate a string to max_len characters, adding "..." if truncated
///
/// Useful for table columns that need fixed-width output.
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Escape a string for CSV output
///
/// Handles commas, quotes, and line breaks according to RFC 4180.
pub fn escape_csv(s: &str) -> String {
    if s.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}
