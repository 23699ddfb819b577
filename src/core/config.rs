//! Configuration management with layered hierarchy

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the config file, both globally and inside an inventory directory
pub const CONFIG_FILE: &str = "config.yaml";

const DEFAULT_CURRENCY: &str = "$";

/// Inventario configuration with layered hierarchy
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Inventory directory used when `--inventory` is not given
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inventory: Option<PathBuf>,

    /// Currency symbol shown in front of costs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,

    /// Low-stock threshold given to new items and products
    #[serde(skip_serializing_if = "Option::is_none")]
    pub low_stock_default: Option<u64>,
}

impl Config {
    /// Load configuration from all sources, merging in priority order
    ///
    /// `inventory` is the directory named on the command line, if any; it
    /// decides which inventory's own config file is read.
    pub fn load(inventory: Option<&Path>) -> Self {
        Self::load_from(
            Self::global_config_path().as_deref(),
            inventory,
            |key| std::env::var(key).ok(),
        )
    }

    fn load_from(
        global_path: Option<&Path>,
        inventory: Option<&Path>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Self {
        // 1. Built-in defaults (already in Default impl)
        let mut config = Config::default();

        // 2. Global user config (~/.config/inventario/config.yaml)
        if let Some(global) = global_path.and_then(Self::read_file) {
            config.merge(global);
        }

        // 3. Inventory config (<inventory>/config.yaml)
        let dir = inventory
            .map(Path::to_path_buf)
            .or_else(|| env("INVENTARIO_PATH").map(PathBuf::from))
            .or_else(|| config.inventory.clone());
        if let Some(local) = dir
            .as_deref()
            .and_then(|d| Self::read_file(&d.join(CONFIG_FILE)))
        {
            config.merge(local);
        }

        // 4. Environment variables
        if let Some(path) = env("INVENTARIO_PATH") {
            config.inventory = Some(PathBuf::from(path));
        }
        if let Some(currency) = env("INVENTARIO_CURRENCY") {
            config.currency = Some(currency);
        }

        // The command line beats everything
        if let Some(dir) = inventory {
            config.inventory = Some(dir.to_path_buf());
        }

        config
    }

    fn read_file(path: &Path) -> Option<Config> {
        if !path.exists() {
            return None;
        }
        let contents = std::fs::read_to_string(path).ok()?;
        match serde_yml::from_str::<Config>(&contents) {
            Ok(config) => Some(config),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable config");
                None
            }
        }
    }

    /// Get the path to the global config file
    pub fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "inventario")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE))
    }

    /// Merge another config into this one (other takes precedence)
    fn merge(&mut self, other: Config) {
        if other.inventory.is_some() {
            self.inventory = other.inventory;
        }
        if other.currency.is_some() {
            self.currency = other.currency;
        }
        if other.low_stock_default.is_some() {
            self.low_stock_default = other.low_stock_default;
        }
    }

    /// The inventory directory, defaulting to the current directory
    pub fn inventory_dir(&self) -> PathBuf {
        self.inventory
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn currency(&self) -> &str {
        self.currency.as_deref().unwrap_or(DEFAULT_CURRENCY)
    }
}
