//! Configuration management for stockpile.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::export::ExportOptions;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "stockpile";

/// Default backing file name.
const DATA_FILE_NAME: &str = "inventory.json";

/// Prefix for environment overrides. Nested keys are separated by `__`.
const ENV_PREFIX: &str = "STOCKPILE_";

/// Upper bound for `export.price_decimals`.
const MAX_PRICE_DECIMALS: usize = 10;

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `STOCKPILE_`, e.g.
///    `STOCKPILE_STORAGE__DATA_FILE`)
/// 2. TOML config file at `~/.config/stockpile/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Export configuration.
    pub export: ExportConfig,
}

/// Storage-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the backing file.
    /// Defaults to `~/.local/share/stockpile/inventory.json`
    pub data_file: Option<PathBuf>,
    /// Indent the backing file for human readers.
    pub pretty: bool,
}

/// CSV export configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Destination used when `export` is given no path.
    pub csv_path: PathBuf,
    /// Field separator.
    pub delimiter: char,
    /// Digits after the decimal point in the price column.
    pub price_decimals: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_file: None, // Will be resolved to default at runtime
            pretty: true,
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        let options = ExportOptions::default();
        Self {
            csv_path: PathBuf::from("inventory.csv"),
            delimiter: options.delimiter,
            price_decimals: options.price_decimals,
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// Configuration is loaded in this order (later sources override earlier):
    /// 1. Default values
    /// 2. TOML config file (if exists)
    /// 3. Environment variables (prefixed with `STOCKPILE_`)
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if let Some(path) = &self.storage.data_file {
            if path.as_os_str().is_empty() {
                return Err(Error::ConfigValidation {
                    message: "storage.data_file must not be empty".to_string(),
                });
            }
        }

        if matches!(self.export.delimiter, '"' | '\r' | '\n') {
            return Err(Error::ConfigValidation {
                message: format!(
                    "export.delimiter {:?} cannot be a quote or line break",
                    self.export.delimiter
                ),
            });
        }

        if self.export.price_decimals > MAX_PRICE_DECIMALS {
            return Err(Error::ConfigValidation {
                message: format!(
                    "export.price_decimals ({}) cannot be greater than {MAX_PRICE_DECIMALS}",
                    self.export.price_decimals
                ),
            });
        }

        Ok(())
    }

    /// Get the backing file path, resolving defaults if not set.
    #[must_use]
    pub fn data_file(&self) -> PathBuf {
        self.storage
            .data_file
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATA_FILE_NAME))
    }

    /// Get the CSV formatting options.
    #[must_use]
    pub fn export_options(&self) -> ExportOptions {
        ExportOptions {
            delimiter: self.export.delimiter,
            price_decimals: self.export.price_decimals,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert!(config.storage.data_file.is_none());
        assert!(config.storage.pretty);
        assert_eq!(config.export.csv_path, PathBuf::from("inventory.csv"));
        assert_eq!(config.export.delimiter, ',');
        assert_eq!(config.export.price_decimals, 2);
    }

    #[test]
    fn test_validate_valid_config() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_empty_data_file() {
        let mut config = Config::default();
        config.storage.data_file = Some(PathBuf::new());

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("data_file"));
    }

    #[test]
    fn test_validate_quote_delimiter() {
        let mut config = Config::default();
        config.export.delimiter = '"';

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("delimiter"));

        config.export.delimiter = '\n';
        assert!(config.validate().is_err());

        config.export.delimiter = ';';
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_price_decimals() {
        let mut config = Config::default();
        config.export.price_decimals = 11;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("price_decimals"));

        config.export.price_decimals = 10;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_data_file_default() {
        let config = Config::default();
        let path = config.data_file();

        assert!(path.to_string_lossy().contains("stockpile"));
        assert!(path.ends_with("inventory.json"));
    }

    #[test]
    fn test_data_file_custom() {
        let mut config = Config::default();
        config.storage.data_file = Some(PathBuf::from("/custom/path/stock.json"));

        assert_eq!(config.data_file(), PathBuf::from("/custom/path/stock.json"));
    }

    #[test]
    fn test_export_options() {
        let mut config = Config::default();
        config.export.delimiter = ';';
        config.export.price_decimals = 3;

        let options = config.export_options();
        assert_eq!(options.delimiter, ';');
        assert_eq!(options.price_decimals, 3);
    }

    #[test]
    fn test_default_config_path() {
        let path = Config::default_config_path();
        assert!(path.to_string_lossy().contains("stockpile"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }

    #[test]
    fn test_load_nonexistent_config() {
        // Loading from a nonexistent path should work (uses defaults)
        let result = Config::load_from(Some(PathBuf::from("/nonexistent/config.toml")));
        assert!(result.is_ok());

        let config = result.unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_toml_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            concat!(
                "[storage]\n",
                "data_file = \"/srv/stock.json\"\n",
                "pretty = false\n",
                "\n",
                "[export]\n",
                "delimiter = \";\"\n",
            ),
        )
        .unwrap();

        let config = Config::load_from(Some(path)).unwrap();
        assert_eq!(config.data_file(), PathBuf::from("/srv/stock.json"));
        assert!(!config.storage.pretty);
        assert_eq!(config.export.delimiter, ';');
        assert_eq!(config.export.price_decimals, 2);
    }

    #[test]
    fn test_load_invalid_toml_values() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[export]\nprice_decimals = 42\n").unwrap();

        let err = Config::load_from(Some(path)).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Configuration);
    }

    #[test]
    fn test_config_serialize() {
        let config = Config::default();
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("price_decimals"));
        assert!(json.contains("pretty"));
    }

    #[test]
    fn test_storage_config_deserialize() {
        let json = r#"{"data_file": "/tmp/stock.json"}"#;
        let storage: StorageConfig = serde_json::from_str(json).unwrap();
        assert_eq!(storage.data_file, Some(PathBuf::from("/tmp/stock.json")));
        assert!(storage.pretty);
    }
}
