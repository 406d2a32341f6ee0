//! # Dashboard Project Configuration
//!
//! Parses `dashboard.toml`, the declarative config naming the four static
//! inputs and the dashboard defaults. Paths inside it are relative to the
//! directory holding the file.
//!
//! ## Table of Contents
//! 1. DashboardConfig - Top-level config
//! 2. DataConfig - Input files and table format
//! 3. DefaultsConfig - Initial selections and download name
//! 4. Parsing

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{GeoError, Result};

// ============================================================================
// 1. DashboardConfig - Top-level config
// ============================================================================

/// Top-level dashboard configuration, parsed from `dashboard.toml`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Input files
    pub data: DataConfig,
    /// Initial selections and download naming
    #[serde(default)]
    pub dashboard: DefaultsConfig,
    /// Directory the relative data paths resolve against (set on load)
    #[serde(skip)]
    pub base_dir: PathBuf,
}

// ============================================================================
// 2. DataConfig - Input files and table format
// ============================================================================

/// The four static inputs read once at startup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Municipality boundaries (GeoJSON, one feature per municipality)
    pub municipalities: String,
    /// State boundaries used as the map backdrop (GeoJSON)
    pub states: String,
    /// Supply-shed links, one row per origin → destination pair
    pub supply_shed: String,
    /// Per-asset risk, one row per storage facility
    pub asset_risk: String,
    /// Feature property holding the municipality code
    #[serde(default = "default_code_property")]
    pub municipality_code_property: String,
    /// Field delimiter of both tables
    #[serde(default = "default_delimiter")]
    pub delimiter: String,
}

fn default_code_property() -> String {
    "Geocod".to_string()
}

fn default_delimiter() -> String {
    ";".to_string()
}

// ============================================================================
// 3. DefaultsConfig - Initial selections and download name
// ============================================================================

/// Dashboard defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Destination municipalities selected when the page first loads
    #[serde(default = "default_municipalities")]
    pub default_municipalities: Vec<String>,
    /// File name offered for the download archive
    #[serde(default = "default_download_file_name")]
    pub download_file_name: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            default_municipalities: default_municipalities(),
            download_file_name: default_download_file_name(),
        }
    }
}

fn default_municipalities() -> Vec<String> {
    vec!["UBERLANDIA".to_string()]
}

fn default_download_file_name() -> String {
    "Asset_and_SupplyShed_data.zip".to_string()
}

// ============================================================================
// 4. Parsing
// ============================================================================

impl DashboardConfig {
    /// Load a DashboardConfig from a `dashboard.toml` file path
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| GeoError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: DashboardConfig =
            toml::from_str(&content).map_err(|e| GeoError::config(path, e.to_string()))?;
        config.base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        config.delimiter_byte().map_err(|detail| GeoError::config(path, detail))?;
        Ok(config)
    }

    /// Resolve a path from the `[data]` section against the config directory
    pub fn resolve_path(&self, relative: &str) -> PathBuf {
        self.base_dir.join(relative)
    }

    /// The table delimiter as the single byte the CSV reader expects
    pub fn delimiter_byte(&self) -> std::result::Result<u8, String> {
        match self.data.delimiter.as_bytes() {
            [b] => Ok(*b),
            _ => Err(format!(
                "delimiter must be a single byte, got '{}'",
                self.data.delimiter
            )),
        }
    }
}
