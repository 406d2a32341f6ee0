//! Error types for the risk data pipeline
//!
//! ## Table of Contents
//! - **GeoError**: Startup and export failure modes
//! - **Result**: Type alias for `Result<T, GeoError>`

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, GeoError>;

/// Main error type for loading, filtering and exporting risk data.
///
/// Everything raised by the loader is fatal: the dashboard refuses to start
/// rather than serving partial tables.
#[derive(Error, Debug)]
pub enum GeoError {
    /// File could not be read
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// GeoJSON file is malformed or has an unexpected shape
    #[error("failed to parse GeoJSON {}: {detail}", .path.display())]
    GeoJson { path: PathBuf, detail: String },

    /// Delimited table is malformed or does not match the expected columns
    #[error("failed to parse table {}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// A required column is absent from a table header
    #[error("{} has no '{column}' column", .path.display())]
    MissingColumn { path: PathBuf, column: String },

    /// `dashboard.toml` is missing, malformed or inconsistent
    #[error("configuration error in {}: {detail}", .path.display())]
    Config { path: PathBuf, detail: String },

    /// A boundary feature lacks the municipality code used for the join
    #[error("feature {feature} in {} has no '{property}' property", .path.display())]
    MissingJoinKey {
        path: PathBuf,
        feature: usize,
        property: String,
    },

    /// A risk label outside the two known categories
    #[error("unknown risk category '{0}'")]
    InvalidRiskCategory(String),

    /// Archive assembly failed
    #[error("export error: {0}")]
    Export(String),
}

impl GeoError {
    /// Create a configuration error
    pub fn config(path: impl Into<PathBuf>, detail: impl Into<String>) -> Self {
        Self::Config {
            path: path.into(),
            detail: detail.into(),
        }
    }

    /// Create an export error
    pub fn export(msg: impl Into<String>) -> Self {
        Self::Export(msg.into())
    }
}

impl From<zip::result::ZipError> for GeoError {
    fn from(err: zip::result::ZipError) -> Self {
        Self::Export(err.to_string())
    }
}
