//! # Soy Risk Geo - Deforestation Risk Tables, Filters, Figures and Exports
//!
//! Loads pre-computed soy supply-shed and storage-facility risk tables plus
//! boundary GeoJSON from local files, filters them by destination
//! municipality and company, and turns the result into a Plotly map figure
//! or a zipped CSV download. No database, no score computation.
//!
//! ## Architecture
//! - `dashboard.toml` - Declarative config (input paths, defaults)
//! - `data/` - Boundary GeoJSON and the two `;`-separated risk tables
//!
//! ## Modules
//! - `config` - Parse `dashboard.toml`
//! - `error` - `GeoError` and the crate `Result`
//! - `risk` - Risk categories and their colors
//! - `records` - Row types and the municipality join key
//! - `vector_import` - GeoJSON → municipality / state boundaries
//! - `loader` - Startup load and geometry join into a `DataContext`
//! - `filter` - Selection filtering and dropdown options
//! - `figure` - Three-layer Plotly map
//! - `export` - Renamed CSVs zipped into a data-URI download
//!
//! ## Table of Contents
//! 1. Module declarations
//! 2. Re-exports

pub mod config;
pub mod error;
pub mod export;
pub mod figure;
pub mod filter;
pub mod loader;
pub mod records;
pub mod risk;
pub mod vector_import;

#[cfg(any(test, feature = "fixtures"))]
pub mod fixtures;

pub use config::DashboardConfig;
pub use error::{GeoError, Result};
pub use export::{build_archive, download_link, DownloadLink, ExportArchive};
pub use figure::{build_figure, Figure};
pub use filter::{
    derive_company_options, filter_by_municipality_and_company, municipality_options,
    DropdownOption, DropdownState, FilteredView, Selection, ALL,
};
pub use loader::DataContext;
pub use records::{AssetRiskRecord, MunicipalityCode, SupplyShedRecord};
pub use risk::RiskCategory;
