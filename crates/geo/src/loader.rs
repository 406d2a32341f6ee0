//! # Data Loader
//!
//! Reads the four static inputs once at startup and joins supply-shed rows to
//! municipality polygons. The resulting [`DataContext`] is immutable; every
//! filter, figure and export borrows from it and never rewrites it.
//!
//! ## Table of Contents
//! 1. DataContext - The loaded tables
//! 2. Table reading
//! 3. Join

use geojson::Geometry;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use crate::config::DashboardConfig;
use crate::error::{GeoError, Result};
use crate::records::{
    AssetRiskRecord, MunicipalityCode, MunicipalityGeometry, StateBoundary, SupplyShedRecord,
};
use crate::vector_import::{import_municipalities, import_states};

/// Columns the supply-shed table must carry
pub const SUPPLY_SHED_COLUMNS: [&str; 16] = [
    "origin_cod",
    "origin_mun",
    "origin_uf",
    "origin_biome",
    "origin_lat",
    "origin_long",
    "destination_cod",
    "destination_mun",
    "destination_state",
    "destination_biome",
    "destination_lat",
    "destination_long",
    "destination_cnpj",
    "destination_company",
    "destination_dt",
    "risk_score",
];

/// Columns the asset-risk table must carry
pub const ASSET_RISK_COLUMNS: [&str; 10] = [
    "destination_cod",
    "destination_mun",
    "destination_state",
    "destination_biome",
    "destination_lat",
    "destination_long",
    "destination_cnpj",
    "destination_company",
    "destination_dt",
    "asset_risk",
];

// ============================================================================
// 1. DataContext - The loaded tables
// ============================================================================

/// The process-wide risk tables, built once and shared read-only.
#[derive(Debug, Default)]
pub struct DataContext {
    municipalities: HashMap<MunicipalityCode, Arc<Geometry>>,
    supply_shed: Vec<SupplyShedRecord>,
    asset_risk: Vec<AssetRiskRecord>,
    states: Vec<StateBoundary>,
    join_misses: usize,
}

impl DataContext {
    /// Load every input named in `config`. Any failure is fatal.
    pub fn load(config: &DashboardConfig) -> Result<Self> {
        let data = &config.data;
        let delimiter = config
            .delimiter_byte()
            .map_err(|detail| GeoError::config(&config.base_dir, detail))?;

        let municipalities = import_municipalities(
            &config.resolve_path(&data.municipalities),
            &data.municipality_code_property,
        )?;
        let states = import_states(&config.resolve_path(&data.states))?;
        let supply_shed = read_table(
            &config.resolve_path(&data.supply_shed),
            delimiter,
            &SUPPLY_SHED_COLUMNS,
        )?;
        let asset_risk = read_table(
            &config.resolve_path(&data.asset_risk),
            delimiter,
            &ASSET_RISK_COLUMNS,
        )?;

        Ok(Self::from_parts(municipalities, supply_shed, asset_risk, states))
    }

    /// Assemble a context from already-parsed tables.
    ///
    /// Numbers the supply-shed rows, joins them to `municipalities` on
    /// `origin_code` and fixes each asset's marker color.
    pub fn from_parts(
        municipalities: Vec<MunicipalityGeometry>,
        mut supply_shed: Vec<SupplyShedRecord>,
        mut asset_risk: Vec<AssetRiskRecord>,
        states: Vec<StateBoundary>,
    ) -> Self {
        let municipalities: HashMap<MunicipalityCode, Arc<Geometry>> = municipalities
            .into_iter()
            .map(|m| (m.code, m.geometry))
            .collect();

        let join_misses = join_geometries(&municipalities, &mut supply_shed);
        if join_misses > 0 {
            tracing::warn!(
                "{} supply-shed rows have no matching municipality geometry",
                join_misses
            );
        }

        for asset in &mut asset_risk {
            asset.marker_color = asset.asset_risk.color();
        }

        tracing::info!(
            "Risk tables ready: {} municipalities, {} supply-shed rows, {} assets, {} states",
            municipalities.len(),
            supply_shed.len(),
            asset_risk.len(),
            states.len()
        );

        Self {
            municipalities,
            supply_shed,
            asset_risk,
            states,
            join_misses,
        }
    }

    /// Supply-shed rows in file order
    pub fn supply_shed(&self) -> &[SupplyShedRecord] {
        &self.supply_shed
    }

    /// Asset-risk rows in file order
    pub fn asset_risk(&self) -> &[AssetRiskRecord] {
        &self.asset_risk
    }

    /// State backdrop polygons
    pub fn states(&self) -> &[StateBoundary] {
        &self.states
    }

    /// Polygon for a municipality code, if the boundary file has one
    pub fn municipality_geometry(&self, code: &MunicipalityCode) -> Option<&Geometry> {
        self.municipalities.get(code).map(Arc::as_ref)
    }

    /// Supply-shed rows whose origin has no polygon
    pub fn join_misses(&self) -> usize {
        self.join_misses
    }
}

// ============================================================================
// 2. Table reading
// ============================================================================

/// Read a delimited table with a header row into typed records.
///
/// Every name in `required` must appear in the header; extra columns are
/// ignored.
pub fn read_table<T: DeserializeOwned>(path: &Path, delimiter: u8, required: &[&str]) -> Result<Vec<T>> {
    let file = std::fs::File::open(path).map_err(|source| GeoError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let csv_error = |source| GeoError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers = reader.headers().map_err(csv_error)?.clone();
    if let Some(column) = required.iter().find(|c| !headers.iter().any(|h| h == **c)) {
        return Err(GeoError::MissingColumn {
            path: path.to_path_buf(),
            column: column.to_string(),
        });
    }

    let rows = reader
        .deserialize()
        .collect::<std::result::Result<Vec<T>, _>>()
        .map_err(csv_error)?;

    tracing::info!("Read {} rows from {}", rows.len(), path.display());
    Ok(rows)
}

// ============================================================================
// 3. Join
// ============================================================================

/// Left join: attach origin polygons, keep rows that miss. Returns the miss count.
fn join_geometries(
    municipalities: &HashMap<MunicipalityCode, Arc<Geometry>>,
    supply_shed: &mut [SupplyShedRecord],
) -> usize {
    let mut misses = 0;
    for (row, record) in supply_shed.iter_mut().enumerate() {
        record.row = row;
        record.geometry = municipalities.get(&record.origin_code).cloned();
        if record.geometry.is_none() {
            misses += 1;
        }
    }
    misses
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::risk::RiskCategory;

    const SUPPLY_SHED_CSV: &str = "\
origin_cod;origin_mun;origin_uf;origin_biome;origin_lat;origin_long;destination_cod;destination_mun;destination_state;destination_biome;destination_lat;destination_long;destination_cnpj;destination_company;destination_dt;risk_score
3170206;UBERLANDIA;MG;CERRADO;-18.91;-48.27;3170206;UBERLANDIA;MG;CERRADO;-18.92;-48.28;01234567000189;CARGILL;CARGILL UBERLANDIA;Negligible
5107925;SORRISO;MT;AMAZONIA;;;3170206;UBERLANDIA;MG;CERRADO;-18.92;-48.28;01234567000189;CARGILL;CARGILL UBERLANDIA;At-risk
";

    const ASSET_RISK_CSV: &str = "\
destination_cod;destination_mun;destination_state;destination_biome;destination_lat;destination_long;destination_cnpj;destination_company;destination_dt;asset_risk;extra
3170206;UBERLANDIA;MG;CERRADO;-18.92;-48.28;01234567000189;CARGILL;CARGILL UBERLANDIA;At-risk;ignored
";

    const MUNICIPALITIES: &str = r#"{"type": "FeatureCollection", "features": [
        {"type": "Feature", "properties": {"Geocod": 3170206},
         "geometry": {"type": "Polygon", "coordinates": [[[-48.3,-18.9],[-48.2,-18.9],[-48.2,-18.8],[-48.3,-18.9]]]}}
    ]}"#;

    const STATES: &str = r#"{"type": "FeatureCollection", "features": [
        {"type": "Feature", "properties": {"sigla": "MG"},
         "geometry": {"type": "Polygon", "coordinates": [[[-51,-23],[-40,-23],[-40,-14],[-51,-23]]]}}
    ]}"#;

    fn write_project(dir: &Path, supply_shed: &str) -> DashboardConfig {
        std::fs::write(dir.join("mun.geojson"), MUNICIPALITIES).unwrap();
        std::fs::write(dir.join("states.geojson"), STATES).unwrap();
        std::fs::write(dir.join("supply_shed.csv"), supply_shed).unwrap();
        std::fs::write(dir.join("asset_risk.csv"), ASSET_RISK_CSV).unwrap();
        let path = dir.join("dashboard.toml");
        std::fs::write(
            &path,
            r#"
[data]
municipalities = "mun.geojson"
states = "states.geojson"
supply_shed = "supply_shed.csv"
asset_risk = "asset_risk.csv"
"#,
        )
        .unwrap();
        DashboardConfig::load(&path).unwrap()
    }

    #[test]
    fn test_load_joins_and_keeps_misses() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_project(dir.path(), SUPPLY_SHED_CSV);

        let ctx = DataContext::load(&config).unwrap();
        assert_eq!(ctx.supply_shed().len(), 2);
        assert_eq!(ctx.join_misses(), 1);

        let joined = &ctx.supply_shed()[0];
        assert_eq!(joined.row, 0);
        assert!(joined.geometry.is_some());
        assert_eq!(joined.destination_cnpj, "01234567000189");

        let missed = &ctx.supply_shed()[1];
        assert_eq!(missed.row, 1);
        assert!(missed.geometry.is_none());
        assert_eq!(missed.origin_lat, None);
        assert_eq!(missed.risk_score, RiskCategory::AtRisk);

        assert_eq!(ctx.asset_risk()[0].marker_color, "#FF6A5F");
        assert_eq!(ctx.states().len(), 1);
        assert!(ctx
            .municipality_geometry(&MunicipalityCode::from("3170206"))
            .is_some());
    }

    #[test]
    fn test_blank_asset_coordinates_load() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_project(dir.path(), SUPPLY_SHED_CSV);
        let blank = ASSET_RISK_CSV.replace("-18.92;-48.28", ";");
        std::fs::write(dir.path().join("asset_risk.csv"), blank).unwrap();

        let ctx = DataContext::load(&config).unwrap();
        let asset = &ctx.asset_risk()[0];
        assert_eq!(asset.destination_lat, None);
        assert_eq!(asset.destination_long, None);
        assert_eq!(asset.position(), None);
        assert_eq!(asset.asset_risk, RiskCategory::AtRisk);
    }

    #[test]
    fn test_missing_column_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let renamed = SUPPLY_SHED_CSV.replacen("destination_mun", "dest_mun", 1);
        let config = write_project(dir.path(), &renamed);

        let err = DataContext::load(&config).unwrap_err();
        assert!(matches!(err, GeoError::MissingColumn { column, .. } if column == "destination_mun"));
    }

    #[test]
    fn test_unknown_risk_label_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let bad = SUPPLY_SHED_CSV.replace("At-risk", "High");
        let config = write_project(dir.path(), &bad);

        assert!(matches!(DataContext::load(&config), Err(GeoError::Csv { .. })));
    }

    #[test]
    fn test_missing_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_project(dir.path(), SUPPLY_SHED_CSV);
        std::fs::remove_file(dir.path().join("asset_risk.csv")).unwrap();

        assert!(matches!(DataContext::load(&config), Err(GeoError::Io { .. })));
    }
}
