//! # Export Builder
//!
//! Packages the same [`FilteredView`] the map shows as a zip of two CSV files
//! with human-readable headers, delivered as a base64 data URI.
//!
//! ## Table of Contents
//! 1. Column rename tables
//! 2. CSV serialization
//! 3. Archive assembly
//! 4. Download link

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Serialize};
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::CompressionMethod;

use crate::error::{GeoError, Result};
use crate::filter::FilteredView;
use crate::records::{AssetRiskRecord, SupplyShedRecord};

/// Archive entry holding the supply-shed subset
pub const SUPPLY_SHED_ENTRY: &str = "supply_shed.csv";
/// Archive entry holding the asset subset
pub const ASSET_RISK_ENTRY: &str = "asset_risk.csv";

// ============================================================================
// 1. Column rename tables
// ============================================================================

/// Source column → export header, in export order
pub const SUPPLY_SHED_EXPORT: [(&str, &str); 16] = [
    ("origin_cod", "Origin municipality Trase ID (IBGE)"),
    ("origin_mun", "Origin municipality"),
    ("origin_uf", "Origin state"),
    ("origin_biome", "Origin biome"),
    ("origin_lat", "Origin latitude"),
    ("origin_long", "Origin longitude"),
    ("destination_cod", "Destination municipality Trase ID (IBGE)"),
    ("destination_mun", "Destination municipality"),
    ("destination_state", "Destination state"),
    ("destination_biome", "Destination biome"),
    ("destination_lat", "Destination latitude"),
    ("destination_long", "Destination longitude"),
    ("destination_cnpj", "Destination CNPJ"),
    ("destination_company", "Destination company"),
    ("destination_dt", "Destination (trase branch assignment)"),
    ("risk_score", "Risk score"),
];

/// Source column → export header, in export order
pub const ASSET_RISK_EXPORT: [(&str, &str); 10] = [
    ("destination_cod", "Mun. Trase ID (IBGE)"),
    ("destination_mun", "Municipality"),
    ("destination_state", "State"),
    ("destination_biome", "Biome"),
    ("destination_lat", "Latitude"),
    ("destination_long", "Longitude"),
    ("destination_cnpj", "Company CNPJ"),
    ("destination_company", "Company name"),
    ("destination_dt", "Related branch"),
    ("asset_risk", "Asset risk score"),
];

fn optional(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Field values in `SUPPLY_SHED_EXPORT` order
fn supply_shed_fields(r: &SupplyShedRecord) -> [String; 16] {
    [
        r.origin_code.to_string(),
        r.origin_municipality.clone(),
        r.origin_state.clone(),
        r.origin_biome.clone(),
        optional(r.origin_lat),
        optional(r.origin_long),
        r.destination_code.to_string(),
        r.destination_municipality.clone(),
        r.destination_state.clone(),
        r.destination_biome.clone(),
        optional(r.destination_lat),
        optional(r.destination_long),
        r.destination_cnpj.clone(),
        r.destination_company.clone(),
        r.destination_branch.clone(),
        r.risk_score.label().to_string(),
    ]
}

/// Field values in `ASSET_RISK_EXPORT` order
fn asset_risk_fields(r: &AssetRiskRecord) -> [String; 10] {
    [
        r.destination_code.to_string(),
        r.destination_municipality.clone(),
        r.destination_state.clone(),
        r.destination_biome.clone(),
        optional(r.destination_lat),
        optional(r.destination_long),
        r.destination_cnpj.clone(),
        r.destination_company.clone(),
        r.destination_branch.clone(),
        r.asset_risk.label().to_string(),
    ]
}

// ============================================================================
// 2. CSV serialization
// ============================================================================

fn write_csv<const N: usize, T>(
    columns: &[(&str, &str); N],
    rows: &[&T],
    fields: impl Fn(&T) -> [String; N],
) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(columns.iter().map(|(_, header)| *header))
        .map_err(|e| GeoError::export(e.to_string()))?;
    for &row in rows {
        writer
            .write_record(fields(row))
            .map_err(|e| GeoError::export(e.to_string()))?;
    }
    writer
        .into_inner()
        .map_err(|e| GeoError::export(e.to_string()))
}

/// Supply-shed subset as comma-separated text under renamed headers
pub fn supply_shed_csv(rows: &[&SupplyShedRecord]) -> Result<Vec<u8>> {
    write_csv(&SUPPLY_SHED_EXPORT, rows, supply_shed_fields)
}

/// Asset subset as comma-separated text under renamed headers
pub fn asset_risk_csv(rows: &[&AssetRiskRecord]) -> Result<Vec<u8>> {
    write_csv(&ASSET_RISK_EXPORT, rows, asset_risk_fields)
}

// ============================================================================
// 3. Archive assembly
// ============================================================================

/// A finished download archive
#[derive(Debug, Clone)]
pub struct ExportArchive {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl ExportArchive {
    /// `data:application/zip;base64,...`
    pub fn to_data_uri(&self) -> String {
        format!("data:application/zip;base64,{}", BASE64.encode(&self.bytes))
    }
}

/// Zip both CSV files of a filtered view
pub fn build_archive(view: &FilteredView<'_>, file_name: &str) -> Result<ExportArchive> {
    let entries = [
        (SUPPLY_SHED_ENTRY, supply_shed_csv(&view.supply_shed)?),
        (ASSET_RISK_ENTRY, asset_risk_csv(&view.asset_risk)?),
    ];

    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, content) in &entries {
        zip.start_file(*name, options)?;
        zip.write_all(content)
            .map_err(|e| GeoError::export(format!("writing {}: {}", name, e)))?;
    }
    let bytes = zip.finish()?.into_inner();

    tracing::debug!(
        supply_shed = view.supply_shed.len(),
        asset_risk = view.asset_risk.len(),
        bytes = bytes.len(),
        "Built export archive"
    );

    Ok(ExportArchive {
        file_name: file_name.to_string(),
        bytes,
    })
}

// ============================================================================
// 4. Download link
// ============================================================================

/// `href`/`download` pair for the page's download anchor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadLink {
    pub href: String,
    pub download: String,
}

/// Build the archive for a view and wrap it as a data-URI link
pub fn download_link(view: &FilteredView<'_>, file_name: &str) -> Result<DownloadLink> {
    let archive = build_archive(view, file_name)?;
    Ok(DownloadLink {
        href: archive.to_data_uri(),
        download: archive.file_name,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{filter_by_municipality_and_company, Selection, ALL};
    use crate::fixtures::{context, strings};
    use crate::loader::{ASSET_RISK_COLUMNS, SUPPLY_SHED_COLUMNS};
    use crate::risk::RiskCategory;
    use std::collections::HashSet;
    use std::io::Read;

    /// Entry name → (headers, rows)
    fn unzip(bytes: &[u8]) -> Vec<(String, Vec<String>, Vec<Vec<String>>)> {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut entries = Vec::new();
        for i in 0..archive.len() {
            let mut file = archive.by_index(i).unwrap();
            let mut text = String::new();
            file.read_to_string(&mut text).unwrap();
            let mut reader = csv::Reader::from_reader(text.as_bytes());
            let headers: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
            let rows: Vec<Vec<String>> = reader
                .records()
                .map(|r| r.unwrap().iter().map(String::from).collect::<Vec<String>>())
                .collect();
            entries.push((file.name().to_string(), headers, rows));
        }
        entries
    }

    fn risk_counts(rows: &[Vec<String>], column: usize) -> [(RiskCategory, usize); 2] {
        RiskCategory::ALL.map(|category| {
            let n = rows
                .iter()
                .filter(|r| r[column].parse::<RiskCategory>().unwrap() == category)
                .count();
            (category, n)
        })
    }

    #[test]
    fn test_rename_tables_cover_source_schema() {
        let supply: Vec<&str> = SUPPLY_SHED_EXPORT.iter().map(|(c, _)| *c).collect();
        let asset: Vec<&str> = ASSET_RISK_EXPORT.iter().map(|(c, _)| *c).collect();
        assert_eq!(supply, SUPPLY_SHED_COLUMNS.to_vec());
        assert_eq!(asset, ASSET_RISK_COLUMNS.to_vec());
    }

    #[test]
    fn test_round_trip_preserves_rows_and_risk_distribution() {
        let ctx = context();
        let view = filter_by_municipality_and_company(&ctx, &Selection::default());
        let archive = build_archive(&view, "Asset_and_SupplyShed_data.zip").unwrap();

        let entries = unzip(&archive.bytes);
        assert_eq!(entries.len(), 2);

        let (name, headers, rows) = &entries[0];
        assert_eq!(name, SUPPLY_SHED_ENTRY);
        assert_eq!(headers.len(), 16);
        assert_eq!(rows.len(), view.supply_shed.len());
        assert_eq!(risk_counts(rows, 15), view.supply_shed_risk_counts());

        let (name, headers, rows) = &entries[1];
        assert_eq!(name, ASSET_RISK_ENTRY);
        assert_eq!(headers.last().map(String::as_str), Some("Asset risk score"));
        assert_eq!(rows.len(), view.asset_risk.len());
        assert_eq!(risk_counts(rows, 9), view.asset_risk_counts());
    }

    #[test]
    fn test_uberlandia_export_uses_renamed_headers() {
        let ctx = context();
        let selection = Selection::new(strings(&["UBERLANDIA"]), strings(&[ALL]));
        let view = filter_by_municipality_and_company(&ctx, &selection);
        let entries = unzip(&build_archive(&view, "x.zip").unwrap().bytes);

        let (_, headers, rows) = &entries[0];
        let column = headers
            .iter()
            .position(|h| h == "Destination municipality")
            .unwrap();
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|r| r[column] == "UBERLANDIA"));

        let (_, headers, rows) = &entries[1];
        let column = headers.iter().position(|h| h == "Municipality").unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r[column] == "UBERLANDIA"));
    }

    #[test]
    fn test_exported_companies_match_map_data() {
        let ctx = context();
        for selection in [
            Selection::new(strings(&["UBERLANDIA"]), strings(&[ALL])),
            Selection::new(strings(&["RIO VERDE"]), strings(&["CARGILL"])),
            Selection::new(Vec::new(), strings(&["ADM", "BUNGE"])),
        ] {
            let view = filter_by_municipality_and_company(&ctx, &selection);
            let figure = crate::figure::build_figure(&ctx, &view);
            let mapped: HashSet<&str> = figure
                .risk_traces()
                .flat_map(|t| t.locations.iter())
                .map(|id| {
                    let row: usize = id.parse().unwrap();
                    ctx.supply_shed()[row].destination_company.as_str()
                })
                .collect();

            let entries = unzip(&build_archive(&view, "x.zip").unwrap().bytes);
            let (_, headers, rows) = &entries[0];
            let column = headers.iter().position(|h| h == "Destination company").unwrap();
            let exported: HashSet<&str> = rows.iter().map(|r| r[column].as_str()).collect();

            assert_eq!(mapped, exported);
        }
    }

    #[test]
    fn test_missing_coordinates_export_blank() {
        let ctx = context();
        let view = filter_by_municipality_and_company(&ctx, &Selection::default());
        let mut record = view.supply_shed[0].clone();
        record.origin_lat = None;
        let text = String::from_utf8(supply_shed_csv(&[&record]).unwrap()).unwrap();
        let line = text.lines().nth(1).unwrap();
        assert!(line.contains("CERRADO,,-48.3,"));
    }

    #[test]
    fn test_unlocated_asset_exports_blank_coordinates() {
        let ctx = context();
        let mut record = ctx.asset_risk()[0].clone();
        record.destination_lat = None;
        record.destination_long = None;
        let text = String::from_utf8(asset_risk_csv(&[&record]).unwrap()).unwrap();
        let line = text.lines().nth(1).unwrap();
        assert!(line.contains("CERRADO,,,"));
    }

    #[test]
    fn test_data_uri() {
        let ctx = context();
        let view = filter_by_municipality_and_company(&ctx, &Selection::default());
        let link = download_link(&view, "Asset_and_SupplyShed_data.zip").unwrap();

        assert_eq!(link.download, "Asset_and_SupplyShed_data.zip");
        let payload = link
            .href
            .strip_prefix("data:application/zip;base64,")
            .unwrap();
        let bytes = BASE64.decode(payload).unwrap();
        assert_eq!(unzip(&bytes).len(), 2);
    }

    #[test]
    fn test_empty_view_exports_headers_only() {
        let ctx = context();
        let selection = Selection::new(strings(&["NOWHERE"]), Vec::new());
        let view = filter_by_municipality_and_company(&ctx, &selection);
        let entries = unzip(&build_archive(&view, "x.zip").unwrap().bytes);

        assert!(entries.iter().all(|(_, headers, rows)| !headers.is_empty() && rows.is_empty()));
    }
}
