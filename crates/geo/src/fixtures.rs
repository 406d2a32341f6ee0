//! Synthetic risk tables shared by the unit tests.

use geojson::{Geometry, Value};
use std::sync::Arc;

use crate::loader::DataContext;
use crate::records::{
    AssetRiskRecord, MunicipalityCode, MunicipalityGeometry, StateBoundary, SupplyShedRecord,
};
use crate::risk::RiskCategory;

fn square(lon: f64, lat: f64) -> Geometry {
    Geometry::new(Value::Polygon(vec![vec![
        vec![lon, lat],
        vec![lon + 0.5, lat],
        vec![lon + 0.5, lat + 0.5],
        vec![lon, lat + 0.5],
        vec![lon, lat],
    ]]))
}

fn municipality(code: &str, lon: f64, lat: f64) -> MunicipalityGeometry {
    MunicipalityGeometry {
        code: MunicipalityCode::from(code),
        geometry: Arc::new(square(lon, lat)),
    }
}

/// (origin code, origin name, destination, company, risk)
fn link(origin: (&str, &str), destination: &str, company: &str, risk: RiskCategory) -> SupplyShedRecord {
    SupplyShedRecord {
        row: 0,
        origin_code: MunicipalityCode::from(origin.0),
        origin_municipality: origin.1.to_string(),
        origin_state: "MG".to_string(),
        origin_biome: "CERRADO".to_string(),
        origin_lat: Some(-18.9),
        origin_long: Some(-48.3),
        destination_code: MunicipalityCode::from(destination_code(destination)),
        destination_municipality: destination.to_string(),
        destination_state: "MG".to_string(),
        destination_biome: "CERRADO".to_string(),
        destination_lat: Some(-18.92),
        destination_long: Some(-48.28),
        destination_cnpj: format!("{}000100", company.len()),
        destination_company: company.to_string(),
        destination_branch: format!("{} {}", company, destination),
        risk_score: risk,
        geometry: None,
    }
}

fn asset(destination: &str, company: &str, risk: RiskCategory) -> AssetRiskRecord {
    AssetRiskRecord {
        destination_code: MunicipalityCode::from(destination_code(destination)),
        destination_municipality: destination.to_string(),
        destination_state: "MG".to_string(),
        destination_biome: "CERRADO".to_string(),
        destination_lat: Some(-18.92),
        destination_long: Some(-48.28),
        destination_cnpj: format!("{}000100", company.len()),
        destination_company: company.to_string(),
        destination_branch: format!("{} {}", company, destination),
        asset_risk: risk,
        marker_color: "",
    }
}

fn destination_code(name: &str) -> &'static str {
    match name {
        "UBERLANDIA" => "3170206",
        "RIO VERDE" => "5218805",
        _ => "5107925",
    }
}

/// Three destinations:
/// - UBERLANDIA served by CARGILL and ADM
/// - RIO VERDE served by BUNGE and CARGILL
/// - SORRISO served by AMAGGI only, one origin without a polygon
pub fn context() -> DataContext {
    use RiskCategory::{AtRisk, Negligible};

    let municipalities = vec![
        municipality("3170206", -48.3, -18.9),
        municipality("3143302", -47.9, -18.6),
        municipality("5218805", -50.9, -17.8),
        municipality("5107925", -55.7, -12.5),
    ];

    let supply_shed = vec![
        link(("3170206", "UBERLANDIA"), "UBERLANDIA", "CARGILL", Negligible),
        link(("3143302", "MONTE CARMELO"), "UBERLANDIA", "CARGILL", AtRisk),
        link(("3143302", "MONTE CARMELO"), "UBERLANDIA", "ADM", Negligible),
        link(("5218805", "RIO VERDE"), "RIO VERDE", "BUNGE", AtRisk),
        link(("3170206", "UBERLANDIA"), "RIO VERDE", "CARGILL", Negligible),
        link(("5107925", "SORRISO"), "SORRISO", "AMAGGI", AtRisk),
        link(("9999999", "UNMAPPED"), "SORRISO", "AMAGGI", Negligible),
    ];

    let asset_risk = vec![
        asset("UBERLANDIA", "CARGILL", AtRisk),
        asset("UBERLANDIA", "ADM", Negligible),
        asset("RIO VERDE", "BUNGE", AtRisk),
        asset("RIO VERDE", "CARGILL", Negligible),
        asset("SORRISO", "AMAGGI", AtRisk),
    ];

    let states = vec![
        StateBoundary { geometry: square(-51.0, -23.0) },
        StateBoundary { geometry: square(-61.0, -18.0) },
    ];

    DataContext::from_parts(municipalities, supply_shed, asset_risk, states)
}

/// Selection helper
pub fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}
