//! # Risk Tables
//!
//! Row types for the four static inputs. Field names follow the upstream
//! column schema (`origin_cod`, `destination_mun`, `destination_dt`, ...);
//! a rename upstream breaks deserialization at startup.
//!
//! ## Table of Contents
//! 1. MunicipalityCode - Normalized join key
//! 2. MunicipalityGeometry / StateBoundary - Boundary layers
//! 3. SupplyShedRecord - Origin → destination link
//! 4. AssetRiskRecord - Storage-facility risk

use geojson::Geometry;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::risk::RiskCategory;

// ============================================================================
// 1. MunicipalityCode - Normalized join key
// ============================================================================

/// IBGE municipality code used to join tables to boundaries.
///
/// Codes arrive as integers in some files and as floats or strings in
/// others; both sides of the join go through [`MunicipalityCode::normalize`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct MunicipalityCode(String);

impl MunicipalityCode {
    /// Normalize a raw code: `" 3170206.0 "` and `"3170206"` are the same key
    pub fn normalize(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.parse::<f64>() {
            Ok(v) if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e15 => {
                Self(format!("{}", v as i64))
            }
            _ => Self(trimmed.to_string()),
        }
    }

    /// Read a code out of a GeoJSON property value
    pub fn from_property(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Some(Self(i.to_string())),
                None => n.as_f64().map(|f| Self::normalize(&f.to_string())),
            },
            serde_json::Value::String(s) if !s.trim().is_empty() => Some(Self::normalize(s)),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for MunicipalityCode {
    fn from(raw: String) -> Self {
        Self::normalize(&raw)
    }
}

impl From<&str> for MunicipalityCode {
    fn from(raw: &str) -> Self {
        Self::normalize(raw)
    }
}

impl From<MunicipalityCode> for String {
    fn from(code: MunicipalityCode) -> Self {
        code.0
    }
}

impl fmt::Display for MunicipalityCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// 2. MunicipalityGeometry / StateBoundary - Boundary layers
// ============================================================================

/// One municipality polygon, keyed by code
#[derive(Debug, Clone)]
pub struct MunicipalityGeometry {
    pub code: MunicipalityCode,
    pub geometry: Arc<Geometry>,
}

/// Backdrop polygon for one Brazilian state. Geometry only.
#[derive(Debug, Clone)]
pub struct StateBoundary {
    pub geometry: Geometry,
}

// ============================================================================
// 3. SupplyShedRecord - Origin → destination link
// ============================================================================

/// One origin municipality supplying one destination facility
#[derive(Debug, Clone, Deserialize)]
pub struct SupplyShedRecord {
    /// Position in the loaded table; doubles as the choropleth location id
    #[serde(skip)]
    pub row: usize,
    #[serde(rename = "origin_cod")]
    pub origin_code: MunicipalityCode,
    #[serde(rename = "origin_mun")]
    pub origin_municipality: String,
    #[serde(rename = "origin_uf")]
    pub origin_state: String,
    pub origin_biome: String,
    pub origin_lat: Option<f64>,
    pub origin_long: Option<f64>,
    #[serde(rename = "destination_cod")]
    pub destination_code: MunicipalityCode,
    #[serde(rename = "destination_mun")]
    pub destination_municipality: String,
    pub destination_state: String,
    pub destination_biome: String,
    pub destination_lat: Option<f64>,
    pub destination_long: Option<f64>,
    pub destination_cnpj: String,
    pub destination_company: String,
    #[serde(rename = "destination_dt")]
    pub destination_branch: String,
    pub risk_score: RiskCategory,
    /// Origin polygon joined on `origin_code`; `None` on a join miss
    #[serde(skip)]
    pub geometry: Option<Arc<Geometry>>,
}

// ============================================================================
// 4. AssetRiskRecord - Storage-facility risk
// ============================================================================

/// Risk entry for one storage facility (silo)
#[derive(Debug, Clone, Deserialize)]
pub struct AssetRiskRecord {
    #[serde(rename = "destination_cod")]
    pub destination_code: MunicipalityCode,
    #[serde(rename = "destination_mun")]
    pub destination_municipality: String,
    pub destination_state: String,
    pub destination_biome: String,
    /// Blank in the table when the facility has no surveyed location
    pub destination_lat: Option<f64>,
    pub destination_long: Option<f64>,
    pub destination_cnpj: String,
    pub destination_company: String,
    #[serde(rename = "destination_dt")]
    pub destination_branch: String,
    pub asset_risk: RiskCategory,
    /// Marker fill, fixed at load time from `asset_risk`
    #[serde(skip)]
    pub marker_color: &'static str,
}

impl AssetRiskRecord {
    /// `(lat, lon)` when both coordinates are present
    pub fn position(&self) -> Option<(f64, f64)> {
        self.destination_lat.zip(self.destination_long)
    }
}
