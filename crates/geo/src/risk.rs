//! # Risk Categories
//!
//! The binary deforestation-risk label shared by supply-shed links and assets,
//! and the fixed two-value color encoding used by every map layer.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::GeoError;

/// Fill for `Negligible` polygons and markers (light teal)
pub const NEGLIGIBLE_COLOR: &str = "#BBFFEC";
/// Fill for `At-risk` polygons and markers (coral)
pub const AT_RISK_COLOR: &str = "#FF6A5F";

/// Externally computed risk label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskCategory {
    #[serde(rename = "Negligible")]
    Negligible,
    #[serde(rename = "At-risk")]
    AtRisk,
}

impl RiskCategory {
    /// Legend order
    pub const ALL: [RiskCategory; 2] = [RiskCategory::Negligible, RiskCategory::AtRisk];

    /// Label as it appears in the source tables and the legend
    pub fn label(self) -> &'static str {
        match self {
            RiskCategory::Negligible => "Negligible",
            RiskCategory::AtRisk => "At-risk",
        }
    }

    /// Discrete color for this category
    pub fn color(self) -> &'static str {
        match self {
            RiskCategory::Negligible => NEGLIGIBLE_COLOR,
            RiskCategory::AtRisk => AT_RISK_COLOR,
        }
    }
}

impl fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for RiskCategory {
    type Err = GeoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Negligible" => Ok(RiskCategory::Negligible),
            "At-risk" => Ok(RiskCategory::AtRisk),
            other => Err(GeoError::InvalidRiskCategory(other.to_string())),
        }
    }
}
