//! # Vector Data Import
//!
//! Parses the boundary GeoJSON files into municipality polygons (keyed by
//! code) and state backdrop polygons.
//!
//! ## Table of Contents
//! 1. GeoJSON import
//! 2. Municipality boundaries
//! 3. State boundaries

use geojson::{Feature, GeoJson};
use std::path::Path;
use std::sync::Arc;

use crate::error::{GeoError, Result};
use crate::records::{MunicipalityCode, MunicipalityGeometry, StateBoundary};

// ============================================================================
// 1. GeoJSON import
// ============================================================================

/// Read a GeoJSON file and flatten it into a feature list
pub fn import_features(path: &Path) -> Result<Vec<Feature>> {
    let content = std::fs::read_to_string(path).map_err(|source| GeoError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_features(&content).map_err(|detail| GeoError::GeoJson {
        path: path.to_path_buf(),
        detail,
    })
}

fn parse_features(content: &str) -> std::result::Result<Vec<Feature>, String> {
    let geojson: GeoJson = content.parse().map_err(|e| format!("{}", e))?;

    Ok(match geojson {
        GeoJson::FeatureCollection(fc) => fc.features,
        GeoJson::Feature(f) => vec![f],
        GeoJson::Geometry(g) => vec![Feature {
            bbox: None,
            geometry: Some(g),
            id: None,
            properties: None,
            foreign_members: None,
        }],
    })
}

// ============================================================================
// 2. Municipality boundaries
// ============================================================================

/// Import municipality polygons, keyed by the `code_property` feature property.
///
/// A feature without the property fails the whole import. Features without
/// a geometry are skipped: a supply-shed row pointing at them ends up with a
/// join miss, which is handled downstream.
pub fn import_municipalities(path: &Path, code_property: &str) -> Result<Vec<MunicipalityGeometry>> {
    let features = import_features(path)?;
    let mut municipalities = Vec::with_capacity(features.len());
    let mut without_geometry = 0usize;

    for (index, feature) in features.into_iter().enumerate() {
        let code = feature
            .properties
            .as_ref()
            .and_then(|props| props.get(code_property))
            .and_then(MunicipalityCode::from_property)
            .ok_or_else(|| GeoError::MissingJoinKey {
                path: path.to_path_buf(),
                feature: index,
                property: code_property.to_string(),
            })?;

        match feature.geometry {
            Some(geometry) => municipalities.push(MunicipalityGeometry {
                code,
                geometry: Arc::new(geometry),
            }),
            None => without_geometry += 1,
        }
    }

    if without_geometry > 0 {
        tracing::warn!(
            "{} municipality features in {} have no geometry",
            without_geometry,
            path.display()
        );
    }

    tracing::info!(
        "Imported {} municipality boundaries from {}",
        municipalities.len(),
        path.display()
    );

    Ok(municipalities)
}

// ============================================================================
// 3. State boundaries
// ============================================================================

/// Import state backdrop polygons. Properties are ignored.
pub fn import_states(path: &Path) -> Result<Vec<StateBoundary>> {
    let states: Vec<StateBoundary> = import_features(path)?
        .into_iter()
        .filter_map(|f| f.geometry)
        .map(|geometry| StateBoundary { geometry })
        .collect();

    tracing::info!("Imported {} state boundaries from {}", states.len(), path.display());

    Ok(states)
}
