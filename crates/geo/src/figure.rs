//! # Map Renderer
//!
//! Builds the dashboard map as a Plotly figure (`{data, layout}` JSON) from a
//! [`FilteredView`]. The figure is rebuilt from scratch for every selection.
//!
//! Trace order is the draw order:
//! 1. state backdrop, flat fill, no hover
//! 2. one choropleth trace per risk category present, these carry the legend
//! 3. asset markers, colored per row, no legend entry
//!
//! ## Table of Contents
//! 1. Figure model
//! 2. Layers
//! 3. Layout
//! 4. build_figure - Main entry point

use geojson::Geometry;
use serde::Serialize;

use crate::filter::FilteredView;
use crate::loader::DataContext;
use crate::records::SupplyShedRecord;
use crate::risk::RiskCategory;

/// Backdrop fill shared by every state polygon
pub const STATE_FILL: &str = "#E2EAE7";
/// Longitude range of the fixed viewport (continental Brazil)
pub const LON_RANGE: [f64; 2] = [-100.0, -10.0];
/// Latitude range of the fixed viewport
pub const LAT_RANGE: [f64; 2] = [-45.0, 10.0];
/// Trace name of the backdrop layer
pub const STATES_TRACE: &str = "states_trace";

const HOVER_BG: &str = "#BBFFEC";

const SUPPLY_SHED_HOVER: &str = "<b>%{customdata[0]}</b><br><br>\
Origin state<br><b>%{customdata[1]}</b><br><br>\
Origin biome<br><b>%{customdata[2]}</b><br><br>\
Destination mun.<br><b>%{customdata[3]}</b><br><br>\
Destination state<br><b>%{customdata[4]}</b><br><br>\
Destination biome<br><b>%{customdata[5]}</b>\
<extra></extra>";

const ASSET_HOVER: &str = "<b>%{customdata[0]}</b><br><br>\
CNPJ<br><b>%{customdata[1]}</b><br><br>\
Latitude<br><b>%{customdata[2]}</b><br><br>\
Longitude<br><b>%{customdata[3]}</b><br><br>\
Associated branches<br><b>%{customdata[4]}</b><br><br>\
Risk score<br><b>%{customdata[5]}</b>\
<extra></extra>";

// ============================================================================
// 1. Figure model
// ============================================================================

/// A Plotly figure, serialized as-is for `Plotly.react`
#[derive(Debug, Serialize)]
pub struct Figure<'a> {
    pub data: Vec<Trace<'a>>,
    pub layout: Layout,
}

/// One Plotly trace
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Trace<'a> {
    Choropleth(ChoroplethTrace<'a>),
    Scattergeo(ScatterGeoTrace),
}

/// Filled polygons looked up by `locations` in the embedded feature collection
#[derive(Debug, Serialize)]
pub struct ChoroplethTrace<'a> {
    pub name: String,
    pub geojson: FeatureCollectionRef<'a>,
    pub locations: Vec<String>,
    pub z: Vec<u8>,
    pub colorscale: [(f64, &'static str); 2],
    pub showscale: bool,
    pub showlegend: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legendgroup: Option<String>,
    pub marker: Marker,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hoverinfo: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hovertemplate: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hoverlabel: Option<HoverLabel>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub customdata: Vec<[&'a str; 6]>,
}

/// Point markers at asset coordinates
#[derive(Debug, Serialize)]
pub struct ScatterGeoTrace {
    pub lat: Vec<f64>,
    pub lon: Vec<f64>,
    pub mode: &'static str,
    pub marker: Marker,
    pub customdata: Vec<[String; 6]>,
    pub hovertemplate: &'static str,
    pub hoverlabel: HoverLabel,
    pub showlegend: bool,
}

#[derive(Debug, Serialize)]
pub struct Marker {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub color: Vec<&'static str>,
    pub line: Line,
}

#[derive(Debug, Serialize)]
pub struct Line {
    pub color: &'static str,
    pub width: f64,
}

#[derive(Debug, Serialize)]
pub struct HoverLabel {
    pub bgcolor: &'static str,
}

/// GeoJSON feature collection borrowing geometries from the context
#[derive(Debug, Serialize)]
pub struct FeatureCollectionRef<'a> {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub features: Vec<FeatureRef<'a>>,
}

/// GeoJSON feature with a string id matched against trace `locations`.
///
/// Supply-shed rows without a polygon have no feature at all. Their location
/// stays in the trace and Plotly skips it.
#[derive(Debug, Serialize)]
pub struct FeatureRef<'a> {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub id: String,
    pub geometry: &'a Geometry,
    pub properties: serde_json::Map<String, serde_json::Value>,
}

impl<'a> FeatureCollectionRef<'a> {
    fn new(features: Vec<FeatureRef<'a>>) -> Self {
        Self {
            kind: "FeatureCollection",
            features,
        }
    }
}

impl<'a> FeatureRef<'a> {
    fn new(id: String, geometry: &'a Geometry) -> Self {
        Self {
            kind: "Feature",
            id,
            geometry,
            properties: serde_json::Map::new(),
        }
    }
}

// ============================================================================
// 2. Layers
// ============================================================================

/// Backdrop: every state, one flat fill, white borders, hover disabled
fn state_layer(ctx: &DataContext) -> ChoroplethTrace<'_> {
    let features: Vec<FeatureRef<'_>> = ctx
        .states()
        .iter()
        .enumerate()
        .map(|(i, s)| FeatureRef::new(i.to_string(), &s.geometry))
        .collect();
    let locations = features.iter().map(|f| f.id.clone()).collect();

    ChoroplethTrace {
        name: STATES_TRACE.to_string(),
        z: vec![0; features.len()],
        geojson: FeatureCollectionRef::new(features),
        locations,
        colorscale: [(0.0, STATE_FILL), (1.0, STATE_FILL)],
        showscale: false,
        showlegend: false,
        legendgroup: None,
        marker: Marker {
            size: None,
            color: Vec::new(),
            line: Line { color: "white", width: 1.0 },
        },
        hoverinfo: Some("skip"),
        hovertemplate: None,
        hoverlabel: None,
        customdata: Vec::new(),
    }
}

/// Choropleth for one risk category. Location ids are supply-shed row numbers.
fn risk_layer<'a>(category: RiskCategory, rows: &[&'a SupplyShedRecord]) -> ChoroplethTrace<'a> {
    let features: Vec<FeatureRef<'a>> = rows
        .iter()
        .filter_map(|&r| {
            r.geometry
                .as_deref()
                .map(|geometry| FeatureRef::new(r.row.to_string(), geometry))
        })
        .collect();
    let locations = rows.iter().map(|r| r.row.to_string()).collect();
    let customdata = rows
        .iter()
        .map(|&r| {
            [
                r.origin_municipality.as_str(),
                r.origin_state.as_str(),
                r.origin_biome.as_str(),
                r.destination_municipality.as_str(),
                r.destination_state.as_str(),
                r.destination_biome.as_str(),
            ]
        })
        .collect();

    ChoroplethTrace {
        name: category.label().to_string(),
        z: vec![1; rows.len()],
        geojson: FeatureCollectionRef::new(features),
        locations,
        colorscale: [(0.0, category.color()), (1.0, category.color())],
        showscale: false,
        showlegend: true,
        legendgroup: Some(category.label().to_string()),
        marker: Marker {
            size: None,
            color: Vec::new(),
            line: Line { color: "white", width: 0.5 },
        },
        hoverinfo: None,
        hovertemplate: Some(SUPPLY_SHED_HOVER),
        hoverlabel: Some(HoverLabel { bgcolor: HOVER_BG }),
        customdata,
    }
}

/// One marker per located asset, colored by its precomputed `marker_color`.
/// Assets missing either coordinate get no marker.
fn asset_layer(view: &FilteredView<'_>) -> ScatterGeoTrace {
    let located: Vec<_> = view
        .asset_risk
        .iter()
        .filter_map(|&a| a.position().map(|pos| (a, pos)))
        .collect();

    ScatterGeoTrace {
        lat: located.iter().map(|(_, (lat, _))| *lat).collect(),
        lon: located.iter().map(|(_, (_, lon))| *lon).collect(),
        mode: "markers",
        marker: Marker {
            size: Some(6),
            color: located.iter().map(|(a, _)| a.marker_color).collect(),
            line: Line { color: "black", width: 0.5 },
        },
        customdata: located
            .iter()
            .map(|(a, (lat, lon))| {
                [
                    a.destination_company.clone(),
                    a.destination_cnpj.clone(),
                    lat.to_string(),
                    lon.to_string(),
                    a.destination_branch.clone(),
                    a.asset_risk.label().to_string(),
                ]
            })
            .collect(),
        hovertemplate: ASSET_HOVER,
        hoverlabel: HoverLabel { bgcolor: HOVER_BG },
        showlegend: false,
    }
}

// ============================================================================
// 3. Layout
// ============================================================================

#[derive(Debug, Serialize)]
pub struct Layout {
    pub margin: Margin,
    pub geo: GeoLayout,
    pub legend: Legend,
}

#[derive(Debug, Serialize)]
pub struct Margin {
    pub r: u32,
    pub t: u32,
    pub l: u32,
    pub b: u32,
}

/// Fixed viewport: the map never fits itself to the filtered data
#[derive(Debug, Serialize)]
pub struct GeoLayout {
    pub scope: &'static str,
    pub center: Center,
    pub fitbounds: bool,
    pub lonaxis: AxisRange,
    pub lataxis: AxisRange,
    pub showframe: bool,
    pub showcoastlines: bool,
    pub showocean: bool,
    pub showcountries: bool,
    pub showland: bool,
}

#[derive(Debug, Serialize)]
pub struct Center {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Serialize)]
pub struct AxisRange {
    pub range: [f64; 2],
}

#[derive(Debug, Serialize)]
pub struct Legend {
    pub title: LegendTitle,
    /// `toggleothers`: clicking an entry isolates it
    pub itemclick: &'static str,
    pub yanchor: &'static str,
    pub y: f64,
    pub xanchor: &'static str,
    pub x: f64,
    pub bgcolor: &'static str,
}

#[derive(Debug, Serialize)]
pub struct LegendTitle {
    pub text: &'static str,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            margin: Margin { r: 0, t: 0, l: 0, b: 0 },
            geo: GeoLayout {
                scope: "south america",
                center: Center { lat: -15.0, lon: -55.0 },
                fitbounds: false,
                lonaxis: AxisRange { range: LON_RANGE },
                lataxis: AxisRange { range: LAT_RANGE },
                showframe: false,
                showcoastlines: false,
                showocean: false,
                showcountries: false,
                showland: false,
            },
            legend: Legend {
                title: LegendTitle { text: "Risk categories" },
                itemclick: "toggleothers",
                yanchor: "top",
                y: 0.99,
                xanchor: "left",
                x: 0.01,
                bgcolor: "rgba(0,0,0,0)",
            },
        }
    }
}

// ============================================================================
// 4. build_figure - Main entry point
// ============================================================================

/// Build the full three-layer map for a filtered view
pub fn build_figure<'a>(ctx: &'a DataContext, view: &FilteredView<'a>) -> Figure<'a> {
    let mut data = vec![Trace::Choropleth(state_layer(ctx))];

    for category in RiskCategory::ALL {
        let rows: Vec<&'a SupplyShedRecord> = view
            .supply_shed
            .iter()
            .copied()
            .filter(|r| r.risk_score == category)
            .collect();
        if !rows.is_empty() {
            data.push(Trace::Choropleth(risk_layer(category, &rows)));
        }
    }

    data.push(Trace::Scattergeo(asset_layer(view)));

    tracing::debug!(
        traces = data.len(),
        polygons = view.supply_shed.len(),
        markers = view.asset_risk.len(),
        "Built map figure"
    );

    Figure {
        data,
        layout: Layout::default(),
    }
}

impl<'a> Figure<'a> {
    /// Choropleth traces that carry a legend entry
    pub fn risk_traces(&self) -> impl Iterator<Item = &ChoroplethTrace<'a>> + '_ {
        self.data.iter().filter_map(|t| match t {
            Trace::Choropleth(c) if c.showlegend => Some(c),
            _ => None,
        })
    }

    /// The marker layer
    pub fn asset_trace(&self) -> Option<&ScatterGeoTrace> {
        self.data.iter().find_map(|t| match t {
            Trace::Scattergeo(s) => Some(s),
            _ => None,
        })
    }
}
