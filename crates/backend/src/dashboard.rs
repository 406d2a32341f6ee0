// =============================================================================
// Soy Risk Dashboard - Dashboard API
// =============================================================================
// Dropdown options, map figure and download link for the current selection.
// Every handler is a pure recomputation over the shared read-only tables.
// =============================================================================

use axum::{
    extract::{rejection::JsonRejection, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use soyrisk_geo::{
    build_figure, derive_company_options, download_link, filter_by_municipality_and_company,
    municipality_options, DownloadLink, DropdownState, Selection,
};

use crate::error::ApiError;
use crate::AppState;

// =============================================================================
// Request Types
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct CompanyOptionsRequest {
    #[serde(default)]
    pub municipalities: Vec<String>,
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))
}

// =============================================================================
// Handlers
// =============================================================================

/// Municipality dropdown with its configured default selection.
pub async fn get_municipalities(State(state): State<AppState>) -> Json<DropdownState> {
    Json(municipality_options(
        &state.data,
        &state.defaults.default_municipalities,
    ))
}

/// Company dropdown for a municipality selection.
///
/// The page applies this before requesting a new figure so the company value
/// is always reset when municipalities change.
pub async fn post_companies(
    State(state): State<AppState>,
    payload: Result<Json<CompanyOptionsRequest>, JsonRejection>,
) -> Result<Json<DropdownState>, ApiError> {
    let req = body(payload)?;
    let options = derive_company_options(&state.data, &req.municipalities);

    tracing::debug!(
        municipalities = req.municipalities.len(),
        companies = options.options.len() - 1,
        "Derived company options"
    );

    Ok(Json(options))
}

/// Full map figure for a selection.
pub async fn post_figure(
    State(state): State<AppState>,
    payload: Result<Json<Selection>, JsonRejection>,
) -> Result<Response, ApiError> {
    let selection = body(payload)?;
    let view = filter_by_municipality_and_company(&state.data, &selection);
    let figure = build_figure(&state.data, &view);
    let json = serde_json::to_vec(&figure)?;

    Ok(([(header::CONTENT_TYPE, "application/json")], json).into_response())
}

/// Data-URI download link for a selection.
pub async fn post_download(
    State(state): State<AppState>,
    payload: Result<Json<Selection>, JsonRejection>,
) -> Result<Json<DownloadLink>, ApiError> {
    let selection = body(payload)?;
    let view = filter_by_municipality_and_company(&state.data, &selection);
    let link = download_link(&view, &state.defaults.download_file_name)?;

    Ok(Json(link))
}
