use axum::{extract::State, Extension, Json};
use serde::Serialize;

use crate::middleware::RequestId;

use super::{map_db_error, ApiError, AppState};

#[derive(Debug, Serialize)]
pub(super) struct InitStoresResponse {
    success: bool,
    message: String,
    count: usize,
}

#[derive(Debug, Serialize)]
pub(super) struct RetailersResponse {
    retailers: Vec<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct SupportedZipsResponse {
    message: &'static str,
    coverage: &'static str,
    api: &'static str,
    caching: &'static str,
    note: &'static str,
}

/// POST /api/v1/init-stores: replace all stores with the sample dataset.
pub(super) async fn init_stores(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<InitStoresResponse>, ApiError> {
    let count = state
        .repo
        .seed_sample_stores()
        .await
        .map_err(|e| map_db_error(&req_id.0, &e))?;

    tracing::info!(count, "sample stores initialized");
    Ok(Json(InitStoresResponse {
        success: true,
        message: format!("Initialized {count} stores"),
        count,
    }))
}

/// GET /api/v1/retailers: distinct retailer names, sorted.
pub(super) async fn list_retailers(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<RetailersResponse>, ApiError> {
    let retailers = state
        .repo
        .list_retailers()
        .await
        .map_err(|e| map_db_error(&req_id.0, &e))?;
    Ok(Json(RetailersResponse { retailers }))
}

/// GET /api/v1/supported-zips
pub(super) async fn supported_zips() -> Json<SupportedZipsResponse> {
    Json(SupportedZipsResponse {
        message: "All US ZIP codes are supported via the Zippopotam.us API",
        coverage: "42,000+ US ZIP codes",
        api: "https://api.zippopotam.us/us/{zip}",
        caching: "ZIP coordinates are cached after the first lookup and persisted as a fallback",
        note: "Enter any valid 5-digit US ZIP code in the search",
    })
}
