//! Store search and store CRUD handlers.

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use storeloc_core::{
    locate, parse_radius, IndexedStore, SearchArea, Store, StoreWithDistance, ZipCoordinate,
};

use crate::middleware::RequestId;

use super::{json_body, map_db_error, ApiError, AppState};

const MISSING_FIELDS: &str = "Missing required fields: store_name, address, lat, lon, retailer";
const BULK_MISSING_FIELDS: &str = "All stores must have: store_name, address, lat, lon, retailer";

// ---------------------------------------------------------------------------
// Request and response bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(super) struct SearchQuery {
    pub zip: Option<String>,
    pub radius: Option<String>,
    pub retailer: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct SearchResponse {
    zip_code: String,
    center_location: ZipCoordinate,
    radius_miles: f64,
    total_results: usize,
    stores: Vec<StoreWithDistance>,
}

#[derive(Debug, Serialize)]
pub(super) struct CreateStoreResponse {
    success: bool,
    message: &'static str,
    store: Store,
    id: u64,
}

#[derive(Debug, Serialize)]
pub(super) struct BulkCreateResponse {
    success: bool,
    message: String,
    count: usize,
    stores: Vec<IndexedStore>,
}

#[derive(Debug, Serialize)]
pub(super) struct ListStoresResponse {
    total: usize,
    stores: Vec<IndexedStore>,
}

#[derive(Debug, Serialize)]
pub(super) struct DeleteResponse {
    success: bool,
    message: String,
}

#[derive(Debug, Serialize)]
pub(super) struct ClearResponse {
    success: bool,
    message: &'static str,
    deleted: u64,
}

/// A store object carrying all five fields with the right types. Empty
/// strings and out-of-range coordinates get past here and are rejected by
/// repository validation.
fn parse_store(value: &Value) -> Option<Store> {
    serde_json::from_value(value.clone()).ok()
}

/// Accepts only plain decimal digits, so `-1`, `+1` and `1.0` are all
/// invalid ids.
fn parse_store_id(raw: &str) -> Option<u64> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/stores: stores within `radius` miles of `zip`, nearest first.
pub(super) async fn search_stores(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<SearchResponse>, ApiError> {
    let rid = &req_id.0;

    // Used verbatim as the cache and storage key; no trimming.
    let zip = query
        .zip
        .as_deref()
        .filter(|z| !z.is_empty())
        .ok_or_else(|| ApiError::new(rid, "validation_error", "ZIP code is required"))?;

    // Checked before resolution so a bad request never reaches the geocoder.
    let radius_miles = parse_radius(query.radius.as_deref())
        .map_err(|message| ApiError::new(rid, "validation_error", message))?;

    let resolution = state.resolver.resolve(zip).await;
    tracing::info!(zip, origin = resolution.origin(), "zip resolution");
    let center = resolution.into_coordinate().ok_or_else(|| {
        ApiError::new(
            rid,
            "not_found_zip",
            format!("ZIP code {zip} not found. Please enter a valid US ZIP code."),
        )
    })?;

    let stores = state
        .repo
        .load_all()
        .await
        .map_err(|e| map_db_error(rid, &e))?
        .ok_or_else(|| {
            ApiError::new(
                rid,
                "not_initialized",
                "Store database not initialized. Call POST /init-stores first.",
            )
        })?;

    let area = SearchArea {
        lat: center.lat,
        lon: center.lon,
        radius_miles,
    };
    let hits = locate(
        stores.into_iter().map(|s| s.store),
        &area,
        query.retailer.as_deref(),
    );

    Ok(Json(SearchResponse {
        zip_code: zip.to_string(),
        center_location: center,
        radius_miles,
        total_results: hits.len(),
        stores: hits,
    }))
}

/// POST /api/v1/stores: add one store.
pub(super) async fn create_store(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<CreateStoreResponse>, ApiError> {
    let rid = &req_id.0;
    let body = json_body(rid, body)?;

    let store =
        parse_store(&body).ok_or_else(|| ApiError::new(rid, "validation_error", MISSING_FIELDS))?;
    let id = state
        .repo
        .create(&store)
        .await
        .map_err(|e| map_db_error(rid, &e))?;

    Ok(Json(CreateStoreResponse {
        success: true,
        message: "Store added successfully",
        store,
        id,
    }))
}

/// POST /api/v1/stores/bulk: add `{"stores": [...]}` with contiguous ids.
pub(super) async fn bulk_create_stores(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<BulkCreateResponse>, ApiError> {
    let rid = &req_id.0;
    let body = json_body(rid, body)?;

    let items = body
        .get("stores")
        .and_then(Value::as_array)
        .filter(|items| !items.is_empty())
        .ok_or_else(|| {
            ApiError::new(rid, "validation_error", "stores must be a non-empty array")
        })?;
    let stores = items
        .iter()
        .map(parse_store)
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| ApiError::new(rid, "validation_error", BULK_MISSING_FIELDS))?;

    let created = state
        .repo
        .bulk_create(stores)
        .await
        .map_err(|e| map_db_error(rid, &e))?;

    Ok(Json(BulkCreateResponse {
        success: true,
        message: format!("Bulk uploaded {} stores successfully", created.len()),
        count: created.len(),
        stores: created,
    }))
}

/// GET /api/v1/stores/all: every store with its id.
pub(super) async fn list_all_stores(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ListStoresResponse>, ApiError> {
    let stores = state
        .repo
        .list_all()
        .await
        .map_err(|e| map_db_error(&req_id.0, &e))?;

    Ok(Json(ListStoresResponse {
        total: stores.len(),
        stores,
    }))
}

/// DELETE /api/v1/stores/{id}: remove one store, leaving a hole.
pub(super) async fn delete_store(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(raw_id): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let rid = &req_id.0;
    let id = parse_store_id(&raw_id)
        .ok_or_else(|| ApiError::new(rid, "validation_error", "Invalid store ID"))?;

    state
        .repo
        .delete_by_id(id)
        .await
        .map_err(|e| map_db_error(rid, &e))?;

    Ok(Json(DeleteResponse {
        success: true,
        message: format!("Store {id} deleted successfully"),
    }))
}

/// DELETE /api/v1/stores: remove every store and reset the id counter.
pub(super) async fn clear_stores(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ClearResponse>, ApiError> {
    let deleted = state
        .repo
        .delete_all()
        .await
        .map_err(|e| map_db_error(&req_id.0, &e))?;

    let message = if deleted == 0 {
        "Database is already empty"
    } else {
        "Cleared all stores from database"
    };
    Ok(Json(ClearResponse {
        success: true,
        message,
        deleted,
    }))
}
