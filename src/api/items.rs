//! Catalog item endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::{
    error::AppResult,
    models::item::{CreateItem, Item, ItemQuery, UpdateItem},
};

/// Administrative counter reset request
#[derive(Deserialize, ToSchema)]
pub struct SetInventoryRequest {
    pub total_copies: i32,
    pub available_copies: i32,
}

/// Signed availability adjustment request
#[derive(Deserialize, ToSchema)]
pub struct AdjustAvailabilityRequest {
    pub delta: i32,
}

/// Low-stock listing query
#[derive(Deserialize, IntoParams, ToSchema)]
pub struct LowStockQuery {
    /// Threshold on available copies (default 2)
    pub threshold: Option<i32>,
}

/// List catalog items
#[utoipa::path(
    get,
    path = "/items",
    tag = "items",
    params(ItemQuery),
    responses(
        (status = 200, description = "Matching catalog items", body = Vec<Item>)
    )
)]
pub async fn list_items(
    State(state): State<crate::AppState>,
    Query(query): Query<ItemQuery>,
) -> AppResult<Json<Vec<Item>>> {
    let items = state.services.catalog.list_items(&query).await?;
    Ok(Json(items))
}

/// Get a catalog item by ID
#[utoipa::path(
    get,
    path = "/items/{id}",
    tag = "items",
    params(("id" = i64, Path, description = "Item ID")),
    responses(
        (status = 200, description = "Catalog item", body = Item),
        (status = 404, description = "Item not found")
    )
)]
pub async fn get_item(
    State(state): State<crate::AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Item>> {
    let item = state.services.catalog.get_item(id).await?;
    Ok(Json(item))
}

/// Create a catalog item
#[utoipa::path(
    post,
    path = "/items",
    tag = "items",
    request_body = CreateItem,
    responses(
        (status = 201, description = "Item created", body = Item),
        (status = 409, description = "ISBN already exists"),
        (status = 422, description = "Invalid copy counts")
    )
)]
pub async fn create_item(
    State(state): State<crate::AppState>,
    Json(request): Json<CreateItem>,
) -> AppResult<(StatusCode, Json<Item>)> {
    let item = state.services.catalog.create_item(request).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// Update item metadata
#[utoipa::path(
    put,
    path = "/items/{id}",
    tag = "items",
    params(("id" = i64, Path, description = "Item ID")),
    request_body = UpdateItem,
    responses(
        (status = 200, description = "Item updated", body = Item),
        (status = 404, description = "Item not found")
    )
)]
pub async fn update_item(
    State(state): State<crate::AppState>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateItem>,
) -> AppResult<Json<Item>> {
    let item = state.services.catalog.update_item(id, request).await?;
    Ok(Json(item))
}

/// Delete a catalog item
#[utoipa::path(
    delete,
    path = "/items/{id}",
    tag = "items",
    params(("id" = i64, Path, description = "Item ID")),
    responses(
        (status = 204, description = "Item deleted"),
        (status = 404, description = "Item not found"),
        (status = 409, description = "Item still referenced by open loans")
    )
)]
pub async fn delete_item(
    State(state): State<crate::AppState>,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    state.services.catalog.delete_item(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Reset inventory counters for an item
#[utoipa::path(
    put,
    path = "/items/{id}/inventory",
    tag = "items",
    params(("id" = i64, Path, description = "Item ID")),
    request_body = SetInventoryRequest,
    responses(
        (status = 200, description = "Counters reset", body = Item),
        (status = 404, description = "Item not found"),
        (status = 422, description = "Counts out of range")
    )
)]
pub async fn set_inventory(
    State(state): State<crate::AppState>,
    Path(id): Path<i64>,
    Json(request): Json<SetInventoryRequest>,
) -> AppResult<Json<Item>> {
    let item = state
        .services
        .catalog
        .set_counts(id, request.total_copies, request.available_copies)
        .await?;
    Ok(Json(item))
}

/// Apply a signed delta to an item's available copies
#[utoipa::path(
    put,
    path = "/items/{id}/availability",
    tag = "items",
    params(("id" = i64, Path, description = "Item ID")),
    request_body = AdjustAvailabilityRequest,
    responses(
        (status = 200, description = "Availability adjusted", body = Item),
        (status = 404, description = "Item not found"),
        (status = 422, description = "Adjustment would violate counter bounds")
    )
)]
pub async fn adjust_availability(
    State(state): State<crate::AppState>,
    Path(id): Path<i64>,
    Json(request): Json<AdjustAvailabilityRequest>,
) -> AppResult<Json<Item>> {
    let item = state
        .services
        .catalog
        .adjust_availability(id, request.delta)
        .await?;
    Ok(Json(item))
}

/// Distinct catalog categories
#[utoipa::path(
    get,
    path = "/items/categories",
    tag = "items",
    responses(
        (status = 200, description = "Categories in use", body = Vec<String>)
    )
)]
pub async fn categories(
    State(state): State<crate::AppState>,
) -> AppResult<Json<Vec<String>>> {
    let categories = state.services.catalog.categories().await?;
    Ok(Json(categories))
}

/// Items running low on available copies
#[utoipa::path(
    get,
    path = "/items/low-stock",
    tag = "items",
    params(LowStockQuery),
    responses(
        (status = 200, description = "Low-stock items", body = Vec<Item>)
    )
)]
pub async fn low_stock(
    State(state): State<crate::AppState>,
    Query(query): Query<LowStockQuery>,
) -> AppResult<Json<Vec<Item>>> {
    let items = state.services.catalog.low_stock(query.threshold).await?;
    Ok(Json(items))
}

/// Items with no available copies
#[utoipa::path(
    get,
    path = "/items/out-of-stock",
    tag = "items",
    responses(
        (status = 200, description = "Out-of-stock items", body = Vec<Item>)
    )
)]
pub async fn out_of_stock(
    State(state): State<crate::AppState>,
) -> AppResult<Json<Vec<Item>>> {
    let items = state.services.catalog.out_of_stock().await?;
    Ok(Json(items))
}
