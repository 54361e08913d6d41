//! Inventory Item REST API Routes
//!
//! CRUD over inventory items. Every route requires an authenticated caller.

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use inventron_core::{InventoryItem, ItemFields};

use crate::{
    error::{ApiError, ApiResult},
    extractors::{ItemPath, JsonBody},
    middleware::AuthenticatedUser,
    services::ItemService,
};

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

/// GET /api/inventron/items - List all items
#[utoipa::path(
    get,
    path = "/api/inventron/items",
    tag = "Items",
    responses(
        (status = 200, description = "All items in creation order", body = Vec<InventoryItem>),
        (status = 401, description = "Unauthenticated", body = ApiError),
    ),
    security(("cookie_auth" = []))
)]
pub async fn list_items(
    State(service): State<ItemService>,
    _user: AuthenticatedUser,
) -> ApiResult<Json<Vec<InventoryItem>>> {
    Ok(Json(service.list().await?))
}

/// POST /api/inventron/items - Create an item
#[utoipa::path(
    post,
    path = "/api/inventron/items",
    tag = "Items",
    request_body = ItemFields,
    responses(
        (status = 201, description = "Item created", body = InventoryItem),
        (status = 400, description = "Invalid fields or duplicate name", body = ApiError),
        (status = 401, description = "Unauthenticated", body = ApiError),
    ),
    security(("cookie_auth" = []))
)]
pub async fn create_item(
    State(service): State<ItemService>,
    AuthenticatedUser(identity): AuthenticatedUser,
    JsonBody(fields): JsonBody<ItemFields>,
) -> ApiResult<impl IntoResponse> {
    let item = service.create(fields).await?;
    tracing::debug!(user = %identity.username, item_id = %item.id, "Create request served");
    Ok((StatusCode::CREATED, Json(item)))
}

/// GET /api/inventron/items/{id} - Get an item
#[utoipa::path(
    get,
    path = "/api/inventron/items/{id}",
    tag = "Items",
    params(
        ("id" = i64, Path, description = "Item ID")
    ),
    responses(
        (status = 200, description = "Item details", body = InventoryItem),
        (status = 404, description = "Item not found", body = ApiError),
        (status = 401, description = "Unauthenticated", body = ApiError),
    ),
    security(("cookie_auth" = []))
)]
pub async fn get_item(
    State(service): State<ItemService>,
    _user: AuthenticatedUser,
    ItemPath(id): ItemPath,
) -> ApiResult<Json<InventoryItem>> {
    Ok(Json(service.get(id).await?))
}

/// PUT /api/inventron/items/{id} - Update an item
///
/// Fields left out of the body keep their stored value.
#[utoipa::path(
    put,
    path = "/api/inventron/items/{id}",
    tag = "Items",
    params(
        ("id" = i64, Path, description = "Item ID")
    ),
    request_body = ItemFields,
    responses(
        (status = 200, description = "Item updated", body = InventoryItem),
        (status = 400, description = "Invalid fields or duplicate name", body = ApiError),
        (status = 404, description = "Item not found", body = ApiError),
        (status = 401, description = "Unauthenticated", body = ApiError),
    ),
    security(("cookie_auth" = []))
)]
pub async fn update_item(
    State(service): State<ItemService>,
    _user: AuthenticatedUser,
    ItemPath(id): ItemPath,
    JsonBody(fields): JsonBody<ItemFields>,
) -> ApiResult<Json<InventoryItem>> {
    Ok(Json(service.update(id, fields).await?))
}

/// DELETE /api/inventron/items/{id} - Delete an item
#[utoipa::path(
    delete,
    path = "/api/inventron/items/{id}",
    tag = "Items",
    params(
        ("id" = i64, Path, description = "Item ID")
    ),
    responses(
        (status = 204, description = "Item deleted"),
        (status = 404, description = "Item not found", body = ApiError),
        (status = 401, description = "Unauthenticated", body = ApiError),
    ),
    security(("cookie_auth" = []))
)]
pub async fn delete_item(
    State(service): State<ItemService>,
    _user: AuthenticatedUser,
    ItemPath(id): ItemPath,
) -> ApiResult<StatusCode> {
    service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// ROUTER
// ============================================================================

/// Create the item router, mounted under `/api/inventron/items`.
pub fn create_router(service: ItemService) -> Router {
    Router::new()
        .route("/", get(list_items).post(create_item))
        .route(
            "/:id",
            get(get_item).put(update_item).delete(delete_item),
        )
        .with_state(service)
}
