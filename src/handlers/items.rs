use crate::handlers::common::{
    created_response, double_option, normalize_optional_string, normalize_string, success_response,
    validate_input,
};
use crate::{
    entities::item,
    errors::ServiceError,
    pagination::Page,
    services::items::{CreateItemInput, ItemListQuery, UpdateItemInput},
    AppState,
};
use axum::{
    extract::{Json, Path, Query, State},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Creates the router for item endpoints
pub fn items_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_item).get(list_items))
        .route("/check-code", get(check_code))
        .route(
            "/:id",
            get(get_item)
                .put(update_item)
                .patch(update_item)
                .delete(archive_item),
        )
        .route("/:id/restore", post(restore_item))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateItemRequest {
    /// Unique item code, e.g. "USB001"
    #[validate(length(min = 1, max = 50))]
    pub code: String,
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub description: Option<String>,
    #[validate(length(max = 20))]
    pub unit: Option<String>,
    #[validate(length(max = 100))]
    pub category: Option<String>,
    #[validate(range(min = 0))]
    pub stock_min: Option<i32>,
    pub active: Option<bool>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateItemRequest {
    #[validate(length(min = 1, max = 50))]
    pub code: Option<String>,
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    /// Omit to keep, send null to clear
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    #[validate(length(max = 20))]
    pub unit: Option<String>,
    /// Omit to keep, send null to clear
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub category: Option<Option<String>>,
    #[validate(range(min = 0))]
    pub stock_min: Option<i32>,
    pub active: Option<bool>,
}

#[derive(Debug, Deserialize, Validate, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct ListItemsQuery {
    /// 1-based page number
    #[validate(range(min = 1))]
    pub page: Option<u64>,
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<u64>,
    /// Substring match over name and code, case-insensitive
    pub search: Option<String>,
    /// Exact category match, case-insensitive
    pub category: Option<String>,
    pub active: Option<bool>,
    /// Include archived items in the listing
    pub include_archived: Option<bool>,
}

#[derive(Debug, Deserialize, Validate, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct CheckCodeQuery {
    #[validate(length(min = 1, max = 50))]
    pub code: String,
    pub exclude_id: Option<i32>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CheckCodeResponse {
    pub exists: bool,
}

/// Create a new catalog item
#[utoipa::path(
    post,
    path = "/api/v1/items",
    request_body = CreateItemRequest,
    responses(
        (status = 201, description = "Item created", body = item::Model),
        (status = 400, description = "Invalid payload", body = crate::errors::ErrorResponse),
        (status = 409, description = "Code already in use", body = crate::errors::ErrorResponse)
    ),
    tag = "Items"
)]
pub async fn create_item(
    State(state): State<AppState>,
    Json(payload): Json<CreateItemRequest>,
) -> Result<impl axum::response::IntoResponse, ServiceError> {
    validate_input(&payload)?;

    let input = CreateItemInput {
        code: normalize_string(payload.code),
        name: normalize_string(payload.name),
        description: normalize_optional_string(payload.description),
        unit: normalize_optional_string(payload.unit),
        category: normalize_optional_string(payload.category),
        stock_min: payload.stock_min,
        active: payload.active,
    };

    let item = state.items.create(input).await?;
    Ok(created_response(item))
}

/// List items with pagination and filters
#[utoipa::path(
    get,
    path = "/api/v1/items",
    params(ListItemsQuery),
    responses(
        (status = 200, description = "Paginated item list", body = Page<item::Model>),
        (status = 400, description = "Invalid query", body = crate::errors::ErrorResponse)
    ),
    tag = "Items"
)]
pub async fn list_items(
    State(state): State<AppState>,
    Query(params): Query<ListItemsQuery>,
) -> Result<impl axum::response::IntoResponse, ServiceError> {
    validate_input(&params)?;

    let query = ItemListQuery {
        page: params.page.unwrap_or(1),
        limit: params.limit.unwrap_or(20),
        search: normalize_optional_string(params.search),
        category: normalize_optional_string(params.category),
        active: params.active,
        include_archived: params.include_archived.unwrap_or(false),
    };

    let page = state.items.find_all(query).await?;
    Ok(success_response(page))
}

/// Check whether an item code is already taken
#[utoipa::path(
    get,
    path = "/api/v1/items/check-code",
    params(CheckCodeQuery),
    responses(
        (status = 200, description = "Existence flag", body = CheckCodeResponse)
    ),
    tag = "Items"
)]
pub async fn check_code(
    State(state): State<AppState>,
    Query(params): Query<CheckCodeQuery>,
) -> Result<impl axum::response::IntoResponse, ServiceError> {
    validate_input(&params)?;

    let exists = state
        .items
        .check_code_exists(params.code.trim(), params.exclude_id)
        .await?;
    Ok(success_response(CheckCodeResponse { exists }))
}

/// Get one item by id
#[utoipa::path(
    get,
    path = "/api/v1/items/{id}",
    params(("id" = i32, Path, description = "Item id")),
    responses(
        (status = 200, description = "The item", body = item::Model),
        (status = 404, description = "Unknown or archived item", body = crate::errors::ErrorResponse)
    ),
    tag = "Items"
)]
pub async fn get_item(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl axum::response::IntoResponse, ServiceError> {
    let item = state.items.find_one(id).await?;
    Ok(success_response(item))
}

/// Partially update an item
#[utoipa::path(
    patch,
    path = "/api/v1/items/{id}",
    params(("id" = i32, Path, description = "Item id")),
    request_body = UpdateItemRequest,
    responses(
        (status = 200, description = "Updated item", body = item::Model),
        (status = 404, description = "Unknown or archived item", body = crate::errors::ErrorResponse),
        (status = 409, description = "Code already in use", body = crate::errors::ErrorResponse)
    ),
    tag = "Items"
)]
pub async fn update_item(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateItemRequest>,
) -> Result<impl axum::response::IntoResponse, ServiceError> {
    validate_input(&payload)?;

    let input = UpdateItemInput {
        code: payload.code.map(normalize_string),
        name: payload.name.map(normalize_string),
        description: payload.description.map(normalize_optional_string),
        unit: payload.unit.map(normalize_string),
        category: payload.category.map(normalize_optional_string),
        stock_min: payload.stock_min,
        active: payload.active,
    };

    let item = state.items.update(id, input).await?;
    Ok(success_response(item))
}

/// Archive (soft-delete) an item
#[utoipa::path(
    delete,
    path = "/api/v1/items/{id}",
    params(("id" = i32, Path, description = "Item id")),
    responses(
        (status = 200, description = "Archived item", body = item::Model),
        (status = 404, description = "Unknown or archived item", body = crate::errors::ErrorResponse)
    ),
    tag = "Items"
)]
pub async fn archive_item(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl axum::response::IntoResponse, ServiceError> {
    let item = state.items.remove(id).await?;
    Ok(success_response(item))
}

/// Restore an archived item
#[utoipa::path(
    post,
    path = "/api/v1/items/{id}/restore",
    params(("id" = i32, Path, description = "Item id")),
    responses(
        (status = 200, description = "Restored item", body = item::Model),
        (status = 404, description = "Unknown item", body = crate::errors::ErrorResponse),
        (status = 409, description = "Item is not archived", body = crate::errors::ErrorResponse)
    ),
    tag = "Items"
)]
pub async fn restore_item(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl axum::response::IntoResponse, ServiceError> {
    let item = state.items.restore(id).await?;
    Ok(success_response(item))
}
