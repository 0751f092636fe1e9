use crate::handlers::common::{
    created_response, double_option, normalize_optional_string, normalize_string, success_response,
    validate_input,
};
use crate::{
    entities::QuoteStatus,
    errors::ServiceError,
    pagination::Page,
    services::quotes::{
        CreateQuoteInput, QuoteLineInput, QuoteListQuery, QuoteWithLines, UpdateQuoteInput,
    },
    AppState,
};
use axum::{
    extract::{Json, Path, Query, State},
    routing::{get, patch, post},
    Router,
};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

/// Creates the router for quote endpoints
pub fn quotes_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_quote).get(list_quotes))
        .route(
            "/:id",
            get(get_quote).patch(update_quote).delete(archive_quote),
        )
        .route("/:id/send", patch(send_quote))
        .route("/:id/accept", patch(accept_quote))
        .route("/:id/reject", patch(reject_quote))
        .route("/maintenance/mark-expired", post(mark_expired))
}

fn validate_quantity(value: &Decimal) -> Result<(), ValidationError> {
    if *value < dec!(0.001) {
        return Err(ValidationError::new("quantity_min"));
    }
    if value.scale() > 3 {
        return Err(ValidationError::new("quantity_scale"));
    }
    Ok(())
}

fn validate_unit_price(value: &Decimal) -> Result<(), ValidationError> {
    if *value < Decimal::ZERO {
        return Err(ValidationError::new("unit_price_min"));
    }
    if value.scale() > 2 {
        return Err(ValidationError::new("unit_price_scale"));
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuoteLineRequest {
    /// Catalog item backing this line
    pub item_id: i32,
    /// Denormalized snapshot of the item code
    #[validate(length(min = 1, max = 50))]
    pub item_code: String,
    /// Denormalized snapshot of the item name
    #[validate(length(min = 1, max = 200))]
    pub item_name: String,
    /// At least 0.001, up to 3 decimal places
    #[validate(custom = "validate_quantity")]
    #[schema(value_type = String, example = "2.000")]
    pub quantity: Decimal,
    /// Non-negative, up to 2 decimal places
    #[validate(custom = "validate_unit_price")]
    #[schema(value_type = String, example = "500.00")]
    pub unit_price: Decimal,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateQuoteRequest {
    pub customer_id: Option<i32>,
    #[validate(length(min = 1, max = 200))]
    pub customer_name: String,
    #[validate(email, length(max = 200))]
    pub customer_email: Option<String>,
    pub valid_until: DateTime<Utc>,
    /// At least one line; the service enforces the minimum
    #[validate]
    pub lines: Vec<QuoteLineRequest>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateQuoteRequest {
    /// Omit to keep, send null to clear
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<i32>)]
    pub customer_id: Option<Option<i32>>,
    #[validate(length(min = 1, max = 200))]
    pub customer_name: Option<String>,
    /// Omit to keep, send null to clear
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub customer_email: Option<Option<String>>,
    pub valid_until: Option<DateTime<Utc>>,
    /// Replaces the whole line set when present
    #[validate]
    pub lines: Option<Vec<QuoteLineRequest>>,
}

#[derive(Debug, Deserialize, Validate, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct ListQuotesQuery {
    /// 1-based page number
    #[validate(range(min = 1))]
    pub page: Option<u64>,
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<u64>,
    /// Substring match over number and customer name, case-insensitive
    pub search: Option<String>,
    pub status: Option<QuoteStatus>,
    /// Substring match on customer name, case-insensitive
    pub customer_name: Option<String>,
    /// Inclusive creation-date lower bound (YYYY-MM-DD)
    pub date_from: Option<NaiveDate>,
    /// Inclusive creation-date upper bound (YYYY-MM-DD)
    pub date_to: Option<NaiveDate>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MarkExpiredResponse {
    pub updated_count: u64,
}

fn line_input(line: QuoteLineRequest) -> QuoteLineInput {
    QuoteLineInput {
        item_id: line.item_id,
        item_code: normalize_string(line.item_code),
        item_name: normalize_string(line.item_name),
        quantity: line.quantity,
        unit_price: line.unit_price,
    }
}

/// Create a new quote (starts in DRAFT)
#[utoipa::path(
    post,
    path = "/api/v1/quotes",
    request_body = CreateQuoteRequest,
    responses(
        (status = 201, description = "Quote created", body = QuoteWithLines),
        (status = 400, description = "Invalid payload or unknown items", body = crate::errors::ErrorResponse),
        (status = 409, description = "Quote number collision", body = crate::errors::ErrorResponse)
    ),
    tag = "Quotes"
)]
pub async fn create_quote(
    State(state): State<AppState>,
    Json(payload): Json<CreateQuoteRequest>,
) -> Result<impl axum::response::IntoResponse, ServiceError> {
    validate_input(&payload)?;

    let input = CreateQuoteInput {
        customer_id: payload.customer_id,
        customer_name: normalize_string(payload.customer_name),
        customer_email: normalize_optional_string(payload.customer_email),
        valid_until: payload.valid_until,
        lines: payload.lines.into_iter().map(line_input).collect(),
    };

    let quote = state.quotes.create(input).await?;
    Ok(created_response(quote))
}

/// List quotes with pagination and filters
#[utoipa::path(
    get,
    path = "/api/v1/quotes",
    params(ListQuotesQuery),
    responses(
        (status = 200, description = "Paginated quote list", body = Page<QuoteWithLines>),
        (status = 400, description = "Invalid query", body = crate::errors::ErrorResponse)
    ),
    tag = "Quotes"
)]
pub async fn list_quotes(
    State(state): State<AppState>,
    Query(params): Query<ListQuotesQuery>,
) -> Result<impl axum::response::IntoResponse, ServiceError> {
    validate_input(&params)?;

    let query = QuoteListQuery {
        page: params.page.unwrap_or(1),
        limit: params.limit.unwrap_or(20),
        search: normalize_optional_string(params.search),
        status: params.status,
        customer_name: normalize_optional_string(params.customer_name),
        date_from: params.date_from,
        date_to: params.date_to,
    };

    let page = state.quotes.find_all(query).await?;
    Ok(success_response(page))
}

/// Get one quote by id
#[utoipa::path(
    get,
    path = "/api/v1/quotes/{id}",
    params(("id" = i32, Path, description = "Quote id")),
    responses(
        (status = 200, description = "The quote with its lines", body = QuoteWithLines),
        (status = 404, description = "Unknown or archived quote", body = crate::errors::ErrorResponse)
    ),
    tag = "Quotes"
)]
pub async fn get_quote(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl axum::response::IntoResponse, ServiceError> {
    let quote = state.quotes.find_one(id).await?;
    Ok(success_response(quote))
}

/// Update a draft quote
#[utoipa::path(
    patch,
    path = "/api/v1/quotes/{id}",
    params(("id" = i32, Path, description = "Quote id")),
    request_body = UpdateQuoteRequest,
    responses(
        (status = 200, description = "Updated quote", body = QuoteWithLines),
        (status = 400, description = "Invalid payload or unknown items", body = crate::errors::ErrorResponse),
        (status = 404, description = "Unknown or archived quote", body = crate::errors::ErrorResponse),
        (status = 409, description = "Quote is not in DRAFT", body = crate::errors::ErrorResponse)
    ),
    tag = "Quotes"
)]
pub async fn update_quote(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateQuoteRequest>,
) -> Result<impl axum::response::IntoResponse, ServiceError> {
    validate_input(&payload)?;

    let input = UpdateQuoteInput {
        customer_id: payload.customer_id,
        customer_name: payload.customer_name.map(normalize_string),
        customer_email: payload.customer_email.map(normalize_optional_string),
        valid_until: payload.valid_until,
        lines: payload
            .lines
            .map(|lines| lines.into_iter().map(line_input).collect()),
    };

    let quote = state.quotes.update(id, input).await?;
    Ok(success_response(quote))
}

/// Archive (soft-delete) a quote
#[utoipa::path(
    delete,
    path = "/api/v1/quotes/{id}",
    params(("id" = i32, Path, description = "Quote id")),
    responses(
        (status = 200, description = "Archived quote", body = QuoteWithLines),
        (status = 404, description = "Unknown or archived quote", body = crate::errors::ErrorResponse),
        (status = 409, description = "Accepted quotes cannot be deleted", body = crate::errors::ErrorResponse)
    ),
    tag = "Quotes"
)]
pub async fn archive_quote(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl axum::response::IntoResponse, ServiceError> {
    let quote = state.quotes.remove(id).await?;
    Ok(success_response(quote))
}

/// Send a draft quote to the customer
#[utoipa::path(
    patch,
    path = "/api/v1/quotes/{id}/send",
    params(("id" = i32, Path, description = "Quote id")),
    responses(
        (status = 200, description = "Quote now SENT", body = QuoteWithLines),
        (status = 404, description = "Unknown or archived quote", body = crate::errors::ErrorResponse),
        (status = 409, description = "Quote is not in DRAFT", body = crate::errors::ErrorResponse)
    ),
    tag = "Quotes"
)]
pub async fn send_quote(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl axum::response::IntoResponse, ServiceError> {
    let quote = state.quotes.send(id).await?;
    Ok(success_response(quote))
}

/// Accept a sent quote
#[utoipa::path(
    patch,
    path = "/api/v1/quotes/{id}/accept",
    params(("id" = i32, Path, description = "Quote id")),
    responses(
        (status = 200, description = "Quote now ACCEPTED", body = QuoteWithLines),
        (status = 404, description = "Unknown or archived quote", body = crate::errors::ErrorResponse),
        (status = 409, description = "Quote is not in SENT", body = crate::errors::ErrorResponse)
    ),
    tag = "Quotes"
)]
pub async fn accept_quote(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl axum::response::IntoResponse, ServiceError> {
    let quote = state.quotes.accept(id).await?;
    Ok(success_response(quote))
}

/// Reject a sent quote
#[utoipa::path(
    patch,
    path = "/api/v1/quotes/{id}/reject",
    params(("id" = i32, Path, description = "Quote id")),
    responses(
        (status = 200, description = "Quote now REJECTED", body = QuoteWithLines),
        (status = 404, description = "Unknown or archived quote", body = crate::errors::ErrorResponse),
        (status = 409, description = "Quote is not in SENT", body = crate::errors::ErrorResponse)
    ),
    tag = "Quotes"
)]
pub async fn reject_quote(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl axum::response::IntoResponse, ServiceError> {
    let quote = state.quotes.reject(id).await?;
    Ok(success_response(quote))
}

/// Expiration sweep: mark overdue SENT quotes as EXPIRED
///
/// Intended to be triggered by an external scheduler; idempotent.
#[utoipa::path(
    post,
    path = "/api/v1/quotes/maintenance/mark-expired",
    responses(
        (status = 200, description = "Number of quotes expired", body = MarkExpiredResponse)
    ),
    tag = "Quotes"
)]
pub async fn mark_expired(
    State(state): State<AppState>,
) -> Result<impl axum::response::IntoResponse, ServiceError> {
    let updated_count = state.quotes.mark_expired().await?;
    Ok(success_response(MarkExpiredResponse { updated_count }))
}
