use utoipa::OpenApi;

use crate::entities::{item, quote, quote_line, QuoteStatus};
use crate::errors::ErrorResponse;
use crate::handlers::{items, quotes};
use crate::pagination::{Page, PageInfo};
use crate::services::quotes::QuoteWithLines;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Atelier API",
        description = "Workshop ERP backend: inventory catalog and sales quote management",
        version = "0.1.0"
    ),
    paths(
        items::create_item,
        items::list_items,
        items::check_code,
        items::get_item,
        items::update_item,
        items::archive_item,
        items::restore_item,
        quotes::create_quote,
        quotes::list_quotes,
        quotes::get_quote,
        quotes::update_quote,
        quotes::archive_quote,
        quotes::send_quote,
        quotes::accept_quote,
        quotes::reject_quote,
        quotes::mark_expired,
    ),
    components(schemas(
        item::Model,
        quote::Model,
        quote_line::Model,
        QuoteStatus,
        QuoteWithLines,
        PageInfo,
        Page<item::Model>,
        Page<QuoteWithLines>,
        ErrorResponse,
        items::CreateItemRequest,
        items::UpdateItemRequest,
        items::CheckCodeResponse,
        quotes::CreateQuoteRequest,
        quotes::UpdateQuoteRequest,
        quotes::QuoteLineRequest,
        quotes::MarkExpiredResponse,
    )),
    tags(
        (name = "Items", description = "Inventory catalog"),
        (name = "Quotes", description = "Sales quotes and their lifecycle")
    )
)]
pub struct ApiDoc;
