use crate::{
    entities::{item, quote, quote_line, QuoteStatus},
    errors::{is_unique_violation, ServiceError},
    events::{Event, EventSender},
    pagination::Page,
};
use chrono::{Datelike, NaiveDate, NaiveTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, LoaderTrait,
    ModelTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;

/// Fixed VAT rate applied to every quote.
pub const TAX_RATE: Decimal = dec!(0.2);

const NUMBER_PREFIX: &str = "QUO";

#[derive(Debug, Clone)]
pub struct QuoteLineInput {
    pub item_id: i32,
    pub item_code: String,
    pub item_name: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
}

#[derive(Debug, Clone)]
pub struct CreateQuoteInput {
    pub customer_id: Option<i32>,
    pub customer_name: String,
    pub customer_email: Option<String>,
    pub valid_until: chrono::DateTime<Utc>,
    pub lines: Vec<QuoteLineInput>,
}

/// Partial update payload, same three-way field semantics as
/// `items::UpdateItemInput`. When `lines` is present the whole line set is
/// replaced and totals are recomputed.
#[derive(Debug, Clone, Default)]
pub struct UpdateQuoteInput {
    pub customer_id: Option<Option<i32>>,
    pub customer_name: Option<String>,
    pub customer_email: Option<Option<String>>,
    pub valid_until: Option<chrono::DateTime<Utc>>,
    pub lines: Option<Vec<QuoteLineInput>>,
}

#[derive(Debug, Clone)]
pub struct QuoteListQuery {
    pub page: u64,
    pub limit: u64,
    pub search: Option<String>,
    pub status: Option<QuoteStatus>,
    pub customer_name: Option<String>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

impl Default for QuoteListQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 20,
            search: None,
            status: None,
            customer_name: None,
            date_from: None,
            date_to: None,
        }
    }
}

/// A quote together with its owned lines.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct QuoteWithLines {
    #[serde(flatten)]
    pub quote: quote::Model,
    pub lines: Vec<quote_line::Model>,
}

/// Quote-level monetary aggregates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Totals {
    pub total_amount: Decimal,
    pub tax_amount: Decimal,
    pub total_with_tax: Decimal,
}

/// Rounds a money amount to 2 decimals, midpoint away from zero.
fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Computes quote totals from line quantities and prices.
///
/// The tax is computed on the already-rounded total, and the grand total is
/// the sum of the two rounded figures. Keeping that order is part of the
/// contract: totals on an invoice must match what a calculator shows.
pub fn calculate_totals(lines: &[QuoteLineInput], tax_rate: Decimal) -> Totals {
    let raw_total: Decimal = lines
        .iter()
        .map(|line| line.quantity * line.unit_price)
        .sum();
    let total_amount = round_money(raw_total);
    let tax_amount = round_money(total_amount * tax_rate);
    Totals {
        total_amount,
        tax_amount,
        total_with_tax: total_amount + tax_amount,
    }
}

/// Parses the sequence out of the latest quote number of the year, if any.
/// The lexicographically greatest number is also the numerically greatest
/// because the sequence suffix is zero-padded to a fixed width.
fn next_sequence(last_number: Option<&str>) -> u32 {
    last_number
        .and_then(|n| n.rsplit('-').next())
        .and_then(|seq| seq.parse::<u32>().ok())
        .map(|seq| seq + 1)
        .unwrap_or(1)
}

/// Service for managing sales quotes
#[derive(Clone)]
pub struct QuoteService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl QuoteService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    /// Produces the next quote number for the current year, format
    /// `QUO-<year>-NNN`.
    ///
    /// Not safe under concurrent creation on its own: two callers can compute
    /// the same candidate. The unique index on `number` rejects the loser,
    /// which `create` maps to `Conflict`. There is deliberately no retry loop.
    async fn generate_number(&self) -> Result<String, ServiceError> {
        let prefix = format!("{}-{}-", NUMBER_PREFIX, Utc::now().year());

        let last = quote::Entity::find()
            .filter(quote::Column::Number.starts_with(prefix.clone()))
            .order_by_desc(quote::Column::Number)
            .one(&*self.db)
            .await?;

        let seq = next_sequence(last.as_ref().map(|q| q.number.as_str()));
        Ok(format!("{}{:03}", prefix, seq))
    }

    /// Checks that every referenced item exists, is active and not archived.
    /// Fails with `BadRequest` naming the offending ids.
    async fn validate_line_items(&self, lines: &[QuoteLineInput]) -> Result<(), ServiceError> {
        let item_ids: Vec<i32> = lines.iter().map(|line| line.item_id).collect();

        let existing = item::Entity::find()
            .filter(item::Column::Id.is_in(item_ids.clone()))
            .filter(item::Column::DeletedAt.is_null())
            .filter(item::Column::Active.eq(true))
            .all(&*self.db)
            .await?;

        if existing.len() != item_ids.len() {
            let missing: Vec<String> = item_ids
                .iter()
                .filter(|id| !existing.iter().any(|item| item.id == **id))
                .map(|id| id.to_string())
                .collect();
            return Err(ServiceError::BadRequest(format!(
                "Items not found or inactive: {}",
                missing.join(", ")
            )));
        }

        Ok(())
    }

    fn line_models(
        quote_id: i32,
        lines: Vec<QuoteLineInput>,
    ) -> impl Iterator<Item = quote_line::ActiveModel> {
        lines.into_iter().map(move |line| quote_line::ActiveModel {
            quote_id: Set(quote_id),
            item_id: Set(line.item_id),
            item_code: Set(line.item_code),
            item_name: Set(line.item_name),
            quantity: Set(line.quantity),
            unit_price: Set(line.unit_price),
            line_total: Set(round_money(line.quantity * line.unit_price)),
            ..Default::default()
        })
    }

    /// Creates a quote in DRAFT with its lines, atomically.
    #[instrument(skip(self, input), fields(customer = %input.customer_name))]
    pub async fn create(&self, input: CreateQuoteInput) -> Result<QuoteWithLines, ServiceError> {
        if input.lines.is_empty() {
            return Err(ServiceError::BadRequest(
                "A quote must contain at least one line".to_string(),
            ));
        }
        self.validate_line_items(&input.lines).await?;

        let number = self.generate_number().await?;
        let totals = calculate_totals(&input.lines, TAX_RATE);
        let now = Utc::now();

        let txn = self.db.begin().await?;

        let model = quote::ActiveModel {
            number: Set(number.clone()),
            customer_id: Set(input.customer_id),
            customer_name: Set(input.customer_name),
            customer_email: Set(input.customer_email),
            status: Set(QuoteStatus::Draft),
            total_amount: Set(totals.total_amount),
            tax_amount: Set(totals.tax_amount),
            total_with_tax: Set(totals.total_with_tax),
            valid_until: Set(input.valid_until),
            created_at: Set(now),
            updated_at: Set(now),
            deleted_at: Set(None),
            ..Default::default()
        };

        let quote = match model.insert(&txn).await {
            Ok(quote) => quote,
            Err(err) if is_unique_violation(&err) => {
                return Err(ServiceError::Conflict(format!(
                    "A quote with number \"{}\" already exists",
                    number
                )));
            }
            Err(err) => return Err(err.into()),
        };

        quote_line::Entity::insert_many(Self::line_models(quote.id, input.lines))
            .exec(&txn)
            .await?;
        txn.commit().await?;

        let lines = quote
            .find_related(quote_line::Entity)
            .all(&*self.db)
            .await?;

        self.event_sender
            .send_or_log(Event::QuoteCreated {
                quote_id: quote.id,
                number: quote.number.clone(),
            })
            .await;
        info!("Created quote {} ({})", quote.id, quote.number);
        Ok(QuoteWithLines { quote, lines })
    }

    /// Lists quotes with their lines, newest first.
    #[instrument(skip(self))]
    pub async fn find_all(
        &self,
        query: QuoteListQuery,
    ) -> Result<Page<QuoteWithLines>, ServiceError> {
        let cond = list_filter(&query);
        let skip = (query.page - 1) * query.limit;

        let quotes = quote::Entity::find()
            .filter(cond.clone())
            .order_by_desc(quote::Column::CreatedAt)
            .offset(skip)
            .limit(query.limit)
            .all(&*self.db)
            .await?;
        let total = quote::Entity::find().filter(cond).count(&*self.db).await?;

        let lines = quotes.load_many(quote_line::Entity, &*self.db).await?;
        let data = quotes
            .into_iter()
            .zip(lines)
            .map(|(quote, lines)| QuoteWithLines { quote, lines })
            .collect();

        Ok(Page::new(data, query.page, query.limit, total))
    }

    /// Fetches one live quote with its lines.
    #[instrument(skip(self))]
    pub async fn find_one(&self, id: i32) -> Result<QuoteWithLines, ServiceError> {
        let quote = quote::Entity::find()
            .filter(quote::Column::Id.eq(id))
            .filter(quote::Column::DeletedAt.is_null())
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Quote with id {} not found", id)))?;

        let lines = quote
            .find_related(quote_line::Entity)
            .all(&*self.db)
            .await?;
        Ok(QuoteWithLines { quote, lines })
    }

    /// Updates a DRAFT quote. A payload carrying `lines` replaces the whole
    /// line set and recomputes totals; other fields are applied on their own.
    #[instrument(skip(self, input))]
    pub async fn update(
        &self,
        id: i32,
        input: UpdateQuoteInput,
    ) -> Result<QuoteWithLines, ServiceError> {
        let existing = self.find_one(id).await?;

        if !existing.quote.status.is_editable() {
            return Err(ServiceError::Conflict(
                "Only draft quotes can be modified".to_string(),
            ));
        }

        if let Some(lines) = &input.lines {
            if lines.is_empty() {
                return Err(ServiceError::BadRequest(
                    "A quote must contain at least one line".to_string(),
                ));
            }
            self.validate_line_items(lines).await?;
        }

        let txn = self.db.begin().await?;

        let mut active_model: quote::ActiveModel = existing.quote.into();
        if let Some(customer_id) = input.customer_id {
            active_model.customer_id = Set(customer_id);
        }
        if let Some(customer_name) = input.customer_name {
            active_model.customer_name = Set(customer_name);
        }
        if let Some(customer_email) = input.customer_email {
            active_model.customer_email = Set(customer_email);
        }
        if let Some(valid_until) = input.valid_until {
            active_model.valid_until = Set(valid_until);
        }
        if let Some(lines) = &input.lines {
            let totals = calculate_totals(lines, TAX_RATE);
            active_model.total_amount = Set(totals.total_amount);
            active_model.tax_amount = Set(totals.tax_amount);
            active_model.total_with_tax = Set(totals.total_with_tax);
        }
        active_model.updated_at = Set(Utc::now());

        let quote = active_model.update(&txn).await?;

        if let Some(lines) = input.lines {
            quote_line::Entity::delete_many()
                .filter(quote_line::Column::QuoteId.eq(id))
                .exec(&txn)
                .await?;
            quote_line::Entity::insert_many(Self::line_models(quote.id, lines))
                .exec(&txn)
                .await?;
        }

        txn.commit().await?;

        let lines = quote
            .find_related(quote_line::Entity)
            .all(&*self.db)
            .await?;

        self.event_sender.send_or_log(Event::QuoteUpdated(quote.id)).await;
        info!("Updated quote {}", quote.id);
        Ok(QuoteWithLines { quote, lines })
    }

    /// Soft-deletes a quote. Accepted quotes cannot be removed; the status is
    /// left untouched for every other state.
    #[instrument(skip(self))]
    pub async fn remove(&self, id: i32) -> Result<QuoteWithLines, ServiceError> {
        let existing = self.find_one(id).await?;

        if !existing.quote.status.is_deletable() {
            return Err(ServiceError::Conflict(
                "An accepted quote cannot be deleted".to_string(),
            ));
        }

        let mut active_model: quote::ActiveModel = existing.quote.into();
        let now = Utc::now();
        active_model.deleted_at = Set(Some(now));
        active_model.updated_at = Set(now);

        let quote = active_model.update(&*self.db).await?;
        self.event_sender.send_or_log(Event::QuoteArchived(quote.id)).await;
        info!("Archived quote {}", quote.id);
        Ok(QuoteWithLines {
            quote,
            lines: existing.lines,
        })
    }

    /// DRAFT -> SENT.
    pub async fn send(&self, id: i32) -> Result<QuoteWithLines, ServiceError> {
        self.transition(id, QuoteStatus::Sent, "Only draft quotes can be sent")
            .await
    }

    /// SENT -> ACCEPTED.
    pub async fn accept(&self, id: i32) -> Result<QuoteWithLines, ServiceError> {
        self.transition(id, QuoteStatus::Accepted, "Only sent quotes can be accepted")
            .await
    }

    /// SENT -> REJECTED.
    pub async fn reject(&self, id: i32) -> Result<QuoteWithLines, ServiceError> {
        self.transition(id, QuoteStatus::Rejected, "Only sent quotes can be rejected")
            .await
    }

    #[instrument(skip(self, conflict_message))]
    async fn transition(
        &self,
        id: i32,
        target: QuoteStatus,
        conflict_message: &str,
    ) -> Result<QuoteWithLines, ServiceError> {
        let existing = self.find_one(id).await?;
        let current = existing.quote.status;

        if !current.can_transition_to(target) {
            return Err(ServiceError::Conflict(conflict_message.to_string()));
        }

        let mut active_model: quote::ActiveModel = existing.quote.into();
        active_model.status = Set(target);
        active_model.updated_at = Set(Utc::now());

        let quote = active_model.update(&*self.db).await?;
        self.event_sender
            .send_or_log(Event::QuoteStatusChanged {
                quote_id: quote.id,
                old_status: current,
                new_status: target,
            })
            .await;
        info!(
            "Quote {} transitioned {} -> {}",
            quote.id,
            current.as_str(),
            target.as_str()
        );
        Ok(QuoteWithLines {
            quote,
            lines: existing.lines,
        })
    }

    /// Expiration sweep: every live SENT quote whose validity date has passed
    /// becomes EXPIRED, in one conditional bulk update. Idempotent; safe to
    /// trigger from an external cron at any frequency.
    #[instrument(skip(self))]
    pub async fn mark_expired(&self) -> Result<u64, ServiceError> {
        let now = Utc::now();

        let result = quote::Entity::update_many()
            .col_expr(quote::Column::Status, Expr::value(QuoteStatus::Expired))
            .col_expr(quote::Column::UpdatedAt, Expr::value(now))
            .filter(quote::Column::Status.eq(QuoteStatus::Sent))
            .filter(quote::Column::ValidUntil.lt(now))
            .filter(quote::Column::DeletedAt.is_null())
            .exec(&*self.db)
            .await?;

        let updated_count = result.rows_affected;
        if updated_count > 0 {
            info!("Marked {} quote(s) as expired", updated_count);
        }
        self.event_sender
            .send_or_log(Event::QuotesExpired { updated_count })
            .await;
        Ok(updated_count)
    }
}

/// Builds the list predicate: always excludes archived quotes, then narrows by
/// status, free-text search over number/customer name, customer name and
/// creation date range.
fn list_filter(query: &QuoteListQuery) -> Condition {
    let mut cond = Condition::all().add(quote::Column::DeletedAt.is_null());

    if let Some(status) = query.status {
        cond = cond.add(quote::Column::Status.eq(status));
    }
    if let Some(search) = query.search.as_deref().filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", search.to_lowercase());
        cond = cond.add(
            Condition::any()
                .add(Expr::expr(Func::lower(Expr::col(quote::Column::Number))).like(pattern.clone()))
                .add(
                    Expr::expr(Func::lower(Expr::col(quote::Column::CustomerName))).like(pattern),
                ),
        );
    }
    if let Some(customer_name) = query.customer_name.as_deref().filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", customer_name.to_lowercase());
        cond = cond.add(Expr::expr(Func::lower(Expr::col(quote::Column::CustomerName))).like(pattern));
    }
    if let Some(from) = query.date_from {
        cond = cond.add(quote::Column::CreatedAt.gte(from.and_time(NaiveTime::MIN).and_utc()));
    }
    if let Some(to) = query.date_to {
        // Inclusive through the very end of that day.
        if let Some(end_of_day) = to.and_hms_milli_opt(23, 59, 59, 999) {
            cond = cond.add(quote::Column::CreatedAt.lte(end_of_day.and_utc()));
        }
    }

    cond
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn line(quantity: Decimal, unit_price: Decimal) -> QuoteLineInput {
        QuoteLineInput {
            item_id: 1,
            item_code: "ART-001".to_string(),
            item_name: "Test item".to_string(),
            quantity,
            unit_price,
        }
    }

    #[test]
    fn totals_for_reference_lines() {
        let totals = calculate_totals(
            &[line(dec!(2), dec!(100)), line(dec!(1), dec!(200))],
            TAX_RATE,
        );
        assert_eq!(totals.total_amount, dec!(400.00));
        assert_eq!(totals.tax_amount, dec!(80.00));
        assert_eq!(totals.total_with_tax, dec!(480.00));
    }

    #[test]
    fn totals_of_empty_line_set_are_zero() {
        let totals = calculate_totals(&[], TAX_RATE);
        assert_eq!(totals.total_amount, dec!(0.00));
        assert_eq!(totals.tax_amount, dec!(0.00));
        assert_eq!(totals.total_with_tax, dec!(0.00));
    }

    #[test]
    fn tax_is_computed_on_the_rounded_total() {
        // 3 x 0.035 = 0.105, which rounds up to 0.11 before the tax applies.
        let totals = calculate_totals(&[line(dec!(3), dec!(0.035))], TAX_RATE);
        assert_eq!(totals.total_amount, dec!(0.11));
        assert_eq!(totals.tax_amount, round_money(dec!(0.11) * TAX_RATE));
        assert_eq!(totals.total_with_tax, totals.total_amount + totals.tax_amount);
    }

    #[test]
    fn line_totals_round_midpoints_away_from_zero() {
        assert_eq!(round_money(dec!(1.005)), dec!(1.01));
        assert_eq!(round_money(dec!(2.675)), dec!(2.68));
        assert_eq!(round_money(dec!(1.004)), dec!(1.00));
    }

    #[rstest]
    #[case(None, 1)]
    #[case(Some("QUO-2024-001"), 2)]
    #[case(Some("QUO-2024-042"), 43)]
    #[case(Some("QUO-2024-999"), 1000)]
    #[case(Some("garbage"), 1)]
    fn sequence_follows_the_latest_number(#[case] last: Option<&str>, #[case] expected: u32) {
        assert_eq!(next_sequence(last), expected);
    }

    #[test]
    fn number_format_is_year_scoped_and_zero_padded() {
        let seq = next_sequence(None);
        let number = format!("QUO-2024-{:03}", seq);
        assert_eq!(number, "QUO-2024-001");
    }
}
