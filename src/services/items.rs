use crate::{
    entities::item,
    errors::ServiceError,
    events::{Event, EventSender},
    pagination::Page,
};
use chrono::Utc;
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use std::sync::Arc;
use tracing::{info, instrument};

/// Unit label applied when a new item does not specify one.
pub const DEFAULT_UNIT: &str = "unit";

#[derive(Debug, Clone)]
pub struct CreateItemInput {
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub unit: Option<String>,
    pub category: Option<String>,
    pub stock_min: Option<i32>,
    pub active: Option<bool>,
}

/// Partial update payload. The outer `Option` means "field present in the
/// request"; for nullable columns the inner `Option` distinguishes an explicit
/// null (clear the field) from a new value.
#[derive(Debug, Clone, Default)]
pub struct UpdateItemInput {
    pub code: Option<String>,
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub unit: Option<String>,
    pub category: Option<Option<String>>,
    pub stock_min: Option<i32>,
    pub active: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct ItemListQuery {
    pub page: u64,
    pub limit: u64,
    pub search: Option<String>,
    pub category: Option<String>,
    pub active: Option<bool>,
    pub include_archived: bool,
}

impl Default for ItemListQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 20,
            search: None,
            category: None,
            active: None,
            include_archived: false,
        }
    }
}

/// Service for managing catalog items
#[derive(Clone)]
pub struct ItemService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl ItemService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    /// Creates a new catalog item. Fails with `Conflict` when the code is
    /// already taken by a live item, compared case-insensitively.
    #[instrument(skip(self))]
    pub async fn create(&self, input: CreateItemInput) -> Result<item::Model, ServiceError> {
        if self.check_code_exists(&input.code, None).await? {
            return Err(ServiceError::Conflict(format!(
                "An item with code \"{}\" already exists",
                input.code
            )));
        }

        let now = Utc::now();
        let unit = input
            .unit
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_UNIT.to_string());

        let model = item::ActiveModel {
            code: Set(input.code),
            name: Set(input.name),
            description: Set(normalize_blank(input.description)),
            unit: Set(unit),
            category: Set(normalize_blank(input.category)),
            stock_min: Set(input.stock_min.unwrap_or(0)),
            active: Set(input.active.unwrap_or(true)),
            created_at: Set(now),
            updated_at: Set(now),
            deleted_at: Set(None),
            ..Default::default()
        };

        let item = model.insert(&*self.db).await?;
        self.event_sender.send_or_log(Event::ItemCreated(item.id)).await;
        info!("Created item {} ({})", item.id, item.code);
        Ok(item)
    }

    /// Lists items with pagination. Active items come first, then alphabetic
    /// by code.
    #[instrument(skip(self))]
    pub async fn find_all(&self, query: ItemListQuery) -> Result<Page<item::Model>, ServiceError> {
        let cond = list_filter(&query);
        let skip = (query.page - 1) * query.limit;

        let items = item::Entity::find()
            .filter(cond.clone())
            .order_by_desc(item::Column::Active)
            .order_by_asc(item::Column::Code)
            .offset(skip)
            .limit(query.limit)
            .all(&*self.db)
            .await?;
        let total = item::Entity::find().filter(cond).count(&*self.db).await?;

        Ok(Page::new(items, query.page, query.limit, total))
    }

    /// Fetches one live item; archived items are treated as missing.
    #[instrument(skip(self))]
    pub async fn find_one(&self, id: i32) -> Result<item::Model, ServiceError> {
        item::Entity::find()
            .filter(item::Column::Id.eq(id))
            .filter(item::Column::DeletedAt.is_null())
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Item with id {} not found", id)))
    }

    /// Applies a partial update. Only fields present in the payload are
    /// touched; explicit nulls clear the nullable columns.
    #[instrument(skip(self))]
    pub async fn update(&self, id: i32, input: UpdateItemInput) -> Result<item::Model, ServiceError> {
        let existing = self.find_one(id).await?;

        if let Some(code) = input.code.as_deref() {
            if self.check_code_exists(code, Some(id)).await? {
                return Err(ServiceError::Conflict(format!(
                    "An item with code \"{}\" already exists",
                    code
                )));
            }
        }

        let mut active_model: item::ActiveModel = existing.into();
        if let Some(code) = input.code {
            active_model.code = Set(code);
        }
        if let Some(name) = input.name {
            active_model.name = Set(name);
        }
        if let Some(description) = input.description {
            active_model.description = Set(normalize_blank(description));
        }
        if let Some(unit) = input.unit.filter(|u| !u.trim().is_empty()) {
            active_model.unit = Set(unit);
        }
        if let Some(category) = input.category {
            active_model.category = Set(normalize_blank(category));
        }
        if let Some(stock_min) = input.stock_min {
            active_model.stock_min = Set(stock_min);
        }
        if let Some(active) = input.active {
            active_model.active = Set(active);
        }
        active_model.updated_at = Set(Utc::now());

        let item = active_model.update(&*self.db).await?;
        self.event_sender.send_or_log(Event::ItemUpdated(item.id)).await;
        info!("Updated item {}", item.id);
        Ok(item)
    }

    /// Soft-deletes an item: stamps `deleted_at` and deactivates it.
    #[instrument(skip(self))]
    pub async fn remove(&self, id: i32) -> Result<item::Model, ServiceError> {
        let existing = self.find_one(id).await?;

        let mut active_model: item::ActiveModel = existing.into();
        let now = Utc::now();
        active_model.deleted_at = Set(Some(now));
        active_model.active = Set(false);
        active_model.updated_at = Set(now);

        let item = active_model.update(&*self.db).await?;
        self.event_sender.send_or_log(Event::ItemArchived(item.id)).await;
        info!("Archived item {}", item.id);
        Ok(item)
    }

    /// Restores an archived item. Fails with `NotFound` for an unknown id and
    /// `Conflict` when the item is not archived.
    #[instrument(skip(self))]
    pub async fn restore(&self, id: i32) -> Result<item::Model, ServiceError> {
        let existing = item::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Item with id {} not found", id)))?;

        if existing.deleted_at.is_none() {
            return Err(ServiceError::Conflict(format!(
                "Item with id {} is not archived",
                id
            )));
        }

        let mut active_model: item::ActiveModel = existing.into();
        active_model.deleted_at = Set(None);
        active_model.active = Set(true);
        active_model.updated_at = Set(Utc::now());

        let item = active_model.update(&*self.db).await?;
        self.event_sender.send_or_log(Event::ItemRestored(item.id)).await;
        info!("Restored item {}", item.id);
        Ok(item)
    }

    /// Case-insensitive code existence check among live items, optionally
    /// excluding one id (so an edit form can skip the item being edited).
    #[instrument(skip(self))]
    pub async fn check_code_exists(
        &self,
        code: &str,
        exclude_id: Option<i32>,
    ) -> Result<bool, ServiceError> {
        let mut cond = Condition::all()
            .add(Expr::expr(Func::lower(Expr::col(item::Column::Code))).eq(code.to_lowercase()))
            .add(item::Column::DeletedAt.is_null());
        if let Some(id) = exclude_id {
            cond = cond.add(item::Column::Id.ne(id));
        }

        let existing = item::Entity::find().filter(cond).one(&*self.db).await?;
        Ok(existing.is_some())
    }
}

/// Builds the list predicate: soft-delete visibility, active flag, free-text
/// search over name/code, and case-insensitive category match.
fn list_filter(query: &ItemListQuery) -> Condition {
    let mut cond = Condition::all();

    if !query.include_archived {
        cond = cond.add(item::Column::DeletedAt.is_null());
    }
    if let Some(active) = query.active {
        cond = cond.add(item::Column::Active.eq(active));
    }
    if let Some(search) = query.search.as_deref().filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", search.to_lowercase());
        cond = cond.add(
            Condition::any()
                .add(Expr::expr(Func::lower(Expr::col(item::Column::Name))).like(pattern.clone()))
                .add(Expr::expr(Func::lower(Expr::col(item::Column::Code))).like(pattern)),
        );
    }
    if let Some(category) = query.category.as_deref().filter(|s| !s.is_empty()) {
        cond = cond.add(
            Expr::expr(Func::lower(Expr::col(item::Column::Category)))
                .eq(category.to_lowercase()),
        );
    }

    cond
}

fn normalize_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_strings_become_null() {
        assert_eq!(normalize_blank(Some("   ".into())), None);
        assert_eq!(normalize_blank(Some("".into())), None);
        assert_eq!(normalize_blank(None), None);
        assert_eq!(normalize_blank(Some(" usb ".into())), Some("usb".into()));
    }
}
