//! FAQ item service: CRUD, publish toggle, and manual ordering.
//!
//! DESIGN
//! ======
//! Items are always addressed through their site (`site_id` + `id`), and the
//! caller must own the site. `order_index` is the public display order; new
//! items are appended after the current maximum.

use std::collections::HashSet;

use serde::Serialize;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::services::site::{SiteError, ensure_site_owner};

const ITEM_COLUMNS: &str = "id, site_id, question, answer, category, order_index, is_published, created_at, updated_at";

#[derive(Debug, thiserror::Error)]
pub enum FaqError {
    #[error(transparent)]
    Site(#[from] SiteError),
    #[error("faq item not found: {0}")]
    NotFound(Uuid),
    #[error("question must not be empty")]
    EmptyQuestion,
    #[error("answer must not be empty")]
    EmptyAnswer,
    #[error("reorder list must name each item of the site exactly once")]
    InvalidOrder,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Clone, Serialize)]
pub struct FaqItem {
    pub id: Uuid,
    pub site_id: Uuid,
    pub question: String,
    pub answer: String,
    pub category: Option<String>,
    pub order_index: i32,
    pub is_published: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl FaqItem {
    pub(crate) fn from_row(row: &PgRow) -> Self {
        Self {
            id: row.get("id"),
            site_id: row.get("site_id"),
            question: row.get("question"),
            answer: row.get("answer"),
            category: row.get("category"),
            order_index: row.get("order_index"),
            is_published: row.get("is_published"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewFaqItem {
    pub question: String,
    pub answer: String,
    pub category: Option<String>,
    /// Defaults to published.
    pub is_published: Option<bool>,
}

/// `None` leaves a field unchanged; an empty category clears it.
#[derive(Debug, Clone, Default)]
pub struct FaqItemUpdate {
    pub question: Option<String>,
    pub answer: Option<String>,
    pub category: Option<String>,
    pub is_published: Option<bool>,
}

fn clean_text(raw: &str, empty: FaqError) -> Result<String, FaqError> {
    let text = raw.trim();
    if text.is_empty() {
        return Err(empty);
    }
    Ok(text.to_owned())
}

fn clean_category(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim).filter(|c| !c.is_empty()).map(str::to_owned)
}

/// Check that `ids` has no duplicates and names exactly `expected` items.
pub(crate) fn validate_order(ids: &[Uuid], expected: usize) -> Result<(), FaqError> {
    let unique = ids.iter().collect::<HashSet<_>>();
    if unique.len() != ids.len() || ids.len() != expected {
        return Err(FaqError::InvalidOrder);
    }
    Ok(())
}

// =============================================================================
// QUERIES
// =============================================================================

/// List every item of a site, in display order.
///
/// # Errors
///
/// Returns ownership or database errors.
pub async fn list_items(pool: &PgPool, owner_id: Uuid, site_id: Uuid) -> Result<Vec<FaqItem>, FaqError> {
    ensure_site_owner(pool, site_id, owner_id).await?;
    Ok(fetch_items(pool, site_id, false).await?)
}

/// Items of a site in display order, optionally only the published ones.
///
/// # Errors
///
/// Returns a database error if the query fails.
pub async fn fetch_items(pool: &PgPool, site_id: Uuid, published_only: bool) -> Result<Vec<FaqItem>, sqlx::Error> {
    let rows = sqlx::query(&format!(
        "SELECT {ITEM_COLUMNS} FROM faq_items
         WHERE site_id = $1 AND (NOT $2 OR is_published)
         ORDER BY order_index ASC, created_at ASC"
    ))
    .bind(site_id)
    .bind(published_only)
    .fetch_all(pool)
    .await?;
    Ok(rows.iter().map(FaqItem::from_row).collect())
}

// =============================================================================
// MUTATIONS
// =============================================================================

/// Append a new item to the end of the site's list.
///
/// # Errors
///
/// Returns ownership, validation, or database errors.
pub async fn create_item(pool: &PgPool, owner_id: Uuid, site_id: Uuid, input: NewFaqItem) -> Result<FaqItem, FaqError> {
    ensure_site_owner(pool, site_id, owner_id).await?;
    let question = clean_text(&input.question, FaqError::EmptyQuestion)?;
    let answer = clean_text(&input.answer, FaqError::EmptyAnswer)?;
    let category = clean_category(input.category.as_deref());

    let row = sqlx::query(&format!(
        "INSERT INTO faq_items (id, site_id, question, answer, category, order_index, is_published)
         SELECT $1, $2, $3, $4, $5, COALESCE(MAX(order_index) + 1, 0), $6
         FROM faq_items WHERE site_id = $2
         RETURNING {ITEM_COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(site_id)
    .bind(&question)
    .bind(&answer)
    .bind(&category)
    .bind(input.is_published.unwrap_or(true))
    .fetch_one(pool)
    .await?;
    Ok(FaqItem::from_row(&row))
}

async fn load_item(pool: &PgPool, site_id: Uuid, item_id: Uuid) -> Result<FaqItem, FaqError> {
    let row = sqlx::query(&format!("SELECT {ITEM_COLUMNS} FROM faq_items WHERE id = $1 AND site_id = $2"))
        .bind(item_id)
        .bind(site_id)
        .fetch_optional(pool)
        .await?
        .ok_or(FaqError::NotFound(item_id))?;
    Ok(FaqItem::from_row(&row))
}

/// Edit an item's text, category, or visibility.
///
/// # Errors
///
/// Returns ownership, not-found, validation, or database errors.
pub async fn update_item(
    pool: &PgPool,
    owner_id: Uuid,
    site_id: Uuid,
    item_id: Uuid,
    update: FaqItemUpdate,
) -> Result<FaqItem, FaqError> {
    ensure_site_owner(pool, site_id, owner_id).await?;
    let item = load_item(pool, site_id, item_id).await?;

    let question = match update.question.as_deref() {
        Some(raw) => clean_text(raw, FaqError::EmptyQuestion)?,
        None => item.question,
    };
    let answer = match update.answer.as_deref() {
        Some(raw) => clean_text(raw, FaqError::EmptyAnswer)?,
        None => item.answer,
    };
    let category = match update.category.as_deref() {
        Some(raw) => clean_category(Some(raw)),
        None => item.category,
    };
    let is_published = update.is_published.unwrap_or(item.is_published);

    let row = sqlx::query(&format!(
        "UPDATE faq_items
         SET question = $3, answer = $4, category = $5, is_published = $6, updated_at = now()
         WHERE id = $1 AND site_id = $2
         RETURNING {ITEM_COLUMNS}"
    ))
    .bind(item_id)
    .bind(site_id)
    .bind(&question)
    .bind(&answer)
    .bind(&category)
    .bind(is_published)
    .fetch_optional(pool)
    .await?
    .ok_or(FaqError::NotFound(item_id))?;
    Ok(FaqItem::from_row(&row))
}

/// Flip an item between published and draft.
///
/// # Errors
///
/// Returns ownership, not-found, or database errors.
pub async fn toggle_published(pool: &PgPool, owner_id: Uuid, site_id: Uuid, item_id: Uuid) -> Result<FaqItem, FaqError> {
    ensure_site_owner(pool, site_id, owner_id).await?;
    let row = sqlx::query(&format!(
        "UPDATE faq_items
         SET is_published = NOT is_published, updated_at = now()
         WHERE id = $1 AND site_id = $2
         RETURNING {ITEM_COLUMNS}"
    ))
    .bind(item_id)
    .bind(site_id)
    .fetch_optional(pool)
    .await?
    .ok_or(FaqError::NotFound(item_id))?;
    Ok(FaqItem::from_row(&row))
}

/// Rewrite `order_index` so items appear in the order of `ids`.
///
/// `ids` must list every item of the site exactly once.
///
/// # Errors
///
/// Returns ownership, `InvalidOrder`, or database errors.
pub async fn reorder_items(pool: &PgPool, owner_id: Uuid, site_id: Uuid, ids: &[Uuid]) -> Result<Vec<FaqItem>, FaqError> {
    ensure_site_owner(pool, site_id, owner_id).await?;

    let mut tx = pool.begin().await?;
    let existing: Vec<Uuid> = sqlx::query_scalar("SELECT id FROM faq_items WHERE site_id = $1 FOR UPDATE")
        .bind(site_id)
        .fetch_all(&mut *tx)
        .await?;
    validate_order(ids, existing.len())?;
    let existing = existing.into_iter().collect::<HashSet<_>>();
    if !ids.iter().all(|id| existing.contains(id)) {
        return Err(FaqError::InvalidOrder);
    }

    for (index, id) in ids.iter().enumerate() {
        let index = i32::try_from(index).map_err(|_| FaqError::InvalidOrder)?;
        sqlx::query("UPDATE faq_items SET order_index = $3, updated_at = now() WHERE id = $1 AND site_id = $2")
            .bind(id)
            .bind(site_id)
            .bind(index)
            .execute(&mut *tx)
            .await?;
    }
    tx.commit().await?;

    Ok(fetch_items(pool, site_id, false).await?)
}

/// Delete one item.
///
/// # Errors
///
/// Returns ownership, not-found, or database errors.
pub async fn delete_item(pool: &PgPool, owner_id: Uuid, site_id: Uuid, item_id: Uuid) -> Result<(), FaqError> {
    ensure_site_owner(pool, site_id, owner_id).await?;
    let result = sqlx::query("DELETE FROM faq_items WHERE id = $1 AND site_id = $2")
        .bind(item_id)
        .bind(site_id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(FaqError::NotFound(item_id));
    }
    Ok(())
}

#[cfg(test)]
#[path = "faq_test.rs"]
mod tests;
