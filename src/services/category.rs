//! Site category service.
//!
//! Categories are a per-site label list. Items store their category as a
//! plain string, so deleting a label leaves items untouched; renaming
//! rewrites matching items in the same transaction.

use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::db::is_unique_violation;
use crate::services::site::{SiteError, ensure_site_owner};

#[derive(Debug, thiserror::Error)]
pub enum CategoryError {
    #[error(transparent)]
    Site(#[from] SiteError),
    #[error("category name must not be empty")]
    EmptyName,
    #[error("category already exists: {0}")]
    Duplicate(String),
    #[error("category not found: {0}")]
    NotFound(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

fn clean_name(raw: &str) -> Result<String, CategoryError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(CategoryError::EmptyName);
    }
    Ok(name.to_owned())
}

/// Category names of a site, alphabetical.
///
/// # Errors
///
/// Returns ownership or database errors.
pub async fn list_categories(pool: &PgPool, owner_id: Uuid, site_id: Uuid) -> Result<Vec<String>, CategoryError> {
    ensure_site_owner(pool, site_id, owner_id).await?;
    let names = sqlx::query_scalar("SELECT name FROM site_categories WHERE site_id = $1 ORDER BY name ASC")
        .bind(site_id)
        .fetch_all(pool)
        .await?;
    Ok(names)
}

/// Add a category label.
///
/// # Errors
///
/// Returns ownership, `EmptyName`, `Duplicate`, or database errors.
pub async fn add_category(pool: &PgPool, owner_id: Uuid, site_id: Uuid, name: &str) -> Result<String, CategoryError> {
    ensure_site_owner(pool, site_id, owner_id).await?;
    let name = clean_name(name)?;

    let result = sqlx::query("INSERT INTO site_categories (site_id, name) VALUES ($1, $2)")
        .bind(site_id)
        .bind(&name)
        .execute(pool)
        .await;
    match result {
        Ok(_) => Ok(name),
        Err(e) if is_unique_violation(&e, None) => Err(CategoryError::Duplicate(name)),
        Err(e) => Err(e.into()),
    }
}

/// Rename a category and every item filed under it. Returns how many items
/// were re-filed.
///
/// # Errors
///
/// Returns ownership, `EmptyName`, `Duplicate`, `NotFound`, or database errors.
pub async fn rename_category(
    pool: &PgPool,
    owner_id: Uuid,
    site_id: Uuid,
    old_name: &str,
    new_name: &str,
) -> Result<u64, CategoryError> {
    ensure_site_owner(pool, site_id, owner_id).await?;
    let new_name = clean_name(new_name)?;
    if new_name == old_name {
        return Err(CategoryError::Duplicate(new_name));
    }

    let mut tx = pool.begin().await?;
    let renamed = sqlx::query("UPDATE site_categories SET name = $3 WHERE site_id = $1 AND name = $2")
        .bind(site_id)
        .bind(old_name)
        .bind(&new_name)
        .execute(&mut *tx)
        .await;
    match renamed {
        Ok(result) if result.rows_affected() == 0 => return Err(CategoryError::NotFound(old_name.to_owned())),
        Ok(_) => {}
        Err(e) if is_unique_violation(&e, None) => return Err(CategoryError::Duplicate(new_name)),
        Err(e) => return Err(e.into()),
    }

    let items = sqlx::query(
        "UPDATE faq_items SET category = $3, updated_at = now() WHERE site_id = $1 AND category = $2",
    )
    .bind(site_id)
    .bind(old_name)
    .bind(&new_name)
    .execute(&mut *tx)
    .await?
    .rows_affected();
    tx.commit().await?;

    info!(%site_id, from = old_name, to = %new_name, items, "category renamed");
    Ok(items)
}

/// Remove a category label. Items keep their `category` string.
///
/// # Errors
///
/// Returns ownership, `NotFound`, or database errors.
pub async fn delete_category(pool: &PgPool, owner_id: Uuid, site_id: Uuid, name: &str) -> Result<(), CategoryError> {
    ensure_site_owner(pool, site_id, owner_id).await?;
    let result = sqlx::query("DELETE FROM site_categories WHERE site_id = $1 AND name = $2")
        .bind(site_id)
        .bind(name)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(CategoryError::NotFound(name.to_owned()));
    }
    Ok(())
}

#[cfg(test)]
#[path = "category_test.rs"]
mod tests;
