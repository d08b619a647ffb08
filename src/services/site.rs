//! Site service: CRUD, ownership checks, domain assignment, theme writes.
//!
//! DESIGN
//! ======
//! Every mutating operation loads the site first and checks `user_id`
//! against the caller, mirroring how items and categories gate on
//! [`ensure_site_owner`].
//!
//! ERROR HANDLING
//! ==============
//! Domain availability is probed before writes, but the probe and the write
//! are not atomic. A `faq_sites_domain_key` violation at write time is
//! reported as [`SiteError::DomainTaken`]; for generated domains the insert is
//! retried with a fresh suffix a bounded number of times.

use serde::Serialize;
use serde_json::Value;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use time::OffsetDateTime;
use tracing::info;
use uuid::Uuid;

use crate::db::is_unique_violation;
use crate::services::domain::{self, DomainError};
use crate::services::theme::{self, SiteTheme, ThemeError};

const DOMAIN_CONSTRAINT: &str = "faq_sites_domain_key";
const MAX_GENERATED_INSERT_ATTEMPTS: usize = 3;
const SITE_COLUMNS: &str = "id, user_id, name, description, domain, theme, created_at, updated_at";

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum SiteError {
    #[error("site not found: {0}")]
    NotFound(Uuid),
    #[error("site {0} belongs to another user")]
    Forbidden(Uuid),
    #[error("site name must not be empty")]
    InvalidName,
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("domain already in use: {0}")]
    DomainTaken(String),
    #[error(transparent)]
    Theme(#[from] ThemeError),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Row returned from site queries.
#[derive(Debug, Clone, Serialize)]
pub struct SiteRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub domain: String,
    pub theme: Value,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl SiteRow {
    fn from_row(row: &PgRow) -> Self {
        Self {
            id: row.get("id"),
            user_id: row.get("user_id"),
            name: row.get("name"),
            description: row.get("description"),
            domain: row.get("domain"),
            theme: row.get("theme"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }
    }

    /// Stored theme overlaid onto the defaults.
    #[must_use]
    pub fn resolved_theme(&self) -> SiteTheme {
        SiteTheme::resolve(&self.theme)
    }
}

/// Input for [`create_site`].
#[derive(Debug, Clone, Default)]
pub struct NewSite {
    pub name: String,
    pub description: Option<String>,
    /// Requested domain; generated from `name` when absent or blank.
    pub domain: Option<String>,
}

/// Input for [`update_site`]. `None` leaves a field unchanged; an empty
/// description clears it.
#[derive(Debug, Clone, Default)]
pub struct SiteUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub domain: Option<String>,
}

fn clean_name(raw: &str) -> Result<String, SiteError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(SiteError::InvalidName);
    }
    Ok(name.to_owned())
}

fn clean_description(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim).filter(|d| !d.is_empty()).map(str::to_owned)
}

/// Normalize and validate a user-supplied domain.
///
/// # Errors
///
/// Returns the validation failure for malformed or out-of-range domains.
pub fn requested_domain(raw: &str) -> Result<String, DomainError> {
    let domain = domain::normalize_domain(raw);
    domain::validate_domain(&domain)?;
    Ok(domain)
}

// =============================================================================
// OWNERSHIP
// =============================================================================

/// Load a site by id regardless of owner.
///
/// # Errors
///
/// Returns a database error if the query fails.
pub async fn load_site(pool: &PgPool, site_id: Uuid) -> Result<Option<SiteRow>, sqlx::Error> {
    let row = sqlx::query(&format!("SELECT {SITE_COLUMNS} FROM faq_sites WHERE id = $1"))
        .bind(site_id)
        .fetch_optional(pool)
        .await?;
    Ok(row.as_ref().map(SiteRow::from_row))
}

/// Load a site and require that `user_id` owns it.
///
/// # Errors
///
/// Returns `NotFound` for a missing site and `Forbidden` for someone else's.
pub async fn owned_site(pool: &PgPool, site_id: Uuid, user_id: Uuid) -> Result<SiteRow, SiteError> {
    let site = load_site(pool, site_id)
        .await?
        .ok_or(SiteError::NotFound(site_id))?;
    if site.user_id != user_id {
        return Err(SiteError::Forbidden(site_id));
    }
    Ok(site)
}

/// Require that `user_id` owns `site_id` without loading the full row.
///
/// # Errors
///
/// Returns `NotFound` for a missing site and `Forbidden` for someone else's.
pub async fn ensure_site_owner(pool: &PgPool, site_id: Uuid, user_id: Uuid) -> Result<(), SiteError> {
    let owner: Option<Uuid> = sqlx::query_scalar("SELECT user_id FROM faq_sites WHERE id = $1")
        .bind(site_id)
        .fetch_optional(pool)
        .await?;
    match owner {
        None => Err(SiteError::NotFound(site_id)),
        Some(owner) if owner != user_id => Err(SiteError::Forbidden(site_id)),
        Some(_) => Ok(()),
    }
}

// =============================================================================
// CRUD
// =============================================================================

async fn insert_site(
    pool: &PgPool,
    owner_id: Uuid,
    name: &str,
    description: Option<&str>,
    domain: &str,
    theme: &Value,
) -> Result<SiteRow, sqlx::Error> {
    let row = sqlx::query(&format!(
        "INSERT INTO faq_sites (id, user_id, name, description, domain, theme)
         VALUES ($1, $2, $3, $4, $5, $6)
         RETURNING {SITE_COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(owner_id)
    .bind(name)
    .bind(description)
    .bind(domain)
    .bind(theme)
    .fetch_one(pool)
    .await?;
    Ok(SiteRow::from_row(&row))
}

/// Create a site with the default theme.
///
/// An explicit domain must be free; otherwise one is derived from the name.
///
/// # Errors
///
/// Returns validation errors, `DomainTaken`, or a database error.
pub async fn create_site(pool: &PgPool, owner_id: Uuid, input: NewSite) -> Result<SiteRow, SiteError> {
    let name = clean_name(&input.name)?;
    let description = clean_description(input.description.as_deref());
    let theme = SiteTheme::default_value();

    let requested = input
        .domain
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty());

    if let Some(raw) = requested {
        let domain = requested_domain(raw)?;
        if !domain::is_domain_available(pool, &domain, None).await? {
            return Err(SiteError::DomainTaken(domain));
        }
        return match insert_site(pool, owner_id, &name, description.as_deref(), &domain, &theme).await {
            Ok(site) => {
                info!(site_id = %site.id, domain = %site.domain, "site created");
                Ok(site)
            }
            Err(e) if is_unique_violation(&e, Some(DOMAIN_CONSTRAINT)) => Err(SiteError::DomainTaken(domain)),
            Err(e) => Err(e.into()),
        };
    }

    let mut domain = domain::generate_unique_domain(pool, &name).await?;
    let mut attempt = 1;
    loop {
        match insert_site(pool, owner_id, &name, description.as_deref(), &domain, &theme).await {
            Ok(site) => {
                info!(site_id = %site.id, domain = %site.domain, "site created");
                return Ok(site);
            }
            Err(e) if is_unique_violation(&e, Some(DOMAIN_CONSTRAINT)) => {
                if attempt >= MAX_GENERATED_INSERT_ATTEMPTS {
                    return Err(SiteError::DomainTaken(domain));
                }
                tracing::warn!(%domain, attempt, "generated domain taken concurrently; retrying");
                attempt += 1;
                domain = domain::generate_unique_domain(pool, &name).await?;
            }
            Err(e) => return Err(e.into()),
        }
    }
}

/// List the caller's sites, newest first.
///
/// # Errors
///
/// Returns a database error if the query fails.
pub async fn list_sites(pool: &PgPool, owner_id: Uuid) -> Result<Vec<SiteRow>, SiteError> {
    let rows = sqlx::query(&format!(
        "SELECT {SITE_COLUMNS} FROM faq_sites WHERE user_id = $1 ORDER BY created_at DESC"
    ))
    .bind(owner_id)
    .fetch_all(pool)
    .await?;
    Ok(rows.iter().map(SiteRow::from_row).collect())
}

/// Update name, description and/or domain.
///
/// # Errors
///
/// Returns ownership, validation, `DomainTaken`, or database errors.
pub async fn update_site(pool: &PgPool, owner_id: Uuid, site_id: Uuid, update: SiteUpdate) -> Result<SiteRow, SiteError> {
    let site = owned_site(pool, site_id, owner_id).await?;

    let name = match update.name.as_deref() {
        Some(raw) => clean_name(raw)?,
        None => site.name,
    };
    let description = match update.description.as_deref() {
        Some(raw) => clean_description(Some(raw)),
        None => site.description,
    };
    let domain = match update.domain.as_deref() {
        Some(raw) => {
            let domain = requested_domain(raw)?;
            if domain != site.domain && !domain::is_domain_available(pool, &domain, Some(site_id)).await? {
                return Err(SiteError::DomainTaken(domain));
            }
            domain
        }
        None => site.domain,
    };

    let result = sqlx::query(&format!(
        "UPDATE faq_sites
         SET name = $2, description = $3, domain = $4, updated_at = now()
         WHERE id = $1
         RETURNING {SITE_COLUMNS}"
    ))
    .bind(site_id)
    .bind(&name)
    .bind(&description)
    .bind(&domain)
    .fetch_optional(pool)
    .await;

    match result {
        Ok(Some(row)) => Ok(SiteRow::from_row(&row)),
        Ok(None) => Err(SiteError::NotFound(site_id)),
        Err(e) if is_unique_violation(&e, Some(DOMAIN_CONSTRAINT)) => Err(SiteError::DomainTaken(domain)),
        Err(e) => Err(e.into()),
    }
}

/// Delete a site; its items and categories go with it.
///
/// # Errors
///
/// Returns ownership or database errors.
pub async fn delete_site(pool: &PgPool, owner_id: Uuid, site_id: Uuid) -> Result<(), SiteError> {
    ensure_site_owner(pool, site_id, owner_id).await?;
    sqlx::query("DELETE FROM faq_sites WHERE id = $1")
        .bind(site_id)
        .execute(pool)
        .await?;
    info!(%site_id, "site deleted");
    Ok(())
}

async fn store_theme(pool: &PgPool, site_id: Uuid, theme: &Value) -> Result<SiteRow, SiteError> {
    let row = sqlx::query(&format!(
        "UPDATE faq_sites SET theme = $2, updated_at = now() WHERE id = $1 RETURNING {SITE_COLUMNS}"
    ))
    .bind(site_id)
    .bind(theme)
    .fetch_optional(pool)
    .await?
    .ok_or(SiteError::NotFound(site_id))?;
    Ok(SiteRow::from_row(&row))
}

/// Merge a partial theme into the site's stored theme.
///
/// # Errors
///
/// Returns ownership, theme validation, or database errors.
pub async fn update_theme(pool: &PgPool, owner_id: Uuid, site_id: Uuid, patch: &Value) -> Result<SiteRow, SiteError> {
    let site = owned_site(pool, site_id, owner_id).await?;
    let merged = theme::merge_theme(&site.theme, patch)?;
    store_theme(pool, site_id, &merged).await
}

/// Replace the site's theme with the defaults.
///
/// # Errors
///
/// Returns ownership or database errors.
pub async fn reset_theme(pool: &PgPool, owner_id: Uuid, site_id: Uuid) -> Result<SiteRow, SiteError> {
    ensure_site_owner(pool, site_id, owner_id).await?;
    store_theme(pool, site_id, &SiteTheme::default_value()).await
}

#[cfg(test)]
#[path = "site_test.rs"]
mod tests;
