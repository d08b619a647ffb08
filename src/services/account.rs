//! Account service: email/password sign-up and sign-in, profile rows.
//!
//! DESIGN
//! ======
//! `users` holds credentials; `profiles` holds display data keyed by the same
//! id. Sign-up writes them as two statements and tolerates a failed profile
//! insert, so every profile write elsewhere is an upsert.

use std::sync::LazyLock;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use serde::Serialize;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use time::OffsetDateTime;
use tracing::{info, warn};
use uuid::Uuid;

use crate::db::is_unique_violation;

pub const MIN_PASSWORD_LEN: usize = 6;
const EMAIL_CONSTRAINT: &str = "users_email_key";

#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error("invalid email")]
    InvalidEmail,
    #[error("password must be at least 6 characters")]
    WeakPassword,
    #[error("an account with this email already exists")]
    EmailTaken,
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("password hashing failed: {0}")]
    Hash(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[must_use]
pub fn normalize_email(email: &str) -> Option<String> {
    let normalized = email.trim().to_ascii_lowercase();
    let parts = normalized.split('@').collect::<Vec<_>>();
    if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
        return None;
    }
    Some(normalized)
}

/// # Errors
///
/// Returns `WeakPassword` when shorter than [`MIN_PASSWORD_LEN`] characters.
pub fn validate_password(password: &str) -> Result<(), AccountError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AccountError::WeakPassword);
    }
    Ok(())
}

fn clean_full_name(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim).filter(|n| !n.is_empty()).map(str::to_owned)
}

// =============================================================================
// PASSWORD HASHING
// =============================================================================

pub(crate) fn hash_password(password: &str) -> Result<String, AccountError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AccountError::Hash(e.to_string()))?;
    Ok(hash.to_string())
}

pub(crate) fn verify_password(password: &str, hash: &str) -> Result<bool, AccountError> {
    let parsed = PasswordHash::new(hash).map_err(|e| AccountError::Hash(e.to_string()))?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(AccountError::Hash(e.to_string())),
    }
}

/// Hash checked when the email is unknown, so misses cost the same as a wrong password.
static DUMMY_HASH: LazyLock<Option<String>> = LazyLock::new(|| hash_password("no-such-account").ok());

fn verify_dummy(password: &str) {
    if let Some(hash) = DUMMY_HASH.as_deref() {
        let _ = verify_password(password, hash);
    }
}

/// Argon2 is CPU-bound; keep it off the async workers.
async fn hash_blocking(password: String) -> Result<String, AccountError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AccountError::Hash(e.to_string()))?
}

async fn verify_blocking(password: String, hash: String) -> Result<bool, AccountError> {
    tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| AccountError::Hash(e.to_string()))?
}

async fn verify_dummy_blocking(password: String) {
    if let Err(e) = tokio::task::spawn_blocking(move || verify_dummy(&password)).await {
        warn!(error = %e, "dummy password verification task failed");
    }
}

// =============================================================================
// SIGN UP / SIGN IN
// =============================================================================

/// Create a user and its profile row, returning the new user id.
///
/// # Errors
///
/// Returns validation errors, `EmailTaken`, or database errors. A failed
/// profile insert is logged, not returned.
pub async fn sign_up(pool: &PgPool, email: &str, password: &str, full_name: Option<&str>) -> Result<Uuid, AccountError> {
    let email = normalize_email(email).ok_or(AccountError::InvalidEmail)?;
    validate_password(password)?;
    let password_hash = hash_blocking(password.to_owned()).await?;

    let inserted = sqlx::query_scalar("INSERT INTO users (email, password_hash) VALUES ($1, $2) RETURNING id")
        .bind(&email)
        .bind(&password_hash)
        .fetch_one(pool)
        .await;
    let user_id: Uuid = match inserted {
        Ok(id) => id,
        Err(e) if is_unique_violation(&e, Some(EMAIL_CONSTRAINT)) => return Err(AccountError::EmailTaken),
        Err(e) => return Err(e.into()),
    };

    let profile = sqlx::query("INSERT INTO profiles (id, email, full_name) VALUES ($1, $2, $3)")
        .bind(user_id)
        .bind(&email)
        .bind(clean_full_name(full_name))
        .execute(pool)
        .await;
    if let Err(e) = profile {
        warn!(%user_id, error = %e, "profile insert failed after sign-up");
    }

    info!(%user_id, "user signed up");
    Ok(user_id)
}

/// Check credentials, returning the user id.
///
/// # Errors
///
/// Returns `InvalidCredentials` for an unknown email or a wrong password.
pub async fn sign_in(pool: &PgPool, email: &str, password: &str) -> Result<Uuid, AccountError> {
    let email = normalize_email(email).ok_or(AccountError::InvalidCredentials)?;
    let row = sqlx::query("SELECT id, password_hash FROM users WHERE email = $1")
        .bind(&email)
        .fetch_optional(pool)
        .await?;
    let Some(row) = row else {
        verify_dummy_blocking(password.to_owned()).await;
        return Err(AccountError::InvalidCredentials);
    };

    let user_id: Uuid = row.get("id");
    let hash: String = row.get("password_hash");
    if !verify_blocking(password.to_owned(), hash).await? {
        return Err(AccountError::InvalidCredentials);
    }
    Ok(user_id)
}

// =============================================================================
// PROFILES
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct Profile {
    pub id: Uuid,
    pub email: String,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Profile {
    fn from_row(row: &PgRow) -> Self {
        Self {
            id: row.get("id"),
            email: row.get("email"),
            full_name: row.get("full_name"),
            avatar_url: row.get("avatar_url"),
            updated_at: row.get("updated_at"),
        }
    }
}

/// `None` leaves a field unchanged; an empty `full_name` clears it.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
}

/// Profile of a user; `None` if the row was never written.
///
/// # Errors
///
/// Returns a database error if the query fails.
pub async fn get_profile(pool: &PgPool, user_id: Uuid) -> Result<Option<Profile>, AccountError> {
    let row = sqlx::query("SELECT id, email, full_name, avatar_url, updated_at FROM profiles WHERE id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    Ok(row.as_ref().map(Profile::from_row))
}

/// Insert or update a profile row, creating it from the user's email if
/// it is missing.
///
/// # Errors
///
/// Returns a database error if the user does not exist or the write fails.
pub async fn upsert_profile(pool: &PgPool, user_id: Uuid, update: ProfileUpdate) -> Result<Profile, AccountError> {
    let set_name = update.full_name.is_some();
    let full_name = clean_full_name(update.full_name.as_deref());
    let set_avatar = update.avatar_url.is_some();
    let avatar_url = update.avatar_url.filter(|u| !u.trim().is_empty());

    let row = sqlx::query(
        r"INSERT INTO profiles (id, email, full_name, avatar_url)
          SELECT u.id, u.email, $3, $5 FROM users u WHERE u.id = $1
          ON CONFLICT (id) DO UPDATE SET
              full_name  = CASE WHEN $2 THEN EXCLUDED.full_name ELSE profiles.full_name END,
              avatar_url = CASE WHEN $4 THEN EXCLUDED.avatar_url ELSE profiles.avatar_url END,
              updated_at = now()
          RETURNING id, email, full_name, avatar_url, updated_at",
    )
    .bind(user_id)
    .bind(set_name)
    .bind(&full_name)
    .bind(set_avatar)
    .bind(&avatar_url)
    .fetch_one(pool)
    .await?;
    Ok(Profile::from_row(&row))
}

/// Set or clear the stored avatar URL.
///
/// # Errors
///
/// Returns a database error if the write fails.
pub async fn set_avatar_url(pool: &PgPool, user_id: Uuid, avatar_url: Option<&str>) -> Result<Profile, AccountError> {
    upsert_profile(
        pool,
        user_id,
        ProfileUpdate { full_name: None, avatar_url: Some(avatar_url.unwrap_or_default().to_owned()) },
    )
    .await
}

#[cfg(test)]
#[path = "account_test.rs"]
mod tests;
