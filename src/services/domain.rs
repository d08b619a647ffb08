//! Domain slug service: normalization, availability probe, de-duplication.
//!
//! DESIGN
//! ======
//! A site's `domain` is a URL-safe slug: lowercase ASCII letters, digits and
//! single hyphens, never starting or ending with a hyphen, 3 to 63 chars.
//! Uniqueness is probed with a point lookup before writes; the
//! `faq_sites_domain_key` unique index is the final arbiter when two
//! requests race past the probe.
//!
//! De-duplication tries `base`, then `base1` … `base999`, then falls back to
//! `base-xxxxx` with a random token. Probing goes through [`DomainProbe`] so
//! the suffix walk is testable without Postgres.

use async_trait::async_trait;
use rand::Rng;
use sqlx::PgPool;
use uuid::Uuid;

pub const MIN_DOMAIN_LEN: usize = 3;
pub const MAX_DOMAIN_LEN: usize = 63;
const MAX_NUMERIC_SUFFIX: u32 = 999;
const RANDOM_SUFFIX_LEN: usize = 5;
const RANDOM_SUFFIX_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

const ADJECTIVES: [&str; 6] = ["cool", "awesome", "amazing", "brilliant", "clever", "dynamic"];
const NOUNS: [&str; 6] = ["faq", "help", "docs", "guide", "info", "support"];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    #[error("domain must be at least 3 characters")]
    TooShort,
    #[error("domain must be at most 63 characters")]
    TooLong,
    #[error("domain may only contain lowercase letters, digits and single hyphens")]
    Malformed,
}

// =============================================================================
// NORMALIZATION
// =============================================================================

/// Lowercase `input` and fold every run of non-`[a-z0-9]` chars into a single
/// hyphen, dropping hyphens at either end. No length limit is applied.
#[must_use]
pub fn normalize_domain(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.trim().to_lowercase().chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            out.push(c);
        } else if !out.is_empty() && !out.ends_with('-') {
            out.push('-');
        }
    }
    trim_trailing_hyphens(&mut out);
    out
}

/// Derive a domain slug from a site name, capped at [`MAX_DOMAIN_LEN`].
///
/// Idempotent: `generate_domain(&generate_domain(x)) == generate_domain(x)`.
#[must_use]
pub fn generate_domain(name: &str) -> String {
    let mut slug = normalize_domain(name);
    truncate_slug(&mut slug, MAX_DOMAIN_LEN);
    slug
}

/// Check that `domain` is already in normalized form and within length bounds.
///
/// # Errors
///
/// Returns the first rule the domain breaks.
pub fn validate_domain(domain: &str) -> Result<(), DomainError> {
    if domain.len() > MAX_DOMAIN_LEN {
        return Err(DomainError::TooLong);
    }
    if normalize_domain(domain) != domain {
        return Err(DomainError::Malformed);
    }
    if domain.len() < MIN_DOMAIN_LEN {
        return Err(DomainError::TooShort);
    }
    Ok(())
}

/// Slug to start de-duplication from for a site name. Names that yield fewer
/// than [`MIN_DOMAIN_LEN`] slug chars (e.g. non-Latin names) get a random
/// `adjective-noun-N` domain instead.
#[must_use]
pub fn base_domain_for(name: &str) -> String {
    let base = generate_domain(name);
    if base.len() < MIN_DOMAIN_LEN {
        return generate_random_domain();
    }
    base
}

/// Random `adjective-noun-N` domain, N in `0..1000`.
#[must_use]
pub fn generate_random_domain() -> String {
    let mut rng = rand::rng();
    let adjective = ADJECTIVES[rng.random_range(0..ADJECTIVES.len())];
    let noun = NOUNS[rng.random_range(0..NOUNS.len())];
    let number = rng.random_range(0..1000);
    format!("{adjective}-{noun}-{number}")
}

#[must_use]
pub(crate) fn random_suffix(len: usize) -> String {
    let mut rng = rand::rng();
    (0..len)
        .map(|_| RANDOM_SUFFIX_ALPHABET[rng.random_range(0..RANDOM_SUFFIX_ALPHABET.len())] as char)
        .collect()
}

fn truncate_slug(slug: &mut String, max_len: usize) {
    // Slugs are ASCII, so byte truncation never splits a char.
    slug.truncate(max_len);
    trim_trailing_hyphens(slug);
}

fn trim_trailing_hyphens(slug: &mut String) {
    while slug.ends_with('-') {
        slug.pop();
    }
}

// =============================================================================
// AVAILABILITY
// =============================================================================

/// Answers whether a domain slug is free to use.
#[async_trait]
pub trait DomainProbe: Send + Sync {
    async fn is_available(&self, domain: &str) -> Result<bool, sqlx::Error>;
}

/// Probe backed by `faq_sites`, optionally ignoring one site (the one being edited).
pub struct PgDomainProbe<'a> {
    pool: &'a PgPool,
    exclude_site: Option<Uuid>,
}

impl<'a> PgDomainProbe<'a> {
    #[must_use]
    pub fn new(pool: &'a PgPool, exclude_site: Option<Uuid>) -> Self {
        Self { pool, exclude_site }
    }
}

#[async_trait]
impl DomainProbe for PgDomainProbe<'_> {
    async fn is_available(&self, domain: &str) -> Result<bool, sqlx::Error> {
        is_domain_available(self.pool, domain, self.exclude_site).await
    }
}

/// Point lookup: true when no site (other than `exclude_site`) uses `domain`.
///
/// # Errors
///
/// Returns a database error if the query fails.
pub async fn is_domain_available(pool: &PgPool, domain: &str, exclude_site: Option<Uuid>) -> Result<bool, sqlx::Error> {
    let taken: bool = sqlx::query_scalar(
        "SELECT EXISTS (
             SELECT 1 FROM faq_sites
             WHERE domain = $1 AND ($2::uuid IS NULL OR id <> $2)
         )",
    )
    .bind(domain)
    .bind(exclude_site)
    .fetch_one(pool)
    .await?;
    Ok(!taken)
}

/// Walk `base`, `base1` … `base999`, then `base-xxxxx` until the probe accepts one.
///
/// The random fallback is not probed; the unique index catches the rare clash.
///
/// # Errors
///
/// Propagates probe failures.
pub async fn unique_domain(probe: &dyn DomainProbe, base: &str) -> Result<String, sqlx::Error> {
    if probe.is_available(base).await? {
        return Ok(base.to_owned());
    }

    let mut stem = base.to_owned();
    truncate_slug(&mut stem, MAX_DOMAIN_LEN - 3);
    for counter in 1..=MAX_NUMERIC_SUFFIX {
        let candidate = format!("{stem}{counter}");
        if probe.is_available(&candidate).await? {
            return Ok(candidate);
        }
    }

    let mut stem = base.to_owned();
    truncate_slug(&mut stem, MAX_DOMAIN_LEN - 1 - RANDOM_SUFFIX_LEN);
    Ok(format!("{stem}-{}", random_suffix(RANDOM_SUFFIX_LEN)))
}

/// Generate an unused domain for a site name.
///
/// # Errors
///
/// Returns a database error if an availability probe fails.
pub async fn generate_unique_domain(pool: &PgPool, name: &str) -> Result<String, sqlx::Error> {
    let base = base_domain_for(name);
    unique_domain(&PgDomainProbe::new(pool, None), &base).await
}

#[cfg(test)]
#[path = "domain_test.rs"]
mod tests;
