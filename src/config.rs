//! Service configuration parsed from environment variables.
//!
//! `main` loads `.env` (if present) before calling [`Config::from_env`], so
//! every knob can live in either place.

use std::path::PathBuf;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_SESSION_TTL_DAYS: i64 = 30;
/// Upper bound on `SESSION_TTL_DAYS`; keeps cookie ages and SQL intervals in range.
pub const MAX_SESSION_TTL_DAYS: i64 = 3650;
pub const DEFAULT_STORAGE_DIR: &str = "./storage";
pub const DEFAULT_PROFILE_IMAGE_BUCKET: &str = "profile-images";
pub const DEFAULT_MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required env var {0}")]
    Missing(&'static str),
    #[error("invalid value for {var}: {value:?}")]
    Invalid { var: &'static str, value: String },
}

/// Where profile images are kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    /// Files on local disk, served by this process under `/storage`.
    Local { root: PathBuf },
    /// Hosted storage REST API addressed with a service key.
    Hosted { url: String, service_key: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub db_max_connections: u32,
    /// Explicit `COOKIE_SECURE`; inferred from `PUBLIC_BASE_URL` when unset.
    pub cookie_secure: bool,
    pub session_ttl_days: i64,
    /// Absolute origin used to build public URLs, without a trailing slash.
    pub public_base_url: String,
    pub storage: StorageBackend,
    pub profile_image_bucket: String,
    pub max_image_bytes: usize,
}

impl Config {
    /// Build the typed config from the process environment.
    ///
    /// Required:
    /// - `DATABASE_URL`
    ///
    /// Optional:
    /// - `PORT` (3000), `DB_MAX_CONNECTIONS` (5, at least 1), `SESSION_TTL_DAYS` (30, 1..=3650)
    /// - `PUBLIC_BASE_URL` (`http://localhost:{PORT}`)
    /// - `COOKIE_SECURE` (true when `PUBLIC_BASE_URL` is https)
    /// - `STORAGE_BACKEND`: `local` (default) or `hosted`
    /// - `STORAGE_DIR` for `local`; `STORAGE_URL` + `STORAGE_SERVICE_KEY` for `hosted`
    /// - `PROFILE_IMAGE_BUCKET` (`profile-images`), `MAX_IMAGE_BYTES` (5 MiB)
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or a value does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Same as [`Config::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let port = parse_or(&lookup, "PORT", DEFAULT_PORT)?;
        let db_max_connections = parse_or(&lookup, "DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS)?;
        if db_max_connections == 0 {
            return Err(ConfigError::Invalid { var: "DB_MAX_CONNECTIONS", value: "0".into() });
        }
        let session_ttl_days = parse_or(&lookup, "SESSION_TTL_DAYS", DEFAULT_SESSION_TTL_DAYS)?;
        if !(1..=MAX_SESSION_TTL_DAYS).contains(&session_ttl_days) {
            return Err(ConfigError::Invalid { var: "SESSION_TTL_DAYS", value: session_ttl_days.to_string() });
        }

        let public_base_url = lookup("PUBLIC_BASE_URL")
            .unwrap_or_else(|| format!("http://localhost:{port}"))
            .trim_end_matches('/')
            .to_owned();

        let cookie_secure = match lookup("COOKIE_SECURE") {
            Some(raw) => parse_bool(&raw).ok_or(ConfigError::Invalid { var: "COOKIE_SECURE", value: raw })?,
            None => public_base_url.starts_with("https://"),
        };

        let storage = match lookup("STORAGE_BACKEND").as_deref().map(str::trim) {
            None | Some("" | "local") => StorageBackend::Local {
                root: PathBuf::from(lookup("STORAGE_DIR").unwrap_or_else(|| DEFAULT_STORAGE_DIR.to_owned())),
            },
            Some("hosted") => StorageBackend::Hosted {
                url: lookup("STORAGE_URL")
                    .ok_or(ConfigError::Missing("STORAGE_URL"))?
                    .trim_end_matches('/')
                    .to_owned(),
                service_key: lookup("STORAGE_SERVICE_KEY").ok_or(ConfigError::Missing("STORAGE_SERVICE_KEY"))?,
            },
            Some(other) => {
                return Err(ConfigError::Invalid { var: "STORAGE_BACKEND", value: other.to_owned() });
            }
        };

        let profile_image_bucket =
            lookup("PROFILE_IMAGE_BUCKET").unwrap_or_else(|| DEFAULT_PROFILE_IMAGE_BUCKET.to_owned());
        let max_image_bytes = parse_or(&lookup, "MAX_IMAGE_BYTES", DEFAULT_MAX_IMAGE_BYTES)?;

        Ok(Self {
            database_url,
            port,
            db_max_connections,
            cookie_secure,
            session_ttl_days,
            public_base_url,
            storage,
            profile_image_bucket,
            max_image_bytes,
        })
    }
}

pub(crate) fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_or<F, T>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(var) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::Invalid { var, value: raw }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
