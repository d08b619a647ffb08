//! Profile image storage.
//!
//! ARCHITECTURE
//! ============
//! Objects live behind the [`ObjectStore`] trait so handlers never care
//! where bytes end up:
//!
//! - [`LocalStore`] writes under a directory this process also serves at
//!   `/storage/{bucket}/{key}`.
//! - [`HostedStore`] talks to a hosted storage REST API with a service key.
//!
//! Keys are always `{user_id}/{random}.{ext}`. Deletion re-derives the key
//! from the stored public URL and refuses keys outside the caller's prefix.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::{Config, StorageBackend};
use crate::services::account::{self, AccountError, Profile};

const FALLBACK_EXTENSION: &str = "bin";
const MAX_EXTENSION_LEN: usize = 10;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("file is larger than {limit} bytes")]
    TooLarge { limit: usize },
    #[error("file must be an image, got {0:?}")]
    NotAnImage(String),
    #[error("file is empty")]
    Empty,
    #[error("object key {0:?} is not owned by this user")]
    ForeignObject(String),
    #[error("invalid object key {0:?}")]
    InvalidKey(String),
    #[error("storage backend error: {0}")]
    Backend(String),
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Account(#[from] AccountError),
}

// =============================================================================
// VALIDATION + KEYS
// =============================================================================

/// Reject empty, oversized, or non-image uploads before they reach a store.
///
/// # Errors
///
/// Returns `Empty`, `TooLarge`, or `NotAnImage`.
pub fn validate_image(content_type: &str, size: usize, max_bytes: usize) -> Result<(), StorageError> {
    if size == 0 {
        return Err(StorageError::Empty);
    }
    if size > max_bytes {
        return Err(StorageError::TooLarge { limit: max_bytes });
    }
    if !content_type.trim().to_ascii_lowercase().starts_with("image/") {
        return Err(StorageError::NotAnImage(content_type.to_owned()));
    }
    Ok(())
}

fn extension_from_filename(filename: &str) -> Option<String> {
    let (_, ext) = filename.rsplit_once('.')?;
    let ext = ext.to_ascii_lowercase();
    let valid = !ext.is_empty() && ext.len() <= MAX_EXTENSION_LEN && ext.chars().all(|c| c.is_ascii_alphanumeric());
    valid.then_some(ext)
}

fn extension_from_content_type(content_type: &str) -> Option<&'static str> {
    let ext = match content_type.trim().to_ascii_lowercase().as_str() {
        "image/png" => "png",
        "image/jpeg" | "image/jpg" => "jpg",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "image/avif" => "avif",
        "image/svg+xml" => "svg",
        _ => return None,
    };
    Some(ext)
}

/// Object key for a new upload: `{user_id}/{random}.{ext}`.
#[must_use]
pub fn object_key(user_id: Uuid, filename: Option<&str>, content_type: &str) -> String {
    let ext = filename
        .and_then(extension_from_filename)
        .or_else(|| extension_from_content_type(content_type).map(str::to_owned))
        .unwrap_or_else(|| FALLBACK_EXTENSION.to_owned());
    format!("{user_id}/{}.{ext}", Uuid::new_v4().simple())
}

/// Key of an object the given user may delete, or `ForeignObject`.
fn owned_key(user_id: Uuid, key: String) -> Result<String, StorageError> {
    let prefix = format!("{user_id}/");
    match key.strip_prefix(&prefix) {
        Some(rest) if !rest.is_empty() && !rest.contains('/') => Ok(key),
        _ => Err(StorageError::ForeignObject(key)),
    }
}

// =============================================================================
// OBJECT STORE
// =============================================================================

#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put(&self, bucket: &str, key: &str, body: Vec<u8>, content_type: &str) -> Result<(), StorageError>;

    /// Delete objects; missing objects are not an error.
    async fn delete(&self, bucket: &str, keys: &[String]) -> Result<(), StorageError>;

    fn public_url(&self, bucket: &str, key: &str) -> String;

    /// Inverse of [`ObjectStore::public_url`]; `None` for URLs this store did not issue.
    fn key_from_url(&self, bucket: &str, url: &str) -> Option<String> {
        let prefix = self.public_url(bucket, "");
        url.strip_prefix(&prefix).filter(|key| !key.is_empty()).map(str::to_owned)
    }
}

/// Build the store selected by `STORAGE_BACKEND`.
#[must_use]
pub fn store_from_config(config: &Config) -> Arc<dyn ObjectStore> {
    match &config.storage {
        StorageBackend::Local { root } => Arc::new(LocalStore::new(root.clone(), &config.public_base_url)),
        StorageBackend::Hosted { url, service_key } => Arc::new(HostedStore::new(url, service_key)),
    }
}

// -----------------------------------------------------------------------------
// local disk
// -----------------------------------------------------------------------------

pub struct LocalStore {
    root: PathBuf,
    base_url: String,
}

impl LocalStore {
    #[must_use]
    pub fn new(root: PathBuf, public_base_url: &str) -> Self {
        Self { root, base_url: public_base_url.trim_end_matches('/').to_owned() }
    }

    fn path_for(&self, bucket: &str, key: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(bucket).join(key);
        let safe = relative.components().all(|c| matches!(c, Component::Normal(_)));
        if !safe || key.is_empty() {
            return Err(StorageError::InvalidKey(key.to_owned()));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ObjectStore for LocalStore {
    async fn put(&self, bucket: &str, key: &str, body: Vec<u8>, _content_type: &str) -> Result<(), StorageError> {
        let path = self.path_for(bucket, key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, body).await?;
        Ok(())
    }

    async fn delete(&self, bucket: &str, keys: &[String]) -> Result<(), StorageError> {
        for key in keys {
            let path = self.path_for(bucket, key)?;
            match tokio::fs::remove_file(&path).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    fn public_url(&self, bucket: &str, key: &str) -> String {
        format!("{}/storage/{bucket}/{key}", self.base_url)
    }
}

// -----------------------------------------------------------------------------
// hosted REST API
// -----------------------------------------------------------------------------

pub struct HostedStore {
    client: reqwest::Client,
    url: String,
    service_key: String,
}

impl HostedStore {
    #[must_use]
    pub fn new(url: &str, service_key: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.trim_end_matches('/').to_owned(),
            service_key: service_key.to_owned(),
        }
    }

    async fn check(resp: reqwest::Response) -> Result<(), StorageError> {
        if resp.status().is_success() {
            return Ok(());
        }
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        Err(StorageError::Backend(format!("{status}: {body}")))
    }
}

#[async_trait]
impl ObjectStore for HostedStore {
    async fn put(&self, bucket: &str, key: &str, body: Vec<u8>, content_type: &str) -> Result<(), StorageError> {
        let resp = self
            .client
            .post(format!("{}/storage/v1/object/{bucket}/{key}", self.url))
            .bearer_auth(&self.service_key)
            .header("Content-Type", content_type)
            .header("x-upsert", "false")
            .body(body)
            .send()
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        Self::check(resp).await
    }

    async fn delete(&self, bucket: &str, keys: &[String]) -> Result<(), StorageError> {
        if keys.is_empty() {
            return Ok(());
        }
        let resp = self
            .client
            .delete(format!("{}/storage/v1/object/{bucket}", self.url))
            .bearer_auth(&self.service_key)
            .json(&serde_json::json!({ "prefixes": keys }))
            .send()
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        Self::check(resp).await
    }

    fn public_url(&self, bucket: &str, key: &str) -> String {
        format!("{}/storage/v1/object/public/{bucket}/{key}", self.url)
    }
}

// =============================================================================
// PROFILE IMAGES
// =============================================================================

/// An uploaded file as read from the multipart body.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub filename: Option<String>,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Store a new avatar, point the profile at it, then drop the old one.
///
/// # Errors
///
/// Returns validation, backend, or account errors. Failure to delete the
/// previous avatar is logged only.
pub async fn upload_profile_image(
    pool: &PgPool,
    store: &dyn ObjectStore,
    bucket: &str,
    max_bytes: usize,
    user_id: Uuid,
    upload: ImageUpload,
) -> Result<Profile, StorageError> {
    validate_image(&upload.content_type, upload.bytes.len(), max_bytes)?;

    let key = object_key(user_id, upload.filename.as_deref(), &upload.content_type);
    let size = upload.bytes.len();
    store.put(bucket, &key, upload.bytes, &upload.content_type).await?;
    let url = store.public_url(bucket, &key);

    let previous = account::get_profile(pool, user_id).await?.and_then(|p| p.avatar_url);
    let profile = account::set_avatar_url(pool, user_id, Some(&url)).await?;
    info!(%user_id, %key, size, "profile image stored");

    if let Some(old_key) = previous.and_then(|old| store.key_from_url(bucket, &old)) {
        match owned_key(user_id, old_key) {
            Ok(old_key) if old_key != key => {
                if let Err(e) = store.delete(bucket, &[old_key]).await {
                    warn!(%user_id, error = %e, "previous profile image delete failed");
                }
            }
            Ok(_) => {}
            Err(e) => warn!(%user_id, error = %e, "previous profile image left in place"),
        }
    }
    Ok(profile)
}

/// Remove the user's avatar object (when this store issued it) and clear
/// `avatar_url`.
///
/// # Errors
///
/// Returns `ForeignObject` when the stored URL points at another user's key,
/// or backend and account errors.
pub async fn delete_profile_image(
    pool: &PgPool,
    store: &dyn ObjectStore,
    bucket: &str,
    user_id: Uuid,
) -> Result<Profile, StorageError> {
    let current = account::get_profile(pool, user_id).await?.and_then(|p| p.avatar_url);
    if let Some(url) = current {
        match store.key_from_url(bucket, &url) {
            Some(key) => {
                let key = owned_key(user_id, key)?;
                store.delete(bucket, std::slice::from_ref(&key)).await?;
                info!(%user_id, %key, "profile image deleted");
            }
            None => debug!(%user_id, "avatar url not issued by this store; clearing only"),
        }
    }
    Ok(account::set_avatar_url(pool, user_id, None).await?)
}

#[cfg(test)]
#[path = "storage_test.rs"]
mod tests;
