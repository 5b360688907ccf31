//! Watch-later list with a swappable persistence port.
//!
//! Every mutation is a full load-modify-save round trip; the last writer wins. The list is
//! stored as one JSON array under [`STORAGE_KEY`], and anything that fails to parse reads
//! back as an empty list.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use redis::AsyncCommands;
use tokio::{io::AsyncWriteExt, sync::Mutex};

use crate::{
    error::{AppError, AppResult},
    models::{MediaItem, MediaKey},
};

/// Well-known key the list is stored under
pub const STORAGE_KEY: &str = "movoraWatchLater";

/// Raw persistence for the serialized list
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FavoritesStorage: Send + Sync {
    /// Returns the stored JSON, or `None` when nothing has been saved yet
    async fn load(&self) -> AppResult<Option<String>>;

    async fn save(&self, raw: &str) -> AppResult<()>;

    /// Short name for logs
    fn name(&self) -> &'static str;
}

/// Stores the list as a JSON file on local disk
///
/// Saves go to a sibling `.tmp` file that is then renamed over the list, so a save cut
/// short never leaves a truncated list behind.
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    async fn write_temp(&self, temp: &Path, raw: &str) -> std::io::Result<()> {
        let mut file = tokio::fs::File::create(temp).await?;
        file.write_all(raw.as_bytes()).await?;
        file.sync_all().await
    }
}

#[async_trait]
impl FavoritesStorage for JsonFileStorage {
    async fn load(&self) -> AppResult<Option<String>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Storage(format!(
                "Failed to read {}: {}",
                self.path.display(),
                e
            ))),
        }
    }

    async fn save(&self, raw: &str) -> AppResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::Storage(format!("Failed to create {}: {}", parent.display(), e)))?;
        }

        let temp = self.temp_path();
        self.write_temp(&temp, raw)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to write {}: {}", temp.display(), e)))?;

        tokio::fs::rename(&temp, &self.path)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to replace {}: {}", self.path.display(), e)))
    }

    fn name(&self) -> &'static str {
        "json_file"
    }
}

/// Stores the list as a plain string value in Redis, with no expiry
pub struct RedisStorage {
    client: redis::Client,
}

impl RedisStorage {
    pub fn new(client: redis::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl FavoritesStorage for RedisStorage {
    async fn load(&self) -> AppResult<Option<String>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let raw: Option<String> = conn.get(STORAGE_KEY).await?;
        Ok(raw)
    }

    async fn save(&self, raw: &str) -> AppResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let _: () = conn.set(STORAGE_KEY, raw).await?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}

/// In-process storage, used when nothing should outlive the process
#[derive(Default)]
pub struct MemoryStorage {
    raw: Mutex<Option<String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from an already-serialized list
    pub fn with_contents(raw: impl Into<String>) -> Self {
        Self {
            raw: Mutex::new(Some(raw.into())),
        }
    }
}

#[async_trait]
impl FavoritesStorage for MemoryStorage {
    async fn load(&self) -> AppResult<Option<String>> {
        Ok(self.raw.lock().await.clone())
    }

    async fn save(&self, raw: &str) -> AppResult<()> {
        *self.raw.lock().await = Some(raw.to_string());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

/// The watch-later list
///
/// Adding does not check for an existing `(id, kind)`, so the list may hold duplicates.
/// Removing drops every entry with the key.
pub struct FavoritesStore {
    storage: Box<dyn FavoritesStorage>,
}

impl FavoritesStore {
    pub fn new(storage: impl FavoritesStorage + 'static) -> Self {
        Self {
            storage: Box::new(storage),
        }
    }

    pub fn from_boxed(storage: Box<dyn FavoritesStorage>) -> Self {
        Self { storage }
    }

    /// Current list in insertion order
    pub async fn list(&self) -> AppResult<Vec<MediaItem>> {
        let Some(raw) = self.storage.load().await? else {
            return Ok(Vec::new());
        };

        match serde_json::from_str::<Vec<MediaItem>>(&raw) {
            Ok(items) => Ok(items),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    storage = self.storage.name(),
                    "Stored watch-later list is unreadable, treating it as empty"
                );
                Ok(Vec::new())
            }
        }
    }

    pub async fn contains(&self, key: MediaKey) -> AppResult<bool> {
        Ok(self.list().await?.iter().any(|item| item.key() == key))
    }

    /// Appends `item` and returns the new list
    pub async fn add(&self, item: MediaItem) -> AppResult<Vec<MediaItem>> {
        let mut items = self.list().await?;
        tracing::info!(key = %item.key(), storage = self.storage.name(), "Adding to watch later");
        items.push(item);
        self.persist(&items).await?;
        Ok(items)
    }

    /// Removes every entry matching `key`; returns whether anything was removed
    pub async fn remove(&self, key: MediaKey) -> AppResult<bool> {
        let mut items = self.list().await?;
        let before = items.len();
        items.retain(|item| item.key() != key);

        if items.len() == before {
            return Ok(false);
        }

        tracing::info!(key = %key, removed = before - items.len(), "Removed from watch later");
        self.persist(&items).await?;
        Ok(true)
    }

    async fn persist(&self, items: &[MediaItem]) -> AppResult<()> {
        let raw = serde_json::to_string(items)
            .map_err(|e| AppError::Internal(format!("Failed to serialize watch-later list: {}", e)))?;
        self.storage.save(&raw).await
    }
}
