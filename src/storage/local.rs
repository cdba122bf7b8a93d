//! Local filesystem storage implementation.
//!
//! Both stores are a single pretty-printed JSON file written atomically
//! (temp file, then rename). A missing file is a valid initial state.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::{Listing, ListingSnapshot};
use crate::storage::{ListingStore, SubscriberMap, SubscriberStore};

/// A JSON document on disk.
#[derive(Debug, Clone)]
struct JsonFile {
    path: PathBuf,
}

impl JsonFile {
    fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn error(&self, e: impl std::fmt::Display) -> AppError {
        AppError::store(self.path.display(), e)
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.error(e))?;
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, bytes: &[u8]) -> Result<()> {
        self.ensure_dir().await?;

        let tmp = self.path.with_extension("tmp");
        let write = async {
            let mut file = tokio::fs::File::create(&tmp).await?;
            file.write_all(bytes).await?;
            file.flush().await?;
            file.sync_all().await?;
            drop(file);
            tokio::fs::rename(&tmp, &self.path).await
        };
        write.await.map_err(|e| self.error(e))
    }

    /// Write JSON data.
    async fn write_json<T: Serialize + ?Sized>(&self, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(value).map_err(|e| self.error(e))?;
        self.write_bytes(&bytes).await
    }

    /// Read bytes, returning None if file doesn't exist.
    async fn read_bytes(&self) -> Result<Option<Vec<u8>>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(self.error(e)),
        }
    }

    /// Read JSON data.
    async fn read_json<T: DeserializeOwned>(&self) -> Result<Option<T>> {
        match self.read_bytes().await? {
            Some(bytes) => Ok(Some(
                serde_json::from_slice(&bytes).map_err(|e| self.error(e))?,
            )),
            None => Ok(None),
        }
    }
}

/// Listing snapshot kept in a JSON array file.
#[derive(Debug, Clone)]
pub struct JsonListingStore {
    file: JsonFile,
}

impl JsonListingStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            file: JsonFile::new(path),
        }
    }

    pub fn path(&self) -> &Path {
        &self.file.path
    }
}

#[async_trait]
impl ListingStore for JsonListingStore {
    async fn load(&self) -> Result<Option<ListingSnapshot>> {
        let listings: Option<Vec<Listing>> = self.file.read_json().await?;
        Ok(listings.map(|l| l.into_iter().collect()))
    }

    async fn save(&self, listings: &[Listing]) -> Result<()> {
        self.file.write_json(listings).await?;
        log::debug!(
            "Snapshot: {} listings written to {}",
            listings.len(),
            self.file.path.display()
        );
        Ok(())
    }
}

/// Subscriber set kept in a JSON object file keyed by chat id.
#[derive(Debug, Clone)]
pub struct JsonSubscriberStore {
    file: JsonFile,
}

impl JsonSubscriberStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            file: JsonFile::new(path),
        }
    }

    pub fn path(&self) -> &Path {
        &self.file.path
    }
}

#[async_trait]
impl SubscriberStore for JsonSubscriberStore {
    async fn load(&self) -> Result<SubscriberMap> {
        Ok(self.file.read_json().await?.unwrap_or_default())
    }

    async fn save(&self, subscribers: &SubscriberMap) -> Result<()> {
        self.file.write_json(subscribers).await
    }
}
