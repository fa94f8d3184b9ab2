use std::path::Path;

use async_trait::async_trait;
use tempfile::NamedTempFile;
use uuid::Uuid;

use crate::error::Result;
use crate::normalize::NoticeRecord;

/// A downloaded sky map staged on local disk. The file is removed when this
/// value is dropped.
#[derive(Debug)]
pub struct StagedSkyMap {
    file: NamedTempFile,
    url: String,
    bytes: u64,
}

impl StagedSkyMap {
    pub fn new(url: impl Into<String>, file: NamedTempFile, bytes: u64) -> Self {
        Self {
            file,
            url: url.into(),
            bytes,
        }
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn bytes(&self) -> u64 {
        self.bytes
    }
}

// Ingest-side ports
#[async_trait]
pub trait SkyMapFetcher: Send + Sync {
    /// Download `url` into a staging file. Transport errors, non-success
    /// statuses and oversize payloads are `SkyMapUnavailable`.
    async fn fetch(&self, url: &str) -> Result<StagedSkyMap>;
}

/// Stored notice with its assigned revision
#[derive(Debug, Clone)]
pub struct StoredNotice {
    pub id: Uuid,
    pub record: NoticeRecord,
}

// Output ports
#[async_trait]
pub trait NoticeStore: Send + Sync {
    async fn insert(&self, record: NoticeRecord) -> Result<StoredNotice>;
    async fn get(&self, id: Uuid) -> Result<Option<StoredNotice>>;
}
