use async_trait::async_trait;
use reqwest::header::CONTENT_LENGTH;
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::app::ports::{SkyMapFetcher, StagedSkyMap};
use crate::config::SkyMapConfig;
use crate::error::{NoticeError, Result};

/// Downloads sky maps over HTTP into a staging file
pub struct ReqwestSkyMapFetcher {
    client: reqwest::Client,
    config: SkyMapConfig,
}

impl ReqwestSkyMapFetcher {
    pub fn new(config: SkyMapConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .connect_timeout(config.connect_timeout())
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| NoticeError::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }

    fn staging_file(&self) -> Result<NamedTempFile> {
        let builder = {
            let mut b = tempfile::Builder::new();
            b.prefix("skymap_").suffix(".fits");
            b
        };
        let file = match &self.config.staging_dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        Ok(file)
    }
}

#[async_trait]
impl SkyMapFetcher for ReqwestSkyMapFetcher {
    async fn fetch(&self, url: &str) -> Result<StagedSkyMap> {
        let unavailable = |reason: String| NoticeError::SkyMapUnavailable(format!("{}: {}", url, reason));

        let mut resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| unavailable(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            warn!(url, status = status.as_u16(), "sky map request failed");
            return Err(unavailable(format!("HTTP status {}", status)));
        }

        let declared: Option<u64> = resp
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse().ok());
        if let Some(len) = declared.filter(|&len| len > self.config.max_bytes) {
            return Err(unavailable(format!(
                "payload of {} bytes exceeds limit of {}",
                len, self.config.max_bytes
            )));
        }

        let file = self.staging_file()?;
        let mut out = tokio::fs::File::from_std(file.as_file().try_clone()?);
        let mut written: u64 = 0;
        while let Some(chunk) = resp.chunk().await.map_err(|e| unavailable(e.to_string()))? {
            written += chunk.len() as u64;
            if written > self.config.max_bytes {
                return Err(unavailable(format!(
                    "payload exceeds limit of {} bytes",
                    self.config.max_bytes
                )));
            }
            out.write_all(&chunk).await?;
        }
        out.flush().await?;

        debug!(url, bytes = written, path = %file.path().display(), "sky map downloaded");
        Ok(StagedSkyMap::new(url, file, written))
    }
}
