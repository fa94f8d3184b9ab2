use std::sync::Arc;

use tracing::{instrument, warn};

use crate::app::ports::{NoticeStore, StoredNotice};
use crate::error::Result;
use crate::metrics;
use crate::normalize::NoticeNormalizer;
use crate::parser::Notice;

/// Parse, normalize and store one notice at a time
pub struct NormalizeUseCase {
    normalizer: NoticeNormalizer,
    store: Arc<dyn NoticeStore>,
}

impl NormalizeUseCase {
    pub fn new(normalizer: NoticeNormalizer, store: Arc<dyn NoticeStore>) -> Self {
        Self { normalizer, store }
    }

    /// Failures are counted by error kind and returned; nothing is stored
    /// for a notice that fails any step
    #[instrument(skip(self, bytes), fields(bytes = bytes.len()))]
    pub async fn ingest(&self, bytes: &[u8]) -> Result<StoredNotice> {
        match self.try_ingest(bytes).await {
            Ok(stored) => Ok(stored),
            Err(e) => {
                metrics::notices::failed(e.kind());
                warn!(error = %e, kind = e.kind(), "notice rejected");
                Err(e)
            }
        }
    }

    async fn try_ingest(&self, bytes: &[u8]) -> Result<StoredNotice> {
        let notice = Notice::parse(bytes)?;
        let record = self.normalizer.normalize(&notice).await?;
        metrics::notices::normalized(record.network.as_str());

        let stored = self.store.insert(record).await?;
        metrics::notices::stored();
        Ok(stored)
    }
}
