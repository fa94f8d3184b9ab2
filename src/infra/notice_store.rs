use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing::debug;
use uuid::Uuid;

use crate::app::ports::{NoticeStore, StoredNotice};
use crate::error::Result;
use crate::normalize::{AlertKey, NoticeRecord};

/// In-memory notice store that tracks revisions per science alert
#[derive(Default)]
pub struct InMemoryNoticeStore {
    notices: Arc<Mutex<HashMap<Uuid, NoticeRecord>>>,
    alerts: Arc<Mutex<HashMap<AlertKey, Vec<Uuid>>>>,
}

impl InMemoryNoticeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every stored revision of an alert, oldest first
    pub fn revisions(&self, key: &AlertKey) -> Vec<StoredNotice> {
        let alerts = lock(&self.alerts);
        let notices = lock(&self.notices);
        alerts
            .get(key)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| {
                        notices.get(id).map(|record| StoredNotice {
                            id: *id,
                            record: record.clone(),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        lock(&self.notices).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// A poisoned lock only means another insert panicked; the maps stay usable
fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl NoticeStore for InMemoryNoticeStore {
    async fn insert(&self, mut record: NoticeRecord) -> Result<StoredNotice> {
        let id = Uuid::new_v4();
        let key = record.alert_key();

        let mut alerts = lock(&self.alerts);
        let mut notices = lock(&self.notices);
        let revisions = alerts.entry(key.clone()).or_default();

        for previous in revisions.iter() {
            if let Some(earlier) = notices.get_mut(previous) {
                earlier.revision.is_latest = false;
            }
        }
        record.revision.sequence_number = revisions.len() as u32;
        record.revision.is_latest = true;
        revisions.push(id);
        notices.insert(id, record.clone());

        debug!(
            %id,
            instrument_id = key.instrument_id,
            trigger_id = %key.trigger_id,
            sequence_number = record.revision.sequence_number,
            "stored notice"
        );
        Ok(StoredNotice { id, record })
    }

    async fn get(&self, id: Uuid) -> Result<Option<StoredNotice>> {
        Ok(lock(&self.notices)
            .get(&id)
            .map(|record| StoredNotice { id, record: record.clone() }))
    }
}
