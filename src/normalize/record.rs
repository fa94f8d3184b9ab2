use serde::{Deserialize, Serialize};

use crate::constants::{ROW_NONE_URL, ROW_ZERO};
use crate::error::Result;
use crate::normalize::classification::ClassificationAttributes;
use crate::types::{Contour, GalacticPosition, NetworkTag, TriggerId};

/// Revision-tracking fields; defaulted here and finalized by the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Revision {
    pub sequence_number: u32,
    pub is_latest: bool,
    pub observation_window_start: i64,
    pub observation_window_stop: i64,
}

impl Default for Revision {
    fn default() -> Self {
        Self {
            sequence_number: 0,
            is_latest: true,
            observation_window_start: 0,
            observation_window_stop: 0,
        }
    }
}

/// Canonical representation of one notice. Absent values are `None`; the
/// persistence sentinels only appear in [`NoticeRow`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoticeRecord {
    pub ivorn: String,
    pub network: NetworkTag,
    pub instrument_id: u32,
    pub network_id: u32,
    pub trigger_id: Option<TriggerId>,
    pub packet_type: Option<String>,
    /// Seconds since 2004-01-01T00:00:00Z
    pub observed_at: i64,
    pub galactic: Option<GalacticPosition>,
    pub position_error_deg: Option<f64>,
    pub contour: Option<Contour>,
    pub sky_map_url: Option<String>,
    pub classification: Option<ClassificationAttributes>,
    pub revision: Revision,
}

/// Key of the science alert a notice belongs to
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AlertKey {
    pub instrument_id: u32,
    pub network_id: u32,
    pub trigger_id: String,
}

impl NoticeRecord {
    pub fn alert_key(&self) -> AlertKey {
        AlertKey {
            instrument_id: self.instrument_id,
            network_id: self.network_id,
            trigger_id: self
                .trigger_id
                .as_ref()
                .map(|t| t.to_string())
                .unwrap_or_else(|| ROW_ZERO.to_string()),
        }
    }

    /// Flatten into the row shape the persistence layer stores
    pub fn to_row(&self) -> Result<NoticeRow> {
        let (l, b) = self.galactic.map(|g| (g.l, g.b)).unwrap_or((0.0, 0.0));
        let classification_attributes = match &self.classification {
            Some(attributes) => attributes.to_json()?,
            None => "{}".to_string(),
        };

        Ok(NoticeRow {
            instrument_id: self.instrument_id,
            network_id: self.network_id,
            trigger_id: zero_or(self.trigger_id.as_ref().map(|t| t.to_string())),
            packet_type: zero_or(self.packet_type.clone()),
            observed_at_unix_seconds: self.observed_at,
            galactic_longitude_deg: l,
            galactic_latitude_deg: b,
            position_error_radius_deg: self.position_error_deg.unwrap_or(0.0),
            localization_contour: zero_or(self.contour.as_ref().map(|c| c.to_string())),
            sky_map_url: self
                .sky_map_url
                .clone()
                .unwrap_or_else(|| ROW_NONE_URL.to_string()),
            classification_attributes,
            sequence_number: self.revision.sequence_number,
            is_latest_revision: self.revision.is_latest,
            observation_window_start: self.revision.observation_window_start,
            observation_window_stop: self.revision.observation_window_stop,
        })
    }
}

fn zero_or(value: Option<String>) -> String {
    value.unwrap_or_else(|| ROW_ZERO.to_string())
}

/// Persisted row, described by `schemas/notice_row.v1.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoticeRow {
    pub instrument_id: u32,
    pub network_id: u32,
    pub trigger_id: String,
    pub packet_type: String,
    pub observed_at_unix_seconds: i64,
    pub galactic_longitude_deg: f64,
    pub galactic_latitude_deg: f64,
    pub position_error_radius_deg: f64,
    pub localization_contour: String,
    pub sky_map_url: String,
    pub classification_attributes: String,
    pub sequence_number: u32,
    pub is_latest_revision: bool,
    pub observation_window_start: i64,
    pub observation_window_stop: i64,
}
