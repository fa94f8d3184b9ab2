//! Notice normalization
//!
//! [`NoticeNormalizer`] classifies a parsed notice by network and then runs
//! the per-network resolving steps to build one [`NoticeRecord`]. Any failing
//! step aborts the whole notice; no partial record is returned.

pub mod classification;
pub mod classify;
pub mod instrument;
pub mod record;
pub mod trigger;

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::{debug, info};

use crate::app::ports::SkyMapFetcher;
use crate::constants::{
    CREDIBLE_LEVEL_PERCENT, EPOCH_2004_UNIX, NETWORK_CHIME, NETWORK_GCN, NETWORK_INTEGRAL,
};
use crate::error::{NoticeError, Result};
use crate::metrics;
use crate::parser::Notice;
use crate::sky::{circular_contour, credible_region_contour, to_galactic, SkyMap};
use crate::types::{Contour, GalacticPosition, NetworkTag};

pub use classification::{extract_classification, sky_map_url, ClassificationAttributes};
pub use classify::classify;
pub use instrument::resolve_instrument;
pub use record::{AlertKey, NoticeRecord, NoticeRow, Revision};
pub use trigger::canonical_trigger_id;

/// Builds canonical records; holds no per-notice state and can be shared
/// across tasks
#[derive(Clone)]
pub struct NoticeNormalizer {
    fetcher: Arc<dyn SkyMapFetcher>,
}

impl NoticeNormalizer {
    pub fn new(fetcher: Arc<dyn SkyMapFetcher>) -> Self {
        Self { fetcher }
    }

    #[tracing::instrument(skip(self, notice), fields(ivorn = %notice.ivorn))]
    pub async fn normalize(&self, notice: &Notice) -> Result<NoticeRecord> {
        let network = classify(notice)?;

        let instrument_id = resolve_instrument(network, notice)?;
        let network_id = network_id(network).ok_or_else(|| {
            NoticeError::UnsupportedNotice(format!("no network code for {}", network))
        })?;
        let trigger_id = canonical_trigger_id(network, notice)?;
        let packet_type = match network {
            NetworkTag::Gcn | NetworkTag::Ligo => {
                notice.first_param().map(|p| p.value.trim().to_string())
            }
            _ => None,
        };
        let observed_at = observed_at(notice)?;
        let (galactic, position_error_deg) = position(network, notice)?;
        let classification = extract_classification(network, notice)?;
        let sky_map_url = sky_map_url(network, notice)?;

        let contour = match network {
            NetworkTag::Ligo => {
                let url = sky_map_url
                    .as_deref()
                    .ok_or_else(|| NoticeError::missing("GW_SKYMAP/skymap_fits"))?;
                Some(self.sky_map_contour(url).await?)
            }
            _ => circular_contour(galactic, position_error_deg.unwrap_or(0.0)),
        };

        let record = NoticeRecord {
            ivorn: notice.ivorn.clone(),
            network,
            instrument_id,
            network_id,
            trigger_id,
            packet_type,
            observed_at,
            galactic,
            position_error_deg,
            contour,
            sky_map_url,
            classification,
            revision: Revision::default(),
        };

        info!(
            network = %network,
            instrument_id = record.instrument_id,
            trigger_id = ?record.trigger_id,
            contour_points = record.contour.as_ref().map(Contour::len).unwrap_or(0),
            "normalized notice"
        );
        Ok(record)
    }

    /// Fetch the probability map and outline its credible region. Decoding
    /// runs on the blocking pool; the staged download is dropped (and
    /// deleted) when that work finishes, whatever the outcome.
    async fn sky_map_contour(&self, url: &str) -> Result<Contour> {
        let started = Instant::now();
        let staged = self.fetcher.fetch(url).await?;
        metrics::sky_map::fetched(staged.bytes(), started.elapsed().as_secs_f64());
        debug!(url = %staged.url(), bytes = staged.bytes(), "sky map staged");

        let contour = tokio::task::spawn_blocking(move || {
            let map = SkyMap::from_file(staged.path())?;
            drop(staged);
            credible_region_contour(&map, CREDIBLE_LEVEL_PERCENT)
        })
        .await
        .map_err(|e| NoticeError::SkyMapUnavailable(format!("contour task failed: {}", e)))??;

        metrics::sky_map::contour_vertices(contour.len());
        Ok(contour)
    }
}

/// Network code stored alongside the instrument code; AGILE has none
pub fn network_id(tag: NetworkTag) -> Option<u32> {
    match tag {
        NetworkTag::Gcn | NetworkTag::Ligo => Some(NETWORK_GCN),
        NetworkTag::Chime => Some(NETWORK_CHIME),
        NetworkTag::Integral => Some(NETWORK_INTEGRAL),
        NetworkTag::Agile => None,
    }
}

/// Observation time as whole seconds since 2004-01-01T00:00:00Z, rounded half
/// to even. Zone-less timestamps are UTC.
pub fn observed_at(notice: &Notice) -> Result<i64> {
    let field = "ISOTime";
    let raw = notice
        .iso_time
        .as_deref()
        .ok_or_else(|| NoticeError::missing(field))?;

    let utc = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .or_else(|_| DateTime::parse_from_rfc3339(raw).map(|dt| dt.with_timezone(&Utc)))
        .map_err(|e| NoticeError::malformed(field, format!("'{}': {}", raw, e)))?;

    let whole = (utc.timestamp() - EPOCH_2004_UNIX) as f64;
    let fraction = utc.timestamp_subsec_nanos() as f64 / 1e9;
    Ok((whole + fraction).round_ties_even() as i64)
}

fn position(network: NetworkTag, notice: &Notice) -> Result<(Option<GalacticPosition>, Option<f64>)> {
    match network {
        NetworkTag::Ligo => Ok((None, None)),
        _ => {
            let (ra, dec) = notice.equatorial_position()?;
            let error = notice.error_radius()?;
            Ok((Some(to_galactic(ra, dec)), Some(error)))
        }
    }
}
