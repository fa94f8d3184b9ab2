use std::io::Read;
use std::path::Path;

use flate2::read::MultiGzDecoder;
use tracing::{debug, info};

use crate::error::{NoticeError, Result};
use crate::sky::fits;
use crate::sky::healpix::Healpix;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
const PROBABILITY_COLUMN: &str = "PROB";

/// All-sky HEALPix probability map in nested ordering
#[derive(Debug, Clone)]
pub struct SkyMap {
    healpix: Healpix,
    probabilities: Vec<f64>,
}

impl SkyMap {
    pub fn from_file(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
    }

    /// Decode a (optionally gzip-compressed) FITS sky map
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.starts_with(&GZIP_MAGIC) {
            let mut inflated = Vec::new();
            MultiGzDecoder::new(bytes)
                .read_to_end(&mut inflated)
                .map_err(|e| NoticeError::SkyMapUnavailable(format!("gzip: {}", e)))?;
            debug!(compressed = bytes.len(), inflated = inflated.len(), "inflated sky map");
            return Self::from_fits(&inflated);
        }
        Self::from_fits(bytes)
    }

    fn from_fits(bytes: &[u8]) -> Result<Self> {
        let column = fits::read_bintable_column(bytes, PROBABILITY_COLUMN)?;
        let header = &column.header;

        if header
            .get("INDXSCHM")
            .is_some_and(|s| s.eq_ignore_ascii_case("EXPLICIT"))
        {
            return Err(NoticeError::SkyMapUnavailable(
                "partial-sky (explicit index) maps are not supported".to_string(),
            ));
        }

        let healpix = Healpix::from_npix(column.values.len()).ok_or_else(|| {
            NoticeError::SkyMapUnavailable(format!(
                "{} values is not a full-sky HEALPix map",
                column.values.len()
            ))
        })?;
        if let Some(nside) = header.get_int("NSIDE")? {
            if nside as u64 != healpix.nside() {
                return Err(NoticeError::SkyMapUnavailable(format!(
                    "NSIDE {} does not match {} pixels",
                    nside,
                    column.values.len()
                )));
            }
        }

        let probabilities: Vec<f64> = column
            .values
            .iter()
            .map(|&p| if p.is_finite() && p > UNSEEN_THRESHOLD { p } else { 0.0 })
            .collect();

        let ordering = header.get("ORDERING").unwrap_or("RING").to_ascii_uppercase();
        let probabilities = match ordering.as_str() {
            "NESTED" => probabilities,
            "RING" => reorder_ring(&healpix, &probabilities),
            other => {
                return Err(NoticeError::SkyMapUnavailable(format!(
                    "unsupported pixel ordering '{}'",
                    other
                )))
            }
        };

        info!(nside = healpix.nside(), ordering = %ordering, "decoded sky map");
        Ok(SkyMap { healpix, probabilities })
    }

    pub fn from_nested(healpix: Healpix, probabilities: Vec<f64>) -> Result<Self> {
        if probabilities.len() as u64 != healpix.npix() {
            return Err(NoticeError::SkyMapUnavailable(format!(
                "expected {} pixels, got {}",
                healpix.npix(),
                probabilities.len()
            )));
        }
        Ok(SkyMap { healpix, probabilities })
    }

    pub fn healpix(&self) -> &Healpix {
        &self.healpix
    }

    pub fn probabilities(&self) -> &[f64] {
        &self.probabilities
    }

    /// Greedy credible level of every pixel, in percent: pixels are ranked by
    /// descending probability and each gets the running total up to itself.
    pub fn credible_levels(&self) -> Vec<f64> {
        let mut order: Vec<usize> = (0..self.probabilities.len()).collect();
        order.sort_by(|&a, &b| {
            self.probabilities[b]
                .total_cmp(&self.probabilities[a])
                .then(a.cmp(&b))
        });

        let mut levels = vec![0.0; self.probabilities.len()];
        let mut cumulative = 0.0;
        for pix in order {
            cumulative += self.probabilities[pix];
            levels[pix] = cumulative * 100.0;
        }
        levels
    }
}

/// HEALPix UNSEEN marker is -1.6375e30; anything at or below it is masked
const UNSEEN_THRESHOLD: f64 = -1.6375e30;

fn reorder_ring(healpix: &Healpix, ring: &[f64]) -> Vec<f64> {
    let mut nested = vec![0.0; ring.len()];
    for (pix, &p) in ring.iter().enumerate() {
        nested[healpix.ring_to_nested(pix as u64) as usize] = p;
    }
    nested
}
