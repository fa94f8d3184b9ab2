#![allow(dead_code)]

use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use afiss_ingest::app::ports::{SkyMapFetcher, StagedSkyMap};
use afiss_ingest::error::{NoticeError, Result};
use afiss_ingest::sky::healpix::Healpix;
use async_trait::async_trait;
use flate2::write::GzEncoder;
use flate2::Compression;
use nalgebra::Vector3;
use tempfile::NamedTempFile;

pub const GCN: &str = include_str!("../fixtures/gcn_swift_bat.xml");
pub const CHIME: &str = include_str!("../fixtures/chime_frb.xml");
pub const INTEGRAL: &str = include_str!("../fixtures/integral_subthreshold.xml");
pub const LIGO: &str = include_str!("../fixtures/ligo_preliminary.xml");
pub const AGILE: &str = include_str!("../fixtures/agile_mcal.xml");
pub const ICECUBE: &str = include_str!("../fixtures/icecube_astrotrack_gold.xml");

const BLOCK: usize = 2880;

fn card(text: &str) -> Vec<u8> {
    format!("{:<80}", text).into_bytes()
}

fn header(cards: &[String]) -> Vec<u8> {
    let mut out: Vec<u8> = cards.iter().flat_map(|c| card(c)).collect();
    out.extend(card("END"));
    pad(&mut out, b' ');
    out
}

fn pad(bytes: &mut Vec<u8>, fill: u8) {
    let len = bytes.len().div_ceil(BLOCK) * BLOCK;
    bytes.resize(len, fill);
}

/// Column element type of a generated map
#[derive(Clone, Copy)]
pub enum Precision {
    /// `D`, one value per row
    Double,
    /// `<repeat>E`, several values per row
    Single { repeat: usize },
}

/// HEALPix probability map as a FITS binary table, laid out the way
/// gravitational-wave pipelines publish them
pub fn healpix_fits(values: &[f64], ordering: &str, precision: Precision) -> Vec<u8> {
    let nside = ((values.len() / 12) as f64).sqrt().round() as usize;
    let (repeat, width, code) = match precision {
        Precision::Double => (1, 8, "D".to_string()),
        Precision::Single { repeat } => (repeat, 4, format!("{}E", repeat)),
    };
    assert_eq!(values.len() % repeat, 0);
    let rows = values.len() / repeat;

    let mut out = header(&[
        "SIMPLE  =                    T".to_string(),
        "BITPIX  =                    8".to_string(),
        "NAXIS   =                    0".to_string(),
        "EXTEND  =                    T".to_string(),
    ]);
    out.extend(header(&[
        "XTENSION= 'BINTABLE'           / binary table extension".to_string(),
        "BITPIX  =                    8".to_string(),
        "NAXIS   =                    2".to_string(),
        format!("NAXIS1  = {:>20}", repeat * width),
        format!("NAXIS2  = {:>20}", rows),
        "PCOUNT  =                    0".to_string(),
        "GCOUNT  =                    1".to_string(),
        "TFIELDS =                    1".to_string(),
        "TTYPE1  = 'PROB    '".to_string(),
        format!("TFORM1  = '{:<8}'", code),
        "PIXTYPE = 'HEALPIX '".to_string(),
        format!("ORDERING= '{:<8}'", ordering),
        format!("NSIDE   = {:>20}", nside),
        "INDXSCHM= 'IMPLICIT'".to_string(),
    ]));

    let mut data = Vec::with_capacity(values.len() * width);
    for v in values {
        match precision {
            Precision::Double => data.extend(v.to_be_bytes()),
            Precision::Single { .. } => data.extend((*v as f32).to_be_bytes()),
        }
    }
    pad(&mut data, 0);
    out.extend(data);
    out
}

pub fn gzip(bytes: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(bytes).unwrap();
    encoder.finish().unwrap()
}

pub fn pixel_centre(healpix: &Healpix, pix: u64) -> Vector3<f64> {
    let corners = healpix.vertices(pix);
    let sum = corners.iter().fold(Vector3::zeros(), |acc, c| acc + c);
    sum.normalize()
}

/// Nested-order map of a Gaussian blob of width `sigma_deg` around `centre`
pub fn gaussian_blob(nside: u64, centre: Vector3<f64>, sigma_deg: f64) -> Vec<f64> {
    let healpix = Healpix::new(nside).unwrap();
    let sigma = sigma_deg.to_radians();
    let centre = centre.normalize();
    let mut values: Vec<f64> = (0..healpix.npix())
        .map(|pix| {
            let angle = pixel_centre(&healpix, pix).dot(&centre).clamp(-1.0, 1.0).acos();
            (-0.5 * (angle / sigma).powi(2)).exp()
        })
        .collect();
    let total: f64 = values.iter().sum();
    values.iter_mut().for_each(|v| *v /= total);
    values
}

/// Serves a fixed payload and remembers where it was staged
pub struct StaticSkyMapFetcher {
    payload: Vec<u8>,
    pub staged_paths: Arc<Mutex<Vec<PathBuf>>>,
    pub requested: Arc<Mutex<Vec<String>>>,
}

impl StaticSkyMapFetcher {
    pub fn new(payload: Vec<u8>) -> Self {
        Self {
            payload,
            staged_paths: Arc::new(Mutex::new(Vec::new())),
            requested: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

#[async_trait]
impl SkyMapFetcher for StaticSkyMapFetcher {
    async fn fetch(&self, url: &str) -> Result<StagedSkyMap> {
        self.requested.lock().unwrap().push(url.to_string());
        let mut file = NamedTempFile::new()?;
        file.write_all(&self.payload)?;
        file.flush()?;
        self.staged_paths.lock().unwrap().push(file.path().to_path_buf());
        Ok(StagedSkyMap::new(url, file, self.payload.len() as u64))
    }
}

/// Always fails the way an unreachable archive does
pub struct UnreachableSkyMapFetcher;

#[async_trait]
impl SkyMapFetcher for UnreachableSkyMapFetcher {
    async fn fetch(&self, url: &str) -> Result<StagedSkyMap> {
        Err(NoticeError::SkyMapUnavailable(format!("{}: connection refused", url)))
    }
}

/// Parse one `"<lon> <lat>"` line per point
pub fn contour_points(text: &str) -> Vec<(f64, f64)> {
    text.lines()
        .map(|line| {
            let mut parts = line.split(' ');
            let l: f64 = parts.next().unwrap().parse().unwrap();
            let b: f64 = parts.next().unwrap().parse().unwrap();
            assert!(parts.next().is_none(), "extra field in '{}'", line);
            (l, b)
        })
        .collect()
}
