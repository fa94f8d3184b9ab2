//! Localization contours
//!
//! Two ways to outline where a transient is on the sky: a parametric circle
//! around a reported position (instruments with a simple error radius), and
//! the boundary of a credible region of a HEALPix probability map.

use std::collections::HashMap;
use std::f64::consts::TAU;

use nalgebra::Vector3;
use tracing::debug;

use crate::constants::{DEFAULT_ERROR_RADIUS_DEG, MIN_ERROR_RADIUS_DEG};
use crate::error::{NoticeError, Result};
use crate::sky::coords::uvec_to_radec;
use crate::sky::skymap::SkyMap;
use crate::types::{Contour, GalacticPosition};

/// Vertices closer than this (unit-sphere chord) are the same corner
const VERTEX_QUANTUM: f64 = 1e-9;

/// Circle of `radius_deg` around `center`, sampled counterclockwise from the
/// low-longitude side. Coordinates saturate at the sphere's edges instead of
/// wrapping.
pub fn circular_contour(center: Option<GalacticPosition>, radius_deg: f64) -> Option<Contour> {
    let center = center?;
    if center.l == 0.0 && center.b == 0.0 {
        return None;
    }
    let r = if radius_deg < MIN_ERROR_RADIUS_DEG {
        DEFAULT_ERROR_RADIUS_DEG
    } else {
        radius_deg
    };
    let steps = (10.0 + 10.0 * r).floor() as usize;

    let points = (0..steps)
        .map(|i| {
            let delta = -(i as f64) * TAU / steps as f64;
            let l = (center.l - r * delta.cos()).clamp(0.0, 360.0);
            let b = (center.b + r * delta.sin()).clamp(-90.0, 90.0);
            // keep "-0" out of the rendered text
            (l + 0.0, b + 0.0)
        })
        .collect();
    Some(Contour { points })
}

/// Boundary of the region of `map` enclosed by the `level_percent` credible
/// level, as ICRS `(ra, dec)` vertices in the map's own frame. Each closed
/// boundary ring is emitted in turn; rings are ordered by their lowest pixel
/// index.
pub fn credible_region_contour(map: &SkyMap, level_percent: f64) -> Result<Contour> {
    let healpix = map.healpix();
    let levels = map.credible_levels();
    let in_region: Vec<bool> = levels.iter().map(|&cl| cl <= level_percent).collect();
    let region_size = in_region.iter().filter(|&&r| r).count();
    if region_size == 0 {
        return Err(NoticeError::SkyMapUnavailable(format!(
            "no pixels inside the {}% credible region",
            level_percent
        )));
    }

    let mut edges: Vec<(Vector3<f64>, Vector3<f64>)> = Vec::new();
    for pix in (0..healpix.npix()).filter(|&p| in_region[p as usize]) {
        let corners = healpix.vertices(pix);
        for (i, neighbour) in healpix.edge_neighbours(pix).into_iter().enumerate() {
            if !in_region[neighbour as usize] {
                edges.push((corners[i], corners[(i + 1) % 4]));
            }
        }
    }

    let rings = chain_edges(&edges);
    let points: Vec<(f64, f64)> = rings
        .iter()
        .flatten()
        .map(uvec_to_radec)
        .collect();

    debug!(
        region_pixels = region_size,
        boundary_edges = edges.len(),
        rings = rings.len(),
        vertices = points.len(),
        "extracted credible region boundary"
    );
    if points.is_empty() {
        return Err(NoticeError::SkyMapUnavailable(
            "credible region has no boundary".to_string(),
        ));
    }
    Ok(Contour { points })
}

type VertexKey = (i64, i64, i64);

fn vertex_key(v: &Vector3<f64>) -> VertexKey {
    let q = |x: f64| (x / VERTEX_QUANTUM).round() as i64;
    (q(v.x), q(v.y), q(v.z))
}

/// Join directed edges head to tail. Closed rings do not repeat their first
/// vertex; a chain that cannot be closed is kept as an open path.
fn chain_edges(edges: &[(Vector3<f64>, Vector3<f64>)]) -> Vec<Vec<Vector3<f64>>> {
    let mut by_start: HashMap<VertexKey, Vec<usize>> = HashMap::new();
    for (i, (start, _)) in edges.iter().enumerate() {
        by_start.entry(vertex_key(start)).or_default().push(i);
    }

    let mut used = vec![false; edges.len()];
    let mut rings = Vec::new();
    for first in 0..edges.len() {
        if used[first] {
            continue;
        }
        let ring_start = vertex_key(&edges[first].0);
        let mut ring = vec![edges[first].0];
        let mut current = first;
        loop {
            used[current] = true;
            let end = &edges[current].1;
            let end_key = vertex_key(end);
            if end_key == ring_start {
                break;
            }
            ring.push(*end);
            let next = by_start
                .get(&end_key)
                .and_then(|candidates| candidates.iter().copied().find(|&e| !used[e]));
            match next {
                Some(e) => current = e,
                None => break,
            }
        }
        rings.push(ring);
    }
    rings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sky::healpix::Healpix;

    fn gcn_center() -> Option<GalacticPosition> {
        Some(GalacticPosition {
            l: 37.575_623_742_656_62,
            b: 24.236_000_172_437_528,
        })
    }

    #[test]
    fn test_circle_step_count_follows_radius() {
        assert_eq!(circular_contour(gcn_center(), 0.05).unwrap().len(), 10);
        assert_eq!(circular_contour(gcn_center(), 0.539_246_632_919_425_1).unwrap().len(), 15);
        assert_eq!(circular_contour(gcn_center(), 2.0).unwrap().len(), 30);
    }

    #[test]
    fn test_tiny_radius_uses_default() {
        let contour = circular_contour(gcn_center(), 0.0).unwrap();
        assert_eq!(contour.len(), 11);
        let (l0, b0) = contour.points[0];
        assert!((l0 - (37.575_623_742_656_62 - 0.1)).abs() < 1e-12);
        assert!((b0 - 24.236_000_172_437_528).abs() < 1e-12);
    }

    #[test]
    fn test_no_position_means_no_contour() {
        assert!(circular_contour(None, 1.0).is_none());
        assert!(circular_contour(Some(GalacticPosition { l: 0.0, b: 0.0 }), 1.0).is_none());
    }

    #[test]
    fn test_saturates_at_sky_edges() {
        let contour = circular_contour(Some(GalacticPosition { l: 0.2, b: 89.9 }), 1.0).unwrap();
        for (l, b) in &contour.points {
            assert!((0.0..=360.0).contains(l));
            assert!((-90.0..=90.0).contains(b));
        }
        assert!(contour.points.iter().any(|&(l, _)| l == 0.0));
        assert!(contour.points.iter().any(|&(_, b)| b == 90.0));
    }

    #[test]
    fn test_text_rendering() {
        let contour = circular_contour(gcn_center(), 0.05).unwrap();
        let text = contour.to_string();
        assert_eq!(text.lines().count(), 10);
        assert!(text.ends_with('\n'));
        let first = text.lines().next().unwrap();
        let parsed: Vec<f64> = first.split(' ').map(|t| t.parse().unwrap()).collect();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0], contour.points[0].0);
    }

    #[test]
    fn test_single_pixel_region_outline() {
        let healpix = Healpix::new(4).unwrap();
        let mut probs = vec![0.0; healpix.npix() as usize];
        probs[70] = 0.85;
        probs[71] = 0.15;
        let map = SkyMap::from_nested(healpix, probs).unwrap();

        let contour = credible_region_contour(&map, 90.0).unwrap();
        assert_eq!(contour.len(), 4);
    }

    #[test]
    fn test_region_vertices_stay_in_map_frame() {
        let healpix = Healpix::new(8).unwrap();
        let (ra, dec) = (45f64.to_radians(), 30f64.to_radians());
        let target = Vector3::new(dec.cos() * ra.cos(), dec.cos() * ra.sin(), dec.sin());
        let mut probs = vec![0.0; healpix.npix() as usize];
        probs[healpix.vec_to_pix(&target) as usize] = 0.85;
        probs[healpix.vec_to_pix(&-target) as usize] = 0.15;
        let map = SkyMap::from_nested(healpix, probs).unwrap();

        let contour = credible_region_contour(&map, 90.0).unwrap();
        assert_eq!(contour.len(), 4);
        for &(ra, dec) in &contour.points {
            assert!((ra - 45.0).abs() < 10.0, "ra {}", ra);
            assert!((dec - 30.0).abs() < 10.0, "dec {}", dec);
        }
    }

    #[test]
    fn test_two_pixel_region_is_one_ring() {
        let healpix = Healpix::new(8).unwrap();
        let mut probs = vec![0.0; healpix.npix() as usize];
        // neighbouring pixels sharing an edge
        let a = 300u64;
        let b = healpix.edge_neighbours(a)[0];
        probs[a as usize] = 0.5;
        probs[b as usize] = 0.39;
        probs[700] = 0.11;
        let map = SkyMap::from_nested(healpix, probs).unwrap();

        let contour = credible_region_contour(&map, 90.0).unwrap();
        assert_eq!(contour.len(), 6);
    }

    #[test]
    fn test_dominant_pixel_leaves_empty_region() {
        let healpix = Healpix::new(2).unwrap();
        let mut probs = vec![0.0; healpix.npix() as usize];
        probs[5] = 0.95;
        probs[6] = 0.05;
        let map = SkyMap::from_nested(healpix, probs).unwrap();

        let result = credible_region_contour(&map, 90.0);
        assert!(matches!(result, Err(NoticeError::SkyMapUnavailable(_))));
    }
}
