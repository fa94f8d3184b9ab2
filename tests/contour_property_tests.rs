mod common;

use afiss_ingest::constants::CREDIBLE_LEVEL_PERCENT;
use afiss_ingest::sky::healpix::Healpix;
use afiss_ingest::sky::{circular_contour, credible_region_contour, SkyMap};
use afiss_ingest::types::GalacticPosition;
use common::gaussian_blob;
use nalgebra::Vector3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[test]
fn circular_contours_stay_on_the_sphere() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    for _ in 0..1000 {
        let center = GalacticPosition {
            l: rng.gen_range(0.0..360.0),
            b: rng.gen_range(-90.0..=90.0),
        };
        let radius: f64 = rng.gen_range(0.0..30.0);
        let contour = circular_contour(Some(center), radius).unwrap();

        let effective = if radius < 1e-7 { 0.1 } else { radius };
        assert_eq!(contour.len(), (10.0 + 10.0 * effective).floor() as usize);

        for &(l, b) in &contour.points {
            assert!((0.0..=360.0).contains(&l), "l={} for {:?} r={}", l, center, radius);
            assert!((-90.0..=90.0).contains(&b), "b={} for {:?} r={}", b, center, radius);
            assert!((l - center.l).abs() <= effective + 1e-9);
            assert!((b - center.b).abs() <= effective + 1e-9);
        }
    }
}

#[test]
fn credible_regions_of_random_blobs_render_finite_outlines() {
    let mut rng = StdRng::seed_from_u64(42);
    let healpix = Healpix::new(8).unwrap();
    for _ in 0..25 {
        let centre = Vector3::new(
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
        );
        if centre.norm() < 0.1 {
            continue;
        }
        let sigma = rng.gen_range(5.0..25.0);
        let map = SkyMap::from_nested(healpix, gaussian_blob(8, centre, sigma)).unwrap();

        let contour = credible_region_contour(&map, CREDIBLE_LEVEL_PERCENT).unwrap();
        // a region of at least one pixel has four corners
        assert!(contour.len() >= 4);
        for &(ra, dec) in &contour.points {
            assert!(ra.is_finite() && (0.0..360.0).contains(&ra));
            assert!(dec.is_finite() && (-90.0..=90.0).contains(&dec));
        }
        assert_eq!(contour.to_string().lines().count(), contour.len());
    }
}
