//! Equatorial (ICRS) to galactic coordinate transform
//!
//! The rotation is composed from the ICRS to FK5(J2000) frame bias and the
//! FK5(J2000) to galactic rotation defined by the north galactic pole and the
//! galactic longitude of the north celestial pole.

use nalgebra::{Matrix3, Vector3};
use once_cell::sync::Lazy;

use crate::types::GalacticPosition;

/// North galactic pole, FK5 J2000, degrees
const NGP_RA_DEG: f64 = 192.859_481_206_534_8;
const NGP_DEC_DEG: f64 = 27.128_251_180_856_22;
/// Galactic longitude of the north celestial pole, degrees
const NCP_LON_DEG: f64 = 122.931_918_568_002_6;

/// ICRS to FK5 frame bias, milliarcseconds
const BIAS_ETA0_MAS: f64 = -19.9;
const BIAS_XI0_MAS: f64 = 9.1;
const BIAS_DA0_MAS: f64 = -22.9;

static ICRS_TO_GALACTIC: Lazy<Matrix3<f64>> = Lazy::new(|| {
    let mas = 1.0 / 3_600_000.0;
    let frame_bias =
        rot_x(-BIAS_ETA0_MAS * mas) * rot_y(BIAS_XI0_MAS * mas) * rot_z(BIAS_DA0_MAS * mas);
    let fk5_to_galactic =
        rot_z(180.0 - NCP_LON_DEG) * rot_y(90.0 - NGP_DEC_DEG) * rot_z(NGP_RA_DEG);
    fk5_to_galactic * frame_bias
});

/// Convert an ICRS position in degrees to galactic `(l, b)` in degrees
pub fn to_galactic(ra_deg: f64, dec_deg: f64) -> GalacticPosition {
    let g = *ICRS_TO_GALACTIC * radec_to_uvec(ra_deg, dec_deg);
    let mut l = g.y.atan2(g.x).to_degrees().rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if l >= 360.0 {
        l = 0.0;
    }
    let b = g.z.atan2(g.x.hypot(g.y)).to_degrees();
    GalacticPosition { l, b }
}

/// Convert a unit vector (ICRS) to `(ra, dec)` in degrees
pub fn uvec_to_radec(v: &Vector3<f64>) -> (f64, f64) {
    let ra = v.y.atan2(v.x).to_degrees().rem_euclid(360.0);
    let dec = v.z.atan2(v.x.hypot(v.y)).to_degrees();
    // rem_euclid rounds tiny negative angles up to 360
    let ra = if ra >= 360.0 { 0.0 } else { ra };
    (ra, dec)
}

fn radec_to_uvec(ra_deg: f64, dec_deg: f64) -> Vector3<f64> {
    let (sin_ra, cos_ra) = ra_deg.to_radians().sin_cos();
    let (sin_dec, cos_dec) = dec_deg.to_radians().sin_cos();
    Vector3::new(cos_dec * cos_ra, cos_dec * sin_ra, sin_dec)
}

/// Passive rotation of the coordinate frame about x by `deg` degrees
fn rot_x(deg: f64) -> Matrix3<f64> {
    let (s, c) = deg.to_radians().sin_cos();
    Matrix3::new(1.0, 0.0, 0.0, 0.0, c, s, 0.0, -s, c)
}

fn rot_y(deg: f64) -> Matrix3<f64> {
    let (s, c) = deg.to_radians().sin_cos();
    Matrix3::new(c, 0.0, -s, 0.0, 1.0, 0.0, s, 0.0, c)
}

fn rot_z(deg: f64) -> Matrix3<f64> {
    let (s, c) = deg.to_radians().sin_cos();
    Matrix3::new(c, s, 0.0, -s, c, 0.0, 0.0, 0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE_DEG: f64 = 1e-6;

    #[test]
    fn test_swift_bat_position_reference() {
        let g = to_galactic(262.8109, 14.6481);
        assert!((g.l - 37.575_623_742_656_62).abs() < TOLERANCE_DEG, "l = {}", g.l);
        assert!((g.b - 24.236_000_172_437_528).abs() < TOLERANCE_DEG, "b = {}", g.b);
    }

    #[test]
    fn test_chime_and_integral_positions() {
        let chime = to_galactic(207.135_461_297_020_95, 39.683_280_056_382_83);
        assert!((chime.l - 83.186_240_349_042_65).abs() < TOLERANCE_DEG);
        assert!((chime.b - 72.733_927_903_226_94).abs() < TOLERANCE_DEG);

        let integral = to_galactic(314.657_883_605_671_2, 12.45);
        assert!((integral.l - 60.130_347_174_092_34).abs() < TOLERANCE_DEG);
        assert!((integral.b - -21.077_535_502_194_007).abs() < TOLERANCE_DEG);
    }

    #[test]
    fn test_galactic_center_maps_near_origin() {
        let g = to_galactic(266.404_988_29, -28.936_177_76);
        let l = if g.l > 180.0 { g.l - 360.0 } else { g.l };
        assert!(l.abs() < 1e-6);
        assert!(g.b.abs() < 1e-6);
    }

    #[test]
    fn test_output_ranges() {
        for ra in (0..360).step_by(15) {
            for dec in (-90..=90).step_by(15) {
                let g = to_galactic(ra as f64, dec as f64);
                assert!((0.0..360.0).contains(&g.l));
                assert!((-90.0..=90.0).contains(&g.b));
            }
        }
    }

    #[test]
    fn test_uvec_round_trip() {
        let (ra, dec) = uvec_to_radec(&radec_to_uvec(123.25, -41.5));
        assert!((ra - 123.25).abs() < 1e-9);
        assert!((dec + 41.5).abs() < 1e-9);
    }
}
