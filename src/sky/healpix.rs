//! HEALPix pixel geometry for nested-ordered maps
//!
//! Only what boundary extraction needs: pixel corners, edge neighbours and
//! the position-to-pixel lookup. Ring-ordered maps are reindexed to nested
//! order on load.

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI, TAU};

use nalgebra::Vector3;

/// Offset (in pixel units) used to step across a pixel edge
const EDGE_STEP: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Healpix {
    nside: u64,
}

impl Healpix {
    /// `nside` must be a power of two
    pub fn new(nside: u64) -> Option<Self> {
        if nside == 0 || !nside.is_power_of_two() || nside > (1 << 29) {
            return None;
        }
        Some(Healpix { nside })
    }

    /// Infer the resolution from a full-sky pixel count
    pub fn from_npix(npix: usize) -> Option<Self> {
        let npix = npix as u64;
        if npix == 0 || npix % 12 != 0 {
            return None;
        }
        let nside = ((npix / 12) as f64).sqrt().round() as u64;
        if 12 * nside * nside != npix {
            return None;
        }
        Self::new(nside)
    }

    pub fn nside(&self) -> u64 {
        self.nside
    }

    pub fn npix(&self) -> u64 {
        12 * self.nside * self.nside
    }

    /// Corners of a nested pixel in south, east, north, west order
    pub fn vertices(&self, pix: u64) -> [Vector3<f64>; 4] {
        let (face, ix, iy) = self.decompose(pix);
        let (x, y) = (ix as f64, iy as f64);
        [
            self.local_to_vec(face, x, y),
            self.local_to_vec(face, x + 1.0, y),
            self.local_to_vec(face, x + 1.0, y + 1.0),
            self.local_to_vec(face, x, y + 1.0),
        ]
    }

    /// Pixels across each edge; entry `i` shares the edge `vertices[i]..vertices[i + 1]`
    pub fn edge_neighbours(&self, pix: u64) -> [u64; 4] {
        let (face, ix, iy) = self.decompose(pix);
        let (x, y) = (ix as f64, iy as f64);
        let outside = [
            (x + 0.5, y - EDGE_STEP),
            (x + 1.0 + EDGE_STEP, y + 0.5),
            (x + 0.5, y + 1.0 + EDGE_STEP),
            (x - EDGE_STEP, y + 0.5),
        ];
        outside.map(|(ox, oy)| self.vec_to_pix(&self.local_to_vec(face, ox, oy)))
    }

    /// Nested pixel containing the direction `v`
    pub fn vec_to_pix(&self, v: &Vector3<f64>) -> u64 {
        let nside = self.nside;
        let norm = v.norm();
        let (x, y, z) = (v.x / norm, v.y / norm, v.z / norm);
        let phi = y.atan2(x).rem_euclid(TAU);
        let za = z.abs();
        let tt = (phi / FRAC_PI_2).rem_euclid(4.0);
        let ns = nside as f64;

        let (face, ix, iy) = if za <= 2.0 / 3.0 {
            let t1 = ns * (0.5 + tt);
            let t2 = ns * z * 0.75;
            let jp = (t1 - t2) as u64;
            let jm = (t1 + t2) as u64;
            let ifp = jp / nside;
            let ifm = jm / nside;
            let face = if ifp == ifm {
                ifp | 4
            } else if ifp < ifm {
                ifp
            } else {
                ifm + 8
            };
            (face, jm & (nside - 1), nside - (jp & (nside - 1)) - 1)
        } else {
            let ntt = (tt as u64).min(3);
            let tp = tt - ntt as f64;
            let tmp = ns * (3.0 * (1.0 - za)).sqrt();
            let jp = ((tp * tmp) as u64).min(nside - 1);
            let jm = (((1.0 - tp) * tmp) as u64).min(nside - 1);
            if z >= 0.0 {
                (ntt, nside - jm - 1, nside - jp - 1)
            } else {
                (ntt + 8, jp, jm)
            }
        };
        face * nside * nside + (spread_bits(ix) | (spread_bits(iy) << 1))
    }

    /// Nested index of a ring-ordered pixel
    pub fn ring_to_nested(&self, ring_pix: u64) -> u64 {
        self.vec_to_pix(&self.ring_center(ring_pix))
    }

    fn ring_center(&self, pix: u64) -> Vector3<f64> {
        let nside = self.nside;
        let npix = self.npix();
        let ncap = 2 * nside * (nside - 1);
        let (z, phi) = if pix < ncap {
            let iring = (1 + isqrt(1 + 2 * pix)) / 2;
            let iphi = pix + 1 - 2 * iring * (iring - 1);
            let z = 1.0 - (iring * iring) as f64 * 4.0 / npix as f64;
            (z, (iphi as f64 - 0.5) * PI / (2 * iring) as f64)
        } else if pix < npix - ncap {
            let ip = pix - ncap;
            let iring = ip / (4 * nside) + nside;
            let iphi = ip % (4 * nside) + 1;
            let fodd = if (iring + nside) & 1 == 1 { 1.0 } else { 0.5 };
            let z = (2.0 * nside as f64 - iring as f64) * 2.0 / (3.0 * nside as f64);
            (z, (iphi as f64 - fodd) * PI / (2 * nside) as f64)
        } else {
            let ip = npix - pix;
            let iring = (1 + isqrt(2 * ip - 1)) / 2;
            let iphi = 4 * iring + 1 - (ip - 2 * iring * (iring - 1));
            let z = -1.0 + (iring * iring) as f64 * 4.0 / npix as f64;
            (z, (iphi as f64 - 0.5) * PI / (2 * iring) as f64)
        };
        let s = ((1.0 - z) * (1.0 + z)).sqrt();
        Vector3::new(s * phi.cos(), s * phi.sin(), z)
    }

    fn decompose(&self, pix: u64) -> (u64, u64, u64) {
        let n2 = self.nside * self.nside;
        let face = pix / n2;
        let ipf = pix % n2;
        (face, compact_bits(ipf), compact_bits(ipf >> 1))
    }

    /// Map face-local coordinates (pixel units, may fall slightly outside the
    /// face) to a unit vector
    fn local_to_vec(&self, face: u64, x: f64, y: f64) -> Vector3<f64> {
        let ns = self.nside as f64;
        let (a, b) = (x / ns, y / ns);
        let column = (face % 4) as f64;
        let (t_center, u_center) = match face / 4 {
            0 => (FRAC_PI_4 + column * FRAC_PI_2, FRAC_PI_4),
            1 => (column * FRAC_PI_2, 0.0),
            _ => (FRAC_PI_4 + column * FRAC_PI_2, -FRAC_PI_4),
        };
        let t = t_center + (a - b) * FRAC_PI_4;
        let u = u_center + (a + b - 1.0) * FRAC_PI_4;

        let (z, phi, s) = if u.abs() <= FRAC_PI_4 {
            let z = 8.0 * u / (3.0 * PI);
            (z, t, ((1.0 - z) * (1.0 + z)).sqrt())
        } else {
            let sigma = 2.0 - 4.0 * u.abs() / PI;
            let one_minus_z = sigma * sigma / 3.0;
            let z = (1.0 - one_minus_z).copysign(u);
            let tn = t.rem_euclid(TAU);
            let facet_center = FRAC_PI_4 + (tn / FRAC_PI_2).floor() * FRAC_PI_2;
            let phi = if sigma == 0.0 {
                facet_center
            } else {
                facet_center + (tn - facet_center) / sigma
            };
            (z, phi, (one_minus_z * (2.0 - one_minus_z)).sqrt())
        };
        Vector3::new(s * phi.cos(), s * phi.sin(), z)
    }
}

fn spread_bits(v: u64) -> u64 {
    (0..32).fold(0, |acc, i| acc | (((v >> i) & 1) << (2 * i)))
}

fn compact_bits(v: u64) -> u64 {
    (0..32).fold(0, |acc, i| acc | (((v >> (2 * i)) & 1) << i))
}

fn isqrt(v: u64) -> u64 {
    let mut r = (v as f64).sqrt() as u64;
    while r * r > v {
        r -= 1;
    }
    while (r + 1) * (r + 1) <= v {
        r += 1;
    }
    r
}
