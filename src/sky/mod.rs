//! Sky geometry: coordinate frames, HEALPix maps and localization contours

pub mod contour;
pub mod coords;
pub mod fits;
pub mod healpix;
pub mod skymap;

pub use contour::{circular_contour, credible_region_contour};
pub use coords::to_galactic;
pub use skymap::SkyMap;
