/// Constants shared across the normalization pipeline.
/// Network and instrument codes belong to this system's own taxonomy and are
/// stored as-is by the persistence layer.

/// Unix timestamp of 2004-01-01T00:00:00Z; observation times are stored as
/// seconds elapsed since this instant
pub const EPOCH_2004_UNIX: i64 = 1_072_915_200;

// Network codes
pub const NETWORK_GCN: u32 = 1;
pub const NETWORK_CHIME: u32 = 4;
pub const NETWORK_INTEGRAL: u32 = 6;

// Instrument codes
pub const INSTRUMENT_FERMI_GBM: u32 = 1;
pub const INSTRUMENT_FERMI_LAT: u32 = 2;
pub const INSTRUMENT_SWIFT: u32 = 3;
pub const INSTRUMENT_LIGO: u32 = 7;
pub const INSTRUMENT_ICECUBE_HESE: u32 = 8;
pub const INSTRUMENT_ICECUBE_EHE: u32 = 10;
pub const INSTRUMENT_LIGO_TEST: u32 = 19;
pub const INSTRUMENT_ICECUBE_ASTROTRACK_GOLD: u32 = 21;
pub const INSTRUMENT_ICECUBE_ASTROTRACK_BRONZE: u32 = 22;
pub const INSTRUMENT_INTEGRAL: u32 = 23;
pub const INSTRUMENT_CHIME: u32 = 24;

/// Credible level (percent) whose boundary is extracted from probability maps
pub const CREDIBLE_LEVEL_PERCENT: f64 = 90.0;

/// Error radii below this are treated as missing
pub const MIN_ERROR_RADIUS_DEG: f64 = 1e-7;
/// Radius substituted for missing error radii
pub const DEFAULT_ERROR_RADIUS_DEG: f64 = 0.1;

// Row sentinels expected by the persistence layer
pub const ROW_NONE_URL: &str = "none";
pub const ROW_ZERO: &str = "0";
