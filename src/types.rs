use serde::{Deserialize, Serialize};
use std::fmt;

/// Originating network of a notice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum NetworkTag {
    Gcn,
    Chime,
    Integral,
    Ligo,
    Agile,
}

impl NetworkTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            NetworkTag::Gcn => "GCN",
            NetworkTag::Chime => "CHIME",
            NetworkTag::Integral => "INTEGRAL",
            NetworkTag::Ligo => "LIGO",
            NetworkTag::Agile => "AGILE",
        }
    }
}

impl fmt::Display for NetworkTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical trigger identifier: always a non-empty string of ASCII digits
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TriggerId(String);

impl TriggerId {
    /// Returns `None` unless `value` is non-empty and all ASCII digits
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        if !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()) {
            Some(TriggerId(value))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TriggerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Galactic position in degrees, `l` in [0, 360) and `b` in [-90, 90]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GalacticPosition {
    pub l: f64,
    pub b: f64,
}

/// Ordered boundary points approximating a credible region, one `"<lon> <lat>"` per line
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Contour {
    pub points: Vec<(f64, f64)>,
}

impl Contour {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl fmt::Display for Contour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (lon, lat) in &self.points {
            writeln!(f, "{} {}", lon, lat)?;
        }
        Ok(())
    }
}
