use thiserror::Error;

#[derive(Error, Debug)]
pub enum NoticeError {
    #[error("Notice not supported: {0}")]
    UnsupportedNotice(String),

    #[error("Packet type {packet_type} not supported (role: {role})")]
    UnsupportedPacketType { packet_type: i64, role: String },

    #[error("Sky map unavailable: {0}")]
    SkyMapUnavailable(String),

    #[error("Malformed field '{field}': {reason}")]
    MalformedField { field: String, reason: String },

    #[error("XML parsing failed: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl NoticeError {
    pub fn missing(field: &str) -> Self {
        NoticeError::MalformedField {
            field: field.to_string(),
            reason: "missing".to_string(),
        }
    }

    pub fn malformed(field: &str, reason: impl Into<String>) -> Self {
        NoticeError::MalformedField {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    /// Short stable label used for metrics and structured logs
    pub fn kind(&self) -> &'static str {
        match self {
            NoticeError::UnsupportedNotice(_) => "unsupported_notice",
            NoticeError::UnsupportedPacketType { .. } => "unsupported_packet_type",
            NoticeError::SkyMapUnavailable(_) => "sky_map_unavailable",
            NoticeError::MalformedField { .. } => "malformed_field",
            NoticeError::Xml(_) => "xml",
            NoticeError::Json(_) => "json",
            NoticeError::Toml(_) => "toml",
            NoticeError::Io(_) => "io",
            NoticeError::Config(_) => "config",
        }
    }
}

pub type Result<T> = std::result::Result<T, NoticeError>;
