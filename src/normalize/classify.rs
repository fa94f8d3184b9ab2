use tracing::debug;

use crate::error::{NoticeError, Result};
use crate::parser::Notice;
use crate::types::NetworkTag;

/// Ordered discriminator table; the first substring match wins
const DISCRIMINATORS: &[(&str, NetworkTag)] = &[
    ("gcn", NetworkTag::Gcn),
    ("gwnet", NetworkTag::Ligo),
    ("chimenet", NetworkTag::Chime),
    ("INTEGRAL", NetworkTag::Integral),
    ("AGILE", NetworkTag::Agile),
];

fn match_identity(identity: &str) -> Option<NetworkTag> {
    DISCRIMINATORS
        .iter()
        .find(|(pattern, _)| identity.contains(*pattern))
        .map(|(_, tag)| *tag)
}

/// Assign the originating network. The notice identity is tried first, then
/// the author identity that older feed generations rely on.
pub fn classify(notice: &Notice) -> Result<NetworkTag> {
    let tag = match_identity(&notice.ivorn).or_else(|| {
        notice
            .author_ivorn
            .as_deref()
            .and_then(match_identity)
    });

    match tag {
        Some(tag) => {
            debug!(ivorn = %notice.ivorn, network = %tag, "classified notice");
            Ok(tag)
        }
        None => Err(NoticeError::UnsupportedNotice(format!(
            "no network matches identity '{}'",
            notice.ivorn
        ))),
    }
}
