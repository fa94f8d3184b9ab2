use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{NoticeError, Result};
use crate::parser::Notice;
use crate::types::{NetworkTag, TriggerId};

const GCN_TRIGGER_PARAM: usize = 2;
const GCN_TRIGGER_FIELD: &str = "What/Param[2]";

static NON_DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\D+").expect("static regex"));

/// Canonical numeric trigger identifier; `None` for networks that do not
/// publish one
pub fn canonical_trigger_id(tag: NetworkTag, notice: &Notice) -> Result<Option<TriggerId>> {
    match tag {
        // third parameter: TrigID on most feeds, AMON_ID on IceCube ones
        NetworkTag::Gcn => {
            let param = notice
                .param_at(GCN_TRIGGER_PARAM)
                .ok_or_else(|| NoticeError::missing(GCN_TRIGGER_FIELD))?;
            TriggerId::new(param.value.trim()).map(Some).ok_or_else(|| {
                NoticeError::malformed(
                    GCN_TRIGGER_FIELD,
                    format!("{} '{}' is not numeric", param.name, param.value),
                )
            })
        }
        NetworkTag::Ligo => {
            let raw = notice.param("GraceID").ok_or_else(|| NoticeError::missing("GraceID"))?;
            grace_id_to_trigger(raw).map(Some)
        }
        NetworkTag::Chime | NetworkTag::Integral | NetworkTag::Agile => Ok(None),
    }
}

/// `S191225aq` style ids: the digits, followed by the alphabet position of
/// the last letter as two digits
pub fn grace_id_to_trigger(grace_id: &str) -> Result<TriggerId> {
    let grace_id = grace_id.trim();
    let last = grace_id
        .chars()
        .last()
        .filter(char::is_ascii_alphabetic)
        .ok_or_else(|| {
            NoticeError::malformed("GraceID", format!("'{}' does not end in a letter", grace_id))
        })?;
    let position = last.to_ascii_lowercase() as u32 - 'a' as u32 + 1;

    let digits = NON_DIGITS.replace_all(grace_id, "");
    if digits.is_empty() {
        return Err(NoticeError::malformed(
            "GraceID",
            format!("'{}' contains no digits", grace_id),
        ));
    }

    TriggerId::new(format!("{}{:02}", digits, position)).ok_or_else(|| {
        NoticeError::malformed("GraceID", format!("'{}' has non-ASCII digits", grace_id))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trigger(grace_id: &str) -> String {
        grace_id_to_trigger(grace_id).unwrap().to_string()
    }

    #[test]
    fn test_grace_id_suffix_position() {
        assert_eq!(trigger("220530p"), "22053016");
        assert_eq!(trigger("MS210208t"), "21020820");
        assert_eq!(trigger("S191225aq"), "19122517");
        assert_eq!(trigger("S200105a"), "20010501");
        assert_eq!(trigger("S200105Z"), "20010526");
    }

    #[test]
    fn test_grace_id_rejections() {
        assert!(grace_id_to_trigger("S2001051").is_err());
        assert!(grace_id_to_trigger("MSabc").is_err());
        assert!(grace_id_to_trigger("").is_err());
    }

    fn gcn_notice(third: &str) -> Notice {
        Notice::parse_str(&format!(
            r#"<VOEvent ivorn="ivo://nasa.gsfc.gcn/x#1"><What><Param name="Packet_Type" value="173"/><Param name="Pkt_Ser_Num" value="1"/>{}</What></VOEvent>"#,
            third
        ))
        .unwrap()
    }

    #[test]
    fn test_gcn_trigger_must_be_numeric() {
        let notice = gcn_notice(r#"<Param name="TrigID" value="10317a"/>"#);
        assert!(matches!(
            canonical_trigger_id(NetworkTag::Gcn, &notice),
            Err(NoticeError::MalformedField { .. })
        ));
    }

    #[test]
    fn test_gcn_trigger_is_read_by_position() {
        let notice = gcn_notice(r#"<Param name="AMON_ID" value="13311922683750"/>"#);
        let trigger = canonical_trigger_id(NetworkTag::Gcn, &notice).unwrap().unwrap();
        assert_eq!(trigger.as_str(), "13311922683750");
    }

    #[test]
    fn test_gcn_trigger_missing_third_param() {
        let notice = Notice::parse_str(
            r#"<VOEvent ivorn="ivo://nasa.gsfc.gcn/x#1"><What><Param name="Packet_Type" value="97"/></What></VOEvent>"#,
        )
        .unwrap();
        match canonical_trigger_id(NetworkTag::Gcn, &notice) {
            Err(NoticeError::MalformedField { field, .. }) => assert_eq!(field, "What/Param[2]"),
            other => panic!("expected MalformedField, got {:?}", other),
        }
    }

    #[test]
    fn test_networks_without_trigger() {
        let notice = Notice::parse_str(r#"<VOEvent ivorn="ivo://chimenet/x#1"/>"#).unwrap();
        assert_eq!(canonical_trigger_id(NetworkTag::Chime, &notice).unwrap(), None);
        assert_eq!(canonical_trigger_id(NetworkTag::Integral, &notice).unwrap(), None);
    }
}
