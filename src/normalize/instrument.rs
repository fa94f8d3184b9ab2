use crate::constants::*;
use crate::error::{NoticeError, Result};
use crate::parser::Notice;
use crate::types::NetworkTag;

const ROLE_OBSERVATION: &str = "observation";
const ROLE_TEST: &str = "test";

/// Instrument code for a notice of the given network
pub fn resolve_instrument(tag: NetworkTag, notice: &Notice) -> Result<u32> {
    match tag {
        NetworkTag::Gcn | NetworkTag::Ligo => {
            let packet_type = packet_type(notice)?;
            instrument_for_packet(packet_type, &notice.role)
        }
        NetworkTag::Chime => Ok(INSTRUMENT_CHIME),
        // shares its code with GCN's INTEGRAL packets (53-55)
        NetworkTag::Integral => Ok(INSTRUMENT_INTEGRAL),
        NetworkTag::Agile => Err(NoticeError::UnsupportedNotice(format!(
            "no instrument mapping for network {}",
            tag
        ))),
    }
}

/// Integer packet type carried by the first top-level parameter
pub fn packet_type(notice: &Notice) -> Result<i64> {
    let param = notice
        .first_param()
        .ok_or_else(|| NoticeError::missing("What/Param[0]"))?;
    param.value.trim().parse().map_err(|_| {
        NoticeError::malformed(
            "What/Param[0]",
            format!("packet type '{}' ({}) is not an integer", param.value, param.name),
        )
    })
}

fn instrument_for_packet(packet_type: i64, role: &str) -> Result<u32> {
    let id = match packet_type {
        53..=55 => INSTRUMENT_INTEGRAL,
        97 => INSTRUMENT_SWIFT,
        111 => INSTRUMENT_FERMI_GBM,
        120..=125 | 127 | 128 => INSTRUMENT_FERMI_LAT,
        150..=152 | 163 => match role {
            ROLE_OBSERVATION => INSTRUMENT_LIGO,
            ROLE_TEST => INSTRUMENT_LIGO_TEST,
            _ => return Err(unsupported(packet_type, role)),
        },
        158 => INSTRUMENT_ICECUBE_HESE,
        169 => INSTRUMENT_ICECUBE_EHE,
        173 => INSTRUMENT_ICECUBE_ASTROTRACK_GOLD,
        174 => INSTRUMENT_ICECUBE_ASTROTRACK_BRONZE,
        _ => return Err(unsupported(packet_type, role)),
    };
    Ok(id)
}

fn unsupported(packet_type: i64, role: &str) -> NoticeError {
    NoticeError::UnsupportedPacketType {
        packet_type,
        role: role.to_string(),
    }
}
