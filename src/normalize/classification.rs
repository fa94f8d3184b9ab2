use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{NoticeError, Result};
use crate::parser::Notice;
use crate::types::NetworkTag;

/// Flat source-classification bag, values kept verbatim as reported
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassificationAttributes(pub BTreeMap<String, Value>);

impl ClassificationAttributes {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.0)?)
    }
}

/// Where each output key is read from: `(key, group, param)`; a `None`
/// group means a top-level parameter
const LIGO_FIELDS: &[(&str, Option<&str>, &str)] = &[
    ("BBH", Some("Classification"), "BBH"),
    ("BNS", Some("Classification"), "BNS"),
    ("NSBH", Some("Classification"), "NSBH"),
    ("terrestrial", Some("Classification"), "Terrestrial"),
    ("HasNs", Some("Properties"), "HasNS"),
    ("HasRemnant", Some("Properties"), "HasRemnant"),
    ("far", None, "FAR"),
    ("GraceId", None, "GraceID"),
];

pub fn extract_classification(
    tag: NetworkTag,
    notice: &Notice,
) -> Result<Option<ClassificationAttributes>> {
    if tag != NetworkTag::Ligo {
        return Ok(None);
    }

    let mut attributes = BTreeMap::new();
    for &(key, group, param) in LIGO_FIELDS {
        let value = match group {
            Some(group) => notice.group_param(group, param),
            None => notice.param(param),
        };
        let field = match group {
            Some(group) => format!("{}/{}", group, param),
            None => param.to_string(),
        };
        let value = value.ok_or_else(|| NoticeError::missing(&field))?;
        attributes.insert(key.to_string(), Value::String(value.to_string()));
    }

    // older alerts predate the mass-gap class
    let mass_gap = notice
        .group_param("Classification", "MassGap")
        .map(|v| Value::String(v.to_string()))
        .unwrap_or_else(|| Value::from(0));
    attributes.insert("MassGap".to_string(), mass_gap);

    Ok(Some(ClassificationAttributes(attributes)))
}

/// Location of the probability sky map for networks that publish one
pub fn sky_map_url(tag: NetworkTag, notice: &Notice) -> Result<Option<String>> {
    if tag != NetworkTag::Ligo {
        return Ok(None);
    }
    notice
        .group_param("GW_SKYMAP", "skymap_fits")
        .map(|url| Some(url.trim().to_string()))
        .ok_or_else(|| NoticeError::missing("GW_SKYMAP/skymap_fits"))
}
