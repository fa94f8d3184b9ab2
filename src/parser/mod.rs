//! VOEvent document parsing
//!
//! Turns raw VOEvent 2.0 bytes into an owned [`Notice`] tree that the
//! normalization steps navigate by structured path. Only the parts of the
//! document the pipeline reads are kept; everything else stays in `raw`.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{NoticeError, Result};

/// A `<Param name=".." value=".."/>` element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub value: String,
}

/// A named `<Group>` of parameters inside `<What>`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamGroup {
    pub name: String,
    pub params: Vec<Param>,
}

impl ParamGroup {
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.value.as_str())
    }
}

/// Raw `Position2D` text as reported; values are parsed on access
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Position2D {
    pub c1: Option<String>,
    pub c2: Option<String>,
    pub error_radius: Option<String>,
}

/// One parsed transient-alert notice
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notice {
    /// Namespaced identity of the notice, unique per publishing network
    pub ivorn: String,
    pub role: String,
    pub author_ivorn: Option<String>,
    pub contact_name: Option<String>,
    pub short_name: Option<String>,
    /// Top-level `What/Param` elements in document order
    pub params: Vec<Param>,
    pub groups: Vec<ParamGroup>,
    pub iso_time: Option<String>,
    pub position: Option<Position2D>,
    /// The original document text
    pub raw: String,
}

impl Notice {
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| NoticeError::malformed("document", format!("not valid UTF-8: {}", e)))?;
        Self::parse_str(text)
    }

    pub fn parse_str(text: &str) -> Result<Self> {
        let doc = roxmltree::Document::parse(text.trim_start())?;
        let root = doc.root_element();

        if root.tag_name().name() != "VOEvent" {
            return Err(NoticeError::UnsupportedNotice(format!(
                "root element is <{}>, expected <VOEvent>",
                root.tag_name().name()
            )));
        }

        let ivorn = root
            .attribute("ivorn")
            .ok_or_else(|| NoticeError::missing("ivorn"))?
            .to_string();
        // VOEvent schema default
        let role = root.attribute("role").unwrap_or("observation").to_string();

        let who = child(root, "Who");
        let author = who.and_then(|w| child(w, "Author"));

        let what = child(root, "What");
        let params = what
            .map(|w| elements(w, "Param").map(param_from).collect())
            .unwrap_or_default();
        let groups = what
            .map(|w| {
                elements(w, "Group")
                    .map(|g| ParamGroup {
                        name: g.attribute("name").unwrap_or_default().to_string(),
                        params: elements(g, "Param").map(param_from).collect(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        let coords = descend(
            root,
            &["WhereWhen", "ObsDataLocation", "ObservationLocation", "AstroCoords"],
        );
        let iso_time = coords
            .and_then(|c| descend(c, &["Time", "TimeInstant", "ISOTime"]))
            .and_then(text_of);
        let position = coords.and_then(|c| child(c, "Position2D")).map(|p| {
            let value = child(p, "Value2");
            Position2D {
                c1: value.and_then(|v| child(v, "C1")).and_then(text_of),
                c2: value.and_then(|v| child(v, "C2")).and_then(text_of),
                error_radius: child(p, "Error2Radius").and_then(text_of),
            }
        });

        let notice = Notice {
            ivorn,
            role,
            author_ivorn: who.and_then(|w| child(w, "AuthorIVORN")).and_then(text_of),
            contact_name: author.and_then(|a| child(a, "contactName")).and_then(text_of),
            short_name: author.and_then(|a| child(a, "shortName")).and_then(text_of),
            params,
            groups,
            iso_time,
            position,
            raw: text.to_string(),
        };

        debug!(
            ivorn = %notice.ivorn,
            params = notice.params.len(),
            groups = notice.groups.len(),
            "parsed notice"
        );
        Ok(notice)
    }

    /// First top-level parameter; carries the packet type on GCN-style feeds
    pub fn first_param(&self) -> Option<&Param> {
        self.params.first()
    }

    /// Top-level parameter by document position
    pub fn param_at(&self, index: usize) -> Option<&Param> {
        self.params.get(index)
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.value.as_str())
    }

    pub fn group(&self, name: &str) -> Option<&ParamGroup> {
        self.groups.iter().find(|g| g.name == name)
    }

    pub fn group_param(&self, group: &str, name: &str) -> Option<&str> {
        self.group(group).and_then(|g| g.param(name))
    }

    /// Reported equatorial position `(ra, dec)` in degrees
    pub fn equatorial_position(&self) -> Result<(f64, f64)> {
        let position = self
            .position
            .as_ref()
            .ok_or_else(|| NoticeError::missing("Position2D"))?;
        let ra = parse_float("Position2D/C1", position.c1.as_deref())?;
        let dec = parse_float("Position2D/C2", position.c2.as_deref())?;
        Ok((ra, dec))
    }

    /// Reported circular error radius in degrees
    pub fn error_radius(&self) -> Result<f64> {
        let position = self
            .position
            .as_ref()
            .ok_or_else(|| NoticeError::missing("Position2D"))?;
        parse_float("Position2D/Error2Radius", position.error_radius.as_deref())
    }
}

fn parse_float(field: &str, raw: Option<&str>) -> Result<f64> {
    let raw = raw.ok_or_else(|| NoticeError::missing(field))?;
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|_| NoticeError::malformed(field, format!("'{}' is not a number", raw)))?;
    if !value.is_finite() {
        return Err(NoticeError::malformed(field, format!("'{}' is not finite", raw)));
    }
    Ok(value)
}

fn param_from(node: roxmltree::Node) -> Param {
    Param {
        name: node.attribute("name").unwrap_or_default().to_string(),
        value: node.attribute("value").unwrap_or_default().to_string(),
    }
}

fn elements<'a, 'input: 'a>(
    node: roxmltree::Node<'a, 'input>,
    name: &'a str,
) -> impl Iterator<Item = roxmltree::Node<'a, 'input>> + 'a {
    node.children()
        .filter(move |c| c.is_element() && c.tag_name().name() == name)
}

fn child<'a, 'input>(node: roxmltree::Node<'a, 'input>, name: &str) -> Option<roxmltree::Node<'a, 'input>> {
    node.children()
        .find(|c| c.is_element() && c.tag_name().name() == name)
}

fn descend<'a, 'input>(
    node: roxmltree::Node<'a, 'input>,
    path: &[&str],
) -> Option<roxmltree::Node<'a, 'input>> {
    path.iter().try_fold(node, |current, name| child(current, name))
}

fn text_of(node: roxmltree::Node) -> Option<String> {
    node.text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}
