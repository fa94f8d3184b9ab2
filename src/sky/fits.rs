//! Minimal FITS reader for HEALPix probability maps
//!
//! Walks header-data units until the first `BINTABLE` extension and pulls one
//! floating-point column out of it. Nothing else in the file is interpreted.

use tracing::debug;

use crate::error::{NoticeError, Result};

pub const BLOCK_LEN: usize = 2880;
pub const CARD_LEN: usize = 80;

/// Header keyword/value pairs in file order
#[derive(Debug, Clone, Default)]
pub struct Header {
    cards: Vec<(String, String)>,
}

impl Header {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.cards
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn get_int(&self, key: &str) -> Result<Option<i64>> {
        self.get(key)
            .map(|v| {
                v.parse::<i64>()
                    .map_err(|_| unavailable(format!("header keyword {} is not an integer: '{}'", key, v)))
            })
            .transpose()
    }

    fn require_int(&self, key: &str) -> Result<i64> {
        self.get_int(key)?
            .ok_or_else(|| unavailable(format!("header keyword {} missing", key)))
    }
}

/// One column of a binary table, flattened row-major
#[derive(Debug, Clone)]
pub struct TableColumn {
    pub name: String,
    pub values: Vec<f64>,
    /// Header of the extension the column came from
    pub header: Header,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ValueKind {
    Float32,
    Float64,
    Other,
}

#[derive(Debug, Clone)]
struct ColumnLayout {
    name: String,
    offset: usize,
    repeat: usize,
    kind: ValueKind,
}

/// Read the column named `column` (case-insensitive) from the first binary
/// table, falling back to the table's first column.
pub fn read_bintable_column(bytes: &[u8], column: &str) -> Result<TableColumn> {
    let mut offset = 0;
    loop {
        if offset >= bytes.len() {
            return Err(unavailable("no BINTABLE extension found"));
        }
        let (header, header_len) = read_header(&bytes[offset..])?;
        let data_start = offset + header_len;
        let data_len = data_size(&header)?;

        if header.get("XTENSION") == Some("BINTABLE") {
            return read_column(&header, bytes, data_start, data_len, column);
        }
        offset = data_start + padded(data_len);
    }
}

fn read_column(
    header: &Header,
    bytes: &[u8],
    data_start: usize,
    data_len: usize,
    wanted: &str,
) -> Result<TableColumn> {
    let row_len = header.require_int("NAXIS1")? as usize;
    let rows = header.require_int("NAXIS2")? as usize;
    let columns = layout(header)?;

    let column = columns
        .iter()
        .find(|c| c.name.eq_ignore_ascii_case(wanted))
        .or_else(|| columns.first())
        .ok_or_else(|| unavailable("binary table has no columns"))?;

    let width = match column.kind {
        ValueKind::Float32 => 4,
        ValueKind::Float64 => 8,
        ValueKind::Other => {
            return Err(unavailable(format!(
                "column {} is not a floating-point column",
                column.name
            )))
        }
    };
    if column.offset + column.repeat * width > row_len {
        return Err(unavailable("column extends past the table row"));
    }
    let table_len = row_len * rows;
    if table_len > data_len || data_start + table_len > bytes.len() {
        return Err(unavailable(format!(
            "table data truncated: need {} bytes, have {}",
            table_len,
            bytes.len().saturating_sub(data_start)
        )));
    }

    let mut values = Vec::with_capacity(rows * column.repeat);
    for row in 0..rows {
        let start = data_start + row * row_len + column.offset;
        for chunk in bytes[start..start + column.repeat * width].chunks_exact(width) {
            let value = match column.kind {
                ValueKind::Float32 => f32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]) as f64,
                _ => f64::from_be_bytes([
                    chunk[0], chunk[1], chunk[2], chunk[3], chunk[4], chunk[5], chunk[6], chunk[7],
                ]),
            };
            values.push(value);
        }
    }

    debug!(column = %column.name, rows, repeat = column.repeat, "read binary table column");
    Ok(TableColumn {
        name: column.name.clone(),
        values,
        header: header.clone(),
    })
}

fn layout(header: &Header) -> Result<Vec<ColumnLayout>> {
    let fields = header.require_int("TFIELDS")?;
    let mut offset = 0;
    let mut columns = Vec::with_capacity(fields.max(0) as usize);
    for n in 1..=fields {
        let form = header
            .get(&format!("TFORM{}", n))
            .ok_or_else(|| unavailable(format!("TFORM{} missing", n)))?;
        let (repeat, code) = parse_tform(form)?;
        let kind = match code {
            'E' => ValueKind::Float32,
            'D' => ValueKind::Float64,
            _ => ValueKind::Other,
        };
        let name = header
            .get(&format!("TTYPE{}", n))
            .unwrap_or_default()
            .to_string();
        columns.push(ColumnLayout { name, offset, repeat, kind });
        offset += field_width(repeat, code)?;
    }
    Ok(columns)
}

/// `rTa` table format: optional repeat count followed by the type code
fn parse_tform(form: &str) -> Result<(usize, char)> {
    let form = form.trim();
    let digits: String = form.chars().take_while(|c| c.is_ascii_digit()).collect();
    let code = form[digits.len()..]
        .chars()
        .next()
        .ok_or_else(|| unavailable(format!("invalid TFORM '{}'", form)))?;
    let repeat = if digits.is_empty() {
        1
    } else {
        digits
            .parse()
            .map_err(|_| unavailable(format!("invalid TFORM '{}'", form)))?
    };
    Ok((repeat, code.to_ascii_uppercase()))
}

fn field_width(repeat: usize, code: char) -> Result<usize> {
    let width = match code {
        'X' => return Ok((repeat + 7) / 8),
        'L' | 'B' | 'A' => 1,
        'I' => 2,
        'J' | 'E' => 4,
        'K' | 'D' | 'C' | 'P' => 8,
        'M' | 'Q' => 16,
        other => return Err(unavailable(format!("unknown TFORM type '{}'", other))),
    };
    Ok(repeat * width)
}

/// Parse header cards up to `END`; returns the header and its padded length
fn read_header(bytes: &[u8]) -> Result<(Header, usize)> {
    let mut header = Header::default();
    let mut pos = 0;
    loop {
        if pos + CARD_LEN > bytes.len() {
            return Err(unavailable("header not terminated by END"));
        }
        let card = String::from_utf8_lossy(&bytes[pos..pos + CARD_LEN]);
        pos += CARD_LEN;

        let key = card.get(..8).unwrap_or_default().trim_end();
        if key == "END" {
            break;
        }
        if card.get(8..10) != Some("= ") {
            continue;
        }
        let value = card_value(card.get(10..).unwrap_or_default());
        header.cards.push((key.to_string(), value));
    }
    Ok((header, padded(pos)))
}

fn card_value(raw: &str) -> String {
    let raw = raw.trim_start();
    if let Some(quoted) = raw.strip_prefix('\'') {
        let mut out = String::new();
        let mut chars = quoted.chars().peekable();
        while let Some(c) = chars.next() {
            if c == '\'' {
                if chars.peek() == Some(&'\'') {
                    out.push('\'');
                    chars.next();
                    continue;
                }
                break;
            }
            out.push(c);
        }
        return out.trim_end().to_string();
    }
    raw.split('/').next().unwrap_or_default().trim().to_string()
}

fn data_size(header: &Header) -> Result<usize> {
    let naxis = header.get_int("NAXIS")?.unwrap_or(0);
    if naxis <= 0 {
        return Ok(0);
    }
    let bitpix = header.require_int("BITPIX")?;
    let mut elements: i64 = 1;
    for n in 1..=naxis {
        elements = elements.saturating_mul(header.require_int(&format!("NAXIS{}", n))?);
    }
    let pcount = header.get_int("PCOUNT")?.unwrap_or(0);
    let gcount = header.get_int("GCOUNT")?.unwrap_or(1);
    let bytes = (bitpix.abs() / 8)
        .saturating_mul(gcount)
        .saturating_mul(pcount.saturating_add(elements));
    usize::try_from(bytes).map_err(|_| unavailable("negative data size in header"))
}

fn padded(len: usize) -> usize {
    len.div_ceil(BLOCK_LEN) * BLOCK_LEN
}

fn unavailable(reason: impl Into<String>) -> NoticeError {
    NoticeError::SkyMapUnavailable(format!("FITS: {}", reason.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(text: &str) -> Vec<u8> {
        format!("{:<80}", text).into_bytes()
    }

    fn block(cards: &[&str]) -> Vec<u8> {
        let mut out: Vec<u8> = cards.iter().flat_map(|c| card(c)).collect();
        out.extend(card("END"));
        out.resize(padded(out.len()), b' ');
        out
    }

    fn table(values: &[f64]) -> Vec<u8> {
        let mut out = block(&["SIMPLE  =                    T", "BITPIX  =                    8", "NAXIS   =                    0"]);
        let naxis2 = format!("NAXIS2  = {:>20}", values.len());
        out.extend(block(&[
            "XTENSION= 'BINTABLE'",
            "BITPIX  =                    8",
            "NAXIS   =                    2",
            "NAXIS1  =                   12",
            naxis2.as_str(),
            "PCOUNT  =                    0",
            "GCOUNT  =                    1",
            "TFIELDS =                    2",
            "TTYPE1  = 'FLAG    '",
            "TFORM1  = 'J       '",
            "TTYPE2  = 'PROB    '           / probability",
            "TFORM2  = 'D       '",
            "ORDERING= 'NESTED  '",
        ]));
        let mut data = Vec::new();
        for v in values {
            data.extend(7i32.to_be_bytes());
            data.extend(v.to_be_bytes());
        }
        data.resize(padded(data.len()), 0);
        out.extend(data);
        out
    }

    #[test]
    fn test_reads_named_column_after_other_fields() {
        let bytes = table(&[0.25, 0.5, 0.125]);
        let column = read_bintable_column(&bytes, "prob").unwrap();

        assert_eq!(column.name, "PROB");
        assert_eq!(column.values, vec![0.25, 0.5, 0.125]);
        assert_eq!(column.header.get("ORDERING"), Some("NESTED"));
    }

    #[test]
    fn test_falls_back_to_first_column() {
        let bytes = table(&[1.0]);
        let err = read_bintable_column(&bytes, "MISSING").unwrap_err();
        // first column is an integer column
        assert!(matches!(err, NoticeError::SkyMapUnavailable(_)));
    }

    #[test]
    fn test_truncated_data_is_rejected() {
        let mut bytes = table(&[0.1; 10]);
        bytes.truncate(bytes.len() - BLOCK_LEN);
        assert!(read_bintable_column(&bytes, "PROB").is_err());
    }

    #[test]
    fn test_not_fits() {
        assert!(read_bintable_column(b"PK\x03\x04 definitely not fits", "PROB").is_err());
        assert!(read_bintable_column(&[], "PROB").is_err());
    }

    #[test]
    fn test_card_values() {
        assert_eq!(card_value(" 'O''HARA  '  / name"), "O'HARA");
        assert_eq!(card_value("                   64 / nside"), "64");
        assert_eq!(parse_tform("1024E").unwrap(), (1024, 'E'));
        assert_eq!(parse_tform("D").unwrap(), (1, 'D'));
    }
}
