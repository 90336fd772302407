//! Bidirectionele conversie tussen attribuutwaarden en hun tekst- en
//! binaire vorm.
//!
//! Elk [`ValueKind`] heeft één canonieke tekstvorm. Vectoren en booleans
//! hebben daarnaast een eigen binaire vorm; alle andere soorten gaan binair
//! als UTF-8 van hun tekstvorm.

use thiserror::Error;
use time::format_description::BorrowedFormatItem;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime};

use super::value::{Color, Uri, Value, ValueKind};
use crate::geom::Vec3;

/// Result type voor waardeconversies.
pub type ConvertResult<T> = Result<T, ConvertError>;

/// Fouten tijdens het converteren van waarden.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConvertError {
    /// Het gevraagde type valt buiten de conversietabel. Dit is een
    /// programmeerfout, geen datafout.
    #[error("niet-ondersteund waardetype `{0}`")]
    Unsupported(String),
    /// De invoer past niet bij het gevraagde type.
    #[error("ongeldige {kind}-waarde `{input}`")]
    Invalid { kind: &'static str, input: String },
    /// De binaire vorm heeft de verkeerde lengte.
    #[error("{kind} verwacht {expected} bytes, kreeg {found}")]
    ByteLength {
        kind: &'static str,
        expected: usize,
        found: usize,
    },
}

impl ConvertError {
    fn invalid(kind: ValueKind, input: &str) -> Self {
        Self::Invalid {
            kind: kind.type_name(),
            input: input.to_owned(),
        }
    }
}

const VECTOR_BYTES: usize = 12;

/// ISO-8601 "sortable" vorm, zonder fracties en zonder offset.
const SORTABLE: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");

/// Vaste referentievorm (maand/dag/jaar) als terugvaloptie bij het lezen.
const REFERENCE: &[BorrowedFormatItem<'static>] = format_description!(
    "[month padding:none]/[day padding:none]/[year] [hour padding:none]:[minute]:[second]"
);

/// Leest de canonieke tekstvorm van `kind`.
pub fn parse(kind: ValueKind, input: &str) -> ConvertResult<Value> {
    match kind {
        ValueKind::String => Ok(Value::Text(input.to_owned())),
        ValueKind::StringList => Ok(Value::TextList(parse_list(input))),
        ValueKind::Vector3 => parse_vector(input)
            .map(Value::Vector)
            .ok_or_else(|| ConvertError::invalid(kind, input)),
        ValueKind::Color => parse_color(input)
            .map(Value::Color)
            .ok_or_else(|| ConvertError::invalid(kind, input)),
        ValueKind::Boolean => parse_boolean(input)
            .map(Value::Boolean)
            .ok_or_else(|| ConvertError::invalid(kind, input)),
        ValueKind::Integer => input
            .trim()
            .parse::<i64>()
            .map(Value::Integer)
            .map_err(|_| ConvertError::invalid(kind, input)),
        ValueKind::Float => input
            .trim()
            .parse::<f32>()
            .map(Value::Float)
            .map_err(|_| ConvertError::invalid(kind, input)),
        ValueKind::Enum(names) => {
            let trimmed = input.trim();
            names
                .iter()
                .find(|name| name.eq_ignore_ascii_case(trimmed))
                .map(|name| Value::Enum(*name))
                .ok_or_else(|| ConvertError::invalid(kind, input))
        }
        ValueKind::Uri => Ok(Uri::parse(input).map_or(Value::Absent, Value::Uri)),
        ValueKind::Timestamp => parse_timestamp(input)
            .map(Value::Timestamp)
            .ok_or_else(|| ConvertError::invalid(kind, input)),
    }
}

/// Schrijft de canonieke tekstvorm van een waarde.
#[must_use]
pub fn format(value: &Value) -> String {
    match value {
        Value::Absent => String::new(),
        Value::Text(text) => text.clone(),
        Value::TextList(items) => items.join(","),
        Value::Vector(v) => format!("{},{},{}", v.x, v.y, v.z),
        Value::Color(color) => color.to_hex(),
        Value::Boolean(flag) => flag.to_string(),
        Value::Integer(number) => number.to_string(),
        Value::Float(number) => number.to_string(),
        Value::Enum(name) => (*name).to_owned(),
        Value::Uri(uri) => uri.as_str().to_owned(),
        Value::Timestamp(stamp) => stamp.format(SORTABLE).unwrap_or_else(|err| {
            log::warn!("tijdstip {stamp} kon niet geformatteerd worden: {err}");
            String::new()
        }),
    }
}

/// Binaire vorm van een waarde.
#[must_use]
pub fn to_bytes(value: &Value) -> Vec<u8> {
    match value {
        Value::Vector(v) => {
            let mut bytes = Vec::with_capacity(VECTOR_BYTES);
            bytes.extend_from_slice(&v.x.to_ne_bytes());
            bytes.extend_from_slice(&v.y.to_ne_bytes());
            bytes.extend_from_slice(&v.z.to_ne_bytes());
            bytes
        }
        Value::Boolean(flag) => vec![u8::from(*flag)],
        other => format(other).into_bytes(),
    }
}

/// Leest de binaire vorm van `kind`.
pub fn from_bytes(kind: ValueKind, bytes: &[u8]) -> ConvertResult<Value> {
    match kind {
        ValueKind::Vector3 => {
            if bytes.len() != VECTOR_BYTES {
                return Err(ConvertError::ByteLength {
                    kind: kind.type_name(),
                    expected: VECTOR_BYTES,
                    found: bytes.len(),
                });
            }
            let component = |offset: usize| {
                let mut raw = [0_u8; 4];
                raw.copy_from_slice(&bytes[offset..offset + 4]);
                f32::from_ne_bytes(raw)
            };
            Ok(Value::Vector(Vec3::new(component(0), component(4), component(8))))
        }
        ValueKind::Boolean => match bytes {
            [byte] => Ok(Value::Boolean(*byte != 0)),
            _ => Err(ConvertError::ByteLength {
                kind: kind.type_name(),
                expected: 1,
                found: bytes.len(),
            }),
        },
        other => {
            let text = std::str::from_utf8(bytes)
                .map_err(|_| ConvertError::invalid(other, &String::from_utf8_lossy(bytes)))?;
            parse(other, text)
        }
    }
}

fn parse_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_owned)
        .collect()
}

fn parse_floats<const N: usize>(input: &str) -> Option<[f32; N]> {
    let mut values = [0.0_f32; N];
    let mut parts = input.split(',');
    for slot in &mut values {
        *slot = parts.next()?.trim().parse().ok()?;
    }
    if parts.next().is_some() {
        return None;
    }
    Some(values)
}

fn parse_vector(input: &str) -> Option<Vec3> {
    parse_floats::<3>(input).map(Vec3::from_array)
}

fn parse_color(input: &str) -> Option<Color> {
    let trimmed = input.trim();
    if let Some(hex) = trimmed.strip_prefix('#') {
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).ok();
        return Some(Color::from_rgb8(channel(0..2)?, channel(2..4)?, channel(4..6)?));
    }
    parse_floats::<3>(trimmed).map(|[r, g, b]| Color::new(r, g, b))
}

fn parse_boolean(input: &str) -> Option<bool> {
    let trimmed = input.trim();
    if trimmed.eq_ignore_ascii_case("true") {
        Some(true)
    } else if trimmed.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

fn parse_timestamp(input: &str) -> Option<PrimitiveDateTime> {
    let trimmed = input.trim();
    if let Ok(stamp) = PrimitiveDateTime::parse(trimmed, SORTABLE) {
        return Some(stamp);
    }
    if let Ok(stamp) = OffsetDateTime::parse(trimmed, &Rfc3339) {
        return Some(PrimitiveDateTime::new(stamp.date(), stamp.time()));
    }
    PrimitiveDateTime::parse(trimmed, REFERENCE).ok()
}
