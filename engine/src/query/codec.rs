//! Type-preserving value codec
//!
//! JSON loses numeric and temporal type identity, so every non-null
//! [`ScalarValue`] is written as a two-element envelope:
//!
//! ```text
//! ["int64", 9223372036854775807]
//! ["date", "2024-06-15"]
//! ```
//!
//! Decoding never guesses from token shape. A bare scalar, an unknown tag or
//! a literal that does not fit its tag is a [`DecodeError`].

use std::str::FromStr;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use rust_decimal::Decimal;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Number, Value};
use thiserror::Error;
use uuid::Uuid;

use super::value::ScalarValue;

/// Portable type names used as envelope tags
pub mod type_names {
    pub const STRING: &str = "string";
    pub const BOOL: &str = "bool";
    pub const INT32: &str = "int32";
    pub const INT64: &str = "int64";
    pub const DOUBLE: &str = "double";
    pub const DECIMAL: &str = "decimal";
    pub const DATETIME: &str = "datetime";
    pub const DATETIME_OFFSET: &str = "datetimeoffset";
    pub const DATE: &str = "date";
    pub const TIME: &str = "time";
    pub const GUID: &str = "guid";
}

const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";
const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M:%S%.f";

const NAN: &str = "NaN";
const INFINITY: &str = "Infinity";
const NEG_INFINITY: &str = "-Infinity";

/// Errors raised while decoding an envelope
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// A scalar token without a type tag
    #[error("Bare {0} value has no type envelope")]
    BareValue(&'static str),

    /// Anything other than a two-element array
    #[error("Malformed envelope: expected a 2-element array, got {0}")]
    MalformedEnvelope(String),

    #[error("Envelope type tag must be a string, got {0}")]
    NonStringTag(&'static str),

    #[error("Unknown value type: {0}")]
    UnknownType(String),

    /// The literal does not fit the declared type
    #[error("Invalid {type_name} literal: {reason}")]
    TypeMismatch {
        type_name: &'static str,
        reason: String,
    },
}

impl DecodeError {
    fn mismatch(type_name: &'static str, reason: impl Into<String>) -> Self {
        Self::TypeMismatch {
            type_name,
            reason: reason.into(),
        }
    }
}

/// Encode a value into its envelope (`null` for [`ScalarValue::Null`])
pub fn encode(value: &ScalarValue) -> Value {
    let literal = match value {
        ScalarValue::Null => return Value::Null,
        ScalarValue::String(s) => Value::String(s.clone()),
        ScalarValue::Bool(b) => Value::Bool(*b),
        ScalarValue::Int32(n) => Value::from(*n),
        ScalarValue::Int64(n) => Value::from(*n),
        ScalarValue::Double(n) => encode_double(*n),
        ScalarValue::Decimal(d) => Value::String(d.to_string()),
        ScalarValue::DateTime(dt) => Value::String(dt.format(DATETIME_FORMAT).to_string()),
        ScalarValue::DateTimeOffset(dt) => Value::String(format!(
            "{}{}",
            dt.naive_local().format(DATETIME_FORMAT),
            format_offset(dt.offset())
        )),
        ScalarValue::Date(d) => Value::String(d.format(DATE_FORMAT).to_string()),
        ScalarValue::Time(t) => Value::String(t.format(TIME_FORMAT).to_string()),
        ScalarValue::Guid(g) => Value::String(g.hyphenated().to_string()),
    };
    Value::Array(vec![Value::String(value.type_name().to_string()), literal])
}

/// Decode an envelope produced by [`encode`]
pub fn decode(raw: &Value) -> Result<ScalarValue, DecodeError> {
    let items = match raw {
        Value::Null => return Ok(ScalarValue::Null),
        Value::Array(items) if items.len() == 2 => items,
        Value::Array(items) => {
            return Err(DecodeError::MalformedEnvelope(format!(
                "{} elements",
                items.len()
            )));
        }
        Value::Object(_) => {
            return Err(DecodeError::MalformedEnvelope("an object".to_string()));
        }
        other => return Err(DecodeError::BareValue(json_kind(other))),
    };

    let tag = match &items[0] {
        Value::String(tag) => tag.as_str(),
        other => return Err(DecodeError::NonStringTag(json_kind(other))),
    };
    let literal = &items[1];

    match tag {
        type_names::STRING => expect_str(type_names::STRING, literal)
            .map(|s| ScalarValue::String(s.to_string())),
        type_names::BOOL => literal
            .as_bool()
            .map(ScalarValue::Bool)
            .ok_or_else(|| unexpected(type_names::BOOL, literal)),
        type_names::INT32 => {
            let n = literal
                .as_i64()
                .ok_or_else(|| unexpected(type_names::INT32, literal))?;
            i32::try_from(n)
                .map(ScalarValue::Int32)
                .map_err(|_| DecodeError::mismatch(type_names::INT32, format!("{n} is out of range")))
        }
        type_names::INT64 => literal
            .as_i64()
            .map(ScalarValue::Int64)
            .ok_or_else(|| unexpected(type_names::INT64, literal)),
        type_names::DOUBLE => decode_double(literal).map(ScalarValue::Double),
        type_names::DECIMAL => {
            let s = expect_str(type_names::DECIMAL, literal)?;
            Decimal::from_str(s)
                .map(ScalarValue::Decimal)
                .map_err(|e| DecodeError::mismatch(type_names::DECIMAL, e.to_string()))
        }
        type_names::DATETIME => {
            let s = expect_str(type_names::DATETIME, literal)?;
            NaiveDateTime::parse_from_str(s, DATETIME_FORMAT)
                .map(ScalarValue::DateTime)
                .map_err(|e| DecodeError::mismatch(type_names::DATETIME, e.to_string()))
        }
        type_names::DATETIME_OFFSET => {
            let s = expect_str(type_names::DATETIME_OFFSET, literal)?;
            parse_datetime_offset(s).map(ScalarValue::DateTimeOffset)
        }
        type_names::DATE => {
            let s = expect_str(type_names::DATE, literal)?;
            NaiveDate::parse_from_str(s, DATE_FORMAT)
                .map(ScalarValue::Date)
                .map_err(|e| DecodeError::mismatch(type_names::DATE, e.to_string()))
        }
        type_names::TIME => {
            let s = expect_str(type_names::TIME, literal)?;
            NaiveTime::parse_from_str(s, TIME_FORMAT)
                .map(ScalarValue::Time)
                .map_err(|e| DecodeError::mismatch(type_names::TIME, e.to_string()))
        }
        type_names::GUID => {
            let s = expect_str(type_names::GUID, literal)?;
            Uuid::parse_str(s)
                .map(ScalarValue::Guid)
                .map_err(|e| DecodeError::mismatch(type_names::GUID, e.to_string()))
        }
        unknown => Err(DecodeError::UnknownType(unknown.to_string())),
    }
}

/// Encode a value straight to JSON text
pub fn to_json_string(value: &ScalarValue) -> String {
    encode(value).to_string()
}

/// Decode a value from JSON text
///
/// Text that is not valid JSON is reported as a malformed envelope.
pub fn from_json_str(json: &str) -> Result<ScalarValue, DecodeError> {
    let raw: Value = serde_json::from_str(json)
        .map_err(|e| DecodeError::MalformedEnvelope(format!("invalid JSON ({e})")))?;
    decode(&raw)
}

/// `+HH:MM`, or `+HH:MM:SS` when the offset has a seconds component
fn format_offset(offset: &FixedOffset) -> String {
    let total = offset.local_minus_utc();
    let sign = if total < 0 { '-' } else { '+' };
    let total = total.unsigned_abs();
    let (hours, minutes, seconds) = (total / 3600, total / 60 % 60, total % 60);
    if seconds == 0 {
        format!("{sign}{hours:02}:{minutes:02}")
    } else {
        format!("{sign}{hours:02}:{minutes:02}:{seconds:02}")
    }
}

// chrono's offset parser drops seconds, so the offset suffix is split off
// and read here while the local part goes through DATETIME_FORMAT.
fn parse_datetime_offset(s: &str) -> Result<DateTime<FixedOffset>, DecodeError> {
    let mismatch = |reason: &str| DecodeError::mismatch(type_names::DATETIME_OFFSET, reason);

    let time_start = s.find('T').ok_or_else(|| mismatch("missing time component"))?;
    let split = s[time_start..]
        .rfind(['+', '-'])
        .map(|i| time_start + i)
        .ok_or_else(|| mismatch("missing UTC offset"))?;

    let local = NaiveDateTime::parse_from_str(&s[..split], DATETIME_FORMAT)
        .map_err(|e| mismatch(&e.to_string()))?;
    let offset = parse_offset(&s[split..]).ok_or_else(|| mismatch("invalid UTC offset"))?;

    offset
        .from_local_datetime(&local)
        .single()
        .ok_or_else(|| mismatch("out of range"))
}

fn parse_offset(s: &str) -> Option<FixedOffset> {
    let (negative, rest) = match s.split_at_checked(1)? {
        ("+", rest) => (false, rest),
        ("-", rest) => (true, rest),
        _ => return None,
    };

    let mut parts = rest.split(':').map(|part| {
        (part.len() == 2 && part.bytes().all(|b| b.is_ascii_digit()))
            .then(|| part.parse::<i32>().ok())
            .flatten()
    });
    let hours = parts.next()??;
    let minutes = parts.next()??;
    let seconds = match parts.next() {
        Some(part) => part?,
        None => 0,
    };
    if parts.next().is_some() || minutes >= 60 || seconds >= 60 {
        return None;
    }

    let total = hours * 3600 + minutes * 60 + seconds;
    FixedOffset::east_opt(if negative { -total } else { total })
}

fn encode_double(n: f64) -> Value {
    match Number::from_f64(n) {
        Some(number) => Value::Number(number),
        None if n.is_nan() => Value::String(NAN.to_string()),
        None if n.is_sign_positive() => Value::String(INFINITY.to_string()),
        None => Value::String(NEG_INFINITY.to_string()),
    }
}

fn decode_double(literal: &Value) -> Result<f64, DecodeError> {
    match literal {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| unexpected(type_names::DOUBLE, literal)),
        Value::String(s) => match s.as_str() {
            NAN => Ok(f64::NAN),
            INFINITY => Ok(f64::INFINITY),
            NEG_INFINITY => Ok(f64::NEG_INFINITY),
            _ => Err(unexpected(type_names::DOUBLE, literal)),
        },
        _ => Err(unexpected(type_names::DOUBLE, literal)),
    }
}

fn expect_str<'a>(type_name: &'static str, literal: &'a Value) -> Result<&'a str, DecodeError> {
    literal
        .as_str()
        .ok_or_else(|| unexpected(type_name, literal))
}

fn unexpected(type_name: &'static str, literal: &Value) -> DecodeError {
    DecodeError::mismatch(type_name, format!("unexpected {} literal", json_kind(literal)))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl Serialize for ScalarValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        encode(self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ScalarValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Value::deserialize(deserializer)?;
        decode(&raw).map_err(D::Error::custom)
    }
}
