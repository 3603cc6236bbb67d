//! Scalar filter values
//!
//! A closed set of value kinds a filter can compare against. Serialization
//! goes through the envelope codec in [`super::codec`], so the kind survives
//! a JSON round trip.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use uuid::Uuid;

use super::codec::type_names;

/// A loosely typed filter value with an explicit kind
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ScalarValue {
    #[default]
    Null,
    String(String),
    Bool(bool),
    Int32(i32),
    Int64(i64),
    Double(f64),
    Decimal(Decimal),
    /// Date and time without an offset
    DateTime(NaiveDateTime),
    /// Date and time with the offset it was recorded in
    DateTimeOffset(DateTime<FixedOffset>),
    Date(NaiveDate),
    Time(NaiveTime),
    Guid(Uuid),
}

impl ScalarValue {
    /// Portable type name used as the envelope tag (`"null"` for Null)
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::String(_) => type_names::STRING,
            Self::Bool(_) => type_names::BOOL,
            Self::Int32(_) => type_names::INT32,
            Self::Int64(_) => type_names::INT64,
            Self::Double(_) => type_names::DOUBLE,
            Self::Decimal(_) => type_names::DECIMAL,
            Self::DateTime(_) => type_names::DATETIME,
            Self::DateTimeOffset(_) => type_names::DATETIME_OFFSET,
            Self::Date(_) => type_names::DATE,
            Self::Time(_) => type_names::TIME,
            Self::Guid(_) => type_names::GUID,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

macro_rules! impl_from_scalar {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for ScalarValue {
                fn from(value: $ty) -> Self {
                    Self::$variant(value)
                }
            }
        )*
    };
}

impl_from_scalar! {
    String => String,
    bool => Bool,
    i32 => Int32,
    i64 => Int64,
    f64 => Double,
    Decimal => Decimal,
    NaiveDateTime => DateTime,
    DateTime<FixedOffset> => DateTimeOffset,
    NaiveDate => Date,
    NaiveTime => Time,
    Uuid => Guid,
}

impl From<&str> for ScalarValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl<T: Into<ScalarValue>> From<Option<T>> for ScalarValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}
