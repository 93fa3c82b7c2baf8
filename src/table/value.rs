// src/table/value.rs

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Serialize, Serializer};

/// Date-only rendering, used when every timestamp of a column sits on midnight.
pub const DATE_FORMAT: &str = "%Y-%m-%d";
/// Full rendering; fractional seconds only appear when present.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// A single cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
    Timestamp(NaiveDateTime),
}

/// One record, positionally aligned to the header.
pub type Row = Vec<Value>;

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Numeric view of the cell; `None` for anything that is not a finite number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Float(v) if v.is_finite() => Some(*v),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        match self {
            Value::Timestamp(ts) => Some(*ts),
            _ => None,
        }
    }

    /// NaN and infinities are the "missing" marker of numeric sources.
    pub(crate) fn normalized(self) -> Self {
        match self {
            Value::Float(v) if !v.is_finite() => Value::Null,
            other => other,
        }
    }
}

/// Shortest round-trip form, always with a fractional part for integral values.
pub fn format_float(v: f64) -> String {
    format!("{:?}", v)
}

pub fn format_timestamp(ts: &NaiveDateTime, date_only: bool) -> String {
    if date_only {
        ts.format(DATE_FORMAT).to_string()
    } else {
        ts.format(DATETIME_FORMAT).to_string()
    }
}

pub(crate) fn is_midnight(ts: &NaiveDateTime) -> bool {
    ts.time() == chrono::NaiveTime::MIN
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Int(v) => serializer.serialize_i64(*v),
            Value::Float(v) if v.is_finite() => serializer.serialize_f64(*v),
            Value::Float(_) => serializer.serialize_unit(),
            Value::Text(s) => serializer.serialize_str(s),
            Value::Timestamp(ts) => serializer.collect_str(&ts.format(DATETIME_FORMAT)),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::Timestamp(v)
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Timestamp(v.and_time(chrono::NaiveTime::MIN))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}
