//! Unified SQL value type for all database operations
//!
//! This module provides the single value representation shared by
//! parameter binding and result extraction across MySQL, PostgreSQL and
//! SQL Server.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

/// Generic SQL value type for parameter binding and result extraction
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum SqlValue {
    Null,

    Bool(bool),

    // Integer variants (for precise type mapping)
    TinyInt(i8),
    SmallInt(i16),
    Int(i32),
    BigInt(i64),

    // Unsigned integers (MySQL)
    UnsignedTinyInt(u8),
    UnsignedSmallInt(u16),
    UnsignedInt(u32),
    UnsignedBigInt(u64),

    // Floating point
    Float(f32),
    Double(f64),
    Decimal(Decimal),

    String(String),
    Bytes(Vec<u8>),

    // Semantic types
    Uuid(String),     // UUID as string
    Json(JsonValue),  // JSON data
    Date(String),     // ISO date: "2024-01-15"
    Time(String),     // ISO time: "14:30:00" or "14:30:00.123"
    DateTime(String), // ISO datetime: "2024-01-15T10:30:00+00:00"
}

impl SqlValue {
    /// Check if this value is NULL
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    /// Convert to a boolean if possible
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SqlValue::Bool(b) => Some(*b),
            SqlValue::String(s) => match s.to_lowercase().as_str() {
                "true" | "t" | "yes" | "y" | "1" => Some(true),
                "false" | "f" | "no" | "n" | "0" => Some(false),
                _ => None,
            },
            other => other.as_i64().map(|i| i != 0),
        }
    }

    /// Convert to an i64 if possible
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            SqlValue::TinyInt(i) => Some(*i as i64),
            SqlValue::SmallInt(i) => Some(*i as i64),
            SqlValue::Int(i) => Some(*i as i64),
            SqlValue::BigInt(i) => Some(*i),
            SqlValue::UnsignedTinyInt(i) => Some(*i as i64),
            SqlValue::UnsignedSmallInt(i) => Some(*i as i64),
            SqlValue::UnsignedInt(i) => Some(*i as i64),
            SqlValue::UnsignedBigInt(i) => i64::try_from(*i).ok(),
            SqlValue::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    /// Convert to an f64 if possible
    pub fn as_f64(&self) -> Option<f64> {
        use rust_decimal::prelude::ToPrimitive;

        match self {
            SqlValue::Float(f) => Some(*f as f64),
            SqlValue::Double(f) => Some(*f),
            SqlValue::Decimal(d) => d.to_f64(),
            SqlValue::String(s) => s.parse().ok(),
            other => other.as_i64().map(|i| i as f64),
        }
    }

    /// Borrow the text of string-like values
    pub fn as_str(&self) -> Option<&str> {
        match self {
            SqlValue::String(s)
            | SqlValue::Uuid(s)
            | SqlValue::Date(s)
            | SqlValue::Time(s)
            | SqlValue::DateTime(s) => Some(s),
            _ => None,
        }
    }

    /// Convert to JSON value
    pub fn to_json(&self) -> JsonValue {
        match self {
            SqlValue::Null => JsonValue::Null,
            SqlValue::Bool(b) => JsonValue::Bool(*b),
            SqlValue::TinyInt(i) => JsonValue::Number((*i).into()),
            SqlValue::SmallInt(i) => JsonValue::Number((*i).into()),
            SqlValue::Int(i) => JsonValue::Number((*i).into()),
            SqlValue::BigInt(i) => JsonValue::Number((*i).into()),
            SqlValue::UnsignedTinyInt(i) => JsonValue::Number((*i).into()),
            SqlValue::UnsignedSmallInt(i) => JsonValue::Number((*i).into()),
            SqlValue::UnsignedInt(i) => JsonValue::Number((*i).into()),
            SqlValue::UnsignedBigInt(i) => JsonValue::Number((*i).into()),
            SqlValue::Float(f) => serde_json::Number::from_f64(*f as f64)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            SqlValue::Double(f) => serde_json::Number::from_f64(*f)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            SqlValue::Decimal(d) => JsonValue::String(d.to_string()),
            SqlValue::String(s)
            | SqlValue::Uuid(s)
            | SqlValue::Date(s)
            | SqlValue::Time(s)
            | SqlValue::DateTime(s) => JsonValue::String(s.clone()),
            SqlValue::Json(j) => j.clone(),
            SqlValue::Bytes(bytes) => JsonValue::String(base64_encode(bytes)),
        }
    }
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Null => write!(f, "NULL"),
            SqlValue::Bool(b) => write!(f, "{}", b),
            SqlValue::TinyInt(i) => write!(f, "{}", i),
            SqlValue::SmallInt(i) => write!(f, "{}", i),
            SqlValue::Int(i) => write!(f, "{}", i),
            SqlValue::BigInt(i) => write!(f, "{}", i),
            SqlValue::UnsignedTinyInt(i) => write!(f, "{}", i),
            SqlValue::UnsignedSmallInt(i) => write!(f, "{}", i),
            SqlValue::UnsignedInt(i) => write!(f, "{}", i),
            SqlValue::UnsignedBigInt(i) => write!(f, "{}", i),
            SqlValue::Float(fl) => write!(f, "{}", fl),
            SqlValue::Double(d) => write!(f, "{}", d),
            SqlValue::Decimal(d) => write!(f, "{}", d),
            SqlValue::String(s)
            | SqlValue::Uuid(s)
            | SqlValue::Date(s)
            | SqlValue::Time(s)
            | SqlValue::DateTime(s) => write!(f, "{}", s),
            SqlValue::Json(j) => write!(f, "{}", j),
            SqlValue::Bytes(b) => write!(f, "<binary:{} bytes>", b.len()),
        }
    }
}

fn base64_encode(data: &[u8]) -> String {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD.encode(data)
}

// From trait implementations for common types
impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        SqlValue::Bool(v)
    }
}

impl From<i8> for SqlValue {
    fn from(v: i8) -> Self {
        SqlValue::TinyInt(v)
    }
}

impl From<i16> for SqlValue {
    fn from(v: i16) -> Self {
        SqlValue::SmallInt(v)
    }
}

impl From<i32> for SqlValue {
    fn from(v: i32) -> Self {
        SqlValue::Int(v)
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        SqlValue::BigInt(v)
    }
}

impl From<u8> for SqlValue {
    fn from(v: u8) -> Self {
        SqlValue::UnsignedTinyInt(v)
    }
}

impl From<u16> for SqlValue {
    fn from(v: u16) -> Self {
        SqlValue::UnsignedSmallInt(v)
    }
}

impl From<u32> for SqlValue {
    fn from(v: u32) -> Self {
        SqlValue::UnsignedInt(v)
    }
}

impl From<u64> for SqlValue {
    fn from(v: u64) -> Self {
        SqlValue::UnsignedBigInt(v)
    }
}

impl From<f32> for SqlValue {
    fn from(v: f32) -> Self {
        SqlValue::Float(v)
    }
}

impl From<f64> for SqlValue {
    fn from(v: f64) -> Self {
        SqlValue::Double(v)
    }
}

impl From<Decimal> for SqlValue {
    fn from(d: Decimal) -> Self {
        SqlValue::Decimal(d)
    }
}

impl From<String> for SqlValue {
    fn from(s: String) -> Self {
        SqlValue::String(s)
    }
}

impl From<&str> for SqlValue {
    fn from(s: &str) -> Self {
        SqlValue::String(s.to_string())
    }
}

impl From<Vec<u8>> for SqlValue {
    fn from(v: Vec<u8>) -> Self {
        SqlValue::Bytes(v)
    }
}

impl From<JsonValue> for SqlValue {
    fn from(v: JsonValue) -> Self {
        SqlValue::Json(v)
    }
}

impl From<uuid::Uuid> for SqlValue {
    fn from(uuid: uuid::Uuid) -> Self {
        SqlValue::Uuid(uuid.to_string())
    }
}

impl<T> From<Option<T>> for SqlValue
where
    T: Into<SqlValue>,
{
    fn from(v: Option<T>) -> Self {
        match v {
            Some(val) => val.into(),
            None => SqlValue::Null,
        }
    }
}

// Date/Time type conversions
impl From<chrono::DateTime<chrono::Utc>> for SqlValue {
    fn from(dt: chrono::DateTime<chrono::Utc>) -> Self {
        SqlValue::DateTime(dt.to_rfc3339())
    }
}

impl From<chrono::DateTime<chrono::FixedOffset>> for SqlValue {
    fn from(dt: chrono::DateTime<chrono::FixedOffset>) -> Self {
        SqlValue::DateTime(dt.to_rfc3339())
    }
}

impl From<chrono::NaiveDateTime> for SqlValue {
    fn from(dt: chrono::NaiveDateTime) -> Self {
        let utc_dt = chrono::DateTime::<chrono::Utc>::from_naive_utc_and_offset(dt, chrono::Utc);
        SqlValue::DateTime(utc_dt.to_rfc3339())
    }
}

impl From<chrono::NaiveDate> for SqlValue {
    fn from(date: chrono::NaiveDate) -> Self {
        SqlValue::Date(date.to_string())
    }
}

impl From<chrono::NaiveTime> for SqlValue {
    fn from(time: chrono::NaiveTime) -> Self {
        SqlValue::Time(time.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_integer_accessors() {
        assert_eq!(SqlValue::BigInt(1).as_i64(), Some(1));
        assert_eq!(SqlValue::UnsignedBigInt(u64::MAX).as_i64(), None);
        assert_eq!(SqlValue::from("42").as_i64(), Some(42));
        assert_eq!(SqlValue::TinyInt(1).as_bool(), Some(true));
        assert_eq!(SqlValue::Int(3).as_f64(), Some(3.0));
    }

    #[test]
    fn test_option_into_null() {
        let none: Option<i32> = None;
        assert!(SqlValue::from(none).is_null());
        assert_eq!(SqlValue::from(Some(5)), SqlValue::Int(5));
    }

    #[test]
    fn test_to_json() {
        assert_eq!(SqlValue::BigInt(1).to_json(), json!(1));
        assert_eq!(SqlValue::Null.to_json(), json!(null));
        assert_eq!(SqlValue::Bytes(vec![1, 2, 3]).to_json(), json!("AQID"));
        assert_eq!(SqlValue::Double(f64::NAN).to_json(), json!(null));
    }

    #[test]
    fn test_naive_datetime_is_rfc3339_utc() {
        let dt = chrono::NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(10, 30, 0)
            .unwrap();
        assert_eq!(
            SqlValue::from(dt),
            SqlValue::DateTime("2024-01-15T10:30:00+00:00".to_string())
        );
    }
}
