//! MySQL-specific type converter implementation

use super::converter::TypeConverter;
use super::value::SqlValue;
use crate::database::Backend;
use crate::error::{Error, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde_json::Value as JsonValue;
use sqlx::mysql::{MySqlArguments, MySqlColumn, MySqlRow};
use sqlx::query::Query;
use sqlx::{Column, MySql, Row, TypeInfo, ValueRef};

/// MySQL type converter
#[derive(Clone, Default)]
pub struct MySqlTypeConverter;

impl MySqlTypeConverter {
    pub fn new() -> Self {
        MySqlTypeConverter
    }

    fn get<'r, T>(row: &'r MySqlRow, index: usize, column: &MySqlColumn) -> Result<T>
    where
        T: sqlx::Decode<'r, MySql> + sqlx::Type<MySql>,
    {
        row.try_get::<T, _>(index).map_err(|e| {
            Error::database_query(format!(
                "Failed to extract column '{}' ({}): {}",
                column.name(),
                column.type_info().name(),
                e
            ))
        })
    }

    /// Extract a TINYINT value (TINYINT(1) may be reported as BOOLEAN)
    fn extract_tinyint(row: &MySqlRow, index: usize, column: &MySqlColumn) -> Result<SqlValue> {
        if let Ok(val) = row.try_get::<i8, _>(index) {
            return Ok(SqlValue::TinyInt(val));
        }

        if let Ok(val) = row.try_get::<bool, _>(index) {
            log::trace!("TINYINT at index {} extracted as bool: {}", index, val);
            return Ok(SqlValue::TinyInt(i8::from(val)));
        }

        Err(Error::database_query(format!(
            "Failed to extract TINYINT from column '{}'",
            column.name()
        )))
    }

    /// Extract a DATETIME/TIMESTAMP value as ISO 8601
    fn extract_datetime(row: &MySqlRow, index: usize, column: &MySqlColumn) -> Result<SqlValue> {
        // TIMESTAMP columns decode as DateTime<Utc>, DATETIME as NaiveDateTime
        if let Ok(dt) = row.try_get::<DateTime<Utc>, _>(index) {
            return Ok(SqlValue::DateTime(dt.to_rfc3339()));
        }

        if let Ok(dt) = row.try_get::<NaiveDateTime, _>(index) {
            return Ok(SqlValue::from(dt));
        }

        if let Ok(s) = row.try_get_unchecked::<String, _>(index) {
            log::trace!(
                "Datetime column '{}' kept as text: {}",
                column.name(),
                s
            );
            return Ok(SqlValue::DateTime(s));
        }

        Err(Error::database_query(format!(
            "Failed to extract datetime from column '{}' (MySQL type: '{}')",
            column.name(),
            column.type_info().name()
        )))
    }

    /// Extract a TIME value; durations outside 00:00-24:00 stay textual
    fn extract_time(row: &MySqlRow, index: usize, column: &MySqlColumn) -> Result<SqlValue> {
        if let Ok(time) = row.try_get::<NaiveTime, _>(index) {
            return Ok(SqlValue::from(time));
        }

        if let Ok(s) = row.try_get_unchecked::<String, _>(index) {
            return Ok(SqlValue::Time(s));
        }

        Err(Error::database_query(format!(
            "Failed to extract time from column '{}'",
            column.name()
        )))
    }

    fn extract_year(row: &MySqlRow, index: usize, column: &MySqlColumn) -> Result<SqlValue> {
        if let Ok(year) = row.try_get::<u16, _>(index) {
            return Ok(SqlValue::UnsignedSmallInt(year));
        }

        if let Ok(year) = row.try_get_unchecked::<String, _>(index) {
            if let Ok(year) = year.parse::<u16>() {
                return Ok(SqlValue::UnsignedSmallInt(year));
            }
        }

        Err(Error::database_query(format!(
            "Failed to extract year from column '{}'",
            column.name()
        )))
    }

    /// Extract a BIT(n) value as an unsigned integer (big-endian bytes)
    fn extract_bit(row: &MySqlRow, index: usize, column: &MySqlColumn) -> Result<SqlValue> {
        if let Ok(val) = row.try_get::<u64, _>(index) {
            return Ok(SqlValue::UnsignedBigInt(val));
        }

        let bytes = row.try_get_unchecked::<Vec<u8>, _>(index).map_err(|e| {
            Error::database_query(format!(
                "Failed to extract BIT from column '{}': {}",
                column.name(),
                e
            ))
        })?;
        let val = bytes
            .iter()
            .rev()
            .take(8)
            .enumerate()
            .fold(0u64, |acc, (i, &byte)| acc | (u64::from(byte) << (i * 8)));
        Ok(SqlValue::UnsignedBigInt(val))
    }

    /// Bind a SqlValue to a MySQL query
    pub fn bind_param<'q>(
        query: Query<'q, MySql, MySqlArguments>,
        value: SqlValue,
    ) -> Query<'q, MySql, MySqlArguments> {
        match value {
            SqlValue::Null => query.bind(None::<String>), // MySQL accepts NULL for any type
            SqlValue::Bool(b) => query.bind(b),

            SqlValue::TinyInt(i) => query.bind(i),
            SqlValue::SmallInt(i) => query.bind(i),
            SqlValue::Int(i) => query.bind(i),
            SqlValue::BigInt(i) => query.bind(i),

            // MySQL supports unsigned types natively
            SqlValue::UnsignedTinyInt(i) => query.bind(i),
            SqlValue::UnsignedSmallInt(i) => query.bind(i),
            SqlValue::UnsignedInt(i) => query.bind(i),
            SqlValue::UnsignedBigInt(i) => query.bind(i),

            SqlValue::Float(f) => query.bind(f),
            SqlValue::Double(f) => query.bind(f),
            SqlValue::Decimal(d) => query.bind(d),

            SqlValue::String(s) => query.bind(s),
            SqlValue::Bytes(b) => query.bind(b),

            SqlValue::Uuid(s) => query.bind(s), // MySQL stores UUID as CHAR(36)
            SqlValue::Json(j) => query.bind(j),
            SqlValue::Date(s) => match NaiveDate::parse_from_str(&s, "%Y-%m-%d") {
                Ok(date) => query.bind(date),
                Err(_) => query.bind(s),
            },
            SqlValue::Time(s) => match NaiveTime::parse_from_str(&s, "%H:%M:%S%.f") {
                Ok(time) => query.bind(time),
                Err(_) => query.bind(s),
            },
            SqlValue::DateTime(s) => {
                // MySQL DATETIME has no timezone, store as UTC
                if let Ok(dt) = DateTime::parse_from_rfc3339(&s) {
                    query.bind(dt.naive_utc())
                } else if let Ok(ndt) = NaiveDateTime::parse_from_str(&s, "%Y-%m-%d %H:%M:%S%.f")
                {
                    query.bind(ndt)
                } else {
                    query.bind(s)
                }
            }
        }
    }
}

impl TypeConverter for MySqlTypeConverter {
    type Row = MySqlRow;

    fn backend(&self) -> Backend {
        Backend::MySql
    }

    fn column_names(&self, row: &MySqlRow) -> Vec<String> {
        row.columns()
            .iter()
            .map(|column| column.name().to_string())
            .collect()
    }

    fn extract_column_value(&self, row: &MySqlRow, index: usize) -> Result<SqlValue> {
        let column = row.columns().get(index).ok_or_else(|| {
            Error::database_query(format!("Column index {} out of bounds", index))
        })?;

        let raw = row.try_get_raw(index).map_err(|e| {
            Error::database_query(format!("Failed to get raw value at column {}: {}", index, e))
        })?;
        if raw.is_null() {
            return Ok(SqlValue::Null);
        }

        let type_name = column.type_info().name();

        match type_name {
            "BOOLEAN" | "BOOL" | "TINYINT" => Self::extract_tinyint(row, index, column),
            "SMALLINT" => Ok(SqlValue::SmallInt(Self::get(row, index, column)?)),
            "MEDIUMINT" | "INT" | "INTEGER" => Ok(SqlValue::Int(Self::get(row, index, column)?)),
            "BIGINT" => Ok(SqlValue::BigInt(Self::get(row, index, column)?)),
            "TINYINT UNSIGNED" => Ok(SqlValue::UnsignedTinyInt(Self::get(row, index, column)?)),
            "SMALLINT UNSIGNED" => Ok(SqlValue::UnsignedSmallInt(Self::get(row, index, column)?)),
            "MEDIUMINT UNSIGNED" | "INT UNSIGNED" => {
                Ok(SqlValue::UnsignedInt(Self::get(row, index, column)?))
            }
            "BIGINT UNSIGNED" => Ok(SqlValue::UnsignedBigInt(Self::get(row, index, column)?)),
            "BIT" => Self::extract_bit(row, index, column),
            "FLOAT" => Ok(SqlValue::Float(Self::get(row, index, column)?)),
            "DOUBLE" | "REAL" => Ok(SqlValue::Double(Self::get(row, index, column)?)),
            "DECIMAL" | "NUMERIC" => Ok(SqlValue::Decimal(Self::get::<Decimal>(row, index, column)?)),
            "VARCHAR" | "CHAR" | "TEXT" | "TINYTEXT" | "MEDIUMTEXT" | "LONGTEXT" | "ENUM"
            | "SET" => Ok(SqlValue::String(Self::get(row, index, column)?)),
            "JSON" => Ok(SqlValue::Json(Self::get::<JsonValue>(row, index, column)?)),
            "DATE" => Ok(SqlValue::from(Self::get::<NaiveDate>(row, index, column)?)),
            "TIME" => Self::extract_time(row, index, column),
            "DATETIME" | "TIMESTAMP" => Self::extract_datetime(row, index, column),
            "YEAR" => Self::extract_year(row, index, column),
            "BINARY" | "VARBINARY" | "BLOB" | "TINYBLOB" | "MEDIUMBLOB" | "LONGBLOB" => {
                Ok(SqlValue::Bytes(Self::get(row, index, column)?))
            }
            _ => {
                // Unknown types are surfaced as text rather than dropped
                if let Ok(s) = row.try_get_unchecked::<String, _>(index) {
                    log::warn!(
                        "Unknown MySQL type '{}' for column '{}', decoded as text",
                        type_name,
                        column.name()
                    );
                    Ok(SqlValue::String(s))
                } else {
                    Err(Error::database_query(format!(
                        "Unsupported MySQL type '{}' for column '{}'",
                        type_name,
                        column.name()
                    )))
                }
            }
        }
    }
}
