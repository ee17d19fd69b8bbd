//! PostgreSQL-specific type converter implementation

use super::converter::TypeConverter;
use super::value::SqlValue;
use crate::database::Backend;
use crate::error::{Error, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde_json::Value as JsonValue;
use sqlx::encode::IsNull;
use sqlx::error::BoxDynError;
use sqlx::postgres::types::Oid;
use sqlx::postgres::{PgArgumentBuffer, PgArguments, PgColumn, PgRow, PgTypeInfo};
use sqlx::query::Query;
use sqlx::{Column, Postgres, Row, TypeInfo, ValueRef};

/// NULL parameter declared with OID 0 so the server infers its type
/// from the statement, e.g. the target column of an INSERT
#[derive(Debug, Clone, Copy)]
pub struct UntypedNull;

impl sqlx::Type<Postgres> for UntypedNull {
    fn type_info() -> PgTypeInfo {
        PgTypeInfo::with_oid(Oid(0))
    }
}

impl<'q> sqlx::Encode<'q, Postgres> for UntypedNull {
    fn encode_by_ref(&self, _buf: &mut PgArgumentBuffer) -> std::result::Result<IsNull, BoxDynError> {
        Ok(IsNull::Yes)
    }
}

/// PostgreSQL type converter
#[derive(Clone, Default)]
pub struct PostgresTypeConverter;

impl PostgresTypeConverter {
    pub fn new() -> Self {
        PostgresTypeConverter
    }

    fn get<'r, T>(row: &'r PgRow, index: usize, column: &PgColumn) -> Result<T>
    where
        T: sqlx::Decode<'r, Postgres> + sqlx::Type<Postgres>,
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

    /// Extract a TIMESTAMP/TIMESTAMPTZ value as ISO 8601
    fn extract_timestamp(row: &PgRow, index: usize, column: &PgColumn) -> Result<SqlValue> {
        // TIMESTAMPTZ
        if let Ok(dt) = row.try_get::<DateTime<Utc>, _>(index) {
            return Ok(SqlValue::DateTime(dt.to_rfc3339()));
        }

        // TIMESTAMP
        if let Ok(ndt) = row.try_get::<NaiveDateTime, _>(index) {
            return Ok(SqlValue::from(ndt));
        }

        Err(Error::database_query(format!(
            "Failed to extract timestamp from column '{}' (type: {})",
            column.name(),
            column.type_info().name()
        )))
    }

    /// Bind a SqlValue to a PostgreSQL query
    pub fn bind_param<'q>(
        query: Query<'q, Postgres, PgArguments>,
        value: SqlValue,
    ) -> Query<'q, Postgres, PgArguments> {
        match value {
            SqlValue::Null => query.bind(UntypedNull),
            SqlValue::Bool(b) => query.bind(b),

            // PostgreSQL has no TINYINT, use SMALLINT
            SqlValue::TinyInt(i) => query.bind(i16::from(i)),
            SqlValue::SmallInt(i) => query.bind(i),
            SqlValue::Int(i) => query.bind(i),
            SqlValue::BigInt(i) => query.bind(i),

            // No unsigned types, upcast to the next larger signed type
            SqlValue::UnsignedTinyInt(i) => query.bind(i16::from(i)),
            SqlValue::UnsignedSmallInt(i) => query.bind(i32::from(i)),
            SqlValue::UnsignedInt(i) => query.bind(i64::from(i)),
            SqlValue::UnsignedBigInt(i) => query.bind(Decimal::from(i)),

            SqlValue::Float(f) => query.bind(f),
            SqlValue::Double(f) => query.bind(f),
            SqlValue::Decimal(d) => query.bind(d),

            SqlValue::String(s) => query.bind(s),
            SqlValue::Bytes(b) => query.bind(b),

            SqlValue::Uuid(s) => match sqlx::types::Uuid::parse_str(&s) {
                Ok(uuid) => query.bind(uuid),
                Err(_) => query.bind(s),
            },
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
                if let Ok(dt) = DateTime::parse_from_rfc3339(&s) {
                    query.bind(dt.with_timezone(&Utc))
                } else if let Ok(ndt) = NaiveDateTime::parse_from_str(&s, "%Y-%m-%d %H:%M:%S%.f")
                {
                    query.bind(DateTime::<Utc>::from_naive_utc_and_offset(ndt, Utc))
                } else {
                    query.bind(s)
                }
            }
        }
    }
}

impl TypeConverter for PostgresTypeConverter {
    type Row = PgRow;

    fn backend(&self) -> Backend {
        Backend::PostgreSql
    }

    fn column_names(&self, row: &PgRow) -> Vec<String> {
        row.columns()
            .iter()
            .map(|column| column.name().to_string())
            .collect()
    }

    fn extract_column_value(&self, row: &PgRow, index: usize) -> Result<SqlValue> {
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
            "BOOL" => Ok(SqlValue::Bool(Self::get(row, index, column)?)),
            "\"CHAR\"" | "CHAR" => Ok(SqlValue::TinyInt(Self::get(row, index, column)?)),
            "INT2" => Ok(SqlValue::SmallInt(Self::get(row, index, column)?)),
            "INT4" => Ok(SqlValue::Int(Self::get(row, index, column)?)),
            "INT8" => Ok(SqlValue::BigInt(Self::get(row, index, column)?)),
            "OID" => Ok(SqlValue::UnsignedInt(
                Self::get::<sqlx::postgres::types::Oid>(row, index, column)?.0,
            )),
            "FLOAT4" => Ok(SqlValue::Float(Self::get(row, index, column)?)),
            "FLOAT8" => Ok(SqlValue::Double(Self::get(row, index, column)?)),
            "NUMERIC" => Ok(SqlValue::Decimal(Self::get::<Decimal>(row, index, column)?)),
            "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" | "CITEXT" | "UNKNOWN" => {
                Ok(SqlValue::String(Self::get(row, index, column)?))
            }
            "JSON" | "JSONB" => Ok(SqlValue::Json(Self::get::<JsonValue>(row, index, column)?)),
            "TIMESTAMP" | "TIMESTAMPTZ" => Self::extract_timestamp(row, index, column),
            "DATE" => Ok(SqlValue::from(Self::get::<NaiveDate>(row, index, column)?)),
            "TIME" => Ok(SqlValue::from(Self::get::<NaiveTime>(row, index, column)?)),
            "UUID" => Ok(SqlValue::from(Self::get::<sqlx::types::Uuid>(row, index, column)?)),
            "BYTEA" => Ok(SqlValue::Bytes(Self::get(row, index, column)?)),
            _ => {
                // Enums and other text-encoded user types
                if let Ok(s) = row.try_get_unchecked::<String, _>(index) {
                    log::warn!(
                        "Unknown PostgreSQL type '{}' for column '{}', decoded as text",
                        type_name,
                        column.name()
                    );
                    Ok(SqlValue::String(s))
                } else {
                    Err(Error::database_query(format!(
                        "Unsupported PostgreSQL type '{}' for column '{}'",
                        type_name,
                        column.name()
                    )))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::Encode;

    #[test]
    fn test_null_parameter_is_unspecified() {
        let type_info = <UntypedNull as sqlx::Type<Postgres>>::type_info();
        assert_eq!(type_info.oid(), Some(Oid(0)));

        let mut buf = PgArgumentBuffer::default();
        assert!(matches!(UntypedNull.encode_by_ref(&mut buf), Ok(IsNull::Yes)));
    }

    #[test]
    fn test_bind_null_and_values() {
        let query = sqlx::query::<Postgres>("INSERT INTO t (a, b, c) VALUES ($1, $2, $3)");
        let query = PostgresTypeConverter::bind_param(query, SqlValue::from(None::<i32>));
        let query = PostgresTypeConverter::bind_param(query, SqlValue::Int(7));
        let _query = PostgresTypeConverter::bind_param(query, SqlValue::Null);
    }
}
