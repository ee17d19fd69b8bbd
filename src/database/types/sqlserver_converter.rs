//! SQL Server-specific type converter implementation

use super::converter::TypeConverter;
use super::value::SqlValue;
use crate::database::Backend;
use crate::error::{Error, Result};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use tiberius::numeric::Numeric;
use tiberius::xml::XmlData;
use tiberius::{ColumnType, FromSql, Query, Row, Uuid};

/// SQL Server type converter
#[derive(Clone, Default)]
pub struct SqlServerTypeConverter;

impl SqlServerTypeConverter {
    pub fn new() -> Self {
        SqlServerTypeConverter
    }

    /// Typed column access; `Ok(None)` is a SQL NULL
    fn get<'a, T>(row: &'a Row, index: usize) -> Result<Option<T>>
    where
        T: FromSql<'a>,
    {
        row.try_get::<T, usize>(index).map_err(|e| {
            let name = row
                .columns()
                .get(index)
                .map(|column| column.name())
                .unwrap_or_default();
            Error::database_query(format!("Failed to extract column '{}': {}", name, e))
        })
    }

    /// INTN/FLTN columns carry their width in the data, not the column type
    fn extract_intn(row: &Row, index: usize) -> Result<Option<SqlValue>> {
        if let Ok(v) = row.try_get::<i32, usize>(index) {
            return Ok(v.map(SqlValue::Int));
        }
        if let Ok(v) = row.try_get::<i64, usize>(index) {
            return Ok(v.map(SqlValue::BigInt));
        }
        if let Ok(v) = row.try_get::<i16, usize>(index) {
            return Ok(v.map(SqlValue::SmallInt));
        }
        Ok(Self::get::<u8>(row, index)?.map(SqlValue::UnsignedTinyInt))
    }

    fn extract_floatn(row: &Row, index: usize) -> Result<Option<SqlValue>> {
        if let Ok(v) = row.try_get::<f64, usize>(index) {
            return Ok(v.map(SqlValue::Double));
        }
        Ok(Self::get::<f32>(row, index)?.map(SqlValue::Float))
    }

    /// NUMERIC parameter carrying the exact mantissa and scale of `value`
    pub fn numeric(value: Decimal) -> Numeric {
        // rust_decimal caps the scale at 28, NUMERIC at 38
        Numeric::new_with_scale(value.mantissa(), value.scale() as u8)
    }

    /// Bind a SqlValue to a SQL Server query (`@P1`, `@P2`, ... in order)
    pub fn bind_param(query: &mut Query<'_>, value: SqlValue) {
        match value {
            SqlValue::Null => query.bind(Option::<String>::None),
            SqlValue::Bool(b) => query.bind(b),

            // TINYINT is unsigned in SQL Server
            SqlValue::TinyInt(i) => query.bind(i16::from(i)),
            SqlValue::SmallInt(i) => query.bind(i),
            SqlValue::Int(i) => query.bind(i),
            SqlValue::BigInt(i) => query.bind(i),

            SqlValue::UnsignedTinyInt(i) => query.bind(i),
            SqlValue::UnsignedSmallInt(i) => query.bind(i32::from(i)),
            SqlValue::UnsignedInt(i) => query.bind(i64::from(i)),
            SqlValue::UnsignedBigInt(i) => query.bind(Numeric::new_with_scale(i128::from(i), 0)),

            SqlValue::Float(f) => query.bind(f),
            SqlValue::Double(f) => query.bind(f),
            SqlValue::Decimal(d) => query.bind(Self::numeric(d)),

            SqlValue::String(s) => query.bind(s),
            SqlValue::Bytes(b) => query.bind(b),

            SqlValue::Uuid(s) => match Uuid::parse_str(&s) {
                Ok(uuid) => query.bind(uuid),
                Err(_) => query.bind(s),
            },
            // No native JSON type, stored as NVARCHAR
            SqlValue::Json(j) => query.bind(j.to_string()),
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
                    query.bind(dt)
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

impl TypeConverter for SqlServerTypeConverter {
    type Row = Row;

    fn backend(&self) -> Backend {
        Backend::SqlServer
    }

    fn column_names(&self, row: &Row) -> Vec<String> {
        row.columns()
            .iter()
            .map(|column| column.name().to_string())
            .collect()
    }

    fn extract_column_value(&self, row: &Row, index: usize) -> Result<SqlValue> {
        let column = row.columns().get(index).ok_or_else(|| {
            Error::database_query(format!("Column index {} out of bounds", index))
        })?;

        let value = match column.column_type() {
            ColumnType::Null => None,
            ColumnType::Bit | ColumnType::Bitn => Self::get::<bool>(row, index)?.map(SqlValue::Bool),
            ColumnType::Int1 => Self::get::<u8>(row, index)?.map(SqlValue::UnsignedTinyInt),
            ColumnType::Int2 => Self::get::<i16>(row, index)?.map(SqlValue::SmallInt),
            ColumnType::Int4 => Self::get::<i32>(row, index)?.map(SqlValue::Int),
            ColumnType::Int8 => Self::get::<i64>(row, index)?.map(SqlValue::BigInt),
            ColumnType::Intn => Self::extract_intn(row, index)?,
            ColumnType::Float4 => Self::get::<f32>(row, index)?.map(SqlValue::Float),
            ColumnType::Float8 | ColumnType::Money | ColumnType::Money4 => {
                Self::get::<f64>(row, index)?.map(SqlValue::Double)
            }
            ColumnType::Floatn => Self::extract_floatn(row, index)?,
            ColumnType::Decimaln | ColumnType::Numericn => {
                Self::get::<Decimal>(row, index)?.map(SqlValue::Decimal)
            }
            ColumnType::Datetime
            | ColumnType::Datetime4
            | ColumnType::Datetimen
            | ColumnType::Datetime2 => Self::get::<NaiveDateTime>(row, index)?.map(SqlValue::from),
            ColumnType::Daten => Self::get::<NaiveDate>(row, index)?.map(SqlValue::from),
            ColumnType::Timen => Self::get::<NaiveTime>(row, index)?.map(SqlValue::from),
            ColumnType::DatetimeOffsetn => {
                Self::get::<DateTime<FixedOffset>>(row, index)?.map(SqlValue::from)
            }
            ColumnType::Guid => Self::get::<Uuid>(row, index)?.map(SqlValue::from),
            ColumnType::BigVarChar
            | ColumnType::BigChar
            | ColumnType::NVarchar
            | ColumnType::NChar
            | ColumnType::Text
            | ColumnType::NText => Self::get::<&str>(row, index)?.map(SqlValue::from),
            ColumnType::BigVarBin | ColumnType::BigBinary | ColumnType::Image => {
                Self::get::<&[u8]>(row, index)?.map(|bytes| SqlValue::Bytes(bytes.to_vec()))
            }
            ColumnType::Xml => Self::get::<&XmlData>(row, index)?
                .map(|xml| SqlValue::String(xml.clone().into_string())),
            other => {
                return Err(Error::database_query(format!(
                    "Unsupported SQL Server type {:?} for column '{}'",
                    other,
                    column.name()
                )))
            }
        };

        Ok(value.unwrap_or(SqlValue::Null))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_decimal_keeps_mantissa_and_scale() {
        let numeric = SqlServerTypeConverter::numeric(Decimal::from_str("-1234.5678").unwrap());
        assert_eq!(numeric.value(), -12345678);
        assert_eq!(numeric.scale(), 4);

        let numeric = SqlServerTypeConverter::numeric(Decimal::from(42u64));
        assert_eq!(numeric.value(), 42);
        assert_eq!(numeric.scale(), 0);
    }

    #[test]
    fn test_bind_numeric_values() {
        let mut query = Query::new("SELECT @P1, @P2, @P3");
        SqlServerTypeConverter::bind_param(&mut query, SqlValue::Decimal(Decimal::new(31415, 4)));
        SqlServerTypeConverter::bind_param(&mut query, SqlValue::UnsignedBigInt(u64::MAX));
        SqlServerTypeConverter::bind_param(&mut query, SqlValue::Null);
    }
}
