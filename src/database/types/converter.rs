//! Type conversion trait
//!
//! Each backend implements [`TypeConverter`] for its native row type, so
//! the adapters can turn driver rows into uniform [`Record`]s.

use super::params::Record;
use super::value::SqlValue;
use crate::database::Backend;
use crate::error::Result;

/// Trait for backend-specific row conversion
pub trait TypeConverter: Send + Sync {
    /// Native row type produced by the driver
    type Row;

    /// Get the database backend this converter is for
    fn backend(&self) -> Backend;

    /// Column names of `row`, in projection order
    fn column_names(&self, row: &Self::Row) -> Vec<String>;

    /// Extract one column value and convert it to a [`SqlValue`]
    fn extract_column_value(&self, row: &Self::Row, index: usize) -> Result<SqlValue>;

    /// Convert a whole row, preserving projection order
    fn row_to_record(&self, row: &Self::Row) -> Result<Record> {
        let names = self.column_names(row);
        let mut record = Record::with_capacity(names.len());
        for (index, name) in names.into_iter().enumerate() {
            let value = self.extract_column_value(row, index)?;
            record.insert(name, value);
        }
        Ok(record)
    }
}
