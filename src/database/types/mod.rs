//! Unified type system for database operations
//!
//! This module provides the value, parameter and record types shared by all
//! adapters, and the per-backend converters that translate native driver
//! rows into them.

pub mod converter;
pub mod mysql_converter;
pub mod params;
pub mod postgres_converter;
pub mod sqlserver_converter;
pub mod value;

// Re-export the main types
pub use converter::TypeConverter;
pub use mysql_converter::MySqlTypeConverter;
pub use params::{Params, Record};
pub use postgres_converter::PostgresTypeConverter;
pub use sqlserver_converter::SqlServerTypeConverter;
pub use value::SqlValue;
