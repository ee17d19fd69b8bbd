//! Multi-backend database support for RustF DB
//!
//! This module provides the adapter trait shared by every backend, the
//! adapters for MySQL, PostgreSQL and SQL Server, and the unified value
//! types used for parameters and result rows.

pub mod adapter;
pub mod adapters;
pub mod backend;
pub mod types;

// Re-export main types for convenience
pub use adapter::{DatabaseAdapter, FromConnectionConfig, QueryResult};
pub use adapters::{MySqlAdapter, PostgresAdapter, SqlServerAdapter};
pub use backend::Backend;
pub use types::{Params, Record, SqlValue};
