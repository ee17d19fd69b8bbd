//! RustF DB - one interface over MySQL, PostgreSQL and SQL Server
//!
//! RustF DB wraps the native driver of each backend behind the
//! [`DatabaseAdapter`] trait and exposes them through a single façade:
//! - [`ConnectionConfig`] holds host, user, password, database and port
//! - [`DatabaseManager`] owns one adapter and forwards every call to it
//! - [`BlockingDatabaseManager`] offers the same operations synchronously
//!
//! # Usage
//! ```no_run
//! use rustf_db::{ConnectionConfig, DatabaseManager, Params};
//!
//! # async fn run() -> rustf_db::Result<()> {
//! let config = ConnectionConfig::new("localhost", "app", "secret", "shop");
//! let mut db = DatabaseManager::create_named("mysql", config)?;
//!
//! db.connect().await?;
//! db.execute(
//!     "INSERT INTO users (name) VALUES (?)",
//!     Some(&Params::new().bind("name", "Ada")),
//! )
//! .await?;
//! let rows = db.fetch_all("SELECT id, name FROM users", None).await?;
//! db.disconnect().await;
//! # Ok(())
//! # }
//! ```

// Enforce error handling best practices
#![cfg_attr(
    not(test),
    warn(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::unimplemented,
        clippy::todo,
    )
)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used,))]

pub mod blocking;
pub mod config;
pub mod database;
pub mod error;
pub mod manager;

// Re-export main types for public API
pub use blocking::BlockingDatabaseManager;
pub use config::{
    set_source, source, ConnectionConfig, CredentialSource, DatabaseSettings,
    PartialConnectionConfig,
};
pub use database::{
    Backend, DatabaseAdapter, FromConnectionConfig, MySqlAdapter, Params, PostgresAdapter,
    QueryResult, Record, SqlServerAdapter, SqlValue,
};
pub use error::{Error, Result};
pub use manager::DatabaseManager;

/// Prelude module for common imports
pub mod prelude {
    pub use crate::blocking::BlockingDatabaseManager;
    pub use crate::config::{ConnectionConfig, CredentialSource};
    pub use crate::database::{Backend, DatabaseAdapter, Params, Record, SqlValue};
    pub use crate::error::{Error, Result};
    pub use crate::manager::DatabaseManager;
}
