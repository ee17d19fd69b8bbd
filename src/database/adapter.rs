//! Database adapter trait for multi-backend support
//!
//! This module provides a unified interface over the native drivers of each
//! backend, so callers can swap MySQL, PostgreSQL and SQL Server without
//! code changes.

use crate::config::ConnectionConfig;
use crate::database::types::{Params, Record};
use crate::database::Backend;
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::sync::Arc;

/// Result type for statements run through [`DatabaseAdapter::execute`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QueryResult {
    /// Number of rows affected by the statement
    pub rows_affected: u64,
    /// Last inserted ID (MySQL only)
    pub last_insert_id: Option<u64>,
}

/// Unified database adapter trait
///
/// An adapter owns at most one native connection. It starts unconnected;
/// [`connect`] opens the connection and [`disconnect`] releases it.
/// [`execute`] and [`fetch_all`] fail with [`Error::NotConnected`] while no
/// connection is open.
///
/// [`connect`]: DatabaseAdapter::connect
/// [`disconnect`]: DatabaseAdapter::disconnect
/// [`execute`]: DatabaseAdapter::execute
/// [`fetch_all`]: DatabaseAdapter::fetch_all
#[async_trait]
pub trait DatabaseAdapter: Send {
    /// Get the database backend type
    fn backend(&self) -> Backend;

    /// The configuration this adapter was built with
    fn config(&self) -> &ConnectionConfig;

    /// Whether a native connection is currently open
    fn is_connected(&self) -> bool;

    /// Port used to connect: the configured one or the backend default
    fn port(&self) -> u16 {
        self.config().port_or(self.backend().default_port())
    }

    /// Open the native connection
    ///
    /// Connecting while already connected closes the previous connection
    /// first. Driver failures (authentication, network, TLS) are reported
    /// as [`Error::DatabaseConnection`]; nothing is retried.
    async fn connect(&mut self) -> Result<()>;

    /// Close the native connection if there is one
    ///
    /// Never fails: calling it on an unconnected adapter is a no-op, and a
    /// driver error while closing is logged and the connection dropped.
    async fn disconnect(&mut self);

    /// Run a statement that returns no rows
    ///
    /// Each call runs in the connection's autocommit mode and is committed
    /// on success.
    ///
    /// # Arguments
    /// * `query` - The SQL statement, using the backend's placeholder syntax
    /// * `params` - Values bound to the placeholders in insertion order
    async fn execute(&mut self, query: &str, params: Option<&Params>) -> Result<QueryResult>;

    /// Run a statement and collect every row it returns
    ///
    /// Rows keep the backend's natural order and columns keep projection
    /// order. Either the complete result is returned or an error.
    async fn fetch_all(&mut self, query: &str, params: Option<&Params>) -> Result<Vec<Record>>;
}

/// Adapters that can be built from a [`ConnectionConfig`] alone
///
/// Used by [`DatabaseManager::create_with`] to pick the adapter by type.
///
/// [`DatabaseManager::create_with`]: crate::DatabaseManager::create_with
pub trait FromConnectionConfig: DatabaseAdapter + Sized + 'static {
    fn from_config(config: Arc<ConnectionConfig>) -> Self;
}

/// Shared "not connected" error for adapters
pub(crate) fn not_connected(backend: Backend, operation: &str) -> Error {
    Error::not_connected(format!(
        "{} adapter has no open connection; call connect() before {}()",
        backend, operation
    ))
}
