//! Synchronous database manager
//!
//! [`BlockingDatabaseManager`] drives a [`DatabaseManager`] on a private
//! current-thread tokio runtime, blocking the caller until each operation
//! completes. It must not be used from inside an async runtime.

use crate::config::{ConnectionConfig, DatabaseSettings};
use crate::database::adapter::{FromConnectionConfig, QueryResult};
use crate::database::{Backend, Params, Record};
use crate::error::Result;
use crate::manager::DatabaseManager;
use tokio::runtime::{Builder, Runtime};

/// Blocking façade over a single database adapter
pub struct BlockingDatabaseManager {
    inner: DatabaseManager,
    runtime: Runtime,
}

impl BlockingDatabaseManager {
    /// Drive `manager` on a new current-thread runtime
    pub fn new(manager: DatabaseManager) -> Result<Self> {
        let runtime = Builder::new_current_thread().enable_all().build()?;
        Ok(Self {
            inner: manager,
            runtime,
        })
    }

    pub fn create(backend: Backend, config: ConnectionConfig) -> Result<Self> {
        Self::new(DatabaseManager::create(backend, config))
    }

    pub fn create_named(db_type: &str, config: ConnectionConfig) -> Result<Self> {
        Self::new(DatabaseManager::create_named(db_type, config)?)
    }

    pub fn create_with<A: FromConnectionConfig>(config: ConnectionConfig) -> Result<Self> {
        Self::new(DatabaseManager::create_with::<A>(config))
    }

    pub fn from_settings(settings: DatabaseSettings) -> Result<Self> {
        Self::new(DatabaseManager::from_settings(settings))
    }

    pub fn backend(&self) -> Backend {
        self.inner.backend()
    }

    pub fn is_connected(&self) -> bool {
        self.inner.is_connected()
    }

    /// Borrow the async manager
    pub fn manager(&self) -> &DatabaseManager {
        &self.inner
    }

    /// Give up the runtime and keep the async manager
    pub fn into_inner(self) -> DatabaseManager {
        self.inner
    }

    pub fn connect(&mut self) -> Result<()> {
        self.runtime.block_on(self.inner.connect())
    }

    pub fn disconnect(&mut self) {
        self.runtime.block_on(self.inner.disconnect())
    }

    pub fn execute(&mut self, query: &str, params: Option<&Params>) -> Result<QueryResult> {
        self.runtime.block_on(self.inner.execute(query, params))
    }

    pub fn fetch_all(&mut self, query: &str, params: Option<&Params>) -> Result<Vec<Record>> {
        self.runtime.block_on(self.inner.fetch_all(query, params))
    }

    /// Connect, run `f`, then disconnect whether `f` succeeded or not
    pub fn with_connection<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Self) -> Result<T>,
    {
        self.connect()?;
        let result = f(self);
        self.disconnect();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ConnectionConfig {
        ConnectionConfig::new("127.0.0.1", "app", "secret", "shop").with_port(1)
    }

    #[test]
    fn test_blocking_not_connected() {
        let mut db = BlockingDatabaseManager::create(Backend::PostgreSql, config()).unwrap();
        assert_eq!(db.backend(), Backend::PostgreSql);

        let err = db.execute("DELETE FROM t", None).unwrap_err();
        assert!(err.is_not_connected());
        db.disconnect();
        db.disconnect();
    }

    #[test]
    fn test_blocking_connect_failure() {
        let mut db = BlockingDatabaseManager::create_named("mysql", config()).unwrap();
        let err = db.connect().unwrap_err();
        assert!(err.is_connection());
        assert!(!db.is_connected());
    }

    #[test]
    fn test_with_connection_propagates_connect_error() {
        let mut db = BlockingDatabaseManager::create_named("sqlserver", config()).unwrap();
        let mut called = false;
        let err = db
            .with_connection(|_| {
                called = true;
                Ok(())
            })
            .unwrap_err();
        assert!(err.is_connection());
        assert!(!called);
    }
}
