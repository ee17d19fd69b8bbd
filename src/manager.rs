//! Database manager façade
//!
//! [`DatabaseManager`] owns exactly one adapter, chosen once at
//! construction, and forwards every operation to it unchanged.

use crate::config::{ConnectionConfig, DatabaseSettings};
use crate::database::adapter::{DatabaseAdapter, FromConnectionConfig, QueryResult};
use crate::database::{Backend, MySqlAdapter, Params, PostgresAdapter, Record, SqlServerAdapter};
use crate::error::Result;
use futures::future::BoxFuture;
use std::sync::Arc;

/// Façade over a single database adapter
pub struct DatabaseManager {
    adapter: Box<dyn DatabaseAdapter>,
}

impl DatabaseManager {
    /// Wrap an already built adapter
    pub fn new<A: DatabaseAdapter + 'static>(adapter: A) -> Self {
        Self::from_boxed(Box::new(adapter))
    }

    pub fn from_boxed(adapter: Box<dyn DatabaseAdapter>) -> Self {
        log::debug!("Database manager using {} adapter", adapter.backend());
        Self { adapter }
    }

    /// Build the adapter for `backend`
    pub fn create(backend: Backend, config: ConnectionConfig) -> Self {
        let config = Arc::new(config);
        let adapter: Box<dyn DatabaseAdapter> = match backend {
            Backend::MySql => Box::new(MySqlAdapter::new(config)),
            Backend::PostgreSql => Box::new(PostgresAdapter::new(config)),
            Backend::SqlServer => Box::new(SqlServerAdapter::new(config)),
        };
        Self::from_boxed(adapter)
    }

    /// Build the adapter named by `db_type`
    ///
    /// Accepts `"mysql"`, `"postgresql"` and `"sqlserver"` (case-insensitive).
    /// Any other identifier fails with [`Error::UnknownBackend`].
    ///
    /// [`Error::UnknownBackend`]: crate::Error::UnknownBackend
    pub fn create_named(db_type: &str, config: ConnectionConfig) -> Result<Self> {
        let backend: Backend = db_type.parse()?;
        Ok(Self::create(backend, config))
    }

    /// Build the adapter of type `A`
    pub fn create_with<A: FromConnectionConfig>(config: ConnectionConfig) -> Self {
        Self::new(A::from_config(Arc::new(config)))
    }

    /// Build the adapter named by `db_type` from a `field -> value` mapping
    pub fn create_from_map<I, K, V>(db_type: &str, fields: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let backend: Backend = db_type.parse()?;
        let config = ConnectionConfig::from_map(fields)?;
        Ok(Self::create(backend, config))
    }

    /// Build the adapter described by TOML settings
    pub fn from_settings(settings: DatabaseSettings) -> Self {
        Self::create(settings.backend, settings.connection)
    }

    pub fn backend(&self) -> Backend {
        self.adapter.backend()
    }

    pub fn is_connected(&self) -> bool {
        self.adapter.is_connected()
    }

    /// Borrow the underlying adapter
    pub fn adapter(&self) -> &dyn DatabaseAdapter {
        self.adapter.as_ref()
    }

    /// Give up the façade and keep the adapter
    pub fn into_adapter(self) -> Box<dyn DatabaseAdapter> {
        self.adapter
    }

    pub async fn connect(&mut self) -> Result<()> {
        self.adapter.connect().await
    }

    pub async fn disconnect(&mut self) {
        self.adapter.disconnect().await
    }

    pub async fn execute(&mut self, query: &str, params: Option<&Params>) -> Result<QueryResult> {
        self.adapter.execute(query, params).await
    }

    pub async fn fetch_all(&mut self, query: &str, params: Option<&Params>) -> Result<Vec<Record>> {
        self.adapter.fetch_all(query, params).await
    }

    /// Connect, run `f`, then disconnect whether `f` succeeded or not
    ///
    /// ```no_run
    /// # use rustf_db::{ConnectionConfig, DatabaseManager};
    /// # async fn run() -> rustf_db::Result<()> {
    /// let config = ConnectionConfig::new("localhost", "app", "secret", "shop");
    /// let mut db = DatabaseManager::create_named("postgresql", config)?;
    /// let rows = db
    ///     .with_connection(|db| Box::pin(async move { db.fetch_all("SELECT 1", None).await }))
    ///     .await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn with_connection<T, F>(&mut self, f: F) -> Result<T>
    where
        F: for<'a> FnOnce(&'a mut Self) -> BoxFuture<'a, Result<T>>,
    {
        self.connect().await?;
        let result = f(self).await;
        self.disconnect().await;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ConnectionConfig {
        ConnectionConfig::new("localhost", "app", "secret", "shop")
    }

    #[test]
    fn test_create_named_resolves_backends() {
        for (name, backend) in [
            ("mysql", Backend::MySql),
            ("postgresql", Backend::PostgreSql),
            ("sqlserver", Backend::SqlServer),
            ("MySQL", Backend::MySql),
        ] {
            let manager = DatabaseManager::create_named(name, config()).unwrap();
            assert_eq!(manager.backend(), backend);
            assert!(!manager.is_connected());
        }
    }

    #[test]
    fn test_create_named_rejects_unknown() {
        let err = DatabaseManager::create_named("oracle", config())
            .err()
            .unwrap();
        assert!(err.is_unknown_backend());
        assert!(err.to_string().contains("oracle"));
    }

    #[test]
    fn test_create_with_type() {
        let manager = DatabaseManager::create_with::<SqlServerAdapter>(config());
        assert_eq!(manager.backend(), Backend::SqlServer);
        assert_eq!(manager.adapter().port(), 1433);
    }

    #[test]
    fn test_create_from_map() {
        let manager = DatabaseManager::create_from_map(
            "postgresql",
            [
                ("host", "db"),
                ("user", "app"),
                ("password", "pw"),
                ("database", "orders"),
                ("port", "5433"),
            ],
        )
        .unwrap();
        assert_eq!(manager.backend(), Backend::PostgreSql);
        assert_eq!(manager.adapter().port(), 5433);

        let err = DatabaseManager::create_from_map("mysql", [("host", "db")])
            .err()
            .unwrap();
        assert!(err.is_configuration());
    }

    #[tokio::test]
    async fn test_not_connected_passes_through() {
        let mut manager = DatabaseManager::create(Backend::MySql, config());
        let err = manager.fetch_all("SELECT 1", None).await.unwrap_err();
        assert!(err.is_not_connected());
        manager.disconnect().await;
    }
}
