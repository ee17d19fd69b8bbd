//! PostgreSQL database adapter implementation

use crate::config::ConnectionConfig;
use crate::database::adapter::{not_connected, DatabaseAdapter, FromConnectionConfig, QueryResult};
use crate::database::types::{Params, PostgresTypeConverter, Record, TypeConverter};
use crate::database::Backend;
use crate::error::{Error, Result};
use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgConnection};
use sqlx::Connection;
use std::sync::Arc;

/// PostgreSQL database adapter
pub struct PostgresAdapter {
    config: Arc<ConnectionConfig>,
    connection: Option<PgConnection>,
    converter: PostgresTypeConverter,
}

impl PostgresAdapter {
    /// Create an unconnected PostgreSQL adapter
    pub fn new(config: impl Into<Arc<ConnectionConfig>>) -> Self {
        Self {
            config: config.into(),
            connection: None,
            converter: PostgresTypeConverter::new(),
        }
    }

    /// Connect options assembled from the configuration
    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(self.config.host())
            .port(self.port())
            .username(self.config.user())
            .password(self.config.password())
            .database(self.config.database())
    }

    /// Get mutable access to the native connection, if open
    pub fn connection(&mut self) -> Option<&mut PgConnection> {
        self.connection.as_mut()
    }
}

#[async_trait]
impl DatabaseAdapter for PostgresAdapter {
    fn backend(&self) -> Backend {
        Backend::PostgreSql
    }

    fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    async fn connect(&mut self) -> Result<()> {
        self.disconnect().await;

        let port = self.port();
        let connection = PgConnection::connect_with(&self.connect_options())
            .await
            .map_err(|e| {
                Error::database_connection(format!(
                    "Failed to connect to PostgreSQL at {}:{}: {}",
                    self.config.host(),
                    port,
                    e
                ))
            })?;

        log::info!(
            "Connected to PostgreSQL {}:{}/{} as '{}'",
            self.config.host(),
            port,
            self.config.database(),
            self.config.user()
        );
        self.connection = Some(connection);
        Ok(())
    }

    async fn disconnect(&mut self) {
        if let Some(connection) = self.connection.take() {
            match connection.close().await {
                Ok(()) => log::info!("Disconnected from PostgreSQL {}", self.config.host()),
                Err(e) => log::warn!(
                    "Error while closing PostgreSQL connection to {}: {}",
                    self.config.host(),
                    e
                ),
            }
        }
    }

    async fn execute(&mut self, query: &str, params: Option<&Params>) -> Result<QueryResult> {
        let connection = self
            .connection
            .as_mut()
            .ok_or_else(|| not_connected(Backend::PostgreSql, "execute"))?;

        log::debug!(
            "PostgreSQL EXECUTE ({} params): {}",
            params.map_or(0, Params::len),
            query
        );

        let mut statement = sqlx::query(query);
        for value in params.into_iter().flat_map(|params| params.values()) {
            statement = PostgresTypeConverter::bind_param(statement, value.clone());
        }

        let result = statement
            .execute(&mut *connection)
            .await
            .map_err(|e| Error::database_query(format!("PostgreSQL execute failed: {}", e)))?;

        Ok(QueryResult {
            rows_affected: result.rows_affected(),
            last_insert_id: None, // use RETURNING with fetch_all instead
        })
    }

    async fn fetch_all(&mut self, query: &str, params: Option<&Params>) -> Result<Vec<Record>> {
        let connection = self
            .connection
            .as_mut()
            .ok_or_else(|| not_connected(Backend::PostgreSql, "fetch_all"))?;

        log::debug!(
            "PostgreSQL FETCH_ALL ({} params): {}",
            params.map_or(0, Params::len),
            query
        );

        let mut statement = sqlx::query(query);
        for value in params.into_iter().flat_map(|params| params.values()) {
            statement = PostgresTypeConverter::bind_param(statement, value.clone());
        }

        let rows = statement
            .fetch_all(&mut *connection)
            .await
            .map_err(|e| Error::database_query(format!("PostgreSQL fetch_all failed: {}", e)))?;

        rows.iter()
            .map(|row| self.converter.row_to_record(row))
            .collect()
    }
}

impl FromConnectionConfig for PostgresAdapter {
    fn from_config(config: Arc<ConnectionConfig>) -> Self {
        Self::new(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ConnectionConfig {
        ConnectionConfig::new("127.0.0.1", "postgres", "secret", "test")
    }

    #[test]
    fn test_default_port() {
        let adapter = PostgresAdapter::new(config());
        assert_eq!(adapter.port(), 5432);
        assert_eq!(adapter.connect_options().get_port(), 5432);
        assert_eq!(adapter.connect_options().get_database(), Some("test"));

        let adapter = PostgresAdapter::new(config().with_port(6543));
        assert_eq!(adapter.connect_options().get_port(), 6543);
    }

    #[tokio::test]
    async fn test_operations_require_connection() {
        let mut adapter = PostgresAdapter::new(config());

        let err = adapter
            .execute("UPDATE t SET a = $1", Some(&Params::new().bind("a", 1)))
            .await
            .unwrap_err();
        assert!(err.is_not_connected());

        let err = adapter.fetch_all("SELECT 1", None).await.unwrap_err();
        assert!(err.is_not_connected());
    }

    #[tokio::test]
    async fn test_disconnect_is_idempotent() {
        let mut adapter = PostgresAdapter::new(config());
        adapter.disconnect().await;
        adapter.disconnect().await;
        assert!(!adapter.is_connected());
    }

    #[tokio::test]
    async fn test_connect_failure_is_connection_error() {
        let mut adapter = PostgresAdapter::new(config().with_port(1));
        let err = adapter.connect().await.unwrap_err();
        assert!(err.is_connection(), "unexpected error: {}", err);
        assert!(!adapter.is_connected());
    }
}
