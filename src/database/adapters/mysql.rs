//! MySQL database adapter implementation

use crate::config::ConnectionConfig;
use crate::database::adapter::{not_connected, DatabaseAdapter, FromConnectionConfig, QueryResult};
use crate::database::types::{MySqlTypeConverter, Params, Record, TypeConverter};
use crate::database::Backend;
use crate::error::{Error, Result};
use async_trait::async_trait;
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection};
use sqlx::Connection;
use std::sync::Arc;

/// MySQL database adapter
pub struct MySqlAdapter {
    config: Arc<ConnectionConfig>,
    connection: Option<MySqlConnection>,
    converter: MySqlTypeConverter,
}

impl MySqlAdapter {
    /// Create an unconnected MySQL adapter
    pub fn new(config: impl Into<Arc<ConnectionConfig>>) -> Self {
        Self {
            config: config.into(),
            connection: None,
            converter: MySqlTypeConverter::new(),
        }
    }

    /// Connect options assembled from the configuration
    pub fn connect_options(&self) -> MySqlConnectOptions {
        MySqlConnectOptions::new()
            .host(self.config.host())
            .port(self.port())
            .username(self.config.user())
            .password(self.config.password())
            .database(self.config.database())
    }

    /// Get mutable access to the native connection, if open
    pub fn connection(&mut self) -> Option<&mut MySqlConnection> {
        self.connection.as_mut()
    }
}

#[async_trait]
impl DatabaseAdapter for MySqlAdapter {
    fn backend(&self) -> Backend {
        Backend::MySql
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
        let connection = MySqlConnection::connect_with(&self.connect_options())
            .await
            .map_err(|e| {
                Error::database_connection(format!(
                    "Failed to connect to MySQL at {}:{}: {}",
                    self.config.host(),
                    port,
                    e
                ))
            })?;

        log::info!(
            "Connected to MySQL {}:{}/{} as '{}'",
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
                Ok(()) => log::info!("Disconnected from MySQL {}", self.config.host()),
                Err(e) => log::warn!(
                    "Error while closing MySQL connection to {}: {}",
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
            .ok_or_else(|| not_connected(Backend::MySql, "execute"))?;

        log::debug!(
            "MySQL EXECUTE ({} params): {}",
            params.map_or(0, Params::len),
            query
        );

        let mut statement = sqlx::query(query);
        for value in params.into_iter().flat_map(|params| params.values()) {
            statement = MySqlTypeConverter::bind_param(statement, value.clone());
        }

        let result = statement
            .execute(&mut *connection)
            .await
            .map_err(|e| Error::database_query(format!("MySQL execute failed: {}", e)))?;

        Ok(QueryResult {
            rows_affected: result.rows_affected(),
            last_insert_id: inserted_id(result.last_insert_id()),
        })
    }

    async fn fetch_all(&mut self, query: &str, params: Option<&Params>) -> Result<Vec<Record>> {
        let connection = self
            .connection
            .as_mut()
            .ok_or_else(|| not_connected(Backend::MySql, "fetch_all"))?;

        log::debug!(
            "MySQL FETCH_ALL ({} params): {}",
            params.map_or(0, Params::len),
            query
        );

        let mut statement = sqlx::query(query);
        for value in params.into_iter().flat_map(|params| params.values()) {
            statement = MySqlTypeConverter::bind_param(statement, value.clone());
        }

        let rows = statement
            .fetch_all(&mut *connection)
            .await
            .map_err(|e| Error::database_query(format!("MySQL fetch_all failed: {}", e)))?;

        rows.iter()
            .map(|row| self.converter.row_to_record(row))
            .collect()
    }
}

/// MySQL reports 0 when the statement generated no AUTO_INCREMENT value
fn inserted_id(id: u64) -> Option<u64> {
    (id != 0).then_some(id)
}

impl FromConnectionConfig for MySqlAdapter {
    fn from_config(config: Arc<ConnectionConfig>) -> Self {
        Self::new(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ConnectionConfig {
        ConnectionConfig::new("127.0.0.1", "root", "secret", "test")
    }

    #[test]
    fn test_default_port() {
        let adapter = MySqlAdapter::new(config());
        assert_eq!(adapter.port(), 3306);
        assert_eq!(adapter.connect_options().get_port(), 3306);
        assert_eq!(adapter.backend(), Backend::MySql);
        assert!(!adapter.is_connected());

        let adapter = MySqlAdapter::new(config().with_port(13306));
        assert_eq!(adapter.port(), 13306);
        assert_eq!(adapter.connect_options().get_port(), 13306);
    }

    #[test]
    fn test_zero_insert_id_is_none() {
        assert_eq!(inserted_id(0), None);
        assert_eq!(inserted_id(17), Some(17));
    }

    #[tokio::test]
    async fn test_operations_require_connection() {
        let mut adapter = MySqlAdapter::new(config());

        let err = adapter.execute("DELETE FROM t", None).await.unwrap_err();
        assert!(err.is_not_connected());

        let err = adapter.fetch_all("SELECT 1", None).await.unwrap_err();
        assert!(err.is_not_connected());
    }

    #[tokio::test]
    async fn test_disconnect_is_idempotent() {
        let mut adapter = MySqlAdapter::new(config());
        adapter.disconnect().await;
        adapter.disconnect().await;
        assert!(!adapter.is_connected());
    }

    #[tokio::test]
    async fn test_connect_failure_is_connection_error() {
        // Port 1 (tcpmux) is not expected to accept connections
        let mut adapter = MySqlAdapter::new(config().with_port(1));
        let err = adapter.connect().await.unwrap_err();
        assert!(err.is_connection(), "unexpected error: {}", err);
        assert!(!adapter.is_connected());
    }
}
