//! SQL Server database adapter implementation
//!
//! Uses tiberius over a tokio TCP stream. The client configuration is built
//! from [`ConnectionConfig`] with SQL authentication, a trusted server
//! certificate and encryption limited to the login exchange.

use crate::config::ConnectionConfig;
use crate::database::adapter::{not_connected, DatabaseAdapter, FromConnectionConfig, QueryResult};
use crate::database::types::{Params, Record, SqlServerTypeConverter, TypeConverter};
use crate::database::Backend;
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tiberius::{AuthMethod, Client, Config, EncryptionLevel, Query};
use tokio::net::TcpStream;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};

type SqlServerClient = Client<Compat<TcpStream>>;

/// SQL Server database adapter
pub struct SqlServerAdapter {
    config: Arc<ConnectionConfig>,
    client: Option<SqlServerClient>,
    converter: SqlServerTypeConverter,
}

impl SqlServerAdapter {
    /// Create an unconnected SQL Server adapter
    pub fn new(config: impl Into<Arc<ConnectionConfig>>) -> Self {
        Self {
            config: config.into(),
            client: None,
            converter: SqlServerTypeConverter::new(),
        }
    }

    /// tiberius client configuration assembled from the configuration
    pub fn client_config(&self) -> Config {
        let mut config = Config::new();
        config.host(self.config.host());
        config.port(self.port());
        config.database(self.config.database());
        config.authentication(AuthMethod::sql_server(
            self.config.user(),
            self.config.password(),
        ));
        config.trust_cert();
        config.encryption(EncryptionLevel::Off);
        config
    }

    /// Get mutable access to the native client, if open
    pub fn client(&mut self) -> Option<&mut SqlServerClient> {
        self.client.as_mut()
    }

    fn bind_all(query: &mut Query<'_>, params: Option<&Params>) {
        for value in params.into_iter().flat_map(|params| params.values()) {
            SqlServerTypeConverter::bind_param(query, value.clone());
        }
    }
}

fn transport_error(addr: &str, e: std::io::Error) -> Error {
    Error::database_connection(format!("Failed to connect to SQL Server at {}: {}", addr, e))
}

#[async_trait]
impl DatabaseAdapter for SqlServerAdapter {
    fn backend(&self) -> Backend {
        Backend::SqlServer
    }

    fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    fn is_connected(&self) -> bool {
        self.client.is_some()
    }

    async fn connect(&mut self) -> Result<()> {
        self.disconnect().await;

        let config = self.client_config();
        let addr = config.get_addr();

        let tcp = TcpStream::connect(&addr)
            .await
            .map_err(|e| transport_error(&addr, e))?;
        tcp.set_nodelay(true)
            .map_err(|e| transport_error(&addr, e))?;

        let client = Client::connect(config, tcp.compat_write())
            .await
            .map_err(|e| {
                Error::database_connection(format!(
                    "Failed to log in to SQL Server at {}: {}",
                    addr, e
                ))
            })?;

        log::info!(
            "Connected to SQL Server {}/{} as '{}'",
            addr,
            self.config.database(),
            self.config.user()
        );
        self.client = Some(client);
        Ok(())
    }

    async fn disconnect(&mut self) {
        if let Some(client) = self.client.take() {
            match client.close().await {
                Ok(()) => log::info!("Disconnected from SQL Server {}", self.config.host()),
                Err(e) => log::warn!(
                    "Error while closing SQL Server connection to {}: {}",
                    self.config.host(),
                    e
                ),
            }
        }
    }

    async fn execute(&mut self, query: &str, params: Option<&Params>) -> Result<QueryResult> {
        let client = self
            .client
            .as_mut()
            .ok_or_else(|| not_connected(Backend::SqlServer, "execute"))?;

        log::debug!(
            "SQL Server EXECUTE ({} params): {}",
            params.map_or(0, Params::len),
            query
        );

        let mut statement = Query::new(query);
        Self::bind_all(&mut statement, params);

        let result = statement
            .execute(client)
            .await
            .map_err(|e| Error::database_query(format!("SQL Server execute failed: {}", e)))?;

        Ok(QueryResult {
            rows_affected: result.total(),
            last_insert_id: None,
        })
    }

    async fn fetch_all(&mut self, query: &str, params: Option<&Params>) -> Result<Vec<Record>> {
        let client = self
            .client
            .as_mut()
            .ok_or_else(|| not_connected(Backend::SqlServer, "fetch_all"))?;

        log::debug!(
            "SQL Server FETCH_ALL ({} params): {}",
            params.map_or(0, Params::len),
            query
        );

        let mut statement = Query::new(query);
        Self::bind_all(&mut statement, params);

        let stream = statement
            .query(client)
            .await
            .map_err(|e| Error::database_query(format!("SQL Server fetch_all failed: {}", e)))?;
        let rows = stream
            .into_first_result()
            .await
            .map_err(|e| Error::database_query(format!("SQL Server fetch_all failed: {}", e)))?;

        rows.iter()
            .map(|row| self.converter.row_to_record(row))
            .collect()
    }
}

impl FromConnectionConfig for SqlServerAdapter {
    fn from_config(config: Arc<ConnectionConfig>) -> Self {
        Self::new(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ConnectionConfig {
        ConnectionConfig::new("127.0.0.1", "sa", "Secret123", "master")
    }

    #[test]
    fn test_client_config_address() {
        let adapter = SqlServerAdapter::new(config());
        assert_eq!(adapter.port(), 1433);
        assert_eq!(adapter.client_config().get_addr(), "127.0.0.1:1433");

        let adapter = SqlServerAdapter::new(config().with_port(14330));
        assert_eq!(adapter.client_config().get_addr(), "127.0.0.1:14330");
    }

    #[tokio::test]
    async fn test_operations_require_connection() {
        let mut adapter = SqlServerAdapter::new(config());

        let params = Params::new().bind("id", 7);
        let err = adapter
            .execute("DELETE FROM t WHERE id = @P1", Some(&params))
            .await
            .unwrap_err();
        assert!(err.is_not_connected());

        let err = adapter.fetch_all("SELECT 1", None).await.unwrap_err();
        assert!(err.is_not_connected());
    }

    #[tokio::test]
    async fn test_disconnect_is_idempotent() {
        let mut adapter = SqlServerAdapter::new(config());
        adapter.disconnect().await;
        adapter.disconnect().await;
        assert!(!adapter.is_connected());
    }

    #[test]
    fn test_socket_errors_are_connection_errors() {
        let io = std::io::Error::new(std::io::ErrorKind::InvalidInput, "setsockopt failed");
        let err = transport_error("db:1433", io);
        assert!(err.is_connection());
        assert!(err.to_string().contains("db:1433"));
    }

    #[tokio::test]
    async fn test_connect_failure_is_connection_error() {
        let mut adapter = SqlServerAdapter::new(config().with_port(1));
        let err = adapter.connect().await.unwrap_err();
        assert!(err.is_connection(), "unexpected error: {}", err);
        assert!(!adapter.is_connected());
    }
}
