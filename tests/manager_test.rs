use async_trait::async_trait;
use rustf_db::{
    Backend, ConnectionConfig, DatabaseAdapter, DatabaseManager, Error, Params, QueryResult,
    Record, Result, SqlValue,
};
use std::sync::{Arc, Mutex};

/// Adapter that records every call instead of talking to a server
struct RecordingAdapter {
    config: ConnectionConfig,
    connected: bool,
    calls: Arc<Mutex<Vec<String>>>,
    fail_queries: bool,
}

impl RecordingAdapter {
    fn new(calls: Arc<Mutex<Vec<String>>>) -> Self {
        Self {
            config: ConnectionConfig::new("mock", "mock", "mock", "mock"),
            connected: false,
            calls,
            fail_queries: false,
        }
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl DatabaseAdapter for RecordingAdapter {
    fn backend(&self) -> Backend {
        Backend::PostgreSql
    }

    fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    async fn connect(&mut self) -> Result<()> {
        self.record("connect".to_string());
        self.connected = true;
        Ok(())
    }

    async fn disconnect(&mut self) {
        self.record("disconnect".to_string());
        self.connected = false;
    }

    async fn execute(&mut self, query: &str, params: Option<&Params>) -> Result<QueryResult> {
        self.record(format!(
            "execute {} [{}]",
            query,
            params.map_or(0, Params::len)
        ));
        if self.fail_queries {
            return Err(Error::database_query("syntax error at or near \"FROM\""));
        }
        Ok(QueryResult {
            rows_affected: 2,
            last_insert_id: None,
        })
    }

    async fn fetch_all(&mut self, query: &str, _params: Option<&Params>) -> Result<Vec<Record>> {
        self.record(format!("fetch_all {}", query));
        if !self.connected {
            return Err(Error::not_connected("mock adapter is not connected"));
        }
        let mut row = Record::new();
        row.insert("1".to_string(), SqlValue::BigInt(1));
        Ok(vec![row])
    }
}

fn calls() -> Arc<Mutex<Vec<String>>> {
    Arc::new(Mutex::new(Vec::new()))
}

#[tokio::test]
async fn test_manager_delegates_to_adapter() {
    let log = calls();
    let mut manager = DatabaseManager::new(RecordingAdapter::new(log.clone()));
    assert_eq!(manager.backend(), Backend::PostgreSql);

    manager.connect().await.unwrap();
    assert!(manager.is_connected());

    let params = Params::new().bind("name", "Ada").bind("age", 36);
    let result = manager
        .execute("UPDATE users SET age = $2 WHERE name = $1", Some(&params))
        .await
        .unwrap();
    assert_eq!(result.rows_affected, 2);

    let rows = manager.fetch_all("SELECT 1", None).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("1"), Some(&SqlValue::BigInt(1)));

    manager.disconnect().await;
    assert!(!manager.is_connected());

    assert_eq!(
        *log.lock().unwrap(),
        vec![
            "connect",
            "execute UPDATE users SET age = $2 WHERE name = $1 [2]",
            "fetch_all SELECT 1",
            "disconnect",
        ]
    );
}

#[tokio::test]
async fn test_adapter_errors_pass_through_unchanged() {
    let mut adapter = RecordingAdapter::new(calls());
    adapter.fail_queries = true;
    let mut manager = DatabaseManager::new(adapter);

    let err = manager.fetch_all("SELECT 1", None).await.unwrap_err();
    assert!(err.is_not_connected());
    assert_eq!(err.error_code(), "E_DB_NOT_CONNECTED");

    manager.connect().await.unwrap();
    let err = manager.execute("SELECT FROM", None).await.unwrap_err();
    assert!(err.is_query());
    assert!(err.to_string().contains("syntax error"));
}

#[tokio::test]
async fn test_with_connection_always_disconnects() {
    let log = calls();
    let mut adapter = RecordingAdapter::new(log.clone());
    adapter.fail_queries = true;
    let mut manager = DatabaseManager::new(adapter);

    let err = manager
        .with_connection(|db| Box::pin(async move { db.execute("DELETE FROM t", None).await }))
        .await
        .unwrap_err();
    assert!(err.is_query());
    assert!(!manager.is_connected());

    let rows = manager
        .with_connection(|db| Box::pin(async move { db.fetch_all("SELECT 1", None).await }))
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);

    let log = log.lock().unwrap();
    assert_eq!(log.first().map(String::as_str), Some("connect"));
    assert_eq!(log.last().map(String::as_str), Some("disconnect"));
    assert_eq!(log.iter().filter(|c| *c == "disconnect").count(), 2);
}

#[test]
fn test_factory_resolution() {
    let config = ConnectionConfig::new("localhost", "app", "secret", "shop");

    let mysql = DatabaseManager::create_named("mysql", config.clone()).unwrap();
    assert_eq!(mysql.backend(), Backend::MySql);
    assert_eq!(mysql.adapter().port(), 3306);

    let postgres = DatabaseManager::create_named("postgresql", config.clone()).unwrap();
    assert_eq!(postgres.backend(), Backend::PostgreSql);
    assert_eq!(postgres.adapter().port(), 5432);

    let sqlserver = DatabaseManager::create_named("sqlserver", config.clone()).unwrap();
    assert_eq!(sqlserver.backend(), Backend::SqlServer);
    assert_eq!(sqlserver.adapter().port(), 1433);

    match DatabaseManager::create_named("oracle", config) {
        Err(Error::UnknownBackend(name)) => assert_eq!(name, "oracle"),
        Err(other) => panic!("unexpected error: {}", other),
        Ok(_) => panic!("oracle must not resolve to an adapter"),
    }
}

#[test]
fn test_into_adapter_keeps_config() {
    let config = ConnectionConfig::new("db.internal", "app", "secret", "shop").with_port(3307);
    let adapter = DatabaseManager::create(Backend::MySql, config.clone()).into_adapter();
    assert_eq!(adapter.config(), &config);
    assert_eq!(adapter.port(), 3307);
    assert!(!adapter.is_connected());
}
