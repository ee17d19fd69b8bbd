//! TOML database settings
//!
//! ```toml
//! backend = "postgresql"
//! host = "localhost"
//! user = "app"
//! password = "secret"
//! database = "orders"
//! port = 5433
//! ```

use super::ConnectionConfig;
use crate::database::Backend;
use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// A backend identifier together with its connection parameters
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub backend: Backend,
    #[serde(flatten)]
    pub connection: ConnectionConfig,
}

impl DatabaseSettings {
    pub fn new(backend: Backend, connection: ConnectionConfig) -> Self {
        Self {
            backend,
            connection,
        }
    }

    /// Parse settings from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text)
            .map_err(|e| Error::configuration(format!("Invalid database settings: {}", e)))
    }

    /// Read settings from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::configuration(format!(
                "Failed to read database settings '{}': {}",
                path.display(),
                e
            ))
        })?;
        log::debug!("Loading database settings from {}", path.display());
        Self::from_toml_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_settings() {
        let settings = DatabaseSettings::from_toml_str(
            r#"
            backend = "postgresql"
            host = "localhost"
            user = "app"
            password = "secret"
            database = "orders"
            port = 5433
            "#,
        )
        .unwrap();

        assert_eq!(settings.backend, Backend::PostgreSql);
        assert_eq!(settings.connection.host(), "localhost");
        assert_eq!(settings.connection.password(), "secret");
        assert_eq!(settings.connection.port(), Some(5433));
    }

    #[test]
    fn test_port_is_optional() {
        let settings = DatabaseSettings::from_toml_str(
            r#"
            backend = "sqlserver"
            host = "mssql"
            user = "sa"
            password = "Passw0rd!"
            database = "master"
            "#,
        )
        .unwrap();

        assert_eq!(settings.backend, Backend::SqlServer);
        assert_eq!(settings.connection.port(), None);
    }

    #[test]
    fn test_unknown_backend_rejected() {
        let err = DatabaseSettings::from_toml_str(
            r#"
            backend = "oracle"
            host = "localhost"
            user = "scott"
            password = "tiger"
            database = "orcl"
            "#,
        )
        .unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_missing_field_rejected() {
        let err = DatabaseSettings::from_toml_str(
            r#"
            backend = "mysql"
            host = "localhost"
            "#,
        )
        .unwrap_err();
        assert!(err.is_configuration());
    }
}
