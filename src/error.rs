use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for RustF DB
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("No adapter found for database backend '{0}'")]
    UnknownBackend(String),

    // Database-specific errors
    #[error("Database connection error: {0}")]
    DatabaseConnection(String),

    #[error("Not connected: {0}")]
    NotConnected(String),

    #[error("Database query error: {0}")]
    DatabaseQuery(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn unknown_backend(name: impl Into<String>) -> Self {
        Self::UnknownBackend(name.into())
    }

    pub fn database_connection(msg: impl Into<String>) -> Self {
        Self::DatabaseConnection(msg.into())
    }

    pub fn not_connected(msg: impl Into<String>) -> Self {
        Self::NotConnected(msg.into())
    }

    pub fn database_query(msg: impl Into<String>) -> Self {
        Self::DatabaseQuery(msg.into())
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, Error::Configuration(_))
    }

    pub fn is_unknown_backend(&self) -> bool {
        matches!(self, Error::UnknownBackend(_))
    }

    pub fn is_connection(&self) -> bool {
        matches!(self, Error::DatabaseConnection(_))
    }

    pub fn is_not_connected(&self) -> bool {
        matches!(self, Error::NotConnected(_))
    }

    pub fn is_query(&self) -> bool {
        matches!(self, Error::DatabaseQuery(_))
    }

    /// Get a stable error code for logs and API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::Configuration(_) => "E_CONFIGURATION",
            Error::UnknownBackend(_) => "E_UNKNOWN_BACKEND",
            Error::DatabaseConnection(_) => "E_DB_CONNECTION",
            Error::NotConnected(_) => "E_DB_NOT_CONNECTED",
            Error::DatabaseQuery(_) => "E_DB_QUERY",
            Error::Io(_) => "E_IO",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(Error::configuration("x").error_code(), "E_CONFIGURATION");
        assert_eq!(Error::unknown_backend("oracle").error_code(), "E_UNKNOWN_BACKEND");
        assert_eq!(Error::not_connected("mysql").error_code(), "E_DB_NOT_CONNECTED");
    }

    #[test]
    fn test_unknown_backend_message_names_identifier() {
        let err = Error::unknown_backend("oracle");
        assert!(err.is_unknown_backend());
        assert!(err.to_string().contains("'oracle'"));
    }
}
