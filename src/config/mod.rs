//! Connection configuration
//!
//! This module holds the parameters needed to open a connection to any of
//! the supported backends, and the helpers that populate them from a field
//! mapping, a credential source or a TOML settings file.

pub mod credentials;
pub mod settings;

pub use credentials::{set_source, source, CredentialSource};
pub use settings::DatabaseSettings;

use crate::error::{Error, Result};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

/// Field names recognised in field mappings and credential sources
pub const CONNECTION_FIELDS: [&str; 5] = ["host", "user", "password", "database", "port"];

/// Parameters for a single backend connection
///
/// The port is optional; each adapter applies its own default when it
/// connects. The password is kept in a [`SecretString`] so it never shows
/// up in `Debug` output or logs.
#[derive(Debug, Clone, Deserialize)]
pub struct ConnectionConfig {
    host: String,
    user: String,
    password: SecretString,
    database: String,
    #[serde(default)]
    port: Option<u16>,
}

impl ConnectionConfig {
    /// Create a configuration without an explicit port
    pub fn new(
        host: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
        database: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            user: user.into(),
            password: SecretString::new(password.into()),
            database: database.into(),
            port: None,
        }
    }

    /// Set an explicit port, overriding the backend default
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Build a configuration from a `field -> value` mapping
    ///
    /// Keys are matched case-insensitively against `host`, `user`,
    /// `password`, `database` and `port`; unknown keys are ignored.
    pub fn from_map<I, K, V>(fields: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut partial = PartialConnectionConfig::default();
        for (key, value) in fields {
            partial.set_field(key.as_ref(), value.into())?;
        }
        partial.into_config()
    }

    /// Load a configuration from the default credential source
    ///
    /// Fails when the source holds no `<NAME>_<field>` key at all, or when
    /// a required field is missing.
    pub fn load_credential(name: &str) -> Result<Self> {
        CredentialSource::global().load(name)
    }

    /// Load whatever fields the default credential source holds for `name`
    ///
    /// Never fails because keys are absent; unset fields stay `None`.
    pub fn load_partial_credential(name: &str) -> Result<PartialConnectionConfig> {
        CredentialSource::global().load_partial(name)
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    /// Expose the password to a driver
    pub fn password(&self) -> &str {
        self.password.expose_secret()
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn port(&self) -> Option<u16> {
        self.port
    }

    /// The configured port, or `default` when none was set
    pub fn port_or(&self, default: u16) -> u16 {
        self.port.unwrap_or(default)
    }
}

impl PartialEq for ConnectionConfig {
    fn eq(&self, other: &Self) -> bool {
        self.host == other.host
            && self.user == other.user
            && self.password() == other.password()
            && self.database == other.database
            && self.port == other.port
    }
}

/// A configuration whose fields may be unset
///
/// Produced by lenient credential loading. Call [`into_config`] once the
/// caller has decided how to handle the gaps.
///
/// [`into_config`]: PartialConnectionConfig::into_config
#[derive(Debug, Clone, Default)]
pub struct PartialConnectionConfig {
    pub host: Option<String>,
    pub user: Option<String>,
    pub password: Option<SecretString>,
    pub database: Option<String>,
    pub port: Option<u16>,
}

impl PartialConnectionConfig {
    /// Assign a field by name (case-insensitive)
    ///
    /// Returns `Ok(false)` for names that are not connection fields.
    pub fn set_field(&mut self, field: &str, value: String) -> Result<bool> {
        match field.to_ascii_lowercase().as_str() {
            "host" => self.host = Some(value),
            "user" => self.user = Some(value),
            "password" => self.password = Some(SecretString::new(value)),
            "database" => self.database = Some(value),
            "port" => {
                let port = value.trim().parse::<u16>().map_err(|_| {
                    Error::configuration(format!("Invalid port '{}': expected 0-65535", value))
                })?;
                self.port = Some(port);
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    /// True when no field is set
    pub fn is_empty(&self) -> bool {
        self.host.is_none()
            && self.user.is_none()
            && self.password.is_none()
            && self.database.is_none()
            && self.port.is_none()
    }

    /// Names of the required fields that are still unset
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.host.is_none() {
            missing.push("host");
        }
        if self.user.is_none() {
            missing.push("user");
        }
        if self.password.is_none() {
            missing.push("password");
        }
        if self.database.is_none() {
            missing.push("database");
        }
        missing
    }

    /// Upgrade to a full configuration
    pub fn into_config(self) -> Result<ConnectionConfig> {
        match (self.host, self.user, self.password, self.database) {
            (Some(host), Some(user), Some(password), Some(database)) => Ok(ConnectionConfig {
                host,
                user,
                password,
                database,
                port: self.port,
            }),
            (host, user, password, database) => {
                let partial = PartialConnectionConfig {
                    host,
                    user,
                    password,
                    database,
                    port: self.port,
                };
                Err(Error::configuration(format!(
                    "Missing required connection field(s): {}",
                    partial.missing_fields().join(", ")
                )))
            }
        }
    }
}
