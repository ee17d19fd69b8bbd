//! Backend identifiers

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported database backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// MySQL (and wire-compatible MariaDB)
    MySql,
    /// PostgreSQL
    PostgreSql,
    /// Microsoft SQL Server
    SqlServer,
}

impl Backend {
    /// Every backend, in identifier-table order
    pub const ALL: [Backend; 3] = [Backend::MySql, Backend::PostgreSql, Backend::SqlServer];

    /// The identifier accepted by [`FromStr`] and the manager factory
    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::MySql => "mysql",
            Backend::PostgreSql => "postgresql",
            Backend::SqlServer => "sqlserver",
        }
    }

    /// Port used when the configuration leaves it unset
    pub fn default_port(&self) -> u16 {
        match self {
            Backend::MySql => 3306,
            Backend::PostgreSql => 5432,
            Backend::SqlServer => 1433,
        }
    }

    /// Parameter placeholder for the 1-based `index` in this backend's SQL
    pub fn placeholder(&self, index: usize) -> String {
        match self {
            Backend::MySql => "?".to_string(),
            Backend::PostgreSql => format!("${}", index),
            Backend::SqlServer => format!("@P{}", index),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Backend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Backend::ALL
            .into_iter()
            .find(|backend| backend.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::unknown_backend(s))
    }
}
