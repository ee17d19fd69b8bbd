//! Credential sources for connection parameters
//!
//! A credential source is a flat key/value store, either a dotenv-style
//! file or the process environment, holding entries named
//! `<NAME>_<field>`:
//!
//! ```text
//! APP_HOST=db.internal
//! APP_USER=app
//! APP_PASSWORD=secret
//! APP_DATABASE=orders
//! APP_PORT=3307
//! ```
//!
//! Keys are matched case-insensitively. The default source location is a
//! process-wide setting, initially `.env`, that can be replaced with
//! [`set_source`]; it is read each time a load runs.

use super::{ConnectionConfig, PartialConnectionConfig, CONNECTION_FIELDS};
use crate::error::{Error, Result};
use once_cell::sync::Lazy;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// Default credential file, relative to the working directory
pub const DEFAULT_CREDENTIAL_FILE: &str = ".env";

static DEFAULT_SOURCE: Lazy<RwLock<PathBuf>> =
    Lazy::new(|| RwLock::new(PathBuf::from(DEFAULT_CREDENTIAL_FILE)));

/// Replace the process-wide default credential file (last writer wins)
pub fn set_source(path: impl Into<PathBuf>) {
    let path = path.into();
    log::debug!("Default credential source set to {}", path.display());
    match DEFAULT_SOURCE.write() {
        Ok(mut guard) => *guard = path,
        Err(poisoned) => *poisoned.into_inner() = path,
    }
}

/// Current process-wide default credential file
pub fn source() -> PathBuf {
    match DEFAULT_SOURCE.read() {
        Ok(guard) => guard.clone(),
        Err(poisoned) => poisoned.into_inner().clone(),
    }
}

/// Where connection parameters are read from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    /// A dotenv-style `KEY=value` file
    File(PathBuf),
    /// The variables of the current process
    Environment,
}

impl CredentialSource {
    /// A dotenv-style file at `path`
    pub fn file(path: impl Into<PathBuf>) -> Self {
        CredentialSource::File(path.into())
    }

    /// The process environment
    pub fn environment() -> Self {
        CredentialSource::Environment
    }

    /// Snapshot of the process-wide default file
    pub fn global() -> Self {
        CredentialSource::File(source())
    }

    /// Load a full configuration for `name`
    ///
    /// Fails with a configuration error when no `<NAME>_<field>` key exists,
    /// when a required field is missing or when the port is not a number.
    pub fn load(&self, name: &str) -> Result<ConnectionConfig> {
        let partial = self.collect(name, true)?;
        if partial.is_empty() {
            return Err(Error::configuration(format!(
                "No connection keys satisfy the credential syntax '{}_<field>' in {}",
                name.to_ascii_uppercase(),
                self
            )));
        }
        partial.into_config()
    }

    /// Load the fields present for `name`, leaving the rest unset
    ///
    /// An empty or unparsable port is treated as unset and logged.
    pub fn load_partial(&self, name: &str) -> Result<PartialConnectionConfig> {
        self.collect(name, false)
    }

    fn collect(&self, name: &str, strict: bool) -> Result<PartialConnectionConfig> {
        let prefix = format!("{}_", name.to_ascii_uppercase());
        let mut partial = PartialConnectionConfig::default();

        for (key, value) in self.entries()? {
            let upper = key.to_ascii_uppercase();
            let Some(field) = upper.strip_prefix(&prefix) else {
                continue;
            };
            if !CONNECTION_FIELDS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(field))
            {
                continue;
            }
            match partial.set_field(field, value) {
                Ok(_) => {}
                Err(e) if !strict => {
                    log::warn!("Ignoring credential key '{}' in {}: {}", key, self, e);
                }
                Err(e) => return Err(e),
            }
        }

        log::debug!(
            "Loaded credential '{}' from {} (missing: {:?})",
            name,
            self,
            partial.missing_fields()
        );
        Ok(partial)
    }

    /// All key/value pairs of the source
    fn entries(&self) -> Result<Vec<(String, String)>> {
        match self {
            CredentialSource::Environment => Ok(std::env::vars_os()
                .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)))
                .collect()),
            CredentialSource::File(path) => read_env_file(path),
        }
    }
}

impl std::fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CredentialSource::File(path) => write!(f, "'{}'", path.display()),
            CredentialSource::Environment => write!(f, "the process environment"),
        }
    }
}

/// Parse a dotenv file without touching the process environment
///
/// A missing file reads as an empty source. Only `${NAME}` references are
/// expanded; a bare `$` is kept as written.
fn read_env_file(path: &Path) -> Result<Vec<(String, String)>> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            log::debug!("Credential file {} not found", path.display());
            return Ok(Vec::new());
        }
        Err(e) => {
            return Err(Error::configuration(format!(
                "Failed to read credential file '{}': {}",
                path.display(),
                e
            )))
        }
    };

    let escaped = escape_bare_dollars(&text);
    dotenvy::from_read_iter(escaped.as_bytes())
        .map(|entry| {
            entry.map_err(|e| {
                Error::configuration(format!(
                    "Failed to parse credential file '{}': {}",
                    path.display(),
                    e
                ))
            })
        })
        .collect()
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Quoting {
    Bare,
    Single,
    Double,
}

/// Escape every `$` not followed by `{` where dotenvy would substitute it
///
/// Single-quoted text and comments are copied untouched.
fn escape_bare_dollars(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut quoting = Quoting::Bare;
    let mut prev: Option<char> = None;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match (quoting, c) {
            (Quoting::Single, '\'') => quoting = Quoting::Bare,
            (Quoting::Single, _) => {}
            (_, '\\') => {
                out.push(c);
                if let Some(next) = chars.next() {
                    out.push(next);
                    prev = Some(next);
                }
                continue;
            }
            (_, '$') if chars.peek() != Some(&'{') => {
                out.push_str("\\$");
                prev = Some(c);
                continue;
            }
            (Quoting::Bare, '\'') => quoting = Quoting::Single,
            (Quoting::Bare, '"') => quoting = Quoting::Double,
            (Quoting::Double, '"') => quoting = Quoting::Bare,
            (Quoting::Bare, '#') if prev.map_or(true, char::is_whitespace) => {
                out.push(c);
                for rest in chars.by_ref() {
                    out.push(rest);
                    if rest == '\n' {
                        break;
                    }
                }
                prev = Some('\n');
                continue;
            }
            _ => {}
        }
        out.push(c);
        prev = Some(c);
    }
    out
}
