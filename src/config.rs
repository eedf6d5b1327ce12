//! Configuration for omni_sqlite
//!
//! Read from `omni_sqlite.yaml`:
//!
//! ```yaml
//! database: ./data/app.db   # or ":memory:"
//! read_only: false
//! create: true
//! busy_timeout_ms: 5000
//! schema: public
//! log_level: notice
//! ```
//!
//! Every field is optional. A missing file yields the defaults.

use crate::error::{Error, Result};
use crate::handle::{OpenOptions, MEMORY};
use crate::validation::validate_schema_name;
use omni_host::Severity;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default config file name, looked up in the working directory
pub const CONFIG_FILE: &str = "omni_sqlite.yaml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Location opened when no handle is given explicitly
    pub database: String,
    pub read_only: bool,
    pub create: bool,
    pub busy_timeout_ms: Option<u64>,
    /// Schema the install script creates functions in
    pub schema: String,
    /// Least severe host report that is logged
    pub log_level: Severity,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: MEMORY.to_string(),
            read_only: false,
            create: true,
            busy_timeout_ms: None,
            schema: "public".to_string(),
            log_level: Severity::Notice,
        }
    }
}

impl Config {
    /// Load from `path`; a missing file gives the defaults
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(?path, "no config file, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|source| Error::ConfigReadError {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    /// Parse and validate YAML text
    pub fn parse(content: &str) -> Result<Self> {
        // An empty document deserializes as unit, not as an empty map
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Config = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        validate_schema_name(&self.schema)?;
        if self.database.is_empty() {
            return Err(Error::ConfigParseError {
                message: "database location cannot be empty".to_string(),
            });
        }
        Ok(())
    }

    pub fn open_options(&self) -> OpenOptions {
        OpenOptions {
            read_only: self.read_only,
            create: self.create,
            busy_timeout: self.busy_timeout_ms.map(Duration::from_millis),
        }
    }

    /// `tracing` level matching `log_level`
    pub fn tracing_level(&self) -> tracing::Level {
        match self.log_level {
            Severity::Debug => tracing::Level::DEBUG,
            Severity::Log | Severity::Info | Severity::Notice => tracing::Level::INFO,
            Severity::Warning => tracing::Level::WARN,
            Severity::Error | Severity::Fatal | Severity::Panic => tracing::Level::ERROR,
        }
    }
}
