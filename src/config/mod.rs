//! Configuration management
//!
//! Configuration is loaded from a `config.yml` file, with environment
//! variables (`INTELHUB_*`) overriding file values. Missing optional values
//! are filled with defaults.

use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
    /// CORS allowed origin for the dashboard frontend
    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origin: default_cors_origin(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_cors_origin() -> String {
    "http://localhost:3000".to_string()
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file
    #[serde(default = "default_database_url")]
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
        }
    }
}

fn default_database_url() -> String {
    "data/intelhub.db".to_string()
}

/// Error type for configuration parsing
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    FileRead {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {message}")]
    ParseError { path: String, message: String },
}

impl Config {
    /// Load configuration from file.
    ///
    /// A missing or empty file yields the default configuration. Invalid
    /// YAML is reported with its location.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.display().to_string(),
            source: e,
        })?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config =
            serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.display().to_string(),
                message: format_yaml_error(&e),
            })?;

        Ok(config)
    }

    /// Load configuration from file with environment variable overrides.
    ///
    /// Recognized variables:
    /// - INTELHUB_SERVER_HOST
    /// - INTELHUB_SERVER_PORT
    /// - INTELHUB_SERVER_CORS_ORIGIN
    /// - INTELHUB_DATABASE_URL
    pub fn load_with_env(path: &std::path::Path) -> anyhow::Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("INTELHUB_SERVER_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("INTELHUB_SERVER_PORT") {
            if let Ok(port) = port.parse::<u16>() {
                self.server.port = port;
            }
        }
        if let Ok(cors_origin) = std::env::var("INTELHUB_SERVER_CORS_ORIGIN") {
            self.server.cors_origin = cors_origin;
        }
        if let Ok(url) = std::env::var("INTELHUB_DATABASE_URL") {
            self.database.url = url;
        }
    }
}

/// Format YAML parsing error with location and context
fn format_yaml_error(e: &serde_yaml::Error) -> String {
    if let Some(location) = e.location() {
        format!(
            "at line {}, column {}: {}",
            location.line(),
            location.column(),
            e
        )
    } else {
        e.to_string()
    }
}

// Shared mutex for tests that modify environment variables.
#[cfg(test)]
static CONFIG_ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn valid_host_strategy() -> impl Strategy<Value = String> {
        prop_oneof![
            (0u8..=255, 0u8..=255, 0u8..=255, 0u8..=255)
                .prop_map(|(a, b, c, d)| format!("{}.{}.{}.{}", a, b, c, d)),
            Just("localhost".to_string()),
            Just("0.0.0.0".to_string()),
            "[a-z][a-z0-9]{0,10}".prop_map(|s| s),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(20))]

        /// Serializing a config to YAML and loading it back preserves all fields.
        #[test]
        fn config_roundtrip(
            host in valid_host_strategy(),
            port in 1u16..=65535,
            url in "[a-z][a-z0-9_/]{0,20}\\.db",
        ) {
            let config = Config {
                server: ServerConfig {
                    host: host.clone(),
                    port,
                    cors_origin: "http://localhost:3000".to_string(),
                },
                database: DatabaseConfig { url: url.clone() },
            };

            let yaml = serde_yaml::to_string(&config).expect("Failed to serialize config");
            let mut file = NamedTempFile::new().expect("Failed to create temp file");
            write!(file, "{}", yaml).expect("Failed to write config");

            let parsed = Config::load(file.path()).expect("Failed to parse config");

            prop_assert_eq!(parsed.server.host, host);
            prop_assert_eq!(parsed.server.port, port);
            prop_assert_eq!(parsed.database.url, url);
        }

        /// Any partial config parses, with defaults filling the gaps.
        #[test]
        fn partial_config_fills_defaults(port in 1u16..=65535) {
            let mut file = NamedTempFile::new().expect("Failed to create temp file");
            write!(file, "server:\n  port: {}\n", port).expect("Failed to write config");

            let config = Config::load(file.path()).expect("Failed to parse config");

            prop_assert_eq!(config.server.port, port);
            prop_assert_eq!(config.server.host, "0.0.0.0");
            prop_assert_eq!(config.database.url, "data/intelhub.db");
        }
    }
}
