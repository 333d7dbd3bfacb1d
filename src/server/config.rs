//! Server configuration.
//!
//! Configuration can be loaded from:
//! 1. TOML file (`projboard.toml`, or a path given on the command line)
//! 2. Environment variables (with `PROJBOARD_` prefix)
//!
//! Environment variables override TOML configuration; command-line flags
//! applied by the binary override both.
//!
//! # Example TOML Configuration
//!
//! ```toml
//! [server]
//! host = "0.0.0.0"
//! port = 8080
//! base_path = "/data"
//! log_filter = "projboard=debug,info"
//!
//! [server.database]
//! path = "var/projects.sqlite"
//! seed = true
//! ```

use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Default configuration file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "projboard.toml";

/// Main server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to listen on.
    pub host: String,

    /// TCP port; `0` picks a free one.
    pub port: u16,

    /// Prefix in front of `/projects`.
    pub base_path: String,

    /// Database settings.
    pub database: DatabaseConfig,

    /// `tracing` filter used when `RUST_LOG` is not set.
    pub log_filter: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            base_path: "/data".to_string(),
            database: DatabaseConfig::default(),
            log_filter: "info".to_string(),
        }
    }
}

/// Database configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite file. `None` keeps everything in memory.
    pub path: Option<PathBuf>,

    /// Load the demo projects into an empty database.
    pub seed: bool,
}

impl ServerConfig {
    /// Load configuration from file and environment.
    ///
    /// With `path` the file must exist. Without it, `projboard.toml` is read
    /// when present and defaults are used otherwise.
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables
    /// 2. TOML configuration file
    /// 3. Default values
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match std::fs::read_to_string(DEFAULT_CONFIG_FILE) {
                Ok(contents) => Self::from_toml(&contents)?,
                Err(_) => Self::default(),
            },
        };
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path, without env overrides.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents =
            std::fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io {
                path: path.as_ref().display().to_string(),
                error: e.to_string(),
            })?;
        Self::from_toml(&contents)
    }

    /// Parse configuration from TOML content.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        #[derive(Deserialize)]
        struct FullConfig {
            #[serde(default)]
            server: ServerConfig,
        }

        let full: FullConfig =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;

        Ok(full.server)
    }

    /// Apply `PROJBOARD_*` environment variable overrides.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary lookup, keyed by env variable name.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("PROJBOARD_HOST") {
            self.host = host;
        }

        if let Some(port) = lookup("PROJBOARD_PORT") {
            self.port = port.trim().parse().map_err(|_| ConfigError::Invalid {
                field: "port",
                reason: format!("{port:?} is not a port number"),
            })?;
        }

        if let Some(base_path) = lookup("PROJBOARD_BASE_PATH") {
            self.base_path = base_path;
        }

        if let Some(db) = lookup("PROJBOARD_DB") {
            let db = db.trim();
            self.database.path = if db.is_empty() || db == ":memory:" {
                None
            } else {
                Some(PathBuf::from(db))
            };
        }

        if let Some(seed) = lookup("PROJBOARD_SEED") {
            self.database.seed = parse_flag(&seed).ok_or_else(|| ConfigError::Invalid {
                field: "database.seed",
                reason: format!("{seed:?} is not a boolean"),
            })?;
        }

        if let Some(filter) = lookup("PROJBOARD_LOG") {
            self.log_filter = filter;
        }

        Ok(())
    }

    /// Checks values and normalises `base_path` (`/` becomes empty).
    pub fn validate(&mut self) -> Result<(), ConfigError> {
        self.base_path = normalize_base_path(&self.base_path)?;
        self.host
            .parse::<IpAddr>()
            .map_err(|_| ConfigError::Invalid {
                field: "host",
                reason: format!("{:?} is not an IP address", self.host),
            })?;
        Ok(())
    }

    /// Address to bind.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip: IpAddr = self.host.parse().map_err(|_| ConfigError::Invalid {
            field: "host",
            reason: format!("{:?} is not an IP address", self.host),
        })?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

/// `base_path` must start with `/` and must not end with one; `/` alone
/// means "no prefix".
pub fn normalize_base_path(base_path: &str) -> Result<String, ConfigError> {
    let trimmed = base_path.trim();
    if trimmed.is_empty() || trimmed == "/" {
        return Ok(String::new());
    }
    if !trimmed.starts_with('/') {
        return Err(ConfigError::Invalid {
            field: "base_path",
            reason: format!("{trimmed:?} must start with '/'"),
        });
    }
    if trimmed.ends_with('/') {
        return Err(ConfigError::Invalid {
            field: "base_path",
            reason: format!("{trimmed:?} must not end with '/'"),
        });
    }
    Ok(trimmed.to_string())
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Configuration error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// IO error reading config file.
    #[error("failed to read config file {path}: {error}")]
    Io {
        /// File path.
        path: String,
        /// Error message.
        error: String,
    },
    /// Parse error in config file.
    #[error("failed to parse config: {0}")]
    Parse(String),
    /// A value is out of range or malformed.
    #[error("invalid {field}: {reason}")]
    Invalid {
        /// Offending setting.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8080);
        assert_eq!(config.base_path, "/data");
        assert_eq!(config.database.path, None);
        assert!(!config.database.seed);
    }

    #[test]
    fn test_toml_parsing() {
        let toml = r#"
            [server]
            port = 9000
            base_path = "/api"

            [server.database]
            path = "var/projects.sqlite"
            seed = true
        "#;

        let config = ServerConfig::from_toml(toml).unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.base_path, "/api");
        assert_eq!(
            config.database.path,
            Some(PathBuf::from("var/projects.sqlite"))
        );
        assert!(config.database.seed);
        // Unspecified values keep their defaults.
        assert_eq!(config.host, "127.0.0.1");
    }

    #[test]
    fn test_empty_toml_is_default() {
        assert_eq!(ServerConfig::from_toml("").unwrap(), ServerConfig::default());
    }

    #[test]
    fn test_toml_parse_error() {
        assert!(matches!(
            ServerConfig::from_toml("[server]\nport = \"many\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("PROJBOARD_PORT", "0"),
            ("PROJBOARD_DB", ":memory:"),
            ("PROJBOARD_SEED", "yes"),
            ("PROJBOARD_LOG", "debug"),
        ]
        .into_iter()
        .collect();

        let mut config = ServerConfig::default();
        config.database.path = Some(PathBuf::from("old.sqlite"));
        config
            .apply_overrides(|key| env.get(key).map(|v| (*v).to_string()))
            .unwrap();

        assert_eq!(config.port, 0);
        assert_eq!(config.database.path, None);
        assert!(config.database.seed);
        assert_eq!(config.log_filter, "debug");
    }

    #[test]
    fn test_bad_env_port() {
        let mut config = ServerConfig::default();
        let err = config
            .apply_overrides(|key| (key == "PROJBOARD_PORT").then(|| "http".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "port", .. }));
    }

    #[test]
    fn test_base_path_rules() {
        assert_eq!(normalize_base_path("/").unwrap(), "");
        assert_eq!(normalize_base_path("").unwrap(), "");
        assert_eq!(normalize_base_path("/data").unwrap(), "/data");
        assert!(normalize_base_path("data").is_err());
        assert!(normalize_base_path("/data/").is_err());
    }

    #[test]
    fn test_socket_addr() {
        let mut config = ServerConfig::default();
        config.port = 0;
        assert_eq!(config.socket_addr().unwrap().port(), 0);
        config.host = "localhost".to_string();
        assert!(config.validate().is_err());
    }
}
