//! # llmdash-config
//!
//! Configuration for the llmdash usage dashboard.
//!
//! Settings are read from a YAML file (default `~/.config/llmdash/config.yaml`).
//! Every field is optional; anything left out takes its default. Command-line
//! flags are applied on top with [`DashboardConfig::apply_overrides`].
//!
//! ```yaml
//! store:
//!   path: ~/.config/io.datasette.llm/logs.db
//! server:
//!   port: 5000
//! query:
//!   top_records_limit: 10
//! ```

use std::path::{Path, PathBuf};

use llmdash_core::{DashError, Result, expand_home};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Default location of the `llm` CLI log database.
pub const DEFAULT_STORE_PATH: &str = "~/.config/io.datasette.llm/logs.db";

/// Marker found in the JSON of every usage-bearing response.
pub const DEFAULT_MARKER: &str = "chat.completion.chunk";

/// Upper bound for `query.top_records_limit`.
pub const MAX_TOP_RECORDS: usize = 1000;

/// Upper bound for `query.fallback_window_days` (about a century).
pub const MAX_FALLBACK_WINDOW_DAYS: u32 = 36_500;

/// Config file path (`~/.config/llmdash/config.yaml`).
pub fn config_path() -> Result<PathBuf> {
    Ok(llmdash_core::paths::config_dir()?.join("config.yaml"))
}

/// Top-level dashboard configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DashboardConfig {
    /// Log store location and filtering
    pub store: StoreConfig,

    /// HTTP listener
    pub server: ServerConfig,

    /// Query limits and fallbacks
    pub query: QueryConfig,

    /// Log output
    pub logging: LoggingConfig,
}

/// Log store configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StoreConfig {
    /// Path to the SQLite log database
    pub path: PathBuf,

    /// Substring that marks a usage-bearing response
    pub marker: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_STORE_PATH),
            marker: DEFAULT_MARKER.to_string(),
        }
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind
    pub host: String,

    /// Port to bind
    pub port: u16,

    /// Enable a permissive CORS layer
    pub cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            cors: true,
        }
    }
}

impl ServerConfig {
    /// `host:port` string for binding.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Query configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct QueryConfig {
    /// Number of records returned by the top-cost view
    pub top_records_limit: usize,

    /// Days covered by the date bounds when the store has no parseable dates
    pub fallback_window_days: u32,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            top_records_limit: 10,
            fallback_window_days: 30,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log directory (defaults to `~/.config/llmdash/logs`)
    pub dir: Option<PathBuf>,

    /// Debug-level logging
    pub verbose: bool,
}

/// Values supplied on the command line. `None` keeps the file value.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub store_path: Option<PathBuf>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub log_dir: Option<PathBuf>,
    pub verbose: bool,
    pub no_cors: bool,
}

impl DashboardConfig {
    /// Load configuration.
    ///
    /// With an explicit path the file must exist. Without one, the default
    /// path is tried and defaults are used when it is absent.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::load_from(path),
            None => {
                let path = config_path()?;
                if path.exists() {
                    Self::load_from(&path)
                } else {
                    debug!(path = %path.display(), "No config file, using defaults");
                    Ok(Self::default())
                }
            }
        }
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                DashError::config_not_found_with_source(path, e)
            } else {
                DashError::io("reading config", path, e)
            }
        })?;

        let config = Self::parse(&content).map_err(|e| DashError::config_invalid(path, &e))?;
        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Parse configuration from a YAML string.
    ///
    /// An empty document yields the defaults.
    pub fn parse(content: &str) -> std::result::Result<Self, serde_yaml::Error> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content)
    }

    /// Apply command-line overrides.
    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(path) = overrides.store_path {
            self.store.path = path;
        }
        if let Some(host) = overrides.host {
            self.server.host = host;
        }
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        if let Some(dir) = overrides.log_dir {
            self.logging.dir = Some(dir);
        }
        if overrides.verbose {
            self.logging.verbose = true;
        }
        if overrides.no_cors {
            self.server.cors = false;
        }
    }

    /// Expand `~` in every path setting.
    pub fn resolve_paths(&mut self) {
        self.store.path = expand_home(&self.store.path);
        if let Some(dir) = self.logging.dir.take() {
            self.logging.dir = Some(expand_home(dir));
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(DashError::config_validation("server.port must not be 0"));
        }

        if self.server.host.trim().is_empty() {
            return Err(DashError::config_validation("server.host must not be empty"));
        }

        if self.query.top_records_limit == 0 || self.query.top_records_limit > MAX_TOP_RECORDS {
            return Err(DashError::config_validation(format!(
                "query.top_records_limit must be between 1 and {}, got {}",
                MAX_TOP_RECORDS, self.query.top_records_limit
            )));
        }

        if self.query.fallback_window_days == 0
            || self.query.fallback_window_days > MAX_FALLBACK_WINDOW_DAYS
        {
            return Err(DashError::config_validation(format!(
                "query.fallback_window_days must be between 1 and {}, got {}",
                MAX_FALLBACK_WINDOW_DAYS, self.query.fallback_window_days
            )));
        }

        if self.store.marker.is_empty() {
            return Err(DashError::config_validation("store.marker must not be empty"));
        }

        if self.store.path.as_os_str().is_empty() {
            return Err(DashError::config_validation("store.path must not be empty"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = DashboardConfig::default();
        assert_eq!(config.store.path, PathBuf::from(DEFAULT_STORE_PATH));
        assert_eq!(config.store.marker, "chat.completion.chunk");
        assert_eq!(config.server.bind_addr(), "127.0.0.1:5000");
        assert!(config.server.cors);
        assert_eq!(config.query.top_records_limit, 10);
        assert_eq!(config.query.fallback_window_days, 30);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_partial_yaml() {
        let yaml = r#"
server:
  port: 8080
query:
  top_records_limit: 25
"#;
        let config = DashboardConfig::parse(yaml).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.query.top_records_limit, 25);
        assert_eq!(config.query.fallback_window_days, 30);
        assert_eq!(config.store.marker, DEFAULT_MARKER);
    }

    #[test]
    fn test_parse_empty_document() {
        assert_eq!(DashboardConfig::parse("  \n").unwrap(), DashboardConfig::default());
    }

    #[test]
    fn test_parse_invalid_yaml() {
        assert!(DashboardConfig::parse("server: [unclosed").is_err());
        assert!(DashboardConfig::parse("server:\n  port: not-a-port").is_err());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = DashboardConfig::default();
        config.server.port = 0;
        assert!(config.validate().unwrap_err().to_string().contains("server.port"));

        let mut config = DashboardConfig::default();
        config.query.top_records_limit = 0;
        assert!(config.validate().is_err());

        let mut config = DashboardConfig::default();
        config.query.top_records_limit = MAX_TOP_RECORDS + 1;
        assert!(config.validate().is_err());

        let mut config = DashboardConfig::default();
        config.query.fallback_window_days = 0;
        assert!(config.validate().is_err());

        let mut config = DashboardConfig::default();
        config.query.fallback_window_days = 100_000_000;
        assert!(
            config
                .validate()
                .unwrap_err()
                .to_string()
                .contains("fallback_window_days")
        );

        let mut config = DashboardConfig::default();
        config.query.fallback_window_days = MAX_FALLBACK_WINDOW_DAYS;
        assert!(config.validate().is_ok());

        let mut config = DashboardConfig::default();
        config.store.marker.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_apply_overrides() {
        let mut config = DashboardConfig::default();
        config.apply_overrides(ConfigOverrides {
            store_path: Some(PathBuf::from("/data/logs.db")),
            host: Some("0.0.0.0".to_string()),
            port: Some(9000),
            log_dir: None,
            verbose: true,
            no_cors: true,
        });

        assert_eq!(config.store.path, PathBuf::from("/data/logs.db"));
        assert_eq!(config.server.bind_addr(), "0.0.0.0:9000");
        assert!(config.logging.verbose);
        assert!(config.logging.dir.is_none());
        assert!(!config.server.cors);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "store:\n  path: /srv/logs.db\nlogging:\n  verbose: true").unwrap();

        let config = DashboardConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.store.path, PathBuf::from("/srv/logs.db"));
        assert!(config.logging.verbose);
    }

    #[test]
    fn test_load_explicit_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = DashboardConfig::load(Some(&dir.path().join("missing.yaml"))).unwrap_err();
        assert!(matches!(err, DashError::ConfigNotFound { .. }));
    }

    #[test]
    fn test_load_invalid_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "server: [").unwrap();
        let err = DashboardConfig::load_from(file.path()).unwrap_err();
        assert!(matches!(err, DashError::ConfigInvalid { .. }));
    }

    #[test]
    #[serial]
    fn test_load_default_path_absent_uses_defaults() {
        let home = tempfile::tempdir().unwrap();
        // SAFETY: serialized with every other test that touches HOME
        unsafe { std::env::set_var("HOME", home.path()) };

        let config = DashboardConfig::load(None).unwrap();
        assert_eq!(config, DashboardConfig::default());
    }

    #[test]
    #[serial]
    fn test_resolve_paths() {
        // SAFETY: serialized with every other test that touches HOME
        unsafe { std::env::set_var("HOME", "/tmp/test-home") };

        let mut config = DashboardConfig::default();
        config.logging.dir = Some(PathBuf::from("~/logs"));
        config.resolve_paths();

        assert_eq!(
            config.store.path,
            PathBuf::from("/tmp/test-home/.config/io.datasette.llm/logs.db")
        );
        assert_eq!(config.logging.dir, Some(PathBuf::from("/tmp/test-home/logs")));
    }
}
