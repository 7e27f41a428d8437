// RUNTIME CONFIGURATION (startup, read-only afterwards)

use crate::logging::LogLevel;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::env;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct LoggingPreferences {
    /// Whether to use structured JSON logging
    pub use_structured_logging: bool,

    /// Minimum level that reaches the logger
    pub min_log_level: LogLevel,

    /// Forward events to the `log` facade instead of writing directly
    pub forward_to_log_facade: bool,
}

impl Default for LoggingPreferences {
    fn default() -> Self {
        Self {
            use_structured_logging: env::var(env_vars::LOG_STRUCTURED)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            min_log_level: env::var(env_vars::LOG_LEVEL)
                .ok()
                .and_then(|v| LogLevel::parse(&v))
                .unwrap_or(LogLevel::Info),
            forward_to_log_facade: false,
        }
    }
}

impl LoggingPreferences {
    pub fn with_log_facade(mut self) -> Self {
        self.forward_to_log_facade = true;
        self
    }
}

/// Errors raised while resolving configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Cannot read configuration file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// Monitor configuration as read from file and environment
///
/// Fields left `None` fall back to derived defaults through the accessor
/// methods, so an empty file and an empty environment produce a usable
/// (if unscheduled) configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Collection endpoint; scheduling stays inactive without it
    pub api_endpoint: Option<String>,

    /// Shared secret; defaults to a hash of the host name
    pub api_secret: Option<String>,

    /// Accept loopback/internal endpoints (testing only)
    pub allow_loopback: bool,

    /// Directory holding the last-run record and schedule registry
    pub state_dir: Option<PathBuf>,

    /// Host inventory manifest exported by the host application
    pub host_manifest: Option<PathBuf>,

    /// Identity URL stamped into every report
    pub site_url: Option<String>,
}

impl MonitorConfig {
    /// Resolve configuration: optional TOML file, then environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = path
            .map(Path::to_path_buf)
            .or_else(|| non_empty(env::var(env_vars::CONFIG).ok()).map(PathBuf::from));

        let mut config = match file {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };

        config.apply_env_with(|key| env::var(key).ok());
        Ok(config)
    }

    /// Parse a TOML configuration file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }

    /// Overlay environment values; empty strings count as unset
    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(endpoint) = non_empty(lookup(env_vars::API_ENDPOINT)) {
            self.api_endpoint = Some(endpoint);
        }
        if let Some(secret) = non_empty(lookup(env_vars::API_SECRET)) {
            self.api_secret = Some(secret);
        }
        if let Some(flag) = non_empty(lookup(env_vars::ALLOW_LOOPBACK)) {
            self.allow_loopback = parse_flag(&flag);
        }
        if let Some(dir) = non_empty(lookup(env_vars::STATE_DIR)) {
            self.state_dir = Some(PathBuf::from(dir));
        }
        if let Some(manifest) = non_empty(lookup(env_vars::HOST_MANIFEST)) {
            self.host_manifest = Some(PathBuf::from(manifest));
        }
        if let Some(site) = non_empty(lookup(env_vars::SITE_URL)) {
            self.site_url = Some(site);
        }
    }

    /// Endpoint with trailing slashes trimmed, if configured
    pub fn api_endpoint(&self) -> Option<String> {
        non_empty(self.api_endpoint.clone()).map(|e| e.trim_end_matches('/').to_string())
    }

    /// Configured secret or the host-name hash
    pub fn api_secret(&self) -> String {
        non_empty(self.api_secret.clone()).unwrap_or_else(default_secret)
    }

    pub fn site_url(&self) -> String {
        non_empty(self.site_url.clone())
            .map(|s| s.trim_end_matches('/').to_string())
            .unwrap_or_else(|| format!("http://{}", host_name()))
    }

    pub fn state_dir(&self) -> PathBuf {
        self.state_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(".supmon"))
    }
}

/// Hex SHA-256 of the host name
pub fn default_secret() -> String {
    hex::encode(Sha256::digest(host_name().as_bytes()))
}

fn host_name() -> String {
    hostname::get()
        .unwrap_or_else(|_| std::ffi::OsString::from("localhost"))
        .to_string_lossy()
        .to_string()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Environment variable names for configuration
pub mod env_vars {
    pub const CONFIG: &str = "SUPMON_CONFIG";
    pub const API_ENDPOINT: &str = "SUPMON_API_ENDPOINT";
    pub const API_SECRET: &str = "SUPMON_API_SECRET";
    pub const ALLOW_LOOPBACK: &str = "SUPMON_ALLOW_LOOPBACK";
    pub const STATE_DIR: &str = "SUPMON_STATE_DIR";
    pub const HOST_MANIFEST: &str = "SUPMON_HOST_MANIFEST";
    pub const SITE_URL: &str = "SUPMON_SITE_URL";

    // Logging
    pub const LOG_LEVEL: &str = "SUPMON_LOG_LEVEL";
    pub const LOG_STRUCTURED: &str = "SUPMON_LOG_STRUCTURED";
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_env_overrides_file_values() {
        let mut config = MonitorConfig::from_toml_str(
            r#"
            api_endpoint = "https://file.example.com/report"
            allow_loopback = false
            "#,
        )
        .unwrap();

        config.apply_env_with(lookup(&[
            (env_vars::API_ENDPOINT, "https://env.example.com/report/"),
            (env_vars::ALLOW_LOOPBACK, "true"),
        ]));

        assert_eq!(
            config.api_endpoint().as_deref(),
            Some("https://env.example.com/report")
        );
        assert!(config.allow_loopback);
    }

    #[test]
    fn test_empty_env_values_are_ignored() {
        let mut config = MonitorConfig {
            api_endpoint: Some("https://keep.example.com".to_string()),
            ..Default::default()
        };
        config.apply_env_with(lookup(&[(env_vars::API_ENDPOINT, "  ")]));
        assert_eq!(
            config.api_endpoint().as_deref(),
            Some("https://keep.example.com")
        );
    }

    #[test]
    fn test_secret_defaults_to_host_hash() {
        let config = MonitorConfig::default();
        let secret = config.api_secret();
        assert_eq!(secret.len(), 64);
        assert_eq!(secret, default_secret());

        let explicit = MonitorConfig {
            api_secret: Some("shared".to_string()),
            ..Default::default()
        };
        assert_eq!(explicit.api_secret(), "shared");
    }

    #[test]
    fn test_missing_endpoint_is_none() {
        let config = MonitorConfig {
            api_endpoint: Some(String::new()),
            ..Default::default()
        };
        assert!(config.api_endpoint().is_none());
    }

    #[test]
    fn test_from_file_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("supmon.toml");
        std::fs::write(&path, "allow_loopback = \"not a bool\"").unwrap();

        let err = MonitorConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
