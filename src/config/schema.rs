//! KDL schema for config.kdl.
//!
//! This module provides:
//! - Rust structs representing the KDL schema
//! - Parsing from KDL format
//! - Validation
//! - Runtime environment and log level enums

use crate::{Error, Result};
use kdl::{KdlDocument, KdlValue};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Log verbosity for the `wp` binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Parse from string, case-insensitive. `warning` is accepted for `warn`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "error" => Some(LogLevel::Error),
            "warn" | "warning" => Some(LogLevel::Warn),
            "info" => Some(LogLevel::Info),
            "debug" => Some(LogLevel::Debug),
            "trace" => Some(LogLevel::Trace),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Where the process is running. Drives the default data directory and log level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Docker,
    Development,
    Production,
}

impl Environment {
    /// Classify from environment variables and whether `/.dockerenv` exists.
    ///
    /// A container always wins over a development flag.
    pub fn detect<F>(env: F, dockerenv_present: bool) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let docker_flag = env("DOCKER_CONTAINER").is_some_and(|v| v == "true");
        if dockerenv_present || docker_flag {
            return Environment::Docker;
        }

        let development = ["WP_ENV", "ENVIRONMENT"]
            .iter()
            .any(|name| env(name).is_some_and(|v| v == "development"));
        if development {
            Environment::Development
        } else {
            Environment::Production
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Docker => "docker",
            Environment::Development => "development",
            Environment::Production => "production",
        }
    }

    pub fn is_container(&self) -> bool {
        matches!(self, Environment::Docker)
    }

    pub fn default_log_level(&self) -> LogLevel {
        match self {
            Environment::Development => LogLevel::Debug,
            Environment::Docker | Environment::Production => LogLevel::Warn,
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Settings stored in config.kdl. Every field is optional; unset fields fall
/// through to environment variables and then to built-in defaults.
///
/// # KDL Schema
///
/// ```kdl
/// document-path "/srv/waypoint/config.json"
/// images-dir "/srv/waypoint/img"
/// cache-ttl 30
/// lock-timeout-ms 500
/// log-level "info"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSettings {
    /// Path of the JSON directory document
    pub document_path: Option<PathBuf>,

    /// Directory that `img/...` icons resolve against
    pub images_dir: Option<PathBuf>,

    /// Cache TTL in seconds
    pub cache_ttl: Option<u64>,

    /// Store lock deadline in milliseconds
    pub lock_timeout_ms: Option<u64>,

    pub log_level: Option<LogLevel>,
}

impl StoreSettings {
    /// Create empty settings with no values set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the values.
    ///
    /// Returns an error message if any value is invalid.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if let Some(path) = &self.document_path {
            if path.as_os_str().is_empty() {
                return Err("document-path must not be empty".to_string());
            }
        }
        if let Some(dir) = &self.images_dir {
            if dir.as_os_str().is_empty() {
                return Err("images-dir must not be empty".to_string());
            }
        }
        if self.lock_timeout_ms == Some(0) {
            return Err("lock-timeout-ms must be greater than 0".to_string());
        }
        Ok(())
    }

    /// Parse settings from a KDL document.
    ///
    /// Unknown nodes are ignored. A known node with a value of the wrong
    /// type is an error, the same as a bad environment variable.
    pub fn from_kdl(doc: &KdlDocument) -> std::result::Result<Self, String> {
        let log_level = match string_value(doc, "log-level")? {
            Some(raw) => Some(
                LogLevel::parse(&raw)
                    .ok_or_else(|| format!("log-level must be a log level, got '{}'", raw))?,
            ),
            None => None,
        };
        Ok(Self {
            document_path: string_value(doc, "document-path")?.map(PathBuf::from),
            images_dir: string_value(doc, "images-dir")?.map(PathBuf::from),
            cache_ttl: unsigned_value(doc, "cache-ttl")?,
            lock_timeout_ms: unsigned_value(doc, "lock-timeout-ms")?,
            log_level,
        })
    }

    /// Parse and validate config.kdl text.
    pub fn parse(text: &str) -> Result<Self> {
        let doc: KdlDocument = text
            .parse()
            .map_err(|e| Error::Config(format!("invalid config.kdl: {}", e)))?;
        let settings = Self::from_kdl(&doc).map_err(Error::Config)?;
        settings.validate().map_err(Error::Config)?;
        Ok(settings)
    }
}

/// First argument of node `name`, if the node is present.
fn first_value<'a>(doc: &'a KdlDocument, name: &str) -> std::result::Result<Option<&'a KdlValue>, String> {
    let Some(node) = doc.get(name) else {
        return Ok(None);
    };
    node.entries()
        .first()
        .map(|entry| Some(entry.value()))
        .ok_or_else(|| format!("{} needs a value", name))
}

fn string_value(doc: &KdlDocument, name: &str) -> std::result::Result<Option<String>, String> {
    match first_value(doc, name)? {
        None => Ok(None),
        Some(value) => value
            .as_string()
            .map(|s| Some(s.to_string()))
            .ok_or_else(|| format!("{} must be a string, got {}", name, value)),
    }
}

fn unsigned_value(doc: &KdlDocument, name: &str) -> std::result::Result<Option<u64>, String> {
    match first_value(doc, name)? {
        None => Ok(None),
        Some(value) => value
            .as_integer()
            .and_then(|n| u64::try_from(n).ok())
            .map(Some)
            .ok_or_else(|| format!("{} must be a non-negative integer, got {}", name, value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env_of(pairs: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        move |name| {
            pairs
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| value.to_string())
        }
    }

    // ==================== LogLevel Tests ====================

    #[test]
    fn test_log_level_parse() {
        assert_eq!(LogLevel::parse("INFO"), Some(LogLevel::Info));
        assert_eq!(LogLevel::parse("warning"), Some(LogLevel::Warn));
        assert_eq!(LogLevel::parse(" debug "), Some(LogLevel::Debug));
        assert_eq!(LogLevel::parse("loud"), None);
    }

    #[test]
    fn test_log_level_display() {
        assert_eq!(format!("{}", LogLevel::Warn), "warn");
        assert_eq!(LogLevel::Trace.as_str(), "trace");
    }

    // ==================== Environment Tests ====================

    #[test]
    fn test_environment_defaults_to_production() {
        assert_eq!(Environment::detect(env_of(&[]), false), Environment::Production);
    }

    #[test]
    fn test_environment_docker_marker() {
        assert_eq!(Environment::detect(env_of(&[]), true), Environment::Docker);
        assert_eq!(
            Environment::detect(env_of(&[("DOCKER_CONTAINER", "true")]), false),
            Environment::Docker
        );
        assert_eq!(
            Environment::detect(env_of(&[("DOCKER_CONTAINER", "1")]), false),
            Environment::Production
        );
    }

    #[test]
    fn test_environment_development() {
        assert_eq!(
            Environment::detect(env_of(&[("ENVIRONMENT", "development")]), false),
            Environment::Development
        );
        assert_eq!(
            Environment::detect(env_of(&[("WP_ENV", "development")]), false),
            Environment::Development
        );
        // Container detection takes priority.
        assert_eq!(
            Environment::detect(env_of(&[("WP_ENV", "development")]), true),
            Environment::Docker
        );
    }

    #[test]
    fn test_environment_log_level() {
        assert_eq!(Environment::Development.default_log_level(), LogLevel::Debug);
        assert_eq!(Environment::Production.default_log_level(), LogLevel::Warn);
        assert_eq!(Environment::Docker.default_log_level(), LogLevel::Warn);
        assert!(Environment::Docker.is_container());
    }

    // ==================== StoreSettings Tests ====================

    #[test]
    fn test_settings_from_kdl_empty() {
        let doc = KdlDocument::new();
        assert_eq!(StoreSettings::from_kdl(&doc).unwrap(), StoreSettings::default());
    }

    #[test]
    fn test_settings_from_kdl_full() {
        let kdl = r#"
            document-path "/srv/links/config.json"
            images-dir "/srv/links/img"
            cache-ttl 5
            lock-timeout-ms 250
            log-level "info"
            unrelated "value"
        "#;
        let doc: KdlDocument = kdl.parse().unwrap();
        let settings = StoreSettings::from_kdl(&doc).unwrap();

        assert_eq!(settings.document_path, Some(PathBuf::from("/srv/links/config.json")));
        assert_eq!(settings.images_dir, Some(PathBuf::from("/srv/links/img")));
        assert_eq!(settings.cache_ttl, Some(5));
        assert_eq!(settings.lock_timeout_ms, Some(250));
        assert_eq!(settings.log_level, Some(LogLevel::Info));
    }

    #[test]
    fn test_settings_from_kdl_rejects_bad_values() {
        let cases = [
            ("cache-ttl -3", "cache-ttl"),
            ("cache-ttl \"30\"", "cache-ttl"),
            ("lock-timeout-ms \"soon\"", "lock-timeout-ms"),
            ("log-level \"loud\"", "log-level"),
            ("images-dir 5", "images-dir"),
            ("document-path", "document-path"),
        ];
        for (kdl, key) in cases {
            let doc: KdlDocument = kdl.parse().unwrap();
            let err = StoreSettings::from_kdl(&doc).unwrap_err();
            assert!(err.contains(key), "{kdl}: {err}");
        }
    }

    #[test]
    fn test_settings_validate() {
        assert!(StoreSettings::default().validate().is_ok());

        let zero_timeout = StoreSettings {
            lock_timeout_ms: Some(0),
            ..Default::default()
        };
        assert!(zero_timeout.validate().unwrap_err().contains("lock-timeout-ms"));

        let empty_path = StoreSettings {
            document_path: Some(PathBuf::new()),
            ..Default::default()
        };
        assert!(empty_path.validate().unwrap_err().contains("document-path"));
    }

    #[test]
    fn test_settings_parse_errors() {
        assert!(matches!(
            StoreSettings::parse("document-path \"unterminated"),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            StoreSettings::parse("lock-timeout-ms 0"),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            StoreSettings::parse("log-level \"loud\""),
            Err(Error::Config(_))
        ));
        assert_eq!(StoreSettings::parse("").unwrap(), StoreSettings::default());
    }
}
