//! Precedence resolution for store settings.
//!
//! ## Precedence (highest to lowest)
//!
//! 1. CLI flags (passed at runtime)
//! 2. Environment variables
//! 3. config.kdl
//! 4. Built-in defaults
//!
//! The data directory anchors the defaults: `WP_DATA_DIR` if set, `/config`
//! inside a container, otherwise the platform data dir plus `waypoint`.

use crate::config::{Environment, LogLevel, StoreSettings};
use crate::storage::{DEFAULT_CACHE_TTL, StoreOptions};
use crate::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

pub const DATA_DIR_ENV: &str = "WP_DATA_DIR";
pub const CONFIG_PATH_ENV: &str = "WP_CONFIG";
pub const DOCUMENT_PATH_ENV: &str = "WP_DOCUMENT";
pub const IMAGES_DIR_ENV: &str = "WP_IMAGES_DIR";
pub const CACHE_TTL_ENV: &str = "CACHE_TTL";
pub const LOCK_TIMEOUT_ENV: &str = "WP_LOCK_TIMEOUT_MS";
pub const LOG_LEVEL_ENV: &str = "LOG_LEVEL";

/// Data directory used when running in a container.
pub const CONTAINER_DATA_DIR: &str = "/config";

/// Marker file the container runtime creates.
pub const DOCKERENV_PATH: &str = "/.dockerenv";

/// Tracks where a resolved value came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueSource {
    /// Value from CLI flag
    CliFlag,
    /// Value from environment variable
    EnvVar(String),
    /// Value from config.kdl
    ConfigFile,
    /// Derived from the detected runtime environment
    Detected,
    /// Built-in default value
    Default,
}

impl std::fmt::Display for ValueSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueSource::CliFlag => write!(f, "cli"),
            ValueSource::EnvVar(name) => write!(f, "env:{}", name),
            ValueSource::ConfigFile => write!(f, "config"),
            ValueSource::Detected => write!(f, "detected"),
            ValueSource::Default => write!(f, "default"),
        }
    }
}

/// A resolved value with its source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved<T> {
    /// The resolved value
    pub value: T,
    /// Where the value came from
    pub source: ValueSource,
}

impl<T> Resolved<T> {
    /// Create a new resolved value.
    pub fn new(value: T, source: ValueSource) -> Self {
        Self { value, source }
    }
}

/// CLI overrides for settings resolution.
#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    pub config_path: Option<PathBuf>,
    pub document_path: Option<PathBuf>,
    pub images_dir: Option<PathBuf>,
    pub cache_ttl: Option<u64>,
    pub lock_timeout_ms: Option<u64>,
}

impl SettingsOverrides {
    /// Create empty overrides.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    pub fn with_document_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.document_path = Some(path.into());
        self
    }

    pub fn with_images_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.images_dir = Some(dir.into());
        self
    }

    pub fn with_cache_ttl(mut self, seconds: u64) -> Self {
        self.cache_ttl = Some(seconds);
        self
    }

    pub fn with_lock_timeout_ms(mut self, millis: u64) -> Self {
        self.lock_timeout_ms = Some(millis);
        self
    }
}

/// Fully resolved settings with source tracking.
#[derive(Debug, Clone)]
pub struct ResolvedSettings {
    pub environment: Environment,
    pub data_dir: Resolved<PathBuf>,
    /// config.kdl location, and whether it existed
    pub config_path: Resolved<PathBuf>,
    pub config_file_found: bool,
    pub document_path: Resolved<PathBuf>,
    pub images_dir: Resolved<PathBuf>,
    pub cache_ttl: Resolved<Duration>,
    pub lock_timeout: Option<Resolved<Duration>>,
    pub log_level: Resolved<LogLevel>,
}

impl ResolvedSettings {
    /// Options for opening the [`crate::storage::Store`].
    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            cache_ttl: self.cache_ttl.value,
            lock_timeout: self.lock_timeout.as_ref().map(|r| r.value),
        }
    }

    /// Create the image directory. Skipped inside containers, where the
    /// runtime mounts it.
    pub fn ensure_directories(&self) -> Result<()> {
        if self.environment.is_container() {
            return Ok(());
        }
        let dir = &self.images_dir.value;
        fs::create_dir_all(dir).map_err(|source| {
            if source.kind() == std::io::ErrorKind::PermissionDenied {
                Error::AccessDenied {
                    path: dir.clone(),
                    source,
                }
            } else {
                Error::Io(source)
            }
        })?;
        Ok(())
    }
}

/// Resolve settings from the real process environment.
pub fn resolve_settings(overrides: &SettingsOverrides) -> Result<ResolvedSettings> {
    resolve_settings_with(
        overrides,
        |name| std::env::var(name).ok().filter(|v| !v.is_empty()),
        Path::new(DOCKERENV_PATH).exists(),
    )
}

/// Resolve settings against an arbitrary environment lookup.
///
/// `env` returns `None` for unset variables. `dockerenv_present` says whether
/// the container marker file exists.
pub fn resolve_settings_with<F>(
    overrides: &SettingsOverrides,
    env: F,
    dockerenv_present: bool,
) -> Result<ResolvedSettings>
where
    F: Fn(&str) -> Option<String>,
{
    let environment = Environment::detect(&env, dockerenv_present);
    let data_dir = resolve_data_dir(&env, environment)?;

    let config_path = if let Some(path) = &overrides.config_path {
        Resolved::new(path.clone(), ValueSource::CliFlag)
    } else if let Some(path) = env(CONFIG_PATH_ENV) {
        Resolved::new(PathBuf::from(path), env_source(CONFIG_PATH_ENV))
    } else {
        let path = dirs::config_dir()
            .map(|dir| dir.join("waypoint").join("config.kdl"))
            .unwrap_or_else(|| data_dir.value.join("config.kdl"));
        Resolved::new(path, ValueSource::Default)
    };
    let (file, config_file_found) = read_config_file(&config_path.value)?;

    // Resolve document path
    let document_path = if let Some(path) = &overrides.document_path {
        Resolved::new(path.clone(), ValueSource::CliFlag)
    } else if let Some(path) = env(DOCUMENT_PATH_ENV) {
        Resolved::new(PathBuf::from(path), env_source(DOCUMENT_PATH_ENV))
    } else if let Some(path) = &file.document_path {
        Resolved::new(path.clone(), ValueSource::ConfigFile)
    } else {
        Resolved::new(data_dir.value.join("config.json"), ValueSource::Default)
    };

    // Resolve image directory
    let images_dir = if let Some(dir) = &overrides.images_dir {
        Resolved::new(dir.clone(), ValueSource::CliFlag)
    } else if let Some(dir) = env(IMAGES_DIR_ENV) {
        Resolved::new(PathBuf::from(dir), env_source(IMAGES_DIR_ENV))
    } else if let Some(dir) = &file.images_dir {
        Resolved::new(dir.clone(), ValueSource::ConfigFile)
    } else {
        Resolved::new(data_dir.value.join("img"), ValueSource::Default)
    };

    // Resolve cache TTL
    let cache_ttl = if let Some(seconds) = overrides.cache_ttl {
        Resolved::new(Duration::from_secs(seconds), ValueSource::CliFlag)
    } else if let Some(raw) = env(CACHE_TTL_ENV) {
        let seconds = parse_env_number(CACHE_TTL_ENV, &raw)?;
        Resolved::new(Duration::from_secs(seconds), env_source(CACHE_TTL_ENV))
    } else if let Some(seconds) = file.cache_ttl {
        Resolved::new(Duration::from_secs(seconds), ValueSource::ConfigFile)
    } else {
        Resolved::new(DEFAULT_CACHE_TTL, ValueSource::Default)
    };

    // Resolve lock timeout; none means wait indefinitely
    let lock_timeout = if let Some(millis) = overrides.lock_timeout_ms {
        Some(Resolved::new(positive_millis(millis)?, ValueSource::CliFlag))
    } else if let Some(raw) = env(LOCK_TIMEOUT_ENV) {
        let millis = parse_env_number(LOCK_TIMEOUT_ENV, &raw)?;
        Some(Resolved::new(positive_millis(millis)?, env_source(LOCK_TIMEOUT_ENV)))
    } else {
        file.lock_timeout_ms
            .map(|millis| Resolved::new(Duration::from_millis(millis), ValueSource::ConfigFile))
    };

    // Resolve log level
    let log_level = if let Some(raw) = env(LOG_LEVEL_ENV) {
        let level = LogLevel::parse(&raw).ok_or_else(|| {
            Error::Config(format!("{} must be a log level, got '{}'", LOG_LEVEL_ENV, raw))
        })?;
        Resolved::new(level, env_source(LOG_LEVEL_ENV))
    } else if let Some(level) = file.log_level {
        Resolved::new(level, ValueSource::ConfigFile)
    } else {
        Resolved::new(environment.default_log_level(), ValueSource::Detected)
    };

    Ok(ResolvedSettings {
        environment,
        data_dir,
        config_path,
        config_file_found,
        document_path,
        images_dir,
        cache_ttl,
        lock_timeout,
        log_level,
    })
}

fn resolve_data_dir<F>(env: &F, environment: Environment) -> Result<Resolved<PathBuf>>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(dir) = env(DATA_DIR_ENV) {
        return Ok(Resolved::new(PathBuf::from(dir), env_source(DATA_DIR_ENV)));
    }
    if environment.is_container() {
        return Ok(Resolved::new(
            PathBuf::from(CONTAINER_DATA_DIR),
            ValueSource::Detected,
        ));
    }
    let base = dirs::data_dir()
        .ok_or_else(|| Error::Config("could not determine data directory".to_string()))?;
    Ok(Resolved::new(base.join("waypoint"), ValueSource::Default))
}

/// A missing config file is an empty one.
fn read_config_file(path: &Path) -> Result<(StoreSettings, bool)> {
    match fs::read_to_string(path) {
        Ok(text) => {
            let settings = StoreSettings::parse(&text).map_err(|e| match e {
                Error::Config(msg) => Error::Config(format!("{}: {}", path.display(), msg)),
                other => other,
            })?;
            debug!(path = %path.display(), "Loaded config.kdl");
            Ok((settings, true))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok((StoreSettings::new(), false)),
        Err(e) => Err(Error::Io(e)),
    }
}

fn env_source(name: &str) -> ValueSource {
    ValueSource::EnvVar(name.to_string())
}

fn parse_env_number(name: &str, raw: &str) -> Result<u64> {
    raw.trim().parse().map_err(|_| {
        Error::Config(format!("{} must be a non-negative integer, got '{}'", name, raw))
    })
}

fn positive_millis(millis: u64) -> Result<Duration> {
    if millis == 0 {
        return Err(Error::Config("lock timeout must be greater than 0".to_string()));
    }
    Ok(Duration::from_millis(millis))
}
