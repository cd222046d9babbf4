//! Configuration for Waypoint.
//!
//! ## config.kdl - Store settings
//!
//! Located at `WP_CONFIG`, or `~/.config/waypoint/config.kdl` by default.
//! A missing file is treated as empty.
//!
//! Contains:
//! - `document-path` - JSON document holding the directory
//! - `images-dir` - where `img/...` icons live
//! - `cache-ttl` - seconds a loaded document is served from memory
//! - `lock-timeout-ms` - give up on a busy store after this long
//! - `log-level` - `error`, `warn`, `info`, `debug` or `trace`
//!
//! ## Precedence
//!
//! CLI flag > environment variable > config.kdl > defaults
//!
//! Use the [`resolver`] module for precedence resolution.

pub mod resolver;
pub mod schema;

pub use resolver::{
    Resolved, ResolvedSettings, SettingsOverrides, ValueSource, resolve_settings,
    resolve_settings_with,
};
pub use schema::{Environment, LogLevel, StoreSettings};
