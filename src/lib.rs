//! Waypoint - a link directory store.
//!
//! This library provides the core of the `wp` CLI and of any service that
//! embeds the directory: a single JSON document of categories and items,
//! guarded by one lock, cached for a bounded time, and persisted with
//! crash-safe atomic writes.

pub mod cli;
pub mod commands;
pub mod config;
pub mod models;
pub mod storage;

use std::path::PathBuf;
use std::time::Duration;

/// Package version plus the commit it was built from.
pub const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("WP_GIT_COMMIT"), ")");


/// Library-level error type for Waypoint operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Corrupt document {}: {source}", path.display())]
    CorruptDocument {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Access denied: {}: {source}", path.display())]
    AccessDenied {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Write failed for {}: {source}", path.display())]
    WriteFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Store busy: lock not acquired within {0:?}")]
    Busy(Duration),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Config error: {0}")]
    Config(String),
}

/// Result type alias for Waypoint operations.
pub type Result<T> = std::result::Result<T, Error>;
