//! Common test utilities for waypoint integration tests.
//!
//! Provides `TestEnv` for isolated test environments that don't touch the
//! user's `~/.local/share/waypoint/` directory or config file.

#![allow(dead_code)]

use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};
pub use tempfile::TempDir;

/// Variables the `wp` binary reads; cleared so the caller's shell cannot leak in.
const SCRUBBED_VARS: &[&str] = &[
    "WP_DOCUMENT",
    "WP_IMAGES_DIR",
    "CACHE_TTL",
    "WP_LOCK_TIMEOUT_MS",
    "LOG_LEVEL",
    "RUST_LOG",
    "WP_ENV",
    "ENVIRONMENT",
];

/// A test environment with isolated data storage.
///
/// The `wp()` method returns a `Command` with `WP_DATA_DIR` and `WP_CONFIG`
/// pointing into a temp directory, set per-invocation so tests stay
/// parallel-safe.
pub struct TestEnv {
    pub data_dir: TempDir,
}

impl TestEnv {
    /// Create a new test environment with an empty data directory.
    pub fn new() -> Self {
        Self {
            data_dir: TempDir::new().unwrap(),
        }
    }

    /// Create an environment with `Work` (Docs, Mail, Chat) and an empty `Home`.
    pub fn seeded() -> Self {
        let env = Self::new();
        env.wp().args(["category", "add", "Work"]).assert().success();
        env.wp().args(["category", "add", "Home"]).assert().success();
        for title in ["Docs", "Mail", "Chat"] {
            let url = format!("https://{}.example", title.to_lowercase());
            env.wp()
                .args(["item", "add", "Work", title, &url])
                .assert()
                .success();
        }
        env
    }

    /// Get a Command for the wp binary with isolated data directory.
    pub fn wp(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_wp"));
        cmd.current_dir(self.data_dir.path());
        cmd.env("WP_DATA_DIR", self.data_dir.path());
        cmd.env("WP_CONFIG", self.config_path());
        for var in SCRUBBED_VARS {
            cmd.env_remove(var);
        }
        cmd
    }

    /// Get the path to the data directory.
    pub fn data_path(&self) -> &Path {
        self.data_dir.path()
    }

    /// Default document location inside the data directory.
    pub fn document_path(&self) -> PathBuf {
        self.data_dir.path().join("config.json")
    }

    pub fn config_path(&self) -> PathBuf {
        self.data_dir.path().join("config.kdl")
    }

    pub fn write_config(&self, contents: &str) {
        fs::write(self.config_path(), contents).unwrap();
    }

    pub fn read_document(&self) -> String {
        fs::read_to_string(self.document_path()).unwrap()
    }

    pub fn write_document(&self, contents: &str) {
        fs::write(self.document_path(), contents).unwrap();
    }

    /// Parse the on-disk document.
    pub fn document_json(&self) -> serde_json::Value {
        serde_json::from_str(&self.read_document()).unwrap()
    }

    /// Item titles of `category` as stored on disk.
    pub fn titles(&self, category: &str) -> Vec<String> {
        let doc = self.document_json();
        doc["categories"]
            .as_array()
            .unwrap()
            .iter()
            .find(|c| c["name"] == category)
            .map(|c| {
                c["items"]
                    .as_array()
                    .map(|items| {
                        items
                            .iter()
                            .map(|i| i["title"].as_str().unwrap().to_string())
                            .collect()
                    })
                    .unwrap_or_default()
            })
            .unwrap_or_default()
    }

    /// Category names as stored on disk.
    pub fn category_names(&self) -> Vec<String> {
        self.document_json()["categories"]
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["name"].as_str().unwrap().to_string())
            .collect()
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a command's stdout as JSON.
pub fn stdout_json(output: &std::process::Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).unwrap()
}
