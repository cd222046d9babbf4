//! CLI argument definitions for Waypoint.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Waypoint - manage a link directory stored as one JSON document.
///
/// Run `wp` with no command for a summary, then `wp category list` to explore.
#[derive(Parser, Debug)]
#[command(name = "wp")]
#[command(author, version = crate::VERSION, about = "Manage a link directory of categories and items", long_about = None)]
pub struct Cli {
    /// Output in human-readable format instead of JSON
    #[arg(short = 'H', long = "human", global = true)]
    pub human_readable: bool,

    /// Path to config.kdl (default: ~/.config/waypoint/config.kdl)
    #[arg(long = "config", global = true)]
    pub config_path: Option<PathBuf>,

    /// JSON document to operate on
    #[arg(short = 'f', long = "file", global = true)]
    pub document_path: Option<PathBuf>,

    /// Directory that `img/...` icons resolve against
    #[arg(long = "images-dir", global = true)]
    pub images_dir: Option<PathBuf>,

    /// Seconds a loaded document may be served from the cache
    #[arg(long = "cache-ttl", global = true)]
    pub cache_ttl: Option<u64>,

    /// Fail with "busy" if the store lock is not acquired within this many milliseconds
    #[arg(long = "lock-timeout", global = true)]
    pub lock_timeout_ms: Option<u64>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Category management commands
    Category {
        #[command(subcommand)]
        command: CategoryCommands,
    },

    /// Item (link) management commands
    Item {
        #[command(subcommand)]
        command: ItemCommands,
    },

    /// Cache maintenance
    Cache {
        #[command(subcommand)]
        command: CacheCommands,
    },

    /// Configuration inspection
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

/// Category subcommands
#[derive(Subcommand, Debug)]
pub enum CategoryCommands {
    /// List categories in display order
    List,

    /// Show one category and its items
    Show {
        /// Category name
        name: String,
    },

    /// Append a new, empty category
    Add {
        /// Category name (must be unique)
        name: String,
    },

    /// Remove a category and all of its items
    Remove {
        /// Category name
        name: String,
    },

    /// Rename a category in place
    Rename {
        /// Current name
        old: String,
        /// New name
        new: String,
    },

    /// Put the named categories first, in the given order
    Reorder {
        /// Category names; unlisted categories keep their relative order
        #[arg(required = true)]
        names: Vec<String>,
    },
}

/// Item subcommands
#[derive(Subcommand, Debug)]
pub enum ItemCommands {
    /// Show one item
    Show {
        /// Category name
        category: String,
        /// Item title
        title: String,
    },

    /// Append an item to a category
    Add {
        /// Category name
        category: String,
        /// Item title (must be unique within the category)
        title: String,
        /// Link target
        url: String,
        /// Icon token (e.g. "fas fa-link") or image path "img/<file>"
        #[arg(short, long, default_value = "")]
        icon: String,
    },

    /// Change an item's title, URL or icon, keeping its position
    Update {
        /// Category name
        category: String,
        /// Current item title
        title: String,
        /// New title
        #[arg(long = "title", id = "new_title")]
        new_title: Option<String>,
        /// New URL
        #[arg(long)]
        url: Option<String>,
        /// New icon
        #[arg(long)]
        icon: Option<String>,
    },

    /// Remove an item
    Remove {
        /// Category name
        category: String,
        /// Item title
        title: String,
    },

    /// Put the named items first, in the given order
    Reorder {
        /// Category name
        category: String,
        /// Item titles; unlisted items keep their relative order
        #[arg(required = true)]
        titles: Vec<String>,
    },

    /// Swap an item with its neighbour
    Move {
        /// Category name
        category: String,
        /// Item title
        title: String,
        /// "up" or "down"
        direction: String,
    },

    /// Move an item to the end of another category
    Transfer {
        /// Source category
        from: String,
        /// Destination category
        to: String,
        /// Item title
        title: String,
    },
}

/// Cache subcommands
#[derive(Subcommand, Debug)]
pub enum CacheCommands {
    /// Drop the cached document so the next read goes to disk
    Invalidate,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show every resolved setting and where it came from
    Show,
}
