//! Command implementations for the Waypoint CLI.
//!
//! This module contains the logic behind each CLI command. Commands are
//! organized by entity type:
//! - `category` - list, show and restructure categories
//! - `item` - link CRUD and ordering within and across categories
//! - `cache` - cache maintenance
//! - `config` - resolved settings
//!
//! Every command returns a result type implementing [`Output`], so `main`
//! can print it as JSON or as human-readable text.

use crate::config::{Resolved, ResolvedSettings};
use crate::models::{Category, Direction, Item, Outcome};
use crate::storage::Store;
use crate::{Error, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Command results that can be serialized to JSON or formatted for humans.
pub trait Output {
    /// Serialize to JSON string.
    fn to_json(&self) -> String;

    /// Format for human-readable output.
    fn to_human(&self) -> String;
}

fn json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| format!(r#"{{"error": "{}"}}"#, e))
}

fn require_non_empty(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::InvalidInput(format!("{} must not be empty", field)));
    }
    Ok(())
}

/// Fail with `NotFound` unless the category exists.
fn require_category(store: &Store, name: &str) -> Result<()> {
    store.find_category(name).map(|_| ())
}

// ============================================================================
// Summary
// ============================================================================

/// Overview printed when `wp` runs without a command.
#[derive(Serialize)]
pub struct Summary {
    pub location: String,
    pub categories: usize,
    pub items: usize,
    pub cache_ttl_secs: u64,
    /// `None` when the store waits for its lock without a deadline
    pub lock_timeout_ms: Option<u128>,
}

impl Output for Summary {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        let mut text = format!(
            "Waypoint directory: {}\n  {} categories, {} items (cache TTL {}s)",
            self.location, self.categories, self.items, self.cache_ttl_secs
        );
        if let Some(millis) = self.lock_timeout_ms {
            text.push_str(&format!("\n  Lock timeout: {}ms", millis));
        }
        text
    }
}

pub fn summary(store: &Store) -> Result<Summary> {
    let doc = store.load_document(true)?;
    Ok(Summary {
        location: store.location(),
        categories: doc.categories.len(),
        items: doc.item_count(),
        cache_ttl_secs: store.cache_ttl().as_secs(),
        lock_timeout_ms: store.lock_timeout().map(|timeout| timeout.as_millis()),
    })
}

// ============================================================================
// Mutation results
// ============================================================================

/// Result of any command that changes the directory.
#[derive(Serialize)]
pub struct Changed {
    pub op: &'static str,
    pub outcome: Outcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip)]
    description: String,
}

impl Changed {
    fn new(op: &'static str, outcome: Outcome, description: String) -> Self {
        Self {
            op,
            outcome,
            category: None,
            title: None,
            description,
        }
    }

    fn category(mut self, name: &str) -> Self {
        self.category = Some(name.to_string());
        self
    }

    fn title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }
}

impl Output for Changed {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        match self.outcome {
            Outcome::Applied => self.description.clone(),
            Outcome::Unchanged => format!("No change: {}", self.description),
        }
    }
}

// ============================================================================
// Category commands
// ============================================================================

#[derive(Serialize)]
pub struct CategorySummary {
    pub name: String,
    pub items: usize,
}

#[derive(Serialize)]
pub struct CategoryList {
    pub count: usize,
    pub categories: Vec<CategorySummary>,
}

impl Output for CategoryList {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        if self.categories.is_empty() {
            return "No categories.".to_string();
        }
        let mut lines = vec![format!("{} categories:", self.count)];
        for category in &self.categories {
            lines.push(format!("  {} ({} items)", category.name, category.items));
        }
        lines.join("\n")
    }
}

pub fn category_list(store: &Store) -> Result<CategoryList> {
    let categories: Vec<CategorySummary> = store
        .list_categories()?
        .into_iter()
        .map(|c| CategorySummary {
            items: c.items.len(),
            name: c.name,
        })
        .collect();
    Ok(CategoryList {
        count: categories.len(),
        categories,
    })
}

#[derive(Serialize)]
#[serde(transparent)]
pub struct CategoryShown(pub Category);

impl Output for CategoryShown {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        let category = &self.0;
        let mut lines = vec![format!("{} ({} items)", category.name, category.items.len())];
        for (i, item) in category.items.iter().enumerate() {
            if item.icon.is_empty() {
                lines.push(format!("  {}. {}  {}", i + 1, item.title, item.url));
            } else {
                lines.push(format!("  {}. {}  {}  [{}]", i + 1, item.title, item.url, item.icon));
            }
        }
        lines.join("\n")
    }
}

pub fn category_show(store: &Store, name: &str) -> Result<CategoryShown> {
    Ok(CategoryShown(store.find_category(name)?))
}

pub fn category_add(store: &Store, name: &str) -> Result<Changed> {
    require_non_empty("category name", name)?;
    let outcome = store.add_category(name)?;
    Ok(Changed::new("add_category", outcome, format!("Added category {}", name)).category(name))
}

pub fn category_remove(store: &Store, name: &str) -> Result<Changed> {
    let outcome = store.remove_category(name)?;
    let description = match outcome {
        Outcome::Applied => format!("Removed category {}", name),
        Outcome::Unchanged => format!("category {} does not exist", name),
    };
    Ok(Changed::new("remove_category", outcome, description).category(name))
}

pub fn category_rename(store: &Store, old: &str, new: &str) -> Result<Changed> {
    require_non_empty("category name", new)?;
    require_category(store, old)?;
    let outcome = store.rename_category(old, new)?;
    let description = match outcome {
        Outcome::Applied => format!("Renamed category {} to {}", old, new),
        Outcome::Unchanged => format!("category {} already named {}", old, new),
    };
    Ok(Changed::new("rename_category", outcome, description).category(new))
}

pub fn category_reorder(store: &Store, names: &[String]) -> Result<Changed> {
    let outcome = store.reorder_categories(names)?;
    let description = match outcome {
        Outcome::Applied => format!("Reordered categories: {}", names.join(", ")),
        Outcome::Unchanged => "categories already in that order".to_string(),
    };
    Ok(Changed::new("reorder_categories", outcome, description))
}

// ============================================================================
// Item commands
// ============================================================================

#[derive(Serialize)]
pub struct ItemShown {
    pub category: String,
    #[serde(flatten)]
    pub item: Item,
    /// Resolved file for `img/...` icons
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_path: Option<PathBuf>,
}

impl Output for ItemShown {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        let mut lines = vec![
            format!("{} / {}", self.category, self.item.title),
            format!("  URL:  {}", self.item.url),
        ];
        if !self.item.icon.is_empty() {
            lines.push(format!("  Icon: {}", self.item.icon));
        }
        if let Some(path) = &self.image_path {
            lines.push(format!("  File: {}", path.display()));
        }
        lines.join("\n")
    }
}

pub fn item_show(store: &Store, images_dir: &Path, category: &str, title: &str) -> Result<ItemShown> {
    let item = store.find_item(category, title)?;
    Ok(ItemShown {
        category: category.to_string(),
        image_path: item.image_path(images_dir),
        item,
    })
}

pub fn item_add(store: &Store, category: &str, title: &str, url: &str, icon: &str) -> Result<Changed> {
    require_non_empty("title", title)?;
    require_non_empty("url", url)?;
    require_category(store, category)?;

    let outcome = store.add_item(category, Item::new(title, url, icon))?;
    Ok(
        Changed::new("add_item", outcome, format!("Added {} to {}", title, category))
            .category(category)
            .title(title),
    )
}

pub fn item_update(
    store: &Store,
    category: &str,
    title: &str,
    new_title: Option<&str>,
    url: Option<&str>,
    icon: Option<&str>,
) -> Result<Changed> {
    if new_title.is_none() && url.is_none() && icon.is_none() {
        return Err(Error::InvalidInput(
            "nothing to update: pass --title, --url or --icon".to_string(),
        ));
    }

    // Start from the stored item so unknown keys survive the update.
    let mut item = store.find_item(category, title)?;
    if let Some(new_title) = new_title {
        require_non_empty("title", new_title)?;
        item.title = new_title.to_string();
    }
    if let Some(url) = url {
        require_non_empty("url", url)?;
        item.url = url.to_string();
    }
    if let Some(icon) = icon {
        item.icon = icon.to_string();
    }

    let final_title = item.title.clone();
    let outcome = store.update_item(category, title, item)?;
    let description = match outcome {
        Outcome::Applied => format!("Updated {} in {}", final_title, category),
        Outcome::Unchanged => format!("{} in {} already up to date", title, category),
    };
    Ok(Changed::new("update_item", outcome, description)
        .category(category)
        .title(&final_title))
}

pub fn item_remove(store: &Store, category: &str, title: &str) -> Result<Changed> {
    require_category(store, category)?;
    let outcome = store.remove_item(category, title)?;
    let description = match outcome {
        Outcome::Applied => format!("Removed {} from {}", title, category),
        Outcome::Unchanged => format!("{} is not in {}", title, category),
    };
    Ok(Changed::new("remove_item", outcome, description)
        .category(category)
        .title(title))
}

pub fn item_reorder(store: &Store, category: &str, titles: &[String]) -> Result<Changed> {
    require_category(store, category)?;
    let outcome = store.reorder_items(category, titles)?;
    let description = match outcome {
        Outcome::Applied => format!("Reordered {}: {}", category, titles.join(", ")),
        Outcome::Unchanged => format!("items in {} already in that order", category),
    };
    Ok(Changed::new("reorder_items", outcome, description).category(category))
}

pub fn item_move(store: &Store, category: &str, title: &str, direction: &str) -> Result<Changed> {
    let direction: Direction = direction.parse()?;
    require_category(store, category)?;
    let outcome = store.move_item(category, title, direction)?;
    let description = match outcome {
        Outcome::Applied => format!("Moved {} {} in {}", title, direction, category),
        Outcome::Unchanged => format!("{} cannot move {} in {}", title, direction, category),
    };
    Ok(Changed::new("move_item", outcome, description)
        .category(category)
        .title(title))
}

pub fn item_transfer(store: &Store, from: &str, to: &str, title: &str) -> Result<Changed> {
    require_category(store, from)?;
    let outcome = store.move_item_between_categories(from, to, title)?;
    let description = match outcome {
        Outcome::Applied => format!("Moved {} from {} to {}", title, from, to),
        Outcome::Unchanged => format!("{} is not in {}", title, from),
    };
    Ok(Changed::new("transfer_item", outcome, description)
        .category(to)
        .title(title))
}

// ============================================================================
// Cache and config commands
// ============================================================================

#[derive(Serialize)]
pub struct CacheInvalidated {
    pub invalidated: bool,
    pub location: String,
}

impl Output for CacheInvalidated {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        format!("Cache invalidated for {}", self.location)
    }
}

pub fn cache_invalidate(store: &Store) -> Result<CacheInvalidated> {
    store.invalidate_cache()?;
    Ok(CacheInvalidated {
        invalidated: true,
        location: store.location(),
    })
}

#[derive(Serialize)]
pub struct SettingEntry {
    pub key: &'static str,
    pub value: String,
    pub source: String,
}

impl SettingEntry {
    fn from_resolved<T>(key: &'static str, resolved: &Resolved<T>, render: impl Fn(&T) -> String) -> Self {
        Self {
            key,
            value: render(&resolved.value),
            source: resolved.source.to_string(),
        }
    }
}

#[derive(Serialize)]
pub struct ConfigShown {
    pub environment: String,
    pub config_file: String,
    pub config_file_found: bool,
    pub settings: Vec<SettingEntry>,
}

impl Output for ConfigShown {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        let found = if self.config_file_found { "" } else { " (not found)" };
        let mut lines = vec![
            format!("Environment: {}", self.environment),
            format!("Config file: {}{}", self.config_file, found),
        ];
        let width = self.settings.iter().map(|s| s.key.len()).max().unwrap_or(0);
        for entry in &self.settings {
            lines.push(format!(
                "  {:width$}  {}  [{}]",
                entry.key,
                entry.value,
                entry.source,
                width = width
            ));
        }
        lines.join("\n")
    }
}

pub fn config_show(settings: &ResolvedSettings) -> ConfigShown {
    let path = |p: &PathBuf| p.display().to_string();
    let mut entries = vec![
        SettingEntry::from_resolved("data-dir", &settings.data_dir, path),
        SettingEntry::from_resolved("document-path", &settings.document_path, path),
        SettingEntry::from_resolved("images-dir", &settings.images_dir, path),
        SettingEntry::from_resolved("cache-ttl", &settings.cache_ttl, |d| d.as_secs().to_string()),
    ];
    entries.push(match &settings.lock_timeout {
        Some(timeout) => {
            SettingEntry::from_resolved("lock-timeout-ms", timeout, |d| d.as_millis().to_string())
        }
        None => SettingEntry {
            key: "lock-timeout-ms",
            value: "none".to_string(),
            source: "default".to_string(),
        },
    });
    entries.push(SettingEntry::from_resolved("log-level", &settings.log_level, |l| {
        l.to_string()
    }));

    ConfigShown {
        environment: settings.environment.to_string(),
        config_file: settings.config_path.value.display().to_string(),
        config_file_found: settings.config_file_found,
        settings: entries,
    }
}
