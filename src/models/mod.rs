//! Data models for the link directory.
//!
//! This module defines the core data structures:
//! - `Document` - The whole persisted directory (ordered categories)
//! - `Category` - A named, ordered group of items
//! - `Item` - A single link (title, URL, icon)
//!
//! The transformations here are pure: they change a document in memory and
//! report whether anything changed. Locking and persistence live in
//! [`crate::storage`].

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Icon prefix marking an uploaded image relative to the image directory.
pub const IMAGE_ICON_PREFIX: &str = "img/";

/// Whether a transformation changed the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// The document was changed
    Applied,
    /// The target was not found or the change was already in place
    Unchanged,
}

impl Outcome {
    fn from_changed(changed: bool) -> Self {
        if changed {
            Outcome::Applied
        } else {
            Outcome::Unchanged
        }
    }

    pub fn is_applied(self) -> bool {
        matches!(self, Outcome::Applied)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Applied => write!(f, "applied"),
            Outcome::Unchanged => write!(f, "unchanged"),
        }
    }
}

/// Direction for moving an item one slot within its category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
        }
    }
}

impl FromStr for Direction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "up" => Ok(Direction::Up),
            "down" => Ok(Direction::Down),
            _ => Err(Error::InvalidInput(format!(
                "direction must be 'up' or 'down', got: {}",
                s
            ))),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What an item's `icon` field refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IconKind<'a> {
    /// Built-in glyph token (e.g. "fas fa-book")
    Glyph(&'a str),
    /// Uploaded image; holds the file name below the image directory
    Image(&'a str),
}

/// A single link in a category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Display title, unique within the owning category
    pub title: String,

    /// Destination URL
    pub url: String,

    /// Glyph token or `img/<filename>`
    #[serde(default)]
    pub icon: String,

    /// Keys this version does not know about, kept across rewrites
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Item {
    pub fn new(title: impl Into<String>, url: impl Into<String>, icon: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            icon: icon.into(),
            extra: Map::new(),
        }
    }

    pub fn icon_kind(&self) -> IconKind<'_> {
        match self.icon.strip_prefix(IMAGE_ICON_PREFIX) {
            Some(file_name) => IconKind::Image(file_name),
            None => IconKind::Glyph(&self.icon),
        }
    }

    /// Resolve an image icon against the configured image directory.
    ///
    /// Returns `None` for glyph icons.
    pub fn image_path(&self, images_dir: &Path) -> Option<PathBuf> {
        match self.icon_kind() {
            IconKind::Image(file_name) => Some(images_dir.join(file_name)),
            IconKind::Glyph(_) => None,
        }
    }
}

/// A named, ordered group of items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    /// Category name, unique within the document
    pub name: String,

    /// Items in display order
    #[serde(default)]
    pub items: Vec<Item>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Category {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            items: Vec::new(),
            extra: Map::new(),
        }
    }

    /// First item with the given title.
    pub fn item(&self, title: &str) -> Option<&Item> {
        self.items.iter().find(|item| item.title == title)
    }

    pub fn contains_item(&self, title: &str) -> bool {
        self.item(title).is_some()
    }

    /// Append an item at the end of the category.
    pub fn push_item(&mut self, item: Item) -> Result<Outcome> {
        if self.contains_item(&item.title) {
            return Err(Error::AlreadyExists(format!(
                "item '{}' in category '{}'",
                item.title, self.name
            )));
        }
        self.items.push(item);
        Ok(Outcome::Applied)
    }

    /// Replace the first item titled `old_title`, keeping its position.
    pub fn replace_item(&mut self, old_title: &str, new_item: Item) -> Result<Outcome> {
        let Some(index) = self.items.iter().position(|item| item.title == old_title) else {
            return Ok(Outcome::Unchanged);
        };

        if new_item.title != old_title && self.contains_item(&new_item.title) {
            return Err(Error::AlreadyExists(format!(
                "item '{}' in category '{}'",
                new_item.title, self.name
            )));
        }

        if self.items[index] == new_item {
            return Ok(Outcome::Unchanged);
        }
        self.items[index] = new_item;
        Ok(Outcome::Applied)
    }

    /// Remove every item titled `title`.
    pub fn remove_item(&mut self, title: &str) -> Outcome {
        let before = self.items.len();
        self.items.retain(|item| item.title != title);
        Outcome::from_changed(self.items.len() != before)
    }

    /// Put the titles in `order` first, in that order; everything else
    /// follows in its original relative order. Unknown titles are ignored.
    pub fn reorder_items(&mut self, order: &[String]) -> Outcome {
        reorder_by(&mut self.items, order, |item| item.title.as_str())
    }

    /// Swap an item with its neighbour. No-op at either end.
    pub fn move_item(&mut self, title: &str, direction: Direction) -> Outcome {
        let Some(index) = self.items.iter().position(|item| item.title == title) else {
            return Outcome::Unchanged;
        };

        let neighbour = match direction {
            Direction::Up if index > 0 => index - 1,
            Direction::Down if index + 1 < self.items.len() => index + 1,
            _ => return Outcome::Unchanged,
        };
        self.items.swap(index, neighbour);
        Outcome::Applied
    }
}

/// The root persisted object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Categories in display order
    #[serde(default)]
    pub categories: Vec<Category>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Document {
    /// Create an empty document (`{"categories": []}`).
    pub fn new() -> Self {
        Self::default()
    }

    /// First category with the given name.
    pub fn category(&self, name: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.name == name)
    }

    pub fn category_mut(&mut self, name: &str) -> Option<&mut Category> {
        self.categories.iter_mut().find(|c| c.name == name)
    }

    pub fn contains_category(&self, name: &str) -> bool {
        self.category(name).is_some()
    }

    /// Total number of items across all categories.
    pub fn item_count(&self) -> usize {
        self.categories.iter().map(|c| c.items.len()).sum()
    }

    /// Append a new, empty category.
    pub fn add_category(&mut self, name: &str) -> Result<Outcome> {
        if self.contains_category(name) {
            return Err(Error::AlreadyExists(format!("category '{}'", name)));
        }
        self.categories.push(Category::new(name));
        Ok(Outcome::Applied)
    }

    /// Remove a category and all of its items.
    pub fn remove_category(&mut self, name: &str) -> Outcome {
        let before = self.categories.len();
        self.categories.retain(|c| c.name != name);
        Outcome::from_changed(self.categories.len() != before)
    }

    /// Rename a category in place.
    pub fn rename_category(&mut self, from: &str, to: &str) -> Result<Outcome> {
        if from == to || !self.contains_category(from) {
            return Ok(Outcome::Unchanged);
        }
        if self.contains_category(to) {
            return Err(Error::AlreadyExists(format!("category '{}'", to)));
        }
        if let Some(category) = self.category_mut(from) {
            category.name = to.to_string();
        }
        Ok(Outcome::Applied)
    }

    /// Same semantics as [`Category::reorder_items`], applied to categories.
    pub fn reorder_categories(&mut self, order: &[String]) -> Outcome {
        reorder_by(&mut self.categories, order, |c| c.name.as_str())
    }

    /// Move an item from one category to the tail of another.
    ///
    /// Nothing happens when the source category or the item is missing. A
    /// missing destination is an error and leaves the item where it was.
    pub fn transfer_item(&mut self, from: &str, to: &str, title: &str) -> Result<Outcome> {
        let Some(index) = self
            .category(from)
            .and_then(|c| c.items.iter().position(|item| item.title == title))
        else {
            return Ok(Outcome::Unchanged);
        };

        let Some(destination) = self.category(to) else {
            return Err(Error::NotFound(format!("category '{}'", to)));
        };
        if from != to && destination.contains_item(title) {
            return Err(Error::AlreadyExists(format!(
                "item '{}' in category '{}'",
                title, to
            )));
        }

        let Some(source) = self.category_mut(from) else {
            return Ok(Outcome::Unchanged);
        };
        let item = source.items.remove(index);
        if let Some(destination) = self.category_mut(to) {
            destination.items.push(item);
        }
        Ok(Outcome::Applied)
    }
}

/// Stable "named entries first" reorder shared by items and categories.
fn reorder_by<T>(entries: &mut Vec<T>, order: &[String], key: impl Fn(&T) -> &str) -> Outcome {
    let mut slots: Vec<Option<(usize, T)>> = entries.drain(..).enumerate().map(Some).collect();
    let mut reordered = Vec::with_capacity(slots.len());

    for wanted in order {
        let slot = slots
            .iter_mut()
            .find(|slot| slot.as_ref().is_some_and(|(_, entry)| key(entry) == wanted));
        if let Some(slot) = slot {
            reordered.extend(slot.take());
        }
    }
    reordered.extend(slots.into_iter().flatten());

    let changed = reordered
        .iter()
        .enumerate()
        .any(|(position, (original, _))| position != *original);
    entries.extend(reordered.into_iter().map(|(_, entry)| entry));
    Outcome::from_changed(changed)
}
