//! Storage layer for the link directory.
//!
//! The whole directory lives in one JSON document. [`Store`] is the only way
//! in: every read and every mutation runs under a single reentrant lock, reads
//! are served from a TTL cache when it is fresh, and mutations always start
//! from the document on disk.
//!
//! ## Layers
//!
//! - [`backend`]: whole-document load/save with atomic replace-on-write
//! - [`cache`]: at most one cached copy, valid for a fixed TTL
//! - [`mutation`]: named transformations, pure and lock-free
//!
//! A mutation runs as `lock -> load -> transform -> save -> refresh cache`.
//! If the transformation reports [`Outcome::Unchanged`] the save is skipped
//! and the file stays byte-identical. If the transformation or the save fails
//! nothing is written and the cache is left as it was.

pub mod backend;
pub mod cache;
pub mod mutation;

pub use backend::{DocumentBackend, FileBackend};
pub use cache::{DEFAULT_CACHE_TTL, DocumentCache};
pub use mutation::Mutation;

use crate::models::{Category, Direction, Document, Item, Outcome};
use crate::{Error, Result};
use parking_lot::{ReentrantMutex, ReentrantMutexGuard};
use std::cell::{Cell, RefCell};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Tuning knobs for a [`Store`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreOptions {
    /// How long a loaded document may be served from memory
    pub cache_ttl: Duration,
    /// Give up with [`Error::Busy`] instead of waiting forever for the lock
    pub lock_timeout: Option<Duration>,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            cache_ttl: DEFAULT_CACHE_TTL,
            lock_timeout: None,
        }
    }
}

/// Thread-safe handle to the directory document.
///
/// Share it by reference or behind an `Arc`. Reads may nest inside
/// [`Store::update`] on the same thread without deadlocking. A mutation
/// started while another one is running on the same thread is rejected with
/// [`Error::InvalidInput`], since the outer save would overwrite it.
pub struct Store {
    backend: Box<dyn DocumentBackend>,
    lock: ReentrantMutex<LockedState>,
    cache_ttl: Duration,
    lock_timeout: Option<Duration>,
}

/// Everything that may only be touched while the lock is held.
struct LockedState {
    cache: RefCell<DocumentCache>,
    /// Set between load and save of a mutation
    mutating: Cell<bool>,
}

type StoreGuard<'a> = ReentrantMutexGuard<'a, LockedState>;

/// Clears the in-progress flag when a mutation ends, however it ends.
struct MutationScope<'a> {
    flag: &'a Cell<bool>,
}

impl Drop for MutationScope<'_> {
    fn drop(&mut self) {
        self.flag.set(false);
    }
}

impl Store {
    /// Open the JSON document at `path`, creating its directory if needed.
    ///
    /// The file itself is created on first load.
    pub fn open(path: impl Into<PathBuf>, options: StoreOptions) -> Result<Self> {
        let backend = FileBackend::create(path)?;
        Ok(Self::with_backend(Box::new(backend), options))
    }

    pub fn with_backend(backend: Box<dyn DocumentBackend>, options: StoreOptions) -> Self {
        Self {
            backend,
            lock: ReentrantMutex::new(LockedState {
                cache: RefCell::new(DocumentCache::new(options.cache_ttl)),
                mutating: Cell::new(false),
            }),
            cache_ttl: options.cache_ttl,
            lock_timeout: options.lock_timeout,
        }
    }

    /// Where the document is stored (for display).
    pub fn location(&self) -> String {
        self.backend.location()
    }

    pub fn cache_ttl(&self) -> Duration {
        self.cache_ttl
    }

    pub fn lock_timeout(&self) -> Option<Duration> {
        self.lock_timeout
    }

    fn acquire(&self) -> Result<StoreGuard<'_>> {
        match self.lock_timeout {
            Some(timeout) => self.lock.try_lock_for(timeout).ok_or_else(|| {
                warn!(location = %self.location(), ?timeout, "Store lock not acquired in time");
                Error::Busy(timeout)
            }),
            None => Ok(self.lock.lock()),
        }
    }

    fn begin_mutation<'g>(&self, guard: &'g StoreGuard<'_>, op: &str) -> Result<MutationScope<'g>> {
        if guard.mutating.get() {
            warn!(op, "Nested mutation rejected");
            return Err(Error::InvalidInput(format!(
                "{} cannot run inside another mutation of the same store",
                op
            )));
        }
        guard.mutating.set(true);
        Ok(MutationScope {
            flag: &guard.mutating,
        })
    }

    /// Serve from the cache when allowed and fresh, otherwise load and refresh.
    fn read(&self, guard: &StoreGuard<'_>, use_cache: bool) -> Result<Document> {
        if use_cache {
            let cached = guard.cache.borrow().get();
            if let Some(doc) = cached {
                debug!("Cache hit");
                return Ok(doc);
            }
            debug!("Cache miss");
        }

        let doc = self.backend.load()?;
        guard.cache.borrow_mut().refresh(&doc);
        Ok(doc)
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// All categories in display order.
    pub fn list_categories(&self) -> Result<Vec<Category>> {
        let guard = self.acquire()?;
        Ok(self.read(&guard, true)?.categories)
    }

    /// The first category named `name`.
    pub fn find_category(&self, name: &str) -> Result<Category> {
        let guard = self.acquire()?;
        let doc = self.read(&guard, true)?;
        doc.categories
            .into_iter()
            .find(|c| c.name == name)
            .ok_or_else(|| Error::NotFound(format!("category '{}'", name)))
    }

    /// The first item titled `title` in category `category`.
    pub fn find_item(&self, category: &str, title: &str) -> Result<Item> {
        let found = self.find_category(category)?;
        found
            .items
            .into_iter()
            .find(|item| item.title == title)
            .ok_or_else(|| Error::NotFound(format!("item '{}' in category '{}'", title, category)))
    }

    /// The whole document, optionally bypassing the cache.
    ///
    /// A bypassing read still refreshes the cache with what it loaded.
    pub fn load_document(&self, use_cache: bool) -> Result<Document> {
        let guard = self.acquire()?;
        self.read(&guard, use_cache)
    }

    /// Whether the next cached read would be served from memory.
    pub fn is_cached(&self) -> Result<bool> {
        let guard = self.acquire()?;
        let valid = guard.cache.borrow().is_valid();
        Ok(valid)
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Run `transform` against the freshly loaded document and persist it.
    ///
    /// The transformation must report [`Outcome::Unchanged`] only when it left
    /// the document as it found it. An error from `transform` aborts the whole
    /// operation with nothing written.
    pub fn update<F>(&self, transform: F) -> Result<Outcome>
    where
        F: FnOnce(&mut Document) -> Result<Outcome>,
    {
        self.mutate("update", transform)
    }

    /// Run one named [`Mutation`] in the critical section.
    pub fn apply(&self, mutation: &Mutation) -> Result<Outcome> {
        self.mutate(mutation.name(), |doc| mutation.apply(doc))
    }

    fn mutate<F>(&self, op: &'static str, transform: F) -> Result<Outcome>
    where
        F: FnOnce(&mut Document) -> Result<Outcome>,
    {
        let guard = self.acquire()?;
        let _scope = self.begin_mutation(&guard, op)?;
        let mut doc = self.backend.load()?;

        let outcome = transform(&mut doc).inspect_err(|e| {
            debug!(op, error = %e, "Mutation rejected");
        })?;

        if outcome.is_applied() {
            if let Err(e) = self.backend.save(&doc) {
                warn!(op, location = %self.location(), error = %e, "Failed to save document");
                return Err(e);
            }
            info!(op, location = %self.location(), "Applied mutation");
        } else {
            debug!(op, "Mutation left document unchanged");
        }

        guard.cache.borrow_mut().refresh(&doc);
        Ok(outcome)
    }

    /// Save `doc` as the whole directory, replacing what is on disk.
    pub fn replace_document(&self, doc: &Document) -> Result<()> {
        let guard = self.acquire()?;
        let _scope = self.begin_mutation(&guard, "replace_document")?;
        if let Err(e) = self.backend.save(doc) {
            warn!(op = "replace_document", location = %self.location(), error = %e, "Failed to save document");
            return Err(e);
        }
        info!(op = "replace_document", location = %self.location(), "Replaced document");
        guard.cache.borrow_mut().refresh(doc);
        Ok(())
    }

    /// Append `item` to `category`. No-op if the category does not exist.
    pub fn add_item(&self, category: &str, item: Item) -> Result<Outcome> {
        self.apply(&Mutation::AddItem {
            category: category.to_string(),
            item,
        })
    }

    /// Replace the item titled `title` in place.
    pub fn update_item(&self, category: &str, title: &str, item: Item) -> Result<Outcome> {
        self.apply(&Mutation::UpdateItem {
            category: category.to_string(),
            title: title.to_string(),
            item,
        })
    }

    pub fn remove_item(&self, category: &str, title: &str) -> Result<Outcome> {
        self.apply(&Mutation::RemoveItem {
            category: category.to_string(),
            title: title.to_string(),
        })
    }

    /// Put the listed titles first, keeping the rest in their current order.
    pub fn reorder_items(&self, category: &str, order: &[String]) -> Result<Outcome> {
        self.apply(&Mutation::ReorderItems {
            category: category.to_string(),
            order: order.to_vec(),
        })
    }

    pub fn move_item(&self, category: &str, title: &str, direction: Direction) -> Result<Outcome> {
        self.apply(&Mutation::MoveItem {
            category: category.to_string(),
            title: title.to_string(),
            direction,
        })
    }

    /// Move an item to the end of another category as one atomic change.
    ///
    /// Fails with [`Error::NotFound`] if `to` does not exist, leaving the
    /// item where it was.
    pub fn move_item_between_categories(&self, from: &str, to: &str, title: &str) -> Result<Outcome> {
        self.apply(&Mutation::TransferItem {
            from: from.to_string(),
            to: to.to_string(),
            title: title.to_string(),
        })
    }

    pub fn add_category(&self, name: &str) -> Result<Outcome> {
        self.apply(&Mutation::AddCategory {
            name: name.to_string(),
        })
    }

    pub fn remove_category(&self, name: &str) -> Result<Outcome> {
        self.apply(&Mutation::RemoveCategory {
            name: name.to_string(),
        })
    }

    pub fn rename_category(&self, from: &str, to: &str) -> Result<Outcome> {
        self.apply(&Mutation::RenameCategory {
            from: from.to_string(),
            to: to.to_string(),
        })
    }

    pub fn reorder_categories(&self, order: &[String]) -> Result<Outcome> {
        self.apply(&Mutation::ReorderCategories {
            order: order.to_vec(),
        })
    }

    /// Drop the cached copy so the next read sees out-of-band edits.
    pub fn invalidate_cache(&self) -> Result<()> {
        let guard = self.acquire()?;
        guard.cache.borrow_mut().invalidate();
        debug!(location = %self.location(), "Cache invalidated");
        Ok(())
    }
}
