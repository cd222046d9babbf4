//! Time-bounded read cache for the directory document.

use crate::models::Document;
use std::time::{Duration, Instant};

/// Default time a cached document stays fresh.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(30);

/// Holds at most one copy of the document and when it was last refreshed.
///
/// Every read hands out a clone, so callers can never change the cached
/// copy in place.
#[derive(Debug)]
pub struct DocumentCache {
    entry: Option<CachedDocument>,
    ttl: Duration,
}

#[derive(Debug)]
struct CachedDocument {
    doc: Document,
    refreshed_at: Instant,
}

impl DocumentCache {
    pub fn new(ttl: Duration) -> Self {
        Self { entry: None, ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Whether a copy exists and is younger than the TTL at `now`.
    pub fn is_valid_at(&self, now: Instant) -> bool {
        self.entry
            .as_ref()
            .is_some_and(|entry| now.saturating_duration_since(entry.refreshed_at) < self.ttl)
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid_at(Instant::now())
    }

    /// The cached document if it is still fresh at `now`.
    pub fn get_at(&self, now: Instant) -> Option<Document> {
        if self.is_valid_at(now) {
            self.entry.as_ref().map(|entry| entry.doc.clone())
        } else {
            None
        }
    }

    pub fn get(&self) -> Option<Document> {
        self.get_at(Instant::now())
    }

    /// Replace the cached copy and restart its TTL.
    pub fn refresh(&mut self, doc: &Document) {
        self.refresh_at(doc, Instant::now());
    }

    pub fn refresh_at(&mut self, doc: &Document, now: Instant) {
        self.entry = Some(CachedDocument {
            doc: doc.clone(),
            refreshed_at: now,
        });
    }

    /// Drop the cached copy so the next read goes to storage.
    pub fn invalidate(&mut self) {
        self.entry = None;
    }
}

impl Default for DocumentCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_TTL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;

    fn doc_with(name: &str) -> Document {
        let mut doc = Document::new();
        doc.categories.push(Category::new(name));
        doc
    }

    #[test]
    fn test_empty_cache_is_invalid() {
        let cache = DocumentCache::default();
        assert!(!cache.is_valid());
        assert_eq!(cache.get(), None);
        assert_eq!(cache.ttl(), DEFAULT_CACHE_TTL);
    }

    #[test]
    fn test_fresh_within_ttl() {
        let mut cache = DocumentCache::new(Duration::from_secs(30));
        let start = Instant::now();
        cache.refresh_at(&doc_with("Work"), start);

        assert!(cache.is_valid_at(start + Duration::from_secs(29)));
        assert_eq!(cache.get_at(start + Duration::from_secs(29)), Some(doc_with("Work")));
    }

    #[test]
    fn test_expires_at_ttl() {
        let mut cache = DocumentCache::new(Duration::from_secs(30));
        let start = Instant::now();
        cache.refresh_at(&doc_with("Work"), start);

        assert!(!cache.is_valid_at(start + Duration::from_secs(30)));
        assert_eq!(cache.get_at(start + Duration::from_secs(31)), None);
    }

    #[test]
    fn test_zero_ttl_never_serves() {
        let mut cache = DocumentCache::new(Duration::ZERO);
        let start = Instant::now();
        cache.refresh_at(&doc_with("Work"), start);
        assert_eq!(cache.get_at(start), None);
    }

    #[test]
    fn test_invalidate_discards_copy() {
        let mut cache = DocumentCache::default();
        cache.refresh(&doc_with("Work"));
        assert!(cache.is_valid());

        cache.invalidate();
        assert!(!cache.is_valid());
        assert_eq!(cache.get(), None);
    }

    #[test]
    fn test_returned_copy_is_detached() {
        let mut cache = DocumentCache::default();
        cache.refresh(&doc_with("Work"));

        let mut copy = cache.get().unwrap();
        copy.categories.clear();
        assert_eq!(cache.get(), Some(doc_with("Work")));
    }

    #[test]
    fn test_refresh_copies_input() {
        let mut cache = DocumentCache::default();
        let mut doc = doc_with("Work");
        cache.refresh(&doc);

        doc.categories.push(Category::new("Home"));
        assert_eq!(cache.get().unwrap().categories.len(), 1);
    }
}
