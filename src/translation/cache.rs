/*!
 * Translation caching functionality.
 *
 * Accepted translations are cached per language pair for the lifetime of a
 * run, so identical source strings across catalogs cost one backend call.
 * Only validated translations are stored.
 */

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use log::debug;
use parking_lot::RwLock;

/// Cache key combining source text, source language, and target language
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    /// Source text to translate
    source_text: String,

    /// Source language code
    source_language: String,

    /// Target language code
    target_language: String,
}

impl CacheKey {
    fn new(source_text: &str, source_language: &str, target_language: &str) -> Self {
        Self {
            source_text: source_text.to_string(),
            source_language: source_language.to_string(),
            target_language: target_language.to_string(),
        }
    }
}

/// Translation cache for storing and retrieving accepted translations
pub struct TranslationCache {
    /// Internal cache storage
    cache: RwLock<HashMap<CacheKey, String>>,

    /// Cache hit counter
    hits: AtomicUsize,

    /// Cache miss counter
    misses: AtomicUsize,

    /// Whether caching is enabled
    enabled: bool,
}

impl TranslationCache {
    /// Create a new translation cache
    pub fn new(enabled: bool) -> Self {
        Self {
            cache: RwLock::new(HashMap::new()),
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
            enabled,
        }
    }

    /// Get a translation from the cache
    pub fn get(&self, source_text: &str, source_language: &str, target_language: &str) -> Option<String> {
        if !self.enabled {
            return None;
        }

        let key = CacheKey::new(source_text, source_language, target_language);
        let found = self.cache.read().get(&key).cloned();

        match found {
            Some(translation) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!("Cache hit ({} -> {})", source_language, target_language);
                Some(translation)
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Store an accepted translation in the cache
    pub fn store(&self, source_text: &str, source_language: &str, target_language: &str, translation: &str) {
        if !self.enabled {
            return;
        }

        let key = CacheKey::new(source_text, source_language, target_language);
        self.cache.write().insert(key, translation.to_string());
    }

    /// Number of entries currently cached
    pub fn len(&self) -> usize {
        self.cache.read().len()
    }

    /// Whether the cache holds no entries
    pub fn is_empty(&self) -> bool {
        self.cache.read().is_empty()
    }

    /// (hits, misses) counters
    pub fn stats(&self) -> (usize, usize) {
        (self.hits.load(Ordering::Relaxed), self.misses.load(Ordering::Relaxed))
    }
}
