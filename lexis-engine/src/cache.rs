//! LRU cache of linguistic analyses
//!
//! Tokens, sentences, tags and entities depend only on the text and on
//! whether entity recognition ran, so repeated texts skip those stages. The
//! classification results are never cached.

use crate::document::{Document, PipelineState};
use chrono::NaiveDate;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

type Key = (Arc<str>, bool);

/// Shared, internally synchronized analysis cache
#[derive(Clone)]
pub struct AnalysisCache {
    inner: Arc<Mutex<LruCache<Key, Document>>>,
}

impl AnalysisCache {
    /// Cache holding up to `capacity` analyses; `None` when `capacity` is 0
    pub fn new(capacity: usize) -> Option<Self> {
        let size = NonZeroUsize::new(capacity)?;
        Some(Self {
            inner: Arc::new(Mutex::new(LruCache::new(size))),
        })
    }

    /// Cached analysis of `text`, re-dated to `reference_date`
    ///
    /// Stage timings of the run that filled the cache are dropped; warnings
    /// depend only on the text and are kept.
    pub fn get(&self, text: &str, entities: bool, reference_date: NaiveDate) -> Option<Document> {
        let mut guard = self.inner.lock().ok()?;
        let key: Key = (Arc::from(text), entities);
        guard.get(&key).map(|doc| {
            let mut doc = doc.clone().with_reference_date(reference_date);
            doc.clear_timings();
            doc
        })
    }

    /// Store an analysis that completed the linguistic stages
    pub fn insert(&self, document: &Document, entities: bool) {
        if document.state() != &PipelineState::EntitiesResolved {
            return;
        }
        if let Ok(mut guard) = self.inner.lock() {
            guard.put((document.shared_text(), entities), document.clone());
        }
    }

    /// Number of cached analyses
    pub fn len(&self) -> usize {
        self.inner.lock().map(|g| g.len()).unwrap_or(0)
    }

    /// Whether the cache is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for AnalysisCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalysisCache")
            .field("len", &self.len())
            .finish()
    }
}
