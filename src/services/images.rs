/// Per-session image lookup cache
///
/// Memoizes photo lookups by exact query string for the life of the
/// session that owns it. Negative results are cached too, so a dish the
/// photo API cannot illustrate is only asked about once. Entries are
/// write-once idempotent: two concurrent misses for the same query may
/// both fetch and both store the same URL, which is acceptable duplicate
/// work rather than a correctness hazard.
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::models::{ERROR_SENTINEL, NOT_APPLICABLE};
use crate::services::providers::ImageSearcher;

pub struct ImageCache {
    searcher: Arc<dyn ImageSearcher>,
    // Held only for map access, never across an await.
    entries: Mutex<HashMap<String, Option<String>>>,
}

impl ImageCache {
    pub fn new(searcher: Arc<dyn ImageSearcher>) -> Self {
        Self {
            searcher,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Resolves a dish name to a photo URL.
    ///
    /// Empty queries, the "N/A" sentinel, and error-marker text short-
    /// circuit to `None` without a lookup. Transport failures also resolve
    /// to `None`; the slot simply goes without a photo.
    pub async fn resolve(&self, query: &str) -> Option<String> {
        if query.is_empty() || query == NOT_APPLICABLE || query.contains(ERROR_SENTINEL) {
            return None;
        }

        if let Some(cached) = self.entries.lock().unwrap().get(query) {
            return cached.clone();
        }

        let resolved = match self.searcher.search_first(query).await {
            Ok(url) => url,
            Err(e) => {
                // Not cached: a later call may succeed once the API recovers.
                tracing::debug!(query = %query, error = %e, "image lookup failed");
                return None;
            }
        };

        self.entries
            .lock()
            .unwrap()
            .insert(query.to_string(), resolved.clone());
        resolved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::providers::MockImageSearcher;

    #[test]
    fn test_resolve_is_idempotent_per_query() {
        tokio_test::block_on(async {
            let mut searcher = MockImageSearcher::new();
            searcher
                .expect_search_first()
                .withf(|query| query == "pad thai")
                .times(1)
                .returning(|_| Ok(Some("https://img.example/pad-thai".to_string())));

            let cache = ImageCache::new(Arc::new(searcher));

            let first = cache.resolve("pad thai").await;
            let second = cache.resolve("pad thai").await;
            assert_eq!(first, Some("https://img.example/pad-thai".to_string()));
            assert_eq!(second, first);
        });
    }

    #[tokio::test]
    async fn test_resolve_caches_negative_results() {
        let mut searcher = MockImageSearcher::new();
        searcher
            .expect_search_first()
            .withf(|query| query == "obscure dish")
            .times(1)
            .returning(|_| Ok(None));

        let cache = ImageCache::new(Arc::new(searcher));

        assert_eq!(cache.resolve("obscure dish").await, None);
        // Second call must come from the cache, not a second lookup.
        assert_eq!(cache.resolve("obscure dish").await, None);
    }

    #[tokio::test]
    async fn test_resolve_short_circuits_sentinels() {
        // No expectations: any lookup would panic.
        let searcher = MockImageSearcher::new();
        let cache = ImageCache::new(Arc::new(searcher));

        assert_eq!(cache.resolve("").await, None);
        assert_eq!(cache.resolve("N/A").await, None);
        assert_eq!(cache.resolve("AI Error").await, None);
    }

    #[tokio::test]
    async fn test_resolve_swallows_lookup_errors() {
        let mut searcher = MockImageSearcher::new();
        searcher
            .expect_search_first()
            .returning(|_| Err(crate::error::AppError::ExternalApi("status 500".to_string())));

        let cache = ImageCache::new(Arc::new(searcher));
        assert_eq!(cache.resolve("green curry").await, None);
    }
}
