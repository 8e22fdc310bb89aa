//! Response cache in front of a search backend
//!
//! Typing back and forth over the same prefix repeats identical requests;
//! successful responses are kept for a short TTL. Failures are never cached.

use super::types::{Hit, QuerySuggestion, SearchParams, SearchResponse};
use super::SearchBackend;
use crate::error::Result;
use async_trait::async_trait;
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

#[derive(Clone)]
enum CachedResponse {
    Suggestions(Vec<QuerySuggestion>),
    Results(SearchResponse<Hit>),
}

/// Backend wrapper caching successful responses
pub struct CachedBackend {
    inner: Arc<dyn SearchBackend>,
    cache: Cache<String, CachedResponse>,
}

impl CachedBackend {
    /// Wrap `inner` with a cache of `max_capacity` entries living `ttl_seconds`
    pub fn new(inner: Arc<dyn SearchBackend>, ttl_seconds: u64, max_capacity: u64) -> Self {
        let cache = Cache::builder()
            .time_to_live(Duration::from_secs(ttl_seconds))
            .max_capacity(max_capacity)
            .build();

        Self { inner, cache }
    }
}

#[async_trait]
impl SearchBackend for CachedBackend {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn fetch_suggestions(
        &self,
        index: &str,
        query: &str,
        params: &SearchParams,
    ) -> Result<Vec<QuerySuggestion>> {
        let key = request_cache_key("suggestions", index, query, params)?;
        if let Some(CachedResponse::Suggestions(hits)) = self.cache.get(&key).await {
            debug!("Suggestions cache hit for '{}' on {}", query, index);
            return Ok(hits);
        }

        let hits = self.inner.fetch_suggestions(index, query, params).await?;
        self.cache
            .insert(key, CachedResponse::Suggestions(hits.clone()))
            .await;
        Ok(hits)
    }

    async fn fetch_results(
        &self,
        index: &str,
        query: &str,
        params: &SearchParams,
    ) -> Result<SearchResponse<Hit>> {
        let key = request_cache_key("results", index, query, params)?;
        if let Some(CachedResponse::Results(response)) = self.cache.get(&key).await {
            debug!("Results cache hit for '{}' on {}", query, index);
            return Ok(response);
        }

        let response = self.inner.fetch_results(index, query, params).await?;
        self.cache
            .insert(key, CachedResponse::Results(response.clone()))
            .await;
        Ok(response)
    }
}

/// Generate a cache key for a backend request
pub fn request_cache_key(
    kind: &str,
    index: &str,
    query: &str,
    params: &SearchParams,
) -> Result<String> {
    use sha2::{Digest, Sha256};

    let mut hasher = Sha256::new();
    for part in [kind, index, query] {
        hasher.update(part.as_bytes());
        hasher.update([0u8]);
    }
    hasher.update(serde_json::to_vec(params)?);

    Ok(format!("{:x}", hasher.finalize()))
}
