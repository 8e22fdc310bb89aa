//! Search backend collaborator
//!
//! The hosted search service owns ranking; the core only asks it for query
//! suggestions and result pages through [`SearchBackend`].

mod algolia;
mod cache;
mod client;
mod types;

pub use algolia::AlgoliaBackend;
pub use cache::{request_cache_key, CachedBackend};
pub use client::{HttpClient, HttpResponse};
pub use types::{FacetFilter, Hit, QuerySuggestion, SearchParams, SearchResponse, MAX_HITS_PER_PAGE};

use crate::error::Result;
use async_trait::async_trait;

/// Asynchronous access to the hosted search indices
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Backend name
    fn name(&self) -> &str;

    /// Query suggestions from a suggestions index
    async fn fetch_suggestions(
        &self,
        index: &str,
        query: &str,
        params: &SearchParams,
    ) -> Result<Vec<QuerySuggestion>>;

    /// One page of product records from a records index
    async fn fetch_results(
        &self,
        index: &str,
        query: &str,
        params: &SearchParams,
    ) -> Result<SearchResponse<Hit>>;
}
