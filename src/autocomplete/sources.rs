//! Suggestion sources of the search bar
//!
//! A [`SuggestionSources`] is bound to one catalog for its whole life;
//! switching catalogs builds a new one under a new generation number.

use crate::backend::{Hit, QuerySuggestion, SearchBackend, SearchParams, SearchResponse};
use crate::catalog::CatalogDescriptor;
use crate::config::AutocompleteSettings;
use crate::error::Result;
use std::sync::{Arc, Weak};
use tracing::debug;

/// Query suggestions and product items for the selected catalog
pub struct SuggestionSources {
    generation: u64,
    catalog: CatalogDescriptor,
    backend: Arc<dyn SearchBackend>,
    suggestions_params: SearchParams,
    products_params: SearchParams,
}

impl SuggestionSources {
    pub fn new(
        generation: u64,
        catalog: CatalogDescriptor,
        backend: Arc<dyn SearchBackend>,
        settings: &AutocompleteSettings,
    ) -> Self {
        Self {
            generation,
            catalog,
            backend,
            suggestions_params: SearchParams::new()
                .with_hits_per_page(settings.suggestions_hits_per_page),
            products_params: SearchParams::new()
                .with_hits_per_page(settings.products_hits_per_page)
                .with_click_analytics(true),
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn catalog(&self) -> &CatalogDescriptor {
        &self.catalog
    }

    async fn fetch(
        &self,
        query: &str,
    ) -> (Result<Vec<QuerySuggestion>>, Result<SearchResponse<Hit>>) {
        debug!(
            "Fetching suggestions for '{}' from {} / {}",
            query, self.catalog.suggestions_index, self.catalog.records_index
        );

        futures::join!(
            self.backend.fetch_suggestions(
                &self.catalog.suggestions_index,
                query,
                &self.suggestions_params
            ),
            self.backend
                .fetch_results(&self.catalog.records_index, query, &self.products_params)
        )
    }
}

/// A keystroke's fetch, not yet run.
///
/// Holds its binding weakly: once the coordinator is unmounted or rebound to
/// another catalog, running it no longer reaches the backend.
pub struct PendingFetch {
    pub(super) seq: u64,
    pub(super) query: String,
    pub(super) sources: Weak<SuggestionSources>,
}

impl PendingFetch {
    /// Request sequence number; later keystrokes get larger numbers
    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Query the backend; `None` when the binding is gone
    pub async fn run(self) -> Option<FetchedSuggestions> {
        let Some(sources) = self.sources.upgrade() else {
            debug!("Skipping fetch #{} for '{}', binding is gone", self.seq, self.query);
            return None;
        };

        let (suggestions, products) = sources.fetch(&self.query).await;
        Some(FetchedSuggestions {
            seq: self.seq,
            generation: sources.generation(),
            query: self.query,
            records_index: sources.catalog().records_index.clone(),
            suggestions,
            products,
        })
    }
}

/// Backend answer for one keystroke
pub struct FetchedSuggestions {
    pub(super) seq: u64,
    pub(super) generation: u64,
    pub(super) query: String,
    pub(super) records_index: String,
    pub(super) suggestions: Result<Vec<QuerySuggestion>>,
    pub(super) products: Result<SearchResponse<Hit>>,
}

impl FetchedSuggestions {
    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn query(&self) -> &str {
        &self.query
    }
}

/// State of the product items list
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ProductsStatus {
    /// Nothing fetched yet
    #[default]
    Idle,
    /// Products available
    Ready,
    /// Fetch succeeded with no product; carries the message to show
    NoResults(String),
    /// Fetch failed; carries the error message
    Error(String),
}

/// An entry of the open suggestions panel, in display order
#[derive(Debug, Clone, PartialEq)]
pub enum SuggestionItem {
    Recent(String),
    Suggestion(QuerySuggestion),
    Product(Hit),
}

/// What the search bar's panel shows
#[derive(Debug, Clone, Default)]
pub struct SuggestionsView {
    /// Query the lists were fetched for
    pub query: String,
    /// Records index the product items come from
    pub records_index: String,
    pub recent: Vec<String>,
    pub suggestions: Vec<QuerySuggestion>,
    pub products: Vec<Hit>,
    /// Query id of the products response
    pub query_id: Option<String>,
    pub status: ProductsStatus,
}

impl SuggestionsView {
    /// All entries in display order: recent searches, suggestions, products
    pub fn items(&self) -> Vec<SuggestionItem> {
        self.recent
            .iter()
            .cloned()
            .map(SuggestionItem::Recent)
            .chain(self.suggestions.iter().cloned().map(SuggestionItem::Suggestion))
            .chain(self.products.iter().cloned().map(SuggestionItem::Product))
            .collect()
    }

    /// Position of a product among the product items (1-based)
    pub fn product_position(&self, object_id: &str) -> Option<u32> {
        self.products
            .iter()
            .position(|h| h.object_id == object_id)
            .map(|p| p as u32 + 1)
    }
}
