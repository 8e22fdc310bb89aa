//! In-memory collaborators for unit tests

use crate::backend::{Hit, QuerySuggestion, SearchBackend, SearchParams, SearchResponse};
use crate::catalog::CatalogDescriptor;
use crate::error::{Error, Result};
use crate::insights::{InsightsClient, InsightsEvent};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

pub const PRODUCTS_INDEX: &str = "instant_search";
pub const VIP_INDEX: &str = "instant_search_price_desc";
pub const PRODUCTS_SUGGESTIONS: &str = "instant_search_demo_query_suggestions";
pub const VIP_SUGGESTIONS: &str = "instant_search_query_suggestions_test";

pub fn catalogs() -> Vec<CatalogDescriptor> {
    vec![
        CatalogDescriptor {
            catalog_id: "products".to_string(),
            catalog_label: "All Products".to_string(),
            records_index: PRODUCTS_INDEX.to_string(),
            suggestions_index: PRODUCTS_SUGGESTIONS.to_string(),
            search_page_path: "/search/".to_string(),
        },
        CatalogDescriptor {
            catalog_id: "expensiveProducts".to_string(),
            catalog_label: "Expensive Products".to_string(),
            records_index: VIP_INDEX.to_string(),
            suggestions_index: VIP_SUGGESTIONS.to_string(),
            search_page_path: "/search-vip/".to_string(),
        },
    ]
}

/// Backend answering from fixed records with substring matching
#[derive(Default)]
pub struct StaticBackend {
    records: HashMap<String, Vec<Hit>>,
    suggestions: HashMap<String, Vec<QuerySuggestion>>,
    failing: AtomicBool,
    suggestions_calls: AtomicUsize,
    results_calls: AtomicUsize,
    seen: Mutex<Vec<(String, String, SearchParams)>>,
    paging: Mutex<Option<(u32, u32)>>,
}

impl StaticBackend {
    pub fn demo() -> Self {
        let mut backend = Self::default();
        backend.records.insert(
            PRODUCTS_INDEX.to_string(),
            vec![
                Hit::new("1", "Smart TV").with_brand("Samsung").with_price(499.0),
                Hit::new("2", "TV Stand").with_brand("Ikea").with_price(89.0),
                Hit::new("3", "Phone").with_brand("Apple").with_price(999.0),
                Hit::new("4", "Leather bag").with_brand("Acme").with_price(120.0),
            ],
        );
        backend.records.insert(
            VIP_INDEX.to_string(),
            vec![
                Hit::new("3", "Phone").with_brand("Apple").with_price(999.0),
                Hit::new("1", "Smart TV").with_brand("Samsung").with_price(499.0),
            ],
        );
        backend.suggestions.insert(
            PRODUCTS_SUGGESTIONS.to_string(),
            vec![
                QuerySuggestion::new("tv"),
                QuerySuggestion::new("tv stand"),
                QuerySuggestion::new("phone"),
            ],
        );
        backend.suggestions.insert(
            VIP_SUGGESTIONS.to_string(),
            vec![QuerySuggestion::new("phone pro")],
        );
        backend
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Report `page` and `hits_per_page` in every results response
    pub fn force_paging(&self, page: u32, hits_per_page: u32) {
        *self.paging.lock().unwrap() = Some((page, hits_per_page));
    }

    pub fn suggestions_calls(&self) -> usize {
        self.suggestions_calls.load(Ordering::SeqCst)
    }

    pub fn results_calls(&self) -> usize {
        self.results_calls.load(Ordering::SeqCst)
    }

    /// (index, query, params) of every request, in order
    pub fn seen(&self) -> Vec<(String, String, SearchParams)> {
        self.seen.lock().unwrap().clone()
    }

    fn check(&self, index: &str, query: &str, params: &SearchParams) -> Result<()> {
        self.seen
            .lock()
            .unwrap()
            .push((index.to_string(), query.to_string(), params.clone()));
        params.validate()?;
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::Backend {
                index: index.to_string(),
                status: 503,
                message: "unavailable".to_string(),
            });
        }
        Ok(())
    }
}

fn limit(params: &SearchParams) -> usize {
    params.hits_per_page.unwrap_or(20) as usize
}

#[async_trait]
impl SearchBackend for StaticBackend {
    fn name(&self) -> &str {
        "static"
    }

    async fn fetch_suggestions(
        &self,
        index: &str,
        query: &str,
        params: &SearchParams,
    ) -> Result<Vec<QuerySuggestion>> {
        self.suggestions_calls.fetch_add(1, Ordering::SeqCst);
        self.check(index, query, params)?;

        let needle = query.to_lowercase();
        Ok(self
            .suggestions
            .get(index)
            .map(|all| {
                all.iter()
                    .filter(|s| s.query.contains(&needle))
                    .take(limit(params))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn fetch_results(
        &self,
        index: &str,
        query: &str,
        params: &SearchParams,
    ) -> Result<SearchResponse<Hit>> {
        self.results_calls.fetch_add(1, Ordering::SeqCst);
        self.check(index, query, params)?;

        let needle = query.to_lowercase();
        let hits: Vec<Hit> = self
            .records
            .get(index)
            .map(|all| {
                all.iter()
                    .filter(|h| h.name.to_lowercase().contains(&needle))
                    .filter(|h| {
                        let mut brands = params
                            .facet_filters
                            .iter()
                            .filter(|f| f.attribute == "brand")
                            .peekable();
                        brands.peek().is_none()
                            || brands.any(|f| h.brand.as_deref() == Some(f.value.as_str()))
                    })
                    .take(limit(params))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        let mut response = SearchResponse::from_hits(query, hits);
        response.page = params.page.unwrap_or(0);
        if let Some((page, hits_per_page)) = *self.paging.lock().unwrap() {
            response.page = page;
            response.hits_per_page = hits_per_page;
        }
        if params.click_analytics {
            response.query_id = Some(format!("qid-{}", self.results_calls()));
        }
        Ok(response)
    }
}

/// Insights client keeping every event
#[derive(Default)]
pub struct RecordingInsights {
    events: Mutex<Vec<InsightsEvent>>,
}

impl RecordingInsights {
    pub fn events(&self) -> Vec<InsightsEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl InsightsClient for RecordingInsights {
    fn user_token(&self) -> &str {
        "test-user"
    }

    fn send_event(&self, event: InsightsEvent) {
        self.events.lock().unwrap().push(event);
    }
}
