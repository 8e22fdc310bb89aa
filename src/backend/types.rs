//! Typed request and response contracts of the search backend

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use url::form_urlencoded;

/// Largest page size the backend accepts
pub const MAX_HITS_PER_PAGE: u32 = 1000;

/// A single `attribute:value` facet restriction
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FacetFilter {
    pub attribute: String,
    pub value: String,
}

impl FacetFilter {
    pub fn new(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for FacetFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.attribute, self.value)
    }
}

/// Recognized search parameters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchParams {
    /// Number of hits per page
    pub hits_per_page: Option<u32>,
    /// Zero-based page number
    pub page: Option<u32>,
    /// Filters on the same attribute are OR-ed, across attributes AND-ed
    #[serde(default)]
    pub facet_filters: Vec<FacetFilter>,
    /// Request a query id for analytics
    #[serde(default)]
    pub click_analytics: bool,
}

impl SearchParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_hits_per_page(mut self, hits: u32) -> Self {
        self.hits_per_page = Some(hits);
        self
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    pub fn with_facet_filter(mut self, filter: FacetFilter) -> Self {
        self.facet_filters.push(filter);
        self
    }

    pub fn with_click_analytics(mut self, enabled: bool) -> Self {
        self.click_analytics = enabled;
        self
    }

    /// Reject values the backend would refuse
    pub fn validate(&self) -> Result<()> {
        if let Some(hits) = self.hits_per_page {
            if hits == 0 || hits > MAX_HITS_PER_PAGE {
                return Err(Error::InvalidParams(format!(
                    "hits_per_page must be between 1 and {}, got {}",
                    MAX_HITS_PER_PAGE, hits
                )));
            }
        }

        if let Some(filter) = self
            .facet_filters
            .iter()
            .find(|f| f.attribute.trim().is_empty())
        {
            return Err(Error::InvalidParams(format!(
                "facet filter with empty attribute: {}",
                filter
            )));
        }

        Ok(())
    }

    /// Facet filters grouped by attribute, in order of first appearance
    pub fn facet_filter_groups(&self) -> Vec<Vec<String>> {
        let mut order: Vec<&str> = Vec::new();
        let mut groups: BTreeMap<&str, Vec<String>> = BTreeMap::new();

        for filter in &self.facet_filters {
            if !groups.contains_key(filter.attribute.as_str()) {
                order.push(&filter.attribute);
            }
            groups
                .entry(&filter.attribute)
                .or_default()
                .push(filter.to_string());
        }

        order
            .into_iter()
            .filter_map(|attribute| groups.remove(attribute))
            .collect()
    }

    /// URL-encoded parameter string for `query`
    pub fn to_query_string(&self, query: &str) -> Result<String> {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        serializer.append_pair("query", query);

        if let Some(hits) = self.hits_per_page {
            serializer.append_pair("hitsPerPage", &hits.to_string());
        }
        if let Some(page) = self.page {
            serializer.append_pair("page", &page.to_string());
        }
        if !self.facet_filters.is_empty() {
            let groups = serde_json::to_string(&self.facet_filter_groups())?;
            serializer.append_pair("facetFilters", &groups);
        }
        if self.click_analytics {
            serializer.append_pair("clickAnalytics", "true");
        }

        Ok(serializer.finish())
    }
}

/// A product record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hit {
    #[serde(rename = "objectID")]
    pub object_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(rename = "hierarchicalCategories", default)]
    pub hierarchical_categories: BTreeMap<String, String>,
}

impl Hit {
    pub fn new(object_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            object_id: object_id.into(),
            name: name.into(),
            description: None,
            brand: None,
            kind: None,
            price: None,
            rating: None,
            image: None,
            categories: vec![],
            hierarchical_categories: BTreeMap::new(),
        }
    }

    pub fn with_brand(mut self, brand: impl Into<String>) -> Self {
        self.brand = Some(brand.into());
        self
    }

    pub fn with_price(mut self, price: f64) -> Self {
        self.price = Some(price);
        self
    }
}

/// A record of a query suggestions index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuerySuggestion {
    pub query: String,
    #[serde(rename = "objectID", default)]
    pub object_id: String,
    #[serde(default)]
    pub popularity: Option<u64>,
}

impl QuerySuggestion {
    pub fn new(query: impl Into<String>) -> Self {
        let query = query.into();
        Self {
            object_id: query.clone(),
            query,
            popularity: None,
        }
    }
}

/// One page of hits for a query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse<T> {
    pub hits: Vec<T>,
    #[serde(default)]
    pub nb_hits: u64,
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub nb_pages: u32,
    #[serde(default)]
    pub hits_per_page: u32,
    #[serde(default)]
    pub query: String,
    #[serde(rename = "queryID", default)]
    pub query_id: Option<String>,
}

impl<T> SearchResponse<T> {
    /// Response holding `hits` as the only page
    pub fn from_hits(query: impl Into<String>, hits: Vec<T>) -> Self {
        let nb_hits = hits.len() as u64;
        Self {
            hits_per_page: hits.len() as u32,
            hits,
            nb_hits,
            page: 0,
            nb_pages: u32::from(nb_hits > 0),
            query: query.into(),
            query_id: None,
        }
    }
}
