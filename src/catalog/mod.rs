//! Catalog registry
//!
//! A catalog pairs a records index with a suggestions index and names the
//! page on which its results panel lives. The registry is ordered: the first
//! entry is the fallback selection when the current page is no results page.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::warn;

/// One searchable product collection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CatalogDescriptor {
    /// Unique key
    pub catalog_id: String,
    /// Display name for the catalog selector
    pub catalog_label: String,
    /// Index holding the product records
    pub records_index: String,
    /// Index holding query suggestions
    pub suggestions_index: String,
    /// Path of the page hosting this catalog's results panel
    pub search_page_path: String,
}

/// Position of the catalog whose results page is `current_path`, or 0.
pub fn active_catalog_index(catalogs: &[CatalogDescriptor], current_path: &str) -> usize {
    catalogs
        .iter()
        .position(|c| c.search_page_path == current_path)
        .unwrap_or(0)
}

/// Ordered, validated list of catalogs
#[derive(Debug, Clone)]
pub struct CatalogRegistry {
    catalogs: Vec<CatalogDescriptor>,
}

impl CatalogRegistry {
    /// Build a registry, rejecting empty lists and duplicate ids
    pub fn new(catalogs: Vec<CatalogDescriptor>) -> Result<Self> {
        if catalogs.is_empty() {
            return Err(Error::EmptyRegistry);
        }

        let mut ids = HashSet::new();
        let mut paths = HashSet::new();
        for catalog in &catalogs {
            if !ids.insert(catalog.catalog_id.as_str()) {
                return Err(Error::DuplicateCatalog(catalog.catalog_id.clone()));
            }
            if !paths.insert(catalog.search_page_path.as_str()) {
                warn!(
                    "Catalog {} reuses search page {}, the earlier catalog wins",
                    catalog.catalog_id, catalog.search_page_path
                );
            }
        }

        Ok(Self { catalogs })
    }

    /// Get a catalog by id
    pub fn get(&self, catalog_id: &str) -> Option<&CatalogDescriptor> {
        self.catalogs.iter().find(|c| c.catalog_id == catalog_id)
    }

    /// Get a catalog by position
    pub fn at(&self, index: usize) -> Option<&CatalogDescriptor> {
        self.catalogs.get(index)
    }

    /// Catalog selected on a page at `current_path`
    pub fn active(&self, current_path: &str) -> &CatalogDescriptor {
        &self.catalogs[active_catalog_index(&self.catalogs, current_path)]
    }

    /// The catalog whose results page is `current_path`, if any
    pub fn results_page(&self, current_path: &str) -> Option<&CatalogDescriptor> {
        self.catalogs
            .iter()
            .find(|c| c.search_page_path == current_path)
    }

    /// Get a catalog by its records index
    pub fn by_records_index(&self, records_index: &str) -> Option<&CatalogDescriptor> {
        self.catalogs
            .iter()
            .find(|c| c.records_index == records_index)
    }

    /// All catalog ids, in registry order
    pub fn ids(&self) -> Vec<&str> {
        self.catalogs.iter().map(|c| c.catalog_id.as_str()).collect()
    }

    /// Iterate catalogs in registry order
    pub fn iter(&self) -> impl Iterator<Item = &CatalogDescriptor> {
        self.catalogs.iter()
    }

    pub fn as_slice(&self) -> &[CatalogDescriptor] {
        &self.catalogs
    }

    pub fn len(&self) -> usize {
        self.catalogs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.catalogs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::catalogs;

    #[test]
    fn test_active_catalog_index() {
        let catalogs = catalogs();
        assert_eq!(active_catalog_index(&catalogs, "/search/"), 0);
        assert_eq!(active_catalog_index(&catalogs, "/search-vip/"), 1);
        assert_eq!(active_catalog_index(&catalogs, "/about"), 0);
        assert_eq!(active_catalog_index(&[], "/search/"), 0);
    }

    #[test]
    fn test_first_matching_path_wins() {
        let mut catalogs = catalogs();
        catalogs[1].search_page_path = "/search/".to_string();
        assert_eq!(active_catalog_index(&catalogs, "/search/"), 0);

        let registry = CatalogRegistry::new(catalogs).unwrap();
        assert_eq!(registry.results_page("/search/").unwrap().catalog_id, "products");
    }

    #[test]
    fn test_registry_validation() {
        assert!(matches!(
            CatalogRegistry::new(vec![]),
            Err(Error::EmptyRegistry)
        ));

        let mut catalogs = catalogs();
        catalogs[1].catalog_id = "products".to_string();
        assert!(matches!(
            CatalogRegistry::new(catalogs),
            Err(Error::DuplicateCatalog(id)) if id == "products"
        ));
    }

    #[test]
    fn test_registry_lookup() {
        let registry = CatalogRegistry::new(catalogs()).unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.ids(), vec!["products", "expensiveProducts"]);
        assert_eq!(registry.active("/").catalog_id, "products");
        assert_eq!(registry.active("/search-vip/").catalog_id, "expensiveProducts");
        assert!(registry.results_page("/").is_none());
        assert_eq!(
            registry
                .by_records_index("instant_search_price_desc")
                .map(|c| c.catalog_id.as_str()),
            Some("expensiveProducts")
        );
        assert!(registry.get("unknown").is_none());
    }
}
