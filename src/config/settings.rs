//! Settings structures for the catalog search configuration

use crate::catalog::CatalogDescriptor;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main settings structure matching settings.yml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub backend: BackendSettings,
    pub insights: InsightsSettings,
    pub autocomplete: AutocompleteSettings,
    pub results: ResultsSettings,
    pub catalogs: Vec<CatalogDescriptor>,
    pub mounts: Vec<MountConfig>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            general: GeneralSettings::default(),
            backend: BackendSettings::default(),
            insights: InsightsSettings::default(),
            autocomplete: AutocompleteSettings::default(),
            results: ResultsSettings::default(),
            catalogs: default_catalogs(),
            mounts: default_mounts(),
        }
    }
}

impl Settings {
    /// Load settings from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let settings: Settings = serde_yaml::from_str(&content)?;
        Ok(settings)
    }

    /// Merge with environment variables (CATALOG_SEARCH_* prefix)
    pub fn merge_env(&mut self) {
        if let Ok(val) = std::env::var("CATALOG_SEARCH_DEBUG") {
            self.general.debug = val.parse().unwrap_or(false);
        }
        if let Ok(val) = std::env::var("CATALOG_SEARCH_APP_ID") {
            self.backend.app_id = val;
        }
        if let Ok(val) = std::env::var("CATALOG_SEARCH_API_KEY") {
            self.backend.api_key = val;
        }
        if let Ok(val) = std::env::var("CATALOG_SEARCH_HOST") {
            self.backend.host = Some(val);
        }
        if let Ok(val) = std::env::var("CATALOG_SEARCH_USER_TOKEN") {
            self.general.user_token = Some(val);
        }
    }

    /// Get catalog config by id
    pub fn get_catalog(&self, catalog_id: &str) -> Option<&CatalogDescriptor> {
        self.catalogs.iter().find(|c| c.catalog_id == catalog_id)
    }
}

/// General settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Enable debug logging
    pub debug: bool,
    /// Label shown next to the catalog selector
    pub catalog_selector_label: String,
    /// Fixed analytics user token (anonymous token when unset)
    pub user_token: Option<String>,
}

impl GeneralSettings {
    /// Default log filter when none is given in the environment
    pub fn log_level(&self) -> &'static str {
        if self.debug {
            "debug"
        } else {
            "info"
        }
    }
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            debug: false,
            catalog_selector_label: "Select Catalog".to_string(),
            user_token: None,
        }
    }
}

/// Hosted search backend settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendSettings {
    /// Application id
    pub app_id: String,
    /// Search-only API key
    pub api_key: String,
    /// Host override (defaults to `{app_id}-dsn.algolia.net`)
    pub host: Option<String>,
    /// Request timeout in seconds
    pub request_timeout: f64,
    /// Response cache TTL in seconds (0 disables caching)
    pub cache_ttl: u64,
    /// Maximum number of cached responses
    pub cache_capacity: u64,
}

impl BackendSettings {
    /// Base URL of the search API
    pub fn base_url(&self) -> String {
        match self.host {
            Some(ref host) if host.starts_with("http://") || host.starts_with("https://") => {
                host.trim_end_matches('/').to_string()
            }
            Some(ref host) => format!("https://{}", host.trim_end_matches('/')),
            None => format!("https://{}-dsn.algolia.net", self.app_id),
        }
    }
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            app_id: "latency".to_string(),
            api_key: "6be0576ff61c053d5f9a3225e2a90f76".to_string(),
            host: None,
            request_timeout: 5.0,
            cache_ttl: 120,
            cache_capacity: 1000,
        }
    }
}

/// Analytics settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InsightsSettings {
    /// Send events to the insights endpoint (log only when disabled)
    pub enabled: bool,
    /// Events endpoint
    pub endpoint: String,
}

impl Default for InsightsSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: "https://insights.algolia.io/1/events".to_string(),
        }
    }
}

/// Search bar settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AutocompleteSettings {
    /// Input placeholder
    pub placeholder: String,
    /// Open the panel when the input gains focus
    pub open_on_focus: bool,
    /// Number of query suggestions to fetch
    pub suggestions_hits_per_page: u32,
    /// Number of product items to fetch
    pub products_hits_per_page: u32,
    /// Message shown when no product matches
    pub no_results_message: String,
    /// Number of recent searches to keep
    pub recent_searches_limit: usize,
}

impl Default for AutocompleteSettings {
    fn default() -> Self {
        Self {
            placeholder: "Search for Products".to_string(),
            open_on_focus: true,
            suggestions_hits_per_page: 3,
            products_hits_per_page: 3,
            no_results_message: "No products matching.".to_string(),
            recent_searches_limit: 3,
        }
    }
}

/// Results panel settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResultsSettings {
    /// Hits per results page
    pub hits_per_page: u32,
    /// Ask the backend for a query id usable by analytics
    pub click_analytics: bool,
}

impl Default for ResultsSettings {
    fn default() -> Self {
        Self {
            hits_per_page: 12,
            click_analytics: true,
        }
    }
}

/// Binding of a page container to the catalog its results panel shows
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MountConfig {
    pub container_id: String,
    pub catalog_id: String,
}

impl MountConfig {
    pub fn new(container_id: impl Into<String>, catalog_id: impl Into<String>) -> Self {
        Self {
            container_id: container_id.into(),
            catalog_id: catalog_id.into(),
        }
    }
}

/// Default catalogs
fn default_catalogs() -> Vec<CatalogDescriptor> {
    vec![
        CatalogDescriptor {
            catalog_id: "products".to_string(),
            catalog_label: "All Products".to_string(),
            records_index: "instant_search".to_string(),
            suggestions_index: "instant_search_demo_query_suggestions".to_string(),
            search_page_path: "/search/".to_string(),
        },
        CatalogDescriptor {
            catalog_id: "expensiveProducts".to_string(),
            catalog_label: "Expensive Products".to_string(),
            records_index: "instant_search_price_desc".to_string(),
            suggestions_index: "instant_search_query_suggestions_test".to_string(),
            search_page_path: "/search-vip/".to_string(),
        },
    ]
}

/// Default results containers
fn default_mounts() -> Vec<MountConfig> {
    vec![
        MountConfig::new("search-results-products", "products"),
        MountConfig::new("search-results-expensive-products", "expensiveProducts"),
    ]
}
