//! Session state shared by the search bar and the results panels

use crate::autocomplete::RecentSearches;
use crate::backend::{AlgoliaBackend, CachedBackend, SearchBackend};
use crate::bus::EventBus;
use crate::catalog::CatalogRegistry;
use crate::config::Settings;
use crate::error::Result;
use crate::insights::{anonymous_user_token, HttpInsights, InsightsClient, LogInsights};
use crate::location::{read_param, Location, QUERY_PARAM};
use std::sync::{Arc, Mutex};

/// Collaborators of a session.
///
/// The event bus is scoped to one page: [`SessionState::reload`] hands out a
/// copy with a fresh bus, as a browser does on navigation. The recent
/// searches store survives reloads.
#[derive(Clone)]
pub struct SessionState {
    /// Global settings
    pub settings: Arc<Settings>,
    /// Catalog registry
    pub registry: Arc<CatalogRegistry>,
    /// Current page location
    pub location: Arc<dyn Location>,
    /// Page event bus
    pub bus: EventBus,
    /// Search backend
    pub backend: Arc<dyn SearchBackend>,
    /// Analytics sink
    pub insights: Arc<dyn InsightsClient>,
    /// Recent searches of the search bar
    pub recent: Arc<Mutex<RecentSearches>>,
}

impl SessionState {
    /// Create session state from explicit collaborators
    pub fn new(
        settings: Settings,
        location: Arc<dyn Location>,
        backend: Arc<dyn SearchBackend>,
        insights: Arc<dyn InsightsClient>,
    ) -> Result<Self> {
        let registry = Arc::new(CatalogRegistry::new(settings.catalogs.clone())?);
        let recent = Arc::new(Mutex::new(RecentSearches::new(
            settings.autocomplete.recent_searches_limit,
        )));

        Ok(Self {
            settings: Arc::new(settings),
            registry,
            location,
            bus: EventBus::new(),
            backend,
            insights,
            recent,
        })
    }

    /// Create session state talking to the hosted services from `settings`
    pub fn from_settings(settings: Settings, location: Arc<dyn Location>) -> Result<Self> {
        let algolia: Arc<dyn SearchBackend> =
            Arc::new(AlgoliaBackend::with_settings(&settings.backend)?);
        let backend: Arc<dyn SearchBackend> = if settings.backend.cache_ttl > 0 {
            Arc::new(CachedBackend::new(
                algolia,
                settings.backend.cache_ttl,
                settings.backend.cache_capacity,
            ))
        } else {
            algolia
        };

        let user_token = settings
            .general
            .user_token
            .clone()
            .unwrap_or_else(anonymous_user_token);
        let insights: Arc<dyn InsightsClient> = if settings.insights.enabled {
            Arc::new(HttpInsights::with_settings(
                &settings.backend,
                &settings.insights,
                user_token,
            )?)
        } else {
            Arc::new(LogInsights::new(user_token))
        };

        Self::new(settings, location, backend, insights)
    }

    /// Same session on a freshly loaded page
    pub fn reload(&self) -> Self {
        Self {
            bus: EventBus::new(),
            ..self.clone()
        }
    }

    /// Path of the current page
    pub fn current_path(&self) -> String {
        self.location.pathname()
    }

    /// Current value of the `q` parameter
    pub fn query_param(&self) -> String {
        read_param(self.location.as_ref(), QUERY_PARAM)
    }
}
