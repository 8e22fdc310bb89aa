//! Results panel bound to one catalog

use super::refinements::{CurrentRefinement, Refinements};
use crate::backend::{Hit, SearchBackend, SearchParams, SearchResponse};
use crate::bus::{QueryUpdateEvent, Subscription};
use crate::catalog::CatalogDescriptor;
use crate::error::{Error, Result};
use crate::insights::{EventKind, InsightsEvent, PRODUCT_ORDERED};
use crate::location::{read_param, QUERY_PARAM};
use crate::session::SessionState;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info, warn};

/// What the panel currently displays
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ResultsStatus {
    /// Not fetched yet
    #[default]
    Idle,
    Ready(SearchResponse<Hit>),
    /// Last fetch failed
    Error(String),
}

/// Point-in-time copy of a panel's state
#[derive(Debug, Clone, PartialEq)]
pub struct PanelSnapshot {
    pub catalog_id: String,
    pub records_index: String,
    pub query: String,
    pub page: u32,
    pub refinements: Vec<CurrentRefinement>,
    pub status: ResultsStatus,
}

#[derive(Debug, Default)]
struct PanelState {
    query: String,
    refinements: Refinements,
    page: u32,
    /// Bumped on every change of query, refinements or page
    revision: u64,
    applied_revision: u64,
    status: ResultsStatus,
}

impl PanelState {
    fn set_query(&mut self, query: &str) {
        self.query = query.to_string();
        self.page = 0;
        self.revision += 1;
    }
}

/// A refresh computed from the panel state, not yet sent
pub struct PendingRefresh {
    revision: u64,
    index: String,
    query: String,
    params: SearchParams,
    backend: Arc<dyn SearchBackend>,
}

impl PendingRefresh {
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub async fn run(self) -> FetchedResults {
        let result = self
            .backend
            .fetch_results(&self.index, &self.query, &self.params)
            .await;
        FetchedResults {
            revision: self.revision,
            result,
        }
    }
}

/// Backend answer for one refresh
pub struct FetchedResults {
    revision: u64,
    result: Result<SearchResponse<Hit>>,
}

impl FetchedResults {
    pub fn revision(&self) -> u64 {
        self.revision
    }
}

/// Mounted results panel.
///
/// Listens for query updates aimed at its records index. Dropping the panel
/// (or [`ResultsPanel::unmount`]) deregisters it from the bus.
pub struct ResultsPanel {
    session: SessionState,
    catalog: CatalogDescriptor,
    state: Arc<RwLock<PanelState>>,
    subscription: Subscription,
}

impl ResultsPanel {
    /// Mount a panel for `catalog_id` on the current page
    pub fn mount(session: &SessionState, catalog_id: &str) -> Result<Self> {
        let catalog = session
            .registry
            .get(catalog_id)
            .cloned()
            .ok_or_else(|| Error::UnknownCatalog(catalog_id.to_string()))?;

        let mut initial = PanelState {
            revision: 1,
            ..Default::default()
        };
        let query = read_param(session.location.as_ref(), QUERY_PARAM);
        if !query.is_empty() {
            debug!("Seeding panel {} with '{}'", catalog.catalog_id, query);
            initial.query = query;
        }
        let state = Arc::new(RwLock::new(initial));

        let handler_state = state.clone();
        let records_index = catalog.records_index.clone();
        let catalog_id = catalog.catalog_id.clone();
        let subscription = session
            .bus
            .subscribe_query_updates(move |event: &QueryUpdateEvent| {
                if event.records_index != records_index {
                    return;
                }
                debug!("Panel {} received query '{}'", catalog_id, event.query);
                write_state(&handler_state).set_query(&event.query);
            });

        info!(
            "Mounted results panel for {} ({})",
            catalog.catalog_id, catalog.records_index
        );

        Ok(Self {
            session: session.clone(),
            catalog,
            state,
            subscription,
        })
    }

    pub fn catalog(&self) -> &CatalogDescriptor {
        &self.catalog
    }

    pub fn query(&self) -> String {
        read_state(&self.state).query.clone()
    }

    pub fn snapshot(&self) -> PanelSnapshot {
        let state = read_state(&self.state);
        PanelSnapshot {
            catalog_id: self.catalog.catalog_id.clone(),
            records_index: self.catalog.records_index.clone(),
            query: state.query.clone(),
            page: state.page,
            refinements: state.refinements.current(),
            status: state.status.clone(),
        }
    }

    /// Whether the displayed results lag behind the panel state
    pub fn needs_refresh(&self) -> bool {
        let state = read_state(&self.state);
        state.revision > state.applied_revision
    }

    /// Prepare a fetch for the current query, refinements and page
    pub fn begin_refresh(&self) -> PendingRefresh {
        let state = read_state(&self.state);
        let settings = &self.session.settings.results;

        let params = SearchParams::new()
            .with_hits_per_page(settings.hits_per_page)
            .with_page(state.page)
            .with_click_analytics(settings.click_analytics);

        PendingRefresh {
            revision: state.revision,
            index: self.catalog.records_index.clone(),
            query: state.query.clone(),
            params: state.refinements.apply_to(params),
            backend: self.session.backend.clone(),
        }
    }

    /// Apply a finished fetch unless a newer one was already applied
    pub fn apply(&self, fetched: FetchedResults) -> bool {
        let mut state = write_state(&self.state);
        if fetched.revision < state.applied_revision {
            debug!(
                "Dropping results revision {} for {}, {} already applied",
                fetched.revision, self.catalog.catalog_id, state.applied_revision
            );
            return false;
        }
        state.applied_revision = fetched.revision;

        state.status = match fetched.result {
            Ok(response) => {
                debug!(
                    "Panel {} shows {} of {} hits for '{}'",
                    self.catalog.catalog_id,
                    response.hits.len(),
                    response.nb_hits,
                    response.query
                );
                ResultsStatus::Ready(response)
            }
            Err(e) => {
                warn!("Results for {} failed: {}", self.catalog.catalog_id, e);
                ResultsStatus::Error(e.to_string())
            }
        };
        true
    }

    /// Fetch and apply the current state
    pub async fn refresh(&self) -> bool {
        let fetched = self.begin_refresh().run().await;
        self.apply(fetched)
    }

    /// Toggle a facet value; resets pagination
    pub fn toggle_refinement(&self, attribute: &str, value: &str) -> Result<bool> {
        let mut state = write_state(&self.state);
        let active = state.refinements.toggle(attribute, value)?;
        state.page = 0;
        state.revision += 1;
        Ok(active)
    }

    pub fn clear_refinements(&self) {
        let mut state = write_state(&self.state);
        if state.refinements.is_empty() {
            return;
        }
        state.refinements.clear();
        state.page = 0;
        state.revision += 1;
    }

    /// Go to `page` (0-based)
    pub fn set_page(&self, page: u32) {
        let mut state = write_state(&self.state);
        if state.page != page {
            state.page = page;
            state.revision += 1;
        }
    }

    /// Send a conversion for a displayed hit.
    ///
    /// Returns false when the hit is not on the current page.
    pub fn add_to_cart(&self, object_id: &str) -> bool {
        let state = read_state(&self.state);
        let ResultsStatus::Ready(response) = &state.status else {
            warn!("Add to cart of {} with no results shown", object_id);
            return false;
        };
        let Some(offset) = response.hits.iter().position(|h| h.object_id == object_id) else {
            warn!(
                "Add to cart of {} which is not shown on {}",
                object_id, self.catalog.catalog_id
            );
            return false;
        };

        let hit = &response.hits[offset];
        let event = InsightsEvent::new(
            EventKind::Conversion,
            PRODUCT_ORDERED,
            &self.catalog.records_index,
        );
        let event = match absolute_position(response, offset) {
            Some(position) => event.with_hit(hit, position),
            None => {
                warn!(
                    "Position of {} out of range (page {}, {} per page), sending without it",
                    object_id, response.page, response.hits_per_page
                );
                event.with_unplaced_hit(hit)
            }
        }
        .with_query_id(response.query_id.clone());

        info!("Product {} ordered from {}", object_id, self.catalog.catalog_id);
        self.session.insights.send_event(event);
        true
    }

    /// Deregister from the bus and tear the panel down
    pub fn unmount(self) {
        debug!(
            "Unmounting results panel {} ({:?})",
            self.catalog.catalog_id,
            self.subscription.token()
        );
    }
}

/// 1-based position of the hit at `offset` across all pages
fn absolute_position(response: &SearchResponse<Hit>, offset: usize) -> Option<u32> {
    let offset = u32::try_from(offset).ok()?;
    response
        .page
        .checked_mul(response.hits_per_page)?
        .checked_add(offset)?
        .checked_add(1)
}

fn read_state(state: &RwLock<PanelState>) -> RwLockReadGuard<'_, PanelState> {
    state.read().unwrap_or_else(PoisonError::into_inner)
}

fn write_state(state: &RwLock<PanelState>) -> RwLockWriteGuard<'_, PanelState> {
    state.write().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::Topic;
    use crate::config::Settings;
    use crate::location::MemoryLocation;
    use crate::testing::{RecordingInsights, StaticBackend, PRODUCTS_INDEX, VIP_INDEX};

    fn session(href: &str) -> (SessionState, Arc<StaticBackend>, Arc<RecordingInsights>) {
        let backend = Arc::new(StaticBackend::demo());
        let insights = Arc::new(RecordingInsights::default());
        let session = SessionState::new(
            Settings::default(),
            Arc::new(MemoryLocation::new(href)),
            backend.clone(),
            insights.clone(),
        )
        .unwrap();
        (session, backend, insights)
    }

    fn hit_ids(panel: &ResultsPanel) -> Vec<String> {
        match panel.snapshot().status {
            ResultsStatus::Ready(response) => {
                response.hits.into_iter().map(|h| h.object_id).collect()
            }
            other => panic!("no results: {other:?}"),
        }
    }

    #[test]
    fn test_mount_seeds_query_for_every_catalog() {
        let (session, backend, _) = session("https://shop.example/search/?q=foo");
        for id in session.registry.ids() {
            let panel = ResultsPanel::mount(&session, &id).unwrap();
            assert_eq!(panel.query(), "foo");
            assert!(panel.needs_refresh());
        }
        assert_eq!(backend.results_calls(), 0);
    }

    #[test]
    fn test_mount_without_query() {
        let (session, _, _) = session("https://shop.example/search/");
        let panel = ResultsPanel::mount(&session, "products").unwrap();
        assert_eq!(panel.query(), "");
        assert_eq!(panel.snapshot().status, ResultsStatus::Idle);
    }

    #[test]
    fn test_mount_unknown_catalog() {
        let (session, _, _) = session("https://shop.example/search/");
        assert!(matches!(
            ResultsPanel::mount(&session, "nope"),
            Err(Error::UnknownCatalog(_))
        ));
        assert_eq!(session.bus.subscriber_count(Topic::QueryUpdate), 0);
    }

    #[test]
    fn test_update_reaches_only_matching_index() {
        let (session, _, _) = session("https://shop.example/search/?q=old");
        let products = ResultsPanel::mount(&session, "products").unwrap();
        let vip = ResultsPanel::mount(&session, "expensiveProducts").unwrap();

        let delivered = session.bus.publish(QueryUpdateEvent::new("shoes", PRODUCTS_INDEX));

        assert_eq!(delivered, 2);
        assert_eq!(products.query(), "shoes");
        assert_eq!(vip.query(), "old");
    }

    #[test]
    fn test_update_reaches_every_panel_on_index() {
        let (session, _, _) = session("https://shop.example/search-vip/");
        let first = ResultsPanel::mount(&session, "expensiveProducts").unwrap();
        let second = ResultsPanel::mount(&session, "expensiveProducts").unwrap();

        session.bus.publish(QueryUpdateEvent::new("phone", VIP_INDEX));

        assert_eq!(first.query(), "phone");
        assert_eq!(second.query(), "phone");
    }

    #[test]
    fn test_empty_update_clears_query_and_page() {
        let (session, _, _) = session("https://shop.example/search/?q=tv");
        let panel = ResultsPanel::mount(&session, "products").unwrap();
        panel.set_page(2);

        session.bus.publish(QueryUpdateEvent::new("", PRODUCTS_INDEX));

        let snapshot = panel.snapshot();
        assert_eq!(snapshot.query, "");
        assert_eq!(snapshot.page, 0);
    }

    #[test]
    fn test_unmounted_panel_gets_no_updates() {
        let (session, _, _) = session("https://shop.example/search/?q=foo");
        let panel = ResultsPanel::mount(&session, "products").unwrap();
        let state = panel.state.clone();

        panel.unmount();
        let delivered = session.bus.publish(QueryUpdateEvent::new("shoes", PRODUCTS_INDEX));

        assert_eq!(delivered, 0);
        assert_eq!(read_state(&state).query, "foo");
    }

    #[tokio::test]
    async fn test_refresh_fetches_current_state() {
        let (session, backend, _) = session("https://shop.example/search/?q=tv");
        let panel = ResultsPanel::mount(&session, "products").unwrap();

        assert!(panel.refresh().await);
        assert!(!panel.needs_refresh());
        assert_eq!(hit_ids(&panel), vec!["1", "2"]);

        let (index, query, params) = backend.seen().pop().unwrap();
        assert_eq!(index, PRODUCTS_INDEX);
        assert_eq!(query, "tv");
        assert_eq!(params.hits_per_page, Some(12));
        assert_eq!(params.page, Some(0));
        assert!(params.click_analytics);
    }

    #[tokio::test]
    async fn test_refinements_narrow_results() {
        let (session, backend, _) = session("https://shop.example/search/?q=tv");
        let panel = ResultsPanel::mount(&session, "products").unwrap();
        panel.set_page(1);

        assert!(panel.toggle_refinement("brand", "Ikea").unwrap());
        assert_eq!(panel.snapshot().page, 0);
        panel.refresh().await;
        assert_eq!(hit_ids(&panel), vec!["2"]);
        assert_eq!(panel.snapshot().refinements[0].label, "Brand");

        panel.clear_refinements();
        assert!(panel.needs_refresh());
        panel.refresh().await;
        assert_eq!(hit_ids(&panel), vec!["1", "2"]);
        assert!(backend.seen().last().unwrap().2.facet_filters.is_empty());
    }

    #[tokio::test]
    async fn test_older_refresh_not_applied_over_newer() {
        let (session, _, _) = session("https://shop.example/search/?q=tv");
        let panel = ResultsPanel::mount(&session, "products").unwrap();

        let older = panel.begin_refresh();
        session.bus.publish(QueryUpdateEvent::new("phone", PRODUCTS_INDEX));
        let newer = panel.begin_refresh();
        assert!(older.revision() < newer.revision());

        let newer = newer.run().await;
        let older = older.run().await;
        assert!(panel.apply(newer));
        assert!(!panel.apply(older));
        assert_eq!(hit_ids(&panel), vec!["3"]);
    }

    #[tokio::test]
    async fn test_backend_failure_keeps_subscription() {
        let (session, backend, _) = session("https://shop.example/search/?q=tv");
        let panel = ResultsPanel::mount(&session, "products").unwrap();
        backend.set_failing(true);

        panel.refresh().await;
        assert!(matches!(panel.snapshot().status, ResultsStatus::Error(_)));

        backend.set_failing(false);
        session.bus.publish(QueryUpdateEvent::new("bag", PRODUCTS_INDEX));
        panel.refresh().await;
        assert_eq!(hit_ids(&panel), vec!["4"]);
    }

    #[tokio::test]
    async fn test_add_to_cart_sends_conversion() {
        let (session, _, insights) = session("https://shop.example/search/?q=tv");
        let panel = ResultsPanel::mount(&session, "products").unwrap();
        assert!(!panel.add_to_cart("2"));

        panel.refresh().await;
        assert!(panel.add_to_cart("2"));
        assert!(!panel.add_to_cart("999"));

        let events = insights.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, EventKind::Conversion);
        assert_eq!(events[0].name, PRODUCT_ORDERED);
        assert_eq!(events[0].index, PRODUCTS_INDEX);
        assert_eq!(events[0].object_ids, vec!["2"]);
        assert_eq!(events[0].positions, vec![2]);
        assert!(events[0].query_id.is_some());
    }

    #[tokio::test]
    async fn test_add_to_cart_with_position_out_of_range() {
        let (session, backend, insights) = session("https://shop.example/search/?q=tv");
        backend.force_paging(5_000_000, 1000);
        let panel = ResultsPanel::mount(&session, "products").unwrap();
        panel.refresh().await;

        assert!(panel.add_to_cart("1"));

        let events = insights.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].object_ids, vec!["1"]);
        assert!(events[0].positions.is_empty());
    }

    #[test]
    fn test_absolute_position() {
        let mut response = SearchResponse::from_hits("tv", vec![Hit::new("1", "a")]);
        response.page = 2;
        response.hits_per_page = 12;
        assert_eq!(absolute_position(&response, 3), Some(28));

        response.page = u32::MAX;
        assert_eq!(absolute_position(&response, 0), None);
    }
}
