//! Search bar coordinator
//!
//! Owns the catalog selection and decides, on submit, between leaving for the
//! selected catalog's results page and notifying the panels already on it.

use super::sources::{
    FetchedSuggestions, PendingFetch, ProductsStatus, SuggestionItem, SuggestionSources,
    SuggestionsView,
};
use crate::bus::QueryUpdateEvent;
use crate::catalog::{active_catalog_index, CatalogDescriptor};
use crate::insights::{EventKind, InsightsEvent, ITEMS_VIEWED, ITEM_SELECTED};
use crate::location::{read_param, search_page_href, write_param, QUERY_PARAM};
use crate::session::SessionState;
use std::sync::{Arc, PoisonError};
use tracing::{debug, info, warn};

/// Result of a submit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Left the page for the selected catalog's results page
    Navigated(String),
    /// Stayed on the results page and published a query update
    Published { delivered: usize },
}

/// Result of a catalog switch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwitchOutcome {
    /// Unknown or already selected catalog; nothing changed
    Unchanged,
    /// On a results page: redirected to the new catalog's page
    Redirected(String),
    /// Elsewhere: suggestion sources rebound to the new catalog
    Rebound,
}

/// Result of choosing an entry of the suggestions panel
#[derive(Debug, Clone, PartialEq)]
pub enum SelectOutcome {
    /// A recent search or query suggestion was submitted
    Submitted(SubmitOutcome),
    /// A product item was chosen
    Product(crate::backend::Hit),
    /// No entry at that position
    Nothing,
}

/// An option of the catalog selector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogOption {
    pub catalog_id: String,
    pub catalog_label: String,
    pub selected: bool,
}

/// Mounted search bar
pub struct AutocompleteCoordinator {
    session: SessionState,
    selected: CatalogDescriptor,
    sources: Arc<SuggestionSources>,
    input: String,
    is_open: bool,
    next_seq: u64,
    applied_seq: u64,
    view: SuggestionsView,
}

impl AutocompleteCoordinator {
    /// Mount the search bar on the current page.
    ///
    /// The selection follows the current path; a non-empty `q` seeds the
    /// input without fetching or publishing anything.
    pub fn mount(session: &SessionState) -> Self {
        let path = session.current_path();
        let index = active_catalog_index(session.registry.as_slice(), &path);
        let selected = session.registry.active(&path).clone();
        debug!(
            "Mounting search bar on {} with catalog #{} ({})",
            path, index, selected.catalog_id
        );

        let sources = Arc::new(SuggestionSources::new(
            0,
            selected.clone(),
            session.backend.clone(),
            &session.settings.autocomplete,
        ));

        let mut coordinator = Self {
            session: session.clone(),
            selected,
            sources,
            input: String::new(),
            is_open: false,
            next_seq: 0,
            applied_seq: 0,
            view: SuggestionsView::default(),
        };
        coordinator.seed_from_url();
        coordinator
    }

    fn seed_from_url(&mut self) {
        let query = read_param(self.session.location.as_ref(), QUERY_PARAM);
        if !query.is_empty() {
            debug!("Seeding search bar with '{}'", query);
            self.input = query;
        }
    }

    pub fn selected_catalog(&self) -> &CatalogDescriptor {
        &self.selected
    }

    pub fn selected_catalog_id(&self) -> &str {
        &self.selected.catalog_id
    }

    /// Current input value
    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn placeholder(&self) -> &str {
        &self.session.settings.autocomplete.placeholder
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }

    pub fn view(&self) -> &SuggestionsView {
        &self.view
    }

    /// Label and options of the catalog selector
    pub fn catalog_options(&self) -> (&str, Vec<CatalogOption>) {
        let options = self
            .session
            .registry
            .iter()
            .map(|c| CatalogOption {
                catalog_id: c.catalog_id.clone(),
                catalog_label: c.catalog_label.clone(),
                selected: c.catalog_id == self.selected.catalog_id,
            })
            .collect();
        (&self.session.settings.general.catalog_selector_label, options)
    }

    /// Input gained focus; opens the panel when configured to
    pub fn focus(&mut self) -> Option<PendingFetch> {
        if !self.session.settings.autocomplete.open_on_focus {
            return None;
        }
        let input = self.input.clone();
        Some(self.begin_fetch(&input))
    }

    /// Close the panel
    pub fn blur(&mut self) {
        self.is_open = false;
    }

    /// Record a keystroke and prepare its fetch against the selected catalog
    pub fn begin_fetch(&mut self, text: &str) -> PendingFetch {
        self.input = text.to_string();
        self.is_open = true;
        self.next_seq += 1;

        PendingFetch {
            seq: self.next_seq,
            query: text.to_string(),
            sources: Arc::downgrade(&self.sources),
        }
    }

    /// Apply a finished fetch.
    ///
    /// Results of a request older than the last applied one, or bound to a
    /// previous catalog, are dropped. Returns whether the view changed.
    pub fn apply(&mut self, fetched: FetchedSuggestions) -> bool {
        if fetched.generation != self.sources.generation() {
            debug!(
                "Dropping suggestions for '{}' from a previous catalog binding",
                fetched.query
            );
            return false;
        }
        if fetched.seq <= self.applied_seq {
            debug!(
                "Dropping suggestions #{} for '{}', #{} already applied",
                fetched.seq, fetched.query, self.applied_seq
            );
            return false;
        }
        self.applied_seq = fetched.seq;

        let suggestions = fetched.suggestions.unwrap_or_else(|e| {
            warn!("Query suggestions failed for '{}': {}", fetched.query, e);
            vec![]
        });

        let (products, query_id, status) = match fetched.products {
            Ok(response) if response.hits.is_empty() => (
                vec![],
                response.query_id,
                ProductsStatus::NoResults(
                    self.session.settings.autocomplete.no_results_message.clone(),
                ),
            ),
            Ok(response) => (response.hits, response.query_id, ProductsStatus::Ready),
            Err(e) => {
                warn!("Product items failed for '{}': {}", fetched.query, e);
                (vec![], None, ProductsStatus::Error(e.to_string()))
            }
        };

        let recent = self
            .session
            .recent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .matching(&fetched.query);

        self.view = SuggestionsView {
            query: fetched.query,
            records_index: fetched.records_index,
            recent,
            suggestions,
            products,
            query_id,
            status,
        };

        if !self.view.products.is_empty() {
            let event = self
                .view
                .products
                .iter()
                .zip(1..)
                .fold(
                    InsightsEvent::new(EventKind::View, ITEMS_VIEWED, &self.view.records_index),
                    |event, (hit, position)| event.with_hit(hit, position),
                );
            self.session.insights.send_event(event);
        }

        true
    }

    /// Type `text` and wait for its suggestions
    pub async fn type_text(&mut self, text: &str) -> bool {
        match self.begin_fetch(text).run().await {
            Some(fetched) => self.apply(fetched),
            None => false,
        }
    }

    /// Switch the selected catalog
    pub fn switch_catalog(&mut self, catalog_id: &str) -> SwitchOutcome {
        let Some(target) = self.session.registry.get(catalog_id).cloned() else {
            warn!("Ignoring switch to unknown catalog '{}'", catalog_id);
            return SwitchOutcome::Unchanged;
        };

        let location = self.session.location.as_ref();
        let path = location.pathname();
        if self.session.registry.results_page(&path).is_some() {
            let query = read_param(location, QUERY_PARAM);
            let href = search_page_href(&target.search_page_path, &query);
            info!(
                "Switching to catalog {} from results page {}, redirecting",
                target.catalog_id, path
            );
            location.assign(&href);
            return SwitchOutcome::Redirected(href);
        }

        if target.catalog_id == self.selected.catalog_id {
            return SwitchOutcome::Unchanged;
        }

        info!(
            "Switching search bar from {} to {}",
            self.selected.catalog_id, target.catalog_id
        );
        self.rebind(target);
        SwitchOutcome::Rebound
    }

    fn rebind(&mut self, catalog: CatalogDescriptor) {
        let generation = self.sources.generation() + 1;
        self.sources = Arc::new(SuggestionSources::new(
            generation,
            catalog.clone(),
            self.session.backend.clone(),
            &self.session.settings.autocomplete,
        ));
        self.selected = catalog;
        self.view = SuggestionsView::default();
        self.is_open = false;
        self.input.clear();
        self.seed_from_url();
    }

    /// Commit a search
    pub fn submit(&mut self, query: &str) -> SubmitOutcome {
        let location = self.session.location.as_ref();
        write_param(location, QUERY_PARAM, query);

        self.input = query.to_string();
        self.is_open = false;
        self.session
            .recent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .add(query);

        let path = location.pathname();
        if path != self.selected.search_page_path {
            let href = search_page_href(&self.selected.search_page_path, query);
            info!("Submitted '{}' off the results page, navigating to {}", query, href);
            location.assign(&href);
            return SubmitOutcome::Navigated(href);
        }

        let event = QueryUpdateEvent::new(query, &self.selected.records_index);
        let delivered = self.session.bus.publish(event);
        info!(
            "Submitted '{}' on {}, {} panel(s) notified",
            query, self.selected.catalog_id, delivered
        );
        SubmitOutcome::Published { delivered }
    }

    /// Choose the entry at `position` (0-based) of the suggestions panel
    pub fn select(&mut self, position: usize) -> SelectOutcome {
        match self.view.items().into_iter().nth(position) {
            Some(SuggestionItem::Recent(query)) => SelectOutcome::Submitted(self.submit(&query)),
            Some(SuggestionItem::Suggestion(suggestion)) => {
                SelectOutcome::Submitted(self.submit(&suggestion.query))
            }
            Some(SuggestionItem::Product(hit)) => {
                let position = self.view.product_position(&hit.object_id).unwrap_or(1);
                let event =
                    InsightsEvent::new(EventKind::Click, ITEM_SELECTED, &self.view.records_index)
                        .with_hit(&hit, position)
                        .with_query_id(self.view.query_id.clone());
                self.session.insights.send_event(event);
                self.is_open = false;
                SelectOutcome::Product(hit)
            }
            None => SelectOutcome::Nothing,
        }
    }

    /// Tear down the search bar.
    ///
    /// Fetches begun before this no longer reach the backend when run.
    pub fn unmount(self) {
        debug!("Unmounting search bar ({})", self.selected.catalog_id);
    }
}
