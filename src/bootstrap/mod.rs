//! Page bootstrap
//!
//! Mounts the search bar and the results panels whose containers exist on
//! the current page.

use crate::autocomplete::AutocompleteCoordinator;
use crate::config::Settings;
use crate::results::ResultsPanel;
use crate::session::SessionState;
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

/// Container of the search bar
pub const SEARCH_BAR_CONTAINER: &str = "search-bar__container";
/// Container of the default products panel
pub const PRODUCTS_RESULTS_CONTAINER: &str = "search-results-products";
/// Container of the expensive products panel
pub const EXPENSIVE_RESULTS_CONTAINER: &str = "search-results-expensive-products";

/// Container ids present on a page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageDocument {
    containers: BTreeSet<String>,
}

impl PageDocument {
    pub fn new<I, S>(containers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            containers: containers.into_iter().map(Into::into).collect(),
        }
    }

    /// Layout served at `path`: the search bar everywhere, plus the
    /// containers of the mounts whose catalog has its results page there
    pub fn for_path(path: &str, settings: &Settings) -> Self {
        let mut containers = vec![SEARCH_BAR_CONTAINER.to_string()];
        containers.extend(
            settings
                .mounts
                .iter()
                .filter(|m| {
                    settings
                        .get_catalog(&m.catalog_id)
                        .is_some_and(|c| c.search_page_path == path)
                })
                .map(|m| m.container_id.clone()),
        );
        Self::new(containers)
    }

    pub fn has(&self, container_id: &str) -> bool {
        self.containers.contains(container_id)
    }
}

/// Widgets mounted on a page
pub struct MountedPage {
    pub autocomplete: Option<AutocompleteCoordinator>,
    pub panels: Vec<ResultsPanel>,
}

impl MountedPage {
    /// First panel bound to `catalog_id`
    pub fn panel(&self, catalog_id: &str) -> Option<&ResultsPanel> {
        self.panels
            .iter()
            .find(|p| p.catalog().catalog_id == catalog_id)
    }

    /// Refresh every panel whose results are out of date.
    ///
    /// Returns the number of panels refreshed.
    pub async fn refresh_panels(&self) -> usize {
        let stale: Vec<&ResultsPanel> = self.panels.iter().filter(|p| p.needs_refresh()).collect();
        let pending: Vec<_> = stale.iter().map(|p| p.begin_refresh().run()).collect();
        let fetched = futures::future::join_all(pending).await;

        stale
            .iter()
            .zip(fetched)
            .map(|(panel, fetched)| panel.apply(fetched))
            .filter(|applied| *applied)
            .count()
    }

    /// Tear down every widget
    pub fn unmount(self) {
        if let Some(autocomplete) = self.autocomplete {
            autocomplete.unmount();
        }
        let count = self.panels.len();
        for panel in self.panels {
            panel.unmount();
        }
        debug!("Unmounted page ({} panels)", count);
    }
}

/// Mount the widgets for the containers present in `document`
pub fn mount_page(document: &PageDocument, session: &SessionState) -> MountedPage {
    let autocomplete = document
        .has(SEARCH_BAR_CONTAINER)
        .then(|| AutocompleteCoordinator::mount(session));

    let mut panels = Vec::new();
    for mount in &session.settings.mounts {
        if !document.has(&mount.container_id) {
            continue;
        }
        match ResultsPanel::mount(session, &mount.catalog_id) {
            Ok(panel) => panels.push(panel),
            Err(e) => warn!("Skipping container {}: {}", mount.container_id, e),
        }
    }

    info!(
        "Mounted {} on {} ({} panels)",
        if autocomplete.is_some() { "search bar" } else { "no search bar" },
        session.current_path(),
        panels.len()
    );

    MountedPage {
        autocomplete,
        panels,
    }
}
