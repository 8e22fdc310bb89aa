//! Results panels
//!
//! A panel is bound to one catalog at mount, seeds its query from the URL and
//! follows query updates published for its records index.

mod panel;
mod refinements;

pub use panel::{FetchedResults, PanelSnapshot, PendingRefresh, ResultsPanel, ResultsStatus};
pub use refinements::{CurrentRefinement, Refinements, CATEGORY_PREFIX, REFINABLE_ATTRIBUTES};
