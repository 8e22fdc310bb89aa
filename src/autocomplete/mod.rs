//! Search bar with catalog selector
//!
//! Shows recent searches, query suggestions and product items for the
//! selected catalog, and routes submits either to a results page or to the
//! panels on the current page.

mod coordinator;
mod recent;
mod sources;

pub use coordinator::{
    AutocompleteCoordinator, CatalogOption, SelectOutcome, SubmitOutcome, SwitchOutcome,
};
pub use recent::RecentSearches;
pub use sources::{
    FetchedSuggestions, PendingFetch, ProductsStatus, SuggestionItem, SuggestionSources,
    SuggestionsView,
};
