//! Catalog search: a multi-catalog product search front end
//!
//! A search bar with a catalog selector shares one query with any number of
//! independently mounted results panels. The query lives in the page URL;
//! submits on a results page reach the panels through a page-scoped event
//! bus, submits elsewhere navigate to the selected catalog's results page.

pub mod autocomplete;
pub mod backend;
pub mod bootstrap;
pub mod bus;
pub mod catalog;
pub mod config;
pub mod error;
pub mod insights;
pub mod location;
pub mod results;
pub mod session;
pub mod shell;

#[cfg(test)]
pub(crate) mod testing;

pub use autocomplete::AutocompleteCoordinator;
pub use bootstrap::{mount_page, MountedPage, PageDocument};
pub use bus::{EventBus, QueryUpdateEvent};
pub use catalog::{CatalogDescriptor, CatalogRegistry};
pub use config::Settings;
pub use error::{Error, Result};
pub use results::ResultsPanel;
pub use session::SessionState;

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
