//! Error types for the search synchronization core

use thiserror::Error;

/// Errors surfaced by the catalog search core and its collaborators
#[derive(Debug, Error)]
pub enum Error {
    /// Transport failure talking to the search or insights service
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body could not be decoded
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The backend answered with a non-success status
    #[error("Backend error on index '{index}' (status {status}): {message}")]
    Backend {
        index: String,
        status: u16,
        message: String,
    },

    /// Search parameters rejected at the boundary
    #[error("Invalid search parameters: {0}")]
    InvalidParams(String),

    /// Two catalog descriptors share the same id
    #[error("Duplicate catalog id: {0}")]
    DuplicateCatalog(String),

    /// The catalog registry has no entries
    #[error("Catalog registry is empty")]
    EmptyRegistry,

    /// A catalog id that the registry does not know
    #[error("Unknown catalog: {0}")]
    UnknownCatalog(String),
}

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, Error>;
