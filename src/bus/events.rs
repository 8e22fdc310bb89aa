//! Messages carried by the event bus

use serde::{Deserialize, Serialize};

/// Topics a subscriber can listen on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    /// A query was submitted on a results page
    QueryUpdate,
}

/// Query submitted from the search bar, addressed to one records index.
///
/// An empty `query` clears the panel back to its unfiltered view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryUpdateEvent {
    pub query: String,
    pub records_index: String,
}

impl QueryUpdateEvent {
    pub fn new(query: impl Into<String>, records_index: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            records_index: records_index.into(),
        }
    }
}

/// A message published on the bus
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BusMessage {
    QueryUpdate(QueryUpdateEvent),
}

impl BusMessage {
    pub fn topic(&self) -> Topic {
        match self {
            Self::QueryUpdate(_) => Topic::QueryUpdate,
        }
    }
}

impl From<QueryUpdateEvent> for BusMessage {
    fn from(event: QueryUpdateEvent) -> Self {
        Self::QueryUpdate(event)
    }
}
