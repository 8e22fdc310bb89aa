//! Recent searches of the search bar

use std::collections::VecDeque;

/// Most-recent-first list of submitted queries
#[derive(Debug, Clone, Default)]
pub struct RecentSearches {
    limit: usize,
    entries: VecDeque<String>,
}

impl RecentSearches {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            entries: VecDeque::with_capacity(limit),
        }
    }

    /// Record a submitted query. Blank queries are ignored; a repeated
    /// query moves to the front.
    pub fn add(&mut self, query: &str) {
        let query = query.trim();
        if query.is_empty() || self.limit == 0 {
            return;
        }

        self.entries.retain(|q| q != query);
        self.entries.push_front(query.to_string());
        self.entries.truncate(self.limit);
    }

    /// Entries containing `query`, case-insensitively
    pub fn matching(&self, query: &str) -> Vec<String> {
        let needle = query.trim().to_lowercase();
        self.entries
            .iter()
            .filter(|q| q.to_lowercase().contains(&needle))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
