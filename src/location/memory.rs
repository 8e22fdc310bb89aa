//! In-memory location with a history stack

use super::{resolve, Location};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::info;

#[derive(Debug)]
struct HistoryState {
    entries: Vec<String>,
    current: usize,
    pending_navigation: Option<String>,
}

/// Location backed by an in-memory history.
///
/// `assign` records a pending navigation that the host (the shell, a test)
/// consumes with [`MemoryLocation::take_navigation`] to reload the page.
#[derive(Debug)]
pub struct MemoryLocation {
    state: Mutex<HistoryState>,
}

impl MemoryLocation {
    /// Create a location positioned at `href`
    pub fn new(href: impl Into<String>) -> Self {
        Self {
            state: Mutex::new(HistoryState {
                entries: vec![href.into()],
                current: 0,
                pending_navigation: None,
            }),
        }
    }

    /// Number of history entries
    pub fn history_len(&self) -> usize {
        self.state().entries.len()
    }

    /// Take the navigation requested since the last call, if any
    pub fn take_navigation(&self) -> Option<String> {
        self.state().pending_navigation.take()
    }

    fn state(&self) -> MutexGuard<'_, HistoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Location for MemoryLocation {
    fn href(&self) -> String {
        let state = self.state();
        state.entries[state.current].clone()
    }

    fn replace(&self, href: &str) {
        let mut state = self.state();
        let resolved = resolve(&state.entries[state.current], href);
        let current = state.current;
        state.entries[current] = resolved;
    }

    fn assign(&self, href: &str) {
        let mut state = self.state();
        let resolved = resolve(&state.entries[state.current], href);
        let keep = state.current + 1;
        state.entries.truncate(keep);
        state.entries.push(resolved.clone());
        state.current = state.entries.len() - 1;
        info!("Navigating to {}", resolved);
        state.pending_navigation = Some(resolved);
    }
}
