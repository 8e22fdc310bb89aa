//! Shared handles for one browsing session

mod state;

pub use state::SessionState;
