//! Application state for the web layer.

use std::sync::Arc;

use crate::cache::JourneyCache;
use crate::planner::{ScheduleIndex, SearchConfig};

/// Shared application state.
///
/// The index is built once at startup and only ever read, so every request
/// can plan against it concurrently.
#[derive(Clone)]
pub struct AppState {
    /// Schedule index shared by every query
    pub index: Arc<ScheduleIndex>,

    /// Journey planner configuration
    pub config: Arc<SearchConfig>,

    /// Results of range queries
    pub cache: Arc<JourneyCache>,
}

impl AppState {
    /// Create a new app state.
    pub fn new(index: ScheduleIndex, config: SearchConfig, cache: JourneyCache) -> Self {
        Self {
            index: Arc::new(index),
            config: Arc::new(config),
            cache: Arc::new(cache),
        }
    }
}
