//! Search configuration for the journey planner.

/// Configuration parameters for journey search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchConfig {
    /// Journeys with more legs than this are dropped from formatted results.
    pub max_legs: usize,

    /// In range queries, require improvements to also beat the destination's
    /// best arrival for the same number of legs.
    pub destination_pruning: bool,

    /// Only use trips whose calendar runs on the query date.
    /// Disabling this treats every trip as running.
    pub filter_calendars: bool,
}

impl SearchConfig {
    /// Create a new configuration with the given parameters.
    pub fn new(max_legs: usize, destination_pruning: bool, filter_calendars: bool) -> Self {
        Self {
            max_legs,
            destination_pruning,
            filter_calendars,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_legs: 4,
            destination_pruning: true,
            filter_calendars: true,
        }
    }
}
