//! Precomputation error types.

use std::path::PathBuf;

use crate::domain::StopId;

/// Errors that can occur while precomputing transfer patterns.
#[derive(Debug, thiserror::Error)]
pub enum PatternError {
    /// Reading or writing the output directory failed
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Patterns could not be serialized or parsed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A worker could not finish an origin; the run was abandoned
    #[error("worker {worker} failed on origin {origin}: {source}")]
    Worker {
        worker: usize,
        origin: StopId,
        #[source]
        source: Box<PatternError>,
    },

    /// A worker thread panicked
    #[error("a precompute worker panicked")]
    Panicked,
}
