//! Transfer-pattern precomputation.
//!
//! For every origin, every departure of a service day is scanned and the
//! sequence of stops each resulting journey changes at is recorded. The
//! scans of one origin run sequentially on one thread; origins are spread
//! over a pool of workers.

mod error;
mod generator;
mod repository;
mod strings;
mod worker;

pub use error::PatternError;
pub use generator::{TransferPatternGenerator, TransferPatternResults};
pub use repository::{JsonDirectoryRepository, PatternRepository};
pub use strings::{PatternStringGenerator, TransferPatterns, pattern_of};
pub use worker::{PrecomputeSummary, all_origins, precompute};
