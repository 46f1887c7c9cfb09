//! Round-based journey planner.
//!
//! This module implements the core planning algorithm that answers: "leaving
//! this stop at this time, or within this window, which journeys reach that
//! stop, and how fast can each number of legs get there?"
//!
//! The [`ScheduleIndex`] is built once and shared read-only. Each query owns
//! its scan state: a [`TripScanner`] with per-route cursors, the arrival
//! tables, and the [`ConnectionIndex`] the journeys are rebuilt from.

mod config;
mod index;
mod query;
mod queue;
mod raptor;
mod reconstruct;
mod request;
mod results;
mod scanner;


pub use config::SearchConfig;
pub use index::{Departure, IndexedTransfer, Route, RouteIdx, ScheduleIndex, StopIdx};
pub use query::{DepartAfterQuery, TimeRangeQuery};
pub use queue::RouteQueueBuilder;
pub use raptor::{Connection, ConnectionIndex, RoundScanner, ScanMode, ScanRequest, ScanState};
pub use reconstruct::JourneyReconstructor;
pub use request::{PlanError, PlanRequest, validate_window};
pub use results::{
    DetailedJourney, DetailedJourneys, DetailedLeg, FixedLeg, JourneyResultBuilder, PlainJourneys,
    RailLeg, ResultContext, StopDateTime, SummaryJourney, SummaryJourneys, SummaryLeg, TrainTrip,
};
pub use scanner::{CalendarFilter, TripScanner};
