//! Domain types for the journey planner.
//!
//! This module contains the value types describing a timetable (stops,
//! trips, transfers, calendars) and the journeys planned over it. Types that
//! carry invariants check them at construction time, so code receiving them
//! can trust their validity.

mod calendar;
mod error;
mod ids;
mod journey;
mod time;
mod trip;

pub use calendar::{Calendar, ServiceDay};
pub use error::DomainError;
pub use ids::{ServiceId, StopId, TripId, join_stops};
pub use journey::{Journey, Leg, TimetableLeg, TransferLeg};
pub use time::{SECONDS_PER_DAY, Time, TimeError};
pub use trip::{StopTime, TimeWindow, Transfer, Trip, split_train_uid};
