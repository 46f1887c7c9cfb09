//! Earliest-trip lookup with calendar checks.
//!
//! Trips on a route are ordered so that, at every position, later trips
//! never depart earlier. The scanner keeps one cursor per route pointing at
//! the last trip it returned. Successive calls with similar times start from
//! there instead of the ends of the trip list, which is what makes the
//! repeated passes of a range query cheap.

use crate::domain::{ServiceDay, Time};

use super::index::{RouteIdx, ScheduleIndex};

/// Whether trips must run on the scanned day to be returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalendarFilter {
    /// Only trips whose calendar runs on the day.
    Enforce,
    /// Every trip counts as running.
    Bypass,
}

impl CalendarFilter {
    pub fn from_enabled(enabled: bool) -> Self {
        if enabled { Self::Enforce } else { Self::Bypass }
    }
}

/// Per-query trip finder. Not shared between concurrent queries.
pub struct TripScanner<'a> {
    index: &'a ScheduleIndex,
    day: ServiceDay,
    filter: CalendarFilter,
    cursors: Vec<Option<usize>>,
    running: Vec<Option<bool>>,
}

impl<'a> TripScanner<'a> {
    pub fn new(index: &'a ScheduleIndex, day: ServiceDay, filter: CalendarFilter) -> Self {
        Self {
            index,
            day,
            filter,
            cursors: vec![None; index.route_count()],
            running: vec![None; index.calendar_count()],
        }
    }

    pub fn day(&self) -> ServiceDay {
        self.day
    }

    /// Index within the route of the earliest trip departing `position` at
    /// or after `not_before` that runs on the scanner's day and picks up at
    /// `position`.
    pub fn get_trip(&mut self, route: RouteIdx, position: usize, not_before: Time) -> Option<usize> {
        let index = self.index;
        let trips = index.route(route).trips();
        if trips.is_empty() {
            return None;
        }
        let departs = |i: usize| trips[i].stop_times[position].departure;

        let mut first = self.cursors[route.0].unwrap_or(trips.len() - 1);
        if departs(first) < not_before {
            // The cursor is a hint: a later time needs later trips
            while first < trips.len() && departs(first) < not_before {
                first += 1;
            }
            if first == trips.len() {
                return None;
            }
        } else {
            while first > 0 && departs(first - 1) >= not_before {
                first -= 1;
            }
        }

        let found = (first..trips.len()).find(|&i| {
            trips[i].stop_times[position].pick_up
                && self.is_running(index.route(route).service_of(i))
        })?;

        self.cursors[route.0] = Some(found);
        Some(found)
    }

    /// Whether the calendar at `service` runs on the scanner's day.
    pub fn is_running(&mut self, service: usize) -> bool {
        if self.filter == CalendarFilter::Bypass {
            return true;
        }
        if let Some(running) = self.running[service] {
            return running;
        }
        let running = self.index.calendar(service).is_running(&self.day);
        self.running[service] = Some(running);
        running
    }
}
