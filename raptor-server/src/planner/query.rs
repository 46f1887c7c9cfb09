//! The two query shapes built on the round scanner.
//!
//! A depart-after query runs one scan from a fixed departure time. A
//! time-range query runs one scan per departure from the origin inside a
//! window, latest first, on shared state: each earlier pass only records
//! what beats everything the later passes already found.

use tracing::debug;

use crate::domain::{ServiceDay, Time};

use super::config::SearchConfig;
use super::index::{ScheduleIndex, StopIdx};
use super::raptor::{RoundScanner, ScanMode, ScanRequest, ScanState};
use super::reconstruct::JourneyReconstructor;
use super::request::{PlanError, PlanRequest, validate_window};
use super::results::{JourneyResultBuilder, ResultContext};
use super::scanner::{CalendarFilter, TripScanner};

/// Journeys leaving at or after one departure time.
pub struct DepartAfterQuery<'a, B: JourneyResultBuilder> {
    index: &'a ScheduleIndex,
    config: &'a SearchConfig,
    builder: B,
}

impl<'a, B: JourneyResultBuilder> DepartAfterQuery<'a, B> {
    pub fn new(index: &'a ScheduleIndex, config: &'a SearchConfig, builder: B) -> Self {
        Self {
            index,
            config,
            builder,
        }
    }

    /// Plan from `request.origin` leaving at `departure`.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the excluded stops include the origin or destination.
    /// Stops the network does not know give an empty result.
    pub fn plan(&self, request: &PlanRequest, departure: Time) -> Result<Vec<B::Output>, PlanError> {
        request.validate()?;
        let Some((origin, destination)) = endpoints(self.index, request) else {
            return Ok(Vec::new());
        };

        let excluded = self.index.stop_flags(&request.excluded);
        let mut scanner = TripScanner::new(
            self.index,
            ServiceDay::new(request.date),
            CalendarFilter::from_enabled(self.config.filter_calendars),
        );
        let mut state = ScanState::new(ScanMode::Single, self.index.stop_count());
        let connections = RoundScanner::new(self.index).scan(
            &mut scanner,
            &mut state,
            &ScanRequest {
                origin,
                departure,
                excluded: &excluded,
                destination: None,
            },
        );

        let context = ResultContext::single(request.date, departure, self.config.max_legs);
        let results: Vec<_> = JourneyReconstructor::new(self.index)
            .journeys(&connections, origin, destination)
            .iter()
            .filter_map(|journey| self.builder.build(journey, &context))
            .collect();

        debug!(
            origin = %request.origin,
            destination = %request.destination,
            %departure,
            results = results.len(),
            "depart-after query complete"
        );
        Ok(results)
    }
}

/// Journeys leaving inside a window of departure times.
pub struct TimeRangeQuery<'a, B: JourneyResultBuilder> {
    index: &'a ScheduleIndex,
    config: &'a SearchConfig,
    builder: B,
}

impl<'a, B: JourneyResultBuilder> TimeRangeQuery<'a, B> {
    pub fn new(index: &'a ScheduleIndex, config: &'a SearchConfig, builder: B) -> Self {
        Self {
            index,
            config,
            builder,
        }
    }

    /// Plan every departure from `request.origin` in `[start, end)`.
    ///
    /// Results of each pass are collected latest pass first, then the whole
    /// list is reversed, so earlier departures come first.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the excluded stops include the origin or destination,
    /// or if `end` is before `start`.
    pub fn plan(
        &self,
        request: &PlanRequest,
        start: Time,
        end: Time,
    ) -> Result<Vec<B::Output>, PlanError> {
        request.validate()?;
        validate_window(start, end)?;
        let Some((origin, destination)) = endpoints(self.index, request) else {
            return Ok(Vec::new());
        };

        let excluded = self.index.stop_flags(&request.excluded);
        let mut scanner = TripScanner::new(
            self.index,
            ServiceDay::new(request.date),
            CalendarFilter::from_enabled(self.config.filter_calendars),
        );
        let mut state = ScanState::new(ScanMode::Range, self.index.stop_count());
        let rounds = RoundScanner::new(self.index);
        let reconstructor = JourneyReconstructor::new(self.index);
        let bound = self.config.destination_pruning.then_some(destination);

        let mut departures: Vec<Time> = Vec::new();
        for departure in self.index.departures_at(origin) {
            if departure.time < start || departure.time >= end {
                continue;
            }
            if departures.last() == Some(&departure.time) || !scanner.is_running(departure.service) {
                continue;
            }
            departures.push(departure.time);
        }

        let mut results = Vec::new();
        for &departure in &departures {
            let connections = rounds.scan(
                &mut scanner,
                &mut state,
                &ScanRequest {
                    origin,
                    departure,
                    excluded: &excluded,
                    destination: bound,
                },
            );
            let context = ResultContext::range_pass(request.date, departure, self.config.max_legs);
            results.extend(
                reconstructor
                    .journeys(&connections, origin, destination)
                    .iter()
                    .filter_map(|journey| self.builder.build(journey, &context)),
            );
        }
        results.reverse();

        debug!(
            origin = %request.origin,
            destination = %request.destination,
            %start,
            %end,
            passes = departures.len(),
            results = results.len(),
            "time-range query complete"
        );
        Ok(results)
    }
}

fn endpoints(index: &ScheduleIndex, request: &PlanRequest) -> Option<(StopIdx, StopIdx)> {
    let origin = index.stop_idx(request.origin.as_str());
    let destination = index.stop_idx(request.destination.as_str());
    if origin.is_none() || destination.is_none() {
        debug!(
            origin = %request.origin,
            destination = %request.destination,
            "stop not in network"
        );
    }
    Some((origin?, destination?))
}
