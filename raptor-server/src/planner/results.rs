//! Turning reconstructed journeys into caller-facing results.
//!
//! The planner hands every journey it reconstructs to a
//! [`JourneyResultBuilder`], which decides whether to keep it and what shape
//! to give it. Builders are chosen by the caller: the core never depends on
//! a particular output format.

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::domain::{Journey, Leg, ServiceId, StopId, StopTime, Time, TimetableLeg, TripId, split_train_uid};

/// What a builder knows about the scan that produced a journey.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResultContext {
    /// Service date times are relative to.
    pub date: NaiveDate,

    /// Departure time of the scan.
    pub departure: Time,

    /// Whether the scan was one pass of a range query. Such passes also
    /// find journeys leaving later, which belong to a later pass.
    pub range_pass: bool,

    /// Longest journey, in legs, to keep.
    pub max_legs: usize,
}

impl ResultContext {
    /// Context for a single-departure scan.
    pub fn single(date: NaiveDate, departure: Time, max_legs: usize) -> Self {
        Self {
            date,
            departure,
            range_pass: false,
            max_legs,
        }
    }

    /// Context for one pass of a range query.
    pub fn range_pass(date: NaiveDate, departure: Time, max_legs: usize) -> Self {
        Self {
            date,
            departure,
            range_pass: true,
            max_legs,
        }
    }

    /// Whether a formatted result should be produced for `journey`.
    ///
    /// Drops journeys with too many legs, and in range passes those whose
    /// first leg is a trip departing after the pass's departure time. A
    /// leading transfer counts as leaving at the pass's departure time.
    pub fn accepts(&self, journey: &Journey) -> bool {
        if journey.leg_count() > self.max_legs {
            return false;
        }
        if !self.range_pass {
            return true;
        }
        match &journey.legs()[0] {
            Leg::Timetable(leg) => leg.departure_time() <= self.departure,
            Leg::Transfer(_) => true,
        }
    }
}

/// Formats journeys for a caller.
pub trait JourneyResultBuilder {
    type Output;

    /// Format `journey`, or `None` to leave it out of the results.
    fn build(&self, journey: &Journey, context: &ResultContext) -> Option<Self::Output>;
}

/// Journeys exactly as reconstructed.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainJourneys;

impl JourneyResultBuilder for PlainJourneys {
    type Output = Journey;

    fn build(&self, journey: &Journey, _context: &ResultContext) -> Option<Journey> {
        Some(journey.clone())
    }
}

/// Full trip detail with absolute timestamps.
#[derive(Debug, Clone, Copy, Default)]
pub struct DetailedJourneys;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailedJourney {
    pub origin: StopId,
    pub destination: StopId,
    pub legs: Vec<DetailedLeg>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum DetailedLeg {
    #[serde(rename = "RAIL_LEG")]
    Rail(RailLeg),
    #[serde(rename = "FIXED_LEG")]
    Fixed(FixedLeg),
}

/// A timetabled leg, carrying the whole trip and the positions ridden.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RailLeg {
    pub origin: StopId,
    pub destination: StopId,
    pub departure_time: NaiveDateTime,
    pub arrival_time: NaiveDateTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin_train_uid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_train_uid: Option<String>,
    pub train_trip: TrainTrip,
    pub start_index: usize,
    pub end_index: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainTrip {
    pub trip_id: TripId,
    pub stop_times: Vec<StopDateTime>,
    pub service_id: ServiceId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub train_uid: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StopDateTime {
    pub stop: StopId,
    pub arrival_time: NaiveDateTime,
    pub departure_time: NaiveDateTime,
    pub pick_up: bool,
    pub drop_off: bool,
}

impl StopDateTime {
    fn new(stop_time: &StopTime, date: NaiveDate) -> Self {
        Self {
            stop: stop_time.stop.clone(),
            arrival_time: stop_time.arrival.on(date),
            departure_time: stop_time.departure.on(date),
            pick_up: stop_time.pick_up,
            drop_off: stop_time.drop_off,
        }
    }
}

/// A transfer with its interchange times.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FixedLeg {
    pub origin: StopId,
    pub destination: StopId,
    pub duration_seconds: u32,
    pub origin_interchange: u32,
    pub destination_interchange: u32,
}

impl RailLeg {
    fn new(leg: &TimetableLeg, date: NaiveDate) -> Self {
        let trip = leg.trip();
        let uids = trip.endpoint_train_uids();
        Self {
            origin: leg.origin().clone(),
            destination: leg.destination().clone(),
            departure_time: leg.departure_time().on(date),
            arrival_time: leg.arrival_time().on(date),
            origin_train_uid: uids.map(|(first, _)| first.to_string()),
            destination_train_uid: uids.map(|(_, last)| last.to_string()),
            train_trip: TrainTrip {
                trip_id: trip.id.clone(),
                stop_times: trip
                    .stop_times
                    .iter()
                    .map(|st| StopDateTime::new(st, date))
                    .collect(),
                service_id: trip.service_id.clone(),
                train_uid: trip.train_uid.clone(),
            },
            start_index: leg.board(),
            end_index: leg.alight(),
        }
    }
}

impl JourneyResultBuilder for DetailedJourneys {
    type Output = DetailedJourney;

    fn build(&self, journey: &Journey, context: &ResultContext) -> Option<DetailedJourney> {
        if !context.accepts(journey) {
            return None;
        }
        let legs = journey
            .legs()
            .iter()
            .map(|leg| match leg {
                Leg::Timetable(leg) => DetailedLeg::Rail(RailLeg::new(leg, context.date)),
                Leg::Transfer(leg) => DetailedLeg::Fixed(FixedLeg {
                    origin: leg.origin.clone(),
                    destination: leg.destination.clone(),
                    duration_seconds: leg.duration,
                    origin_interchange: leg.origin_interchange,
                    destination_interchange: leg.destination_interchange,
                }),
            })
            .collect();

        Some(DetailedJourney {
            origin: journey.origin().clone(),
            destination: journey.destination().clone(),
            legs,
        })
    }
}

/// One departure and arrival per leg, for timetable listings.
#[derive(Debug, Clone, Copy, Default)]
pub struct SummaryJourneys;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryJourney {
    pub legs: Vec<SummaryLeg>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryLeg {
    pub origin: StopId,
    pub destination: StopId,
    pub departure_time: NaiveDateTime,
    pub arrival_time: NaiveDateTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin_train_uid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_train_uid: Option<String>,
}

impl JourneyResultBuilder for SummaryJourneys {
    type Output = SummaryJourney;

    fn build(&self, journey: &Journey, context: &ResultContext) -> Option<SummaryJourney> {
        if !context.accepts(journey) {
            return None;
        }

        let mut legs = Vec::with_capacity(journey.leg_count());
        let mut time = context.departure;
        let mut after_trip = false;
        for leg in journey.legs() {
            let summary = match leg {
                Leg::Timetable(leg) => {
                    let (origin_uid, destination_uid) = leg
                        .trip()
                        .train_uid
                        .as_deref()
                        .map(split_train_uid)
                        .map_or((None, None), |(first, last)| {
                            (Some(first.to_string()), Some(last.to_string()))
                        });
                    time = leg.arrival_time();
                    after_trip = true;
                    SummaryLeg {
                        origin: leg.origin().clone(),
                        destination: leg.destination().clone(),
                        departure_time: leg.departure_time().on(context.date),
                        arrival_time: time.on(context.date),
                        origin_train_uid: origin_uid,
                        destination_train_uid: destination_uid,
                    }
                }
                Leg::Transfer(leg) => {
                    let departure = if after_trip {
                        time + leg.origin_interchange
                    } else {
                        time
                    };
                    time = departure + leg.duration;
                    after_trip = false;
                    SummaryLeg {
                        origin: leg.origin.clone(),
                        destination: leg.destination.clone(),
                        departure_time: departure.on(context.date),
                        arrival_time: time.on(context.date),
                        origin_train_uid: None,
                        destination_train_uid: None,
                    }
                }
            };
            legs.push(summary);
        }

        Some(SummaryJourney { legs })
    }
}
