//! Journey types.
//!
//! A `Journey` is the ordered list of legs the planner found from an origin
//! to a destination. Legs are either a ride on a timetabled trip or a
//! fixed-duration transfer between two stops.

use std::sync::Arc;

use super::{DomainError, StopId, StopTime, Time, Trip};

/// A ride on one trip from a boarding position to an alighting position.
///
/// Uses `Arc<Trip>` so connection records and legs share trips without
/// copying stop times.
///
/// # Invariants
///
/// - `board < alight`
/// - `alight` is a valid position in the trip's stop times
#[derive(Debug, Clone)]
pub struct TimetableLeg {
    trip: Arc<Trip>,
    board: usize,
    alight: usize,
}

impl TimetableLeg {
    /// Construct a leg, validating the positions against the trip.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::sync::Arc;
    /// use raptor_server::domain::{ServiceId, StopTime, Time, TimetableLeg, Trip, TripId};
    ///
    /// let trip = Arc::new(Trip {
    ///     id: TripId::new("T1"),
    ///     stop_times: vec![
    ///         StopTime::new("A", Time::from_seconds(1000), Time::from_seconds(1000)),
    ///         StopTime::new("B", Time::from_seconds(1030), Time::from_seconds(1035)),
    ///         StopTime::new("C", Time::from_seconds(1100), Time::from_seconds(1100)),
    ///     ],
    ///     service_id: ServiceId::new("1"),
    ///     train_uid: None,
    /// });
    ///
    /// let leg = TimetableLeg::new(trip, 1, 2).unwrap();
    /// assert_eq!(leg.origin().as_str(), "B");
    /// assert_eq!(leg.departure_time(), Time::from_seconds(1035));
    /// assert_eq!(leg.arrival_time(), Time::from_seconds(1100));
    /// ```
    pub fn new(trip: Arc<Trip>, board: usize, alight: usize) -> Result<Self, DomainError> {
        if alight <= board {
            return Err(DomainError::InvalidLeg(
                "alight position must be after board position",
            ));
        }
        if alight >= trip.stop_times.len() {
            return Err(DomainError::InvalidStopPosition);
        }
        Ok(Self {
            trip,
            board,
            alight,
        })
    }

    pub fn trip(&self) -> &Arc<Trip> {
        &self.trip
    }

    pub fn board(&self) -> usize {
        self.board
    }

    pub fn alight(&self) -> usize {
        self.alight
    }

    /// Stop times from boarding to alighting, inclusive.
    pub fn stop_times(&self) -> &[StopTime] {
        &self.trip.stop_times[self.board..=self.alight]
    }

    pub fn origin(&self) -> &StopId {
        &self.trip.stop_times[self.board].stop
    }

    pub fn destination(&self) -> &StopId {
        &self.trip.stop_times[self.alight].stop
    }

    pub fn departure_time(&self) -> Time {
        self.trip.stop_times[self.board].departure
    }

    pub fn arrival_time(&self) -> Time {
        self.trip.stop_times[self.alight].arrival
    }
}

impl PartialEq for TimetableLeg {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.trip, &other.trip)
            && self.board == other.board
            && self.alight == other.alight
    }
}

impl Eq for TimetableLeg {}

/// A transfer as used in a journey, with interchange times resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferLeg {
    pub origin: StopId,
    pub destination: StopId,
    /// Walking time in seconds.
    pub duration: u32,
    pub origin_interchange: u32,
    pub destination_interchange: u32,
}

/// A segment of a journey.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Leg {
    Timetable(TimetableLeg),
    Transfer(TransferLeg),
}

impl Leg {
    pub fn origin(&self) -> &StopId {
        match self {
            Leg::Timetable(leg) => leg.origin(),
            Leg::Transfer(leg) => &leg.origin,
        }
    }

    pub fn destination(&self) -> &StopId {
        match self {
            Leg::Timetable(leg) => leg.destination(),
            Leg::Transfer(leg) => &leg.destination,
        }
    }

    pub fn is_transfer(&self) -> bool {
        matches!(self, Leg::Transfer(_))
    }

    pub fn as_timetable(&self) -> Option<&TimetableLeg> {
        match self {
            Leg::Timetable(leg) => Some(leg),
            Leg::Transfer(_) => None,
        }
    }
}

/// A complete journey from origin to destination.
///
/// # Invariants
///
/// - At least one leg
/// - Consecutive legs connect (destination of one = origin of next)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Journey {
    legs: Vec<Leg>,
}

impl Journey {
    /// Constructs a journey, checking the legs connect.
    pub fn new(legs: Vec<Leg>) -> Result<Self, DomainError> {
        if legs.is_empty() {
            return Err(DomainError::EmptyJourney);
        }

        for window in legs.windows(2) {
            let prev_dest = window[0].destination();
            let next_origin = window[1].origin();
            if prev_dest != next_origin {
                return Err(DomainError::DisconnectedLegs(
                    prev_dest.clone(),
                    next_origin.clone(),
                ));
            }
        }

        Ok(Self { legs })
    }

    pub fn legs(&self) -> &[Leg] {
        &self.legs
    }

    /// Number of legs, transfers included. In a single-departure scan this
    /// equals the round that found the journey.
    pub fn leg_count(&self) -> usize {
        self.legs.len()
    }

    pub fn origin(&self) -> &StopId {
        // Safe: at least one leg is validated at construction
        self.legs[0].origin()
    }

    pub fn destination(&self) -> &StopId {
        self.legs[self.legs.len() - 1].destination()
    }

    /// Timetabled legs only, in order.
    pub fn timetable_legs(&self) -> impl Iterator<Item = &TimetableLeg> {
        self.legs.iter().filter_map(Leg::as_timetable)
    }

    /// Departure of the first timetabled leg, if there is one.
    pub fn first_departure(&self) -> Option<Time> {
        self.timetable_legs().next().map(TimetableLeg::departure_time)
    }

    /// Time the journey reaches its destination when leaving the origin at
    /// `departure`.
    ///
    /// A transfer following a trip starts once the origin interchange has
    /// elapsed; a leading transfer starts at `departure`.
    pub fn arrival_time(&self, departure: Time) -> Time {
        let mut time = departure;
        let mut after_trip = false;
        for leg in &self.legs {
            match leg {
                Leg::Timetable(leg) => {
                    time = leg.arrival_time();
                    after_trip = true;
                }
                Leg::Transfer(leg) => {
                    if after_trip {
                        time = time + leg.origin_interchange;
                    }
                    time = time + leg.duration;
                    after_trip = false;
                }
            }
        }
        time
    }
}
