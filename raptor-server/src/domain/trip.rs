//! Trips, stop times and transfers.

use serde::{Deserialize, Serialize};

use super::{ServiceId, StopId, Time, TripId};

/// One call of a trip at a stop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopTime {
    pub stop: StopId,
    pub arrival: Time,
    pub departure: Time,

    /// Passengers may board here.
    pub pick_up: bool,

    /// Passengers may alight here.
    pub drop_off: bool,
}

impl StopTime {
    /// A call where passengers may both board and alight.
    pub fn new(stop: impl Into<StopId>, arrival: Time, departure: Time) -> Self {
        Self {
            stop: stop.into(),
            arrival,
            departure,
            pick_up: true,
            drop_off: true,
        }
    }
}

/// One scheduled vehicle run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trip {
    pub id: TripId,
    pub stop_times: Vec<StopTime>,
    pub service_id: ServiceId,

    /// External train identifier. Joined trains carry several parts
    /// separated by `_`.
    #[serde(default)]
    pub train_uid: Option<String>,
}

impl Trip {
    /// The ordered stop sequence, which identifies the trip's route.
    pub fn path(&self) -> Vec<StopId> {
        self.stop_times.iter().map(|st| st.stop.clone()).collect()
    }

    /// Whether `self` ever departs or arrives earlier than `other` at a
    /// shared position. Both trips must have the same stop sequence.
    pub fn overtakes(&self, other: &Trip) -> bool {
        self.stop_times
            .iter()
            .zip(&other.stop_times)
            .any(|(a, b)| a.departure < b.departure || a.arrival < b.arrival)
    }

    /// First and last parts of the train UID, if the trip has one.
    pub fn endpoint_train_uids(&self) -> Option<(&str, &str)> {
        self.train_uid.as_deref().map(split_train_uid)
    }
}

/// First and last `_`-separated parts of a train UID.
///
/// # Examples
///
/// ```
/// use raptor_server::domain::split_train_uid;
///
/// assert_eq!(split_train_uid("C10001_C10002"), ("C10001", "C10002"));
/// assert_eq!(split_train_uid("C10001"), ("C10001", "C10001"));
/// ```
pub fn split_train_uid(uid: &str) -> (&str, &str) {
    let first = uid.split('_').next().unwrap_or(uid);
    let last = uid.rsplit('_').next().unwrap_or(uid);
    (first, last)
}

/// Time-of-day window during which a transfer can be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: Time,
    pub end: Time,
}

impl TimeWindow {
    pub fn contains(&self, time: Time) -> bool {
        self.start <= time && time <= self.end
    }
}

/// A fixed-duration foot connection between two stops.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub origin: StopId,
    pub destination: StopId,

    /// Walking time in seconds.
    pub duration: u32,

    /// Arrivals outside this window cannot use the transfer.
    #[serde(default)]
    pub window: Option<TimeWindow>,

    /// Replaces the origin stop's interchange time for this transfer.
    #[serde(default)]
    pub origin_interchange: Option<u32>,

    /// Replaces the destination stop's interchange time for this transfer.
    #[serde(default)]
    pub destination_interchange: Option<u32>,
}

impl Transfer {
    /// An always-available transfer without interchange overrides.
    pub fn new(origin: impl Into<StopId>, destination: impl Into<StopId>, duration: u32) -> Self {
        Self {
            origin: origin.into(),
            destination: destination.into(),
            duration,
            window: None,
            origin_interchange: None,
            destination_interchange: None,
        }
    }

    /// Whether an arrival at `time` falls inside the validity window.
    pub fn is_available(&self, time: Time) -> bool {
        self.window.is_none_or(|w| w.contains(time))
    }
}
