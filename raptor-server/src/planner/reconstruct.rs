//! Backtracking connection records into journeys.

use tracing::debug;

use crate::domain::{Journey, Leg, TimetableLeg, TransferLeg};

use super::index::{ScheduleIndex, StopIdx};
use super::raptor::{Connection, ConnectionIndex};

/// Turns a scan's connection index into journeys.
pub struct JourneyReconstructor<'a> {
    index: &'a ScheduleIndex,
}

impl<'a> JourneyReconstructor<'a> {
    pub fn new(index: &'a ScheduleIndex) -> Self {
        Self { index }
    }

    /// One journey per round holding a connection at `destination`, fewest
    /// legs first.
    pub fn journeys(
        &self,
        connections: &ConnectionIndex<'_>,
        origin: StopIdx,
        destination: StopIdx,
    ) -> Vec<Journey> {
        if origin == destination {
            return Vec::new();
        }
        connections
            .rounds_at(destination)
            .filter_map(|round| self.journey(connections, origin, destination, round))
            .collect()
    }

    /// The journey reaching `destination` in `round`.
    ///
    /// Walks back from the destination. Where a stop has no connection in the
    /// expected round its arrival was carried over from an earlier round, so
    /// the latest earlier one is used. Returns `None` when the chain does not
    /// lead back to `origin`, which happens when a range pass builds on an
    /// arrival found by another pass.
    pub fn journey(
        &self,
        connections: &ConnectionIndex<'_>,
        origin: StopIdx,
        destination: StopIdx,
        round: usize,
    ) -> Option<Journey> {
        let mut legs = Vec::new();
        let mut stop = destination;
        let mut round = round;

        while stop != origin {
            let Some((found, connection)) = connections.latest_at_or_before(stop, round) else {
                debug!(
                    stop = %self.index.stop_id(stop),
                    round,
                    "connection chain does not reach origin"
                );
                return None;
            };

            let (leg, from) = match connection {
                Connection::Trip {
                    route,
                    trip,
                    board,
                    alight,
                } => {
                    let leg = TimetableLeg::new(trip.clone(), board, alight).ok()?;
                    (Leg::Timetable(leg), self.index.route(route).path()[board])
                }
                Connection::Transfer(transfer) => {
                    let leg = TransferLeg {
                        origin: self.index.stop_id(transfer.origin).clone(),
                        destination: self.index.stop_id(transfer.destination).clone(),
                        duration: transfer.duration(),
                        origin_interchange: transfer.origin_interchange,
                        destination_interchange: transfer.destination_interchange,
                    };
                    (Leg::Transfer(leg), transfer.origin)
                }
            };

            legs.push(leg);
            stop = from;
            round = found - 1;
        }

        legs.reverse();
        Journey::new(legs).ok()
    }
}
