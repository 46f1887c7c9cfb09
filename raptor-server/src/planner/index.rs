//! Immutable network index.
//!
//! Built once from the schedule and shared read-only by every query. Stops
//! and routes get dense integer ids so per-query state can live in plain
//! vectors instead of keyed maps.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::info;

use crate::domain::{Calendar, ServiceId, StopId, Time, Transfer, Trip};
use crate::schedule::ScheduleError;

/// Dense index of a stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StopIdx(pub usize);

/// Dense index of a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RouteIdx(pub usize);

/// Trips sharing one stop sequence, ordered so that no trip departs or
/// arrives earlier than its predecessor at any position.
#[derive(Debug)]
pub struct Route {
    path: Vec<StopIdx>,
    positions: HashMap<StopIdx, usize>,
    trips: Vec<Arc<Trip>>,
    services: Vec<usize>,
}

impl Route {
    pub fn path(&self) -> &[StopIdx] {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.path.is_empty()
    }

    /// First position of `stop` on the path.
    pub fn position_of(&self, stop: StopIdx) -> Option<usize> {
        self.positions.get(&stop).copied()
    }

    pub fn trips(&self) -> &[Arc<Trip>] {
        &self.trips
    }

    /// Calendar index of the trip at `trip`.
    pub fn service_of(&self, trip: usize) -> usize {
        self.services[trip]
    }
}

/// A transfer with its endpoints and interchange times resolved.
#[derive(Debug, Clone)]
pub struct IndexedTransfer {
    pub origin: StopIdx,
    pub destination: StopIdx,
    pub transfer: Transfer,
    pub origin_interchange: u32,
    pub destination_interchange: u32,
}

impl IndexedTransfer {
    pub fn duration(&self) -> u32 {
        self.transfer.duration
    }
}

/// A departure from a stop, used to enumerate the passes of a range query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Departure {
    pub time: Time,
    /// Calendar index of the departing trip.
    pub service: usize,
}

/// Routes, stops, transfers, interchange and calendars of the network.
#[derive(Debug)]
pub struct ScheduleIndex {
    stops: Vec<StopId>,
    stop_lookup: HashMap<StopId, StopIdx>,
    routes: Vec<Route>,
    routes_at: Vec<Vec<RouteIdx>>,
    transfers: Vec<Vec<IndexedTransfer>>,
    interchange: Vec<u32>,
    calendars: Vec<Calendar>,
    departures: Vec<Vec<Departure>>,
}

impl ScheduleIndex {
    /// Build the index.
    ///
    /// # Errors
    ///
    /// Returns `Err` if a trip has no stop times or references a service
    /// that has no calendar.
    pub fn build(
        trips: Vec<Trip>,
        transfers: Vec<Transfer>,
        interchange: HashMap<StopId, u32>,
        mut calendars: Vec<Calendar>,
    ) -> Result<Self, ScheduleError> {
        calendars.sort_by(|a, b| a.service_id.cmp(&b.service_id));
        let service_lookup: HashMap<ServiceId, usize> = calendars
            .iter()
            .enumerate()
            .map(|(i, c)| (c.service_id.clone(), i))
            .collect();

        let mut builder = StopRegistry::default();
        let trip_count = trips.len();

        // Group trips by stop sequence, keeping first-seen order
        let mut groups: Vec<(Vec<StopIdx>, Vec<(Arc<Trip>, usize)>)> = Vec::new();
        let mut group_lookup: HashMap<Vec<StopIdx>, usize> = HashMap::new();

        for trip in trips {
            if trip.stop_times.is_empty() {
                return Err(ScheduleError::EmptyTrip(trip.id));
            }
            let service = *service_lookup.get(&trip.service_id).ok_or_else(|| {
                ScheduleError::UnknownService {
                    trip: trip.id.clone(),
                    service: trip.service_id.clone(),
                }
            })?;

            let path: Vec<StopIdx> = trip
                .stop_times
                .iter()
                .map(|st| builder.register(&st.stop))
                .collect();

            let group = *group_lookup.entry(path.clone()).or_insert_with(|| {
                groups.push((path, Vec::new()));
                groups.len() - 1
            });
            groups[group].1.push((Arc::new(trip), service));
        }

        let mut sorted_transfers = transfers;
        sorted_transfers.sort_by(|a, b| {
            (&a.origin, &a.destination, a.duration).cmp(&(&b.origin, &b.destination, b.duration))
        });
        let transfer_stops: Vec<(StopIdx, StopIdx)> = sorted_transfers
            .iter()
            .map(|t| (builder.register(&t.origin), builder.register(&t.destination)))
            .collect();

        let StopRegistry { stops, lookup } = builder;
        let stop_count = stops.len();

        let interchange: Vec<u32> = stops
            .iter()
            .map(|stop| interchange.get(stop).copied().unwrap_or(0))
            .collect();

        let mut indexed_transfers: Vec<Vec<IndexedTransfer>> = vec![Vec::new(); stop_count];
        for (transfer, (origin, destination)) in sorted_transfers.into_iter().zip(transfer_stops) {
            let origin_interchange = transfer
                .origin_interchange
                .unwrap_or(interchange[origin.0]);
            let destination_interchange = transfer
                .destination_interchange
                .unwrap_or(interchange[destination.0]);
            indexed_transfers[origin.0].push(IndexedTransfer {
                origin,
                destination,
                transfer,
                origin_interchange,
                destination_interchange,
            });
        }

        let mut routes = Vec::new();
        for (path, trips) in groups {
            routes.extend(partition_route(path, trips));
        }

        let mut routes_at: Vec<Vec<RouteIdx>> = vec![Vec::new(); stop_count];
        let mut departures: Vec<Vec<Departure>> = vec![Vec::new(); stop_count];
        for (r, route) in routes.iter().enumerate() {
            for (pos, &stop) in route.path.iter().enumerate() {
                let picks_up = route.trips.iter().any(|t| t.stop_times[pos].pick_up);
                if picks_up && routes_at[stop.0].last() != Some(&RouteIdx(r)) {
                    routes_at[stop.0].push(RouteIdx(r));
                }
            }
            for (trip, &service) in route.trips.iter().zip(&route.services) {
                let last = trip.stop_times.len() - 1;
                for (pos, st) in trip.stop_times.iter().enumerate().take(last) {
                    if st.pick_up {
                        departures[route.path[pos].0].push(Departure {
                            time: st.departure,
                            service,
                        });
                    }
                }
            }
        }
        for table in &mut departures {
            table.sort_by(|a, b| b.time.cmp(&a.time));
        }

        info!(
            stops = stop_count,
            routes = routes.len(),
            trips = trip_count,
            calendars = calendars.len(),
            "schedule index built"
        );

        Ok(Self {
            stops,
            stop_lookup: lookup,
            routes,
            routes_at,
            transfers: indexed_transfers,
            interchange,
            calendars,
            departures,
        })
    }

    pub fn stop_count(&self) -> usize {
        self.stops.len()
    }

    pub fn stop_idx(&self, stop: &str) -> Option<StopIdx> {
        self.stop_lookup.get(stop).copied()
    }

    pub fn stop_id(&self, stop: StopIdx) -> &StopId {
        &self.stops[stop.0]
    }

    pub fn stops(&self) -> &[StopId] {
        &self.stops
    }

    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    pub fn route(&self, route: RouteIdx) -> &Route {
        &self.routes[route.0]
    }

    /// Routes that pick up passengers at `stop`.
    pub fn routes_at(&self, stop: StopIdx) -> &[RouteIdx] {
        &self.routes_at[stop.0]
    }

    pub fn transfers_from(&self, stop: StopIdx) -> &[IndexedTransfer] {
        &self.transfers[stop.0]
    }

    /// Minimum change time at `stop` in seconds.
    pub fn interchange(&self, stop: StopIdx) -> u32 {
        self.interchange[stop.0]
    }

    pub fn calendar_count(&self) -> usize {
        self.calendars.len()
    }

    pub fn calendar(&self, service: usize) -> &Calendar {
        &self.calendars[service]
    }

    /// Departures from `stop`, latest first.
    pub fn departures_at(&self, stop: StopIdx) -> &[Departure] {
        &self.departures[stop.0]
    }

    /// Flags the given stops. Ids unknown to the index are ignored.
    pub fn stop_flags(&self, stops: &[StopId]) -> Vec<bool> {
        let mut flags = vec![false; self.stops.len()];
        for stop in stops {
            if let Some(idx) = self.stop_idx(stop.as_str()) {
                flags[idx.0] = true;
            }
        }
        flags
    }
}

#[derive(Default)]
struct StopRegistry {
    stops: Vec<StopId>,
    lookup: HashMap<StopId, StopIdx>,
}

impl StopRegistry {
    fn register(&mut self, stop: &StopId) -> StopIdx {
        if let Some(&idx) = self.lookup.get(stop) {
            return idx;
        }
        let idx = StopIdx(self.stops.len());
        self.stops.push(stop.clone());
        self.lookup.insert(stop.clone(), idx);
        idx
    }
}

/// Split trips sharing `path` into routes in which no trip overtakes the one
/// before it.
fn partition_route(path: Vec<StopIdx>, mut trips: Vec<(Arc<Trip>, usize)>) -> Vec<Route> {
    trips.sort_by(|(a, _), (b, _)| {
        let key = |t: &Trip| (t.stop_times[0].departure, t.stop_times[t.stop_times.len() - 1].arrival);
        key(a).cmp(&key(b)).then_with(|| a.id.cmp(&b.id))
    });

    let mut positions = HashMap::new();
    for (pos, &stop) in path.iter().enumerate() {
        positions.entry(stop).or_insert(pos);
    }

    let mut routes: Vec<Route> = Vec::new();
    for (trip, service) in trips {
        let slot = routes.iter_mut().find(|route| {
            route
                .trips
                .last()
                .is_some_and(|last| !trip.overtakes(last))
        });
        match slot {
            Some(route) => {
                route.trips.push(trip);
                route.services.push(service);
            }
            None => routes.push(Route {
                path: path.clone(),
                positions: positions.clone(),
                trips: vec![trip],
                services: vec![service],
            }),
        }
    }
    routes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{StopTime, TripId};
    use chrono::NaiveDate;

    fn trip(id: &str, calls: &[(&str, u32, u32)]) -> Trip {
        Trip {
            id: TripId::new(id),
            stop_times: calls
                .iter()
                .map(|(stop, arr, dep)| {
                    StopTime::new(*stop, Time::from_seconds(*arr), Time::from_seconds(*dep))
                })
                .collect(),
            service_id: ServiceId::new("1"),
            train_uid: None,
        }
    }

    fn calendars() -> Vec<Calendar> {
        let start = NaiveDate::from_ymd_opt(2018, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2099, 12, 31).unwrap();
        vec![Calendar::daily("1", start, end)]
    }

    fn build(trips: Vec<Trip>) -> ScheduleIndex {
        ScheduleIndex::build(trips, vec![], HashMap::new(), calendars()).unwrap()
    }

    #[test]
    fn groups_trips_by_stop_sequence() {
        let index = build(vec![
            trip("T1", &[("A", 1000, 1000), ("B", 1030, 1035), ("C", 1100, 1100)]),
            trip("T2", &[("A", 1100, 1100), ("B", 1130, 1135), ("C", 1200, 1200)]),
            trip("T3", &[("A", 1000, 1000), ("C", 1100, 1100)]),
        ]);

        assert_eq!(index.stop_count(), 3);
        assert_eq!(index.route_count(), 2);

        let a = index.stop_idx("A").unwrap();
        assert_eq!(index.routes_at(a).len(), 2);

        let route = index.route(index.routes_at(a)[0]);
        assert_eq!(route.trips().len(), 2);
        assert_eq!(route.position_of(index.stop_idx("C").unwrap()), Some(2));
    }

    #[test]
    fn sorts_trips_by_departure() {
        let index = build(vec![
            trip("late", &[("A", 1100, 1100), ("B", 1130, 1130)]),
            trip("early", &[("A", 1000, 1000), ("B", 1030, 1030)]),
        ]);

        let ids: Vec<_> = index
            .route(RouteIdx(0))
            .trips()
            .iter()
            .map(|t| t.id.as_str())
            .collect();
        assert_eq!(ids, vec!["early", "late"]);
    }

    #[test]
    fn overtaking_trips_get_separate_routes() {
        let index = build(vec![
            trip("slow", &[("A", 1000, 1000), ("B", 1030, 1030), ("C", 1200, 1200)]),
            trip("fast", &[("A", 1010, 1010), ("B", 1040, 1040), ("C", 1150, 1150)]),
        ]);

        assert_eq!(index.route_count(), 2);
        for r in 0..index.route_count() {
            assert_eq!(index.route(RouteIdx(r)).trips().len(), 1);
        }
    }

    #[test]
    fn routes_at_only_lists_pickup_stops() {
        let mut t = trip("T", &[("A", 1000, 1000), ("B", 1030, 1030), ("C", 1100, 1100)]);
        t.stop_times[1].pick_up = false;
        let index = build(vec![t]);

        assert!(index.routes_at(index.stop_idx("B").unwrap()).is_empty());
        assert_eq!(index.routes_at(index.stop_idx("A").unwrap()).len(), 1);
    }

    #[test]
    fn departures_are_latest_first_and_skip_final_stop() {
        let index = build(vec![
            trip("T1", &[("A", 1000, 1000), ("B", 1030, 1035)]),
            trip("T2", &[("A", 1100, 1100), ("B", 1130, 1135)]),
        ]);

        let times: Vec<_> = index
            .departures_at(index.stop_idx("A").unwrap())
            .iter()
            .map(|d| d.time.seconds())
            .collect();
        assert_eq!(times, vec![1100, 1000]);
        assert!(index.departures_at(index.stop_idx("B").unwrap()).is_empty());
    }

    #[test]
    fn resolves_transfers_and_interchange() {
        let mut override_transfer = Transfer::new("B", "D", 30);
        override_transfer.destination_interchange = Some(1);

        let index = ScheduleIndex::build(
            vec![trip("T", &[("A", 1000, 1000), ("B", 1030, 1030)])],
            vec![Transfer::new("B", "C", 60), override_transfer],
            HashMap::from([(StopId::new("B"), 5), (StopId::new("C"), 7), (StopId::new("D"), 9)]),
            calendars(),
        )
        .unwrap();

        assert_eq!(index.stop_count(), 4);
        let b = index.stop_idx("B").unwrap();
        assert_eq!(index.interchange(b), 5);
        assert_eq!(index.interchange(index.stop_idx("A").unwrap()), 0);

        let transfers = index.transfers_from(b);
        assert_eq!(transfers.len(), 2);
        assert_eq!(index.stop_id(transfers[0].destination).as_str(), "C");
        assert_eq!(transfers[0].origin_interchange, 5);
        assert_eq!(transfers[0].destination_interchange, 7);
        assert_eq!(transfers[1].destination_interchange, 1);
    }

    #[test]
    fn rejects_trip_without_stop_times() {
        let result = ScheduleIndex::build(vec![trip("empty", &[])], vec![], HashMap::new(), calendars());
        assert!(matches!(result, Err(ScheduleError::EmptyTrip(id)) if id.as_str() == "empty"));
    }

    #[test]
    fn stop_flags_ignore_unknown_stops() {
        let index = build(vec![trip("T", &[("A", 1000, 1000), ("B", 1030, 1030)])]);
        let flags = index.stop_flags(&[StopId::new("B"), StopId::new("Z")]);

        assert_eq!(flags.len(), 2);
        assert!(flags[index.stop_idx("B").unwrap().0]);
        assert!(!flags[index.stop_idx("A").unwrap().0]);
    }
}
