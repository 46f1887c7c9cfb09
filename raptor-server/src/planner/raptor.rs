//! Round-based scan.
//!
//! Round `k` finds the best arrival at every stop using at most `k` legs.
//! Each round scans the routes serving stops improved in the previous round,
//! then the transfers leaving them. A stop's arrival in a round is recorded,
//! together with the connection that produced it, only when it strictly
//! improves on what is already known. Keeping one connection per stop and
//! round is what leaves the Pareto set over arrival time and leg count
//! behind for reconstruction.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use crate::domain::{Time, Trip};

use super::index::{IndexedTransfer, RouteIdx, ScheduleIndex, StopIdx};
use super::queue::RouteQueueBuilder;
use super::scanner::TripScanner;

/// How arrivals are shared between the passes run on one state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanMode {
    /// Each pass starts its round tables empty; only the overall best
    /// arrival per stop carries over.
    Single,
    /// Round tables persist across passes and round `k` never exceeds round
    /// `k - 1`, so a pass only records what beats every later departure.
    Range,
}

/// Arrival tables owned by one query.
#[derive(Debug, Clone)]
pub struct ScanState {
    mode: ScanMode,
    best: Vec<Time>,
    rounds: Vec<Vec<Time>>,
    touched: Vec<Vec<StopIdx>>,
    changed: Vec<bool>,
}

impl ScanState {
    pub fn new(mode: ScanMode, stop_count: usize) -> Self {
        Self {
            mode,
            best: vec![Time::UNREACHABLE; stop_count],
            rounds: vec![vec![Time::UNREACHABLE; stop_count]],
            touched: vec![Vec::new()],
            changed: vec![false; stop_count],
        }
    }

    pub fn mode(&self) -> ScanMode {
        self.mode
    }

    /// Best arrival at `stop` over every round and pass so far.
    pub fn best(&self, stop: StopIdx) -> Time {
        self.best[stop.0]
    }

    /// Arrival at `stop` in `round`, or unreachable.
    pub fn arrival(&self, round: usize, stop: StopIdx) -> Time {
        self.rounds
            .get(round)
            .map_or(Time::UNREACHABLE, |r| r[stop.0])
    }

    fn begin_pass(&mut self, origin: StopIdx, departure: Time) {
        match self.mode {
            ScanMode::Single => {
                for (round, touched) in self.rounds.iter_mut().zip(&mut self.touched) {
                    for stop in touched.drain(..) {
                        round[stop.0] = Time::UNREACHABLE;
                    }
                }
            }
            ScanMode::Range => {
                for stop in self.touched[0].drain(..) {
                    self.changed[stop.0] = false;
                }
            }
        }
        self.rounds[0][origin.0] = departure;
        self.best[origin.0] = departure;
        self.touch(0, origin);
    }

    fn begin_round(&mut self, round: usize) {
        if self.rounds.len() <= round {
            let next = match self.mode {
                ScanMode::Single => vec![Time::UNREACHABLE; self.best.len()],
                ScanMode::Range => self.rounds[round - 1].clone(),
            };
            self.rounds.push(next);
            self.touched.push(Vec::new());
            return;
        }
        if self.mode == ScanMode::Range {
            self.propagate(round);
        }
    }

    /// Carry this pass's changes into rounds the pass did not reach.
    fn end_pass(&mut self, last_round: usize) {
        if self.mode != ScanMode::Range {
            return;
        }
        for round in (last_round + 1)..self.rounds.len() {
            self.propagate(round);
        }
    }

    /// Lower `round` to `round - 1` for the stops changed this pass. Other
    /// stops already satisfy the bound from earlier passes.
    fn propagate(&mut self, round: usize) {
        let (done, rest) = self.rounds.split_at_mut(round);
        let previous = &done[round - 1];
        let current = &mut rest[0];
        for stop in &self.touched[0] {
            if previous[stop.0] < current[stop.0] {
                current[stop.0] = previous[stop.0];
            }
        }
    }

    /// Arrival at `stop` a leg of `round` must beat.
    fn bound(&self, round: usize, stop: StopIdx, destination: Option<StopIdx>) -> Time {
        match self.mode {
            ScanMode::Single => self.best[stop.0],
            ScanMode::Range => {
                let own = self.rounds[round][stop.0];
                destination.map_or(own, |d| own.min(self.rounds[round][d.0]))
            }
        }
    }

    fn improve(&mut self, round: usize, stop: StopIdx, time: Time) {
        self.rounds[round][stop.0] = time;
        if time < self.best[stop.0] {
            self.best[stop.0] = time;
        }
        self.touch(round, stop);
    }

    fn touch(&mut self, round: usize, stop: StopIdx) {
        match self.mode {
            ScanMode::Single => self.touched[round].push(stop),
            // Range mode tracks one pass-wide set in slot 0
            ScanMode::Range => {
                if !self.changed[stop.0] {
                    self.changed[stop.0] = true;
                    self.touched[0].push(stop);
                }
            }
        }
    }
}

/// What produced a stop's arrival in a round.
#[derive(Debug, Clone, Copy)]
pub enum Connection<'a> {
    Trip {
        route: RouteIdx,
        trip: &'a Arc<Trip>,
        board: usize,
        alight: usize,
    },
    Transfer(&'a IndexedTransfer),
}

/// Per stop, per round, the connection behind that round's arrival.
#[derive(Debug, Clone)]
pub struct ConnectionIndex<'a> {
    by_stop: Vec<BTreeMap<usize, Connection<'a>>>,
}

impl<'a> ConnectionIndex<'a> {
    pub fn new(stop_count: usize) -> Self {
        Self {
            by_stop: vec![BTreeMap::new(); stop_count],
        }
    }

    fn set(&mut self, stop: StopIdx, round: usize, connection: Connection<'a>) {
        self.by_stop[stop.0].insert(round, connection);
    }

    pub fn get(&self, stop: StopIdx, round: usize) -> Option<&Connection<'a>> {
        self.by_stop[stop.0].get(&round)
    }

    /// Rounds holding a connection at `stop`, ascending.
    pub fn rounds_at(&self, stop: StopIdx) -> impl Iterator<Item = usize> + '_ {
        self.by_stop[stop.0].keys().copied()
    }

    /// The connection at `stop` in the latest round not after `round`.
    pub fn latest_at_or_before(&self, stop: StopIdx, round: usize) -> Option<(usize, Connection<'a>)> {
        self.by_stop[stop.0]
            .range(..=round)
            .next_back()
            .map(|(&r, &c)| (r, c))
    }

    /// Stops with at least one connection.
    pub fn reached(&self) -> impl Iterator<Item = StopIdx> + '_ {
        self.by_stop
            .iter()
            .enumerate()
            .filter(|(_, rounds)| !rounds.is_empty())
            .map(|(i, _)| StopIdx(i))
    }
}

/// One scan from an origin at a departure time.
#[derive(Debug, Clone)]
pub struct ScanRequest<'r> {
    pub origin: StopIdx,
    pub departure: Time,
    /// Flags per stop; flagged stops are never used.
    pub excluded: &'r [bool],
    /// Caps improvements at the destination's arrival in range mode.
    pub destination: Option<StopIdx>,
}

/// Runs rounds until no stop improves.
pub struct RoundScanner<'a> {
    index: &'a ScheduleIndex,
    queue: RouteQueueBuilder<'a>,
}

impl<'a> RoundScanner<'a> {
    pub fn new(index: &'a ScheduleIndex) -> Self {
        Self {
            index,
            queue: RouteQueueBuilder::new(index),
        }
    }

    /// Run one pass on `state` and return its connections.
    pub fn scan(
        &self,
        scanner: &mut TripScanner<'a>,
        state: &mut ScanState,
        request: &ScanRequest<'_>,
    ) -> ConnectionIndex<'a> {
        let stop_count = self.index.stop_count();
        let mut connections = ConnectionIndex::new(stop_count);
        let mut is_marked = vec![false; stop_count];

        state.begin_pass(request.origin, request.departure);

        let mut marked = vec![request.origin];
        let mut round = 1;
        while !marked.is_empty() {
            state.begin_round(round);
            let mut improved = Vec::new();

            for (route, start) in self.queue.build(&marked) {
                self.scan_route(
                    scanner,
                    state,
                    &mut connections,
                    request,
                    round,
                    route,
                    start,
                    &mut improved,
                );
            }

            for &stop in &marked {
                self.scan_transfers(state, &mut connections, request, round, stop, &mut improved);
            }

            marked.clear();
            for stop in improved {
                if !is_marked[stop.0] {
                    is_marked[stop.0] = true;
                    marked.push(stop);
                }
            }
            for stop in &marked {
                is_marked[stop.0] = false;
            }
            round += 1;
        }
        state.end_pass(round - 1);

        debug!(
            origin = %self.index.stop_id(request.origin),
            departure = %request.departure,
            rounds = round - 1,
            "scan complete"
        );

        connections
    }

    #[allow(clippy::too_many_arguments)]
    fn scan_route(
        &self,
        scanner: &mut TripScanner<'a>,
        state: &mut ScanState,
        connections: &mut ConnectionIndex<'a>,
        request: &ScanRequest<'_>,
        round: usize,
        route_idx: RouteIdx,
        start: usize,
        improved: &mut Vec<StopIdx>,
    ) {
        let route = self.index.route(route_idx);
        let trips = route.trips();
        let mut held: Option<(usize, usize)> = None;

        for position in start..route.len() {
            let stop = route.path()[position];
            if request.excluded[stop.0] {
                break;
            }
            let interchange = self.index.interchange(stop);

            if let Some((trip, board)) = held {
                let stop_time = &trips[trip].stop_times[position];
                let arrival = stop_time.arrival + interchange;
                if stop_time.drop_off
                    && trips[trip].stop_times[board].pick_up
                    && arrival < state.bound(round, stop, request.destination)
                {
                    state.improve(round, stop, arrival);
                    connections.set(
                        stop,
                        round,
                        Connection::Trip {
                            route: route_idx,
                            trip: &trips[trip],
                            board,
                            alight: position,
                        },
                    );
                    improved.push(stop);
                    continue;
                }
            }

            let previous = state.arrival(round - 1, stop);
            if !previous.is_reachable() {
                continue;
            }
            let can_reboard = held
                .is_none_or(|(trip, _)| previous < trips[trip].stop_times[position].arrival + interchange);
            if !can_reboard {
                continue;
            }
            if let Some(found) = scanner.get_trip(route_idx, position, previous) {
                // An earlier trip is strictly no worse downstream
                if held.is_none_or(|(trip, _)| found < trip) {
                    held = Some((found, position));
                }
            }
        }
    }

    fn scan_transfers(
        &self,
        state: &mut ScanState,
        connections: &mut ConnectionIndex<'a>,
        request: &ScanRequest<'_>,
        round: usize,
        stop: StopIdx,
        improved: &mut Vec<StopIdx>,
    ) {
        let previous = state.arrival(round - 1, stop);
        if !previous.is_reachable() {
            return;
        }

        for transfer in self.index.transfers_from(stop) {
            let destination = transfer.destination;
            if request.excluded[destination.0] {
                continue;
            }
            let arrival = previous + transfer.duration() + transfer.destination_interchange;
            if transfer.transfer.is_available(arrival)
                && arrival < state.bound(round, destination, request.destination)
            {
                state.improve(round, destination, arrival);
                connections.set(destination, round, Connection::Transfer(transfer));
                improved.push(destination);
            }
        }
    }
}
