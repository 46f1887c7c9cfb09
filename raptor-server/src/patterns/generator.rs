//! Full-day scans from one origin.

use chrono::NaiveDate;
use tracing::debug;

use crate::domain::{ServiceDay, Time};
use crate::planner::{
    CalendarFilter, ConnectionIndex, RoundScanner, ScanMode, ScanRequest, ScanState,
    ScheduleIndex, StopIdx, TripScanner,
};

/// Accumulates the connection indexes of one origin's scans.
pub trait TransferPatternResults {
    type Output;

    /// Take in the connections of one scan.
    fn add(&mut self, connections: &ConnectionIndex<'_>);

    /// Produce the result once every scan has been added.
    fn finalize(self) -> Self::Output;
}

/// Runs one single-departure scan per departure from an origin over a
/// whole service day.
///
/// All scans of one origin share a trip scanner and a best-arrival table,
/// so each scan only records what beats every later departure.
pub struct TransferPatternGenerator<'a> {
    index: &'a ScheduleIndex,
    filter: CalendarFilter,
}

impl<'a> TransferPatternGenerator<'a> {
    pub fn new(index: &'a ScheduleIndex, filter: CalendarFilter) -> Self {
        Self { index, filter }
    }

    /// Scan every departure from `origin` on `date`, latest first, feeding
    /// each scan to `results`.
    pub fn create<R: TransferPatternResults>(
        &self,
        origin: StopIdx,
        date: NaiveDate,
        mut results: R,
    ) -> R::Output {
        let mut scanner = TripScanner::new(self.index, ServiceDay::new(date), self.filter);
        let mut state = ScanState::new(ScanMode::Single, self.index.stop_count());
        let rounds = RoundScanner::new(self.index);
        let excluded = vec![false; self.index.stop_count()];

        let mut previous: Option<Time> = None;
        let mut scans = 0;
        for departure in self.index.departures_at(origin) {
            if previous == Some(departure.time) || !scanner.is_running(departure.service) {
                continue;
            }
            previous = Some(departure.time);

            let connections = rounds.scan(
                &mut scanner,
                &mut state,
                &ScanRequest {
                    origin,
                    departure: departure.time,
                    excluded: &excluded,
                    destination: None,
                },
            );
            results.add(&connections);
            scans += 1;
        }

        debug!(origin = %self.index.stop_id(origin), scans, "origin scanned");
        results.finalize()
    }
}
