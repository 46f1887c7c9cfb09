//! Change-point patterns of an origin's journeys.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::domain::{Journey, StopId, join_stops};
use crate::planner::{ConnectionIndex, JourneyReconstructor, ScheduleIndex, StopIdx};

use super::generator::TransferPatternResults;

/// Every distinct pattern found from one origin, per destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferPatterns {
    pub origin: StopId,
    pub patterns: BTreeMap<StopId, BTreeSet<String>>,
}

/// The stops a journey starts, changes and ends at, joined by `>`.
pub fn pattern_of(journey: &Journey) -> String {
    let stops = std::iter::once(journey.origin()).chain(journey.legs().iter().map(|leg| leg.destination()));
    join_stops(stops, ">")
}

/// Collects the patterns of every journey found in an origin's scans.
pub struct PatternStringGenerator<'a> {
    index: &'a ScheduleIndex,
    origin: StopIdx,
    patterns: BTreeMap<StopId, BTreeSet<String>>,
}

impl<'a> PatternStringGenerator<'a> {
    pub fn new(index: &'a ScheduleIndex, origin: StopIdx) -> Self {
        Self {
            index,
            origin,
            patterns: BTreeMap::new(),
        }
    }
}

impl TransferPatternResults for PatternStringGenerator<'_> {
    type Output = TransferPatterns;

    fn add(&mut self, connections: &ConnectionIndex<'_>) {
        let reconstructor = JourneyReconstructor::new(self.index);
        for destination in connections.reached() {
            if destination == self.origin {
                continue;
            }
            let journeys = reconstructor.journeys(connections, self.origin, destination);
            if journeys.is_empty() {
                continue;
            }
            self.patterns
                .entry(self.index.stop_id(destination).clone())
                .or_default()
                .extend(journeys.iter().map(pattern_of));
        }
    }

    fn finalize(self) -> TransferPatterns {
        TransferPatterns {
            origin: self.index.stop_id(self.origin).clone(),
            patterns: self.patterns,
        }
    }
}
