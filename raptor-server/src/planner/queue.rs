//! Per-round route queue.

use std::collections::BTreeMap;

use super::index::{RouteIdx, ScheduleIndex, StopIdx};

/// Picks one boarding position per route from the stops marked last round.
pub struct RouteQueueBuilder<'a> {
    index: &'a ScheduleIndex,
}

impl<'a> RouteQueueBuilder<'a> {
    pub fn new(index: &'a ScheduleIndex) -> Self {
        Self { index }
    }

    /// For each route picking up at a marked stop, the position of the most
    /// upstream marked stop on it. Scanning forward from there covers every
    /// other marked stop on the same route.
    pub fn build(&self, marked: &[StopIdx]) -> BTreeMap<RouteIdx, usize> {
        let mut queue = BTreeMap::new();

        for &stop in marked {
            for &route in self.index.routes_at(stop) {
                let Some(position) = self.index.route(route).position_of(stop) else {
                    continue;
                };
                queue
                    .entry(route)
                    .and_modify(|current: &mut usize| {
                        if position < *current {
                            *current = position;
                        }
                    })
                    .or_insert(position);
            }
        }

        queue
    }
}
