//! Schedule input.
//!
//! Parsing the raw timetable feed happens upstream. This module reads the
//! already-parsed collections the planner needs from a single JSON document
//! and hands them to [`ScheduleIndex::build`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::{Calendar, ServiceId, StopId, Transfer, Trip, TripId};
use crate::planner::ScheduleIndex;

/// Errors from loading a schedule or building the index.
#[derive(Debug, thiserror::Error)]
pub enum ScheduleError {
    /// A trip without stop times cannot form a route
    #[error("trip {0} has no stop times")]
    EmptyTrip(TripId),

    /// A trip runs on a service with no calendar
    #[error("trip {trip} references unknown service {service}")]
    UnknownService { trip: TripId, service: ServiceId },

    /// Reading the schedule file failed
    #[error("failed to read schedule {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The schedule file is not valid JSON for [`ScheduleData`]
    #[error("failed to parse schedule: {0}")]
    Json(#[from] serde_json::Error),
}

/// Everything needed to build a [`ScheduleIndex`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScheduleData {
    pub trips: Vec<Trip>,

    /// Transfers keyed by origin stop.
    #[serde(default)]
    pub transfers: HashMap<StopId, Vec<Transfer>>,

    /// Minimum change time in seconds, keyed by stop.
    #[serde(default)]
    pub interchange: HashMap<StopId, u32>,

    /// Calendars keyed by service id.
    #[serde(default)]
    pub calendars: HashMap<ServiceId, Calendar>,
}

impl ScheduleData {
    /// Read a schedule document from disk.
    pub fn load(path: &Path) -> Result<Self, ScheduleError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ScheduleError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Build the immutable index. Fails on malformed trips.
    pub fn into_index(self) -> Result<ScheduleIndex, ScheduleError> {
        let transfers = self.transfers.into_values().flatten().collect();
        let calendars = self.calendars.into_values().collect();
        ScheduleIndex::build(self.trips, transfers, self.interchange, calendars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const SCHEDULE: &str = r#"{
        "trips": [
            {
                "id": "T1",
                "service_id": "weekday",
                "stop_times": [
                    {"stop": "A", "arrival": 36000, "departure": 36000, "pick_up": true, "drop_off": false},
                    {"stop": "B", "arrival": 37800, "departure": 37800, "pick_up": false, "drop_off": true}
                ]
            }
        ],
        "transfers": {
            "B": [{"origin": "B", "destination": "C", "duration": 120}]
        },
        "interchange": {"B": 300},
        "calendars": {
            "weekday": {
                "service_id": "weekday",
                "start_date": "2018-10-01",
                "end_date": "2018-12-31",
                "days": [true, true, true, true, true, false, false]
            }
        }
    }"#;

    #[test]
    fn loads_schedule_from_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("schedule.json");
        std::fs::write(&path, SCHEDULE).unwrap();

        let data = ScheduleData::load(&path).unwrap();
        assert_eq!(data.trips.len(), 1);
        assert_eq!(data.interchange.get("B"), Some(&300));

        let index = data.into_index().unwrap();
        // A, B and the transfer-only stop C
        assert_eq!(index.stop_count(), 3);
        assert!(index.stop_idx("C").is_some());
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempdir().unwrap();
        let result = ScheduleData::load(&dir.path().join("missing.json"));

        assert!(matches!(result, Err(ScheduleError::Io { .. })));
    }

    #[test]
    fn invalid_json_is_parse_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("schedule.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(matches!(ScheduleData::load(&path), Err(ScheduleError::Json(_))));
    }

    #[test]
    fn unknown_service_is_fatal() {
        let mut data: ScheduleData = serde_json::from_str(SCHEDULE).unwrap();
        data.calendars.clear();

        match data.into_index() {
            Err(ScheduleError::UnknownService { trip, service }) => {
                assert_eq!(trip.as_str(), "T1");
                assert_eq!(service.as_str(), "weekday");
            }
            other => panic!("expected unknown service, got {other:?}"),
        }
    }
}
