//! Data transfer objects for web requests and responses.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::cache::QueryKey;
use crate::domain::{StopId, Time};
use crate::planner::PlanRequest;

/// Query string shared by every planning endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JourneyQuery {
    /// Origin stop
    pub orig: String,

    /// Destination stop
    pub dest: String,

    /// Earliest departure; its date is the service date
    pub start_date: NaiveDateTime,

    /// End of the departure window, for range queries
    pub end_date: Option<NaiveDateTime>,

    /// Comma-separated stops the journey must avoid
    #[serde(default)]
    pub not_via: Option<String>,
}

impl JourneyQuery {
    /// The not-via stops, ignoring blanks.
    pub fn excluded(&self) -> Vec<StopId> {
        self.not_via
            .as_deref()
            .unwrap_or("")
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(StopId::new)
            .collect()
    }

    pub fn plan_request(&self) -> PlanRequest {
        PlanRequest::new(self.orig.as_str(), self.dest.as_str(), self.start_date.date()).excluding(self.excluded())
    }

    /// Seconds after the service date's midnight the query starts at.
    pub fn start_time(&self) -> Time {
        Time::from_time_of_day(self.start_date.time())
    }

    pub fn cache_key(&self, end: NaiveDateTime) -> QueryKey {
        QueryKey::new(
            StopId::new(self.orig.as_str()),
            StopId::new(self.dest.as_str()),
            self.start_date,
            end,
            &self.excluded(),
        )
    }
}

/// Error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn query(not_via: Option<&str>, end: Option<NaiveDateTime>) -> JourneyQuery {
        JourneyQuery {
            orig: "A".into(),
            dest: "B".into(),
            start_date: NaiveDate::from_ymd_opt(2018, 10, 16)
                .unwrap()
                .and_hms_opt(9, 30, 0)
                .unwrap(),
            end_date: end,
            not_via: not_via.map(String::from),
        }
    }

    #[test]
    fn splits_not_via() {
        let q = query(Some("C, D,,E"), None);
        let excluded: Vec<_> = q.excluded().iter().map(|s| s.as_str().to_string()).collect();
        assert_eq!(excluded, ["C", "D", "E"]);
        assert!(query(None, None).excluded().is_empty());
        assert!(query(Some(""), None).excluded().is_empty());
    }

    #[test]
    fn request_uses_start_date() {
        let request = query(Some("C"), None).plan_request();
        assert_eq!(request.origin.as_str(), "A");
        assert_eq!(request.destination.as_str(), "B");
        assert_eq!(request.date, NaiveDate::from_ymd_opt(2018, 10, 16).unwrap());
        assert_eq!(request.excluded, vec![StopId::new("C")]);
    }

    #[test]
    fn start_time_and_cache_key() {
        let next_day = NaiveDate::from_ymd_opt(2018, 10, 17)
            .unwrap()
            .and_hms_opt(1, 0, 0)
            .unwrap();
        let q = query(None, Some(next_day));

        assert_eq!(q.start_time(), Time::from_seconds(9 * 3600 + 30 * 60));
        assert_eq!(q.cache_key(next_day).end, next_day);
    }

    #[test]
    fn deserializes_camel_case() {
        let q: JourneyQuery = serde_json::from_str(
            r#"{"orig":"A","dest":"B","startDate":"2018-10-16T09:30:00","endDate":"2018-10-16T12:00:00","notVia":"C"}"#,
        )
        .unwrap();
        assert_eq!(q.end_date.map(|d| d.time().to_string()), Some("12:00:00".to_string()));
        assert_eq!(q.not_via.as_deref(), Some("C"));
    }
}
