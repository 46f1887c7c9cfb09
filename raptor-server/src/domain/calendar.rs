//! Service calendars.
//!
//! A calendar says on which dates the trips of one service operate: a date
//! range with a weekly pattern, adjusted by explicit extra dates and explicit
//! exclusions.

use std::collections::BTreeSet;

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use super::ServiceId;

/// The date a query plans against, with its weekday resolved once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ServiceDay {
    pub date: NaiveDate,
    pub weekday: Weekday,
}

impl ServiceDay {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            weekday: date.weekday(),
        }
    }
}

/// Operating days of a service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Calendar {
    pub service_id: ServiceId,

    /// First date of the regular pattern (inclusive).
    pub start_date: NaiveDate,

    /// Last date of the regular pattern (inclusive).
    pub end_date: NaiveDate,

    /// Weekly pattern, Monday first.
    pub days: [bool; 7],

    /// Dates the service runs regardless of the regular pattern.
    #[serde(default)]
    pub include: BTreeSet<NaiveDate>,

    /// Dates the service never runs. Takes precedence over everything else.
    #[serde(default)]
    pub exclude: BTreeSet<NaiveDate>,
}

impl Calendar {
    /// A calendar running every day between two dates.
    pub fn daily(service_id: impl Into<ServiceId>, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            service_id: service_id.into(),
            start_date,
            end_date,
            days: [true; 7],
            include: BTreeSet::new(),
            exclude: BTreeSet::new(),
        }
    }

    /// Whether the service operates on the given day.
    ///
    /// # Examples
    ///
    /// ```
    /// use raptor_server::domain::{Calendar, ServiceDay};
    /// use chrono::NaiveDate;
    ///
    /// let start = NaiveDate::from_ymd_opt(2018, 10, 1).unwrap();
    /// let end = NaiveDate::from_ymd_opt(2018, 10, 15).unwrap();
    /// let calendar = Calendar::daily("weekday", start, end);
    ///
    /// assert!(calendar.is_running(&ServiceDay::new(start)));
    /// assert!(!calendar.is_running(&ServiceDay::new(end.succ_opt().unwrap())));
    /// ```
    pub fn is_running(&self, day: &ServiceDay) -> bool {
        if self.exclude.contains(&day.date) {
            return false;
        }
        if self.include.contains(&day.date) {
            return true;
        }
        self.start_date <= day.date
            && day.date <= self.end_date
            && self.days[day.weekday.num_days_from_monday() as usize]
    }
}
