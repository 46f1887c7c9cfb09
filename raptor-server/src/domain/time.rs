//! Schedule time handling.
//!
//! Timetables express every arrival and departure as seconds since the
//! midnight that starts the service day. Services running past midnight keep
//! counting, so a trip leaving at `23:50:00` may arrive at `24:35:00` on the
//! same service day. This module provides a type for these offsets and the
//! conversions to absolute date-times on a given service date.

use std::fmt;
use std::ops::Add;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

/// Seconds in one calendar day.
pub const SECONDS_PER_DAY: u32 = 24 * 60 * 60;

/// Error returned when parsing an invalid time string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid time: {reason}")]
pub struct TimeError {
    reason: &'static str,
}

impl TimeError {
    fn new(reason: &'static str) -> Self {
        Self { reason }
    }
}

/// Seconds since midnight of the service day.
///
/// Ordering is plain numeric ordering, so `Time::UNREACHABLE` compares
/// greater than every real schedule time.
///
/// # Examples
///
/// ```
/// use raptor_server::domain::Time;
///
/// let t = Time::parse_hms("10:30:00").unwrap();
/// assert_eq!(t.seconds(), 37_800);
/// assert_eq!((t + 90).to_string(), "10:31:30");
///
/// // Past midnight on the same service day
/// assert_eq!(Time::parse_hms("25:05").unwrap().seconds(), 90_300);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Time(u32);

impl Time {
    /// Sentinel for stops that have not been reached.
    pub const UNREACHABLE: Time = Time(u32::MAX);

    /// Service-day midnight.
    pub const MIDNIGHT: Time = Time(0);

    /// Create a time from a number of seconds since midnight.
    pub const fn from_seconds(seconds: u32) -> Self {
        Self(seconds)
    }

    /// Create a time from hour, minute and second components.
    ///
    /// Hours may exceed 23 for services running past midnight.
    pub const fn from_hms(hour: u32, minute: u32, second: u32) -> Self {
        Self(hour * 3600 + minute * 60 + second)
    }

    /// Parse `HH:MM:SS` or `HH:MM`. Hours may exceed 23.
    pub fn parse_hms(s: &str) -> Result<Self, TimeError> {
        let mut parts = s.split(':');

        let hour = parts
            .next()
            .filter(|h| !h.is_empty() && h.len() <= 3)
            .and_then(|h| h.parse::<u32>().ok())
            .ok_or_else(|| TimeError::new("invalid hour digits"))?;

        let minute = parts
            .next()
            .and_then(parse_two_digits)
            .ok_or_else(|| TimeError::new("invalid minute digits"))?;
        if minute > 59 {
            return Err(TimeError::new("minute must be 0-59"));
        }

        let second = match parts.next() {
            Some(sec) => parse_two_digits(sec).ok_or_else(|| TimeError::new("invalid second digits"))?,
            None => 0,
        };
        if second > 59 {
            return Err(TimeError::new("second must be 0-59"));
        }

        if parts.next().is_some() {
            return Err(TimeError::new("expected HH:MM or HH:MM:SS"));
        }

        Ok(Self::from_hms(hour, minute, second))
    }

    /// Returns the number of seconds since midnight.
    pub const fn seconds(self) -> u32 {
        self.0
    }

    /// Returns false for the unreachable sentinel.
    pub fn is_reachable(self) -> bool {
        self != Self::UNREACHABLE
    }

    /// Time of day of a wall-clock time.
    pub fn from_time_of_day(time: NaiveTime) -> Self {
        Self(time.num_seconds_from_midnight())
    }

    /// Offset of `datetime` from the midnight starting `date`.
    ///
    /// Returns `None` when `datetime` lies before that midnight.
    pub fn between(date: NaiveDate, datetime: NaiveDateTime) -> Option<Self> {
        let seconds = datetime
            .signed_duration_since(date.and_time(NaiveTime::MIN))
            .num_seconds();
        u32::try_from(seconds).ok().map(Self)
    }

    /// Absolute date-time of this offset on the given service date.
    ///
    /// # Examples
    ///
    /// ```
    /// use raptor_server::domain::Time;
    /// use chrono::NaiveDate;
    ///
    /// let date = NaiveDate::from_ymd_opt(2018, 10, 16).unwrap();
    /// let dt = Time::from_hms(24, 15, 0).on(date);
    /// assert_eq!(dt.to_string(), "2018-10-17 00:15:00");
    /// ```
    pub fn on(self, date: NaiveDate) -> NaiveDateTime {
        date.and_time(NaiveTime::MIN) + Duration::seconds(i64::from(self.0))
    }
}

impl Add<u32> for Time {
    type Output = Self;

    /// Saturates at the unreachable sentinel.
    fn add(self, rhs: u32) -> Self::Output {
        Self(self.0.saturating_add(rhs))
    }
}

impl fmt::Debug for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Time({self})")
    }
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.is_reachable() {
            return f.write_str("--:--:--");
        }
        let hours = self.0 / 3600;
        let minutes = (self.0 % 3600) / 60;
        let seconds = self.0 % 60;
        write!(f, "{hours:02}:{minutes:02}:{seconds:02}")
    }
}

/// Parse exactly two ASCII digits.
fn parse_two_digits(s: &str) -> Option<u32> {
    let bytes = s.as_bytes();
    if bytes.len() != 2 {
        return None;
    }
    let d1 = (bytes[0] as char).to_digit(10)?;
    let d2 = (bytes[1] as char).to_digit(10)?;
    Some(d1 * 10 + d2)
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Display then parse returns the original time
        #[test]
        fn display_parse_roundtrip(seconds in 0u32..(3 * SECONDS_PER_DAY)) {
            let t = Time::from_seconds(seconds);
            prop_assert_eq!(Time::parse_hms(&t.to_string()).unwrap(), t);
        }

        /// Converting to a date-time and back is lossless
        #[test]
        fn absolute_roundtrip(seconds in 0u32..(2 * SECONDS_PER_DAY)) {
            let date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
            let t = Time::from_seconds(seconds);
            prop_assert_eq!(Time::between(date, t.on(date)), Some(t));
        }
    }
}
