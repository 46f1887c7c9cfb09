//! Identifier types.
//!
//! Stops, trips and services are named by opaque strings taken verbatim
//! from the schedule feed. Each gets its own type so they cannot be mixed up.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wraps a raw identifier.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id!(
    /// A boarding or alighting location, e.g. `"NRW"`.
    StopId
);

string_id!(
    /// A trip identifier from the feed.
    TripId
);

string_id!(
    /// Names the calendar a trip runs on.
    ServiceId
);

/// Joins stop ids with a separator, for messages and pattern strings.
pub fn join_stops<'a>(stops: impl IntoIterator<Item = &'a StopId>, separator: &str) -> String {
    stops
        .into_iter()
        .map(StopId::as_str)
        .collect::<Vec<_>>()
        .join(separator)
}
