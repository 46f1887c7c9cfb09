//! Planning requests and their validation.

use chrono::NaiveDate;

use crate::domain::{StopId, Time, join_stops};

/// Error from validating a planning request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlanError {
    /// The origin is in the excluded-stop list
    #[error("Origin: {origin} in not via list: {excluded}")]
    ExcludedOrigin { origin: StopId, excluded: String },

    /// The destination is in the excluded-stop list
    #[error("Destination: {destination} in not via list: {excluded}")]
    ExcludedDestination { destination: StopId, excluded: String },

    /// The window ends before it starts
    #[error("invalid time window: {end} is before {start}")]
    InvalidWindow { start: Time, end: Time },
}

/// Where and when to plan.
#[derive(Debug, Clone)]
pub struct PlanRequest {
    pub origin: StopId,
    pub destination: StopId,

    /// Service date the times are relative to.
    pub date: NaiveDate,

    /// Stops that must not be boarded, alighted or transferred through.
    pub excluded: Vec<StopId>,
}

impl PlanRequest {
    /// Create a request with no excluded stops.
    pub fn new(origin: impl Into<StopId>, destination: impl Into<StopId>, date: NaiveDate) -> Self {
        Self {
            origin: origin.into(),
            destination: destination.into(),
            date,
            excluded: Vec::new(),
        }
    }

    /// Set the excluded stops.
    pub fn excluding(mut self, excluded: impl IntoIterator<Item = StopId>) -> Self {
        self.excluded = excluded.into_iter().collect();
        self
    }

    /// Reject excluded lists containing the origin or destination.
    pub fn validate(&self) -> Result<(), PlanError> {
        if self.excluded.contains(&self.origin) {
            return Err(PlanError::ExcludedOrigin {
                origin: self.origin.clone(),
                excluded: join_stops(&self.excluded, ","),
            });
        }
        if self.excluded.contains(&self.destination) {
            return Err(PlanError::ExcludedDestination {
                destination: self.destination.clone(),
                excluded: join_stops(&self.excluded, ","),
            });
        }
        Ok(())
    }
}

/// Check a range query window.
pub fn validate_window(start: Time, end: Time) -> Result<(), PlanError> {
    if end < start {
        return Err(PlanError::InvalidWindow { start, end });
    }
    Ok(())
}
