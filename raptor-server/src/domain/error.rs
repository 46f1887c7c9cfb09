//! Domain error types.
//!
//! These errors represent validation failures in the domain layer. They are
//! distinct from schedule loading and request errors.

use super::StopId;

/// Domain-level errors for validation and data consistency.
#[derive(Debug, Clone, thiserror::Error)]
pub enum DomainError {
    /// Stop position is out of bounds for the trip
    #[error("invalid stop position: out of bounds")]
    InvalidStopPosition,

    /// Invalid leg construction (e.g., alight before board)
    #[error("invalid leg: {0}")]
    InvalidLeg(&'static str),

    /// Consecutive legs don't share a stop
    #[error("legs do not connect: {0} is not {1}")]
    DisconnectedLegs(StopId, StopId),

    /// Journey has no legs
    #[error("journey must have at least one leg")]
    EmptyJourney,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = DomainError::InvalidStopPosition;
        assert_eq!(err.to_string(), "invalid stop position: out of bounds");

        let err = DomainError::InvalidLeg("alight must be after board");
        assert_eq!(err.to_string(), "invalid leg: alight must be after board");

        let err = DomainError::DisconnectedLegs("B".into(), "C".into());
        assert_eq!(err.to_string(), "legs do not connect: B is not C");

        let err = DomainError::EmptyJourney;
        assert_eq!(err.to_string(), "journey must have at least one leg");
    }
}
