//! Error types for the grid domain model.

use std::fmt;

/// Errors raised by the unit tracker, sliding window, and cycle controller.
///
/// These are distinguished from [`crate::execution::VenueError`]: domain
/// errors describe violations of the grid's own invariants, not transport
/// or venue-side failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A quantised unit fell outside the allocated `PositionMap` range.
    UnitOutOfRange { unit: i32, min: i32, max: i32 },
    /// Two live order slots were found mapped to the same unit.
    DuplicateUnit { unit: i32 },
    /// A window invariant (size, disjointness, price-side) was violated
    /// badly enough that the engine must halt rather than self-correct.
    InvariantViolation { detail: String },
    /// A slide was requested with a unit equal to the current unit.
    NoOpSlide { unit: i32 },
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomainError::UnitOutOfRange { unit, min, max } => write!(
                f,
                "unit {unit} outside position map range [{min}, {max}]"
            ),
            DomainError::DuplicateUnit { unit } => {
                write!(f, "duplicate live order mapped to unit {unit}")
            }
            DomainError::InvariantViolation { detail } => {
                write!(f, "invariant violation: {detail}")
            }
            DomainError::NoOpSlide { unit } => {
                write!(f, "slide to unit {unit} is a no-op")
            }
        }
    }
}

impl std::error::Error for DomainError {}
