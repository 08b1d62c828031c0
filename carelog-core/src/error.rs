//! Validation errors raised while ingesting or mutating reminder instances.

use thiserror::Error;

use crate::optimistic::Phase;

/// Result alias for library operations that can reject a record.
pub type InstanceResult<T> = Result<T, InstanceError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InstanceError {
    /// A timestamp field could not be parsed.
    #[error("instance {id}: invalid {field} '{value}'")]
    InvalidTimestamp {
        id: i64,
        field: &'static str,
        value: String,
    },

    /// A day-of-month outside the viewed month.
    #[error("day {day} is outside {year}-{month:02}")]
    UnknownDay { year: i32, month: u32, day: u32 },

    /// Month number outside 1..=12.
    #[error("invalid month {month} for year {year}")]
    InvalidMonth { year: i32, month: u32 },

    /// No instance with the given id in the working set.
    #[error("instance {id} not found")]
    NotFound { id: i64 },

    /// The optimistic update was asked to move between phases it cannot.
    #[error("cannot {action} while {phase:?}")]
    InvalidTransition { action: &'static str, phase: Phase },
}
