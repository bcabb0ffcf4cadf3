//! Fatal setup errors: data-integrity failures caught before a run starts.
//!
//! Per the error-handling design, these are detected at configuration time
//! and fail the whole run with a one-line diagnostic naming the offending
//! entity — never silently reinterpreted into something "close enough".

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum SetupError {
    #[error("route has no stops")]
    EmptyRoute,

    #[error("route distance count ({distances}) must be stop count minus one ({expected})")]
    DistanceCountMismatch { distances: usize, expected: usize },

    #[error("monitored stop index {0} is out of range for the route")]
    MonitoredStopOutOfRange(usize),

    #[error("vehicle capacity must be positive, got {0}")]
    NonPositiveCapacity(i64),

    #[error("h_min ({h_min}) must be <= h_max ({h_max})")]
    HeadwayBoundsInverted { h_min: u64, h_max: u64 },

    #[error("timetable dispatcher was given an empty departure list")]
    EmptyTimetable,
}
