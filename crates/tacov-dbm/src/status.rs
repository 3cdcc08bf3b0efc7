//! Status codes shared by zone transformers and state computations.

use std::fmt;

/// Outcome of a raw DBM operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbmStatus {
    NonEmpty,
    Empty,
}

impl DbmStatus {
    #[inline]
    pub fn is_empty(self) -> bool {
        self == DbmStatus::Empty
    }
}

/// Outcome of computing an initial or successor state.
///
/// Anything but `Ok` means the candidate state does not exist; callers drop
/// it. None of these is an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateStatus {
    Ok,
    EmptyZone,
    /// Edge tuple not firable from the location tuple (committed locations).
    IncompatibleEdge,
    IntGuardViolated,
    /// An integer update left a variable outside its domain.
    IntStatementFailed,
    ClocksSrcInvariantViolated,
    ClocksGuardViolated,
    ClocksTgtInvariantViolated,
}

impl StateStatus {
    #[inline]
    pub fn is_ok(self) -> bool {
        self == StateStatus::Ok
    }
}

impl fmt::Display for StateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StateStatus::Ok => "ok",
            StateStatus::EmptyZone => "empty zone",
            StateStatus::IncompatibleEdge => "incompatible edge",
            StateStatus::IntGuardViolated => "integer guard violated",
            StateStatus::IntStatementFailed => "integer statement failed",
            StateStatus::ClocksSrcInvariantViolated => "source invariant violated",
            StateStatus::ClocksGuardViolated => "clock guard violated",
            StateStatus::ClocksTgtInvariantViolated => "target invariant violated",
        };
        f.write_str(s)
    }
}
