//! Errors raised while building or lowering a system.

use crate::system::{EdgeId, LocationId, ProcessId};
use tacov_dbm::ClockId;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SystemError {
    #[error("unknown {kind} '{name}'")]
    UnknownName { kind: &'static str, name: String },

    #[error("duplicate {kind} '{name}'")]
    DuplicateName { kind: &'static str, name: String },

    #[error("{kind} index {index} out of bounds (have {count})")]
    IndexOutOfBounds {
        kind: &'static str,
        index: usize,
        count: usize,
    },

    #[error("clock x{clock} out of range (dimension {dim})")]
    ClockOutOfRange { clock: ClockId, dim: usize },

    #[error("synchronization {sync} is empty")]
    EmptySynchronization { sync: usize },

    #[error("synchronization {sync} lists process {process} more than once")]
    DuplicateProcessInSync { sync: usize, process: ProcessId },

    #[error("edge {edge}: location {location} does not belong to process {process}")]
    ForeignLocation {
        edge: EdgeId,
        location: LocationId,
        process: ProcessId,
    },

    #[error("edge {edge}: clock x{clock} is reset more than once")]
    NonDisjointResets { edge: EdgeId, clock: ClockId },

    #[error("synchronization {sync}: edges {first} and {second} reset x{clock} differently")]
    ConflictingSyncResets {
        sync: usize,
        first: EdgeId,
        second: EdgeId,
        clock: ClockId,
    },

    #[error("edge {edge}: reset of x{clock} reads a clock reset by the same edge")]
    ResetReadsResetClock { edge: EdgeId, clock: ClockId },

    #[error("edge {edge}: reset of x{clock} has negative offset {value}")]
    NegativeResetOffset {
        edge: EdgeId,
        clock: ClockId,
        value: i32,
    },

    #[error("edge {edge}: the reference clock cannot be reset")]
    ReferenceClockReset { edge: EdgeId },

    #[error("integer variable '{name}': initial value {initial} outside {min}..={max}")]
    IntVarDomain {
        name: String,
        min: i64,
        max: i64,
        initial: i64,
    },

    #[error("clock constant {value} out of range")]
    ConstantOutOfRange { value: i64 },

    #[error("comparator '{cmp}' is not allowed on clocks")]
    UnsupportedClockComparator { cmp: String },
}

pub type SystemResult<T> = Result<T, SystemError>;
