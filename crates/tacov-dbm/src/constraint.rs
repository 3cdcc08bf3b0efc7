//! Clock constraints and clock resets.

use crate::bound::{Bound, Comparator};
use std::fmt;

/// Clock identifier. Clock 0 is the reference clock, always valued 0.
pub type ClockId = usize;

/// The reference clock.
pub const REFERENCE_CLOCK: ClockId = 0;

/// Difference constraint `x_id1 - x_id2 cmp value`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClockConstraint {
    pub id1: ClockId,
    pub id2: ClockId,
    pub cmp: Comparator,
    pub value: i32,
}

impl ClockConstraint {
    pub fn new(id1: ClockId, id2: ClockId, cmp: Comparator, value: i32) -> Self {
        Self {
            id1,
            id2,
            cmp,
            value,
        }
    }

    /// `x cmp value`
    pub fn upper(x: ClockId, cmp: Comparator, value: i32) -> Self {
        Self::new(x, REFERENCE_CLOCK, cmp, value)
    }

    /// `value cmp x`, stored as `0 - x cmp -value`. `i32::MIN` saturates,
    /// which leaves a bound no valuation can violate.
    pub fn lower(x: ClockId, cmp: Comparator, value: i32) -> Self {
        Self::new(REFERENCE_CLOCK, x, cmp, value.saturating_neg())
    }

    #[inline]
    pub fn bound(&self) -> Bound {
        Bound::new(self.cmp, self.value)
    }

    /// True if both sides are real clocks.
    pub fn is_diagonal(&self) -> bool {
        self.id1 != REFERENCE_CLOCK && self.id2 != REFERENCE_CLOCK
    }
}

impl fmt::Display for ClockConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x{} - x{} {} {}", self.id1, self.id2, self.cmp, self.value)
    }
}

/// Reset `x_left := x_right + value`. `right == REFERENCE_CLOCK` is the
/// absolute reset `x_left := value`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClockReset {
    pub left: ClockId,
    pub right: ClockId,
    pub value: i32,
}

impl ClockReset {
    pub fn new(left: ClockId, right: ClockId, value: i32) -> Self {
        Self { left, right, value }
    }

    /// `x := value`
    pub fn to_constant(left: ClockId, value: i32) -> Self {
        Self::new(left, REFERENCE_CLOCK, value)
    }

    pub fn is_absolute(&self) -> bool {
        self.right == REFERENCE_CLOCK
    }
}

impl fmt::Display for ClockReset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_absolute() {
            write!(f, "x{} := {}", self.left, self.value)
        } else {
            write!(f, "x{} := x{} + {}", self.left, self.right, self.value)
        }
    }
}
