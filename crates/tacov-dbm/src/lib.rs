//! Zone engine for timed automata: difference bound matrices, clock
//! constraints and resets, zone semantics and extrapolation.

pub mod bound;
pub mod constraint;
pub mod dbm;
pub mod extrapolation;
pub mod semantics;
pub mod status;

pub use bound::{Bound, Comparator};
pub use constraint::{ClockConstraint, ClockId, ClockReset, REFERENCE_CLOCK};
pub use dbm::Dbm;
pub use extrapolation::{ClockBounds, Extrapolation};
pub use semantics::{ZoneSemantics, ZoneTransition};
pub use status::{DbmStatus, StateStatus};
