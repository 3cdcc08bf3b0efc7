//! Zone semantics: how guards, resets, invariants and delays transform a
//! zone along one edge.
//!
//! Extrapolation is not applied here; the zone graph does it once the
//! semantic step succeeds.

use crate::constraint::{ClockConstraint, ClockReset};
use crate::dbm::Dbm;
use crate::status::StateStatus;

/// Which zones the search stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ZoneSemantics {
    /// Stored zones are closed under time elapse (where delay is allowed).
    #[default]
    Elapsed,
    /// Stored zones are the sets of valuations right after a discrete step.
    NonElapsed,
}

/// Clock view of one (vector) edge.
#[derive(Debug, Clone, Copy)]
pub struct ZoneTransition<'a> {
    pub src_delay_allowed: bool,
    pub src_invariant: &'a [ClockConstraint],
    pub guard: &'a [ClockConstraint],
    pub resets: &'a [ClockReset],
    pub tgt_delay_allowed: bool,
    pub tgt_invariant: &'a [ClockConstraint],
}

fn check(dbm: &mut Dbm, constraints: &[ClockConstraint], status: StateStatus) -> StateStatus {
    if dbm.constrain(constraints).is_empty() {
        status
    } else {
        StateStatus::Ok
    }
}

macro_rules! ensure_ok {
    ($e:expr) => {
        match $e {
            StateStatus::Ok => {}
            other => return other,
        }
    };
}

impl ZoneSemantics {
    /// Initial zone of a state: all clocks zero, constrained by the
    /// invariant of the initial location tuple.
    pub fn initialize(
        self,
        dbm: &mut Dbm,
        delay_allowed: bool,
        invariant: &[ClockConstraint],
    ) -> StateStatus {
        *dbm = Dbm::zero(dbm.dim());
        ensure_ok!(check(dbm, invariant, StateStatus::ClocksTgtInvariantViolated));
        if self == ZoneSemantics::Elapsed && delay_allowed {
            dbm.open_up();
            ensure_ok!(check(dbm, invariant, StateStatus::ClocksTgtInvariantViolated));
        }
        StateStatus::Ok
    }

    /// Forward successor of `dbm` along `t`.
    pub fn next(self, dbm: &mut Dbm, t: &ZoneTransition<'_>) -> StateStatus {
        if self == ZoneSemantics::NonElapsed {
            if t.src_delay_allowed {
                dbm.open_up();
            }
            ensure_ok!(check(dbm, t.src_invariant, StateStatus::ClocksSrcInvariantViolated));
        }
        ensure_ok!(check(dbm, t.guard, StateStatus::ClocksGuardViolated));
        dbm.reset(t.resets);
        ensure_ok!(check(dbm, t.tgt_invariant, StateStatus::ClocksTgtInvariantViolated));
        if self == ZoneSemantics::Elapsed && t.tgt_delay_allowed {
            dbm.open_up();
            ensure_ok!(check(dbm, t.tgt_invariant, StateStatus::ClocksTgtInvariantViolated));
        }
        StateStatus::Ok
    }

    /// Backward predecessor of `dbm` along `t`.
    pub fn prev(self, dbm: &mut Dbm, t: &ZoneTransition<'_>) -> StateStatus {
        if self == ZoneSemantics::Elapsed && t.tgt_delay_allowed {
            dbm.open_down();
        }
        ensure_ok!(check(dbm, t.tgt_invariant, StateStatus::ClocksTgtInvariantViolated));
        ensure_ok!(dbm.constrain_to_reset(t.resets));
        dbm.inverse_reset(t.resets);
        ensure_ok!(check(dbm, t.guard, StateStatus::ClocksGuardViolated));
        ensure_ok!(check(dbm, t.src_invariant, StateStatus::ClocksSrcInvariantViolated));
        if t.src_delay_allowed {
            dbm.open_down();
            ensure_ok!(check(dbm, t.src_invariant, StateStatus::ClocksSrcInvariantViolated));
        }
        StateStatus::Ok
    }
}
