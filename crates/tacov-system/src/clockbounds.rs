//! Static analysis of the constants clocks are compared against.
//!
//! Computes global `L` (lower-bound) and `U` (upper-bound) maps over all
//! guards and invariants, then propagates them backwards through resets
//! `x := y + c`: whatever is compared against `x` later is compared
//! against `y + c` before the reset.

use crate::system::System;
use tacov_dbm::{ClockBounds, ClockConstraint, REFERENCE_CLOCK};
use tracing::debug;

/// Global clock bounds of `system`.
pub fn compute_clock_bounds(system: &System) -> ClockBounds {
    let mut bounds = ClockBounds::new(system.dim());

    let constraints = system
        .locations()
        .iter()
        .flat_map(|l| l.invariant.iter())
        .chain(system.edges().iter().flat_map(|e| e.guard.iter()));
    for c in constraints {
        add_constraint(&mut bounds, c);
    }

    // Offsets are non-negative, so the iteration only ever raises bounds
    // towards the largest constant and terminates.
    let mut changed = true;
    let mut rounds = 0usize;
    while changed {
        changed = false;
        rounds += 1;
        for e in system.edges() {
            for r in &e.resets {
                if r.right == REFERENCE_CLOCK {
                    continue;
                }
                let l = bounds.l(r.left) - r.value;
                let u = bounds.u(r.left) - r.value;
                changed |= bounds.update_l(r.right, l);
                changed |= bounds.update_u(r.right, u);
            }
        }
    }

    debug!(rounds, dim = system.dim(), "clock bounds computed");
    bounds
}

fn add_constraint(bounds: &mut ClockBounds, c: &ClockConstraint) {
    let v = c.value;
    if c.id2 == REFERENCE_CLOCK && c.id1 != REFERENCE_CLOCK {
        // x < v, x <= v
        bounds.update_u(c.id1, v);
    } else if c.id1 == REFERENCE_CLOCK && c.id2 != REFERENCE_CLOCK {
        // -x < v, -x <= v
        bounds.update_l(c.id2, v.saturating_neg());
    } else if c.is_diagonal() {
        let m = v.saturating_abs();
        for x in [c.id1, c.id2] {
            bounds.update_l(x, m);
            bounds.update_u(x, m);
        }
    }
}
