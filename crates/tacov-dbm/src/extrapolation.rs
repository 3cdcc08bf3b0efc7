//! Zone extrapolation with global clock bounds.
//!
//! Without extrapolation the zone graph of an automaton with a loop that
//! lets time grow is infinite. All operators here return a superset of the
//! input zone and preserve reachability of locations for clocks compared
//! against constants no larger than the bounds.

use crate::bound::Bound;
use crate::constraint::ClockId;
use crate::dbm::Dbm;

/// Per-clock maximal lower-bound (`L`) and upper-bound (`U`) constants.
/// Index 0 is the reference clock and always maps to 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClockBounds {
    lower: Vec<i32>,
    upper: Vec<i32>,
}

impl ClockBounds {
    /// All bounds 0 for a DBM of dimension `dim`.
    pub fn new(dim: usize) -> Self {
        Self {
            lower: vec![0; dim],
            upper: vec![0; dim],
        }
    }

    pub fn from_lu(lower: Vec<i32>, upper: Vec<i32>) -> Self {
        debug_assert_eq!(lower.len(), upper.len());
        Self { lower, upper }
    }

    pub fn dim(&self) -> usize {
        self.lower.len()
    }

    #[inline]
    pub fn l(&self, x: ClockId) -> i32 {
        self.lower[x]
    }

    #[inline]
    pub fn u(&self, x: ClockId) -> i32 {
        self.upper[x]
    }

    /// `M(x) = max(L(x), U(x))`
    #[inline]
    pub fn m(&self, x: ClockId) -> i32 {
        self.lower[x].max(self.upper[x])
    }

    /// Raise `L(x)` to at least `v`. Returns true if it changed.
    pub fn update_l(&mut self, x: ClockId, v: i32) -> bool {
        if v > self.lower[x] {
            self.lower[x] = v;
            true
        } else {
            false
        }
    }

    /// Raise `U(x)` to at least `v`. Returns true if it changed.
    pub fn update_u(&mut self, x: ClockId, v: i32) -> bool {
        if v > self.upper[x] {
            self.upper[x] = v;
            true
        } else {
            false
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Extrapolation {
    /// Keep zones exact. The search may not terminate.
    None,
    ExtraM,
    ExtraMPlus,
    ExtraLu,
    #[default]
    ExtraLuPlus,
}

impl Extrapolation {
    /// Abstract `dbm` in place. An empty zone is left untouched.
    pub fn extrapolate(self, dbm: &mut Dbm, bounds: &ClockBounds) {
        if dbm.is_empty() || self == Extrapolation::None {
            return;
        }
        debug_assert_eq!(dbm.dim(), bounds.dim());
        match self {
            Extrapolation::None => {}
            Extrapolation::ExtraM => extra(dbm, |x| bounds.m(x), |x| bounds.m(x)),
            Extrapolation::ExtraMPlus => extra_plus(dbm, |x| bounds.m(x), |x| bounds.m(x)),
            Extrapolation::ExtraLu => extra(dbm, |x| bounds.l(x), |x| bounds.u(x)),
            Extrapolation::ExtraLuPlus => extra_plus(dbm, |x| bounds.l(x), |x| bounds.u(x)),
        }
        dbm.tighten();
    }
}

fn extra(dbm: &mut Dbm, lo: impl Fn(ClockId) -> i32, up: impl Fn(ClockId) -> i32) {
    let dim = dbm.dim();
    for i in 0..dim {
        let li = Bound::le(lo(i));
        for j in 0..dim {
            if i == j {
                continue;
            }
            let dij = dbm.get(i, j);
            let neg_uj = Bound::lt(-up(j));
            if dij > li {
                dbm.set(i, j, Bound::INFINITY);
            } else if dij < neg_uj {
                dbm.set(i, j, neg_uj);
            }
        }
    }
}

fn extra_plus(dbm: &mut Dbm, lo: impl Fn(ClockId) -> i32, up: impl Fn(ClockId) -> i32) {
    let dim = dbm.dim();
    let row0: Vec<Bound> = (0..dim).map(|j| dbm.get(0, j)).collect();
    for i in 0..dim {
        let li = lo(i);
        let beyond_l = i != 0 && row0[i] < Bound::lt(-li);
        for j in 0..dim {
            if i == j {
                continue;
            }
            let dij = dbm.get(i, j);
            let neg_uj = Bound::lt(-up(j));
            if dij > Bound::le(li) || beyond_l {
                dbm.set(i, j, Bound::INFINITY);
            } else if row0[j] < neg_uj {
                if i == 0 {
                    dbm.set(i, j, neg_uj);
                } else {
                    dbm.set(i, j, Bound::INFINITY);
                }
            }
        }
    }
}
