//! Difference bound matrices.

use crate::bound::Bound;
use crate::constraint::{ClockConstraint, ClockId, ClockReset, REFERENCE_CLOCK};
use crate::status::{DbmStatus, StateStatus};
use std::fmt;
use std::hash::{Hash, Hasher};

/// A zone over `dim - 1` clocks, stored as a `dim x dim` row-major matrix
/// where entry `(i, j)` bounds `x_i - x_j`.
///
/// Every operation leaves the matrix either tight (closed under the
/// triangle inequality, diagonal `<= 0`) or flagged empty. An empty DBM has
/// `(0, 0) = < 0` and stays empty under every operation.
#[derive(Clone)]
pub struct Dbm {
    dim: usize,
    bounds: Vec<Bound>,
}

impl Dbm {
    /// The zone containing only the all-zero valuation.
    pub fn zero(dim: usize) -> Self {
        assert!(dim >= 1, "DBM dimension must include the reference clock");
        Self {
            dim,
            bounds: vec![Bound::LE_ZERO; dim * dim],
        }
    }

    /// No constraint besides the diagonal. Allows negative clock values.
    pub fn universal(dim: usize) -> Self {
        assert!(dim >= 1, "DBM dimension must include the reference clock");
        let mut bounds = vec![Bound::INFINITY; dim * dim];
        for i in 0..dim {
            bounds[i * dim + i] = Bound::LE_ZERO;
        }
        Self { dim, bounds }
    }

    /// All valuations with non-negative clocks.
    pub fn universal_positive(dim: usize) -> Self {
        let mut dbm = Self::universal(dim);
        for j in 0..dim {
            dbm.bounds[j] = Bound::LE_ZERO;
        }
        dbm
    }

    #[inline]
    pub fn dim(&self) -> usize {
        self.dim
    }

    #[inline]
    pub fn get(&self, i: ClockId, j: ClockId) -> Bound {
        self.bounds[i * self.dim + j]
    }

    /// Raw write. Leaves the matrix possibly non-tight: follow with
    /// [`Dbm::tighten`].
    #[inline]
    pub fn set(&mut self, i: ClockId, j: ClockId, b: Bound) {
        self.bounds[i * self.dim + j] = b;
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bounds[0] < Bound::LE_ZERO
    }

    fn mark_empty(&mut self) -> DbmStatus {
        self.bounds[0] = Bound::LT_ZERO;
        DbmStatus::Empty
    }

    fn status(&self) -> DbmStatus {
        if self.is_empty() {
            DbmStatus::Empty
        } else {
            DbmStatus::NonEmpty
        }
    }

    /// All-pairs closure (Floyd-Warshall). Detects emptiness.
    pub fn tighten(&mut self) -> DbmStatus {
        if self.is_empty() {
            return DbmStatus::Empty;
        }
        let dim = self.dim;
        for k in 0..dim {
            for i in 0..dim {
                let dik = self.bounds[i * dim + k];
                if dik.is_infinity() {
                    continue;
                }
                for j in 0..dim {
                    let via = dik + self.bounds[k * dim + j];
                    if via < self.bounds[i * dim + j] {
                        self.bounds[i * dim + j] = via;
                    }
                }
                if self.bounds[i * dim + i] < Bound::LE_ZERO {
                    return self.mark_empty();
                }
            }
        }
        DbmStatus::NonEmpty
    }

    /// Intersect with `x - y <= b` (or `< b`), restoring tightness
    /// incrementally.
    pub fn constrain_one(&mut self, x: ClockId, y: ClockId, b: Bound) -> DbmStatus {
        if self.is_empty() {
            return DbmStatus::Empty;
        }
        if b >= self.get(x, y) {
            return DbmStatus::NonEmpty;
        }
        if self.get(y, x) + b < Bound::LE_ZERO {
            return self.mark_empty();
        }
        self.set(x, y, b);
        let dim = self.dim;
        for i in 0..dim {
            let dix = self.get(i, x);
            if dix.is_infinity() {
                continue;
            }
            let left = dix + b;
            for j in 0..dim {
                let via = left + self.get(y, j);
                if via < self.get(i, j) {
                    self.set(i, j, via);
                }
            }
        }
        DbmStatus::NonEmpty
    }

    /// Intersect with a conjunction of constraints.
    pub fn constrain(&mut self, constraints: &[ClockConstraint]) -> DbmStatus {
        for c in constraints {
            if self.constrain_one(c.id1, c.id2, c.bound()).is_empty() {
                return DbmStatus::Empty;
            }
        }
        self.status()
    }

    /// Apply a set of resets as one simultaneous assignment.
    ///
    /// Each new clock `x_i` equals `x_src(i) + off(i)`, so the new entry
    /// `(i, j)` is the old entry `(src(i), src(j))` shifted by
    /// `off(i) - off(j)`. Left clocks must be pairwise distinct.
    pub fn reset(&mut self, resets: &[ClockReset]) {
        if self.is_empty() || resets.is_empty() {
            return;
        }
        let dim = self.dim;
        let mut src: Vec<ClockId> = (0..dim).collect();
        let mut off = vec![0i64; dim];
        for r in resets {
            src[r.left] = r.right;
            off[r.left] = r.value as i64;
        }
        let old = self.bounds.clone();
        for i in 0..dim {
            for j in 0..dim {
                let b = if i == j {
                    Bound::LE_ZERO
                } else {
                    old[src[i] * dim + src[j]].shift(off[i] - off[j])
                };
                self.bounds[i * dim + j] = b;
            }
        }
    }

    /// Intersect with `x - y == c` for every reset `x := y + c`.
    pub fn constrain_to_reset(&mut self, resets: &[ClockReset]) -> StateStatus {
        for r in resets {
            let c = r.value;
            if self.constrain_one(r.left, r.right, Bound::le(c)).is_empty()
                || self.constrain_one(r.right, r.left, Bound::le(-c)).is_empty()
            {
                return StateStatus::EmptyZone;
            }
        }
        StateStatus::Ok
    }

    /// Backward reset: frees every reset clock. Over-approximates the
    /// pre-image of the reset; exact once combined with
    /// [`Dbm::constrain_to_reset`] on the target side.
    pub fn inverse_reset(&mut self, resets: &[ClockReset]) {
        for r in resets {
            self.free_clock(r.left);
        }
    }

    /// Remove every constraint on `x` except `x >= 0`.
    pub fn free_clock(&mut self, x: ClockId) {
        if self.is_empty() || x == REFERENCE_CLOCK {
            return;
        }
        for j in 0..self.dim {
            if j != x {
                let bj0 = self.get(j, REFERENCE_CLOCK);
                self.set(x, j, Bound::INFINITY);
                self.set(j, x, bj0);
            }
        }
    }

    /// Time successors: drop every upper bound.
    pub fn open_up(&mut self) {
        if self.is_empty() {
            return;
        }
        for i in 1..self.dim {
            self.set(i, REFERENCE_CLOCK, Bound::INFINITY);
        }
    }

    /// Time predecessors: relax lower bounds as far as the other clocks
    /// allow while keeping every clock non-negative.
    pub fn open_down(&mut self) {
        if self.is_empty() {
            return;
        }
        let dim = self.dim;
        for i in 1..dim {
            let mut b = Bound::LE_ZERO;
            for j in 1..dim {
                let dji = self.get(j, i);
                if dji < b {
                    b = dji;
                }
            }
            self.set(REFERENCE_CLOCK, i, b);
        }
    }

    /// Zone inclusion on tight matrices.
    pub fn is_le(&self, other: &Dbm) -> bool {
        debug_assert_eq!(self.dim, other.dim);
        if self.is_empty() {
            return true;
        }
        if other.is_empty() {
            return false;
        }
        self.bounds
            .iter()
            .zip(other.bounds.iter())
            .all(|(a, b)| a <= b)
    }

    /// True if every valuation of the zone satisfies all `constraints`.
    pub fn satisfies(&self, constraints: &[ClockConstraint]) -> bool {
        if self.is_empty() {
            return true;
        }
        constraints.iter().all(|c| self.get(c.id1, c.id2) <= c.bound())
    }

    /// True if some valuation of the zone satisfies all `constraints`.
    pub fn intersects(&self, constraints: &[ClockConstraint]) -> bool {
        let mut copy = self.clone();
        !copy.constrain(constraints).is_empty()
    }

    /// 64-bit hash of the zone, stable across equal zones.
    pub fn hash_value(&self) -> u64 {
        let mut hasher = ahash::AHasher::default();
        self.hash(&mut hasher);
        hasher.finish()
    }

    pub fn bounds(&self) -> &[Bound] {
        &self.bounds
    }
}

impl PartialEq for Dbm {
    fn eq(&self, other: &Self) -> bool {
        if self.dim != other.dim {
            return false;
        }
        match (self.is_empty(), other.is_empty()) {
            (true, true) => true,
            (false, false) => self.bounds == other.bounds,
            _ => false,
        }
    }
}

impl Eq for Dbm {}

impl Hash for Dbm {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.dim.hash(state);
        if self.is_empty() {
            Bound::LT_ZERO.hash(state);
        } else {
            self.bounds.hash(state);
        }
    }
}

impl fmt::Debug for Dbm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

/// Prints the non-trivial constraints, e.g. `(0<=x1 & x1<3 & x2-x1<=0)`.
impl fmt::Display for Dbm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "false");
        }
        let mut parts = Vec::new();
        for i in 0..self.dim {
            for j in 0..self.dim {
                let b = self.get(i, j);
                if i == j || b.is_infinity() {
                    continue;
                }
                let part = match (i, j) {
                    (0, _) => format!("{}{}x{}", -b.value(), b.comparator(), j),
                    (_, 0) => format!("x{}{}", i, b),
                    _ => format!("x{}-x{}{}", i, j, b),
                };
                parts.push(part);
            }
        }
        if parts.is_empty() {
            write!(f, "true")
        } else {
            write!(f, "({})", parts.join(" & "))
        }
    }
}
