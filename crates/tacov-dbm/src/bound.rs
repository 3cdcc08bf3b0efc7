//! Difference bounds `(value, strictness)` with a single-integer encoding.

use std::fmt;
use std::ops::Add;

/// Bound on a clock difference: `x_i - x_j < value` or `x_i - x_j <= value`.
///
/// Encoded as `2 * value + 1` for non-strict bounds and `2 * value` for strict
/// ones, so that the natural integer order is the tightness order: for equal
/// values `<` is tighter than `<=`. `INFINITY` stands for "no constraint".
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Bound(i64);

/// Strictness of a bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparator {
    /// `<`
    Lt,
    /// `<=`
    Le,
}

impl Bound {
    /// No constraint (`< +inf`).
    pub const INFINITY: Bound = Bound(i64::MAX);
    /// `<= 0`, the diagonal of every non-empty DBM.
    pub const LE_ZERO: Bound = Bound(1);
    /// `< 0`, used to flag empty DBMs.
    pub const LT_ZERO: Bound = Bound(0);

    #[inline]
    pub fn new(cmp: Comparator, value: i32) -> Self {
        let v = (value as i64) << 1;
        match cmp {
            Comparator::Lt => Bound(v),
            Comparator::Le => Bound(v | 1),
        }
    }

    #[inline]
    pub fn le(value: i32) -> Self {
        Self::new(Comparator::Le, value)
    }

    #[inline]
    pub fn lt(value: i32) -> Self {
        Self::new(Comparator::Lt, value)
    }

    #[inline]
    pub fn is_infinity(self) -> bool {
        self == Bound::INFINITY
    }

    /// Value of the bound. Meaningless for `INFINITY`.
    #[inline]
    pub fn value(self) -> i64 {
        self.0 >> 1
    }

    #[inline]
    pub fn comparator(self) -> Comparator {
        if self.0 & 1 == 1 {
            Comparator::Le
        } else {
            Comparator::Lt
        }
    }

    #[inline]
    pub fn is_strict(self) -> bool {
        self.comparator() == Comparator::Lt
    }

    /// Shift the value by `k`, keeping the strictness. Infinity is absorbing.
    #[inline]
    pub fn shift(self, k: i64) -> Bound {
        if self.is_infinity() {
            return Bound::INFINITY;
        }
        Bound(((self.value() + k) << 1) | (self.0 & 1))
    }

    /// Raw encoded representation, used for hashing.
    #[inline]
    pub fn raw(self) -> i64 {
        self.0
    }
}

/// Sum of two bounds: values add, the result is non-strict iff both are.
impl Add for Bound {
    type Output = Bound;

    #[inline]
    fn add(self, other: Bound) -> Bound {
        if self.is_infinity() || other.is_infinity() {
            return Bound::INFINITY;
        }
        let value = self.value() + other.value();
        Bound((value << 1) | (self.0 & other.0 & 1))
    }
}

impl fmt::Debug for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_infinity() {
            return write!(f, "<inf");
        }
        match self.comparator() {
            Comparator::Lt => write!(f, "<{}", self.value()),
            Comparator::Le => write!(f, "<={}", self.value()),
        }
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Comparator::Lt => write!(f, "<"),
            Comparator::Le => write!(f, "<="),
        }
    }
}
