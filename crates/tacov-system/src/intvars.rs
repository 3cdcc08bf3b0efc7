//! Bounded integer variables, guards over them and updates.

use serde::{Deserialize, Serialize};
use std::fmt;

pub type IntVarId = usize;

/// Integer variable with domain `min..=max`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntVar {
    pub name: String,
    pub min: i64,
    pub max: i64,
    pub initial: i64,
}

impl IntVar {
    #[inline]
    pub fn contains(&self, v: i64) -> bool {
        self.min <= v && v <= self.max
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IntCmp {
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = ">")]
    Gt,
}

impl IntCmp {
    #[inline]
    pub fn holds(self, lhs: i64, rhs: i64) -> bool {
        match self {
            IntCmp::Lt => lhs < rhs,
            IntCmp::Le => lhs <= rhs,
            IntCmp::Eq => lhs == rhs,
            IntCmp::Ne => lhs != rhs,
            IntCmp::Ge => lhs >= rhs,
            IntCmp::Gt => lhs > rhs,
        }
    }
}

impl fmt::Display for IntCmp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            IntCmp::Lt => "<",
            IntCmp::Le => "<=",
            IntCmp::Eq => "==",
            IntCmp::Ne => "!=",
            IntCmp::Ge => ">=",
            IntCmp::Gt => ">",
        };
        f.write_str(s)
    }
}

/// Atomic guard `var cmp value`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IntGuard {
    pub var: IntVarId,
    pub cmp: IntCmp,
    pub value: i64,
}

impl IntGuard {
    #[inline]
    pub fn holds(&self, vals: &[i64]) -> bool {
        self.cmp.holds(vals[self.var], self.value)
    }
}

/// Update `var := source + offset`, or `var := offset` without a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IntUpdate {
    pub var: IntVarId,
    pub source: Option<IntVarId>,
    pub offset: i64,
}

impl IntUpdate {
    pub fn constant(var: IntVarId, value: i64) -> Self {
        Self {
            var,
            source: None,
            offset: value,
        }
    }

    #[inline]
    fn value(&self, vals: &[i64]) -> i64 {
        match self.source {
            Some(src) => vals[src].saturating_add(self.offset),
            None => self.offset,
        }
    }
}

impl fmt::Display for IntUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.source {
            Some(src) => write!(f, "i{} := i{} + {}", self.var, src, self.offset),
            None => write!(f, "i{} := {}", self.var, self.offset),
        }
    }
}

/// Conjunction of guards.
pub fn guards_hold(guards: &[IntGuard], vals: &[i64]) -> bool {
    guards.iter().all(|g| g.holds(vals))
}

/// Apply updates in order, each one reading the values left by the
/// previous ones. Returns false, with `vals` partially updated, as soon as a
/// variable leaves its domain.
pub fn apply_updates(vars: &[IntVar], updates: &[IntUpdate], vals: &mut [i64]) -> bool {
    for u in updates {
        let v = u.value(vals);
        if !vars[u.var].contains(v) {
            return false;
        }
        vals[u.var] = v;
    }
    true
}

/// True if some valuation within the domains satisfies all guards.
///
/// Guards are atomic per variable, so this is an interval check with a set
/// of excluded points per variable.
pub fn guards_satisfiable(vars: &[IntVar], guards: &[IntGuard]) -> bool {
    (0..vars.len()).all(|id| {
        let mut lo = vars[id].min;
        let mut hi = vars[id].max;
        let mut excluded = Vec::new();
        for g in guards.iter().filter(|g| g.var == id) {
            match g.cmp {
                IntCmp::Lt => hi = hi.min(g.value.saturating_sub(1)),
                IntCmp::Le => hi = hi.min(g.value),
                IntCmp::Eq => {
                    lo = lo.max(g.value);
                    hi = hi.min(g.value);
                }
                IntCmp::Ne => excluded.push(g.value),
                IntCmp::Ge => lo = lo.max(g.value),
                IntCmp::Gt => lo = lo.max(g.value.saturating_add(1)),
            }
        }
        if lo > hi {
            return false;
        }
        excluded.sort_unstable();
        excluded.dedup();
        let hits = excluded.iter().filter(|&&v| lo <= v && v <= hi).count() as i128;
        (hi as i128 - lo as i128 + 1) > hits
    })
}
