//! Search statistics.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};

/// Counters of one search, or of one worker of a parallel search.
/// Combined by pointwise addition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    visited_nodes: u64,
    covered_leaf_nodes: u64,
    covered_nonleaf_nodes: u64,
    directly_covered_leaf_nodes: u64,
}

impl Stats {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn increment_visited_nodes(&mut self) {
        self.visited_nodes += 1;
    }

    /// A successor dropped because a stored node covers it.
    #[inline]
    pub fn increment_covered_leaf_nodes(&mut self) {
        self.covered_leaf_nodes += 1;
    }

    /// A stored node removed because a new successor covers it.
    #[inline]
    pub fn increment_covered_nonleaf_nodes(&mut self) {
        self.covered_nonleaf_nodes += 1;
    }

    /// A successor dropped because a sibling covers it.
    #[inline]
    pub fn increment_directly_covered_leaf_nodes(&mut self) {
        self.directly_covered_leaf_nodes += 1;
    }

    pub fn visited_nodes(&self) -> u64 {
        self.visited_nodes
    }

    pub fn covered_leaf_nodes(&self) -> u64 {
        self.covered_leaf_nodes
    }

    pub fn covered_nonleaf_nodes(&self) -> u64 {
        self.covered_nonleaf_nodes
    }

    pub fn directly_covered_leaf_nodes(&self) -> u64 {
        self.directly_covered_leaf_nodes
    }
}

impl Add for Stats {
    type Output = Stats;

    fn add(mut self, other: Stats) -> Stats {
        self += other;
        self
    }
}

impl AddAssign for Stats {
    fn add_assign(&mut self, other: Stats) {
        self.visited_nodes += other.visited_nodes;
        self.covered_leaf_nodes += other.covered_leaf_nodes;
        self.covered_nonleaf_nodes += other.covered_nonleaf_nodes;
        self.directly_covered_leaf_nodes += other.directly_covered_leaf_nodes;
    }
}

impl Sum for Stats {
    fn sum<I: Iterator<Item = Stats>>(iter: I) -> Stats {
        iter.fold(Stats::default(), Add::add)
    }
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "visited_nodes={} covered_leaf_nodes={} covered_nonleaf_nodes={} directly_covered_leaf_nodes={}",
            self.visited_nodes,
            self.covered_leaf_nodes,
            self.covered_nonleaf_nodes,
            self.directly_covered_leaf_nodes
        )
    }
}
