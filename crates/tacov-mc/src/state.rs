//! Search nodes: a discrete state plus a zone.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicBool, Ordering};
use tacov_dbm::Dbm;
use tacov_system::{LocationId, VLoc};

/// The part of a state compared for equality by the visited index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DiscreteState {
    pub vloc: VLoc,
    pub intval: Vec<i64>,
}

impl DiscreteState {
    pub fn new(vloc: VLoc, intval: Vec<i64>) -> Self {
        Self { vloc, intval }
    }

    /// 64-bit hash of the discrete state.
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = ahash::AHasher::default();
        self.hash(&mut hasher);
        hasher.finish()
    }
}

impl fmt::Display for DiscreteState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{:?}, {:?}>", self.vloc, self.intval)
    }
}

/// A node of the covering graph. Shared between the visited index and the
/// waiting container through `Arc`.
#[derive(Debug)]
pub struct Node {
    id: usize,
    discrete: DiscreteState,
    zone: Dbm,
    /// Cleared once the node is covered.
    active: AtomicBool,
}

impl Node {
    pub fn new(id: usize, discrete: DiscreteState, zone: Dbm) -> Self {
        Self {
            id,
            discrete,
            zone,
            active: AtomicBool::new(true),
        }
    }

    #[inline]
    pub fn id(&self) -> usize {
        self.id
    }

    #[inline]
    pub fn discrete(&self) -> &DiscreteState {
        &self.discrete
    }

    #[inline]
    pub fn vloc(&self) -> &[LocationId] {
        &self.discrete.vloc
    }

    #[inline]
    pub fn intval(&self) -> &[i64] {
        &self.discrete.intval
    }

    #[inline]
    pub fn zone(&self) -> &Dbm {
        &self.zone
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Returns true if this call deactivated the node.
    pub fn deactivate(&self) -> bool {
        self.active.swap(false, Ordering::AcqRel)
    }

    /// `self` is covered by `other`: same discrete part, smaller zone.
    pub fn is_le(&self, other: &Node) -> bool {
        self.discrete == other.discrete && self.zone.is_le(&other.zone)
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {} {}", self.id, self.discrete, self.zone)
    }
}
