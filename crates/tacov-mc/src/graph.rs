//! Visited index with covering, and the optional explored graph.

use crate::state::{DiscreteState, Node};
use dashmap::DashMap;
use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tacov_dbm::Dbm;
use tacov_system::LocationId;

type Buckets = DashMap<DiscreteState, Vec<Arc<Node>>, ahash::RandomState>;

/// Result of [`CoverGraph::insert_or_cover`].
#[derive(Debug)]
pub enum InsertOutcome {
    /// A stored node already covers the candidate; nothing was stored.
    Covered(Arc<Node>),
    /// The candidate was stored. Every node in `covered` was deactivated
    /// and removed from the index.
    Inserted {
        node: Arc<Node>,
        covered: Vec<Arc<Node>>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    /// A discrete step to a stored successor.
    Actual,
    /// The successor is covered: the edge points to the covering node.
    Abstract,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphEdge {
    pub src: usize,
    pub tgt: usize,
    pub kind: EdgeKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphNode {
    pub id: usize,
    pub vloc: Vec<LocationId>,
    pub intval: Vec<i64>,
    pub zone: String,
}

/// Nodes still stored at the end of the search, and the edges between them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExploredGraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

#[derive(Default)]
struct Recorder {
    nodes: Mutex<Vec<Arc<Node>>>,
    edges: Mutex<Vec<GraphEdge>>,
    covered_by: DashMap<usize, usize, ahash::RandomState>,
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Concurrent visited index keyed by discrete state.
///
/// Each bucket holds the active nodes of one discrete state, none of which
/// covers another. Checking and inserting happen under the bucket's shard
/// lock, so concurrent inserts into one bucket are linearized.
pub struct CoverGraph {
    buckets: Buckets,
    next_id: AtomicUsize,
    recorder: Option<Recorder>,
}

impl CoverGraph {
    pub fn new(record: bool) -> Self {
        Self {
            buckets: DashMap::with_hasher(ahash::RandomState::new()),
            next_id: AtomicUsize::new(0),
            recorder: record.then(Recorder::default),
        }
    }

    /// Store `zone` at `discrete` unless a stored node covers it.
    pub fn insert_or_cover(&self, discrete: DiscreteState, zone: Dbm) -> InsertOutcome {
        let mut bucket = self.buckets.entry(discrete.clone()).or_default();
        if let Some(by) = bucket.iter().find(|n| zone.is_le(n.zone())) {
            return InsertOutcome::Covered(Arc::clone(by));
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let node = Arc::new(Node::new(id, discrete, zone));
        let mut covered = Vec::new();
        bucket.retain(|n| {
            if n.zone().is_le(node.zone()) {
                n.deactivate();
                covered.push(Arc::clone(n));
                false
            } else {
                true
            }
        });
        bucket.push(Arc::clone(&node));
        drop(bucket);

        if let Some(rec) = &self.recorder {
            lock(&rec.nodes).push(Arc::clone(&node));
            for c in &covered {
                rec.covered_by.insert(c.id(), id);
            }
        }
        InsertOutcome::Inserted { node, covered }
    }

    /// Record an edge of the explored graph. No-op unless recording.
    pub fn record_edge(&self, src: usize, tgt: usize, kind: EdgeKind) {
        if let Some(rec) = &self.recorder {
            lock(&rec.edges).push(GraphEdge { src, tgt, kind });
        }
    }

    /// Number of stored (active) nodes.
    pub fn len(&self) -> usize {
        self.buckets.iter().map(|b| b.value().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_recording(&self) -> bool {
        self.recorder.is_some()
    }

    /// Explored graph restricted to the nodes still stored. Edges into a
    /// covered node are redirected to its final coverer and become
    /// abstract; edges out of a covered node are dropped.
    pub fn export(&self) -> Option<ExploredGraph> {
        let rec = self.recorder.as_ref()?;
        let resolve = |mut id: usize| {
            let mut redirected = false;
            while let Some(by) = rec.covered_by.get(&id).map(|r| *r.value()) {
                id = by;
                redirected = true;
            }
            (id, redirected)
        };

        let mut nodes: Vec<GraphNode> = lock(&rec.nodes)
            .iter()
            .filter(|n| n.is_active())
            .map(|n| GraphNode {
                id: n.id(),
                vloc: n.vloc().to_vec(),
                intval: n.intval().to_vec(),
                zone: n.zone().to_string(),
            })
            .collect();
        nodes.sort_by_key(|n| n.id);

        let edges = lock(&rec.edges)
            .iter()
            .filter(|e| !rec.covered_by.contains_key(&e.src))
            .map(|e| {
                let (tgt, redirected) = resolve(e.tgt);
                let kind = if redirected { EdgeKind::Abstract } else { e.kind };
                GraphEdge {
                    src: e.src,
                    tgt,
                    kind,
                }
            })
            .collect();

        Some(ExploredGraph { nodes, edges })
    }
}
