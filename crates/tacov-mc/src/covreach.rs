//! Covering reachability search.
//!
//! Workers share one visited index and one filtered waiting container.
//! A popped node is visited, checked against the accepting predicate and
//! expanded along every outgoing vedge. A successor is stored unless a
//! sibling or a stored node covers it; stored nodes it covers are
//! deactivated and dropped from the waiting container when they reach its
//! front.

use crate::graph::{CoverGraph, EdgeKind, ExploredGraph, InsertOutcome};
use crate::state::Node;
use crate::stats::Stats;
use crate::waiting::{Fifo, Filter, Lifo, Waiting};
use crate::zg::ZoneGraph;
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Instant;
use tacov_dbm::{Extrapolation, ZoneSemantics};
use tacov_system::SyncProdSystem;
use thiserror::Error;
use tracing::{debug, info, trace};

/// Order in which waiting nodes are explored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchOrder {
    #[default]
    Bfs,
    Dfs,
}

/// Search configuration.
#[derive(Debug, Clone)]
pub struct CovreachConfig {
    pub search_order: SearchOrder,
    /// Whether stored zones are time-elapsed.
    pub semantics: ZoneSemantics,
    /// Abstraction applied to every computed zone.
    pub extrapolation: Extrapolation,
    /// Number of worker threads (0 = use all available).
    pub num_threads: usize,
    /// Keep the explored graph and return it in the report.
    pub record_graph: bool,
}

impl Default for CovreachConfig {
    fn default() -> Self {
        Self {
            search_order: SearchOrder::Bfs,
            semantics: ZoneSemantics::Elapsed,
            extrapolation: Extrapolation::ExtraLuPlus,
            num_threads: 1,
            record_graph: false,
        }
    }
}

#[derive(Debug, Error)]
pub enum CovreachError {
    #[error("extrapolation {0:?} is unsound with diagonal clock constraints")]
    DiagonalConstraints(Extrapolation),

    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

pub type CovreachResult<T> = Result<T, CovreachError>;

#[derive(Debug, Clone)]
pub enum Verdict {
    /// An accepting node was visited.
    Reachable { witness: Arc<Node> },
    /// The waiting container ran dry without visiting an accepting node.
    Unreachable,
    /// The external stop flag was raised first.
    Interrupted,
}

impl Verdict {
    pub fn is_reachable(&self) -> bool {
        matches!(self, Verdict::Reachable { .. })
    }
}

#[derive(Debug, Clone)]
pub struct CovreachReport {
    pub verdict: Verdict,
    pub stats: Stats,
    /// Nodes left in the visited index.
    pub stored_nodes: usize,
    /// Present iff `record_graph` was set.
    pub graph: Option<ExploredGraph>,
}

type NodeFilter = fn(&Arc<Node>) -> bool;
type BoxedWaiting = Box<dyn Waiting<Arc<Node>> + Send>;

fn is_active(node: &Arc<Node>) -> bool {
    node.is_active()
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

struct Frontier {
    waiting: Filter<BoxedWaiting, NodeFilter>,
    /// Nodes popped and not yet fully expanded.
    in_flight: usize,
}

enum Pop {
    Node(Arc<Node>),
    Done,
}

/// State shared by the workers of one run.
struct Search<'s, 'a> {
    zg: &'s ZoneGraph<'a>,
    graph: &'s CoverGraph,
    frontier: Mutex<Frontier>,
    /// Signalled whenever a worker hands its expansion back.
    pushed: Condvar,
    accepting: &'s (dyn Fn(&Node) -> bool + Sync),
    found: AtomicBool,
    witness: Mutex<Option<Arc<Node>>>,
    external_stop: Option<&'s AtomicBool>,
}

impl Search<'_, '_> {
    fn should_stop(&self) -> bool {
        self.found.load(Ordering::Acquire)
            || self
                .external_stop
                .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    /// Block until a node is available or no worker can produce one.
    fn pop(&self) -> Pop {
        let mut f = lock(&self.frontier);
        loop {
            if self.should_stop() {
                return Pop::Done;
            }
            if !f.waiting.is_empty() {
                if let Some(node) = f.waiting.remove_first() {
                    f.in_flight += 1;
                    return Pop::Node(node);
                }
            }
            if f.in_flight == 0 {
                return Pop::Done;
            }
            f = self
                .pushed
                .wait(f)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    fn push(&self, batch: Vec<Arc<Node>>) {
        let mut f = lock(&self.frontier);
        for node in batch {
            f.waiting.insert(node);
        }
        f.in_flight -= 1;
        drop(f);
        self.pushed.notify_all();
    }

    fn worker(&self) -> Stats {
        let mut stats = Stats::new();
        while !self.should_stop() {
            match self.pop() {
                Pop::Node(node) => {
                    let batch = self.expand(&node, &mut stats);
                    self.push(batch);
                }
                Pop::Done => break,
            }
        }
        stats
    }

    fn accept(&self, node: &Arc<Node>) {
        if !self.found.swap(true, Ordering::AcqRel) {
            debug!(node = %node, "accepting node");
            *lock(&self.witness) = Some(Arc::clone(node));
        }
    }

    /// Visit `node` and return its stored successors in vedge order.
    fn expand(&self, node: &Arc<Node>, stats: &mut Stats) -> Vec<Arc<Node>> {
        if !node.is_active() {
            trace!(id = node.id(), "skipping covered node");
            return Vec::new();
        }
        stats.increment_visited_nodes();
        trace!(node = %node, "visit");
        if (self.accepting)(node) {
            self.accept(node);
            return Vec::new();
        }

        let mut batch: Vec<Arc<Node>> = Vec::new();
        for vedge in self.zg.sync_prod().outgoing_vedges(node.vloc()) {
            if self.should_stop() {
                return Vec::new();
            }
            let (discrete, zone) = match self.zg.next(node, &vedge) {
                Ok(succ) => succ,
                Err(status) => {
                    trace!(id = node.id(), %status, "no successor");
                    continue;
                }
            };

            if let Some(sibling) = batch
                .iter()
                .find(|s| s.is_active() && *s.discrete() == discrete && zone.is_le(s.zone()))
            {
                stats.increment_covered_leaf_nodes();
                stats.increment_directly_covered_leaf_nodes();
                self.graph
                    .record_edge(node.id(), sibling.id(), EdgeKind::Abstract);
                continue;
            }

            match self.graph.insert_or_cover(discrete, zone) {
                InsertOutcome::Covered(by) => {
                    stats.increment_covered_leaf_nodes();
                    self.graph.record_edge(node.id(), by.id(), EdgeKind::Abstract);
                }
                InsertOutcome::Inserted { node: succ, covered } => {
                    for old in &covered {
                        debug!(covered = old.id(), by = succ.id(), "stored node covered");
                        stats.increment_covered_nonleaf_nodes();
                    }
                    self.graph.record_edge(node.id(), succ.id(), EdgeKind::Actual);
                    batch.push(succ);
                }
            }
        }
        batch
    }
}

/// Covering reachability over the zone graph of a synchronized product.
pub struct Covreach<'a> {
    sp: &'a SyncProdSystem,
    config: CovreachConfig,
    stop_flag: Option<Arc<AtomicBool>>,
}

impl<'a> Covreach<'a> {
    pub fn new(sp: &'a SyncProdSystem, config: CovreachConfig) -> CovreachResult<Self> {
        if config.extrapolation != Extrapolation::None && sp.system().has_diagonal_constraints() {
            return Err(CovreachError::DiagonalConstraints(config.extrapolation));
        }
        debug!(
            system = sp.system().name(),
            order = ?config.search_order,
            semantics = ?config.semantics,
            extrapolation = ?config.extrapolation,
            "covreach configured"
        );
        Ok(Self {
            sp,
            config,
            stop_flag: None,
        })
    }

    pub fn config(&self) -> &CovreachConfig {
        &self.config
    }

    /// Install a flag that, once raised, stops the search at the next step.
    pub fn set_stop_flag(&mut self, flag: Arc<AtomicBool>) {
        self.stop_flag = Some(flag);
    }

    /// Search for a node satisfying `accepting`.
    pub fn run<F>(&self, accepting: F) -> CovreachResult<CovreachReport>
    where
        F: Fn(&Node) -> bool + Sync,
    {
        let start = Instant::now();
        let zg = ZoneGraph::new(self.sp, self.config.semantics, self.config.extrapolation);
        let graph = CoverGraph::new(self.config.record_graph);

        let base: BoxedWaiting = match self.config.search_order {
            SearchOrder::Bfs => Box::new(Fifo::new()),
            SearchOrder::Dfs => Box::new(Lifo::new()),
        };
        let mut waiting = Filter::new(base, is_active as NodeFilter);

        let initial = zg.initial_states();
        if initial.is_empty() {
            info!("no initial state");
            return Ok(CovreachReport {
                verdict: Verdict::Unreachable,
                stats: Stats::new(),
                stored_nodes: 0,
                graph: graph.export(),
            });
        }
        for (discrete, zone) in initial {
            if let InsertOutcome::Inserted { node, .. } = graph.insert_or_cover(discrete, zone) {
                waiting.insert(node);
            }
        }

        let threads = if self.config.num_threads > 0 {
            self.config.num_threads
        } else {
            rayon::current_num_threads()
        };
        info!(
            system = self.sp.system().name(),
            threads,
            order = ?self.config.search_order,
            "starting covering reachability"
        );

        let search = Search {
            zg: &zg,
            graph: &graph,
            frontier: Mutex::new(Frontier {
                waiting,
                in_flight: 0,
            }),
            pushed: Condvar::new(),
            accepting: &accepting,
            found: AtomicBool::new(false),
            witness: Mutex::new(None),
            external_stop: self.stop_flag.as_deref(),
        };

        let stats: Stats = if threads == 1 {
            search.worker()
        } else {
            let pool = rayon::ThreadPoolBuilder::new().num_threads(threads).build()?;
            pool.install(|| {
                (0..threads)
                    .into_par_iter()
                    .map(|_| search.worker())
                    .collect::<Vec<Stats>>()
            })
            .into_iter()
            .sum()
        };

        let witness = lock(&search.witness).take();
        let verdict = match witness {
            Some(witness) => Verdict::Reachable { witness },
            None if search.should_stop() => Verdict::Interrupted,
            None => Verdict::Unreachable,
        };
        let stored_nodes = graph.len();
        info!(
            reachable = verdict.is_reachable(),
            visited = stats.visited_nodes(),
            stored = stored_nodes,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "covering reachability finished"
        );
        Ok(CovreachReport {
            verdict,
            stats,
            stored_nodes,
            graph: graph.export(),
        })
    }
}
