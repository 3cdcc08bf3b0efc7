//! Synchronized product of a network of processes.
//!
//! [`SyncProdSystem`] wraps a [`System`] and enumerates, from a tuple of
//! locations, the tuples of edges that may fire together (vedges). Edges
//! whose `(process, event)` pair occurs in no synchronization are indexed
//! per location so that they can be enumerated without looking at the
//! synchronizations at all.

use crate::error::SystemResult;
use crate::intvars::guards_satisfiable;
use crate::system::{
    EdgeAttrs, EdgeId, EventId, LocationAttrs, LocationId, ProcessId, SyncStrength, System,
    SystemBuilder,
};
use ahash::AHashMap;
use smallvec::{smallvec, SmallVec};
use std::collections::VecDeque;
use tacov_dbm::Dbm;
use tracing::debug;

/// Tuple of edges fired together, sorted by process.
pub type VEdge = SmallVec<[EdgeId; 4]>;

/// Tuple of locations, indexed by process.
pub type VLoc = Vec<LocationId>;

#[derive(Debug, Clone)]
pub struct SyncProdSystem {
    system: System,
    /// `pid * events + event` -> no synchronization mentions the pair.
    asynchronous: Vec<bool>,
    async_outgoing: Vec<Vec<EdgeId>>,
    async_incoming: Vec<Vec<EdgeId>>,
}

impl SyncProdSystem {
    pub fn new(system: System) -> Self {
        let mut sp = Self {
            system,
            asynchronous: Vec::new(),
            async_outgoing: Vec::new(),
            async_incoming: Vec::new(),
        };
        sp.extract_asynchronous_edges();
        sp
    }

    pub fn system(&self) -> &System {
        &self.system
    }

    pub fn into_system(self) -> System {
        self.system
    }

    #[inline]
    fn async_index(&self, pid: ProcessId, event: EventId) -> usize {
        pid * self.system.events_count() + event
    }

    /// True iff `(edge.pid, edge.event)` occurs in no synchronization.
    #[inline]
    pub fn is_asynchronous(&self, edge: EdgeId) -> bool {
        let e = self.system.edge(edge);
        self.asynchronous[self.async_index(e.pid, e.event)]
    }

    /// Rebuild the asynchronous membership table and the per-location
    /// asynchronous edge indexes.
    fn extract_asynchronous_edges(&mut self) {
        let nevents = self.system.events_count();
        self.asynchronous = vec![true; self.system.processes_count() * nevents];
        for sync in self.system.synchronizations() {
            for c in &sync.constraints {
                self.asynchronous[c.pid * nevents + c.event] = false;
            }
        }

        let nlocs = self.system.locations_count();
        self.async_outgoing = vec![Vec::new(); nlocs];
        self.async_incoming = vec![Vec::new(); nlocs];
        let mut count = 0usize;
        for e in self.system.edges() {
            if self.asynchronous[e.pid * nevents + e.event] {
                self.async_outgoing[e.src].push(e.id);
                self.async_incoming[e.tgt].push(e.id);
                count += 1;
            }
        }
        debug!(
            asynchronous = count,
            edges = self.system.edges_count(),
            "asynchronous edges extracted"
        );
    }

    pub fn asynchronous_outgoing_edges(&self, loc: LocationId) -> &[EdgeId] {
        &self.async_outgoing[loc]
    }

    pub fn asynchronous_incoming_edges(&self, loc: LocationId) -> &[EdgeId] {
        &self.async_incoming[loc]
    }

    /// Initial location tuples in lexicographic order. Empty if some process
    /// has no initial location.
    pub fn initial_vlocs(&self) -> Vec<VLoc> {
        let per_process: Vec<&[LocationId]> = (0..self.system.processes_count())
            .map(|pid| self.system.initial_locations(pid))
            .collect();
        cartesian(&per_process)
            .into_iter()
            .map(|t| t.into_vec())
            .collect()
    }

    /// Vedges leaving `vloc`: enabled synchronizations first, then
    /// asynchronous edges by process then declaration order.
    pub fn outgoing_vedges(&self, vloc: &[LocationId]) -> Vec<VEdge> {
        self.vedges(
            vloc,
            |l, ev| self.system.outgoing_event(l, ev),
            |l| self.asynchronous_outgoing_edges(l),
        )
    }

    /// Vedges entering `vloc`, enumerated as for [`Self::outgoing_vedges`].
    pub fn incoming_vedges(&self, vloc: &[LocationId]) -> Vec<VEdge> {
        self.vedges(
            vloc,
            |l, ev| self.system.incoming_event(l, ev),
            |l| self.asynchronous_incoming_edges(l),
        )
    }

    fn vedges<'a>(
        &'a self,
        vloc: &[LocationId],
        by_event: impl Fn(LocationId, EventId) -> &'a [EdgeId],
        asynchronous: impl Fn(LocationId) -> &'a [EdgeId],
    ) -> Vec<VEdge> {
        let mut out = Vec::new();
        for sync in self.system.synchronizations() {
            let mut choices: SmallVec<[&[EdgeId]; 4]> = SmallVec::new();
            let mut enabled = true;
            for c in &sync.constraints {
                let edges = by_event(vloc[c.pid], c.event);
                if !edges.is_empty() {
                    choices.push(edges);
                } else if c.strength == SyncStrength::Strong {
                    enabled = false;
                    break;
                }
            }
            // all constraints weak and disabled
            if !enabled || choices.is_empty() {
                continue;
            }
            for mut vedge in cartesian(&choices) {
                vedge.sort_by_key(|&e| self.system.edge(e).pid);
                out.push(vedge);
            }
        }
        for &loc in vloc {
            for &e in asynchronous(loc) {
                out.push(smallvec![e]);
            }
        }
        out
    }

    /// From a tuple with a committed location, only vedges moving at least
    /// one committed process may fire.
    pub fn is_compatible(&self, vloc: &[LocationId], vedge: &[EdgeId]) -> bool {
        if !self.system.is_committed(vloc) {
            return true;
        }
        vedge
            .iter()
            .any(|&e| self.system.location(self.system.edge(e).src).committed)
    }

    /// Location tuple reached by firing `vedge` from `vloc`.
    pub fn target_vloc(&self, vloc: &[LocationId], vedge: &[EdgeId]) -> VLoc {
        let mut tgt = vloc.to_vec();
        for &e in vedge {
            let edge = self.system.edge(e);
            tgt[edge.pid] = edge.tgt;
        }
        tgt
    }

    /// Source tuple of a vedge entering `vloc`.
    pub fn source_vloc(&self, vloc: &[LocationId], vedge: &[EdgeId]) -> VLoc {
        let mut src = vloc.to_vec();
        for &e in vedge {
            let edge = self.system.edge(e);
            src[edge.pid] = edge.src;
        }
        src
    }

    /// Conjunction of guards, union of resets and updates of `vedge`, in
    /// process order. A reset shared by several components appears once.
    pub fn vedge_attrs(&self, vedge: &[EdgeId]) -> EdgeAttrs {
        let mut attrs = EdgeAttrs::default();
        for &e in vedge {
            let edge = self.system.edge(e);
            attrs.guard.extend_from_slice(&edge.guard);
            for r in &edge.resets {
                if !attrs.resets.contains(r) {
                    attrs.resets.push(*r);
                }
            }
            attrs.int_guard.extend_from_slice(&edge.int_guard);
            attrs.int_updates.extend_from_slice(&edge.int_updates);
        }
        attrs
    }

    pub fn vloc_name(&self, vloc: &[LocationId], separator: &str) -> String {
        join(vloc.iter().map(|&l| self.system.location(l).name.as_str()), separator)
    }

    pub fn vedge_name(&self, vedge: &[EdgeId], separator: &str) -> String {
        join(
            vedge
                .iter()
                .map(|&e| self.system.event_name(self.system.edge(e).event)),
            separator,
        )
    }

    /// Flatten the network into a single process named `process_name`.
    ///
    /// Only location tuples reachable from the initial tuples are built.
    /// Product locations and events are named by joining component names
    /// with `separator`. Vedges whose combined guards are unsatisfiable are
    /// not emitted.
    pub fn synchronized_product(
        &self,
        process_name: &str,
        separator: &str,
    ) -> SystemResult<System> {
        let sys = &self.system;
        let mut b = SystemBuilder::new(sys.name());
        let pid = b.add_process(process_name);
        for c in 1..sys.dim() {
            b.add_clock(sys.clock_name(c));
        }
        for v in sys.intvars() {
            b.add_intvar(v.name.clone(), v.min, v.max, v.initial);
        }
        for label in 0..sys.labels_count() {
            b.add_label(sys.label_name(label));
        }

        let mut locations: AHashMap<VLoc, LocationId> = AHashMap::new();
        let mut events: AHashMap<String, EventId> = AHashMap::new();
        let mut queue: VecDeque<(VLoc, LocationId)> = VecDeque::new();

        let mut intern = |b: &mut SystemBuilder,
                          queue: &mut VecDeque<(VLoc, LocationId)>,
                          vloc: VLoc,
                          initial: bool|
         -> LocationId {
            if let Some(&id) = locations.get(&vloc) {
                return id;
            }
            let name = self.vloc_name(&vloc, separator);
            let id = b.add_location(pid, name, self.vloc_attrs(&vloc, initial));
            locations.insert(vloc.clone(), id);
            queue.push_back((vloc, id));
            id
        };

        for vloc in self.initial_vlocs() {
            intern(&mut b, &mut queue, vloc, true);
        }

        let mut emitted = 0usize;
        let mut pruned = 0usize;
        while let Some((vloc, src)) = queue.pop_front() {
            for vedge in self.outgoing_vedges(&vloc) {
                if !self.is_compatible(&vloc, &vedge) {
                    continue;
                }
                let attrs = self.vedge_attrs(&vedge);
                if !self.satisfiable(&attrs) {
                    pruned += 1;
                    continue;
                }
                let tgt = intern(&mut b, &mut queue, self.target_vloc(&vloc, &vedge), false);
                let name = self.vedge_name(&vedge, separator);
                let event = match events.get(&name) {
                    Some(&ev) => ev,
                    None => {
                        let ev = b.add_event(name.clone());
                        events.insert(name, ev);
                        ev
                    }
                };
                b.add_edge(pid, src, tgt, event, attrs);
                emitted += 1;
            }
        }

        debug!(
            process = process_name,
            edges = emitted,
            pruned,
            "synchronized product built"
        );
        b.build()
    }

    fn vloc_attrs(&self, vloc: &[LocationId], initial: bool) -> LocationAttrs {
        let mut labels: Vec<_> = vloc
            .iter()
            .flat_map(|&l| self.system.location(l).labels.iter().copied())
            .collect();
        labels.sort_unstable();
        labels.dedup();
        LocationAttrs {
            initial,
            committed: self.system.is_committed(vloc),
            urgent: vloc.iter().any(|&l| self.system.location(l).urgent),
            invariant: self.system.invariant(vloc),
            labels,
        }
    }

    fn satisfiable(&self, attrs: &EdgeAttrs) -> bool {
        let mut zone = Dbm::universal_positive(self.system.dim());
        !zone.constrain(&attrs.guard).is_empty()
            && guards_satisfiable(self.system.intvars(), &attrs.int_guard)
    }
}

/// Cartesian product in lexicographic order (last component varies
/// fastest).
fn cartesian<T: Copy>(choices: &[&[T]]) -> Vec<SmallVec<[T; 4]>> {
    if choices.iter().any(|c| c.is_empty()) {
        return Vec::new();
    }
    let mut out = Vec::new();
    let mut idx = vec![0usize; choices.len()];
    loop {
        out.push(choices.iter().zip(&idx).map(|(c, &i)| c[i]).collect());
        let mut k = choices.len();
        loop {
            if k == 0 {
                return out;
            }
            k -= 1;
            idx[k] += 1;
            if idx[k] < choices[k].len() {
                break;
            }
            idx[k] = 0;
        }
    }
}

fn join<'a>(parts: impl Iterator<Item = &'a str>, separator: &str) -> String {
    parts.collect::<Vec<_>>().join(separator)
}
