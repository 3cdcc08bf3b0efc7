//! Zone graph: initial states and successors of the synchronized product
//! under a zone semantics and an extrapolation.

use crate::state::{DiscreteState, Node};
use tacov_dbm::{ClockBounds, Dbm, Extrapolation, StateStatus, ZoneSemantics, ZoneTransition};
use tacov_system::intvars::{apply_updates, guards_hold};
use tacov_system::{compute_clock_bounds, EdgeId, LabelId, LocationId, SyncProdSystem, System, VLoc};
use tracing::{trace, warn};

pub struct ZoneGraph<'a> {
    sp: &'a SyncProdSystem,
    semantics: ZoneSemantics,
    extrapolation: Extrapolation,
    bounds: ClockBounds,
}

impl<'a> ZoneGraph<'a> {
    pub fn new(sp: &'a SyncProdSystem, semantics: ZoneSemantics, extrapolation: Extrapolation) -> Self {
        Self {
            sp,
            semantics,
            extrapolation,
            bounds: compute_clock_bounds(sp.system()),
        }
    }

    pub fn system(&self) -> &'a System {
        self.sp.system()
    }

    pub fn sync_prod(&self) -> &'a SyncProdSystem {
        self.sp
    }

    pub fn clock_bounds(&self) -> &ClockBounds {
        &self.bounds
    }

    /// One state per initial location tuple whose initial zone is
    /// non-empty, in tuple order.
    pub fn initial_states(&self) -> Vec<(DiscreteState, Dbm)> {
        let system = self.system();
        let intval = system.initial_intval();
        let mut out = Vec::new();
        for vloc in self.sp.initial_vlocs() {
            let mut zone = Dbm::zero(system.dim());
            let status = self.semantics.initialize(
                &mut zone,
                system.delay_allowed(&vloc),
                &system.invariant(&vloc),
            );
            if !status.is_ok() {
                trace!(?vloc, %status, "initial state dropped");
                continue;
            }
            self.extrapolation.extrapolate(&mut zone, &self.bounds);
            out.push((DiscreteState::new(vloc, intval.clone()), zone));
        }
        out
    }

    /// Successor of `node` along `vedge`, extrapolated. Any status other
    /// than `Ok` means there is no successor.
    pub fn next(&self, node: &Node, vedge: &[EdgeId]) -> Result<(DiscreteState, Dbm), StateStatus> {
        let system = self.system();
        let src = node.vloc();
        if !self.sp.is_compatible(src, vedge) {
            return Err(StateStatus::IncompatibleEdge);
        }
        let attrs = self.sp.vedge_attrs(vedge);
        if !guards_hold(&attrs.int_guard, node.intval()) {
            return Err(StateStatus::IntGuardViolated);
        }
        let mut intval = node.intval().to_vec();
        if !apply_updates(system.intvars(), &attrs.int_updates, &mut intval) {
            return Err(StateStatus::IntStatementFailed);
        }
        let tgt = self.sp.target_vloc(src, vedge);

        let src_invariant = system.invariant(src);
        let tgt_invariant = system.invariant(&tgt);
        let transition = ZoneTransition {
            src_delay_allowed: system.delay_allowed(src),
            src_invariant: &src_invariant,
            guard: &attrs.guard,
            resets: &attrs.resets,
            tgt_delay_allowed: system.delay_allowed(&tgt),
            tgt_invariant: &tgt_invariant,
        };
        let mut zone = node.zone().clone();
        match self.semantics.next(&mut zone, &transition) {
            StateStatus::Ok => {}
            status => return Err(status),
        }
        self.extrapolation.extrapolate(&mut zone, &self.bounds);
        Ok((DiscreteState::new(tgt, intval), zone))
    }

    /// Clock predecessor of `zone` at `vloc` along an incoming `vedge`.
    /// Integer updates are not inverted and extrapolation is not applied.
    pub fn prev_zone(
        &self,
        vloc: &[LocationId],
        zone: &Dbm,
        vedge: &[EdgeId],
    ) -> Result<(VLoc, Dbm), StateStatus> {
        let system = self.system();
        let src = self.sp.source_vloc(vloc, vedge);
        if !self.sp.is_compatible(&src, vedge) {
            return Err(StateStatus::IncompatibleEdge);
        }
        let attrs = self.sp.vedge_attrs(vedge);
        let src_invariant = system.invariant(&src);
        let tgt_invariant = system.invariant(vloc);
        let transition = ZoneTransition {
            src_delay_allowed: system.delay_allowed(&src),
            src_invariant: &src_invariant,
            guard: &attrs.guard,
            resets: &attrs.resets,
            tgt_delay_allowed: system.delay_allowed(vloc),
            tgt_invariant: &tgt_invariant,
        };
        let mut pre = zone.clone();
        match self.semantics.prev(&mut pre, &transition) {
            StateStatus::Ok => Ok((src, pre)),
            status => Err(status),
        }
    }
}

/// Accepting predicate: every requested label appears on some location of
/// the node's location tuple.
///
/// An empty request or a label unknown to the system never matches.
#[derive(Debug, Clone)]
pub struct AcceptingLabels<'a> {
    system: &'a System,
    labels: Vec<LabelId>,
    satisfiable: bool,
}

impl<'a> AcceptingLabels<'a> {
    pub fn new<S: AsRef<str>>(system: &'a System, names: &[S]) -> Self {
        let mut labels = Vec::with_capacity(names.len());
        let mut satisfiable = !names.is_empty();
        for name in names {
            let name = name.as_ref();
            match system.label_id(name) {
                Some(id) => labels.push(id),
                None => {
                    warn!(label = name, "unknown accepting label, the search cannot accept");
                    satisfiable = false;
                }
            }
        }
        Self {
            system,
            labels,
            satisfiable,
        }
    }

    pub fn matches(&self, node: &Node) -> bool {
        self.satisfiable
            && self.labels.iter().all(|label| {
                node.vloc()
                    .iter()
                    .any(|&loc| self.system.location(loc).labels.contains(label))
            })
    }
}
