//! Networks of timed processes: the id-based model consumed by the
//! synchronized product and the search.

use crate::error::{SystemError, SystemResult};
use crate::intvars::{IntGuard, IntUpdate, IntVar, IntVarId};
use ahash::{AHashMap, AHashSet};
use tacov_dbm::{ClockConstraint, ClockId, ClockReset, REFERENCE_CLOCK};
use tracing::debug;

pub type ProcessId = usize;
pub type LocationId = usize;
pub type EdgeId = usize;
pub type EventId = usize;
pub type LabelId = usize;
pub type SyncId = usize;

/// Location attributes set at creation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocationAttrs {
    pub initial: bool,
    pub committed: bool,
    pub urgent: bool,
    pub invariant: Vec<ClockConstraint>,
    pub labels: Vec<LabelId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub id: LocationId,
    pub pid: ProcessId,
    pub name: String,
    pub initial: bool,
    pub committed: bool,
    pub urgent: bool,
    pub invariant: Vec<ClockConstraint>,
    pub labels: Vec<LabelId>,
}

/// Edge attributes beyond its endpoints and event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EdgeAttrs {
    pub guard: Vec<ClockConstraint>,
    pub resets: Vec<ClockReset>,
    pub int_guard: Vec<IntGuard>,
    pub int_updates: Vec<IntUpdate>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    pub id: EdgeId,
    pub pid: ProcessId,
    pub src: LocationId,
    pub tgt: LocationId,
    pub event: EventId,
    pub guard: Vec<ClockConstraint>,
    pub resets: Vec<ClockReset>,
    pub int_guard: Vec<IntGuard>,
    pub int_updates: Vec<IntUpdate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyncStrength {
    /// The process must take part.
    Strong,
    /// The process takes part if it can.
    Weak,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SyncConstraint {
    pub pid: ProcessId,
    pub event: EventId,
    pub strength: SyncStrength,
}

impl SyncConstraint {
    pub fn strong(pid: ProcessId, event: EventId) -> Self {
        Self {
            pid,
            event,
            strength: SyncStrength::Strong,
        }
    }

    pub fn weak(pid: ProcessId, event: EventId) -> Self {
        Self {
            pid,
            event,
            strength: SyncStrength::Weak,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Synchronization {
    pub id: SyncId,
    pub constraints: Vec<SyncConstraint>,
}

/// Incremental construction of a [`System`]. Nothing is checked until
/// [`SystemBuilder::build`].
#[derive(Debug, Clone, Default)]
pub struct SystemBuilder {
    name: String,
    processes: Vec<String>,
    clocks: Vec<String>,
    events: Vec<String>,
    labels: Vec<String>,
    intvars: Vec<IntVar>,
    locations: Vec<Location>,
    edges: Vec<Edge>,
    syncs: Vec<Synchronization>,
}

impl SystemBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn add_process(&mut self, name: impl Into<String>) -> ProcessId {
        self.processes.push(name.into());
        self.processes.len() - 1
    }

    /// Clock ids start at 1; 0 is the reference clock.
    pub fn add_clock(&mut self, name: impl Into<String>) -> ClockId {
        self.clocks.push(name.into());
        self.clocks.len()
    }

    pub fn add_event(&mut self, name: impl Into<String>) -> EventId {
        self.events.push(name.into());
        self.events.len() - 1
    }

    /// Labels are interned: adding a known name returns its id.
    pub fn add_label(&mut self, name: impl Into<String>) -> LabelId {
        let name = name.into();
        if let Some(id) = self.labels.iter().position(|l| *l == name) {
            return id;
        }
        self.labels.push(name);
        self.labels.len() - 1
    }

    pub fn add_intvar(
        &mut self,
        name: impl Into<String>,
        min: i64,
        max: i64,
        initial: i64,
    ) -> IntVarId {
        self.intvars.push(IntVar {
            name: name.into(),
            min,
            max,
            initial,
        });
        self.intvars.len() - 1
    }

    pub fn add_location(
        &mut self,
        pid: ProcessId,
        name: impl Into<String>,
        attrs: LocationAttrs,
    ) -> LocationId {
        let id = self.locations.len();
        self.locations.push(Location {
            id,
            pid,
            name: name.into(),
            initial: attrs.initial,
            committed: attrs.committed,
            urgent: attrs.urgent,
            invariant: attrs.invariant,
            labels: attrs.labels,
        });
        id
    }

    pub fn add_edge(
        &mut self,
        pid: ProcessId,
        src: LocationId,
        tgt: LocationId,
        event: EventId,
        attrs: EdgeAttrs,
    ) -> EdgeId {
        let id = self.edges.len();
        self.edges.push(Edge {
            id,
            pid,
            src,
            tgt,
            event,
            guard: attrs.guard,
            resets: attrs.resets,
            int_guard: attrs.int_guard,
            int_updates: attrs.int_updates,
        });
        id
    }

    pub fn add_synchronization(&mut self, constraints: Vec<SyncConstraint>) -> SyncId {
        let id = self.syncs.len();
        self.syncs.push(Synchronization { id, constraints });
        id
    }

    /// Validate and index the system.
    pub fn build(self) -> SystemResult<System> {
        self.validate()?;

        let nlocs = self.locations.len();
        let mut outgoing = vec![Vec::new(); nlocs];
        let mut incoming = vec![Vec::new(); nlocs];
        let mut outgoing_event: AHashMap<(LocationId, EventId), Vec<EdgeId>> = AHashMap::new();
        let mut incoming_event: AHashMap<(LocationId, EventId), Vec<EdgeId>> = AHashMap::new();
        for e in &self.edges {
            outgoing[e.src].push(e.id);
            incoming[e.tgt].push(e.id);
            outgoing_event.entry((e.src, e.event)).or_default().push(e.id);
            incoming_event.entry((e.tgt, e.event)).or_default().push(e.id);
        }

        let mut initial = vec![Vec::new(); self.processes.len()];
        let mut process_locations = vec![Vec::new(); self.processes.len()];
        for l in &self.locations {
            process_locations[l.pid].push(l.id);
            if l.initial {
                initial[l.pid].push(l.id);
            }
        }

        debug!(
            name = %self.name,
            processes = self.processes.len(),
            clocks = self.clocks.len(),
            locations = nlocs,
            edges = self.edges.len(),
            synchronizations = self.syncs.len(),
            "system built"
        );

        Ok(System {
            name: self.name,
            processes: self.processes,
            clocks: self.clocks,
            events: self.events,
            labels: self.labels,
            intvars: self.intvars,
            locations: self.locations,
            edges: self.edges,
            syncs: self.syncs,
            outgoing,
            incoming,
            outgoing_event,
            incoming_event,
            initial,
            process_locations,
        })
    }

    fn validate(&self) -> SystemResult<()> {
        unique_names("process", self.processes.iter())?;
        unique_names("clock", self.clocks.iter())?;
        unique_names("event", self.events.iter())?;
        unique_names("integer variable", self.intvars.iter().map(|v| &v.name))?;
        for pid in 0..self.processes.len() {
            unique_names(
                "location",
                self.locations.iter().filter(|l| l.pid == pid).map(|l| &l.name),
            )?;
        }

        let dim = self.clocks.len() + 1;
        let nvars = self.intvars.len();

        for v in &self.intvars {
            if !v.contains(v.initial) {
                return Err(SystemError::IntVarDomain {
                    name: v.name.clone(),
                    min: v.min,
                    max: v.max,
                    initial: v.initial,
                });
            }
        }

        for l in &self.locations {
            check_index("process", l.pid, self.processes.len())?;
            check_constraints(&l.invariant, dim)?;
            for &label in &l.labels {
                check_index("label", label, self.labels.len())?;
            }
        }

        for e in &self.edges {
            check_index("process", e.pid, self.processes.len())?;
            check_index("location", e.src, self.locations.len())?;
            check_index("location", e.tgt, self.locations.len())?;
            check_index("event", e.event, self.events.len())?;
            for loc in [e.src, e.tgt] {
                if self.locations[loc].pid != e.pid {
                    return Err(SystemError::ForeignLocation {
                        edge: e.id,
                        location: loc,
                        process: e.pid,
                    });
                }
            }
            check_constraints(&e.guard, dim)?;
            check_resets(e.id, &e.resets, dim)?;
            for g in &e.int_guard {
                check_index("integer variable", g.var, nvars)?;
            }
            for u in &e.int_updates {
                check_index("integer variable", u.var, nvars)?;
                if let Some(src) = u.source {
                    check_index("integer variable", src, nvars)?;
                }
            }
        }

        for s in &self.syncs {
            if s.constraints.is_empty() {
                return Err(SystemError::EmptySynchronization { sync: s.id });
            }
            let mut seen = AHashSet::new();
            for c in &s.constraints {
                check_index("process", c.pid, self.processes.len())?;
                check_index("event", c.event, self.events.len())?;
                if !seen.insert(c.pid) {
                    return Err(SystemError::DuplicateProcessInSync {
                        sync: s.id,
                        process: c.pid,
                    });
                }
            }
            self.check_sync_resets(s)?;
        }
        Ok(())
    }

    /// Edges that may fire together under `sync` agree on every clock
    /// they both reset.
    fn check_sync_resets(&self, sync: &Synchronization) -> SystemResult<()> {
        let candidates: Vec<&Edge> = self
            .edges
            .iter()
            .filter(|e| {
                sync.constraints
                    .iter()
                    .any(|c| c.pid == e.pid && c.event == e.event)
            })
            .collect();
        for (i, a) in candidates.iter().enumerate() {
            for b in candidates[i + 1..].iter().filter(|b| b.pid != a.pid) {
                for ra in &a.resets {
                    if b.resets.iter().any(|rb| rb.left == ra.left && rb != ra) {
                        return Err(SystemError::ConflictingSyncResets {
                            sync: sync.id,
                            first: a.id,
                            second: b.id,
                            clock: ra.left,
                        });
                    }
                }
            }
        }
        Ok(())
    }
}

fn unique_names<'a>(
    kind: &'static str,
    names: impl Iterator<Item = &'a String>,
) -> SystemResult<()> {
    let mut seen = AHashSet::new();
    for n in names {
        if !seen.insert(n.as_str()) {
            return Err(SystemError::DuplicateName {
                kind,
                name: n.clone(),
            });
        }
    }
    Ok(())
}

fn check_index(kind: &'static str, index: usize, count: usize) -> SystemResult<()> {
    if index < count {
        Ok(())
    } else {
        Err(SystemError::IndexOutOfBounds { kind, index, count })
    }
}

fn check_clock(clock: ClockId, dim: usize) -> SystemResult<()> {
    if clock < dim {
        Ok(())
    } else {
        Err(SystemError::ClockOutOfRange { clock, dim })
    }
}

/// Constants must stay negatable, lower bounds are read back as `-value`.
fn check_constraints(cs: &[ClockConstraint], dim: usize) -> SystemResult<()> {
    for c in cs {
        check_clock(c.id1, dim)?;
        check_clock(c.id2, dim)?;
        if c.value == i32::MIN {
            return Err(SystemError::ConstantOutOfRange {
                value: i64::from(c.value),
            });
        }
    }
    Ok(())
}

fn check_resets(edge: EdgeId, resets: &[ClockReset], dim: usize) -> SystemResult<()> {
    let mut left = AHashSet::new();
    for r in resets {
        check_clock(r.left, dim)?;
        check_clock(r.right, dim)?;
        if r.left == REFERENCE_CLOCK {
            return Err(SystemError::ReferenceClockReset { edge });
        }
        if r.value < 0 {
            return Err(SystemError::NegativeResetOffset {
                edge,
                clock: r.left,
                value: r.value,
            });
        }
        if !left.insert(r.left) {
            return Err(SystemError::NonDisjointResets {
                edge,
                clock: r.left,
            });
        }
    }
    for r in resets {
        if r.right != REFERENCE_CLOCK && left.contains(&r.right) {
            return Err(SystemError::ResetReadsResetClock {
                edge,
                clock: r.left,
            });
        }
    }
    Ok(())
}

/// A validated network of timed processes with edge indexes.
#[derive(Debug, Clone)]
pub struct System {
    name: String,
    processes: Vec<String>,
    clocks: Vec<String>,
    events: Vec<String>,
    labels: Vec<String>,
    intvars: Vec<IntVar>,
    locations: Vec<Location>,
    edges: Vec<Edge>,
    syncs: Vec<Synchronization>,
    outgoing: Vec<Vec<EdgeId>>,
    incoming: Vec<Vec<EdgeId>>,
    outgoing_event: AHashMap<(LocationId, EventId), Vec<EdgeId>>,
    incoming_event: AHashMap<(LocationId, EventId), Vec<EdgeId>>,
    initial: Vec<Vec<LocationId>>,
    process_locations: Vec<Vec<LocationId>>,
}

impl System {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn processes_count(&self) -> usize {
        self.processes.len()
    }

    pub fn process_name(&self, pid: ProcessId) -> &str {
        &self.processes[pid]
    }

    pub fn process_id(&self, name: &str) -> Option<ProcessId> {
        self.processes.iter().position(|p| p == name)
    }

    /// Number of user clocks.
    pub fn clocks_count(&self) -> usize {
        self.clocks.len()
    }

    /// DBM dimension: user clocks plus the reference clock.
    pub fn dim(&self) -> usize {
        self.clocks.len() + 1
    }

    pub fn clock_name(&self, clock: ClockId) -> &str {
        if clock == REFERENCE_CLOCK {
            "0"
        } else {
            &self.clocks[clock - 1]
        }
    }

    pub fn clock_id(&self, name: &str) -> Option<ClockId> {
        self.clocks.iter().position(|c| c == name).map(|i| i + 1)
    }

    pub fn events_count(&self) -> usize {
        self.events.len()
    }

    pub fn event_name(&self, event: EventId) -> &str {
        &self.events[event]
    }

    pub fn event_id(&self, name: &str) -> Option<EventId> {
        self.events.iter().position(|e| e == name)
    }

    pub fn labels_count(&self) -> usize {
        self.labels.len()
    }

    pub fn label_name(&self, label: LabelId) -> &str {
        &self.labels[label]
    }

    pub fn label_id(&self, name: &str) -> Option<LabelId> {
        self.labels.iter().position(|l| l == name)
    }

    pub fn intvars(&self) -> &[IntVar] {
        &self.intvars
    }

    pub fn locations_count(&self) -> usize {
        self.locations.len()
    }

    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    pub fn location(&self, id: LocationId) -> &Location {
        &self.locations[id]
    }

    pub fn location_id(&self, pid: ProcessId, name: &str) -> Option<LocationId> {
        self.process_locations
            .get(pid)?
            .iter()
            .copied()
            .find(|&l| self.locations[l].name == name)
    }

    pub fn process_locations(&self, pid: ProcessId) -> &[LocationId] {
        &self.process_locations[pid]
    }

    pub fn initial_locations(&self, pid: ProcessId) -> &[LocationId] {
        &self.initial[pid]
    }

    pub fn edges_count(&self) -> usize {
        self.edges.len()
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn edge(&self, id: EdgeId) -> &Edge {
        &self.edges[id]
    }

    pub fn outgoing_edges(&self, loc: LocationId) -> &[EdgeId] {
        &self.outgoing[loc]
    }

    pub fn incoming_edges(&self, loc: LocationId) -> &[EdgeId] {
        &self.incoming[loc]
    }

    /// Edges leaving `loc` labelled with `event`, in declaration order.
    pub fn outgoing_event(&self, loc: LocationId, event: EventId) -> &[EdgeId] {
        self.outgoing_event
            .get(&(loc, event))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Edges entering `loc` labelled with `event`, in declaration order.
    pub fn incoming_event(&self, loc: LocationId, event: EventId) -> &[EdgeId] {
        self.incoming_event
            .get(&(loc, event))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn synchronizations(&self) -> &[Synchronization] {
        &self.syncs
    }

    /// True if any clock constraint compares two user clocks.
    pub fn has_diagonal_constraints(&self) -> bool {
        self.locations
            .iter()
            .flat_map(|l| l.invariant.iter())
            .chain(self.edges.iter().flat_map(|e| e.guard.iter()))
            .any(ClockConstraint::is_diagonal)
    }

    /// Time may elapse in `vloc` iff no component is urgent or committed.
    pub fn delay_allowed(&self, vloc: &[LocationId]) -> bool {
        vloc.iter().all(|&l| {
            let loc = &self.locations[l];
            !loc.urgent && !loc.committed
        })
    }

    pub fn is_committed(&self, vloc: &[LocationId]) -> bool {
        vloc.iter().any(|&l| self.locations[l].committed)
    }

    /// Conjunction of the invariants of the components of `vloc`.
    pub fn invariant(&self, vloc: &[LocationId]) -> Vec<ClockConstraint> {
        vloc.iter()
            .flat_map(|&l| self.locations[l].invariant.iter().copied())
            .collect()
    }

    /// Initial values of the integer variables.
    pub fn initial_intval(&self) -> Vec<i64> {
        self.intvars.iter().map(|v| v.initial).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tacov_dbm::Comparator;

    fn two_location_process(b: &mut SystemBuilder, name: &str) -> (ProcessId, LocationId, LocationId) {
        let p = b.add_process(name);
        let l0 = b.add_location(
            p,
            "l0",
            LocationAttrs {
                initial: true,
                ..LocationAttrs::default()
            },
        );
        let l1 = b.add_location(p, "l1", LocationAttrs::default());
        (p, l0, l1)
    }

    #[test]
    fn test_build_indexes_edges() {
        let mut b = SystemBuilder::new("s");
        let (p, l0, l1) = two_location_process(&mut b, "P");
        let a = b.add_event("a");
        let e0 = b.add_edge(p, l0, l1, a, EdgeAttrs::default());
        let e1 = b.add_edge(p, l0, l0, a, EdgeAttrs::default());
        let sys = b.build().unwrap();
        assert_eq!(sys.outgoing_edges(l0), &[e0, e1]);
        assert_eq!(sys.incoming_edges(l0), &[e1]);
        assert_eq!(sys.outgoing_event(l0, a), &[e0, e1]);
        assert!(sys.outgoing_event(l1, a).is_empty());
        assert_eq!(sys.initial_locations(p), &[l0]);
        assert_eq!(sys.location_id(p, "l1"), Some(l1));
        assert_eq!(sys.dim(), 1);
    }

    #[test]
    fn test_duplicate_process_in_sync() {
        let mut b = SystemBuilder::new("s");
        let p = b.add_process("P");
        let a = b.add_event("a");
        b.add_synchronization(vec![SyncConstraint::strong(p, a), SyncConstraint::weak(p, a)]);
        assert_eq!(
            b.build().unwrap_err(),
            SystemError::DuplicateProcessInSync { sync: 0, process: p }
        );
    }

    #[test]
    fn test_unknown_event_in_sync() {
        let mut b = SystemBuilder::new("s");
        let p = b.add_process("P");
        b.add_synchronization(vec![SyncConstraint::strong(p, 3)]);
        assert!(matches!(
            b.build(),
            Err(SystemError::IndexOutOfBounds { kind: "event", .. })
        ));
    }

    #[test]
    fn test_clock_out_of_range() {
        let mut b = SystemBuilder::new("s");
        let (p, l0, l1) = two_location_process(&mut b, "P");
        b.add_clock("x");
        let a = b.add_event("a");
        let attrs = EdgeAttrs {
            guard: vec![ClockConstraint::upper(2, Comparator::Le, 1)],
            ..EdgeAttrs::default()
        };
        b.add_edge(p, l0, l1, a, attrs);
        assert_eq!(
            b.build().unwrap_err(),
            SystemError::ClockOutOfRange { clock: 2, dim: 2 }
        );
    }

    #[test]
    fn test_reset_validation() {
        let build_with = |resets: Vec<ClockReset>| {
            let mut b = SystemBuilder::new("s");
            let (p, l0, l1) = two_location_process(&mut b, "P");
            b.add_clock("x");
            b.add_clock("y");
            let a = b.add_event("a");
            b.add_edge(
                p,
                l0,
                l1,
                a,
                EdgeAttrs {
                    resets,
                    ..EdgeAttrs::default()
                },
            );
            b.build()
        };
        assert!(matches!(
            build_with(vec![ClockReset::to_constant(1, 0), ClockReset::to_constant(1, 2)]),
            Err(SystemError::NonDisjointResets { clock: 1, .. })
        ));
        assert!(matches!(
            build_with(vec![ClockReset::to_constant(1, -1)]),
            Err(SystemError::NegativeResetOffset { value: -1, .. })
        ));
        assert!(matches!(
            build_with(vec![ClockReset::to_constant(1, 0), ClockReset::new(2, 1, 0)]),
            Err(SystemError::ResetReadsResetClock { clock: 2, .. })
        ));
        assert!(build_with(vec![ClockReset::new(1, 2, 3)]).is_ok());
    }

    #[test]
    fn test_edge_across_processes_rejected() {
        let mut b = SystemBuilder::new("s");
        let (p, l0, _) = two_location_process(&mut b, "P");
        let (_, m0, _) = two_location_process(&mut b, "Q");
        let a = b.add_event("a");
        b.add_edge(p, l0, m0, a, EdgeAttrs::default());
        assert!(matches!(
            b.build(),
            Err(SystemError::ForeignLocation { location, .. }) if location == m0
        ));
    }

    #[test]
    fn test_intvar_initial_out_of_domain() {
        let mut b = SystemBuilder::new("s");
        b.add_intvar("i", 0, 3, 4);
        assert!(matches!(b.build(), Err(SystemError::IntVarDomain { .. })));
    }

    #[test]
    fn test_delay_and_committed() {
        let mut b = SystemBuilder::new("s");
        let p = b.add_process("P");
        let n = b.add_location(p, "n", LocationAttrs::default());
        let u = b.add_location(
            p,
            "u",
            LocationAttrs {
                urgent: true,
                ..LocationAttrs::default()
            },
        );
        let c = b.add_location(
            p,
            "c",
            LocationAttrs {
                committed: true,
                ..LocationAttrs::default()
            },
        );
        let sys = b.build().unwrap();
        assert!(sys.delay_allowed(&[n]));
        assert!(!sys.delay_allowed(&[u]));
        assert!(!sys.delay_allowed(&[c]));
        assert!(sys.is_committed(&[c]));
        assert!(!sys.is_committed(&[u]));
    }

    #[test]
    fn test_label_interning() {
        let mut b = SystemBuilder::new("s");
        let a = b.add_label("err");
        let c = b.add_label("ok");
        assert_eq!(b.add_label("err"), a);
        assert_ne!(a, c);
    }
}
