//! Name-based system declarations, as produced by an external frontend.
//!
//! A [`SystemDeclaration`] is plain data (JSON friendly). [`lower`] resolves
//! names into ids and builds a validated [`System`].

use crate::error::{SystemError, SystemResult};
use crate::intvars::{IntCmp, IntGuard, IntUpdate};
use crate::system::{
    EdgeAttrs, LocationAttrs, ProcessId, SyncConstraint, SyncStrength, System, SystemBuilder,
};
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use tacov_dbm::{ClockConstraint, ClockId, ClockReset, Comparator, REFERENCE_CLOCK};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SystemDeclaration {
    pub name: String,
    #[serde(default)]
    pub clocks: Vec<String>,
    #[serde(default)]
    pub intvars: Vec<IntVarDecl>,
    #[serde(default)]
    pub events: Vec<String>,
    pub processes: Vec<ProcessDecl>,
    #[serde(default)]
    pub synchronizations: Vec<SyncDecl>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IntVarDecl {
    pub name: String,
    pub min: i64,
    pub max: i64,
    #[serde(default)]
    pub initial: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProcessDecl {
    pub name: String,
    pub locations: Vec<LocationDecl>,
    #[serde(default)]
    pub edges: Vec<EdgeDecl>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LocationDecl {
    pub name: String,
    #[serde(default)]
    pub initial: bool,
    #[serde(default)]
    pub committed: bool,
    #[serde(default)]
    pub urgent: bool,
    #[serde(default)]
    pub invariant: Vec<ClockConstraintDecl>,
    #[serde(default)]
    pub labels: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EdgeDecl {
    pub src: String,
    pub tgt: String,
    pub event: String,
    #[serde(default)]
    pub guard: Vec<ClockConstraintDecl>,
    #[serde(default)]
    pub resets: Vec<ClockResetDecl>,
    #[serde(default)]
    pub int_guard: Vec<IntGuardDecl>,
    #[serde(default)]
    pub int_updates: Vec<IntUpdateDecl>,
}

/// `clock - minus cmp value`, or `clock cmp value` without `minus`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClockConstraintDecl {
    pub clock: String,
    #[serde(default)]
    pub minus: Option<String>,
    pub cmp: IntCmp,
    pub value: i32,
}

/// `clock := from + value`, or `clock := value` without `from`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClockResetDecl {
    pub clock: String,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub value: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IntGuardDecl {
    pub var: String,
    pub cmp: IntCmp,
    pub value: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IntUpdateDecl {
    pub var: String,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub value: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SyncDecl {
    pub constraints: Vec<SyncConstraintDecl>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SyncConstraintDecl {
    pub process: String,
    pub event: String,
    #[serde(default)]
    pub weak: bool,
}

impl System {
    /// Resolve and validate a declaration.
    pub fn from_declaration(decl: &SystemDeclaration) -> SystemResult<System> {
        lower(decl)
    }
}

struct Names {
    clocks: AHashMap<String, ClockId>,
    events: AHashMap<String, usize>,
    intvars: AHashMap<String, usize>,
    processes: AHashMap<String, ProcessId>,
}

fn lookup<T: Copy>(map: &AHashMap<String, T>, kind: &'static str, name: &str) -> SystemResult<T> {
    map.get(name).copied().ok_or_else(|| SystemError::UnknownName {
        kind,
        name: name.to_string(),
    })
}

/// Lower a declaration into a [`System`].
pub fn lower(decl: &SystemDeclaration) -> SystemResult<System> {
    let mut b = SystemBuilder::new(decl.name.clone());
    let mut names = Names {
        clocks: AHashMap::new(),
        events: AHashMap::new(),
        intvars: AHashMap::new(),
        processes: AHashMap::new(),
    };

    for c in &decl.clocks {
        let id = b.add_clock(c.clone());
        names.clocks.insert(c.clone(), id);
    }
    for e in &decl.events {
        let id = b.add_event(e.clone());
        names.events.insert(e.clone(), id);
    }
    for v in &decl.intvars {
        let id = b.add_intvar(v.name.clone(), v.min, v.max, v.initial);
        names.intvars.insert(v.name.clone(), id);
    }

    for p in &decl.processes {
        let pid = b.add_process(p.name.clone());
        names.processes.insert(p.name.clone(), pid);

        let mut locs = AHashMap::new();
        for l in &p.locations {
            let mut invariant = Vec::new();
            for c in &l.invariant {
                lower_constraint(&names, c, &mut invariant)?;
            }
            let labels = l.labels.iter().map(|name| b.add_label(name.clone())).collect();
            let attrs = LocationAttrs {
                initial: l.initial,
                committed: l.committed,
                urgent: l.urgent,
                invariant,
                labels,
            };
            let id = b.add_location(pid, l.name.clone(), attrs);
            locs.insert(l.name.clone(), id);
        }

        for e in &p.edges {
            let src = lookup(&locs, "location", &e.src)?;
            let tgt = lookup(&locs, "location", &e.tgt)?;
            let event = lookup(&names.events, "event", &e.event)?;
            let attrs = lower_edge_attrs(&names, e)?;
            b.add_edge(pid, src, tgt, event, attrs);
        }
    }

    for s in &decl.synchronizations {
        let constraints = s
            .constraints
            .iter()
            .map(|c| {
                Ok(SyncConstraint {
                    pid: lookup(&names.processes, "process", &c.process)?,
                    event: lookup(&names.events, "event", &c.event)?,
                    strength: if c.weak {
                        SyncStrength::Weak
                    } else {
                        SyncStrength::Strong
                    },
                })
            })
            .collect::<SystemResult<Vec<_>>>()?;
        b.add_synchronization(constraints);
    }

    b.build()
}

fn lower_edge_attrs(names: &Names, e: &EdgeDecl) -> SystemResult<EdgeAttrs> {
    let mut guard = Vec::new();
    for c in &e.guard {
        lower_constraint(names, c, &mut guard)?;
    }
    let resets = e
        .resets
        .iter()
        .map(|r| {
            let left = lookup(&names.clocks, "clock", &r.clock)?;
            let right = match &r.from {
                Some(from) => lookup(&names.clocks, "clock", from)?,
                None => REFERENCE_CLOCK,
            };
            Ok(ClockReset::new(left, right, r.value))
        })
        .collect::<SystemResult<Vec<_>>>()?;
    let int_guard = e
        .int_guard
        .iter()
        .map(|g| {
            Ok(IntGuard {
                var: lookup(&names.intvars, "integer variable", &g.var)?,
                cmp: g.cmp,
                value: g.value,
            })
        })
        .collect::<SystemResult<Vec<_>>>()?;
    let int_updates = e
        .int_updates
        .iter()
        .map(|u| {
            let source = match &u.from {
                Some(from) => Some(lookup(&names.intvars, "integer variable", from)?),
                None => None,
            };
            Ok(IntUpdate {
                var: lookup(&names.intvars, "integer variable", &u.var)?,
                source,
                offset: u.value,
            })
        })
        .collect::<SystemResult<Vec<_>>>()?;
    Ok(EdgeAttrs {
        guard,
        resets,
        int_guard,
        int_updates,
    })
}

/// `==` becomes two constraints, `>=` and `>` are flipped into
/// upper bounds on the reversed difference.
fn lower_constraint(
    names: &Names,
    c: &ClockConstraintDecl,
    out: &mut Vec<ClockConstraint>,
) -> SystemResult<()> {
    let x = lookup(&names.clocks, "clock", &c.clock)?;
    let y = match &c.minus {
        Some(m) => lookup(&names.clocks, "clock", m)?,
        None => REFERENCE_CLOCK,
    };
    let v = c.value;
    let neg = || {
        v.checked_neg().ok_or(SystemError::ConstantOutOfRange {
            value: i64::from(v),
        })
    };
    match c.cmp {
        IntCmp::Lt => out.push(ClockConstraint::new(x, y, Comparator::Lt, v)),
        IntCmp::Le => out.push(ClockConstraint::new(x, y, Comparator::Le, v)),
        IntCmp::Eq => {
            out.push(ClockConstraint::new(x, y, Comparator::Le, v));
            out.push(ClockConstraint::new(y, x, Comparator::Le, neg()?));
        }
        IntCmp::Ge => out.push(ClockConstraint::new(y, x, Comparator::Le, neg()?)),
        IntCmp::Gt => out.push(ClockConstraint::new(y, x, Comparator::Lt, neg()?)),
        IntCmp::Ne => {
            return Err(SystemError::UnsupportedClockComparator {
                cmp: c.cmp.to_string(),
            })
        }
    }
    Ok(())
}
