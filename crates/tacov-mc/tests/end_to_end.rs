//! Covering reachability on small networks declared in JSON or built
//! through the builder.

use std::collections::BTreeSet;
use tacov_dbm::{ClockConstraint, ClockReset, Comparator, Extrapolation};
use tacov_mc::{AcceptingLabels, Covreach, CovreachConfig, SearchOrder, Verdict};
use tacov_system::{
    EdgeAttrs, IntCmp, IntGuard, IntUpdate, LocationAttrs, SyncProdSystem, System,
    SystemBuilder, SystemDeclaration,
};

fn load(json: &str) -> SyncProdSystem {
    let decl: SystemDeclaration = serde_json::from_str(json).unwrap();
    SyncProdSystem::new(System::from_declaration(&decl).unwrap())
}

fn run_labels(sp: &SyncProdSystem, config: CovreachConfig, labels: &[&str]) -> tacov_mc::CovreachReport {
    let accepting = AcceptingLabels::new(sp.system(), labels);
    Covreach::new(sp, config)
        .unwrap()
        .run(|n| accepting.matches(n))
        .unwrap()
}

#[test]
fn handshake_is_reachable() {
    let sp = load(include_str!("fixtures/handshake.json"));
    let config = CovreachConfig {
        extrapolation: Extrapolation::None,
        ..CovreachConfig::default()
    };
    let report = run_labels(&sp, config, &["p_done", "q_done"]);
    assert!(report.stats.visited_nodes() >= 1);
    match report.verdict {
        Verdict::Reachable { witness } => {
            let zone = witness.zone();
            assert!(!zone.is_empty());
            assert!(zone.satisfies(&sp.system().invariant(witness.vloc())));
            // x was reset while y was in [2, 3]
            assert!(zone.satisfies(&[ClockConstraint::new(1, 2, Comparator::Le, -2)]));
            assert_eq!(sp.vloc_name(witness.vloc(), "|"), "p1|q1");
        }
        other => panic!("expected Reachable, got {:?}", other),
    }
}

#[test]
fn handshake_reachable_under_default_extrapolation() {
    let sp = load(include_str!("fixtures/handshake.json"));
    let report = run_labels(&sp, CovreachConfig::default(), &["p_done", "q_done"]);
    assert!(report.verdict.is_reachable());
}

#[test]
fn negative_guard_is_unreachable() {
    let sp = load(include_str!("fixtures/negative_guard.json"));
    let report = run_labels(&sp, CovreachConfig::default(), &["bad"]);
    assert!(matches!(report.verdict, Verdict::Unreachable));
    assert_eq!(report.stats.visited_nodes(), 1);
    assert_eq!(report.stats.covered_leaf_nodes(), 0);
    assert_eq!(report.stats.covered_nonleaf_nodes(), 0);
    assert_eq!(report.stats.directly_covered_leaf_nodes(), 0);
    assert_eq!(report.stored_nodes, 1);
}

#[test]
fn sibling_successor_counts_as_directly_covered() {
    // l0 -> l1 unguarded, then l0 -(x<=1)-> l1 with l1 urgent
    let mut b = SystemBuilder::new("siblings");
    let p = b.add_process("P");
    let x = b.add_clock("x");
    let a = b.add_event("a");
    let l0 = b.add_location(
        p,
        "l0",
        LocationAttrs {
            initial: true,
            ..Default::default()
        },
    );
    let l1 = b.add_location(
        p,
        "l1",
        LocationAttrs {
            urgent: true,
            ..Default::default()
        },
    );
    b.add_edge(p, l0, l1, a, EdgeAttrs::default());
    b.add_edge(
        p,
        l0,
        l1,
        a,
        EdgeAttrs {
            guard: vec![ClockConstraint::upper(x, Comparator::Le, 1)],
            ..Default::default()
        },
    );
    let sp = SyncProdSystem::new(b.build().unwrap());

    for order in [SearchOrder::Bfs, SearchOrder::Dfs] {
        let config = CovreachConfig {
            search_order: order,
            ..CovreachConfig::default()
        };
        let report = Covreach::new(&sp, config).unwrap().run(|_| false).unwrap();
        assert!(matches!(report.verdict, Verdict::Unreachable));
        assert_eq!(report.stats.visited_nodes(), 2);
        assert_eq!(report.stats.covered_leaf_nodes(), 1);
        assert_eq!(report.stats.directly_covered_leaf_nodes(), 1);
        assert_eq!(report.stats.covered_nonleaf_nodes(), 0);
        assert_eq!(report.stored_nodes, 2);
    }
}

#[test]
fn looping_automaton_terminates() {
    let sp = load(include_str!("fixtures/ticker.json"));
    for order in [SearchOrder::Bfs, SearchOrder::Dfs] {
        let config = CovreachConfig {
            search_order: order,
            ..CovreachConfig::default()
        };
        let report = Covreach::new(&sp, config).unwrap().run(|_| false).unwrap();
        assert!(matches!(report.verdict, Verdict::Unreachable));
        assert!(report.stats.visited_nodes() < 50, "{}", report.stats);
        assert!(report.stats.covered_leaf_nodes() >= 1);
    }
}

#[test]
fn ticker_eventually_late() {
    let sp = load(include_str!("fixtures/ticker.json"));
    let report = run_labels(&sp, CovreachConfig::default(), &["late"]);
    match report.verdict {
        Verdict::Reachable { witness } => {
            assert_eq!(sp.vloc_name(witness.vloc(), "|"), "l1");
            assert!(!witness.zone().is_empty());
        }
        other => panic!("expected Reachable, got {:?}", other),
    }
}

#[test]
fn committed_location_blocks_other_processes() {
    let sp = load(include_str!("fixtures/committed.json"));
    let sys = sp.system();
    let c = sys.location_id(0, "c").unwrap();
    let p2 = sys.location_id(0, "p2").unwrap();
    let q1 = sys.location_id(1, "q1").unwrap();

    let run = |target: [usize; 2]| {
        Covreach::new(&sp, CovreachConfig::default())
            .unwrap()
            .run(move |n| n.vloc() == target)
            .unwrap()
    };
    assert!(!run([c, q1]).verdict.is_reachable());
    assert!(run([p2, q1]).verdict.is_reachable());
}

#[test]
fn int_update_out_of_domain_is_dropped() {
    let sp = load(include_str!("fixtures/counter.json"));
    assert!(run_labels(&sp, CovreachConfig::default(), &["one"])
        .verdict
        .is_reachable());

    let report = run_labels(&sp, CovreachConfig::default(), &["two"]);
    assert!(matches!(report.verdict, Verdict::Unreachable));
    // (l0, 0), (l0, 1) and (one, 1)
    assert_eq!(report.stats.visited_nodes(), 3);
}

#[test]
fn recorded_graph_covers_stored_nodes() {
    let sp = load(include_str!("fixtures/ticker.json"));
    let config = CovreachConfig {
        record_graph: true,
        ..CovreachConfig::default()
    };
    let report = Covreach::new(&sp, config).unwrap().run(|_| false).unwrap();
    let graph = report.graph.unwrap();
    assert_eq!(graph.nodes.len(), report.stored_nodes);
    let ids: Vec<usize> = graph.nodes.iter().map(|n| n.id).collect();
    for e in &graph.edges {
        assert!(ids.contains(&e.src), "dangling source in {:?}", e);
        assert!(ids.contains(&e.tgt), "dangling target in {:?}", e);
    }
    let json = serde_json::to_string(&graph).unwrap();
    assert!(json.contains("\"kind\":\"abstract\""));
}

/// `n` processes competing for a lock held in an integer variable.
/// Each process: idle -(x:=0)-> req (x<=2) -(x>=1, lock==0, lock:=1)-> cs -(lock:=0)-> idle.
fn mutex(n: usize, with_lock: bool) -> SyncProdSystem {
    let mut b = SystemBuilder::new("mutex");
    let lock = b.add_intvar("lock", 0, 1, 0);
    let go = b.add_event("go");
    for i in 0..n {
        let p = b.add_process(format!("P{i}"));
        let x = b.add_clock(format!("x{i}"));
        let cs_label = b.add_label(format!("cs{i}"));
        let idle = b.add_location(
            p,
            "idle",
            LocationAttrs {
                initial: true,
                ..Default::default()
            },
        );
        let req = b.add_location(
            p,
            "req",
            LocationAttrs {
                invariant: vec![ClockConstraint::upper(x, Comparator::Le, 2)],
                ..Default::default()
            },
        );
        let cs = b.add_location(
            p,
            "cs",
            LocationAttrs {
                labels: vec![cs_label],
                ..Default::default()
            },
        );
        b.add_edge(
            p,
            idle,
            req,
            go,
            EdgeAttrs {
                resets: vec![ClockReset::to_constant(x, 0)],
                ..Default::default()
            },
        );
        let (int_guard, int_updates) = if with_lock {
            (
                vec![IntGuard {
                    var: lock,
                    cmp: IntCmp::Eq,
                    value: 0,
                }],
                vec![IntUpdate::constant(lock, 1)],
            )
        } else {
            (vec![], vec![])
        };
        b.add_edge(
            p,
            req,
            cs,
            go,
            EdgeAttrs {
                guard: vec![ClockConstraint::lower(x, Comparator::Le, 1)],
                int_guard,
                int_updates,
                ..Default::default()
            },
        );
        let release = if with_lock {
            vec![IntUpdate::constant(lock, 0)]
        } else {
            vec![]
        };
        b.add_edge(
            p,
            cs,
            idle,
            go,
            EdgeAttrs {
                int_updates: release,
                ..Default::default()
            },
        );
    }
    SyncProdSystem::new(b.build().unwrap())
}

#[test]
fn parallel_agrees_with_sequential() {
    for with_lock in [true, false] {
        let sp = mutex(3, with_lock);
        let mut verdicts = Vec::new();
        for (threads, order) in [
            (1, SearchOrder::Bfs),
            (1, SearchOrder::Dfs),
            (4, SearchOrder::Bfs),
            (4, SearchOrder::Dfs),
        ] {
            let config = CovreachConfig {
                search_order: order,
                num_threads: threads,
                ..CovreachConfig::default()
            };
            let report = run_labels(&sp, config, &["cs0", "cs1"]);
            assert!(report.stats.visited_nodes() >= 1);
            verdicts.push(report.verdict.is_reachable());
        }
        assert!(
            verdicts.iter().all(|&v| v == !with_lock),
            "with_lock={with_lock}: {verdicts:?}"
        );
    }
}

#[test]
fn parallel_exhaustive_search_reaches_same_discrete_states() {
    let sp = mutex(3, true);
    let discrete_states = |threads: usize| {
        let config = CovreachConfig {
            num_threads: threads,
            record_graph: true,
            ..CovreachConfig::default()
        };
        let report = Covreach::new(&sp, config).unwrap().run(|_| false).unwrap();
        assert!(matches!(report.verdict, Verdict::Unreachable));
        assert!(report.stats.visited_nodes() >= report.stored_nodes as u64);
        let graph = report.graph.unwrap();
        assert_eq!(graph.nodes.len(), report.stored_nodes);
        graph
            .nodes
            .into_iter()
            .map(|n| (n.vloc, n.intval))
            .collect::<BTreeSet<_>>()
    };
    let sequential = discrete_states(1);
    // 3 processes in idle/req/cs with at most one in cs
    assert_eq!(sequential.len(), 8 + 3 * 4);
    assert_eq!(discrete_states(4), sequential);
}
