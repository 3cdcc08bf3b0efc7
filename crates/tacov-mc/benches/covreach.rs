//! Criterion benchmarks for the covering search.
//!
//! Run with: cargo bench -p tacov-mc

use criterion::{criterion_group, criterion_main, Criterion};
use tacov_dbm::{ClockConstraint, ClockReset, Comparator, Extrapolation};
use tacov_mc::{AcceptingLabels, Covreach, CovreachConfig, SearchOrder};
use tacov_system::{
    EdgeAttrs, IntCmp, IntGuard, IntUpdate, LocationAttrs, SyncProdSystem, SystemBuilder,
};

const K: i32 = 2;

/// Fischer's mutual exclusion protocol with `n` processes.
fn fischer(n: usize) -> SyncProdSystem {
    let mut b = SystemBuilder::new(format!("fischer{n}"));
    let id = b.add_intvar("id", 0, n as i64, 0);
    let tau = b.add_event("tau");
    let cs_label = b.add_label("cs");
    for i in 1..=n {
        let p = b.add_process(format!("P{i}"));
        let x = b.add_clock(format!("x{i}"));
        let idle = b.add_location(
            p,
            "A",
            LocationAttrs {
                initial: true,
                ..Default::default()
            },
        );
        let req = b.add_location(
            p,
            "req",
            LocationAttrs {
                invariant: vec![ClockConstraint::upper(x, Comparator::Le, K)],
                ..Default::default()
            },
        );
        let wait = b.add_location(p, "wait", LocationAttrs::default());
        let cs = b.add_location(
            p,
            "cs",
            LocationAttrs {
                labels: vec![cs_label],
                ..Default::default()
            },
        );
        let id_is = |value: i64| IntGuard {
            var: id,
            cmp: IntCmp::Eq,
            value,
        };
        b.add_edge(
            p,
            idle,
            req,
            tau,
            EdgeAttrs {
                resets: vec![ClockReset::to_constant(x, 0)],
                int_guard: vec![id_is(0)],
                ..Default::default()
            },
        );
        b.add_edge(
            p,
            req,
            wait,
            tau,
            EdgeAttrs {
                guard: vec![ClockConstraint::upper(x, Comparator::Le, K)],
                resets: vec![ClockReset::to_constant(x, 0)],
                int_updates: vec![IntUpdate::constant(id, i as i64)],
                ..Default::default()
            },
        );
        b.add_edge(
            p,
            wait,
            req,
            tau,
            EdgeAttrs {
                resets: vec![ClockReset::to_constant(x, 0)],
                int_guard: vec![id_is(0)],
                ..Default::default()
            },
        );
        b.add_edge(
            p,
            wait,
            cs,
            tau,
            EdgeAttrs {
                guard: vec![ClockConstraint::lower(x, Comparator::Lt, K)],
                int_guard: vec![id_is(i as i64)],
                ..Default::default()
            },
        );
        b.add_edge(
            p,
            cs,
            idle,
            tau,
            EdgeAttrs {
                int_updates: vec![IntUpdate::constant(id, 0)],
                ..Default::default()
            },
        );
    }
    SyncProdSystem::new(b.build().expect("fischer model is well formed"))
}

/// Exhaustive search when `labels` is empty, label search otherwise.
fn bench_fischer(c: &mut Criterion, name: &str, n: usize, labels: &[&str], config: CovreachConfig) {
    let sp = fischer(n);
    let accepting = AcceptingLabels::new(sp.system(), labels);
    c.bench_function(name, |b| {
        b.iter(|| {
            Covreach::new(&sp, config.clone())
                .unwrap()
                .run(|node| accepting.matches(node))
                .unwrap()
        })
    });
}

fn benchmarks(c: &mut Criterion) {
    let bfs = CovreachConfig::default();
    let dfs = CovreachConfig {
        search_order: SearchOrder::Dfs,
        ..Default::default()
    };
    let extra_m = CovreachConfig {
        extrapolation: Extrapolation::ExtraMPlus,
        ..Default::default()
    };
    let parallel = CovreachConfig {
        num_threads: 4,
        ..Default::default()
    };

    // Exhaustive: mutual exclusion holds, so nothing is accepted
    bench_fischer(c, "fischer_N3_bfs", 3, &[], bfs.clone());
    bench_fischer(c, "fischer_N3_dfs", 3, &[], dfs.clone());
    bench_fischer(c, "fischer_N3_extraM+", 3, &[], extra_m);
    bench_fischer(c, "fischer_N4_bfs", 4, &[], bfs);
    bench_fischer(c, "fischer_N4_parallel", 4, &[], parallel);

    // Early exit on the first critical section
    bench_fischer(c, "fischer_N4_dfs_cs", 4, &["cs"], dfs);
}

criterion_group!(benches, benchmarks);
criterion_main!(benches);
