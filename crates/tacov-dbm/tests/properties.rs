//! Algebraic laws of the zone engine, checked on random small zones.

use proptest::prelude::*;
use tacov_dbm::{
    Bound, ClockBounds, ClockConstraint, ClockReset, Comparator, Dbm, Extrapolation, StateStatus,
};

const DIM: usize = 4;

fn constraint() -> impl Strategy<Value = ClockConstraint> {
    (0..DIM, 0..DIM, any::<bool>(), -6i32..=6)
        .prop_filter("distinct clocks", |(a, b, _, _)| a != b)
        .prop_map(|(id1, id2, strict, value)| {
            let cmp = if strict { Comparator::Lt } else { Comparator::Le };
            ClockConstraint::new(id1, id2, cmp, value)
        })
}

fn constraints() -> impl Strategy<Value = Vec<ClockConstraint>> {
    prop::collection::vec(constraint(), 0..8)
}

/// Resets of clocks `1..DIM-1` with non-negative offsets, reading either
/// the reference clock or the last clock, which is never reset.
fn resets() -> impl Strategy<Value = Vec<ClockReset>> {
    prop::collection::vec((any::<bool>(), any::<bool>(), 0i32..=4), DIM - 2).prop_map(|choices| {
        choices
            .into_iter()
            .enumerate()
            .filter(|(_, (reset, _, _))| *reset)
            .map(|(i, (_, from_last, value))| {
                let right = if from_last { DIM - 1 } else { 0 };
                ClockReset::new(i + 1, right, value)
            })
            .collect()
    })
}

fn zone(cs: &[ClockConstraint]) -> Dbm {
    let mut d = Dbm::universal_positive(DIM);
    d.constrain(cs);
    d
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 512,
        .. ProptestConfig::default()
    })]

    #[test]
    fn closure_is_idempotent(cs in constraints()) {
        let d = zone(&cs);
        let mut again = d.clone();
        again.tighten();
        prop_assert_eq!(again, d);
    }

    #[test]
    fn constrain_is_order_independent(cs in constraints()) {
        let forward = zone(&cs);
        let mut rev = cs.clone();
        rev.reverse();
        let backward = zone(&rev);
        prop_assert_eq!(forward, backward);
    }

    #[test]
    fn incremental_matches_full_closure(cs in constraints()) {
        let incremental = zone(&cs);
        let mut raw = Dbm::universal_positive(DIM);
        for c in &cs {
            if c.bound() < raw.get(c.id1, c.id2) {
                raw.set(c.id1, c.id2, c.bound());
            }
        }
        raw.tighten();
        prop_assert_eq!(incremental, raw);
    }

    #[test]
    fn constrain_shrinks_and_is_monotone(a in constraints(), b in constraints(), c in constraints()) {
        let small = zone(&[a.clone(), b].concat());
        let big = zone(&a);
        prop_assert!(small.is_le(&big));

        let mut small_c = small.clone();
        small_c.constrain(&c);
        let mut big_c = big.clone();
        big_c.constrain(&c);
        prop_assert!(small_c.is_le(&small));
        prop_assert!(small_c.is_le(&big_c));
    }

    #[test]
    fn reset_then_inverse_covers_source(cs in constraints(), rs in resets()) {
        let src = zone(&cs);
        prop_assume!(!src.is_empty());
        let mut tgt = src.clone();
        tgt.reset(&rs);
        prop_assert!(!tgt.is_empty());

        let mut back = tgt.clone();
        prop_assert_eq!(back.constrain_to_reset(&rs), StateStatus::Ok);
        back.inverse_reset(&rs);
        prop_assert!(src.is_le(&back));
    }

    #[test]
    fn reset_yields_tight_zone(cs in constraints(), rs in resets()) {
        let mut d = zone(&cs);
        d.reset(&rs);
        let mut again = d.clone();
        again.tighten();
        prop_assert_eq!(again, d);
    }

    #[test]
    fn open_up_and_down_are_supersets(cs in constraints()) {
        let d = zone(&cs);
        let mut up = d.clone();
        up.open_up();
        let mut down = d.clone();
        down.open_down();
        prop_assert!(d.is_le(&up));
        prop_assert!(d.is_le(&down));
    }

    #[test]
    fn extrapolation_is_superset(
        cs in constraints(),
        l in prop::collection::vec(0i32..=5, DIM - 1),
        u in prop::collection::vec(0i32..=5, DIM - 1),
    ) {
        let d = zone(&cs);
        let mut lower = vec![0];
        lower.extend(l);
        let mut upper = vec![0];
        upper.extend(u);
        let bounds = ClockBounds::from_lu(lower, upper);
        for e in [
            Extrapolation::ExtraM,
            Extrapolation::ExtraMPlus,
            Extrapolation::ExtraLu,
            Extrapolation::ExtraLuPlus,
        ] {
            let mut z = d.clone();
            e.extrapolate(&mut z, &bounds);
            prop_assert!(d.is_le(&z), "{:?}: {} not in {}", e, d, z);
            prop_assert_eq!(z.is_empty(), d.is_empty());
        }
    }

    #[test]
    fn diagonal_stays_le_zero(cs in constraints()) {
        let d = zone(&cs);
        prop_assume!(!d.is_empty());
        for i in 0..DIM {
            prop_assert_eq!(d.get(i, i), Bound::LE_ZERO);
        }
    }
}
