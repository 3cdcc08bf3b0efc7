#![no_main]
use libfuzzer_sys::fuzz_target;
use tacov_dbm::{Bound, ClockConstraint, ClockReset, Comparator, Dbm};

const DIM: usize = 4;

fuzz_target!(|data: &[u8]| {
    let mut dbm = Dbm::universal_positive(DIM);
    for op in data.chunks_exact(3) {
        let x = (op[1] as usize) % DIM;
        let y = (op[2] as usize >> 4) % DIM;
        let v = (op[2] & 0x0f) as i32 - 8;
        match op[0] % 6 {
            0 if x != y => {
                let cmp = if op[0] & 0x80 != 0 { Comparator::Lt } else { Comparator::Le };
                dbm.constrain(&[ClockConstraint::new(x, y, cmp, v)]);
            }
            1 if x != 0 => dbm.reset(&[ClockReset::to_constant(x, v.abs())]),
            2 => dbm.open_up(),
            3 => dbm.open_down(),
            4 if x != 0 => dbm.free_clock(x),
            _ => {}
        }
        if dbm.is_empty() {
            return;
        }
        for i in 0..DIM {
            assert_eq!(dbm.get(i, i), Bound::LE_ZERO);
        }
        let mut closed = dbm.clone();
        closed.tighten();
        assert_eq!(closed, dbm);
    }
});
