#![no_main]
use libfuzzer_sys::fuzz_target;
use tacov_dbm::{Extrapolation, ZoneSemantics};
use tacov_mc::{DiscreteState, Node, ZoneGraph};
use tacov_system::{SyncProdSystem, System, SystemDeclaration};

fuzz_target!(|data: &[u8]| {
    let Ok(decl) = serde_json::from_slice::<SystemDeclaration>(data) else {
        return;
    };
    let Ok(system) = System::from_declaration(&decl) else {
        return;
    };
    let sp = SyncProdSystem::new(system);
    let zg = ZoneGraph::new(&sp, ZoneSemantics::Elapsed, Extrapolation::ExtraLuPlus);
    for (i, (discrete, zone)) in zg.initial_states().into_iter().enumerate().take(8) {
        assert!(!zone.is_empty());
        let node = Node::new(i, discrete, zone);
        for vedge in sp.outgoing_vedges(node.vloc()).iter().take(32) {
            if let Ok((next, zone)) = zg.next(&node, vedge) {
                assert!(!zone.is_empty());
                let _ = DiscreteState::fingerprint(&next);
            }
        }
    }
});
