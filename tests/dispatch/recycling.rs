//! A broken connection is either in the pool or with the reconnection
//! manager, never both.

use crate::common::*;

#[test]
fn recycled_connection_is_not_used_until_it_returns() {
    let h = Harness::new(&["a:1", "b:1"]);
    let a = h.faults("a:1");
    a.set_online(false);

    h.dispatcher.put("k0", "v");
    h.dispatcher.sync().unwrap();
    let stats = h.stats();
    assert_eq!((stats.live_connections, stats.recycling), (1, 1));

    let ops_while_recycling = a.operations();
    for i in 1..20 {
        h.dispatcher.put(format!("k{}", i), "v");
    }
    h.dispatcher.sync().unwrap();
    assert_eq!(a.operations(), ops_while_recycling);
    assert_eq!(h.store().len(), 20);

    a.set_online(true);
    assert!(wait_until(PATIENCE, || {
        let s = h.stats();
        s.reconnects == 1 && s.recycling == 0 && s.live_connections == 2
    }));
    assert_eq!(a.reconnects(), 1);
}

#[test]
fn recovered_connection_serves_after_the_primary_breaks() {
    let h = Harness::new(&["a:1", "b:1"]);
    let a = h.faults("a:1");
    let b = h.faults("b:1");

    a.set_online(false);
    h.dispatcher.put("k0", "v");
    h.dispatcher.sync().unwrap();
    a.set_online(true);
    assert!(wait_until(PATIENCE, || h.stats().reconnects == 1));

    b.set_online(false);
    let ops_before = a.operations();
    h.dispatcher.put("k1", "v");
    h.dispatcher.sync().unwrap();

    assert!(h.store().contains("k1"));
    assert_eq!(a.operations(), ops_before + 1);
    let stats = h.stats();
    assert_eq!(stats.live_connections + stats.recycling, 2);
    assert_eq!(stats.recycling, 1);
}
