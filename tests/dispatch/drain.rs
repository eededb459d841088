//! `sync` as a drain barrier.

use crate::common::*;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[test]
fn sync_makes_prior_puts_visible() {
    let h = Harness::new(&["a:1"]);

    h.dispatcher.put("k1", "v1");
    h.dispatcher.put("k2", "v2");
    h.dispatcher.sync().unwrap();

    assert_eq!(h.dispatcher.get("k1"), Some("v1".to_string()));
    assert_eq!(h.dispatcher.get("k2"), Some("v2".to_string()));
    assert!(h.dispatcher.is_active());
}

#[test]
fn sync_waits_for_command_in_flight() {
    let h = Harness::new(&["a:1"]);
    let faults = h.faults("a:1");
    faults.hold();
    h.dispatcher.put("k", "v");

    let dispatcher = Arc::clone(&h.dispatcher);
    let syncer = thread::spawn(move || dispatcher.sync());
    thread::sleep(Duration::from_millis(100));
    assert!(!syncer.is_finished());

    faults.release();
    syncer.join().unwrap().unwrap();
    assert!(h.store().contains("k"));
}

#[test]
fn sync_covers_every_producer() {
    let h = Harness::new(&["a:1", "b:1"]);

    let producers: Vec<_> = (0..4)
        .map(|t| {
            let dispatcher = Arc::clone(&h.dispatcher);
            thread::spawn(move || {
                for i in 0..100 {
                    assert!(dispatcher.put(format!("t{}-{}", t, i), "v"));
                }
            })
        })
        .collect();
    for producer in producers {
        producer.join().unwrap();
    }
    h.dispatcher.sync().unwrap();

    assert_eq!(h.store().len(), 400);
    assert_eq!(h.stats().executed, 400);
}

#[test]
fn repeated_syncs_keep_the_dispatcher_usable() {
    let h = Harness::new(&["a:1"]);
    for round in 0..5 {
        h.dispatcher.put("k", round.to_string());
        h.dispatcher.sync().unwrap();
        assert_eq!(h.store().get("k"), Some(round.to_string()));
    }
    h.dispatcher.sync().unwrap();
    assert!(h.dispatcher.is_active());
}
