//! Stop modes.

use crate::common::*;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

#[test]
fn immediate_stop_discards_queued_commands() {
    let h = Harness::new(&["a:1"]);
    let faults = h.faults("a:1");
    faults.hold();

    h.dispatcher.put("c0", "v");
    h.wait_for_empty_queue();
    for i in 1..10 {
        h.dispatcher.put(format!("c{}", i), "v");
    }

    let dispatcher = Arc::clone(&h.dispatcher);
    let stopper = thread::spawn(move || dispatcher.stop(true));
    thread::sleep(Duration::from_millis(50));
    faults.release();
    stopper.join().unwrap();

    // Only the command already in flight reaches the backend.
    assert_eq!(h.store().writes(), 1);
    assert!(h.store().contains("c0"));
    assert_eq!(h.stats().queued, 0);
    assert!(!h.dispatcher.is_active());
}

#[test]
fn graceful_stop_drains_first() {
    let h = Harness::new(&["a:1"]);
    for i in 0..50 {
        h.dispatcher.put(format!("k{}", i), "v");
    }

    h.dispatcher.stop(false);

    assert_eq!(h.store().len(), 50);
    assert!(!h.dispatcher.is_active());
}

#[test]
fn stopped_dispatcher_refuses_work() {
    let h = Harness::new(&["a:1"]);
    h.dispatcher.stop(false);

    assert!(!h.dispatcher.put("k", "v"));
    assert!(!h.dispatcher.delete("k"));
    assert_eq!(h.dispatcher.get("k"), None);
    assert!(h.store().is_empty());
}

#[test]
fn stop_is_idempotent() {
    let h = Harness::new(&["a:1"]);
    h.dispatcher.stop(false);
    h.dispatcher.stop(true);
    h.dispatcher.stop(false);
    assert!(!h.dispatcher.is_active());
}

#[test]
fn stop_returns_while_reconnects_keep_failing() {
    let tuning = Tuning {
        reconnect_delay: Duration::from_secs(60),
        ..fast_tuning()
    };
    let h = Harness::with_tuning(&["a:1"], tuning);
    h.faults("a:1").set_online(false);
    h.dispatcher.put("k", "v");
    assert!(wait_until(PATIENCE, || h.faults("a:1").reconnect_attempts() >= 1));

    let started = Instant::now();
    h.dispatcher.stop(true);
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[test]
fn dropping_the_dispatcher_stops_it() {
    let connector = MemoryConnector::new(MemoryStore::new());
    let dispatcher = Dispatcher::connect(&["a:1"], &connector, fast_tuning()).unwrap();
    dispatcher.put("k", "v");
    dispatcher.sync().unwrap();
    drop(dispatcher);
    assert!(connector.store().contains("k"));
}

#[test]
fn immediate_stop_ends_a_sync_stuck_on_a_dead_backend() {
    let h = Harness::new(&["a:1"]);
    h.faults("a:1").set_online(false);
    h.dispatcher.put("k", "v");

    let (synced_tx, synced_rx) = mpsc::channel();
    let dispatcher = Arc::clone(&h.dispatcher);
    let syncer = thread::spawn(move || synced_tx.send(dispatcher.sync()).unwrap());
    assert!(synced_rx.recv_timeout(Duration::from_millis(200)).is_err());

    let (stopped_tx, stopped_rx) = mpsc::channel();
    let dispatcher = Arc::clone(&h.dispatcher);
    let stopper = thread::spawn(move || {
        dispatcher.stop(true);
        stopped_tx.send(()).unwrap();
    });

    stopped_rx
        .recv_timeout(PATIENCE)
        .expect("stop(true) should not wait behind sync");
    assert!(synced_rx.recv_timeout(PATIENCE).unwrap().is_ok());
    stopper.join().unwrap();
    syncer.join().unwrap();

    assert!(!h.dispatcher.is_active());
    assert_eq!(h.stats().queued, 0);
    assert!(h.store().is_empty());
    // The drained processor was not restarted.
    assert!(!h.dispatcher.put("late", "v"));
}

#[test]
fn callers_racing_stop_are_always_released() {
    for _ in 0..20 {
        let h = Harness::new(&["a:1"]);
        h.store().insert("k", "v");

        let (done_tx, done_rx) = mpsc::channel();
        let callers: Vec<_> = (0..8)
            .map(|_| {
                let dispatcher = Arc::clone(&h.dispatcher);
                let done = done_tx.clone();
                thread::spawn(move || {
                    while dispatcher.get("k").is_some() {
                        dispatcher.put("k", "v");
                    }
                    done.send(()).unwrap();
                })
            })
            .collect();

        thread::sleep(Duration::from_millis(10));
        h.dispatcher.stop(true);

        for _ in 0..callers.len() {
            done_rx
                .recv_timeout(PATIENCE)
                .expect("a caller stayed blocked after stop");
        }
        for caller in callers {
            caller.join().unwrap();
        }
        assert_eq!(h.stats().queued, 0);
    }
}

#[test]
fn sync_and_stop_do_not_wait_out_the_poll_interval() {
    let tuning = Tuning {
        poll_interval: Duration::from_secs(30),
        ..fast_tuning()
    };
    let h = Harness::with_tuning(&["a:1"], tuning);
    h.dispatcher.put("k", "v");
    thread::sleep(Duration::from_millis(50));

    let started = Instant::now();
    h.dispatcher.sync().unwrap();
    assert!(started.elapsed() < Duration::from_secs(5));
    assert!(h.store().contains("k"));
    thread::sleep(Duration::from_millis(50));

    let started = Instant::now();
    h.dispatcher.stop(true);
    assert!(started.elapsed() < Duration::from_secs(5));
}
