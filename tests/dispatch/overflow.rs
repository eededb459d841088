//! Drop-oldest overflow of the command queue.

use crate::common::*;
use kvrelay::{BoundedQueue, OverflowPolicy};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[test]
fn full_queue_evicts_its_head() {
    let queue = BoundedQueue::bounded(3, OverflowPolicy::DropOldest);
    for i in 0..3 {
        assert!(queue.enqueue(i));
    }

    assert!(queue.enqueue(3));

    assert_eq!(queue.len(), 3);
    assert_eq!(queue.stats().dropped, 1);
    let items: Vec<i32> = std::iter::from_fn(|| queue.try_dequeue()).collect();
    assert_eq!(items, vec![1, 2, 3]);
}

#[test]
fn single_slot_queue_holds_the_newest_item() {
    let queue = BoundedQueue::bounded(1, OverflowPolicy::DropOldest);
    queue.enqueue("old");
    queue.enqueue("new");
    assert_eq!(queue.len(), 1);
    assert_eq!(queue.try_dequeue(), Some("new"));
}

#[test]
fn dispatcher_keeps_newest_commands_under_overload() {
    let tuning = Tuning {
        queue_capacity: 4,
        ..fast_tuning()
    };
    let h = Harness::with_tuning(&["a:1"], tuning);
    let faults = h.faults("a:1");
    faults.hold();

    h.dispatcher.put("p0", "v");
    h.wait_for_empty_queue();
    for i in 1..=6 {
        assert!(h.dispatcher.put(format!("p{}", i), "v"));
    }
    assert_eq!(h.stats().queued, 4);
    assert_eq!(h.stats().dropped, 2);

    faults.release();
    h.dispatcher.sync().unwrap();

    for key in ["p0", "p3", "p4", "p5", "p6"] {
        assert!(h.store().contains(key), "{} missing", key);
    }
    assert!(!h.store().contains("p1"));
    assert!(!h.store().contains("p2"));
}

#[test]
fn evicted_get_releases_its_caller() {
    let tuning = Tuning {
        queue_capacity: 1,
        ..fast_tuning()
    };
    let h = Harness::with_tuning(&["a:1"], tuning);
    h.store().insert("x", "1");
    let faults = h.faults("a:1");
    faults.hold();

    h.dispatcher.put("p0", "v");
    h.wait_for_empty_queue();

    let (tx, rx) = mpsc::channel();
    let dispatcher = Arc::clone(&h.dispatcher);
    let caller = thread::spawn(move || tx.send(dispatcher.get("x")).unwrap());
    assert!(wait_until(PATIENCE, || h.stats().queued == 1));

    h.dispatcher.put("p1", "v");
    assert_eq!(rx.recv_timeout(PATIENCE).unwrap(), None);
    caller.join().unwrap();

    faults.release();
    h.dispatcher.sync().unwrap();
    assert!(h.store().contains("p1"));
    assert!(rx.recv_timeout(Duration::from_millis(10)).is_err());
}
