//! A GET against a backend that never answers blocks until stop.

use crate::common::*;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[test]
fn get_blocks_while_no_connection_can_succeed() {
    let h = Harness::new(&["a:1", "b:1"]);
    h.faults("a:1").set_online(false);
    h.faults("b:1").set_online(false);

    let (tx, rx) = mpsc::channel();
    let dispatcher = Arc::clone(&h.dispatcher);
    let caller = thread::spawn(move || tx.send(dispatcher.get("k")).unwrap());

    // Generous compared to the 20 ms poll and 50 ms reconnect delay.
    assert!(rx.recv_timeout(Duration::from_millis(500)).is_err());
    assert!(h.faults("a:1").reconnect_attempts() >= 2);
    assert_eq!(h.stats().live_connections, 0);

    h.dispatcher.stop(true);
    assert_eq!(rx.recv_timeout(PATIENCE).unwrap(), None);
    caller.join().unwrap();
}
