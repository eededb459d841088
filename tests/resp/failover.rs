//! Failover and recovery over TCP.

use crate::common::*;
use crate::server::FakeServer;
use kvrelay::RespConnector;
use std::time::Duration;

fn connector() -> RespConnector {
    RespConnector {
        connect_timeout: Duration::from_millis(500),
        io_timeout: Some(Duration::from_secs(2)),
    }
}

#[test]
fn round_trip_over_tcp() {
    let server = FakeServer::start();
    let dispatcher = Dispatcher::connect(&[server.address()], &connector(), fast_tuning()).unwrap();

    assert!(dispatcher.put("a", "1"));
    assert_eq!(dispatcher.get("a"), Some("1".to_string()));
    assert!(dispatcher.delete("a"));
    assert_eq!(dispatcher.get("a"), None);
    dispatcher.stop(false);
}

#[test]
fn commands_fail_over_when_primary_goes_down() {
    let mut primary = FakeServer::start();
    let secondary = FakeServer::start();
    let dispatcher = Dispatcher::connect(
        &[primary.address(), secondary.address()],
        &connector(),
        fast_tuning(),
    )
    .unwrap();

    dispatcher.put("before", "1");
    dispatcher.sync().unwrap();
    assert_eq!(primary.get("before"), Some("1".to_string()));

    primary.shutdown();
    dispatcher.put("after", "2");
    dispatcher.sync().unwrap();

    assert_eq!(secondary.get("after"), Some("2".to_string()));
    let stats = dispatcher.stats();
    assert_eq!(stats.retried, 1);
    assert_eq!(stats.live_connections, 1);
    dispatcher.stop(true);
}

#[test]
fn get_completes_once_the_only_server_returns() {
    let mut server = FakeServer::start();
    let port = server.port();
    let data = server.data();
    let dispatcher = std::sync::Arc::new(
        Dispatcher::connect(&[server.address()], &connector(), fast_tuning()).unwrap(),
    );
    dispatcher.put("k", "v");
    dispatcher.sync().unwrap();

    server.shutdown();
    let caller = {
        let dispatcher = std::sync::Arc::clone(&dispatcher);
        std::thread::spawn(move || dispatcher.get("k"))
    };
    std::thread::sleep(Duration::from_millis(200));
    assert!(!caller.is_finished());

    let _revived = FakeServer::start_on(port, data);
    assert_eq!(caller.join().unwrap(), Some("v".to_string()));
    assert!(dispatcher.stats().reconnects >= 1);
    dispatcher.stop(false);
}
