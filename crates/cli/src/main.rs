//! kvrelay: command-line harness for the dispatcher.
//!
//! `kvrelay [flags] get KEY | put KEY VALUE | del KEY | test COUNT`

mod commands;
mod harness;
mod telemetry;

use std::process;

use kvrelay_backend::{MemoryConnector, MemoryStore, RespConnector};
use kvrelay_core::Connector;
use kvrelay_dispatch::Dispatcher;

use commands::build_cli;
use harness::{matches_to_invocation, run_test, Action, BackendKind};

fn main() {
    let matches = build_cli().get_matches();

    let invocation = match matches_to_invocation(&matches) {
        Ok(invocation) => invocation,
        Err(e) => {
            eprintln!("{}", e);
            process::exit(1);
        }
    };

    if let Err(e) = telemetry::initialise(&invocation.config.log) {
        eprintln!("{}", e);
        process::exit(1);
    }

    let connector: Box<dyn Connector> = match invocation.backend {
        BackendKind::Resp => Box::new(RespConnector::default()),
        BackendKind::Memory => Box::new(MemoryConnector::new(MemoryStore::new())),
    };

    let dispatcher = match Dispatcher::from_config(&invocation.config, connector.as_ref()) {
        Ok(dispatcher) => dispatcher,
        Err(e) => {
            eprintln!("{}", e);
            process::exit(1);
        }
    };

    let exit_code = run_action(&dispatcher, invocation.action);
    dispatcher.stop(false);
    process::exit(exit_code);
}

fn run_action(dispatcher: &Dispatcher, action: Action) -> i32 {
    match action {
        Action::Get { key } => {
            let value = dispatcher.get(key).unwrap_or_default();
            println!("GET returned: {}", value);
        }
        Action::Put { key, value } => {
            dispatcher.put(key, value);
        }
        Action::Delete { key } => {
            dispatcher.delete(key);
        }
        Action::Test { count, seed } => {
            let seed = seed.unwrap_or_else(rand::random::<u32>);
            println!("Performing test for {} operations", count);
            match run_test(dispatcher, count, seed) {
                Ok(report) => println!("{}", report),
                Err(e) => {
                    eprintln!("{}", e);
                    return 1;
                }
            }
        }
    }
    0
}
