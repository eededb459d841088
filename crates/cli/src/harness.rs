//! ArgMatches → invocation conversion and the operations the binary runs.

use std::fmt;
use std::path::Path;
use std::time::{Duration, Instant};

use clap::ArgMatches;
use kvrelay_core::{parse_address_list, Endpoint, LogFormat, RelayConfig, CONFIG_FILE_NAME};
use kvrelay_dispatch::Dispatcher;

/// What the user asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Print the value of `key`.
    Get { key: String },
    /// Store `value` under `key`.
    Put { key: String, value: String },
    /// Remove `key`.
    Delete { key: String },
    /// Round-trip `count` generated keys.
    Test { count: usize, seed: Option<u32> },
}

/// Backend protocol selected with `--backend`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Redis-compatible server over TCP.
    Resp,
    /// Process-local store, useful for trying the harness without a server.
    Memory,
}

/// Fully resolved command line.
#[derive(Debug)]
pub struct Invocation {
    pub config: RelayConfig,
    pub backend: BackendKind,
    pub action: Action,
}

/// Resolve config file, overrides and subcommand.
pub fn matches_to_invocation(matches: &ArgMatches) -> Result<Invocation, String> {
    let mut config = load_config(matches.get_one::<String>("config").map(String::as_str))?;

    if let Some(list) = matches.get_one::<String>("addresses") {
        config.addresses = parse_address_list(list);
    }
    if config.addresses.is_empty() {
        return Err("no backend addresses: pass --addresses or list them in the config file".into());
    }
    for address in &config.addresses {
        address
            .parse::<Endpoint>()
            .map_err(|e| e.to_string())?;
    }

    if let Some(filter) = matches.get_one::<String>("log-filter") {
        config.log.filter = filter.clone();
    }
    if let Some(format) = matches.get_one::<String>("log-format") {
        config.log.format = format.parse::<LogFormat>().map_err(|e| e.to_string())?;
    }

    let backend = match matches.get_one::<String>("backend").map(String::as_str) {
        Some("memory") => BackendKind::Memory,
        _ => BackendKind::Resp,
    };

    let action = match matches.subcommand() {
        Some(("get", sub)) => Action::Get { key: required(sub, "key")? },
        Some(("put", sub)) => Action::Put {
            key: required(sub, "key")?,
            value: required(sub, "value")?,
        },
        Some(("del", sub)) => Action::Delete { key: required(sub, "key")? },
        Some(("test", sub)) => Action::Test {
            count: sub.get_one::<usize>("count").copied().ok_or("missing COUNT")?,
            seed: sub.get_one::<u32>("seed").copied(),
        },
        Some((other, _)) => return Err(format!("unknown command '{}'", other)),
        None => return Err("no command given".into()),
    };

    Ok(Invocation {
        config,
        backend,
        action,
    })
}

fn load_config(path: Option<&str>) -> Result<RelayConfig, String> {
    match path {
        Some(path) => RelayConfig::from_file(Path::new(path)).map_err(|e| e.to_string()),
        None if Path::new(CONFIG_FILE_NAME).exists() => {
            RelayConfig::from_file(Path::new(CONFIG_FILE_NAME)).map_err(|e| e.to_string())
        }
        None => Ok(RelayConfig::default()),
    }
}

fn required(matches: &ArgMatches, name: &str) -> Result<String, String> {
    matches
        .get_one::<String>(name)
        .cloned()
        .ok_or_else(|| format!("missing {}", name.to_uppercase()))
}

/// Timings of one `test` run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TestReport {
    pub count: usize,
    pub errors: usize,
    pub put: Duration,
    pub get: Duration,
    pub delete: Duration,
}

impl TestReport {
    pub fn total(&self) -> Duration {
        self.put + self.get + self.delete
    }
}

impl fmt::Display for TestReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Test for {} operations completed", self.count)?;
        writeln!(f, "  total:  {} ms", self.total().as_millis())?;
        writeln!(f, "  PUT:    {} ms", self.put.as_millis())?;
        writeln!(f, "  GET:    {} ms", self.get.as_millis())?;
        writeln!(f, "  DELETE: {} ms", self.delete.as_millis())?;
        write!(f, "  errors: {}", self.errors)
    }
}

/// PUT `count` keys, read them back, then delete them, with a `sync`
/// barrier after each phase.
///
/// A key whose value does not read back as written counts as an error.
pub fn run_test(
    dispatcher: &Dispatcher,
    count: usize,
    seed: u32,
) -> kvrelay_core::Result<TestReport> {
    let pairs: Vec<(String, String)> = (0..count as u64)
        .map(|i| {
            let n = u64::from(seed) + i;
            (format!("key{}", n), format!("value{}", n))
        })
        .collect();

    let started = Instant::now();
    for (key, value) in &pairs {
        dispatcher.put(key.as_str(), value.as_str());
    }
    dispatcher.sync()?;
    let put = started.elapsed();

    let started = Instant::now();
    let mut errors = 0;
    for (key, value) in &pairs {
        if dispatcher.get(key.as_str()).as_deref() != Some(value.as_str()) {
            errors += 1;
        }
    }
    dispatcher.sync()?;
    let get = started.elapsed();

    let started = Instant::now();
    for (key, _) in &pairs {
        dispatcher.delete(key.as_str());
    }
    dispatcher.sync()?;
    let delete = started.elapsed();

    Ok(TestReport {
        count,
        errors,
        put,
        get,
        delete,
    })
}
