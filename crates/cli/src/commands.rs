//! Clap command tree definition.

use clap::{Arg, ArgAction, Command};

/// Build the complete CLI command tree.
pub fn build_cli() -> Command {
    Command::new("kvrelay")
        .about("Resilient command dispatcher for key-value backends")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .help("Config file (default: ./kvrelay.toml if present)")
                .global(true),
        )
        .arg(
            Arg::new("addresses")
                .long("addresses")
                .short('a')
                .help("Comma-separated host:port list, overrides the config file")
                .global(true),
        )
        .arg(
            Arg::new("backend")
                .long("backend")
                .help("Backend protocol")
                .value_parser(["resp", "memory"])
                .default_value("resp")
                .global(true),
        )
        .arg(
            Arg::new("log-filter")
                .long("log-filter")
                .help("tracing filter expression, e.g. kvrelay=debug")
                .global(true),
        )
        .arg(
            Arg::new("log-format")
                .long("log-format")
                .help("Log output format")
                .value_parser(["compact", "json"])
                .global(true),
        )
        .subcommand(
            Command::new("get")
                .about("Fetch a key and print it")
                .arg(Arg::new("key").required(true)),
        )
        .subcommand(
            Command::new("put")
                .about("Store a value under a key")
                .arg(Arg::new("key").required(true))
                .arg(Arg::new("value").required(true)),
        )
        .subcommand(
            Command::new("del")
                .visible_alias("delete")
                .about("Remove a key")
                .arg(Arg::new("key").required(true)),
        )
        .subcommand(
            Command::new("test")
                .about("PUT, GET and DELETE COUNT generated keys and report timings")
                .arg(
                    Arg::new("count")
                        .required(true)
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    Arg::new("seed")
                        .long("seed")
                        .help("Key suffix seed (default: random)")
                        .value_parser(clap::value_parser!(u32))
                        .action(ArgAction::Set),
                ),
        )
}
