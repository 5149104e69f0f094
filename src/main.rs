#[macro_use] mod core;
mod api;
mod config;
mod error;
mod metrics;
mod processor;
mod stat;
mod types;

#[cfg(test)] mod testing;

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Arg, ArgAction, Command, value_parser};
use easy_logging::LoggingConfig;
use log::{Level, error};

use crate::config::Config;
use crate::core::GenericResult;
use crate::processor::Action;
use crate::stat::OutputFormat;

fn main() -> ExitCode {
    let args = match parse_args() {
        Ok(args) => args,
        Err(err) => {
            let _ = writeln!(io::stderr(), "{err}.");
            return ExitCode::FAILURE;
        }
    };

    if let Err(err) = LoggingConfig::new(module_path!(), args.log_level).minimal().build() {
        let _ = writeln!(io::stderr(), "Failed to initialize the logging: {err}.");
        return ExitCode::FAILURE;
    }

    let default_panic_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        default_panic_hook(info);
        std::process::abort();
    }));

    let config = match Config::load(&args.config_path) {
        Ok(config) => config,
        Err(err) => {
            error!("{err}.");
            return ExitCode::FAILURE;
        }
    };

    if let Err(err) = processor::process(&config, &args.action) {
        error!("{err}.");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

struct Args {
    config_path: PathBuf,
    action: Action,
    log_level: Level,
}

fn parse_args() -> GenericResult<Args> {
    let matches = Command::new(env!("CARGO_PKG_NAME"))
        .version(env!("CARGO_PKG_VERSION"))
        .about(env!("CARGO_PKG_DESCRIPTION"))

        .dont_collapse_args_in_usage(true)
        .disable_help_subcommand(true)
        .help_expected(true)

        .args([
            Arg::new("verbose")
                .short('v').long("verbose")
                .action(ArgAction::Count)
                .help("Set verbosity level"),

            Arg::new("config")
                .short('c').long("config")
                .value_name("PATH")
                .value_parser(value_parser!(PathBuf))
                .default_value(config::DEFAULT_PATH)
                .help("Configuration file path"),

            Arg::new("table")
                .long("table")
                .action(ArgAction::SetTrue)
                .conflicts_with("list_graphs")
                .help("Print the report as a table"),

            Arg::new("list_graphs")
                .long("list-graphs")
                .value_name("HOST_ID")
                .help("List graphs of the host instead of reporting"),
        ])

        .get_matches();

    let log_level = match matches.get_count("verbose") {
        0 => Level::Info,
        1 => Level::Debug,
        2 => Level::Trace,
        _ => return Err!("Invalid verbosity level"),
    };

    let action = match matches.get_one::<String>("list_graphs") {
        Some(host_id) => Action::ListGraphs {host_id: host_id.clone()},
        None => Action::Report(if matches.get_flag("table") {
            OutputFormat::Table
        } else {
            OutputFormat::Text
        }),
    };

    Ok(Args {
        config_path: matches.get_one("config").cloned().unwrap(),
        action,
        log_level,
    })
}
