//! Command-line interface handling for `gwctl`.
//!
//! Argument parsing uses the `clap` builder API. Parsing is split from
//! `std::env::args` so the command table can be exercised in tests.

use clap::{Arg, ArgMatches, Command};
use std::path::PathBuf;

/// Operation selected on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolCommand {
    /// Load and validate the configuration
    Check,
    /// Split a wire command into service type and local command
    Decode { cmd: u32 },
    /// Build a wire command from service type and local command
    Encode { service_type: u32, local_cmd: u32 },
}

/// Command line arguments parsed from user input.
#[derive(Debug, Clone)]
pub struct CliArgs {
    /// Path to the router configuration file
    pub config_path: PathBuf,
    /// Optional override for log level
    pub log_level: Option<String>,
    /// Whether to force JSON log output
    pub json_logs: bool,
    pub command: ToolCommand,
}

impl CliArgs {
    /// Parses the process arguments. Exits with usage on malformed input.
    pub fn parse() -> Self {
        Self::from_matches(&command().get_matches())
    }

    /// Parses an explicit argument list.
    pub fn try_parse_from<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Ok(Self::from_matches(&command().try_get_matches_from(args)?))
    }

    fn from_matches(matches: &ArgMatches) -> Self {
        let command = match matches.subcommand() {
            Some(("decode", sub)) => ToolCommand::Decode {
                cmd: *sub.get_one::<u32>("cmd").unwrap_or(&0),
            },
            Some(("encode", sub)) => ToolCommand::Encode {
                service_type: *sub.get_one::<u32>("service-type").unwrap_or(&0),
                local_cmd: *sub.get_one::<u32>("local-cmd").unwrap_or(&0),
            },
            _ => ToolCommand::Check,
        };

        Self {
            config_path: matches
                .get_one::<String>("config")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("router.toml")),
            log_level: matches.get_one::<String>("log-level").cloned(),
            json_logs: matches.get_flag("json-logs"),
            command,
        }
    }
}

fn command() -> Command {
    Command::new("gwctl")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Inspect and validate gateway router configuration")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Router configuration file path")
                .default_value("router.toml")
                .global(true),
        )
        .arg(
            Arg::new("log-level")
                .short('l')
                .long("log-level")
                .value_name("LEVEL")
                .help("Log level (trace, debug, info, warn, error)")
                .global(true),
        )
        .arg(
            Arg::new("json-logs")
                .long("json-logs")
                .help("Output logs in JSON format")
                .action(clap::ArgAction::SetTrue)
                .global(true),
        )
        .subcommand(Command::new("check").about("Load and validate the configuration"))
        .subcommand(
            Command::new("decode")
                .about("Split a wire command into service type and local command")
                .arg(
                    Arg::new("cmd")
                        .value_name("CMD")
                        .required(true)
                        .value_parser(clap::value_parser!(u32)),
                ),
        )
        .subcommand(
            Command::new("encode")
                .about("Build a wire command from a service type and local command")
                .arg(
                    Arg::new("service-type")
                        .value_name("SERVICE_TYPE")
                        .required(true)
                        .value_parser(clap::value_parser!(u32)),
                )
                .arg(
                    Arg::new("local-cmd")
                        .value_name("LOCAL_CMD")
                        .required(true)
                        .value_parser(clap::value_parser!(u32)),
                ),
        )
}
