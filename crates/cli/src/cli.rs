//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// CO2 Bridge - UD-CO2S sensor telemetry bridge
#[derive(Parser, Debug)]
#[command(
    name = "co2-bridge",
    author,
    version,
    about = "UD-CO2S sensor telemetry bridge",
    long_about = "Polls a UD-CO2S CO2/humidity/temperature sensor over its serial link\n\
                  and fans every reading out to the configured output sinks\n\
                  (stdout, MQTT broker, Prometheus metrics endpoint)."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "CO2_BRIDGE_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "CO2_BRIDGE_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the telemetry bridge
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// List serial ports visible on the system
    Ports(PortsArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(short, long, default_value = "config.toml", env = "CO2_BRIDGE_CONFIG")]
    pub config: PathBuf,

    /// Override the serial device path (skips USB discovery)
    #[arg(long, env = "CO2_BRIDGE_DEVICE")]
    pub device: Option<String>,

    /// Override the output sinks to activate (repeatable)
    #[arg(short, long = "output")]
    pub outputs: Vec<String>,

    /// Additional tags attached to every sample (repeatable)
    #[arg(short, long = "tag")]
    pub tags: Vec<String>,

    /// Validate configuration and exit without running
    #[arg(long)]
    pub dry_run: bool,

    /// Channel buffer size for the internal sample queue (minimum 1)
    #[arg(
        long,
        default_value = "16",
        env = "CO2_BRIDGE_BUFFER_SIZE",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub buffer_size: u64,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `ports` command
#[derive(Parser, Debug)]
pub struct PortsArgs {
    /// Only show the port matching the UD-CO2S identifiers
    #[arg(long)]
    pub matching: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_buffer_size_zero_rejected() {
        let result = Cli::try_parse_from(["co2-bridge", "run", "--buffer-size", "0"]);
        assert!(result.is_err(), "a zero sample queue must be rejected");
    }

    #[test]
    fn test_buffer_size_minimum_accepted() {
        let cli = Cli::try_parse_from(["co2-bridge", "run", "--buffer-size", "1"]).unwrap();
        let Commands::Run(args) = cli.command else {
            panic!("expected run command");
        };
        assert_eq!(args.buffer_size, 1);
    }
}
