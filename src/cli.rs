// CLI definitions using clap

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "rn42_console")]
#[command(author, version, about = "Interactive console for RN-42 Bluetooth HID modules")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Config file path (default: ~/.config/rn42/console.toml)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Serial device the module is attached to
    #[arg(short, long, global = true, value_name = "PATH")]
    pub port: Option<String>,

    /// Baud rate
    #[arg(short, long, global = true)]
    pub baud: Option<u32>,

    /// Handshake attempts before giving up
    #[arg(long, global = true)]
    pub attempts: Option<u32>,

    /// Wait after each handshake write (ms)
    #[arg(long = "settle-ms", global = true, value_name = "MS")]
    pub settle_ms: Option<u64>,

    /// Enable transport monitoring (prints all writes/reads to stderr)
    #[arg(long, global = true)]
    pub monitor: bool,

    /// Show raw hex dump alongside monitored traffic
    #[arg(long, global = true)]
    pub hex: bool,

    /// Monitored directions (all, tx, rx)
    #[arg(long, global = true)]
    pub filter: Option<String>,

    /// Talk to an in-process module simulator instead of a serial port
    #[arg(long, global = true)]
    pub simulate: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Interactive console (default)
    #[command(visible_alias = "c")]
    Console,

    /// Run console lines in order, then close the port
    #[command(visible_alias = "x")]
    Exec {
        /// Lines, e.g. cmdstart "type=mouse" cmdexit
        #[arg(required = true)]
        lines: Vec<String>,
    },

    /// List serial ports
    #[command(visible_alias = "ls")]
    Ports,

    /// Write the default config file
    InitConfig {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_exec_with_overrides() {
        let cli = Cli::parse_from([
            "rn42_console",
            "--simulate",
            "--settle-ms",
            "0",
            "exec",
            "cmdstart",
            "type=mouse",
        ]);
        assert!(cli.simulate);
        assert_eq!(cli.settle_ms, Some(0));
        assert_eq!(cli.log_level, "warn");
        match cli.command {
            Some(Commands::Exec { lines }) => assert_eq!(lines, ["cmdstart", "type=mouse"]),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_default_command_is_none() {
        let cli = Cli::parse_from(["rn42_console", "-p", "/dev/rfcomm0"]);
        assert_eq!(cli.port.as_deref(), Some("/dev/rfcomm0"));
        assert!(cli.command.is_none());
    }
}
