// CLI definitions using clap

use awlights::config::LogFormat;
use awlights::daemon::Encoding;
use awlights_transport::protocol::reset;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "awlights")]
#[command(author, version, about = "Alienware multi-zone lighting driver")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Log level (trace, debug, info, warn, error); RUST_LOG wins when set
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Log message shape
    #[arg(long, global = true, value_enum)]
    pub log_format: Option<LogFormat>,

    /// Config file (default: ~/.config/awlights/config.toml)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Program zone colors, morphs and pulses
    #[command(visible_alias = "s")]
    Send {
        /// Zone alias (or hex uid) and its commands, e.g. kbd="color:ff0000 pulse:00ff00"
        #[arg(short, long = "zone", value_name = "ZONE=COMMANDS")]
        zones: Vec<String>,

        /// Mode alias (or hex uid) to store the commands for; repeatable
        #[arg(short, long = "mode", value_name = "MODE")]
        modes: Vec<String>,

        /// Theme tempo, clamped to 0-65535
        #[arg(short = 't', long)]
        speed: Option<u32>,

        /// Save changes permanently
        #[arg(short, long)]
        save: bool,

        /// Later single zones override the groups they belong to
        #[arg(short, long)]
        override_groups: bool,

        /// Go through a running daemon
        #[arg(short, long, conflicts_with = "dry_run")]
        daemon: bool,

        /// Daemon host
        #[arg(short = 'i', long, requires = "daemon")]
        host: Option<String>,

        /// Daemon port
        #[arg(short, long, requires = "daemon")]
        port: Option<u16>,

        /// Print the packets instead of sending them
        #[arg(long)]
        dry_run: bool,

        /// Product id to assume instead of probing USB (hex)
        #[arg(long, value_name = "PID", value_parser = parse_hex_u16)]
        product: Option<u16>,

        /// Log every packet written and every reply read
        #[arg(long)]
        trace_packets: bool,
    },

    /// Run the lighting daemon until Ctrl-C
    #[command(visible_aliases = ["serve", "lsd"])]
    Daemon {
        /// Listen host
        #[arg(short = 'i', long)]
        host: Option<String>,

        /// Listen port (0 lets the OS choose)
        #[arg(short, long)]
        port: Option<u16>,

        /// Payload encoding
        #[arg(short, long, value_enum)]
        encoding: Option<Encoding>,
    },

    /// Check that the daemon answers
    Ping {
        /// Daemon host
        #[arg(short = 'i', long)]
        host: Option<String>,

        /// Daemon port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// List zones and modes of the detected (or named) machine
    #[command(visible_aliases = ["list", "ls"])]
    Zones {
        /// Product id to describe instead of probing USB (hex)
        #[arg(long, value_name = "PID", value_parser = parse_hex_u16)]
        product: Option<u16>,
    },

    /// Send a single reset to the controller
    Reset {
        #[arg(value_enum, default_value = "on")]
        kind: ResetKind,
    },

    /// Configuration file helpers
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Write the default configuration
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Print the effective configuration
    Show,
}

/// Named reset types
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum ResetKind {
    /// Touchpad and touch controls
    Touchpad,
    /// Lights on while sleeping
    Sleep,
    /// All lights off
    Off,
    /// All lights on
    On,
}

impl ResetKind {
    pub fn code(self) -> u8 {
        match self {
            ResetKind::Touchpad => reset::TOUCH_CONTROLS,
            ResetKind::Sleep => reset::SLEEP_LIGHTS_ON,
            ResetKind::Off => reset::ALL_LIGHTS_OFF,
            ResetKind::On => reset::ALL_LIGHTS_ON,
        }
    }
}

/// Parse "0525" or "0x0525"
pub fn parse_hex_u16(s: &str) -> Result<u16, String> {
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    u16::from_str_radix(digits, 16).map_err(|e| format!("invalid hex id {s:?}: {e}"))
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
    fn test_parse_send() {
        let cli = Cli::parse_from([
            "awlights",
            "send",
            "--zone",
            "kbd=color:ff0000",
            "-z",
            "touchpad=pulse:00ff00",
            "--mode",
            "ac",
            "--speed",
            "70000",
            "--dry-run",
            "--product",
            "0x0525",
        ]);
        match cli.command {
            Some(Commands::Send {
                zones,
                modes,
                speed,
                dry_run,
                product,
                ..
            }) => {
                assert_eq!(zones, vec!["kbd=color:ff0000", "touchpad=pulse:00ff00"]);
                assert_eq!(modes, vec!["ac"]);
                assert_eq!(speed, Some(70000));
                assert!(dry_run);
                assert_eq!(product, Some(0x0525));
            }
            _ => panic!("expected send"),
        }
    }

    #[test]
    fn test_host_requires_daemon() {
        assert!(Cli::try_parse_from(["awlights", "send", "--host", "x"]).is_err());
        assert!(Cli::try_parse_from(["awlights", "send", "-d", "--dry-run"]).is_err());
    }

    #[test]
    fn test_reset_kinds() {
        assert_eq!(ResetKind::Off.code(), reset::ALL_LIGHTS_OFF);
        let cli = Cli::parse_from(["awlights", "reset"]);
        assert!(matches!(
            cli.command,
            Some(Commands::Reset { kind: ResetKind::On })
        ));
    }

    #[test]
    fn test_hex_ids() {
        assert_eq!(parse_hex_u16("0525"), Ok(0x0525));
        assert_eq!(parse_hex_u16("0X0512"), Ok(0x0512));
        assert!(parse_hex_u16("zz").is_err());
    }
}
