//! Alienware lighting CLI
//!
//! Programs the lighting controller directly, through the daemon, or as a
//! dry run. The process exit code is the status code.

use std::process::ExitCode;

use awlights::config::AppConfig;
use awlights_core::StatusCode;
use clap::Parser;
use tracing::error;

// CLI definitions
mod cli;
use cli::{Cli, Commands};

// Command handlers
mod commands;

/// Filter directive enabled by `send --trace-packets`
const TRACE_PACKETS: &str = "awlights_transport=debug";

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(status) => {
            if !status.is_success() {
                error!("{}", status.message());
            }
            ExitCode::from(status.code() as u8)
        }
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<StatusCode> {
    let config_path = cli.config.clone().unwrap_or_else(AppConfig::default_path);
    let mut config = AppConfig::load(&config_path)?;
    if let Some(level) = cli.log_level {
        config.log.level = level;
    }
    if let Some(format) = cli.log_format {
        config.log.format = format;
    }

    let trace_packets = matches!(
        cli.command,
        Some(Commands::Send {
            trace_packets: true,
            ..
        })
    );
    let directives: &[&str] = if trace_packets { &[TRACE_PACKETS] } else { &[] };
    awlights::logging::init(&config.log.level, config.log.format, directives)?;

    match cli.command {
        None => commands::zones::list(None).await,

        Some(Commands::Send {
            zones,
            modes,
            speed,
            save,
            override_groups,
            daemon,
            host,
            port,
            dry_run,
            product,
            trace_packets: _,
        }) => {
            let args = commands::send::SendArgs {
                zones,
                modes,
                speed: speed.unwrap_or(config.lights.speed),
                save: save || config.lights.save,
                override_groups: override_groups || config.lights.override_groups,
                product,
            };
            let target = if dry_run {
                commands::send::Target::DryRun
            } else if daemon {
                if let Some(host) = host {
                    config.daemon.host = host;
                }
                if let Some(port) = port {
                    config.daemon.port = port;
                }
                commands::send::Target::Daemon(config.daemon)
            } else {
                commands::send::Target::Direct
            };
            commands::send::send(args, target).await
        }

        Some(Commands::Daemon {
            host,
            port,
            encoding,
        }) => {
            if let Some(host) = host {
                config.daemon.host = host;
            }
            if let Some(port) = port {
                config.daemon.port = port;
            }
            if let Some(encoding) = encoding {
                config.daemon.encoding = encoding;
            }
            commands::daemon::serve(&config.daemon).await
        }

        Some(Commands::Ping { host, port }) => {
            if let Some(host) = host {
                config.daemon.host = host;
            }
            if let Some(port) = port {
                config.daemon.port = port;
            }
            commands::daemon::ping(&config.daemon).await
        }

        Some(Commands::Zones { product }) => commands::zones::list(product).await,

        Some(Commands::Reset { kind }) => commands::reset::reset(kind).await,

        Some(Commands::Config { action }) => match action {
            cli::ConfigCommands::Init { force } => commands::config::init(&config_path, force),
            cli::ConfigCommands::Show => commands::config::show(&config_path, &config),
        },
    }
}
