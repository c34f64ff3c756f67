//! `awlights daemon` and `awlights ping`

use awlights::config::DaemonConfig;
use awlights::daemon::{Client, Server};
use awlights_core::{Driver, StatusCode};
use tracing::{error, info};

use super::CommandResult;

/// Serve until Ctrl-C
pub async fn serve(config: &DaemonConfig) -> CommandResult {
    let server = Server::bind(config.addr()?, Driver::usb(), config.encoding).await?;
    server
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Cannot listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await;
    Ok(StatusCode::Success)
}

pub async fn ping(config: &DaemonConfig) -> CommandResult {
    let client = Client::new(&config.host, config.port).with_encoding(config.encoding);
    match client.ping().await {
        Ok(response) if response.success => {
            info!("Daemon at {}:{} is alive", config.host, config.port);
            println!("pong");
            Ok(StatusCode::Success)
        }
        Ok(response) => Ok(response.status().unwrap_or(StatusCode::BadResponseJson)),
        Err(e) => {
            error!("{}", e);
            Ok(e.status())
        }
    }
}
