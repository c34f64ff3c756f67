//! Command handlers for the CLI application.
//!
//! - `send`: resolve zone commands and program them (direct, daemon, dry run)
//! - `daemon`: run the daemon, ping it
//! - `zones`: describe a machine's zones and modes
//! - `reset`: send a single reset
//! - `config`: configuration file helpers

pub mod config;
pub mod daemon;
pub mod reset;
pub mod send;
pub mod zones;

use awlights_core::{DeviceOpener, Machine, SessionError, StatusCode, UsbOpener};
use awlights_transport::protocol::device::VENDOR_ID;
use tracing::error;

/// Result type for command handlers: a status code, or a start-up failure
pub type CommandResult = anyhow::Result<StatusCode>;

/// Run device work on the blocking pool
pub async fn blocking<T, F>(f: F) -> anyhow::Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    Ok(tokio::task::spawn_blocking(f).await?)
}

/// Catalog entry for `product`, or for the first supported device on USB
pub async fn find_machine(
    product: Option<u16>,
) -> anyhow::Result<Result<&'static Machine, StatusCode>> {
    let found = match product {
        Some(pid) => awlights_core::find_machine(VENDOR_ID, pid)
            .ok_or_else(|| SessionError::NotFound(format!("product {pid:04X} is not catalogued"))),
        None => blocking(|| UsbOpener::any().machine()).await?,
    };
    Ok(found.map_err(|e| {
        error!("{}", e);
        e.status()
    }))
}

/// Map a driver result onto a status code
pub fn status_of<T>(result: Result<T, SessionError>) -> StatusCode {
    match result {
        Ok(_) => StatusCode::Success,
        Err(e) => e.status(),
    }
}
