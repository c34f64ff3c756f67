//! `awlights reset`

use awlights_core::Driver;
use tracing::info;

use super::{blocking, status_of, CommandResult};
use crate::cli::ResetKind;

pub async fn reset(kind: ResetKind) -> CommandResult {
    info!("Sending reset {:?} (0x{:02x})", kind, kind.code());
    let driver = Driver::usb();
    Ok(status_of(blocking(move || driver.reset(kind.code())).await?))
}
