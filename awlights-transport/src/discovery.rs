//! Device discovery over the USB bus

use tracing::{debug, info};

use crate::error::TransportError;
use crate::protocol::device;
use crate::types::DeviceInfo;

/// List every device on the bus carrying the Alienware vendor id
pub fn list_devices() -> Result<Vec<DeviceInfo>, TransportError> {
    let mut found = Vec::new();

    for dev in rusb::devices()?.iter() {
        let desc = match dev.device_descriptor() {
            Ok(desc) => desc,
            Err(e) => {
                debug!(
                    "Skipping device at bus {} address {}: {}",
                    dev.bus_number(),
                    dev.address(),
                    e
                );
                continue;
            }
        };

        if desc.vendor_id() != device::VENDOR_ID {
            continue;
        }

        debug!(
            "Found device: VID={:04X} PID={:04X} bus={} address={}",
            desc.vendor_id(),
            desc.product_id(),
            dev.bus_number(),
            dev.address()
        );

        found.push(DeviceInfo {
            vid: desc.vendor_id(),
            pid: desc.product_id(),
            bus: Some(dev.bus_number()),
            address: Some(dev.address()),
        });
    }

    info!("Found {} devices", found.len());
    Ok(found)
}
