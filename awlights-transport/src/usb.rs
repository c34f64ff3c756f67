//! USB transport using class control transfers
//!
//! The lighting controller is not a regular HID device from the kernel's
//! point of view: we detach whatever driver owns interface 0 and talk to it
//! with raw SET_REPORT / GET_REPORT control transfers.

use std::time::Duration;

use rusb::{DeviceHandle, GlobalContext};
use tracing::{debug, trace};

use crate::error::TransportError;
use crate::packet::Packet;
use crate::protocol::{cmd, packet, timing, usb};
use crate::types::DeviceInfo;
use crate::Transport;

/// Transport for a controller attached over USB
pub struct UsbTransport {
    handle: DeviceHandle<GlobalContext>,
    info: DeviceInfo,
    timeout: Duration,
}

impl UsbTransport {
    /// Wrap an already-opened device handle
    pub fn new(handle: DeviceHandle<GlobalContext>, info: DeviceInfo) -> Self {
        Self {
            handle,
            info,
            timeout: Duration::from_millis(timing::TRANSFER_TIMEOUT_MS),
        }
    }

    /// Open the first device matching vendor and product id
    pub fn open(vid: u16, pid: u16) -> Result<Self, TransportError> {
        let handle = rusb::open_device_with_vid_pid(vid, pid).ok_or_else(|| {
            TransportError::DeviceNotFound(format!("{vid:04X}:{pid:04X}"))
        })?;
        let device = handle.device();
        let info = DeviceInfo {
            vid,
            pid,
            bus: Some(device.bus_number()),
            address: Some(device.address()),
        };
        debug!(
            "Opened {:04X}:{:04X} at bus {} address {}",
            vid,
            pid,
            device.bus_number(),
            device.address()
        );
        Ok(Self::new(handle, info))
    }
}

impl Transport for UsbTransport {
    fn claim_interface(&mut self) -> Result<(), TransportError> {
        self.handle.claim_interface(usb::INTERFACE)?;
        Ok(())
    }

    fn release_interface(&mut self) -> Result<(), TransportError> {
        self.handle.release_interface(usb::INTERFACE)?;
        Ok(())
    }

    fn detach_kernel_driver(&mut self) -> Result<(), TransportError> {
        self.handle.detach_kernel_driver(usb::INTERFACE)?;
        Ok(())
    }

    fn attach_kernel_driver(&mut self) -> Result<(), TransportError> {
        self.handle.attach_kernel_driver(usb::INTERFACE)?;
        Ok(())
    }

    fn set_configuration(&mut self) -> Result<(), TransportError> {
        self.handle.set_active_configuration(usb::CONFIGURATION)?;
        Ok(())
    }

    fn write_packet(&mut self, packet: &Packet) -> Result<(), TransportError> {
        debug!("Sending {}: {}", cmd::name(packet.opcode()), packet);
        let written = self.handle.write_control(
            usb::SEND_REQUEST_TYPE,
            usb::SEND_REQUEST,
            usb::SEND_VALUE,
            usb::SEND_INDEX,
            packet.as_bytes(),
            self.timeout,
        )?;
        if written != packet.len() {
            return Err(TransportError::ShortTransfer {
                expected: packet.len(),
                actual: written,
            });
        }
        Ok(())
    }

    fn read_packet(&mut self) -> Result<Vec<u8>, TransportError> {
        let mut buf = vec![0u8; packet::DATA_LENGTH];
        let read = self.handle.read_control(
            usb::READ_REQUEST_TYPE,
            usb::READ_REQUEST,
            usb::READ_VALUE,
            usb::READ_INDEX,
            &mut buf,
            self.timeout,
        )?;
        buf.truncate(read);
        trace!("Received: {:02X?}", buf);
        Ok(buf)
    }

    fn device_info(&self) -> &DeviceInfo {
        &self.info
    }
}
