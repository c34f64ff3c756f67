//! Transport layer for Alienware AlienFX lighting controllers
//!
//! This crate knows how to frame controller packets and move them over USB
//! control transfers. It knows nothing about machines, zones or colors
//! beyond their wire representation.
//!
//! - [`UsbTransport`] talks to real hardware through libusb
//! - [`RecordingTransport`] records traffic for tests and dry runs

pub mod discovery;
pub mod error;
pub mod packet;
pub mod protocol;
pub mod recording;
pub mod types;
pub mod usb;

pub use discovery::list_devices;
pub use error::TransportError;
pub use packet::{
    bytes_zone, define_packet, EndLoop, GetStatus, LightCommand, Packet, PacketError, Reset,
    Save, SetColor, SetMode, SetMorph, SetPulse, SetSpeed, TransmitExecute,
};
pub use recording::{PacketLog, RecordingTransport, UsbEvent};
pub use types::{DeviceInfo, PackedColor, ZoneMask};
pub use usb::UsbTransport;

/// The core transport trait - all backends implement this
///
/// Operations are blocking; async callers move the whole session onto a
/// blocking thread. A transport is owned by exactly one session at a time.
pub trait Transport: Send {
    /// Claim the lighting interface for exclusive use
    fn claim_interface(&mut self) -> Result<(), TransportError>;

    /// Give the lighting interface back
    fn release_interface(&mut self) -> Result<(), TransportError>;

    /// Detach whatever kernel driver holds the interface
    fn detach_kernel_driver(&mut self) -> Result<(), TransportError>;

    /// Re-attach the kernel driver
    fn attach_kernel_driver(&mut self) -> Result<(), TransportError>;

    /// Select the controller's configuration
    fn set_configuration(&mut self) -> Result<(), TransportError>;

    /// Write one packet
    fn write_packet(&mut self, packet: &Packet) -> Result<(), TransportError>;

    /// Read one reply of up to a packet's length
    fn read_packet(&mut self) -> Result<Vec<u8>, TransportError>;

    /// Get device information
    fn device_info(&self) -> &DeviceInfo;

    /// Write a packet and read the controller's reply
    fn request(&mut self, packet: &Packet) -> Result<Vec<u8>, TransportError> {
        self.write_packet(packet)?;
        self.read_packet()
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn claim_interface(&mut self) -> Result<(), TransportError> {
        (**self).claim_interface()
    }

    fn release_interface(&mut self) -> Result<(), TransportError> {
        (**self).release_interface()
    }

    fn detach_kernel_driver(&mut self) -> Result<(), TransportError> {
        (**self).detach_kernel_driver()
    }

    fn attach_kernel_driver(&mut self) -> Result<(), TransportError> {
        (**self).attach_kernel_driver()
    }

    fn set_configuration(&mut self) -> Result<(), TransportError> {
        (**self).set_configuration()
    }

    fn write_packet(&mut self, packet: &Packet) -> Result<(), TransportError> {
        (**self).write_packet(packet)
    }

    fn read_packet(&mut self) -> Result<Vec<u8>, TransportError> {
        (**self).read_packet()
    }

    fn device_info(&self) -> &DeviceInfo {
        (**self).device_info()
    }

    fn request(&mut self, packet: &Packet) -> Result<Vec<u8>, TransportError> {
        (**self).request(packet)
    }
}
