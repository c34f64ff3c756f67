//! In-memory transport that records every operation
//!
//! Used by tests and by `--dry-run`: it answers GET_STATUS from a script,
//! echoes other requests, and can be told to fail at the interesting points
//! of a session (claiming, recovery, reading, writing).
//!
//! ```
//! use awlights_transport::{GetStatus, LightCommand, PacketLog, RecordingTransport, Transport};
//!
//! let log = PacketLog::default();
//! let mut transport = RecordingTransport::new().with_log(log.clone());
//! let reply = transport.request(&GetStatus.build().unwrap()).unwrap();
//! assert_eq!(reply[0], 0x10);
//! assert_eq!(log.opcodes(), vec![0x06]);
//! ```

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::error::TransportError;
use crate::packet::Packet;
use crate::protocol::{cmd, device, packet, status};
use crate::types::DeviceInfo;
use crate::Transport;

/// One observed transport operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UsbEvent {
    Claim,
    Release,
    DetachKernelDriver,
    AttachKernelDriver,
    SetConfiguration,
    Write(Packet),
    Read,
}

/// Shared, cloneable record of transport operations
#[derive(Debug, Clone, Default)]
pub struct PacketLog(Arc<Mutex<Vec<UsbEvent>>>);

impl PacketLog {
    fn push(&self, event: UsbEvent) {
        self.0.lock().push(event);
    }

    /// Every operation in order
    pub fn events(&self) -> Vec<UsbEvent> {
        self.0.lock().clone()
    }

    /// Only the packets that were written
    pub fn packets(&self) -> Vec<Packet> {
        self.0
            .lock()
            .iter()
            .filter_map(|e| match e {
                UsbEvent::Write(p) => Some(*p),
                _ => None,
            })
            .collect()
    }

    /// Opcodes of the written packets
    pub fn opcodes(&self) -> Vec<u8> {
        self.packets().iter().map(|p| p.opcode()).collect()
    }
}

/// Fake controller backed by a [`PacketLog`]
pub struct RecordingTransport {
    log: PacketLog,
    info: DeviceInfo,
    status_replies: VecDeque<u8>,
    default_status: u8,
    claim_failures: usize,
    fail_recovery: bool,
    read_timeout: bool,
    fail_write_after: Option<usize>,
    writes: usize,
    last_written: Option<Packet>,
}

impl Default for RecordingTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self {
            log: PacketLog::default(),
            info: DeviceInfo::new(device::VENDOR_ID, 0),
            status_replies: VecDeque::new(),
            default_status: status::READY,
            claim_failures: 0,
            fail_recovery: false,
            read_timeout: false,
            fail_write_after: None,
            writes: 0,
            last_written: None,
        }
    }

    /// Record into an existing log
    pub fn with_log(mut self, log: PacketLog) -> Self {
        self.log = log;
        self
    }

    pub fn with_product_id(mut self, pid: u16) -> Self {
        self.info.pid = pid;
        self
    }

    /// Status bytes returned by successive GET_STATUS requests before
    /// falling back to the default status
    pub fn with_status_replies(mut self, replies: impl IntoIterator<Item = u8>) -> Self {
        self.status_replies = replies.into_iter().collect();
        self
    }

    /// Status returned once the scripted replies are exhausted
    pub fn with_default_status(mut self, status: u8) -> Self {
        self.default_status = status;
        self
    }

    /// Make the first `n` interface claims fail as if the kernel owned it
    pub fn fail_claims(mut self, n: usize) -> Self {
        self.claim_failures = n;
        self
    }

    /// Make detach, attach and set-configuration fail
    pub fn fail_recovery(mut self) -> Self {
        self.fail_recovery = true;
        self
    }

    /// Make every read time out
    pub fn read_timeout(mut self) -> Self {
        self.read_timeout = true;
        self
    }

    /// Disconnect after `n` successful writes
    pub fn fail_write_after(mut self, n: usize) -> Self {
        self.fail_write_after = Some(n);
        self
    }

    pub fn log(&self) -> &PacketLog {
        &self.log
    }

    fn recovery_step(&mut self, event: UsbEvent) -> Result<(), TransportError> {
        self.log.push(event);
        if self.fail_recovery {
            return Err(TransportError::UsbBusy("recovery disabled".into()));
        }
        Ok(())
    }
}

impl Transport for RecordingTransport {
    fn claim_interface(&mut self) -> Result<(), TransportError> {
        self.log.push(UsbEvent::Claim);
        if self.claim_failures > 0 {
            self.claim_failures -= 1;
            return Err(TransportError::UsbBusy("interface claimed by kernel".into()));
        }
        Ok(())
    }

    fn release_interface(&mut self) -> Result<(), TransportError> {
        self.log.push(UsbEvent::Release);
        Ok(())
    }

    fn detach_kernel_driver(&mut self) -> Result<(), TransportError> {
        self.recovery_step(UsbEvent::DetachKernelDriver)
    }

    fn attach_kernel_driver(&mut self) -> Result<(), TransportError> {
        self.recovery_step(UsbEvent::AttachKernelDriver)
    }

    fn set_configuration(&mut self) -> Result<(), TransportError> {
        self.recovery_step(UsbEvent::SetConfiguration)
    }

    fn write_packet(&mut self, packet: &Packet) -> Result<(), TransportError> {
        if let Some(limit) = self.fail_write_after {
            if self.writes >= limit {
                return Err(TransportError::Disconnected);
            }
        }
        debug!("Recorded {}: {}", cmd::name(packet.opcode()), packet);
        self.log.push(UsbEvent::Write(*packet));
        self.writes += 1;
        self.last_written = Some(*packet);
        Ok(())
    }

    fn read_packet(&mut self) -> Result<Vec<u8>, TransportError> {
        self.log.push(UsbEvent::Read);
        if self.read_timeout {
            return Err(TransportError::Timeout);
        }

        let mut reply = vec![packet::FILL_BYTE; packet::DATA_LENGTH];
        match self.last_written {
            Some(p) if p.opcode() == cmd::GET_STATUS => {
                reply[0] = self
                    .status_replies
                    .pop_front()
                    .unwrap_or(self.default_status);
            }
            Some(p) => reply.copy_from_slice(p.as_bytes()),
            None => reply[0] = self.default_status,
        }
        Ok(reply)
    }

    fn device_info(&self) -> &DeviceInfo {
        &self.info
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::{GetStatus, LightCommand, Reset};

    #[test]
    fn test_scripted_status_then_default() {
        let mut t = RecordingTransport::new().with_status_replies([status::BUSY]);
        let get = GetStatus.build().unwrap();
        assert_eq!(t.request(&get).unwrap()[0], status::BUSY);
        assert_eq!(t.request(&get).unwrap()[0], status::READY);
    }

    #[test]
    fn test_claim_failures_are_consumed() {
        let mut t = RecordingTransport::new().fail_claims(1);
        assert!(t.claim_interface().is_err());
        assert!(t.claim_interface().is_ok());
        assert_eq!(t.log().events(), vec![UsbEvent::Claim, UsbEvent::Claim]);
    }

    #[test]
    fn test_non_status_requests_echo() {
        let mut t = RecordingTransport::new();
        let p = Reset::default().build().unwrap();
        assert_eq!(t.request(&p).unwrap(), p.as_bytes());
    }

    #[test]
    fn test_write_failure_after_limit() {
        let mut t = RecordingTransport::new().fail_write_after(1);
        let p = GetStatus.build().unwrap();
        assert!(t.write_packet(&p).is_ok());
        assert!(matches!(
            t.write_packet(&p),
            Err(TransportError::Disconnected)
        ));
        assert_eq!(t.log().packets().len(), 1);
    }
}
