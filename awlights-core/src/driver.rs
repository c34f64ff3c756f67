//! Device driver facade shared by the CLI and the daemon
//!
//! A [`Driver`] opens a fresh session per request and serializes sessions
//! behind one lock, so concurrent daemon clients never interleave packets.

use std::time::Duration;

use awlights_transport::protocol::{device::VENDOR_ID, timing};
use awlights_transport::{
    discovery, PacketLog, RecordingTransport, Transport, TransportError, UsbTransport,
};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::catalog;
use crate::error::SessionError;
use crate::machine::Machine;
use crate::resolver::{merge, ResolvedZone};
use crate::session::{DeviceSession, SendOptions, SessionReport};

/// Arguments of a send, as carried by the daemon's `send` method
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SendRequest {
    pub zones: Vec<ResolvedZone>,
    #[serde(default)]
    pub modes: Option<Vec<u8>>,
    #[serde(default)]
    pub speed: u32,
    #[serde(default)]
    pub save: bool,
}

impl SendRequest {
    pub fn options(&self) -> SendOptions {
        SendOptions {
            modes: self.modes.clone().unwrap_or_default(),
            speed: self.speed,
            save: self.save,
        }
    }
}

/// Finds the machine and opens a transport to it
pub trait DeviceOpener: Send + Sync {
    /// Identify the attached machine without claiming it
    fn machine(&self) -> Result<&'static Machine, SessionError>;

    /// Open a transport to the attached machine
    fn open(&self) -> Result<(Box<dyn Transport>, &'static Machine), SessionError>;
}

fn not_found(e: TransportError) -> SessionError {
    SessionError::NotFound(e.to_string())
}

/// Opens a catalogued controller on the USB bus
#[derive(Debug, Clone, Copy, Default)]
pub struct UsbOpener {
    product_id: Option<u16>,
}

impl UsbOpener {
    /// First supported controller found
    pub fn any() -> Self {
        Self::default()
    }

    /// Only the controller with this product id
    pub fn product(product_id: u16) -> Self {
        Self {
            product_id: Some(product_id),
        }
    }
}

impl DeviceOpener for UsbOpener {
    fn machine(&self) -> Result<&'static Machine, SessionError> {
        if let Some(pid) = self.product_id {
            if catalog::find_machine(VENDOR_ID, pid).is_none() {
                return Err(SessionError::NotFound(format!(
                    "product {pid:04X} is not catalogued"
                )));
            }
        }

        let devices = discovery::list_devices().map_err(not_found)?;
        devices
            .iter()
            .filter(|d| self.product_id.map_or(true, |pid| d.pid == pid))
            .find_map(|d| catalog::find_machine(d.vid, d.pid))
            .ok_or_else(|| match self.product_id {
                Some(pid) => SessionError::NotFound(format!("product {pid:04X} is not attached")),
                None => SessionError::NotFound("no supported lighting controller".into()),
            })
    }

    fn open(&self) -> Result<(Box<dyn Transport>, &'static Machine), SessionError> {
        let machine = self.machine()?;
        info!(
            "Using {} ({:04X}:{:04X})",
            machine.name, machine.vendor_id, machine.product_id
        );
        let transport =
            UsbTransport::open(machine.vendor_id, machine.product_id).map_err(not_found)?;
        Ok((Box::new(transport), machine))
    }
}

/// Opens a recording transport posing as a catalogued machine
///
/// Used by dry runs and tests; every packet lands in the shared log.
#[derive(Debug, Clone)]
pub struct RecordingOpener {
    product_id: u16,
    log: PacketLog,
}

impl RecordingOpener {
    pub fn new(product_id: u16, log: PacketLog) -> Self {
        Self { product_id, log }
    }

    pub fn log(&self) -> &PacketLog {
        &self.log
    }
}

impl DeviceOpener for RecordingOpener {
    fn machine(&self) -> Result<&'static Machine, SessionError> {
        catalog::find_machine(VENDOR_ID, self.product_id)
            .ok_or_else(|| SessionError::NotFound(format!("product {:04X}", self.product_id)))
    }

    fn open(&self) -> Result<(Box<dyn Transport>, &'static Machine), SessionError> {
        let machine = self.machine()?;
        let transport = RecordingTransport::new()
            .with_log(self.log.clone())
            .with_product_id(self.product_id);
        Ok((Box::new(transport), machine))
    }
}

/// Serializes device sessions across callers
pub struct Driver {
    opener: Box<dyn DeviceOpener>,
    lock: Mutex<()>,
    poll_interval: Duration,
}

impl Driver {
    pub fn new(opener: impl DeviceOpener + 'static) -> Self {
        Self {
            opener: Box::new(opener),
            lock: Mutex::new(()),
            poll_interval: Duration::from_millis(timing::WAIT_FOR_OK_SLEEP_MS),
        }
    }

    /// Driver for the first supported controller attached
    pub fn usb() -> Self {
        Self::new(UsbOpener::any())
    }

    /// Sleep between readiness polls (default 10ms)
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Identify the attached machine
    pub fn machine(&self) -> Result<&'static Machine, SessionError> {
        self.opener.machine()
    }

    /// Program resolved zones
    ///
    /// Zones are merged first, since daemon clients may repeat a uid.
    pub fn send(&self, request: &SendRequest) -> Result<SessionReport, SessionError> {
        let zones = merge(request.zones.clone());
        self.with_session("send", |session| session.run(&zones, &request.options()))
    }

    /// Send one RESET of the given type
    pub fn reset(&self, kind: u8) -> Result<SessionReport, SessionError> {
        self.with_session("reset", |session| session.reset(kind))
    }

    fn with_session(
        &self,
        op: &'static str,
        body: impl FnOnce(
            &mut DeviceSession<'static, Box<dyn Transport>>,
        ) -> Result<SessionReport, SessionError>,
    ) -> Result<SessionReport, SessionError> {
        let _guard = self.lock.lock();
        debug!("Starting {} session", op);

        let result = self.opener.open().and_then(|(transport, machine)| {
            let mut session =
                DeviceSession::new(transport, machine).with_poll_interval(self.poll_interval);
            body(&mut session)
        });

        if let Err(e) = &result {
            error!("{} failed: {} (status {})", op, e, e.status().code());
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Command;
    use awlights_transport::protocol::{cmd, limits, reset};
    use awlights_transport::PackedColor;
    use std::sync::Arc;

    fn driver(log: &PacketLog) -> Driver {
        Driver::new(RecordingOpener::new(0x0525, log.clone())).with_poll_interval(Duration::ZERO)
    }

    #[test]
    fn test_send_request_defaults() {
        let req: SendRequest = serde_json::from_str(r#"{"zones": []}"#).unwrap();
        assert_eq!(req, SendRequest::default());
        assert!(serde_json::from_str::<SendRequest>(r#"{"zones": [], "color": 1}"#).is_err());
    }

    #[test]
    fn test_send_through_recording_opener() {
        let log = PacketLog::default();
        let d = driver(&log);
        let req = SendRequest {
            zones: vec![ResolvedZone::new(
                0x0200,
                vec![Command::SetColor(PackedColor(0xF0, 0))],
            )],
            ..Default::default()
        };
        let report = d.send(&req).unwrap();
        assert!(report.warnings.is_empty());
        assert_eq!(report.packets_sent, log.packets().len());
        assert_eq!(log.opcodes().last(), Some(&cmd::TRANSMIT_EXECUTE));
    }

    #[test]
    fn test_unknown_product_is_not_found() {
        let d = Driver::new(RecordingOpener::new(0x9999, PacketLog::default()));
        let err = d.reset(reset::ALL_LIGHTS_ON).unwrap_err();
        assert_eq!(err.status(), crate::StatusCode::DeviceNotFound);
    }

    #[test]
    fn test_repeated_zones_are_merged_before_dispatch() {
        let log = PacketLog::default();
        let d = driver(&log);
        let req = SendRequest {
            zones: vec![
                ResolvedZone::new(0x0001, vec![Command::SetColor(PackedColor(0x10, 0))]);
                256
            ],
            ..Default::default()
        };
        let report = d.send(&req).unwrap();

        let colors: Vec<_> = log
            .packets()
            .into_iter()
            .filter(|p| p.opcode() == cmd::SET_COLOR)
            .collect();
        assert_eq!(colors.len(), limits::ZONE_MAX_CONFIGURATIONS);
        assert!(colors.iter().all(|p| p.as_bytes()[2] == 1));
        assert_eq!(
            log.opcodes().iter().filter(|op| **op == cmd::END_LOOP).count(),
            1
        );
        assert!(matches!(
            report.warnings[..],
            [crate::Warning::TooManyCommands { uid: 1, given: 256, .. }]
        ));
    }

    #[test]
    fn test_pinned_usb_opener_rejects_uncatalogued_product() {
        let err = UsbOpener::product(0x9999).machine().unwrap_err();
        assert_eq!(err.status(), crate::StatusCode::DeviceNotFound);
        assert!(err.to_string().contains("9999"));
    }

    #[test]
    fn test_concurrent_sessions_do_not_interleave() {
        let log = PacketLog::default();
        let d = Arc::new(driver(&log));
        let req = SendRequest {
            zones: vec![ResolvedZone::new(
                0x0001,
                vec![Command::SetColor(PackedColor(0x10, 0)); 3],
            )],
            ..Default::default()
        };

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let d = Arc::clone(&d);
                let req = req.clone();
                std::thread::spawn(move || d.send(&req).unwrap())
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        // Each session ends with TRANSMIT_EXECUTE before the next one polls
        let ops = log.opcodes();
        let per_session = ops.len() / 4;
        for chunk in ops.chunks(per_session) {
            assert_eq!(chunk[0], cmd::GET_STATUS);
            assert_eq!(chunk[per_session - 1], cmd::TRANSMIT_EXECUTE);
        }
    }
}
