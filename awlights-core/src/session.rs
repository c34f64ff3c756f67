//! Device session: take-over, readiness polling and command dispatch
//!
//! A session owns one transport for its whole life and talks to the
//! controller strictly one request at a time.
//!
//! ```text
//! Disconnected -> Claimed -> Ready -> Dispatching -> Completed
//!        \___________\_________\__________\______-> Faulted
//! ```

use std::time::Duration;

use awlights_transport::protocol::{limits, reset, status, timing};
use awlights_transport::{
    EndLoop, GetStatus, LightCommand, Reset, Save, SetColor, SetMode, SetMorph, SetPulse,
    SetSpeed, TransmitExecute, Transport, TransportError,
};
use tracing::{debug, info, warn};

use crate::command::Command;
use crate::error::SessionError;
use crate::machine::Machine;
use crate::resolver::ResolvedZone;
use crate::warning::{record, Warning};

/// Lifecycle of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Claimed,
    Ready,
    Dispatching,
    Completed,
    Faulted,
}

/// What to send besides the zone commands
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SendOptions {
    /// Stored modes to program; the live session is always programmed last
    pub modes: Vec<u8>,
    /// Theme tempo, clamped to the controller maximum
    pub speed: u32,
    /// Persist the stored modes
    pub save: bool,
}

/// Outcome of a successful session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionReport {
    pub warnings: Vec<Warning>,
    pub packets_sent: usize,
}

/// Clamp a requested speed to what the controller accepts
pub fn clamp_speed(speed: u32) -> (u16, Option<Warning>) {
    match u16::try_from(speed) {
        Ok(s) => (s, None),
        Err(_) => (
            limits::MAX_SPEED,
            Some(Warning::SpeedClamped {
                requested: speed,
                sent: limits::MAX_SPEED,
            }),
        ),
    }
}

/// Exclusive conversation with one controller
pub struct DeviceSession<'m, T: Transport> {
    transport: T,
    machine: &'m Machine,
    state: SessionState,
    warnings: Vec<Warning>,
    packets_sent: usize,
    poll_interval: Duration,
    max_tries: usize,
}

impl<'m, T: Transport> DeviceSession<'m, T> {
    pub fn new(transport: T, machine: &'m Machine) -> Self {
        Self {
            transport,
            machine,
            state: SessionState::Disconnected,
            warnings: Vec::new(),
            packets_sent: 0,
            poll_interval: Duration::from_millis(timing::WAIT_FOR_OK_SLEEP_MS),
            max_tries: timing::WAIT_FOR_OK_MAX_TRIES,
        }
    }

    /// Sleep between readiness polls (default 10ms)
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Readiness polls before giving up (default 500)
    pub fn with_max_tries(mut self, tries: usize) -> Self {
        self.max_tries = tries;
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn machine(&self) -> &Machine {
        self.machine
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    fn expect_state(&self, allowed: &[SessionState], op: &'static str) -> Result<(), SessionError> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            debug!("{} not allowed in state {:?}", op, self.state);
            Err(SessionError::InvalidState(op))
        }
    }

    fn fault<R>(&mut self, result: Result<R, SessionError>) -> Result<R, SessionError> {
        if result.is_err() {
            self.state = SessionState::Faulted;
        }
        result
    }

    fn send<C: LightCommand>(&mut self, command: &C) -> Result<Vec<u8>, SessionError> {
        let packet = command.build()?;
        let reply = self.transport.request(&packet)?;
        self.packets_sent += 1;
        Ok(reply)
    }

    /// SET_MODE for a stored mode; the live session (`None`) needs none
    fn set_mode(&mut self, mode: Option<u8>) -> Result<(), SessionError> {
        if let Some(mode) = mode {
            info!("Send set_mode: 0x{:x}", mode);
            self.send(&SetMode::new(mode))?;
        }
        Ok(())
    }

    // =========================================================================
    // Take-over
    // =========================================================================

    /// Claim the lighting interface, recovering it from the kernel if needed
    pub fn connect(&mut self) -> Result<(), SessionError> {
        self.expect_state(&[SessionState::Disconnected], "connect")?;
        let result = self.take_over();
        self.fault(result)?;
        self.state = SessionState::Claimed;
        Ok(())
    }

    fn take_over(&mut self) -> Result<(), SessionError> {
        let Err(e) = self.transport.claim_interface() else {
            return Ok(());
        };
        debug!("Failed to claim interface ({}), trying harder", e);

        self.recover().map_err(SessionError::CannotTakeOver)?;
        self.transport
            .claim_interface()
            .map_err(SessionError::CannotTakeOver)
    }

    fn recover(&mut self) -> Result<(), TransportError> {
        if let Err(e) = self.transport.detach_kernel_driver() {
            debug!("Cannot detach ({}), trying harder", e);
        }
        if let Err(e) = self.transport.set_configuration() {
            debug!("Setting configuration failed ({}), trying harder", e);
            self.transport.attach_kernel_driver()?;
            self.transport.detach_kernel_driver()?;
            self.transport.set_configuration().inspect_err(|e| {
                debug!("Configuration set failed after attach/detach: {}", e);
            })?;
        }
        Ok(())
    }

    /// Release the interface; failures are logged only
    pub fn release(&mut self) {
        if let Err(e) = self.transport.release_interface() {
            warn!("Failed to release interface: {}", e);
        }
    }

    // =========================================================================
    // Readiness
    // =========================================================================

    /// Poll GET_STATUS until the controller is ready, resetting it between
    /// polls
    pub fn wait_ready(&mut self) -> Result<(), SessionError> {
        self.expect_state(
            &[
                SessionState::Claimed,
                SessionState::Ready,
                SessionState::Dispatching,
            ],
            "wait_ready",
        )?;
        let result = self.poll_ready();
        self.fault(result)?;
        if self.state == SessionState::Claimed {
            self.state = SessionState::Ready;
        }
        Ok(())
    }

    fn poll_ready(&mut self) -> Result<(), SessionError> {
        for _ in 0..self.max_tries {
            let reply = self.send(&GetStatus)?;
            let code = reply.first().copied().unwrap_or_default();
            debug!("Waiting for ok, got: 0x{:x} ({})", code, status::name(code));
            if code == status::OK {
                return Ok(());
            }
            self.send(&Reset::new(reset::ALL_LIGHTS_ON))?;
            std::thread::sleep(self.poll_interval);
        }
        Err(SessionError::NotReady {
            tries: self.max_tries,
        })
    }

    /// Wait, reset all lights on, wait again
    pub fn prepare(&mut self) -> Result<(), SessionError> {
        self.wait_ready()?;
        let result = self.send(&Reset::new(reset::ALL_LIGHTS_ON));
        self.fault(result)?;
        self.wait_ready()
    }

    // =========================================================================
    // Dispatch
    // =========================================================================

    /// Send every zone's commands for one mode
    pub fn dispatch(
        &mut self,
        zones: &[ResolvedZone],
        mode: Option<u8>,
        speed: u16,
    ) -> Result<(), SessionError> {
        self.expect_state(
            &[SessionState::Ready, SessionState::Dispatching],
            "dispatch",
        )?;
        self.state = SessionState::Dispatching;
        let result = self.dispatch_zones(zones, mode, speed);
        self.fault(result)
    }

    fn dispatch_zones(
        &mut self,
        zones: &[ResolvedZone],
        mode: Option<u8>,
        speed: u16,
    ) -> Result<(), SessionError> {
        let machine = self.machine;
        // Index 0 is reserved by the firmware
        let mut next_idx: usize = 1;

        for (pos, entry) in zones.iter().enumerate() {
            let Some(zone) = machine.single_zone(entry.uid) else {
                record(
                    &mut self.warnings,
                    Warning::UnknownZone(entry.uid.into()),
                );
                continue;
            };

            if next_idx > limits::MAX_ZONE_LOOPS {
                record(
                    &mut self.warnings,
                    Warning::TooManyZones {
                        skipped: zones.len() - pos,
                        max: limits::MAX_ZONE_LOOPS,
                    },
                );
                break;
            }
            let idx = next_idx as u8;

            if speed > 0 {
                self.set_mode(mode)?;
                info!("Send set_speed: {}", speed);
                self.send(&SetSpeed::new(speed))?;
            }

            let mut commands = entry.commands.as_slice();
            if commands.len() > limits::ZONE_MAX_CONFIGURATIONS {
                record(
                    &mut self.warnings,
                    Warning::TooManyCommands {
                        uid: entry.uid,
                        given: commands.len(),
                        max: limits::ZONE_MAX_CONFIGURATIONS,
                    },
                );
                commands = &commands[..limits::ZONE_MAX_CONFIGURATIONS];
            }

            for command in commands {
                if !zone.supports(command.kind()) {
                    record(
                        &mut self.warnings,
                        Warning::UnsupportedCommand {
                            alias: zone.alias,
                            zone: zone.uid.clone(),
                            kind: command.kind(),
                        },
                    );
                    continue;
                }
                self.set_mode(mode)?;
                self.send_command(idx, entry.uid, command)?;
            }

            next_idx += 1;

            self.set_mode(mode)?;
            info!("Send end_loop");
            self.send(&EndLoop)?;
        }

        Ok(())
    }

    fn send_command(&mut self, idx: u8, uid: u32, command: &Command) -> Result<(), SessionError> {
        info!(
            "Send {}: 0x{:x}, 0x{:x}, {:?}",
            command.kind(),
            idx,
            uid,
            command
        );
        match *command {
            Command::SetColor(color) => self.send(&SetColor::new(idx, uid, color))?,
            Command::SetMorph(from, to) => self.send(&SetMorph::new(idx, uid, from, to))?,
            Command::SetPulse(color) => self.send(&SetPulse::new(idx, uid, color))?,
        };
        Ok(())
    }

    /// Optionally save, then commit and release
    pub fn finalize(&mut self, save: bool) -> Result<(), SessionError> {
        self.expect_state(
            &[SessionState::Ready, SessionState::Dispatching],
            "finalize",
        )?;
        let result = self.commit(save);
        self.fault(result)?;
        self.state = SessionState::Completed;
        self.release();
        Ok(())
    }

    fn commit(&mut self, save: bool) -> Result<(), SessionError> {
        if save {
            info!("Send save");
            self.send(&Save)?;
        }
        info!("Send transmit_execute");
        self.send(&TransmitExecute)?;
        Ok(())
    }

    // =========================================================================
    // Whole operations
    // =========================================================================

    /// Program the zones for every requested mode plus the live session
    pub fn run(
        &mut self,
        zones: &[ResolvedZone],
        options: &SendOptions,
    ) -> Result<SessionReport, SessionError> {
        let (speed, clamped) = clamp_speed(options.speed);
        if let Some(w) = clamped {
            record(&mut self.warnings, w);
        }

        let result = self.run_claimed(|session| {
            session.prepare()?;
            let modes = options.modes.iter().copied().map(Some).chain([None]);
            for mode in modes {
                session.dispatch(zones, mode, speed)?;
            }
            session.finalize(options.save)
        });
        result.map(|()| self.report())
    }

    /// Send a single RESET of the given type
    pub fn reset(&mut self, kind: u8) -> Result<SessionReport, SessionError> {
        let result = self.run_claimed(|session| {
            session.wait_ready()?;
            info!("Send reset: 0x{:x}", kind);
            let sent = session.send(&Reset::new(kind));
            session.fault(sent)?;
            session.wait_ready()?;
            session.state = SessionState::Completed;
            session.release();
            Ok(())
        });
        result.map(|()| self.report())
    }

    /// Connect, run `body`, and release the interface if `body` fails
    fn run_claimed(
        &mut self,
        body: impl FnOnce(&mut Self) -> Result<(), SessionError>,
    ) -> Result<(), SessionError> {
        self.connect()?;
        let result = body(self);
        if result.is_err() {
            self.release();
        }
        result
    }

    fn report(&self) -> SessionReport {
        SessionReport {
            warnings: self.warnings.clone(),
            packets_sent: self.packets_sent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::machine::{ModeVersion, Zone};
    use awlights_transport::protocol::cmd;
    use awlights_transport::{PackedColor, PacketLog, RecordingTransport, UsbEvent};

    fn machine() -> Machine {
        Machine {
            vendor_id: 0x187C,
            product_id: 0xFFFF,
            name: "Test",
            zones: vec![
                Zone::new(0x0001, "Keyboard", "kbd"),
                Zone::new(0x0200, "Touchpad", "touchpad"),
                Zone::new(0x4000, "Indicators", "indicators").static_only(),
            ],
            mode_version: ModeVersion::V2,
        }
    }

    fn color(n: u8) -> Command {
        Command::SetColor(PackedColor(n, 0))
    }

    fn session(
        machine: &Machine,
        transport: RecordingTransport,
    ) -> DeviceSession<'_, RecordingTransport> {
        DeviceSession::new(transport, machine).with_poll_interval(Duration::ZERO)
    }

    #[test]
    fn test_connect_claims_directly() {
        let m = machine();
        let log = PacketLog::default();
        let mut s = session(&m, RecordingTransport::new().with_log(log.clone()));
        s.connect().unwrap();
        assert_eq!(s.state(), SessionState::Claimed);
        assert_eq!(log.events(), vec![UsbEvent::Claim]);
    }

    #[test]
    fn test_connect_recovers_from_kernel_driver() {
        let m = machine();
        let log = PacketLog::default();
        let mut s = session(&m, RecordingTransport::new().with_log(log.clone()).fail_claims(1));
        s.connect().unwrap();
        assert_eq!(
            log.events(),
            vec![
                UsbEvent::Claim,
                UsbEvent::DetachKernelDriver,
                UsbEvent::SetConfiguration,
                UsbEvent::Claim,
            ]
        );
    }

    #[test]
    fn test_connect_gives_up_after_recovery() {
        let m = machine();
        let log = PacketLog::default();
        let t = RecordingTransport::new()
            .with_log(log.clone())
            .fail_claims(1)
            .fail_recovery();
        let mut s = session(&m, t);
        let err = s.connect().unwrap_err();
        assert!(matches!(err, SessionError::CannotTakeOver(_)));
        assert_eq!(s.state(), SessionState::Faulted);
        assert_eq!(
            log.events(),
            vec![
                UsbEvent::Claim,
                UsbEvent::DetachKernelDriver,
                UsbEvent::SetConfiguration,
                UsbEvent::AttachKernelDriver,
            ]
        );
    }

    #[test]
    fn test_wait_ready_resets_until_ok() {
        let m = machine();
        let log = PacketLog::default();
        let t = RecordingTransport::new()
            .with_log(log.clone())
            .with_status_replies([status::BUSY, status::BUSY]);
        let mut s = session(&m, t);
        s.connect().unwrap();
        s.wait_ready().unwrap();
        assert_eq!(s.state(), SessionState::Ready);
        assert_eq!(
            log.opcodes(),
            vec![
                cmd::GET_STATUS,
                cmd::RESET,
                cmd::GET_STATUS,
                cmd::RESET,
                cmd::GET_STATUS,
            ]
        );
    }

    #[test]
    fn test_wait_ready_is_bounded() {
        let m = machine();
        let t = RecordingTransport::new().with_default_status(status::BUSY);
        let mut s = session(&m, t).with_max_tries(5);
        s.connect().unwrap();
        let err = s.wait_ready().unwrap_err();
        assert!(matches!(err, SessionError::NotReady { tries: 5 }));
        assert_eq!(err.status(), crate::StatusCode::DeviceTimeout);
        assert_eq!(s.state(), SessionState::Faulted);
    }

    #[test]
    fn test_loop_index_counts_zones_not_commands() {
        let m = machine();
        let log = PacketLog::default();
        let mut s = session(&m, RecordingTransport::new().with_log(log.clone()));
        let zones = vec![
            ResolvedZone::new(0x0001, vec![color(1), color(2), color(3)]),
            ResolvedZone::new(0x0200, vec![color(4)]),
        ];
        s.run(&zones, &SendOptions::default()).unwrap();

        let indexes: Vec<u8> = log
            .packets()
            .iter()
            .filter(|p| p.opcode() == cmd::SET_COLOR)
            .map(|p| p.as_bytes()[2])
            .collect();
        assert_eq!(indexes, vec![1, 1, 1, 2]);
    }

    #[test]
    fn test_run_packet_sequence_with_mode_and_save() {
        let m = machine();
        let log = PacketLog::default();
        let mut s = session(&m, RecordingTransport::new().with_log(log.clone()));
        let zones = vec![ResolvedZone::new(0x0200, vec![color(0xF0)])];
        let options = SendOptions {
            modes: vec![0x05],
            speed: 0,
            save: true,
        };
        s.run(&zones, &options).unwrap();
        assert_eq!(s.state(), SessionState::Completed);

        assert_eq!(
            log.opcodes(),
            vec![
                // prepare
                cmd::GET_STATUS,
                cmd::RESET,
                cmd::GET_STATUS,
                // stored mode 0x05
                cmd::SET_MODE,
                cmd::SET_COLOR,
                cmd::SET_MODE,
                cmd::END_LOOP,
                // live session
                cmd::SET_COLOR,
                cmd::END_LOOP,
                // commit
                cmd::SAVE,
                cmd::TRANSMIT_EXECUTE,
            ]
        );
        assert_eq!(log.events().last(), Some(&UsbEvent::Release));
    }

    #[test]
    fn test_speed_is_clamped_with_warning() {
        let m = machine();
        let log = PacketLog::default();
        let mut s = session(&m, RecordingTransport::new().with_log(log.clone()));
        let zones = vec![ResolvedZone::new(0x0001, vec![color(1)])];
        let report = s
            .run(
                &zones,
                &SendOptions {
                    speed: 70000,
                    ..Default::default()
                },
            )
            .unwrap();

        let speed = log
            .packets()
            .into_iter()
            .find(|p| p.opcode() == cmd::SET_SPEED)
            .unwrap();
        assert_eq!(&speed.as_bytes()[2..5], &[0x00, 0xFF, 0xFF]);
        assert_eq!(
            report.warnings,
            vec![Warning::SpeedClamped {
                requested: 70000,
                sent: 0xFFFF,
            }]
        );
    }

    #[test]
    fn test_unknown_zone_and_unsupported_command_are_skipped() {
        let m = machine();
        let log = PacketLog::default();
        let mut s = session(&m, RecordingTransport::new().with_log(log.clone()));
        let zones = vec![
            ResolvedZone::new(0x0800, vec![color(1)]),
            ResolvedZone::new(
                0x4000,
                vec![Command::SetPulse(PackedColor(1, 2)), color(2)],
            ),
        ];
        let report = s.run(&zones, &SendOptions::default()).unwrap();
        assert_eq!(report.warnings.len(), 2);
        assert!(matches!(report.warnings[0], Warning::UnknownZone(_)));
        assert!(matches!(
            report.warnings[1],
            Warning::UnsupportedCommand { .. }
        ));

        let colors: Vec<_> = log
            .packets()
            .into_iter()
            .filter(|p| p.opcode() == cmd::SET_COLOR)
            .collect();
        assert_eq!(colors.len(), 1);
        assert_eq!(colors[0].as_bytes()[2], 1);
    }

    #[test]
    fn test_commands_are_truncated_per_zone() {
        let m = machine();
        let log = PacketLog::default();
        let mut s = session(&m, RecordingTransport::new().with_log(log.clone()));
        let zones = vec![ResolvedZone::new(0x0001, (0..20).map(color).collect())];
        let report = s.run(&zones, &SendOptions::default()).unwrap();
        let sent = log
            .opcodes()
            .into_iter()
            .filter(|op| *op == cmd::SET_COLOR)
            .count();
        assert_eq!(sent, limits::ZONE_MAX_CONFIGURATIONS);
        assert_eq!(
            report.warnings,
            vec![Warning::TooManyCommands {
                uid: 1,
                given: 20,
                max: limits::ZONE_MAX_CONFIGURATIONS,
            }]
        );
    }

    #[test]
    fn test_transfer_failure_faults_and_releases() {
        let m = machine();
        let log = PacketLog::default();
        let t = RecordingTransport::new()
            .with_log(log.clone())
            .fail_write_after(4);
        let mut s = session(&m, t);
        let zones = vec![ResolvedZone::new(0x0001, vec![color(1)])];
        let err = s.run(&zones, &SendOptions::default()).unwrap_err();
        assert_eq!(err.status(), crate::StatusCode::DeviceTimeout);
        assert_eq!(s.state(), SessionState::Faulted);
        assert_eq!(log.events().last(), Some(&UsbEvent::Release));
    }

    #[test]
    fn test_read_timeout_faults_and_releases() {
        let m = machine();
        let log = PacketLog::default();
        let t = RecordingTransport::new()
            .with_log(log.clone())
            .read_timeout();
        let mut s = session(&m, t);
        let zones = vec![ResolvedZone::new(0x0001, vec![color(1)])];
        let err = s.run(&zones, &SendOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            SessionError::Transport(TransportError::Timeout)
        ));
        assert_eq!(err.status(), crate::StatusCode::DeviceTimeout);
        assert_eq!(s.state(), SessionState::Faulted);
        // The first GET_STATUS never got an answer
        assert_eq!(log.opcodes(), vec![cmd::GET_STATUS]);
        assert_eq!(log.events().last(), Some(&UsbEvent::Release));
    }

    #[test]
    fn test_loop_index_never_reaches_zero() {
        let m = machine();
        let log = PacketLog::default();
        let mut s = session(&m, RecordingTransport::new().with_log(log.clone()));
        let zones = vec![ResolvedZone::new(0x0001, vec![color(1)]); 260];
        let report = s.run(&zones, &SendOptions::default()).unwrap();

        let indexes: Vec<u8> = log
            .packets()
            .iter()
            .filter(|p| p.opcode() == cmd::SET_COLOR)
            .map(|p| p.as_bytes()[2])
            .collect();
        assert_eq!(indexes.len(), limits::MAX_ZONE_LOOPS);
        assert!(!indexes.contains(&0));
        assert_eq!(indexes.last(), Some(&0xFF));
        assert_eq!(
            report.warnings,
            vec![Warning::TooManyZones {
                skipped: 5,
                max: limits::MAX_ZONE_LOOPS,
            }]
        );
        assert_eq!(log.opcodes().last(), Some(&cmd::TRANSMIT_EXECUTE));
    }

    #[test]
    fn test_reset_sequence() {
        let m = machine();
        let log = PacketLog::default();
        let mut s = session(&m, RecordingTransport::new().with_log(log.clone()));
        s.reset(reset::ALL_LIGHTS_OFF).unwrap();
        assert_eq!(
            log.opcodes(),
            vec![cmd::GET_STATUS, cmd::RESET, cmd::GET_STATUS]
        );
        assert_eq!(log.packets()[1].as_bytes()[2], reset::ALL_LIGHTS_OFF);
    }

    #[test]
    fn test_dispatch_requires_ready() {
        let m = machine();
        let mut s = session(&m, RecordingTransport::new());
        assert!(matches!(
            s.dispatch(&[], None, 0),
            Err(SessionError::InvalidState("dispatch"))
        ));
    }
}
