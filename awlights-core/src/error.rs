//! Error types for command parsing and device sessions

use awlights_transport::{PacketError, TransportError};
use thiserror::Error;

use crate::status::StatusCode;

/// Errors from parsing user-supplied colors and commands
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Color string is not exactly six hex digits
    #[error("Invalid color format: {0:?} (expected 6 hex digits)")]
    InvalidColorFormat(String),

    /// First token of a command is not a known command
    #[error("Unknown command: {0:?}")]
    UnknownCommand(String),

    /// More color arguments than the command accepts
    #[error("Command {command} supports up to {max} color(s) per call, {given} given")]
    TooManyArguments {
        command: &'static str,
        max: usize,
        given: usize,
    },

    /// Fewer color arguments than the command needs
    #[error("Command {command} needs {expected} color(s), {given} given")]
    MissingArgument {
        command: &'static str,
        expected: usize,
        given: usize,
    },
}

impl ParseError {
    pub fn status(&self) -> StatusCode {
        match self {
            ParseError::UnknownCommand(_) => StatusCode::UnknownCommand,
            ParseError::InvalidColorFormat(_)
            | ParseError::TooManyArguments { .. }
            | ParseError::MissingArgument { .. } => StatusCode::BadColor,
        }
    }
}

/// Errors that abort a device session
#[derive(Error, Debug)]
pub enum SessionError {
    /// No supported controller is attached
    #[error("Device not found: {0}")]
    NotFound(String),

    /// Claim and the whole recovery sequence failed
    #[error("Cannot take over device: {0}")]
    CannotTakeOver(#[source] TransportError),

    /// Readiness polling exhausted its budget
    #[error("Device did not report ready after {tries} polls")]
    NotReady { tries: usize },

    /// Transfer failed while talking to the device
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Packet could not be encoded
    #[error("Packet error: {0}")]
    Packet(#[from] PacketError),

    /// Operation requested in a state that does not allow it
    #[error("Invalid session state: {0}")]
    InvalidState(&'static str),
}

impl SessionError {
    /// Map onto the status vocabulary
    ///
    /// Every fault after take-over is reported as a device timeout.
    pub fn status(&self) -> StatusCode {
        match self {
            SessionError::NotFound(_) => StatusCode::DeviceNotFound,
            SessionError::CannotTakeOver(_) => StatusCode::DeviceCannotTakeOver,
            SessionError::NotReady { .. }
            | SessionError::Transport(_)
            | SessionError::Packet(_)
            | SessionError::InvalidState(_) => StatusCode::DeviceTimeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_status() {
        assert_eq!(
            ParseError::UnknownCommand("x".into()).status(),
            StatusCode::UnknownCommand
        );
        assert_eq!(
            ParseError::InvalidColorFormat("fff".into()).status(),
            StatusCode::BadColor
        );
    }

    #[test]
    fn test_session_error_status() {
        assert_eq!(
            SessionError::CannotTakeOver(TransportError::Disconnected).status(),
            StatusCode::DeviceCannotTakeOver
        );
        assert_eq!(
            SessionError::from(TransportError::Timeout).status(),
            StatusCode::DeviceTimeout
        );
        assert_eq!(
            SessionError::NotFound("none".into()).status(),
            StatusCode::DeviceNotFound
        );
    }
}
