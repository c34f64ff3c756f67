//! Transport error types

use thiserror::Error;

/// Errors that can occur during transport operations
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    #[error("Device disconnected")]
    Disconnected,

    #[error("Communication timeout")]
    Timeout,

    #[error("Short transfer: expected {expected} bytes, got {actual}")]
    ShortTransfer { expected: usize, actual: usize },

    // USB-specific errors
    #[error("USB error: {0}")]
    Usb(String),

    #[error("USB permission denied: {0}")]
    UsbPermissionDenied(String),

    #[error("USB resource busy: {0}")]
    UsbBusy(String),
}

impl From<rusb::Error> for TransportError {
    fn from(e: rusb::Error) -> Self {
        match e {
            rusb::Error::Timeout => TransportError::Timeout,
            rusb::Error::NoDevice => TransportError::Disconnected,
            rusb::Error::NotFound => TransportError::DeviceNotFound(e.to_string()),
            rusb::Error::Access => TransportError::UsbPermissionDenied(e.to_string()),
            rusb::Error::Busy => TransportError::UsbBusy(e.to_string()),
            _ => TransportError::Usb(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rusb_timeout_maps_to_timeout() {
        let err: TransportError = rusb::Error::Timeout.into();
        assert!(matches!(err, TransportError::Timeout));
    }

    #[test]
    fn test_rusb_access_maps_to_permission_denied() {
        let err: TransportError = rusb::Error::Access.into();
        assert!(matches!(err, TransportError::UsbPermissionDenied(_)));
    }

    #[test]
    fn test_short_transfer_display() {
        let err = TransportError::ShortTransfer {
            expected: 9,
            actual: 3,
        };
        assert_eq!(err.to_string(), "Short transfer: expected 9 bytes, got 3");
    }
}
