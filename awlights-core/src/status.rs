//! Status codes shared by the CLI, the daemon and its clients
//!
//! Codes are stable: they are the process exit code and travel in every
//! daemon response.

use std::fmt;

/// Outcome of an operation as reported across process boundaries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum StatusCode {
    Success = 0,
    DeviceNotFound = 11,
    DeviceCannotTakeOver = 12,
    DeviceTimeout = 13,
    NoDaemon = 14,
    UnknownCommand = 15,
    BadColor = 16,
    BadRequestHeader = 31,
    BadMethod = 32,
    BadArguments = 33,
    BadRequestJson = 34,
    CannotConnect = 41,
    BadResponseHeader = 42,
    BadResponseJson = 43,
    CannotSendData = 44,
}

impl StatusCode {
    pub const ALL: [StatusCode; 15] = [
        StatusCode::Success,
        StatusCode::DeviceNotFound,
        StatusCode::DeviceCannotTakeOver,
        StatusCode::DeviceTimeout,
        StatusCode::NoDaemon,
        StatusCode::UnknownCommand,
        StatusCode::BadColor,
        StatusCode::BadRequestHeader,
        StatusCode::BadMethod,
        StatusCode::BadArguments,
        StatusCode::BadRequestJson,
        StatusCode::CannotConnect,
        StatusCode::BadResponseHeader,
        StatusCode::BadResponseJson,
        StatusCode::CannotSendData,
    ];

    /// Numeric code
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Look up a status by its numeric code
    pub fn from_code(code: i32) -> Option<Self> {
        Self::ALL.iter().copied().find(|s| s.code() == code)
    }

    pub fn is_success(self) -> bool {
        self == StatusCode::Success
    }

    /// Human-readable message carried in daemon responses
    pub fn message(self) -> &'static str {
        match self {
            StatusCode::Success => "",
            StatusCode::DeviceNotFound => "Device not found",
            StatusCode::DeviceCannotTakeOver => "Cannot take over device",
            StatusCode::DeviceTimeout => "Device timeout",
            StatusCode::NoDaemon => "No daemon running",
            StatusCode::UnknownCommand => "Unknown command",
            StatusCode::BadColor => "Invalid color",
            StatusCode::BadRequestHeader => "Invalid header provided within the request",
            StatusCode::BadMethod => "Invalid JSON method provided within the request",
            StatusCode::BadArguments => "Wrong arguments for the current method",
            StatusCode::BadRequestJson => "Invalid JSON data provided within the request",
            StatusCode::CannotConnect => "Cannot connect to daemon.",
            StatusCode::BadResponseHeader => "Invalid header replied from daemon",
            StatusCode::BadResponseJson => "Invalid JSON data replied by daemon",
            StatusCode::CannotSendData => "Cannot send data to daemon",
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_success() {
            write!(f, "success ({})", self.code())
        } else {
            write!(f, "{} ({})", self.message(), self.code())
        }
    }
}

impl From<StatusCode> for i32 {
    fn from(status: StatusCode) -> Self {
        status.code()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_unique_and_round_trip() {
        for status in StatusCode::ALL {
            assert_eq!(StatusCode::from_code(status.code()), Some(status));
        }
        assert_eq!(StatusCode::from_code(99), None);
    }

    #[test]
    fn test_request_and_response_headers_differ() {
        assert_eq!(StatusCode::BadRequestHeader.code(), 31);
        assert_eq!(StatusCode::BadResponseHeader.code(), 42);
        assert_ne!(
            StatusCode::BadRequestHeader.message(),
            StatusCode::BadResponseHeader.message()
        );
    }

    #[test]
    fn test_success_has_empty_message() {
        assert_eq!(StatusCode::Success.message(), "");
        assert!(StatusCode::Success.is_success());
    }
}
