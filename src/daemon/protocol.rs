//! Daemon request and response payloads
//!
//! A request payload is `method` or `method <json-args>`. The response is
//! always a JSON object `{"success": bool, "code": int, "message": string}`.

use awlights_core::{SendRequest, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// Framed reply to every request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub success: bool,
    pub code: i32,
    pub message: String,
}

impl Response {
    /// Status carried by this response, if it is one we know
    pub fn status(&self) -> Option<StatusCode> {
        StatusCode::from_code(self.code)
    }

    pub fn to_json(&self) -> String {
        // Serializing three plain fields cannot fail
        serde_json::to_string(self).unwrap_or_default()
    }
}

impl From<StatusCode> for Response {
    fn from(status: StatusCode) -> Self {
        Self {
            success: status.is_success(),
            code: status.code(),
            message: status.message().to_string(),
        }
    }
}

/// Request split into method name and raw arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request<'a> {
    pub method: &'a str,
    pub args: Option<&'a str>,
}

impl<'a> Request<'a> {
    /// Split at the first space; without one the whole payload is the method
    pub fn parse(payload: &'a str) -> Self {
        match payload.split_once(' ') {
            Some((method, args)) => Self {
                method,
                args: Some(args),
            },
            None => Self {
                method: payload.trim(),
                args: None,
            },
        }
    }
}

/// Build a request payload
pub fn format_request(method: &str, args: Option<&Value>) -> String {
    match args {
        Some(args) => format!("{} {}", method, args),
        None => method.to_string(),
    }
}

/// A validated call, ready to run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Ping,
    Send(SendRequest),
}

impl Call {
    pub fn name(&self) -> &'static str {
        match self {
            Call::Ping => "ping",
            Call::Send(_) => "send",
        }
    }
}

/// Validate a request
///
/// The method is checked before the arguments, so an unknown method with
/// broken JSON is still a bad method.
pub fn prepare(request: &Request<'_>) -> Result<Call, StatusCode> {
    let method = match request.method {
        "ping" => Method::Ping,
        "send" => Method::Send,
        other => {
            debug!("Unknown method {:?}", other);
            return Err(StatusCode::BadMethod);
        }
    };

    let args = match request.args {
        Some(raw) => Some(serde_json::from_str::<Value>(raw).map_err(|e| {
            debug!("Bad request JSON: {}", e);
            StatusCode::BadRequestJson
        })?),
        None => None,
    };

    match (method, args) {
        (Method::Ping, None) => Ok(Call::Ping),
        (Method::Send, Some(args)) => serde_json::from_value(args).map(Call::Send).map_err(|e| {
            debug!("Bad send arguments: {}", e);
            StatusCode::BadArguments
        }),
        _ => Err(StatusCode::BadArguments),
    }
}

#[derive(Debug, Clone, Copy)]
enum Method {
    Ping,
    Send,
}
