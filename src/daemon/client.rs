//! Client side of the daemon protocol

use std::net::SocketAddr;

use awlights_core::{SendRequest, StatusCode};
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio_util::codec::Framed;
use tracing::debug;

use super::codec::{CodecError, Encoding, FrameCodec};
use super::protocol::{format_request, Response};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Host lookup or TCP connect failed
    #[error("Cannot connect to {host}:{port}: {source}")]
    CannotConnect {
        host: String,
        port: u16,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot send request: {0}")]
    CannotSendData(#[source] CodecError),

    #[error("Bad response header: {0}")]
    BadResponseHeader(#[source] CodecError),

    #[error("Daemon closed the connection without replying")]
    NoResponse,

    #[error("Bad response JSON: {0}")]
    BadResponseJson(String),
}

impl ClientError {
    pub fn status(&self) -> StatusCode {
        match self {
            ClientError::CannotConnect { .. } => StatusCode::CannotConnect,
            ClientError::CannotSendData(_) => StatusCode::CannotSendData,
            ClientError::BadResponseHeader(_) | ClientError::NoResponse => {
                StatusCode::BadResponseHeader
            }
            ClientError::BadResponseJson(_) => StatusCode::BadResponseJson,
        }
    }
}

/// Daemon client; every request opens its own connection
///
/// The host is looked up on each request, so a name that does not resolve
/// is reported like any other connection failure.
#[derive(Debug, Clone)]
pub struct Client {
    host: String,
    port: u16,
    encoding: Encoding,
}

impl Client {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            encoding: Encoding::default(),
        }
    }

    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub async fn ping(&self) -> Result<Response, ClientError> {
        self.request("ping", None).await
    }

    pub async fn send(&self, request: &SendRequest) -> Result<Response, ClientError> {
        let args = serde_json::to_value(request)
            .map_err(|e| ClientError::CannotSendData(CodecError::Io(e.into())))?;
        self.request("send", Some(&args)).await
    }

    /// Send one raw request and read the reply
    pub async fn request(
        &self,
        method: &str,
        args: Option<&Value>,
    ) -> Result<Response, ClientError> {
        let stream = TcpStream::connect((self.host.as_str(), self.port))
            .await
            .map_err(|source| ClientError::CannotConnect {
                host: self.host.clone(),
                port: self.port,
                source,
            })?;
        let mut framed = Framed::new(stream, FrameCodec::new(self.encoding));

        let payload = format_request(method, args);
        debug!("Sending {}", payload);
        framed
            .send(payload)
            .await
            .map_err(ClientError::CannotSendData)?;

        let frame = framed
            .next()
            .await
            .ok_or(ClientError::NoResponse)?
            .map_err(ClientError::BadResponseHeader)?;
        let text = self
            .encoding
            .decode(&frame)
            .map_err(|e| ClientError::BadResponseJson(e.to_string()))?;
        debug!("Received {}", text);

        serde_json::from_str(&text).map_err(|e| ClientError::BadResponseJson(e.to_string()))
    }
}

impl From<SocketAddr> for Client {
    fn from(addr: SocketAddr) -> Self {
        Self::new(addr.ip().to_string(), addr.port())
    }
}
