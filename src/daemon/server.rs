//! TCP server driving one shared [`Driver`]
//!
//! Each connection gets its own task and may carry any number of requests.
//! Device work runs on the blocking pool; the driver lock keeps sessions
//! from different connections apart.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use awlights_core::{Driver, StatusCode};
use futures::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::codec::Framed;
use tracing::{debug, error, info, warn};

use super::codec::{CodecError, Encoding, FrameCodec};
use super::protocol::{prepare, Call, Request, Response};

pub struct Server {
    listener: TcpListener,
    driver: Arc<Driver>,
    encoding: Encoding,
}

impl Server {
    /// Bind to `addr`; port 0 lets the OS choose
    pub async fn bind(
        addr: SocketAddr,
        driver: Driver,
        encoding: Encoding,
    ) -> std::io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        let server = Self {
            listener,
            driver: Arc::new(driver),
            encoding,
        };
        if let Ok(local) = server.local_addr() {
            info!("Serving on {} (coding {})", local, encoding);
        }
        Ok(server)
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept connections forever
    pub async fn run(self) {
        let mut failures = 0u32;
        loop {
            match self.listener.accept().await {
                Ok((stream, peer)) => {
                    failures = 0;
                    debug!("Client connected from {}", peer);
                    let driver = Arc::clone(&self.driver);
                    let encoding = self.encoding;
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, driver, encoding).await {
                            error!("Connection error: {}", e);
                        }
                        debug!("Client {} disconnected", peer);
                    });
                }
                Err(e) => {
                    // Out of descriptors and the like; don't spin on it
                    failures = failures.saturating_add(1);
                    let delay = accept_backoff(failures);
                    error!("Accept error: {}, retrying in {:?}", e, delay);
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    /// Accept connections until `shutdown` resolves
    pub async fn run_until(self, shutdown: impl Future<Output = ()>) {
        tokio::select! {
            _ = self.run() => {}
            _ = shutdown => info!("Shutdown requested, stopping server"),
        }
    }
}

/// Delay after the `failures`th accept error in a row: 10ms doubling up to 1s
fn accept_backoff(failures: u32) -> Duration {
    const BASE_MS: u64 = 10;
    const MAX_MS: u64 = 1000;
    let shift = failures.saturating_sub(1).min(16);
    Duration::from_millis((BASE_MS << shift).min(MAX_MS))
}

async fn handle_connection(
    stream: TcpStream,
    driver: Arc<Driver>,
    encoding: Encoding,
) -> Result<(), CodecError> {
    let mut framed = Framed::new(stream, FrameCodec::new(encoding));

    while let Some(frame) = framed.next().await {
        let payload = match frame {
            Ok(payload) => payload,
            Err(e @ (CodecError::BadHeader(_) | CodecError::Truncated { .. })) => {
                error!("{}", e);
                let response = Response::from(StatusCode::BadRequestHeader);
                framed.send(response.to_json()).await?;
                break;
            }
            Err(e) => return Err(e),
        };

        let status = match encoding.decode(&payload) {
            Ok(text) => {
                debug!("Received data: {}", text);
                handle_request(&driver, &text).await
            }
            Err(e) => {
                warn!("{}", e);
                StatusCode::BadRequestJson
            }
        };

        let response = Response::from(status).to_json();
        debug!("Replied data: {}", response);
        framed.send(response).await?;
    }

    Ok(())
}

/// Run one request payload to a status code
pub async fn handle_request(driver: &Arc<Driver>, payload: &str) -> StatusCode {
    let call = match prepare(&Request::parse(payload)) {
        Ok(call) => call,
        Err(status) => {
            error!("{}", status);
            return status;
        }
    };

    match call {
        Call::Ping => StatusCode::Success,
        Call::Send(request) => {
            let driver = Arc::clone(driver);
            match tokio::task::spawn_blocking(move || driver.send(&request)).await {
                Ok(Ok(report)) => {
                    debug!(
                        "Sent {} packets with {} warnings",
                        report.packets_sent,
                        report.warnings.len()
                    );
                    StatusCode::Success
                }
                Ok(Err(e)) => e.status(),
                Err(e) => {
                    error!("Device task failed: {}", e);
                    StatusCode::DeviceTimeout
                }
            }
        }
    }
}
