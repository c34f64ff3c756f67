//! Lighting daemon: framed TCP protocol, server and client
//!
//! - [`codec`]: 6 hex digit length-prefixed frames
//! - [`protocol`]: request parsing, validation and responses
//! - [`server`]: accepts connections and drives the shared driver
//! - [`client`]: used by `awlights send --daemon` and `awlights ping`

pub mod client;
pub mod codec;
pub mod protocol;
pub mod server;

pub use client::{Client, ClientError};
pub use codec::{CodecError, Encoding, FrameCodec};
pub use protocol::{Call, Request, Response};
pub use server::Server;
