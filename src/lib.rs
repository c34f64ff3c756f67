//! Alienware lighting driver: daemon, configuration and logging
//!
//! The device side lives in `awlights-core` and `awlights-transport`; this
//! crate adds what the `awlights` binary needs around it.

pub mod config;
pub mod daemon;
pub mod logging;

pub use config::{AppConfig, LogFormat};
pub use daemon::{Client, Encoding, Response, Server};
