//! Zone command resolution and device sessions for Alienware lighting
//!
//! This crate sits on top of `awlights-transport` and turns textual zone
//! commands into controller traffic:
//!
//! - [`resolver`] parses, expands and merges zone commands for a [`Machine`]
//! - [`session`] takes over the controller and dispatches resolved zones
//! - [`driver`] serializes sessions for concurrent callers

pub mod catalog;
pub mod color;
pub mod command;
pub mod driver;
pub mod error;
pub mod machine;
pub mod resolver;
pub mod session;
pub mod status;
pub mod warning;

pub use catalog::{find_machine, machines};
pub use color::{Position, RgbColor};
pub use command::{parse_command, parse_commands, Command, CommandKind};
pub use driver::{DeviceOpener, Driver, RecordingOpener, SendRequest, UsbOpener};
pub use error::{ParseError, SessionError};
pub use machine::{Machine, Mode, ModeVersion, Zone, ZoneRef};
pub use resolver::{resolve, Resolution, ResolvedZone, ZoneEntry};
pub use session::{DeviceSession, SendOptions, SessionReport, SessionState};
pub use status::StatusCode;
pub use warning::Warning;
