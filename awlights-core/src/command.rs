//! Zone commands and the `cmd:arg:arg` command syntax
//!
//! ```
//! use awlights_core::command::{parse_command, Command};
//! use awlights_transport::PackedColor;
//!
//! let cmd = parse_command("morph:ff00cc:00ff33").unwrap();
//! assert_eq!(cmd, Command::SetMorph(PackedColor(0xF0, 0xC0), PackedColor(0x00, 0xF3)));
//! ```

use std::fmt;

use awlights_transport::protocol::cmd;
use awlights_transport::PackedColor;
use serde::{Deserialize, Serialize};

use crate::color::{encode, Position};
use crate::error::ParseError;

/// Kind of a zone command, independent of its colors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    Color,
    Morph,
    Pulse,
}

impl CommandKind {
    /// Command tokens accepted on the command line
    const TOKENS: &'static [(&'static str, CommandKind)] = &[
        ("c", CommandKind::Color),
        ("color", CommandKind::Color),
        ("m", CommandKind::Morph),
        ("morph", CommandKind::Morph),
        ("p", CommandKind::Pulse),
        ("pulse", CommandKind::Pulse),
    ];

    pub fn from_token(token: &str) -> Option<Self> {
        Self::TOKENS
            .iter()
            .find(|(t, _)| *t == token)
            .map(|(_, k)| *k)
    }

    /// Controller opcode sending this kind
    pub fn opcode(self) -> u8 {
        match self {
            CommandKind::Color => cmd::SET_COLOR,
            CommandKind::Morph => cmd::SET_MORPH,
            CommandKind::Pulse => cmd::SET_PULSE,
        }
    }

    pub fn from_opcode(opcode: u8) -> Option<Self> {
        match opcode {
            cmd::SET_COLOR => Some(CommandKind::Color),
            cmd::SET_MORPH => Some(CommandKind::Morph),
            cmd::SET_PULSE => Some(CommandKind::Pulse),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            CommandKind::Color => "color",
            CommandKind::Morph => "morph",
            CommandKind::Pulse => "pulse",
        }
    }

    /// Number of colors the command carries
    pub fn arity(self) -> usize {
        match self {
            CommandKind::Morph => 2,
            CommandKind::Color | CommandKind::Pulse => 1,
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A typed zone command with its colors already packed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    SetColor(PackedColor),
    SetMorph(PackedColor, PackedColor),
    SetPulse(PackedColor),
}

impl Command {
    pub fn kind(&self) -> CommandKind {
        match self {
            Command::SetColor(_) => CommandKind::Color,
            Command::SetMorph(..) => CommandKind::Morph,
            Command::SetPulse(_) => CommandKind::Pulse,
        }
    }
}

/// Parse one command such as `color:ff0000` or `m:ff0000:0000ff`
pub fn parse_command(text: &str) -> Result<Command, ParseError> {
    let mut parts = text.split(':');
    let token = parts.next().unwrap_or_default();
    let args: Vec<&str> = parts.collect();

    let kind =
        CommandKind::from_token(token).ok_or_else(|| ParseError::UnknownCommand(token.into()))?;

    if args.len() > kind.arity() {
        return Err(ParseError::TooManyArguments {
            command: kind.name(),
            max: kind.arity(),
            given: args.len(),
        });
    }
    if args.len() < kind.arity() {
        return Err(ParseError::MissingArgument {
            command: kind.name(),
            expected: kind.arity(),
            given: args.len(),
        });
    }

    Ok(match kind {
        CommandKind::Color => Command::SetColor(encode(args[0], Position::First)?),
        CommandKind::Pulse => Command::SetPulse(encode(args[0], Position::First)?),
        CommandKind::Morph => Command::SetMorph(
            encode(args[0], Position::First)?,
            encode(args[1], Position::Second)?,
        ),
    })
}

/// Parse a whitespace separated list of commands
pub fn parse_commands(text: &str) -> Result<Vec<Command>, ParseError> {
    text.split_whitespace().map(parse_command).collect()
}
