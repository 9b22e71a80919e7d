//! Operator console commands.
//!
//! Grammar, one command per line:
//! - `?` or `status`: dump every gate
//! - `<channel> <value>`: force the tool on channel `channel`; 0 is OFF,
//!   any other integer is ON
//! - `<channel> auto`: release the override and follow the sensor again

use std::str::FromStr;

use blastgate_traits::SensorState;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Status,
    Force { channel: usize, state: SensorState },
    Release { channel: usize },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("empty command")]
    Empty,
    #[error("malformed command {0:?}; expected '<channel> <value>', '<channel> auto' or '?'")]
    Malformed(String),
    #[error("channel {0:?} is not a number")]
    BadChannel(String),
    #[error("value {0:?} is not a number or 'auto'")]
    BadValue(String),
    #[error("channel {channel} is out of range (have {count} gates)")]
    UnknownChannel { channel: usize, count: usize },
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut parts = line.split_whitespace();
        let first = parts.next().ok_or(CommandError::Empty)?;
        let second = parts.next();
        if parts.next().is_some() {
            return Err(CommandError::Malformed(line.trim().to_string()));
        }
        match (first, second) {
            ("?", None) => Ok(Command::Status),
            (s, None) if s.eq_ignore_ascii_case("status") => Ok(Command::Status),
            (_, None) => Err(CommandError::Malformed(line.trim().to_string())),
            (ch, Some(val)) => {
                let channel = ch
                    .parse::<usize>()
                    .map_err(|_| CommandError::BadChannel(ch.to_string()))?;
                if val.eq_ignore_ascii_case("auto") {
                    return Ok(Command::Release { channel });
                }
                let v = val
                    .parse::<i64>()
                    .map_err(|_| CommandError::BadValue(val.to_string()))?;
                Ok(Command::Force {
                    channel,
                    state: SensorState::from(v != 0),
                })
            }
        }
    }
}

impl Command {
    pub fn channel(&self) -> Option<usize> {
        match self {
            Command::Status => None,
            Command::Force { channel, .. } | Command::Release { channel } => Some(*channel),
        }
    }
}
