//! Configuration commands
//!
//! The side channel for lock configuration, in the textual form clients use:
//!
//! ```text
//! SET LOCK_MODE 1
//! CALL LOCK_MODE()
//! SELECT LOCK_MODE()
//! SET LOCK_TIMEOUT 500
//! ```
//!
//! Keywords are case-insensitive; an optional `=` between setting and value
//! and a trailing `;` are accepted.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use strata_core::error::Error;
use strata_core::LockMode;

/// A parsed configuration command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigCommand {
    /// `SET LOCK_MODE n`
    SetLockMode(LockMode),
    /// `CALL LOCK_MODE()` / `SELECT LOCK_MODE()`
    QueryLockMode,
    /// `SET LOCK_TIMEOUT ms`
    SetLockTimeout(Duration),
}

impl ConfigCommand {
    fn invalid(command: &str, reason: impl Into<String>) -> Error {
        Error::InvalidCommand {
            command: command.to_string(),
            reason: reason.into(),
        }
    }

    fn parse_set(command: &str, rest: &str) -> Result<Self, Error> {
        let rest = rest.trim();
        let (name, value) = rest
            .split_once(|c: char| c.is_whitespace() || c == '=')
            .ok_or_else(|| Self::invalid(command, "missing value"))?;
        let value = value.trim().trim_start_matches('=').trim();
        if value.is_empty() {
            return Err(Self::invalid(command, "missing value"));
        }

        match name.to_ascii_uppercase().as_str() {
            "LOCK_MODE" => {
                let raw: i32 = value
                    .parse()
                    .map_err(|_| Self::invalid(command, format!("not an integer: {value}")))?;
                Ok(ConfigCommand::SetLockMode(LockMode::from_i32(raw)?))
            }
            "LOCK_TIMEOUT" => {
                let ms: u64 = value.parse().map_err(|_| {
                    Self::invalid(command, format!("not a millisecond count: {value}"))
                })?;
                Ok(ConfigCommand::SetLockTimeout(Duration::from_millis(ms)))
            }
            other => Err(Self::invalid(command, format!("unknown setting {other}"))),
        }
    }
}

impl FromStr for ConfigCommand {
    type Err = Error;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let command = input.trim().trim_end_matches(';').trim();
        let (keyword, rest) = command
            .split_once(char::is_whitespace)
            .unwrap_or((command, ""));

        match keyword.to_ascii_uppercase().as_str() {
            "SET" => Self::parse_set(input, rest),
            "CALL" | "SELECT" => {
                let target: String = rest.chars().filter(|c| !c.is_whitespace()).collect();
                if target.eq_ignore_ascii_case("LOCK_MODE()") {
                    Ok(ConfigCommand::QueryLockMode)
                } else {
                    Err(Self::invalid(input, "only LOCK_MODE() can be queried"))
                }
            }
            "" => Err(Self::invalid(input, "empty command")),
            other => Err(Self::invalid(input, format!("unknown command {other}"))),
        }
    }
}

impl fmt::Display for ConfigCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigCommand::SetLockMode(mode) => write!(f, "SET LOCK_MODE {}", mode.as_i32()),
            ConfigCommand::QueryLockMode => f.write_str("CALL LOCK_MODE()"),
            ConfigCommand::SetLockTimeout(timeout) => {
                write!(f, "SET LOCK_TIMEOUT {}", timeout.as_millis())
            }
        }
    }
}
