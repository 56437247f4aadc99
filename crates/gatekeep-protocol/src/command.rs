//! Parsing of player-typed commands.
//!
//! The host hands us either the raw chat line (`"/login hunter2"`) when
//! asking whether a command may run at all, or an already split
//! `(name, args)` pair when the command is invoked. Both end up as a
//! [`Command`].

use crate::ProtocolError;

/// A command the gate understands, with its arguments still unvalidated.
///
/// Argument counts are *not* checked here: "wrong number of arguments"
/// is a user-facing answer that depends on the player's state, so the
/// command processor decides it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `/register <password>`
    Register(Vec<String>),
    /// `/login <password>`
    Login(Vec<String>),
    /// `/setpassword <password> <confirmPassword>`
    SetPassword(Vec<String>),
    /// Anything else. Carries the lower-cased command name.
    Other(String),
}

impl Command {
    /// Parses a raw command line. A leading `/` is optional and the
    /// command name is matched case-insensitively.
    ///
    /// # Errors
    /// Returns [`ProtocolError::InvalidCommand`] for a line with no
    /// command name (empty, or just `/`).
    pub fn parse(raw: &str) -> Result<Self, ProtocolError> {
        let line = raw.trim();
        let line = line.strip_prefix('/').unwrap_or(line);
        let mut parts = line.split_whitespace();
        let name = parts
            .next()
            .ok_or_else(|| ProtocolError::InvalidCommand(raw.to_string()))?;
        let args = parts.map(str::to_string).collect();
        Ok(Self::from_parts(name, args))
    }

    /// Builds a command from a name and pre-split arguments.
    pub fn from_parts(name: &str, args: Vec<String>) -> Self {
        let name = name.trim_start_matches('/').to_lowercase();
        match name.as_str() {
            "register" => Self::Register(args),
            "login" => Self::Login(args),
            "setpassword" => Self::SetPassword(args),
            _ => Self::Other(name),
        }
    }

    /// Returns `true` for the two commands an unauthenticated player is
    /// allowed to run: `register` and `login`.
    pub fn establishes_identity(&self) -> bool {
        matches!(self, Self::Register(_) | Self::Login(_))
    }
}
