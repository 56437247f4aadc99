//! Error types for the Gatekeep meta-crate.

use gatekeep_protocol::{Notice, ProtocolError};
use gatekeep_session::SessionError;
use gatekeep_store::StoreError;
use gatekeep_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so the `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum GateError {
    /// Bad input from the transport (e.g. an empty player name).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The host couldn't carry out an instruction.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A session registry invariant was violated.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Loading or saving credentials failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Why a `register`, `login` or `setpassword` didn't go through.
///
/// These are answers for the player, not failures of the gate: each maps
/// to exactly one [`Notice`] via [`CommandError::notice`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    /// `login` for an identity without a credential record.
    #[error("identity is not registered")]
    NotRegistered,

    /// `register` for an identity that already has a record. The stored
    /// secret is left untouched.
    #[error("identity is already registered")]
    AlreadyRegistered,

    /// Wrong number of arguments.
    #[error("{command} expects {expected} argument(s), got {got}")]
    BadCredentialFormat {
        command: &'static str,
        expected: usize,
        got: usize,
    },

    /// `login` with a secret that doesn't match.
    #[error("incorrect secret")]
    IncorrectSecret,

    /// `register`/`login` on a session that is already authenticated.
    #[error("session is already authenticated")]
    AlreadyAuthenticated,

    /// `setpassword` whose two arguments differ.
    #[error("password confirmation does not match")]
    PasswordMismatch,

    /// `setpassword` before logging in.
    #[error("session is not authenticated")]
    NotAuthenticated,

    /// The connection doesn't own a session for this identity (it was
    /// never admitted, or has been displaced).
    #[error("no session for this connection")]
    NoSession,
}

impl CommandError {
    /// The message to show the player.
    pub fn notice(&self) -> Notice {
        match self {
            Self::NotRegistered => Notice::NotRegistered,
            Self::AlreadyRegistered => Notice::AlreadyRegistered,
            Self::BadCredentialFormat { command, .. } => match *command {
                "register" => Notice::RegisterUsage,
                "login" => Notice::LoginUsage,
                _ => Notice::SetPasswordUsage,
            },
            Self::IncorrectSecret => Notice::IncorrectPassword,
            Self::AlreadyAuthenticated => Notice::AlreadyLoggedIn,
            Self::PasswordMismatch => Notice::PasswordsDoNotMatch,
            Self::NotAuthenticated | Self::NoSession => Notice::LoginFirst,
        }
    }
}
