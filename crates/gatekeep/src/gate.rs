//! The authentication gate: allow/deny decisions for player actions.
//!
//! Every action the host asks about goes through one [`AuthGate`], built
//! over a shared borrow of the session registry. It can only *read*
//! sessions, so asking a question never changes the answer to the next.
//!
//! Fail-closed throughout: an identity without a session, or a
//! connection that doesn't own the identity's session, is treated as
//! unauthenticated.

use gatekeep_protocol::{Command, IdentityKey, Location};
use gatekeep_session::SessionRegistry;
use gatekeep_transport::ConnectionId;

/// The gate's answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Allow,
    Deny,
}

impl Verdict {
    pub fn is_allowed(self) -> bool {
        self == Self::Allow
    }

    fn from_bool(allowed: bool) -> Self {
        if allowed { Self::Allow } else { Self::Deny }
    }
}

/// Read-only view over the sessions that answers "may this happen?".
pub struct AuthGate<'a> {
    sessions: &'a SessionRegistry,
}

impl<'a> AuthGate<'a> {
    pub fn new(sessions: &'a SessionRegistry) -> Self {
        Self { sessions }
    }

    fn authenticated(&self, identity: &IdentityKey, conn: ConnectionId) -> bool {
        self.sessions.is_authenticated_on(identity, conn)
    }

    /// Movement: authenticated players move freely. Everyone else may
    /// only turn in place (same world and coordinates); on `Deny` the host
    /// keeps the player at `from`.
    pub fn check_move(
        &self,
        identity: &IdentityKey,
        conn: ConnectionId,
        from: &Location,
        to: &Location,
    ) -> Verdict {
        Verdict::from_bool(self.authenticated(identity, conn) || from.same_position(to))
    }

    /// Damage of any cause taken *by* the player.
    pub fn check_damage(&self, identity: &IdentityKey, conn: ConnectionId) -> Verdict {
        Verdict::from_bool(self.authenticated(identity, conn))
    }

    /// Commands: `register` and `login` are always allowed, everything
    /// else needs authentication.
    pub fn check_command(
        &self,
        identity: &IdentityKey,
        conn: ConnectionId,
        command: &Command,
    ) -> Verdict {
        Verdict::from_bool(command.establishes_identity() || self.authenticated(identity, conn))
    }
}
