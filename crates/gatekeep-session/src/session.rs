//! Session types: the server's record of one connected identity.
//!
//! A session tracks:
//! - WHO is connected (`IdentityKey`) and on WHICH connection
//! - WHETHER they've proven it yet (pending vs. authenticated)
//! - WHEN they run out of time to prove it (the pre-auth deadline)
//! - WHERE to put them back once they do (the return location)
//!
//! Secrets never live here; those belong to the credential store.

use std::time::{Duration, SystemTime};

use gatekeep_protocol::{IdentityKey, Location, ProfileIds};
use gatekeep_transport::ConnectionId;

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Configuration for session behavior.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// How long a new connection has to `/login` or `/register` before
    /// it is swept.
    ///
    /// Default: 60 seconds.
    pub pre_auth_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            pre_auth_timeout: Duration::from_secs(60),
        }
    }
}

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// Where a session is in the authentication flow.
///
/// ```text
///   PendingAuth { deadline } ──(login / register)──→ Authenticated
/// ```
///
/// There is no way back: an authenticated session stays authenticated
/// until it is destroyed on disconnect. Putting the deadline inside the
/// pending variant means an authenticated session simply *has* no
/// deadline, rather than carrying a stale one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Waiting for credentials. Swept once `deadline` has passed.
    PendingAuth { deadline: SystemTime },

    /// Credentials verified.
    Authenticated,
}

// ---------------------------------------------------------------------------
// Arrival
// ---------------------------------------------------------------------------

/// What the transport tells us about a fresh connection.
#[derive(Debug, Clone)]
pub struct Arrival {
    /// The host's handle for this connection.
    pub conn: ConnectionId,
    /// Where the player spawned, if the host knows.
    pub location: Option<Location>,
    /// Premium/offline profile identifiers, if the host knows them.
    pub profile_ids: Option<ProfileIds>,
}

impl Arrival {
    /// An arrival with only a connection id.
    pub fn new(conn: ConnectionId) -> Self {
        Self {
            conn,
            location: None,
            profile_ids: None,
        }
    }

    /// Sets the arrival location.
    pub fn at(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    /// Sets the profile identifiers.
    pub fn with_profile_ids(mut self, ids: ProfileIds) -> Self {
        self.profile_ids = Some(ids);
        self
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// A single identity's session.
///
/// Created on admission, destroyed on disconnect. At most one exists per
/// identity key at any instant.
#[derive(Debug, Clone)]
pub struct Session {
    /// Which identity this session belongs to.
    pub identity: IdentityKey,

    /// The connection that owns it.
    pub conn: ConnectionId,

    /// Current authentication state.
    pub state: SessionState,

    /// Where the player goes after authenticating: their last known
    /// authenticated position from a previous session, or the arrival
    /// point if there is none.
    pub return_location: Option<Location>,

    /// Profile ids forwarded to the migrator after authentication.
    pub profile_ids: Option<ProfileIds>,
}

impl Session {
    /// Returns `true` once login or registration succeeded.
    pub fn is_authenticated(&self) -> bool {
        matches!(self.state, SessionState::Authenticated)
    }

    /// The pre-auth deadline, or `None` once authenticated.
    pub fn pre_auth_deadline(&self) -> Option<SystemTime> {
        match self.state {
            SessionState::PendingAuth { deadline } => Some(deadline),
            SessionState::Authenticated => None,
        }
    }

    /// Returns `true` if this session is still pending and its deadline
    /// is at or before `now`.
    pub fn is_expired_at(&self, now: SystemTime) -> bool {
        self.pre_auth_deadline()
            .is_some_and(|deadline| deadline <= now)
    }
}
