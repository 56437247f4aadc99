//! The session registry: the authoritative identity → session map.
//!
//! Responsibilities:
//! - Creating a pending session (with deadline) when a connection is admitted
//! - Flipping a session to authenticated, exactly once
//! - Remembering each identity's last authenticated position across sessions
//! - Listing pending sessions whose deadline has passed
//! - Destroying sessions on disconnect
//!
//! # Concurrency note
//!
//! `SessionRegistry` is a plain `HashMap` wrapper with `&mut self`
//! methods. The gate owns it behind a single lock, together with the
//! [`JoinAdmissionController`](crate::JoinAdmissionController), so that
//! admission and creation are linearizable with each other.

use std::collections::HashMap;
use std::time::SystemTime;

use gatekeep_protocol::{IdentityKey, Location};
use gatekeep_transport::ConnectionId;

use crate::{Arrival, Session, SessionConfig, SessionError, SessionState};

/// Tracks every live session, keyed by identity.
///
/// ## Lifecycle
///
/// ```text
/// admission ──→ create() ──→ authenticate() ──→ destroy()
///                  │                                ↑
///                  ▼                                │
///           [PendingAuth] ──(deadline)──→ sweep_expired() ──→ host kicks
/// ```
pub struct SessionRegistry {
    /// Live sessions. One per identity: this map's key uniqueness *is*
    /// the collision invariant.
    sessions: HashMap<IdentityKey, Session>,

    /// Last position each identity held while authenticated.
    ///
    /// Outlives sessions: it is written on an authenticated disconnect
    /// and read by the identity's next `create`.
    last_known: HashMap<IdentityKey, Location>,

    config: SessionConfig,
}

impl SessionRegistry {
    /// Creates an empty registry.
    pub fn new(config: SessionConfig) -> Self {
        Self {
            sessions: HashMap::new(),
            last_known: HashMap::new(),
            config,
        }
    }

    /// Inserts a pending session with `deadline = now + pre_auth_timeout`.
    ///
    /// The session's return location is the identity's last known
    /// authenticated position if there is one, otherwise the arrival
    /// location.
    ///
    /// # Errors
    /// Returns [`SessionError::AlreadyExists`] if the identity already has
    /// a session. Route connections through admission first.
    pub fn create(
        &mut self,
        identity: IdentityKey,
        now: SystemTime,
        arrival: Arrival,
    ) -> Result<&Session, SessionError> {
        if self.sessions.contains_key(&identity) {
            return Err(SessionError::AlreadyExists(identity));
        }

        let deadline = now + self.config.pre_auth_timeout;
        let return_location = self
            .last_known
            .get(&identity)
            .cloned()
            .or(arrival.location);

        let session = Session {
            identity: identity.clone(),
            conn: arrival.conn,
            state: SessionState::PendingAuth { deadline },
            return_location,
            profile_ids: arrival.profile_ids,
        };

        tracing::info!(%identity, conn = %arrival.conn, "session created, awaiting credentials");

        Ok(self.sessions.entry(identity).or_insert(session))
    }

    /// Marks the identity's session authenticated and clears its deadline.
    ///
    /// Calling it again on an authenticated session changes nothing.
    ///
    /// # Errors
    /// Returns [`SessionError::NotFound`] if no session exists.
    pub fn authenticate(
        &mut self,
        identity: &IdentityKey,
    ) -> Result<&Session, SessionError> {
        let session = self
            .sessions
            .get_mut(identity)
            .ok_or_else(|| SessionError::NotFound(identity.clone()))?;

        if !session.is_authenticated() {
            session.state = SessionState::Authenticated;
            tracing::info!(%identity, conn = %session.conn, "session authenticated");
        }

        Ok(session)
    }

    /// Returns `true` if the identity has an authenticated session.
    ///
    /// Fail-closed: no session means "not logged in".
    pub fn is_authenticated(&self, identity: &IdentityKey) -> bool {
        self.sessions
            .get(identity)
            .is_some_and(Session::is_authenticated)
    }

    /// Like [`is_authenticated`](Self::is_authenticated), but also requires
    /// the session to belong to `conn`. A connection that doesn't own the
    /// identity's session (for example one that was just displaced) is
    /// treated as unauthenticated.
    pub fn is_authenticated_on(
        &self,
        identity: &IdentityKey,
        conn: ConnectionId,
    ) -> bool {
        self.sessions
            .get(identity)
            .is_some_and(|s| s.conn == conn && s.is_authenticated())
    }

    /// Records `location` as the identity's return location, both on the
    /// live session and for its next session.
    ///
    /// # Errors
    /// - [`SessionError::NotFound`] if no session exists
    /// - [`SessionError::NotAuthenticated`] if the session is still pending;
    ///   only authenticated positions are carried across sessions
    pub fn update_return_location(
        &mut self,
        identity: &IdentityKey,
        location: Location,
    ) -> Result<(), SessionError> {
        let session = self
            .sessions
            .get_mut(identity)
            .ok_or_else(|| SessionError::NotFound(identity.clone()))?;

        if !session.is_authenticated() {
            return Err(SessionError::NotAuthenticated(identity.clone()));
        }

        session.return_location = Some(location.clone());
        self.last_known.insert(identity.clone(), location);
        Ok(())
    }

    /// Removes and returns the identity's session.
    pub fn destroy(&mut self, identity: &IdentityKey) -> Option<Session> {
        let removed = self.sessions.remove(identity);
        if let Some(session) = &removed {
            tracing::info!(
                %identity,
                conn = %session.conn,
                authenticated = session.is_authenticated(),
                "session destroyed"
            );
        }
        removed
    }

    /// Returns every pending session whose deadline is at or before `now`,
    /// as `(identity, connection)` pairs sorted by identity.
    ///
    /// Nothing is removed. Eviction means terminating the connection,
    /// which only the host can do; the resulting disconnect is what calls
    /// [`destroy`](Self::destroy). Until then the session keeps showing up
    /// here.
    pub fn sweep_expired(
        &self,
        now: SystemTime,
    ) -> Vec<(IdentityKey, ConnectionId)> {
        let mut expired: Vec<_> = self
            .sessions
            .values()
            .filter(|s| s.is_expired_at(now))
            .map(|s| (s.identity.clone(), s.conn))
            .collect();
        expired.sort_by(|a, b| a.0.cmp(&b.0));
        expired
    }

    /// Looks up a session by identity.
    pub fn get(&self, identity: &IdentityKey) -> Option<&Session> {
        self.sessions.get(identity)
    }

    /// The identity's last known authenticated position, if any.
    pub fn last_known_location(&self, identity: &IdentityKey) -> Option<&Location> {
        self.last_known.get(identity)
    }

    /// Returns the number of live sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Returns `true` if there are no sessions.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

// =========================================================================
// Tests
// =========================================================================
