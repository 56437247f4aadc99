//! `register`, `login` and `setpassword`.
//!
//! Each command is a short sequence of lock scopes, never more than one
//! lock held at a time:
//!
//! ```text
//!   lobby:  does this connection own a session in the right state?
//!   store:  check / write the credential, save
//!   lobby:  still the owner? → authenticate
//! ```
//!
//! The second lobby check matters: while the store was being written the
//! player may have disconnected, or been displaced by a new connection.
//! Authenticating whoever holds the identity *now* would hand a session
//! to the wrong connection.

use gatekeep_protocol::{IdentityKey, Location, ProfileIds};
use gatekeep_store::{CredentialRecord, CredentialStore};
use gatekeep_transport::ConnectionId;
use tokio::sync::Mutex;

use crate::CommandError;
use crate::lobby::Lobby;

/// How a session became authenticated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AuthKind {
    Registered,
    LoggedIn,
}

/// What a successful `register`/`login` hands back.
#[derive(Debug, Clone)]
pub(crate) struct Granted {
    pub(crate) kind: AuthKind,
    pub(crate) return_location: Option<Location>,
    pub(crate) profile_ids: Option<ProfileIds>,
    /// `false` if the credential change couldn't be written to disk.
    pub(crate) persisted: bool,
}

pub(crate) struct CommandProcessor<'a> {
    lobby: &'a Mutex<Lobby>,
    store: &'a Mutex<CredentialStore>,
}

impl<'a> CommandProcessor<'a> {
    pub(crate) fn new(lobby: &'a Mutex<Lobby>, store: &'a Mutex<CredentialStore>) -> Self {
        Self { lobby, store }
    }

    /// Creates a credential and authenticates the session in one go.
    pub(crate) async fn register(
        &self,
        identity: &IdentityKey,
        conn: ConnectionId,
        display_name: &str,
        args: &[String],
    ) -> Result<Granted, CommandError> {
        self.require_pending(identity, conn).await?;

        let persisted = {
            let mut store = self.store.lock().await;
            if store.contains(identity) {
                return Err(CommandError::AlreadyRegistered);
            }
            let [secret] = args else {
                return Err(CommandError::BadCredentialFormat {
                    command: "register",
                    expected: 1,
                    got: args.len(),
                });
            };
            store.put(identity.clone(), CredentialRecord::new(display_name.trim(), secret.as_str()));
            store.save().is_ok()
        };

        tracing::info!(%identity, %conn, persisted, "identity registered");
        self.grant(identity, conn, AuthKind::Registered, persisted).await
    }

    /// Checks the secret and authenticates the session.
    pub(crate) async fn login(
        &self,
        identity: &IdentityKey,
        conn: ConnectionId,
        args: &[String],
    ) -> Result<Granted, CommandError> {
        self.require_pending(identity, conn).await?;

        {
            let store = self.store.lock().await;
            let Some(record) = store.get(identity) else {
                return Err(CommandError::NotRegistered);
            };
            let [attempt] = args else {
                return Err(CommandError::BadCredentialFormat {
                    command: "login",
                    expected: 1,
                    got: args.len(),
                });
            };
            if !record.verify(attempt) {
                tracing::warn!(%identity, %conn, "login failed: incorrect secret");
                return Err(CommandError::IncorrectSecret);
            }
        }

        self.grant(identity, conn, AuthKind::LoggedIn, true).await
    }

    /// Replaces the secret of an authenticated identity. Returns whether
    /// the change reached disk.
    pub(crate) async fn set_password(
        &self,
        identity: &IdentityKey,
        conn: ConnectionId,
        args: &[String],
    ) -> Result<bool, CommandError> {
        if !self.lobby.lock().await.sessions.is_authenticated_on(identity, conn) {
            return Err(CommandError::NotAuthenticated);
        }

        let [secret, confirm] = args else {
            return Err(CommandError::BadCredentialFormat {
                command: "setpassword",
                expected: 2,
                got: args.len(),
            });
        };
        if secret != confirm {
            return Err(CommandError::PasswordMismatch);
        }

        let mut store = self.store.lock().await;
        if !store.set_secret(identity, secret) {
            return Err(CommandError::NotRegistered);
        }
        let persisted = store.save().is_ok();
        tracing::info!(%identity, %conn, persisted, "secret changed");
        Ok(persisted)
    }

    async fn require_pending(
        &self,
        identity: &IdentityKey,
        conn: ConnectionId,
    ) -> Result<(), CommandError> {
        let lobby = self.lobby.lock().await;
        match lobby.sessions.get(identity) {
            Some(session) if session.conn == conn => {
                if session.is_authenticated() {
                    Err(CommandError::AlreadyAuthenticated)
                } else {
                    Ok(())
                }
            }
            _ => Err(CommandError::NoSession),
        }
    }

    async fn grant(
        &self,
        identity: &IdentityKey,
        conn: ConnectionId,
        kind: AuthKind,
        persisted: bool,
    ) -> Result<Granted, CommandError> {
        let mut lobby = self.lobby.lock().await;
        if lobby.sessions.get(identity).is_none_or(|s| s.conn != conn) {
            tracing::info!(%identity, %conn, "session gone before authentication completed");
            return Err(CommandError::NoSession);
        }
        let session = lobby
            .sessions
            .authenticate(identity)
            .map_err(|_| CommandError::NoSession)?;

        Ok(Granted {
            kind,
            return_location: session.return_location.clone(),
            profile_ids: session.profile_ids,
            persisted,
        })
    }
}

// =========================================================================
// Tests
// =========================================================================
