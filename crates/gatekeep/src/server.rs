//! `Gatekeeper` builder and inbound event handlers.
//!
//! This is the entry point the host talks to. It ties the layers
//! together: admission + sessions (the lobby), the credential store, the
//! auth gate, and the host link for everything the gate needs done.
//!
//! Locking rule: no lock is held across a call into the [`PlayerLink`].
//! Every handler reads or mutates state in a short scope, drops the
//! guard, and only then instructs the host.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::SystemTime;

use gatekeep_protocol::{Command, IdentityKey, Location, Notice, Position, ProfileIds};
use gatekeep_session::{Admission, Arrival};
use gatekeep_store::{CredentialStore, FileMigrator, PlayerDataMigrator};
use gatekeep_tick::TickConfig;
use gatekeep_transport::{ConnectionId, PlayerLink, TransportError};
use tokio::sync::Mutex;

use crate::commands::{AuthKind, CommandProcessor, Granted};
use crate::gate::{AuthGate, Verdict};
use crate::lobby::Lobby;
use crate::sweeper::{self, SweeperHandle};
use crate::{GateError, GatekeepConfig};

/// Shared gate state, one per host.
///
/// Wrapped in `Arc` so every handler and the sweeper task can hold it.
pub(crate) struct GateState<L: PlayerLink> {
    pub(crate) lobby: Mutex<Lobby>,
    pub(crate) store: Mutex<CredentialStore>,
    pub(crate) link: L,
    migrator: Option<Arc<dyn PlayerDataMigrator>>,
    force_migrate: HashSet<IdentityKey>,
    holding_point: Option<Position>,
    sweep: TickConfig,
}

/// What happened to a connection on join.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    /// A pending session was created. `displaced` is the connection of an
    /// earlier, still-unauthenticated session for the same identity, which
    /// has been told to disconnect.
    Admitted { displaced: Option<ConnectionId> },
    /// Refused by the global join limit; the connection was terminated.
    RateLimited,
    /// Refused because the identity is already logged in elsewhere; the
    /// connection was terminated and the existing session is untouched.
    AlreadyOnline,
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Builder for a [`Gatekeeper`].
///
/// ```rust,ignore
/// let gate = GatekeeperBuilder::new()
///     .config(config)
///     .build(my_link)?;
/// let sweeper = gate.spawn_sweeper();
/// ```
pub struct GatekeeperBuilder {
    config: GatekeepConfig,
    migrator: Option<Arc<dyn PlayerDataMigrator>>,
}

impl GatekeeperBuilder {
    /// Creates a builder with default settings.
    pub fn new() -> Self {
        Self {
            config: GatekeepConfig::default(),
            migrator: None,
        }
    }

    /// Sets the configuration.
    pub fn config(mut self, config: GatekeepConfig) -> Self {
        self.config = config;
        self
    }

    /// Uses a custom player-data migrator instead of the file migrator
    /// implied by `playerdata_dir`.
    pub fn migrator(mut self, migrator: impl PlayerDataMigrator) -> Self {
        self.migrator = Some(Arc::new(migrator));
        self
    }

    /// Loads the credentials and builds the gate.
    ///
    /// # Errors
    /// A credentials file that exists but can't be read or parsed is
    /// fatal ([`GateError::Store`]): starting with an empty store would
    /// let anyone re-register every existing name.
    pub fn build<L: PlayerLink>(self, link: L) -> Result<Gatekeeper<L>, GateError> {
        let config = self.config;
        let store = match &config.credentials_path {
            Some(path) => CredentialStore::open(path)?,
            None => {
                tracing::warn!("no credentials file configured; registrations will not survive a restart");
                CredentialStore::in_memory()
            }
        };

        let migrator = self.migrator.or_else(|| {
            config
                .playerdata_dir
                .as_ref()
                .map(|dir| Arc::new(FileMigrator::new(dir)) as Arc<dyn PlayerDataMigrator>)
        });

        let state = Arc::new(GateState {
            lobby: Mutex::new(Lobby::new(&config)),
            store: Mutex::new(store),
            link,
            migrator,
            force_migrate: config.force_migrate_keys(),
            holding_point: config.holding_point,
            sweep: config.sweep_tick_config(),
        });

        tracing::info!(
            max_joins_per_second = config.max_joins_per_second,
            pre_auth_timeout_secs = config.pre_auth_timeout_secs,
            migration = state.migrator.is_some(),
            "gatekeeper ready"
        );

        Ok(Gatekeeper { state })
    }
}

impl Default for GatekeeperBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Gatekeeper
// ---------------------------------------------------------------------------

/// The identity gate for one host.
///
/// Cheap to clone; clones share state. Every `on_*` method takes the
/// player's name as the host reports it and the connection it arrived
/// on.
pub struct Gatekeeper<L: PlayerLink> {
    state: Arc<GateState<L>>,
}

impl<L: PlayerLink> Clone for Gatekeeper<L> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<L: PlayerLink> Gatekeeper<L> {
    // -----------------------------------------------------------------------
    // Inbound events
    // -----------------------------------------------------------------------

    /// A player joined.
    ///
    /// Admitted players get a pending session, are parked at the holding
    /// point with movement locked, and are told to log in or register.
    /// Refused players are terminated with the reason.
    pub async fn on_connect(
        &self,
        name: &str,
        now: SystemTime,
        arrival: Arrival,
    ) -> Result<JoinOutcome, GateError> {
        let identity = IdentityKey::new(name)?;
        let conn = arrival.conn;
        let spawn = arrival.location.clone();
        let link = &self.state.link;

        let admission = self.state.lobby.lock().await.admit(identity.clone(), now, arrival)?;

        let displaced = match admission {
            Admission::RejectRateLimited => {
                link.terminate(conn, Notice::TooManyJoins).await?;
                return Ok(JoinOutcome::RateLimited);
            }
            Admission::RejectDuplicateOnline => {
                link.terminate(conn, Notice::AlreadyOnline).await?;
                return Ok(JoinOutcome::AlreadyOnline);
            }
            Admission::Admit { evicted } => evicted.map(|session| session.conn),
        };

        if let Some(old) = displaced {
            report("terminate displaced", old, link.terminate(old, Notice::Displaced).await);
        }

        if let (Some(point), Some(spawn)) = (self.state.holding_point, &spawn) {
            link.teleport(conn, spawn.relocated(point)).await?;
        }
        link.apply_movement_lock(conn).await?;

        let prompt = if self.state.store.lock().await.contains(&identity) {
            Notice::PromptLogin
        } else {
            Notice::PromptRegister
        };
        link.send_notice(conn, prompt).await?;

        Ok(JoinOutcome::Admitted { displaced })
    }

    /// A player left (or was terminated).
    ///
    /// If the session was authenticated, `location` becomes the return
    /// location for the identity's next session. Disconnects from a
    /// connection that no longer owns the identity's session (one that
    /// was displaced) are ignored.
    pub async fn on_disconnect(
        &self,
        name: &str,
        conn: ConnectionId,
        location: Option<Location>,
    ) -> Result<(), GateError> {
        let identity = IdentityKey::new(name)?;
        let mut lobby = self.state.lobby.lock().await;

        if lobby.sessions.get(&identity).is_none_or(|s| s.conn != conn) {
            tracing::debug!(%identity, %conn, "disconnect for a connection without a session");
            return Ok(());
        }

        if lobby.sessions.is_authenticated_on(&identity, conn) {
            if let Some(location) = location {
                lobby.sessions.update_return_location(&identity, location)?;
            }
        }
        lobby.sessions.destroy(&identity);
        Ok(())
    }

    /// May the player move from `from` to `to`?
    pub async fn on_move_attempt(
        &self,
        name: &str,
        conn: ConnectionId,
        from: &Location,
        to: &Location,
    ) -> Result<Verdict, GateError> {
        let identity = IdentityKey::new(name)?;
        let lobby = self.state.lobby.lock().await;
        Ok(AuthGate::new(&lobby.sessions).check_move(&identity, conn, from, to))
    }

    /// May the player take damage?
    pub async fn on_damage_attempt(
        &self,
        name: &str,
        conn: ConnectionId,
    ) -> Result<Verdict, GateError> {
        let identity = IdentityKey::new(name)?;
        let lobby = self.state.lobby.lock().await;
        Ok(AuthGate::new(&lobby.sessions).check_damage(&identity, conn))
    }

    /// May the player run this command line? On `Deny` the player is
    /// told what to do instead.
    pub async fn on_command_attempt(
        &self,
        name: &str,
        conn: ConnectionId,
        raw: &str,
    ) -> Result<Verdict, GateError> {
        let identity = IdentityKey::new(name)?;
        // A line with no command name is still a command attempt.
        let command = Command::parse(raw).unwrap_or_else(|_| Command::Other(String::new()));

        let verdict = {
            let lobby = self.state.lobby.lock().await;
            AuthGate::new(&lobby.sessions).check_command(&identity, conn, &command)
        };

        if verdict == Verdict::Deny {
            let notice = self.guidance(&identity).await;
            report("send guidance", conn, self.state.link.send_notice(conn, notice).await);
        }
        Ok(verdict)
    }

    /// Runs `register`, `login` or `setpassword` and returns what to tell
    /// the player. Other command names aren't ours and return nothing.
    pub async fn on_command_invoke(
        &self,
        name: &str,
        conn: ConnectionId,
        command_name: &str,
        args: Vec<String>,
    ) -> Result<Vec<Notice>, GateError> {
        let identity = IdentityKey::new(name)?;
        let processor = CommandProcessor::new(&self.state.lobby, &self.state.store);

        let notices = match Command::from_parts(command_name, args) {
            Command::Register(args) => {
                match processor.register(&identity, conn, name, &args).await {
                    Ok(granted) => self.complete_auth(&identity, conn, granted).await,
                    Err(e) => vec![e.notice()],
                }
            }
            Command::Login(args) => match processor.login(&identity, conn, &args).await {
                Ok(granted) => self.complete_auth(&identity, conn, granted).await,
                Err(e) => vec![e.notice()],
            },
            Command::SetPassword(args) => {
                match processor.set_password(&identity, conn, &args).await {
                    Ok(true) => vec![Notice::PasswordSaved],
                    Ok(false) => vec![Notice::PasswordSaved, Notice::StorageDegraded],
                    Err(crate::CommandError::NotAuthenticated) => {
                        vec![self.guidance(&identity).await]
                    }
                    Err(e) => vec![e.notice()],
                }
            }
            Command::Other(_) => Vec::new(),
        };
        Ok(notices)
    }

    // -----------------------------------------------------------------------
    // Timeouts
    // -----------------------------------------------------------------------

    /// Terminates every pending session past its deadline at `now`, and
    /// retries a credentials save that failed earlier.
    ///
    /// Sessions are not removed here; the disconnect that follows the
    /// termination does that. A session whose disconnect hasn't arrived
    /// yet is simply terminated again on the next sweep.
    ///
    /// Returns the connections that were told to terminate.
    pub async fn sweep(&self, now: SystemTime) -> Vec<ConnectionId> {
        let expired = self.state.lobby.lock().await.sessions.sweep_expired(now);

        for (identity, conn) in &expired {
            tracing::info!(%identity, %conn, "login timeout");
            report(
                "terminate expired",
                *conn,
                self.state.link.terminate(*conn, Notice::LoginTimeout).await,
            );
        }

        {
            let mut store = self.state.store.lock().await;
            if store.is_dirty() {
                tracing::info!("retrying credentials save");
                // Failure is logged by the store; it stays dirty for the next sweep.
                let _ = store.flush();
            }
        }

        expired.into_iter().map(|(_, conn)| conn).collect()
    }

    /// Starts the background sweeper on the configured interval.
    ///
    /// The sweeper stops when the returned handle is shut down or dropped.
    pub fn spawn_sweeper(&self) -> SweeperHandle {
        sweeper::spawn(self.clone(), self.state.sweep.clone())
    }

    // -----------------------------------------------------------------------
    // Queries and operator actions
    // -----------------------------------------------------------------------

    /// Whether the identity currently has an authenticated session.
    pub async fn is_authenticated(&self, name: &str) -> Result<bool, GateError> {
        let identity = IdentityKey::new(name)?;
        Ok(self.state.lobby.lock().await.sessions.is_authenticated(&identity))
    }

    /// Number of live sessions, pending and authenticated.
    pub async fn session_count(&self) -> usize {
        self.state.lobby.lock().await.sessions.len()
    }

    /// Whether the identity has a credential record.
    pub async fn is_registered(&self, name: &str) -> Result<bool, GateError> {
        let identity = IdentityKey::new(name)?;
        Ok(self.state.store.lock().await.contains(&identity))
    }

    /// Clears the identity's migration flag so its data is migrated again
    /// on next login. Returns `false` if the identity isn't registered.
    pub async fn reset_migration(&self, name: &str) -> Result<bool, GateError> {
        let identity = IdentityKey::new(name)?;
        let mut store = self.state.store.lock().await;
        if !store.reset_migrated(&identity) {
            return Ok(false);
        }
        store.flush()?;
        Ok(true)
    }

    /// Writes unsaved credential changes, if any.
    pub async fn flush_credentials(&self) -> Result<(), GateError> {
        self.state.store.lock().await.flush()?;
        Ok(())
    }

    /// Re-reads the credentials file, replacing what's in memory.
    ///
    /// Refused while a failed save has left changes only in memory; call
    /// [`flush_credentials`](Self::flush_credentials) first.
    pub async fn reload_credentials(&self) -> Result<(), GateError> {
        self.state.store.lock().await.load()?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    /// What to tell an unauthenticated player who tried something else.
    async fn guidance(&self, identity: &IdentityKey) -> Notice {
        if self.state.store.lock().await.contains(identity) {
            Notice::LoginFirst
        } else {
            Notice::PromptRegister
        }
    }

    /// Puts a freshly authenticated player back where they belong and
    /// runs their data migration.
    async fn complete_auth(
        &self,
        identity: &IdentityKey,
        conn: ConnectionId,
        granted: Granted,
    ) -> Vec<Notice> {
        let link = &self.state.link;
        if let Some(location) = granted.return_location {
            report("teleport back", conn, link.teleport(conn, location).await);
        }
        report("clear movement lock", conn, link.clear_movement_lock(conn).await);

        let mut notices = vec![match granted.kind {
            AuthKind::Registered => Notice::RegistrationComplete,
            AuthKind::LoggedIn => Notice::LoginSuccessful,
        }];
        if !granted.persisted {
            notices.push(Notice::StorageDegraded);
        }

        if let Some(ids) = granted.profile_ids {
            self.migrate_if_due(identity, &ids).await;
        }
        notices
    }

    /// Migrates once per identity, or every time for forced identities.
    /// Failures are logged and never affect authentication.
    async fn migrate_if_due(&self, identity: &IdentityKey, ids: &ProfileIds) {
        let Some(migrator) = self.state.migrator.clone() else {
            return;
        };
        let forced = self.state.force_migrate.contains(identity);
        let due = forced
            || self
                .state
                .store
                .lock()
                .await
                .get(identity)
                .is_some_and(|record| !record.migrated);
        if !due {
            return;
        }

        // Migrators do blocking file IO; keep it off the runtime workers.
        let job_ids = *ids;
        let result = tokio::task::spawn_blocking(move || migrator.migrate(&job_ids)).await;
        match result {
            Ok(Ok(outcome)) => {
                tracing::info!(%identity, ?outcome, forced, "player data migration done");
                if !forced {
                    let mut store = self.state.store.lock().await;
                    store.mark_migrated(identity);
                    let _ = store.flush();
                }
            }
            Ok(Err(e)) => {
                tracing::error!(%identity, error = %e, "player data migration failed; will retry next login");
            }
            Err(e) => {
                tracing::error!(%identity, error = %e, "player data migration task panicked; will retry next login");
            }
        }
    }
}

fn report(action: &'static str, conn: ConnectionId, result: Result<(), TransportError>) {
    if let Err(e) = result {
        tracing::warn!(%conn, action, error = %e, "link instruction failed");
    }
}
