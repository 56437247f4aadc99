//! Join admission: the rate limiter and the name-collision resolver.
//!
//! Every new connection passes through [`JoinAdmissionController::try_admit`]
//! before a session is created for it. Two checks run, in this order:
//!
//! 1. **Join rate.** A process-wide cap of N joins per wall-clock second
//!    (3 by default). This is a coarse backpressure valve shared by every
//!    identity, not a per-player quota.
//! 2. **Collision.** If the identity already has a session:
//!    - pending (not yet logged in) → the old session is evicted and the
//!      new connection proceeds. An unproven session can't hold a name
//!      hostage.
//!    - authenticated → the *new* connection is refused and the existing
//!      one is left alone.

use std::time::{SystemTime, UNIX_EPOCH};

use gatekeep_protocol::IdentityKey;

use crate::{Session, SessionRegistry};

/// Configuration for the join limiter.
#[derive(Debug, Clone)]
pub struct AdmissionConfig {
    /// Maximum joins accepted within one wall-clock second.
    ///
    /// Default: 3.
    pub max_joins_per_second: u32,
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            max_joins_per_second: 3,
        }
    }
}

/// The outcome of an admission check.
#[derive(Debug)]
pub enum Admission {
    /// The connection may proceed to session creation.
    ///
    /// `evicted` is the pending session that was displaced to make room,
    /// if any; its connection still has to be terminated by the caller.
    Admit { evicted: Option<Session> },

    /// Too many joins this second. No session was touched.
    RejectRateLimited,

    /// The identity is already online and authenticated.
    RejectDuplicateOnline,
}

impl Admission {
    /// Returns `true` for [`Admission::Admit`].
    pub fn is_admitted(&self) -> bool {
        matches!(self, Self::Admit { .. })
    }
}

/// Joins counted in the current wall-clock second.
#[derive(Debug, Default)]
struct JoinCounter {
    window_start_second: u64,
    count_in_window: u32,
}

/// Gatekeeper for new connections.
///
/// Holds only the process-wide join counter. The collision check reads
/// and mutates the [`SessionRegistry`] passed in, so the caller must hold
/// the registry exclusively across `try_admit` *and* the following
/// `create` for the pair to be atomic.
#[derive(Debug)]
pub struct JoinAdmissionController {
    counter: JoinCounter,
    config: AdmissionConfig,
}

impl JoinAdmissionController {
    /// Creates a controller with an empty join window.
    pub fn new(config: AdmissionConfig) -> Self {
        Self {
            counter: JoinCounter::default(),
            config,
        }
    }

    /// Decides whether `identity` may start a session at `now`.
    ///
    /// On [`Admission::Admit`] with an evicted session, the old session is
    /// already gone from `sessions`.
    pub fn try_admit(
        &mut self,
        sessions: &mut SessionRegistry,
        identity: &IdentityKey,
        now: SystemTime,
    ) -> Admission {
        if !self.take_join_slot(now) {
            tracing::warn!(
                %identity,
                joins = self.counter.count_in_window,
                limit = self.config.max_joins_per_second,
                "join rejected: rate limit"
            );
            return Admission::RejectRateLimited;
        }

        let Some(existing) = sessions.get(identity) else {
            return Admission::Admit { evicted: None };
        };

        if existing.is_authenticated() {
            tracing::warn!(
                %identity,
                existing_conn = %existing.conn,
                "join rejected: identity already online"
            );
            return Admission::RejectDuplicateOnline;
        }

        let evicted = sessions.destroy(identity);
        tracing::info!(
            %identity,
            "pending session displaced by new connection"
        );
        Admission::Admit { evicted }
    }

    /// Counts one join attempt against the current second. Returns
    /// `false` if that puts the window over the limit.
    ///
    /// Rejected attempts still count, so a flood can't slip through by
    /// retrying within the same second.
    fn take_join_slot(&mut self, now: SystemTime) -> bool {
        // Clocks before the epoch all land in second 0.
        let current_second = now
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);

        if current_second != self.counter.window_start_second {
            self.counter.window_start_second = current_second;
            self.counter.count_in_window = 0;
        }

        self.counter.count_in_window = self.counter.count_in_window.saturating_add(1);
        self.counter.count_in_window <= self.config.max_joins_per_second
    }
}
