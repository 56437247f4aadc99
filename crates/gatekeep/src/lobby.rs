//! Admission and sessions under one lock.

use std::time::SystemTime;

use gatekeep_protocol::IdentityKey;
use gatekeep_session::{Admission, Arrival, JoinAdmissionController, SessionError, SessionRegistry};

use crate::GatekeepConfig;

/// The join controller and the session registry it guards.
///
/// They share a lock so that "check for an existing session, evict it,
/// create the new one" is a single step: two joins racing for the same
/// identity can never both end up with a session.
pub(crate) struct Lobby {
    pub(crate) admission: JoinAdmissionController,
    pub(crate) sessions: SessionRegistry,
}

impl Lobby {
    pub(crate) fn new(config: &GatekeepConfig) -> Self {
        Self {
            admission: JoinAdmissionController::new(config.admission_config()),
            sessions: SessionRegistry::new(config.session_config()),
        }
    }

    /// Runs admission and, if admitted, creates the pending session.
    pub(crate) fn admit(
        &mut self,
        identity: IdentityKey,
        now: SystemTime,
        arrival: Arrival,
    ) -> Result<Admission, SessionError> {
        let outcome = self.admission.try_admit(&mut self.sessions, &identity, now);
        if outcome.is_admitted() {
            self.sessions.create(identity, now, arrival)?;
        }
        Ok(outcome)
    }
}
