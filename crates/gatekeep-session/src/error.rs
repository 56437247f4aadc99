//! Error types for the session layer.

use gatekeep_protocol::IdentityKey;

/// Errors that can occur during session management.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// A session already exists for this identity. Callers are expected to
    /// go through [`JoinAdmissionController`](crate::JoinAdmissionController)
    /// first, which evicts or refuses before this can happen.
    #[error("session already exists for {0}")]
    AlreadyExists(IdentityKey),

    /// No session exists for the given identity.
    #[error("session not found for {0}")]
    NotFound(IdentityKey),

    /// The operation is only valid for an authenticated session.
    #[error("session for {0} is not authenticated")]
    NotAuthenticated(IdentityKey),
}
