//! Session tracking and join admission for Gatekeep.
//!
//! This crate owns the answer to "who is connected, and have they proven
//! who they are yet?":
//!
//! 1. **Admission**: [`JoinAdmissionController`] decides whether a new
//!    connection may proceed at all (global join-rate cap, name
//!    collisions).
//! 2. **Session tracking**: [`SessionRegistry`] holds exactly one
//!    [`Session`] per identity key, each either waiting for a password
//!    (with a deadline) or authenticated.
//!
//! # How it fits in the stack
//!
//! ```text
//! Gate (above)     ← asks "is this player authenticated?" on every event
//!     ↕
//! Session (this crate)  ← identity → session state, admission decisions
//!     ↕
//! Protocol / Transport (below)  ← IdentityKey, Location, ConnectionId
//! ```
//!
//! Nothing here is thread-safe on its own. The gate wraps the registry and
//! the admission controller behind one lock so that "check for a
//! duplicate, evict it, create the new session" happens as a single step.

mod admission;
mod error;
mod registry;
mod session;

pub use admission::{Admission, AdmissionConfig, JoinAdmissionController};
pub use error::SessionError;
pub use registry::SessionRegistry;
pub use session::{Arrival, Session, SessionConfig, SessionState};
