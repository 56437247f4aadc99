//! Connection control abstraction for Gatekeep.
//!
//! Gatekeep does not own any sockets. The host (game server, proxy,
//! test harness) owns the connections and tells the gate what happens on
//! them; the gate answers by asking the host to do things through the
//! [`PlayerLink`] trait:
//!
//! - kick a connection ([`PlayerLink::terminate`])
//! - move a player ([`PlayerLink::teleport`])
//! - freeze / unfreeze self-propelled movement
//! - show a message
//!
//! [`ChannelLink`] is a ready-made implementation that turns every call
//! into a [`LinkAction`] on a Tokio channel, for hosts that prefer to
//! drain a queue (and for tests).

mod channel;
mod error;

pub use channel::{ChannelLink, LinkAction};
pub use error::TransportError;

use std::fmt;
use std::future::Future;

use gatekeep_protocol::{Location, Notice};

/// Opaque identifier for a connection, assigned by the host.
///
/// Two connections may claim the same identity at once (that's the
/// collision the admission controller resolves), so the identity key
/// alone can't address "that specific socket". This can.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a new `ConnectionId` from a raw `u64`.
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Outbound instructions from the gate to the host.
///
/// # Trait bounds
///
/// - `Send + Sync + 'static` → one link is shared by every handler and by
///   the background sweeper task.
/// - Each method returns `impl Future + Send` rather than being an
///   `async fn`, so the futures can be awaited inside `tokio::spawn`ed
///   tasks (plain `async fn` in traits doesn't promise `Send`).
///
/// Implementations should make every call cheap and non-blocking; the
/// gate never holds a lock while awaiting them.
pub trait PlayerLink: Send + Sync + 'static {
    /// Disconnects the connection, showing `reason`. Terminating a
    /// connection must eventually produce a disconnect notification for
    /// it, which is what cleans up its session.
    fn terminate(
        &self,
        conn: ConnectionId,
        reason: Notice,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Moves the player to `location`.
    fn teleport(
        &self,
        conn: ConnectionId,
        location: Location,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Prevents self-propelled movement (and damage knock-back).
    fn apply_movement_lock(
        &self,
        conn: ConnectionId,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Lifts the effect of [`apply_movement_lock`](Self::apply_movement_lock).
    fn clear_movement_lock(
        &self,
        conn: ConnectionId,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Shows a message to the player.
    fn send_notice(
        &self,
        conn: ConnectionId,
        notice: Notice,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;
}
