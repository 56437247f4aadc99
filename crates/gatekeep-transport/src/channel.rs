//! A [`PlayerLink`] that forwards every instruction over a Tokio channel.

use gatekeep_protocol::{Location, Notice};
use tokio::sync::mpsc;

use crate::{ConnectionId, PlayerLink, TransportError};

/// One instruction the gate asked the host to carry out.
#[derive(Debug, Clone, PartialEq)]
pub enum LinkAction {
    Terminate { conn: ConnectionId, reason: Notice },
    Teleport { conn: ConnectionId, location: Location },
    LockMovement(ConnectionId),
    UnlockMovement(ConnectionId),
    Notify { conn: ConnectionId, notice: Notice },
}

impl LinkAction {
    /// The connection this action targets.
    pub fn conn(&self) -> ConnectionId {
        match self {
            Self::Terminate { conn, .. }
            | Self::Teleport { conn, .. }
            | Self::Notify { conn, .. } => *conn,
            Self::LockMovement(conn) | Self::UnlockMovement(conn) => *conn,
        }
    }
}

/// Bounded-channel link: the host drains the paired receiver.
///
/// Sends await channel capacity, so a host that stops draining applies
/// backpressure to the gate rather than growing memory without bound.
#[derive(Debug, Clone)]
pub struct ChannelLink {
    tx: mpsc::Sender<LinkAction>,
}

impl ChannelLink {
    /// Creates a link and the receiver the host reads actions from.
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<LinkAction>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }

    async fn push(&self, action: LinkAction) -> Result<(), TransportError> {
        tracing::trace!(conn = %action.conn(), ?action, "link action");
        self.tx
            .send(action)
            .await
            .map_err(|e| TransportError::Closed(e.to_string()))
    }
}

impl PlayerLink for ChannelLink {
    async fn terminate(
        &self,
        conn: ConnectionId,
        reason: Notice,
    ) -> Result<(), TransportError> {
        self.push(LinkAction::Terminate { conn, reason }).await
    }

    async fn teleport(
        &self,
        conn: ConnectionId,
        location: Location,
    ) -> Result<(), TransportError> {
        self.push(LinkAction::Teleport { conn, location }).await
    }

    async fn apply_movement_lock(
        &self,
        conn: ConnectionId,
    ) -> Result<(), TransportError> {
        self.push(LinkAction::LockMovement(conn)).await
    }

    async fn clear_movement_lock(
        &self,
        conn: ConnectionId,
    ) -> Result<(), TransportError> {
        self.push(LinkAction::UnlockMovement(conn)).await
    }

    async fn send_notice(
        &self,
        conn: ConnectionId,
        notice: Notice,
    ) -> Result<(), TransportError> {
        self.push(LinkAction::Notify { conn, notice }).await
    }
}
