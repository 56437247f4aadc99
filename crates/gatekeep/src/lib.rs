//! # Gatekeep
//!
//! Password login for hosts that can't verify who their players are.
//!
//! Every connecting player gets a *pending* session: parked, frozen, and
//! unable to do anything but `/register` or `/login`. Once they prove
//! their identity the session is *authenticated* and the gate steps out
//! of the way. Players who don't log in within the timeout are
//! disconnected.
//!
//! The host implements [`PlayerLink`] (how to disconnect, teleport,
//! freeze and message a player) and forwards its events to the
//! `on_*` methods of a [`Gatekeeper`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use gatekeep::prelude::*;
//!
//! # async fn run() -> Result<(), GateError> {
//! let (link, _actions) = ChannelLink::new(64);
//! let gate = GatekeeperBuilder::new()
//!     .config(GatekeepConfig::default())
//!     .build(link)?;
//! let sweeper = gate.spawn_sweeper();
//!
//! // Forward host events:
//! // gate.on_connect("Alice", SystemTime::now(), Arrival::new(conn)).await?;
//! // gate.on_command_invoke("Alice", conn, "login", args).await?;
//!
//! sweeper.shutdown().await;
//! # Ok(())
//! # }
//! ```

mod commands;
mod config;
mod error;
mod gate;
mod lobby;
mod server;
mod sweeper;
pub mod telemetry;

pub use config::{DEFAULT_HOLDING_POINT, GatekeepConfig};
pub use error::{CommandError, GateError};
pub use gate::{AuthGate, Verdict};
pub use server::{Gatekeeper, GatekeeperBuilder, JoinOutcome};
pub use sweeper::SweeperHandle;

pub use gatekeep_protocol::{Command, IdentityKey, Location, Notice, Position, ProfileIds};
pub use gatekeep_session::Arrival;
pub use gatekeep_store::{FileMigrator, MigrationError, MigrationOutcome, PlayerDataMigrator};
pub use gatekeep_transport::{ChannelLink, ConnectionId, LinkAction, PlayerLink, TransportError};

/// Everything a host integration usually needs.
pub mod prelude {
    pub use std::time::SystemTime;

    pub use crate::{
        Arrival, ChannelLink, ConnectionId, GateError, GatekeepConfig, Gatekeeper,
        GatekeeperBuilder, JoinOutcome, Location, Notice, PlayerLink, Position, ProfileIds,
        Verdict,
    };
}
