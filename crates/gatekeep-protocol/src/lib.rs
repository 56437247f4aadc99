//! Shared vocabulary for Gatekeep.
//!
//! This crate defines the values every other layer talks in:
//!
//! - **Identity** ([`IdentityKey`], [`ProfileIds`]): who a connection
//!   claims to be, normalized once so every lookup agrees.
//! - **Space** ([`Location`], [`Position`]): where a player stands. The
//!   gate never interprets these beyond "did the player move?".
//! - **Commands** ([`Command`]): the raw text a player types, parsed
//!   into the handful of commands the gate cares about.
//! - **Notices** ([`Notice`]): every message the gate can send back to a
//!   player.
//!
//! # Architecture
//!
//! ```text
//! Transport (connections) → Protocol (identity, commands) → Session → Store
//! ```

mod command;
mod error;
mod notice;
mod types;

pub use command::Command;
pub use error::ProtocolError;
pub use notice::Notice;
pub use types::{IdentityKey, Location, Position, ProfileIds};
