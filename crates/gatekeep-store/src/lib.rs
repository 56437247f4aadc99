//! Credential persistence and player-data migration for Gatekeep.
//!
//! - [`CredentialStore`]: the durable identity → [`CredentialRecord`] map.
//!   Loaded once at startup, rewritten in full on every change.
//! - [`PlayerDataMigrator`]: the one-time copy of a player's data file
//!   from the premium namespace to the offline namespace, with
//!   [`FileMigrator`] as the filesystem implementation.
//!
//! Both write files the same way: into a temporary sibling first, then
//! renamed over the target, so a reader (or a crash) never sees half a
//! file.

mod atomic;
mod error;
mod migrate;
mod record;
mod store;

pub use error::{MigrationError, StoreError};
pub use migrate::{FileMigrator, MigrationOutcome, PlayerDataMigrator};
pub use record::CredentialRecord;
pub use store::CredentialStore;
