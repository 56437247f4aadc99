//! Player-data migration between profile namespaces.
//!
//! A player's saved data lives in `<playerdata>/<profile-id>.dat`. When a
//! host stops verifying accounts, the same player gets a different
//! (offline) profile id and would start from scratch. Migration copies
//! the premium file to the offline name so their data follows them.
//!
//! The gate decides *when* to migrate (after authentication, once per
//! identity); implementations of [`PlayerDataMigrator`] decide *how*.

use std::path::{Path, PathBuf};

use gatekeep_protocol::ProfileIds;
use uuid::Uuid;

use crate::MigrationError;
use crate::atomic::write_atomically;

/// What a migration run did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationOutcome {
    /// The premium data was copied to the offline id.
    Copied,
    /// There was no premium data to copy. Still counts as done.
    NothingToCopy,
}

/// Copies a player's data from their premium id to their offline id.
///
/// Called by the gate after a successful login or registration, on
/// Tokio's blocking pool, so implementations may do plain file IO.
pub trait PlayerDataMigrator: Send + Sync + 'static {
    /// Migrates the data for one player.
    ///
    /// Must be safe to run more than once for the same ids (operators
    /// can force re-runs).
    fn migrate(&self, ids: &ProfileIds) -> Result<MigrationOutcome, MigrationError>;
}

/// Migrator for hosts that store player data as `<uuid>.dat` files in one
/// directory.
#[derive(Debug, Clone)]
pub struct FileMigrator {
    playerdata_dir: PathBuf,
}

impl FileMigrator {
    /// A migrator working inside `playerdata_dir`.
    pub fn new(playerdata_dir: impl Into<PathBuf>) -> Self {
        Self {
            playerdata_dir: playerdata_dir.into(),
        }
    }

    /// The data file for a profile id.
    pub fn data_file(&self, id: &Uuid) -> PathBuf {
        self.playerdata_dir.join(format!("{id}.dat"))
    }

    fn io_error(path: &Path, source: std::io::Error) -> MigrationError {
        MigrationError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

impl PlayerDataMigrator for FileMigrator {
    fn migrate(&self, ids: &ProfileIds) -> Result<MigrationOutcome, MigrationError> {
        std::fs::create_dir_all(&self.playerdata_dir)
            .map_err(|e| Self::io_error(&self.playerdata_dir, e))?;

        let premium = self.data_file(&ids.premium);
        let offline = self.data_file(&ids.offline);

        if !premium.exists() {
            tracing::info!(premium = %ids.premium, "no premium data to migrate");
            return Ok(MigrationOutcome::NothingToCopy);
        }

        let bytes = std::fs::read(&premium).map_err(|e| Self::io_error(&premium, e))?;
        write_atomically(&offline, &bytes).map_err(|e| Self::io_error(&offline, e))?;

        tracing::info!(
            premium = %ids.premium,
            offline = %ids.offline,
            bytes = bytes.len(),
            "migrated player data to offline profile"
        );
        Ok(MigrationOutcome::Copied)
    }
}
