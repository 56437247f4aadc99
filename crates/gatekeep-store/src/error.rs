//! Error types for the store layer.

use std::path::PathBuf;

use gatekeep_protocol::IdentityKey;

/// Errors from loading or saving the credential store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backing file exists but couldn't be read.
    #[error("failed to read credentials from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The backing file was read but isn't a valid credentials map.
    ///
    /// Fatal at startup: silently starting empty would let anyone
    /// re-register every existing name.
    #[error("malformed credentials file {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Two keys in the backing file normalize to the same identity
    /// (`"Bob"` and `"bob"`). Picking one would drop the other's secret.
    #[error("credentials file {path} has more than one entry for identity {key}")]
    DuplicateIdentity { path: PathBuf, key: IdentityKey },

    /// A key in the backing file is blank after trimming.
    #[error("credentials file {path} has an entry with a blank identity")]
    BlankIdentity { path: PathBuf },

    /// `load` was called while changes that never reached the disk are
    /// still in memory. Reloading would throw them away.
    #[error("refusing to reload credentials: unsaved changes in memory")]
    UnsavedChanges,

    /// The in-memory map couldn't be serialized.
    #[error("failed to serialize credentials: {0}")]
    Serialize(#[source] serde_json::Error),

    /// Writing or replacing the backing file failed. The in-memory state
    /// is unchanged and the store stays dirty until a save succeeds.
    #[error("failed to write credentials to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors from migrating a player's data file.
#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    /// A filesystem operation on `path` failed.
    #[error("player data migration failed at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
