//! The credential store: identity → credential, persisted as one JSON map.
//!
//! ```text
//! {
//!   "alice": { "name": "Alice", "password": "...", "migrated": true },
//!   "bob":   { "name": "bob",   "password": "...", "migrated": false }
//! }
//! ```
//!
//! There's no log and no batching: each change is followed by a full
//! rewrite of the file ([`CredentialStore::save`]). The map is small
//! (one entry per player who ever registered) and writes are rare.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use gatekeep_protocol::IdentityKey;

use crate::atomic::write_atomically;
use crate::{CredentialRecord, StoreError};

/// Durable identity → credential map.
///
/// `CredentialStore` is a plain owned value with `&mut self` mutators,
/// like the session registry; the gate puts it behind its own lock.
/// Saves made while holding that lock are therefore strictly ordered and
/// the last writer wins.
///
/// Mutators only change memory and mark the store dirty. Call
/// [`save`](Self::save) to persist. A failed save leaves the store dirty,
/// so [`flush`](Self::flush) can retry later.
#[derive(Debug)]
pub struct CredentialStore {
    /// `BTreeMap` keeps the file's key order stable between saves, which
    /// makes diffs of the file readable.
    records: BTreeMap<IdentityKey, CredentialRecord>,
    path: Option<PathBuf>,
    dirty: bool,
}

impl CredentialStore {
    /// An empty store with no backing file. `save` is a no-op.
    pub fn in_memory() -> Self {
        Self {
            records: BTreeMap::new(),
            path: None,
            dirty: false,
        }
    }

    /// Opens the store backed by `path` and loads it.
    ///
    /// A missing or blank file is an empty store; the file is created on
    /// the first save.
    ///
    /// # Errors
    /// [`StoreError::Read`], [`StoreError::Malformed`],
    /// [`StoreError::DuplicateIdentity`] or [`StoreError::BlankIdentity`].
    /// All of them are meant to stop startup.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let mut store = Self {
            records: BTreeMap::new(),
            path: Some(path.into()),
            dirty: false,
        };
        store.load()?;
        Ok(store)
    }

    /// Replaces the in-memory map with the file's contents.
    ///
    /// On error the in-memory map is left untouched.
    ///
    /// # Errors
    /// [`StoreError::UnsavedChanges`] while the store is dirty: memory
    /// stays authoritative until a save succeeds. Otherwise the same
    /// errors as [`open`](Self::open).
    pub fn load(&mut self) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if self.dirty {
            return Err(StoreError::UnsavedChanges);
        }

        let records = read_records(path)?;
        tracing::info!(
            path = %path.display(),
            count = records.len(),
            "credentials loaded"
        );
        self.records = records;
        self.dirty = false;
        Ok(())
    }

    /// Serializes the whole map and atomically replaces the backing file.
    ///
    /// # Errors
    /// [`StoreError::Serialize`] or [`StoreError::Write`]. Either way the
    /// in-memory map is kept and the store stays dirty.
    pub fn save(&mut self) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            self.dirty = false;
            return Ok(());
        };

        let result = serde_json::to_vec_pretty(&self.records)
            .map_err(StoreError::Serialize)
            .and_then(|json| {
                write_atomically(path, &json).map_err(|source| StoreError::Write {
                    path: path.clone(),
                    source,
                })
            });

        match &result {
            Ok(()) => {
                self.dirty = false;
                tracing::debug!(path = %path.display(), count = self.records.len(), "credentials saved");
            }
            Err(e) => {
                self.dirty = true;
                tracing::error!(
                    error = %e,
                    "credentials NOT persisted; in-memory changes kept until a save succeeds"
                );
            }
        }
        result
    }

    /// Saves only if there are unsaved changes.
    pub fn flush(&mut self) -> Result<(), StoreError> {
        if self.dirty { self.save() } else { Ok(()) }
    }

    /// Looks up a credential.
    pub fn get(&self, identity: &IdentityKey) -> Option<&CredentialRecord> {
        self.records.get(identity)
    }

    /// Returns `true` if the identity has registered.
    pub fn contains(&self, identity: &IdentityKey) -> bool {
        self.records.contains_key(identity)
    }

    /// Inserts or replaces a credential. Not persisted until `save`.
    pub fn put(&mut self, identity: IdentityKey, record: CredentialRecord) {
        self.records.insert(identity, record);
        self.dirty = true;
    }

    /// Replaces the secret of an existing record, keeping its display name
    /// and migration flag. Returns `false` if there is no record.
    pub fn set_secret(&mut self, identity: &IdentityKey, secret: &str) -> bool {
        let Some(record) = self.records.get_mut(identity) else {
            return false;
        };
        record.secret = secret.to_string();
        self.dirty = true;
        true
    }

    /// Marks the identity's data as migrated. Returns `false` if there is
    /// no record. Setting an already-set flag doesn't dirty the store.
    pub fn mark_migrated(&mut self, identity: &IdentityKey) -> bool {
        let Some(record) = self.records.get_mut(identity) else {
            return false;
        };
        if !record.migrated {
            record.migrated = true;
            self.dirty = true;
        }
        true
    }

    /// Operator override: clears the migration flag so the next login
    /// migrates again. This is the only way the flag goes back to
    /// `false`. Returns `false` if there is no record.
    pub fn reset_migrated(&mut self, identity: &IdentityKey) -> bool {
        let Some(record) = self.records.get_mut(identity) else {
            return false;
        };
        if record.migrated {
            record.migrated = false;
            self.dirty = true;
            tracing::warn!(%identity, "migration flag reset by operator");
        }
        true
    }

    /// Returns `true` if there are changes not yet on disk.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// The backing file, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Number of registered identities.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if nobody has registered.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Reads and parses the backing file. Missing, blank, or `null` content
/// is an empty map.
///
/// Keys are normalized one by one so that two spellings of the same
/// identity are an error instead of a silent overwrite.
fn read_records(
    path: &Path,
) -> Result<BTreeMap<IdentityKey, CredentialRecord>, StoreError> {
    let json = match std::fs::read_to_string(path) {
        Ok(json) => json,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(BTreeMap::new()),
        Err(source) => {
            return Err(StoreError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    if json.trim().is_empty() {
        return Ok(BTreeMap::new());
    }

    let parsed: Option<BTreeMap<String, CredentialRecord>> =
        serde_json::from_str(&json).map_err(|source| StoreError::Malformed {
            path: path.to_path_buf(),
            source,
        })?;

    let mut records = BTreeMap::new();
    for (raw, record) in parsed.unwrap_or_default() {
        let key = IdentityKey::new(&raw).map_err(|_| StoreError::BlankIdentity {
            path: path.to_path_buf(),
        })?;
        if records.contains_key(&key) {
            return Err(StoreError::DuplicateIdentity {
                path: path.to_path_buf(),
                key,
            });
        }
        records.insert(key, record);
    }
    Ok(records)
}
