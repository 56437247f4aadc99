//! Core value types: identity keys, positions, and profile identifiers.

use std::fmt;

use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// The case-normalized name of a connecting player.
///
/// This is the *only* lookup key for sessions and credentials. "Bob",
/// "bob" and " BOB " all map to the same key, so two connections can't
/// slip past each other by changing case.
///
/// The inner string is private: the only way to build an `IdentityKey`
/// is through [`IdentityKey::new`], which is where the normalization
/// happens. Every read and write site gets the same rule for free.
///
/// Serde goes through the same door: keys are written as plain strings
/// (that's how the credentials file keys its map) and read back through
/// `TryFrom<String>`, so a hand-edited `"Bob"` entry still lands on `bob`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IdentityKey(String);

impl IdentityKey {
    /// Normalizes a display name into an identity key.
    ///
    /// # Errors
    /// Returns [`ProtocolError::EmptyIdentity`] if the name is empty after
    /// trimming surrounding whitespace.
    pub fn new(display_name: &str) -> Result<Self, ProtocolError> {
        let trimmed = display_name.trim();
        if trimmed.is_empty() {
            return Err(ProtocolError::EmptyIdentity);
        }
        Ok(Self(trimmed.to_lowercase()))
    }

    /// Returns the normalized key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for IdentityKey {
    type Error = ProtocolError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<IdentityKey> for String {
    fn from(key: IdentityKey) -> Self {
        key.0
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The two profile identifiers a player has on the host.
///
/// A player who joined while the host verified accounts against the
/// account service has a *premium* id. The same player joining an
/// unverified host gets an *offline* id derived from their name (see
/// [`ProfileIds::offline_id`]). The gate only passes them on to the
/// migrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileIds {
    /// Identifier in the verified (premium) namespace.
    pub premium: Uuid,
    /// Identifier in the offline namespace.
    pub offline: Uuid,
}

impl ProfileIds {
    /// Pairs a premium id with the offline id derived from `display_name`.
    pub fn for_player(premium: Uuid, display_name: &str) -> Self {
        Self {
            premium,
            offline: Self::offline_id(display_name),
        }
    }

    /// The id an unverified host assigns to `display_name`: the MD5 of
    /// `"OfflinePlayer:<name>"` stamped as a version 3 uuid, with no
    /// namespace prefix.
    ///
    /// Case-sensitive, unlike [`IdentityKey`]: the host hashes the name
    /// exactly as the player typed it.
    pub fn offline_id(display_name: &str) -> Uuid {
        let digest = Md5::digest(format!("OfflinePlayer:{display_name}").as_bytes());
        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(&digest);
        uuid::Builder::from_md5_bytes(bytes).into_uuid()
    }
}

// ---------------------------------------------------------------------------
// Space
// ---------------------------------------------------------------------------

/// A point in a world, without orientation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    /// Creates a position from its three coordinates.
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// Where a player stands and which way they face.
///
/// The gate treats locations as opaque except for one question: did the
/// player change *position*? Turning the camera (yaw/pitch) is not
/// movement, so [`Location::same_position`] ignores orientation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Name of the world the player is in.
    pub world: String,
    pub position: Position,
    pub yaw: f32,
    pub pitch: f32,
}

impl Location {
    /// Creates a location facing yaw 0, pitch 0.
    pub fn new(world: impl Into<String>, position: Position) -> Self {
        Self {
            world: world.into(),
            position,
            yaw: 0.0,
            pitch: 0.0,
        }
    }

    /// Returns `true` if both locations share world and coordinates.
    pub fn same_position(&self, other: &Location) -> bool {
        self.world == other.world && self.position == other.position
    }

    /// The same world as `self`, moved to `position` with the same facing.
    pub fn relocated(&self, position: Position) -> Location {
        Location {
            position,
            ..self.clone()
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}@({:.1}, {:.1}, {:.1})",
            self.world, self.position.x, self.position.y, self.position.z
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offline_id_matches_host_derivation() {
        let id = ProfileIds::offline_id("Notch");
        assert_eq!(id.to_string(), "b50ad385-829d-3141-a216-7e7d7539ba7f");
        assert_eq!(id.get_version_num(), 3);
    }

    #[test]
    fn test_offline_id_is_case_sensitive() {
        assert_ne!(ProfileIds::offline_id("Notch"), ProfileIds::offline_id("notch"));
    }

    #[test]
    fn test_for_player_keeps_premium_and_derives_offline() {
        let premium = Uuid::new_v4();
        let ids = ProfileIds::for_player(premium, "Alice");
        assert_eq!(ids.premium, premium);
        assert_eq!(ids.offline, ProfileIds::offline_id("Alice"));
    }

    #[test]
    fn test_identity_key_normalizes_case_and_whitespace() {
        let a = IdentityKey::new("Alice").unwrap();
        let b = IdentityKey::new("  aLiCe ").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "alice");
    }

    #[test]
    fn test_identity_key_rejects_empty() {
        assert!(matches!(
            IdentityKey::new("   "),
            Err(ProtocolError::EmptyIdentity)
        ));
    }

    #[test]
    fn test_identity_key_serializes_as_plain_string() {
        let key = IdentityKey::new("Bob").unwrap();
        assert_eq!(serde_json::to_string(&key).unwrap(), "\"bob\"");
    }

    #[test]
    fn test_identity_key_deserialize_normalizes() {
        let key: IdentityKey = serde_json::from_str("\" Bob\"").unwrap();
        assert_eq!(key.as_str(), "bob");
        assert!(serde_json::from_str::<IdentityKey>("\"\"").is_err());
    }

    #[test]
    fn test_same_position_ignores_orientation() {
        let a = Location::new("world", Position::new(1.0, 64.0, -3.5));
        let mut b = a.clone();
        b.yaw = 90.0;
        b.pitch = -45.0;
        assert!(a.same_position(&b));
    }

    #[test]
    fn test_same_position_detects_coordinate_change() {
        let a = Location::new("world", Position::new(1.0, 64.0, -3.5));
        let b = a.relocated(Position::new(1.0, 64.1, -3.5));
        assert!(!a.same_position(&b));
    }

    #[test]
    fn test_same_position_detects_world_change() {
        let a = Location::new("world", Position::default());
        let b = Location::new("world_nether", Position::default());
        assert!(!a.same_position(&b));
    }
}
