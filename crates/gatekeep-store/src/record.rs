use std::fmt;

use serde::{Deserialize, Serialize};

/// One identity's stored credential.
///
/// Field names on disk (`name`, `password`, `migrated`) match the
/// credentials files already in use, so existing files load unchanged.
///
/// The secret is kept in clear text. Anyone who can read the file can
/// read every password; treat the file like a secret itself.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialRecord {
    /// The name as the player typed it, for messages.
    #[serde(rename = "name")]
    pub display_name: String,

    #[serde(rename = "password")]
    pub secret: String,

    /// Set once the player's data file has been copied to the offline
    /// namespace. Older files don't have the field; absent means `false`.
    #[serde(default)]
    pub migrated: bool,
}

impl CredentialRecord {
    /// A fresh, not-yet-migrated record.
    pub fn new(display_name: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            secret: secret.into(),
            migrated: false,
        }
    }

    /// Exact comparison against the stored secret.
    pub fn verify(&self, attempt: &str) -> bool {
        self.secret == attempt
    }
}

// Hand-written so secrets never end up in logs via `{:?}`.
impl fmt::Debug for CredentialRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialRecord")
            .field("display_name", &self.display_name)
            .field("secret", &"<redacted>")
            .field("migrated", &self.migrated)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verify_requires_exact_match() {
        let record = CredentialRecord::new("Carol", "pw1");
        assert!(record.verify("pw1"));
        assert!(!record.verify("PW1"));
        assert!(!record.verify("pw1 "));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let record = CredentialRecord::new("Carol", "hunter2");
        let printed = format!("{record:?}");
        assert!(!printed.contains("hunter2"));
        assert!(printed.contains("Carol"));
    }

    #[test]
    fn test_legacy_entry_without_migrated_defaults_false() {
        let record: CredentialRecord =
            serde_json::from_str(r#"{"name":"Dave","password":"x"}"#).unwrap();
        assert_eq!(record.display_name, "Dave");
        assert!(!record.migrated);
    }
}
