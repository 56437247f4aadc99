//! Operator-facing configuration.
//!
//! Everything has a default, so an empty JSON object (or no config at
//! all) gives a working gate:
//!
//! ```json
//! {
//!   "credentials_path": "amcauth_users.json",
//!   "max_joins_per_second": 3,
//!   "pre_auth_timeout_secs": 60,
//!   "sweep_interval_ms": 1000,
//!   "holding_point": { "x": 0.0, "y": 1000.0, "z": 0.0 },
//!   "playerdata_dir": "world/playerdata",
//!   "force_migrate": ["Alice"]
//! }
//! ```

use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

use gatekeep_protocol::{IdentityKey, Position};
use gatekeep_session::{AdmissionConfig, SessionConfig};
use gatekeep_tick::TickConfig;
use serde::Deserialize;

/// Where pending players are parked while they log in.
pub const DEFAULT_HOLDING_POINT: Position = Position::new(0.0, 1000.0, 0.0);

/// Gate configuration. Deserializes from JSON with every field optional.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GatekeepConfig {
    /// Credentials file. `None` keeps credentials in memory only.
    pub credentials_path: Option<PathBuf>,

    /// Joins admitted per wall-clock second, across all identities.
    pub max_joins_per_second: u32,

    /// Seconds a new connection has to log in or register.
    pub pre_auth_timeout_secs: u64,

    /// How often the timeout sweeper runs. Clamped to 1..=5000 ms so a
    /// timed-out player is disconnected within a few seconds.
    pub sweep_interval_ms: u64,

    /// Where pending players are teleported on join, in the world they
    /// joined. `None` leaves them where they spawned.
    pub holding_point: Option<Position>,

    /// Host player-data directory. When set and no custom migrator is
    /// given, data files there are migrated on first login.
    pub playerdata_dir: Option<PathBuf>,

    /// Names whose data is migrated on every login, regardless of their
    /// `migrated` flag.
    pub force_migrate: Vec<String>,
}

impl Default for GatekeepConfig {
    fn default() -> Self {
        Self {
            credentials_path: Some(PathBuf::from("amcauth_users.json")),
            max_joins_per_second: 3,
            pre_auth_timeout_secs: 60,
            sweep_interval_ms: 1000,
            holding_point: Some(DEFAULT_HOLDING_POINT),
            playerdata_dir: None,
            force_migrate: Vec::new(),
        }
    }
}

impl GatekeepConfig {
    pub const MAX_SWEEP_INTERVAL: Duration = Duration::from_millis(5000);

    /// Defaults, but without a credentials file. Handy for tests.
    pub fn in_memory() -> Self {
        Self {
            credentials_path: None,
            ..Default::default()
        }
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            pre_auth_timeout: Duration::from_secs(self.pre_auth_timeout_secs),
        }
    }

    pub fn admission_config(&self) -> AdmissionConfig {
        AdmissionConfig {
            max_joins_per_second: self.max_joins_per_second,
        }
    }

    /// The sweeper's tick config, with the interval clamped.
    pub fn sweep_tick_config(&self) -> TickConfig {
        let interval = Duration::from_millis(self.sweep_interval_ms.max(1))
            .min(Self::MAX_SWEEP_INTERVAL);
        if interval.as_millis() as u64 != self.sweep_interval_ms {
            tracing::warn!(
                configured_ms = self.sweep_interval_ms,
                using_ms = interval.as_millis() as u64,
                "sweep interval out of range, clamping"
            );
        }
        TickConfig::every(interval)
    }

    /// Normalized `force_migrate` entries. Blank names are skipped.
    pub fn force_migrate_keys(&self) -> HashSet<IdentityKey> {
        self.force_migrate
            .iter()
            .filter_map(|name| match IdentityKey::new(name) {
                Ok(key) => Some(key),
                Err(e) => {
                    tracing::warn!(name = %name, error = %e, "ignoring force_migrate entry");
                    None
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_json_gives_defaults() {
        let cfg: GatekeepConfig = serde_json::from_str("{}").unwrap();

        assert_eq!(cfg.credentials_path, Some(PathBuf::from("amcauth_users.json")));
        assert_eq!(cfg.max_joins_per_second, 3);
        assert_eq!(cfg.pre_auth_timeout_secs, 60);
        assert_eq!(cfg.holding_point, Some(DEFAULT_HOLDING_POINT));
        assert!(cfg.force_migrate.is_empty());
    }

    #[test]
    fn test_partial_json_overrides_only_given_fields() {
        let cfg: GatekeepConfig =
            serde_json::from_str(r#"{"max_joins_per_second": 10, "holding_point": null}"#).unwrap();

        assert_eq!(cfg.max_joins_per_second, 10);
        assert_eq!(cfg.holding_point, None);
        assert_eq!(cfg.pre_auth_timeout_secs, 60);
    }

    #[test]
    fn test_session_and_admission_configs_follow_fields() {
        let cfg = GatekeepConfig {
            pre_auth_timeout_secs: 5,
            max_joins_per_second: 7,
            ..GatekeepConfig::in_memory()
        };

        assert_eq!(cfg.session_config().pre_auth_timeout, Duration::from_secs(5));
        assert_eq!(cfg.admission_config().max_joins_per_second, 7);
    }

    #[test]
    fn test_sweep_interval_is_clamped() {
        let slow = GatekeepConfig {
            sweep_interval_ms: 60_000,
            ..GatekeepConfig::in_memory()
        };
        let zero = GatekeepConfig {
            sweep_interval_ms: 0,
            ..GatekeepConfig::in_memory()
        };

        assert_eq!(slow.sweep_tick_config().period, GatekeepConfig::MAX_SWEEP_INTERVAL);
        assert!(!zero.sweep_tick_config().period.is_zero());
    }

    #[test]
    fn test_force_migrate_keys_are_normalized() {
        let cfg = GatekeepConfig {
            force_migrate: vec!["  Alice ".into(), "".into(), "BOB".into()],
            ..GatekeepConfig::in_memory()
        };

        let keys = cfg.force_migrate_keys();

        assert_eq!(keys.len(), 2);
        assert!(keys.contains(&IdentityKey::new("alice").unwrap()));
        assert!(keys.contains(&IdentityKey::new("bob").unwrap()));
    }
}
