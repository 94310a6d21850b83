//! `[coordinator]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [coordinator]
//! port = 0                  # 0 = ephemeral port chosen by the OS
//! workers = 8               # Request handler threads
//! idle_grace_ms = 300       # Quiet period before the registry counts as idle
//! max_wait_ms = 30000       # Ceiling for `waitForIdle`
//! connect_timeout_ms = 500  # Client-side connect timeout
//! ```
//!
//! The coordinator always binds the loopback interface.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::{ConfigDiagnostics, FieldPath};

/// Coordinator server and client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    /// TCP port; `0` lets the OS pick one.
    pub port: u16,

    /// Number of request handler threads.
    pub workers: usize,

    /// Quiet period after the last extraction before `waitForIdle` resolves.
    pub idle_grace_ms: u64,

    /// Upper bound on a single `waitForIdle`.
    pub max_wait_ms: u64,

    /// How long a client waits to connect before falling back.
    pub connect_timeout_ms: u64,
}

impl CoordinatorConfig {
    pub const WORKERS: FieldPath = FieldPath::new("coordinator.workers");
    pub const MAX_WAIT_MS: FieldPath = FieldPath::new("coordinator.max_wait_ms");

    pub const fn idle_grace(&self) -> Duration {
        Duration::from_millis(self.idle_grace_ms)
    }

    pub const fn max_wait(&self) -> Duration {
        Duration::from_millis(self.max_wait_ms)
    }

    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.workers == 0 {
            diag.error(Self::WORKERS, "must be at least 1");
        }
        if self.max_wait_ms < self.idle_grace_ms {
            diag.error_with_hint(
                Self::MAX_WAIT_MS,
                format!(
                    "{} is shorter than idle_grace_ms ({})",
                    self.max_wait_ms, self.idle_grace_ms
                ),
                "the ceiling must leave room for at least one grace window",
            );
        }
    }
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            port: 0,
            workers: 8,
            idle_grace_ms: 300,
            max_wait_ms: 30_000,
            connect_timeout_ms: 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crate::config::{ConfigDiagnostics, test_parse_config};

    #[test]
    fn test_coordinator_config_defaults() {
        let config = test_parse_config("");

        assert_eq!(config.coordinator.port, 0);
        assert_eq!(config.coordinator.workers, 8);
        assert_eq!(config.coordinator.max_wait(), Duration::from_secs(30));
        assert_eq!(config.coordinator.idle_grace(), Duration::from_millis(300));
    }

    #[test]
    fn test_coordinator_config_partial_override() {
        let config = test_parse_config("[coordinator]\nworkers = 2");

        assert_eq!(config.coordinator.workers, 2);
        assert_eq!(config.coordinator.max_wait_ms, 30_000);
    }

    #[test]
    fn test_coordinator_config_validation() {
        let config =
            test_parse_config("[coordinator]\nworkers = 0\nidle_grace_ms = 500\nmax_wait_ms = 100");
        let mut diag = ConfigDiagnostics::new();
        config.coordinator.validate(&mut diag);
        assert_eq!(diag.len(), 2);
    }
}
