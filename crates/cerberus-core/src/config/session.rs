//! Session orchestration configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Deadlines and concurrency policy for session operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Default per-request deadline for backend calls, in milliseconds.
    #[serde(default = "default_store_timeout")]
    pub store_timeout_ms: u64,
    /// Deadline for the compensating delete after a failed refresh write.
    #[serde(default = "default_compensation_timeout")]
    pub compensation_timeout_ms: u64,
    /// Serialize login, refresh, and logout per user id.
    #[serde(default = "default_true")]
    pub serialize_per_user: bool,
}

impl SessionConfig {
    /// Default per-request deadline.
    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    /// Compensation deadline.
    pub fn compensation_timeout(&self) -> Duration {
        Duration::from_millis(self.compensation_timeout_ms)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            store_timeout_ms: default_store_timeout(),
            compensation_timeout_ms: default_compensation_timeout(),
            serialize_per_user: true,
        }
    }
}

fn default_store_timeout() -> u64 {
    2000
}

fn default_compensation_timeout() -> u64 {
    500
}

fn default_true() -> bool {
    true
}
