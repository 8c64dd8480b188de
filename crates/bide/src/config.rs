// Waiting defaults, injected as plain values

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Waiting defaults for a session.
///
/// bide performs no config-file parsing itself; embedders construct a
/// `Config` directly or deserialize it as part of their own configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// How long `should_*` assertions keep retrying before failing.
    #[serde(default = "default_timeout")]
    pub timeout: Duration,

    /// Pause between retry attempts.
    #[serde(default = "default_poll_interval")]
    pub poll_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timeout: crate::DEFAULT_TIMEOUT,
            poll_interval: crate::DEFAULT_POLL_INTERVAL,
        }
    }
}

fn default_timeout() -> Duration {
    crate::DEFAULT_TIMEOUT
}

fn default_poll_interval() -> Duration {
    crate::DEFAULT_POLL_INTERVAL
}
