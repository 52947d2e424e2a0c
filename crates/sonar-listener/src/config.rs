use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Where the command listener binds and how long it waits for clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ListenerConfig {
    pub address: String,
    pub port: u16,
    /// Give up waiting for a client after this long (ms). None = wait forever.
    pub accept_timeout_ms: Option<u64>,
    /// Accept a new client after each connection ends instead of terminating.
    pub continuous: bool,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            address: "localhost".to_string(),
            port: 5000,
            accept_timeout_ms: None,
            continuous: false,
        }
    }
}

impl ListenerConfig {
    pub fn accept_timeout(&self) -> Option<Duration> {
        self.accept_timeout_ms.map(Duration::from_millis)
    }
}
