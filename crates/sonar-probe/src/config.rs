use serde::{Deserialize, Serialize};

/// Timing probe settings. Bounds are in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProbeConfig {
    /// Parameters to probe, in order: `responseWait`, `startWait`, or an input name.
    pub targets: Vec<String>,
    pub probe_lo: u64,
    pub probe_hi: u64,
    /// Search granularity. Must be positive.
    pub probe_min: u64,
    /// Times the test set is run per candidate value.
    pub repetitions: usize,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            targets: Vec::new(),
            probe_lo: 0,
            probe_hi: 1000,
            probe_min: 10,
            repetitions: 3,
        }
    }
}
