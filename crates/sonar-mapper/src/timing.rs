use std::collections::BTreeMap;
use std::time::Duration;

use sonar_types::InputSymbol;

/// How long the receive path waits for a response to each input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseTiming {
    response_wait: Duration,
    /// Per-input overrides, keyed by input name. An override replaces the default.
    input_waits: BTreeMap<String, Duration>,
}

impl ResponseTiming {
    pub fn new(response_wait: Duration) -> Self {
        Self {
            response_wait,
            input_waits: BTreeMap::new(),
        }
    }

    pub fn with_input_wait(mut self, input: impl Into<String>, wait: Duration) -> Self {
        self.input_waits.insert(input.into(), wait);
        self
    }

    pub fn response_wait(&self) -> Duration {
        self.response_wait
    }

    pub fn wait_for(&self, input: &InputSymbol) -> Duration {
        self.input_waits
            .get(input.name())
            .copied()
            .unwrap_or(self.response_wait)
    }
}

impl Default for ResponseTiming {
    fn default() -> Self {
        Self::new(Duration::from_millis(100))
    }
}
