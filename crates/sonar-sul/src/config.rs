//! SUT configuration: process launch, adapter, timing, and budgets.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use sonar_mapper::{MapperConfig, ResponseTiming};

/// When the SUT process is (re)started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessTrigger {
    /// Launch before every query, terminate after it.
    NewTest,
    /// Launch once, before the first query; terminated during cleanup.
    Start,
}

/// Configuration of the SUT and the wrapper chain around it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SulConfig {
    /// Command launching the SUT process. None = the SUT is already running.
    pub command: Option<String>,
    /// Command run before killing the SUT process.
    pub terminate_command: Option<String>,
    /// Working directory of the SUT process.
    pub process_dir: Option<PathBuf>,
    /// Directory receiving the process's stdout/stderr. None = discarded.
    pub redirect_output_dir: Option<PathBuf>,
    pub process_trigger: ProcessTrigger,
    /// Wait after launching the SUT before the first input (ms).
    pub start_wait_ms: u64,
    /// Default wait for a response to an input (ms).
    pub response_wait_ms: u64,
    /// Per-input response waits, replacing `response_wait_ms` for that input (ms).
    pub input_response_timeout: BTreeMap<String, u64>,
    /// Host of the launcher service.
    pub adapter_address: String,
    /// Port of the launcher service. When set, the SUT is started remotely.
    pub adapter_port: Option<u16>,
    /// Wall-clock budget for the whole run (ms).
    pub time_limit_ms: Option<u64>,
    /// Maximum number of tests (resets) for the whole run.
    pub test_limit: Option<u64>,
    pub mapper: MapperConfig,
}

impl Default for SulConfig {
    fn default() -> Self {
        Self {
            command: None,
            terminate_command: None,
            process_dir: None,
            redirect_output_dir: None,
            process_trigger: ProcessTrigger::NewTest,
            start_wait_ms: 0,
            response_wait_ms: 100,
            input_response_timeout: BTreeMap::new(),
            adapter_address: "localhost".to_string(),
            adapter_port: None,
            time_limit_ms: None,
            test_limit: None,
            mapper: MapperConfig::default(),
        }
    }
}

impl SulConfig {
    pub fn start_wait(&self) -> Duration {
        Duration::from_millis(self.start_wait_ms)
    }

    pub fn response_wait(&self) -> Duration {
        Duration::from_millis(self.response_wait_ms)
    }

    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit_ms.map(Duration::from_millis)
    }

    /// Response waits for the mapper.
    pub fn response_timing(&self) -> ResponseTiming {
        self.input_response_timeout.iter().fold(
            ResponseTiming::new(self.response_wait()),
            |timing, (input, &ms)| timing.with_input_wait(input.clone(), Duration::from_millis(ms)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sonar_types::InputSymbol;

    #[test]
    fn test_default_config() {
        let config = SulConfig::default();
        assert_eq!(config.response_wait_ms, 100);
        assert_eq!(config.process_trigger, ProcessTrigger::NewTest);
        assert!(config.command.is_none());
        assert!(config.adapter_port.is_none());
    }

    #[test]
    fn test_response_timing_uses_overrides() {
        let mut config = SulConfig {
            response_wait_ms: 40,
            ..Default::default()
        };
        config.input_response_timeout.insert("FINISHED".to_string(), 250);

        let timing = config.response_timing();
        assert_eq!(
            timing.wait_for(&InputSymbol::new("FINISHED")),
            Duration::from_millis(250)
        );
        assert_eq!(
            timing.wait_for(&InputSymbol::new("HELLO")),
            Duration::from_millis(40)
        );
    }
}
