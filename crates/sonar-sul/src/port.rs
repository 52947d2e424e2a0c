use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use sonar_types::LivenessTracker;

/// Source of the port the SUT listens on, known only after it was launched.
pub trait DynamicPortProvider {
    fn dynamic_port(&self) -> Option<u16>;
}

const NO_PORT: u32 = u32::MAX;

/// Port cell written by the launcher adapter and read by the raw SUT.
#[derive(Debug, Clone)]
pub struct SharedPort {
    port: Arc<AtomicU32>,
}

impl SharedPort {
    pub fn new() -> Self {
        Self {
            port: Arc::new(AtomicU32::new(NO_PORT)),
        }
    }

    pub fn set(&self, port: Option<u16>) {
        let raw = port.map(u32::from).unwrap_or(NO_PORT);
        self.port.store(raw, Ordering::SeqCst);
    }
}

impl Default for SharedPort {
    fn default() -> Self {
        Self::new()
    }
}

impl DynamicPortProvider for SharedPort {
    fn dynamic_port(&self) -> Option<u16> {
        u16::try_from(self.port.load(Ordering::SeqCst)).ok()
    }
}

/// Handles shared between the wrapper chain and the innermost SUT.
#[derive(Debug, Clone, Default)]
pub struct SulHandles {
    pub port: SharedPort,
    pub liveness: LivenessTracker,
}
