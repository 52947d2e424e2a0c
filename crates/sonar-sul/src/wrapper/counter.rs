use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sonar_types::{InputSymbol, OutputSymbol};

use crate::sul::{Sul, SulError};

/// Monotonic counters of inputs and resets. Clones share the same counts.
#[derive(Debug, Clone, Default)]
pub struct SulCounters {
    inputs: Arc<AtomicU64>,
    resets: Arc<AtomicU64>,
}

/// Point-in-time snapshot of the counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SulStats {
    pub inputs: u64,
    pub resets: u64,
}

impl SulCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inputs(&self) -> u64 {
        self.inputs.load(Ordering::Relaxed)
    }

    pub fn resets(&self) -> u64 {
        self.resets.load(Ordering::Relaxed)
    }

    pub fn stats(&self) -> SulStats {
        SulStats {
            inputs: self.inputs(),
            resets: self.resets(),
        }
    }
}

/// Counts every `pre` as a reset and every `step` as an input.
pub struct CounterWrapper<S> {
    inner: S,
    counters: SulCounters,
}

impl<S: Sul> CounterWrapper<S> {
    pub fn new(inner: S, counters: SulCounters) -> Self {
        Self { inner, counters }
    }
}

impl<S: Sul> Sul for CounterWrapper<S> {
    type Message = S::Message;

    fn pre(&mut self) -> Result<(), SulError> {
        self.counters.resets.fetch_add(1, Ordering::Relaxed);
        self.inner.pre()
    }

    fn post(&mut self) -> Result<(), SulError> {
        self.inner.post()
    }

    fn step(&mut self, input: &InputSymbol) -> Result<OutputSymbol<Self::Message>, SulError> {
        self.counters.inputs.fetch_add(1, Ordering::Relaxed);
        self.inner.step(input)
    }
}
