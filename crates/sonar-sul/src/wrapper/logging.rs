use std::sync::{Arc, Mutex, PoisonError};

use sonar_types::{InputSymbol, OutputSymbol};

use crate::sul::{Sul, SulError};

/// Destination of logged input/output pairs.
pub trait LogSink {
    fn record(&self, line: &str);
}

/// Forwards lines to `tracing` at info level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn record(&self, line: &str) {
        tracing::info!(target: "sonar::sul", "{line}");
    }
}

/// Keeps lines in memory. Clones share the buffer.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    lines: Arc<Mutex<Vec<String>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl LogSink for MemorySink {
    fn record(&self, line: &str) {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(line.to_string());
    }
}

/// Mirrors resets and input/output pairs to a sink, each line prefixed.
pub struct LoggingWrapper<S> {
    inner: S,
    prefix: String,
    sink: Box<dyn LogSink>,
}

impl<S: Sul> LoggingWrapper<S> {
    pub fn new(inner: S, prefix: impl Into<String>, sink: Box<dyn LogSink>) -> Self {
        Self {
            inner,
            prefix: prefix.into(),
            sink,
        }
    }
}

impl<S: Sul> Sul for LoggingWrapper<S> {
    type Message = S::Message;

    fn pre(&mut self) -> Result<(), SulError> {
        self.sink.record(&format!("{}reset", self.prefix));
        self.inner.pre()
    }

    fn post(&mut self) -> Result<(), SulError> {
        self.inner.post()
    }

    fn step(&mut self, input: &InputSymbol) -> Result<OutputSymbol<Self::Message>, SulError> {
        let result = self.inner.step(input);
        match &result {
            Ok(output) => self.sink.record(&format!("{}{input} / {output}", self.prefix)),
            Err(e) => self.sink.record(&format!("{}{input} / error: {e}", self.prefix)),
        }
        result
    }
}
