use std::sync::{Arc, Mutex, PoisonError};

use sonar_types::{InputSymbol, LivenessTracker, OutputSymbol};

use crate::config::ProcessTrigger;
use crate::process::ProcessHandler;
use crate::sul::{Sul, SulError};

/// Starts and stops a local SUT process around queries.
pub struct ProcessWrapper<S> {
    inner: S,
    handler: Arc<Mutex<ProcessHandler>>,
    trigger: ProcessTrigger,
    liveness: LivenessTracker,
}

impl<S: Sul> ProcessWrapper<S> {
    /// `handler` is shared so that a cleanup task can terminate the process.
    pub fn new(
        inner: S,
        handler: Arc<Mutex<ProcessHandler>>,
        trigger: ProcessTrigger,
        liveness: LivenessTracker,
    ) -> Self {
        Self {
            inner,
            handler,
            trigger,
            liveness,
        }
    }

    fn with_handler<T>(&self, f: impl FnOnce(&mut ProcessHandler) -> T) -> T {
        let mut handler = self.handler.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut handler)
    }
}

impl<S: Sul> Sul for ProcessWrapper<S> {
    type Message = S::Message;

    fn pre(&mut self) -> Result<(), SulError> {
        match self.trigger {
            ProcessTrigger::NewTest => self.with_handler(|h| h.launch())?,
            ProcessTrigger::Start => self.with_handler(|h| {
                if h.has_launched() {
                    Ok(())
                } else {
                    h.launch()
                }
            })?,
        }
        self.inner.pre()
    }

    fn post(&mut self) -> Result<(), SulError> {
        let result = self.inner.post();
        if self.trigger == ProcessTrigger::NewTest {
            self.with_handler(|h| h.terminate());
        }
        result
    }

    fn step(&mut self, input: &InputSymbol) -> Result<OutputSymbol<Self::Message>, SulError> {
        let output = self.inner.step(input);
        if !self.with_handler(|h| h.is_alive()) {
            self.liveness.mark_dead();
        }
        output
    }
}
