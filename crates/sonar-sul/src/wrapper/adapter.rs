use sonar_types::{InputSymbol, LivenessTracker, OutputSymbol};

use crate::adapter::LauncherAdapter;
use crate::port::SharedPort;
use crate::sul::{Sul, SulError};

/// Starts and stops the SUT through a launcher service around queries, and
/// publishes the port the launcher reports.
pub struct AdapterWrapper<S> {
    inner: S,
    adapter: Box<dyn LauncherAdapter>,
    port: SharedPort,
    liveness: LivenessTracker,
    started: bool,
}

impl<S: Sul> AdapterWrapper<S> {
    pub fn new(
        inner: S,
        adapter: Box<dyn LauncherAdapter>,
        port: SharedPort,
        liveness: LivenessTracker,
    ) -> Self {
        Self {
            inner,
            adapter,
            port,
            liveness,
            started: false,
        }
    }
}

impl<S: Sul> Sul for AdapterWrapper<S> {
    type Message = S::Message;

    fn pre(&mut self) -> Result<(), SulError> {
        let port = self.adapter.start()?;
        tracing::debug!(?port, "launcher started SUT");
        self.port.set(port);
        self.started = true;
        self.inner.pre()
    }

    fn post(&mut self) -> Result<(), SulError> {
        let result = self.inner.post();
        if std::mem::take(&mut self.started) {
            self.adapter.stop()?;
            tracing::debug!("launcher stopped SUT");
        }
        result
    }

    fn step(&mut self, input: &InputSymbol) -> Result<OutputSymbol<Self::Message>, SulError> {
        let output = self.inner.step(input)?;
        // Silence may mean the remote instance died; ask the launcher.
        if output.is_timeout() {
            match self.adapter.is_alive() {
                Ok(true) => {}
                Ok(false) => self.liveness.mark_dead(),
                Err(e) => {
                    tracing::warn!(error = %e, "launcher liveness check failed, treating SUT as dead");
                    self.liveness.mark_dead();
                }
            }
        }
        Ok(output)
    }
}

impl<S> Drop for AdapterWrapper<S> {
    fn drop(&mut self) {
        self.adapter.close();
    }
}
