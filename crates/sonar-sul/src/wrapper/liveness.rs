use sonar_mapper::MapperConfig;
use sonar_types::{DefaultOutputBuilder, InputSymbol, LivenessTracker, OutputBuilder, OutputSymbol};

use crate::sul::{Sul, SulError};

/// Converts a dead SUT into a stable output.
///
/// Once the tracker reports the SUT gone, every further `step` of the query
/// returns `SOCKET_CLOSED` (or `TIMEOUT` when so configured) without reaching
/// the wrapped layer. A `SOCKET_CLOSED` reported by the wrapped layer and
/// transient I/O failures are converted the same way.
pub struct IsAliveWrapper<S: Sul> {
    inner: S,
    liveness: LivenessTracker,
    config: MapperConfig,
    builder: Box<dyn OutputBuilder<S::Message>>,
}

impl<S: Sul> IsAliveWrapper<S> {
    pub fn new(inner: S, liveness: LivenessTracker, config: MapperConfig) -> Self
    where
        S::Message: 'static,
    {
        Self {
            inner,
            liveness,
            config,
            builder: Box::new(DefaultOutputBuilder),
        }
    }

    /// Build substituted outputs through `builder` instead of the default one.
    pub fn with_builder(mut self, builder: Box<dyn OutputBuilder<S::Message>>) -> Self {
        self.builder = builder;
        self
    }

    fn closed_output(&self) -> OutputSymbol<S::Message> {
        self.config.socket_closed_output(self.builder.as_ref())
    }
}

impl<S: Sul> Sul for IsAliveWrapper<S> {
    type Message = S::Message;

    fn pre(&mut self) -> Result<(), SulError> {
        self.liveness.revive();
        match self.inner.pre() {
            Err(e) if e.is_transient() => {
                tracing::warn!(error = %e, "SUT not reachable at query start");
                self.liveness.mark_dead();
                Ok(())
            }
            other => other,
        }
    }

    fn post(&mut self) -> Result<(), SulError> {
        self.inner.post()
    }

    fn step(&mut self, input: &InputSymbol) -> Result<OutputSymbol<Self::Message>, SulError> {
        if !self.liveness.is_alive() {
            return Ok(self.closed_output());
        }
        match self.inner.step(input) {
            Ok(output) if output.is_socket_closed() => {
                self.liveness.mark_dead();
                Ok(self.closed_output())
            }
            Ok(output) => Ok(output),
            Err(e) if e.is_transient() => {
                tracing::debug!(input = %input, error = %e, "SUT failed mid-query");
                self.liveness.mark_dead();
                Ok(self.closed_output())
            }
            Err(e) => Err(e),
        }
    }
}
