use serde::{Deserialize, Serialize};
use sonar_types::{OutputBuilder, OutputSymbol};

/// Output-shaping policy of the mapper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MapperConfig {
    /// Collapse runs of equal atomic outputs into one `X*` atom.
    pub merge_repeating: bool,
    /// Emit `TIMEOUT` wherever `SOCKET_CLOSED` would be emitted.
    pub socket_closed_as_timeout: bool,
    /// Emit `TIMEOUT` wherever `DISABLED` would be emitted.
    pub disabled_as_timeout: bool,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            merge_repeating: true,
            socket_closed_as_timeout: false,
            disabled_as_timeout: false,
        }
    }
}

impl MapperConfig {
    /// The output to emit once the SUT is known to be gone.
    pub fn socket_closed_output<M>(&self, builder: &dyn OutputBuilder<M>) -> OutputSymbol<M> {
        if self.socket_closed_as_timeout {
            builder.build_timeout()
        } else {
            builder.build_socket_closed()
        }
    }

    /// The output to emit for an input that is not executed.
    pub fn disabled_output<M>(&self, builder: &dyn OutputBuilder<M>) -> OutputSymbol<M> {
        if self.disabled_as_timeout {
            builder.build_timeout()
        } else {
            builder.build_disabled()
        }
    }

    /// Apply both substitutions to an already-built output.
    pub fn substitute<M>(
        &self,
        output: OutputSymbol<M>,
        builder: &dyn OutputBuilder<M>,
    ) -> OutputSymbol<M> {
        match output {
            OutputSymbol::SocketClosed => self.socket_closed_output(builder),
            OutputSymbol::Disabled => self.disabled_output(builder),
            other => other,
        }
    }
}
