use std::time::Duration;

use sonar_types::{ExecutionContext, OutputBuilder, OutputSymbol};

use crate::coalesce::{coalesce_outputs, merge_names};
use crate::config::MapperConfig;
use crate::mapper::MapperError;

/// What the transport delivered for one input.
#[derive(Debug, Clone, PartialEq)]
pub enum Reception<M> {
    /// Messages received within the wait. Empty means nothing arrived.
    Messages(Vec<M>),
    /// The peer closed the connection.
    Closed,
}

/// The concrete-to-abstract side of a mapper.
pub trait OutputMapper {
    type Message: Clone + std::fmt::Debug;
    type State;

    /// Wait up to `wait` for the SUT's response to the last input.
    fn receive_messages(
        &mut self,
        wait: Duration,
        ctx: &mut ExecutionContext<Self::State>,
    ) -> Result<Reception<Self::Message>, MapperError>;

    /// Abstract name of one concrete message.
    fn abstract_name(&self, message: &Self::Message) -> String;

    /// Receive and abstract the response into one coalesced output.
    fn receive_output(
        &mut self,
        wait: Duration,
        ctx: &mut ExecutionContext<Self::State>,
        config: &MapperConfig,
        builder: &dyn OutputBuilder<Self::Message>,
    ) -> Result<OutputSymbol<Self::Message>, MapperError> {
        let reception = self.receive_messages(wait, ctx)?;
        Ok(self.abstract_reception(reception, config, builder))
    }

    /// Abstract one reception: `SOCKET_CLOSED`, `TIMEOUT` when nothing
    /// arrived, or one output named after the merged message names.
    fn abstract_reception(
        &self,
        reception: Reception<Self::Message>,
        config: &MapperConfig,
        builder: &dyn OutputBuilder<Self::Message>,
    ) -> OutputSymbol<Self::Message> {
        match reception {
            Reception::Closed => builder.build_socket_closed(),
            Reception::Messages(messages) if messages.is_empty() => builder.build_timeout(),
            Reception::Messages(messages) => {
                let names: Vec<String> = messages.iter().map(|m| self.abstract_name(m)).collect();
                let name = merge_names(&names, config.merge_repeating);
                builder.build_output(&name, Some(messages))
            }
        }
    }

    /// Merge two outputs observed for the same input, `first` coming first.
    fn coalesce(
        &self,
        first: &OutputSymbol<Self::Message>,
        second: &OutputSymbol<Self::Message>,
        config: &MapperConfig,
        builder: &dyn OutputBuilder<Self::Message>,
    ) -> Result<OutputSymbol<Self::Message>, MapperError> {
        Ok(coalesce_outputs(first, second, config, builder)?)
    }
}
