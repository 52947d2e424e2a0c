use sonar_types::{ExecutionContext, InputSymbol, OutputChecker, OutputSymbol};

use crate::mapper::MapperError;

/// The abstract-to-concrete side of a mapper.
///
/// Implemented per protocol. The hooks run in the order `is_enabled`,
/// `pre_send_update`, `generate_message`, `send_message`, `post_send_update`,
/// then, once the output side produced an output, `post_receive_update`.
pub trait InputMapper {
    /// Concrete protocol message.
    type Message: Clone + std::fmt::Debug;
    /// Protocol state held by the execution context (typically owns the transport).
    type State;

    /// Whether `input` may be executed in the current context.
    fn is_enabled(&self, _input: &InputSymbol, _ctx: &ExecutionContext<Self::State>) -> bool {
        true
    }

    fn pre_send_update(&mut self, _input: &InputSymbol, _ctx: &mut ExecutionContext<Self::State>) {}

    /// Render `input` as a concrete message.
    fn generate_message(
        &mut self,
        input: &InputSymbol,
        ctx: &mut ExecutionContext<Self::State>,
    ) -> Result<Self::Message, MapperError>;

    /// Transmit a rendered message to the SUT.
    fn send_message(
        &mut self,
        message: Self::Message,
        ctx: &mut ExecutionContext<Self::State>,
    ) -> Result<(), MapperError>;

    fn post_send_update(&mut self, _input: &InputSymbol, _ctx: &mut ExecutionContext<Self::State>) {}

    fn post_receive_update(
        &mut self,
        _input: &InputSymbol,
        _output: &OutputSymbol<Self::Message>,
        _checker: &dyn OutputChecker<Self::Message>,
        _ctx: &mut ExecutionContext<Self::State>,
    ) {
    }
}
