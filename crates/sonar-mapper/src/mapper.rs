//! The mapper: crosses the abstract/concrete boundary for one input.

use sonar_types::{
    DefaultOutputBuilder, DefaultOutputChecker, ExecutionContext, InputSymbol, LivenessTracker,
    OutputBuilder, OutputChecker, OutputSymbol,
};

use crate::config::MapperConfig;
use crate::input::InputMapper;
use crate::output::OutputMapper;
use crate::timing::ResponseTiming;

#[derive(Debug, thiserror::Error)]
pub enum MapperError {
    #[error("Transport error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cannot render input {input}: {details}")]
    Encode { input: String, details: String },

    #[error("Cannot decode response: {0}")]
    Decode(String),

    #[error(transparent)]
    Coalesce(#[from] crate::coalesce::CoalesceError),
}

/// Input side plus output side, with the output-shaping policy applied.
pub struct Mapper<I, O>
where
    I: InputMapper,
    O: OutputMapper<Message = I::Message, State = I::State>,
{
    input: I,
    output: O,
    config: MapperConfig,
    timing: ResponseTiming,
    builder: Box<dyn OutputBuilder<I::Message>>,
    checker: Box<dyn OutputChecker<I::Message>>,
    liveness: Option<LivenessTracker>,
}

impl<I, O> Mapper<I, O>
where
    I: InputMapper,
    I::Message: 'static,
    O: OutputMapper<Message = I::Message, State = I::State>,
{
    pub fn new(input: I, output: O, config: MapperConfig) -> Self {
        Self {
            input,
            output,
            config,
            timing: ResponseTiming::default(),
            builder: Box::new(DefaultOutputBuilder),
            checker: Box::new(DefaultOutputChecker),
            liveness: None,
        }
    }

    pub fn with_timing(mut self, timing: ResponseTiming) -> Self {
        self.timing = timing;
        self
    }

    pub fn with_builder(mut self, builder: impl OutputBuilder<I::Message> + 'static) -> Self {
        self.builder = Box::new(builder);
        self
    }

    pub fn with_checker(mut self, checker: impl OutputChecker<I::Message> + 'static) -> Self {
        self.checker = Box::new(checker);
        self
    }
}

impl<I, O> Mapper<I, O>
where
    I: InputMapper,
    O: OutputMapper<Message = I::Message, State = I::State>,
{
    /// Report observed socket closures to `tracker`.
    pub fn set_liveness(&mut self, tracker: LivenessTracker) {
        self.liveness = Some(tracker);
    }

    pub fn config(&self) -> &MapperConfig {
        &self.config
    }

    pub fn timing(&self) -> &ResponseTiming {
        &self.timing
    }

    pub fn builder(&self) -> &dyn OutputBuilder<I::Message> {
        self.builder.as_ref()
    }

    /// Merge two outputs through the output side, under this mapper's
    /// policy and builder.
    pub fn coalesce(
        &self,
        first: &OutputSymbol<I::Message>,
        second: &OutputSymbol<I::Message>,
    ) -> Result<OutputSymbol<I::Message>, MapperError> {
        self.output
            .coalesce(first, second, &self.config, self.builder.as_ref())
    }

    /// Execute one abstract input and return the abstract output it produced.
    pub fn execute(
        &mut self,
        input: &InputSymbol,
        ctx: &mut ExecutionContext<I::State>,
    ) -> Result<OutputSymbol<I::Message>, MapperError> {
        ctx.add_step(input.clone());

        if !ctx.is_enabled() || !self.input.is_enabled(input, ctx) {
            if let Some(step) = ctx.current_step_mut() {
                step.disable();
            }
            tracing::debug!(input = %input, "input disabled");
            return Ok(self.config.disabled_output(self.builder.as_ref()));
        }

        self.input.pre_send_update(input, ctx);
        let message = self.input.generate_message(input, ctx)?;
        self.input.send_message(message, ctx)?;
        self.input.post_send_update(input, ctx);

        let wait = self.timing.wait_for(input);
        let output = self
            .output
            .receive_output(wait, ctx, &self.config, self.builder.as_ref())?;

        if output.is_socket_closed() {
            if let Some(liveness) = &self.liveness {
                liveness.mark_dead();
            }
        }

        self.input
            .post_receive_update(input, &output, self.checker.as_ref(), ctx);

        Ok(self.config.substitute(output, self.builder.as_ref()))
    }
}
