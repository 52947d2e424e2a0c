//! Per-query execution state.
//!
//! One `ExecutionContext` lives from `pre()` to `post()` of a single query.
//! It owns the protocol state and an append-only log of the inputs sent.

use crate::symbol::InputSymbol;

/// Record of one input executed within the current query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepContext {
    index: usize,
    input: InputSymbol,
    disabled: bool,
}

impl StepContext {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn input(&self) -> &InputSymbol {
        &self.input
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    pub fn disable(&mut self) {
        self.disabled = true;
    }
}

/// Mutable state threaded through one membership query.
#[derive(Debug)]
pub struct ExecutionContext<S> {
    state: S,
    enabled: bool,
    steps: Vec<StepContext>,
}

impl<S> ExecutionContext<S> {
    pub fn new(state: S) -> Self {
        Self {
            state,
            enabled: true,
            steps: Vec::new(),
        }
    }

    pub fn state(&self) -> &S {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut S {
        &mut self.state
    }

    pub fn into_state(self) -> S {
        self.state
    }

    /// Whether inputs are executed at all in this query.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Suppress execution of every remaining input in this query.
    pub fn disable(&mut self) {
        self.enabled = false;
    }

    pub fn enable(&mut self) {
        self.enabled = true;
    }

    /// Append a step for `input` and return it.
    pub fn add_step(&mut self, input: InputSymbol) -> &mut StepContext {
        let index = self.steps.len();
        self.steps.push(StepContext {
            index,
            input,
            disabled: false,
        });
        &mut self.steps[index]
    }

    pub fn current_step(&self) -> Option<&StepContext> {
        self.steps.last()
    }

    pub fn current_step_mut(&mut self) -> Option<&mut StepContext> {
        self.steps.last_mut()
    }

    pub fn steps(&self) -> &[StepContext] {
        &self.steps
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_steps_are_appended_in_order() {
        let mut ctx = ExecutionContext::new(());
        ctx.add_step(InputSymbol::new("A"));
        ctx.add_step(InputSymbol::new("B"));

        assert_eq!(ctx.step_count(), 2);
        assert_eq!(ctx.steps()[0].input().name(), "A");
        assert_eq!(ctx.current_step().map(|s| s.index()), Some(1));
    }

    #[test]
    fn test_step_disable_is_per_step() {
        let mut ctx = ExecutionContext::new(0u32);
        ctx.add_step(InputSymbol::new("A")).disable();
        ctx.add_step(InputSymbol::new("B"));

        assert!(ctx.steps()[0].is_disabled());
        assert!(!ctx.steps()[1].is_disabled());
        assert!(ctx.is_enabled());
    }

    #[test]
    fn test_context_disable_and_state() {
        let mut ctx = ExecutionContext::new(vec![1u8]);
        ctx.state_mut().push(2);
        ctx.disable();
        assert!(!ctx.is_enabled());
        assert_eq!(ctx.into_state(), vec![1, 2]);
    }
}
