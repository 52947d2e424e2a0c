pub mod alphabet;
pub mod cleanup;
pub mod context;
pub mod liveness;
pub mod symbol;

pub use alphabet::{Alphabet, AlphabetError, AlphabetProvider};
pub use cleanup::CleanupTasks;
pub use context::{ExecutionContext, StepContext};
pub use liveness::LivenessTracker;
pub use symbol::{
    DefaultOutputBuilder, DefaultOutputChecker, InputSymbol, OutputBuilder, OutputChecker,
    OutputSymbol,
};
