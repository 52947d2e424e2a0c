//! Decorators around a SUT. Each forwards exactly one `pre`/`step`/`post` to
//! the layer it wraps unless its own policy short-circuits the call.

pub mod adapter;
pub mod counter;
pub mod limit;
pub mod liveness;
pub mod logging;
pub mod process;

pub use adapter::AdapterWrapper;
pub use counter::CounterWrapper;
pub use limit::{TestLimitWrapper, TimeLimitWrapper};
pub use liveness::IsAliveWrapper;
pub use logging::LoggingWrapper;
pub use process::ProcessWrapper;
