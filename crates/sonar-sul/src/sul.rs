//! The raw step/reset contract every SUT layer implements.

use sonar_mapper::MapperError;
use sonar_types::{InputSymbol, OutputSymbol};

use crate::chain::ChainError;
use crate::port::SulHandles;

/// Which budget stopped a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitKind {
    /// Wall-clock time limit.
    Time,
    /// Number of tests (resets).
    Test,
}

impl std::fmt::Display for LimitKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Time => f.write_str("time"),
            Self::Test => f.write_str("test"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SulError {
    #[error("SUT I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Mapper error: {0}")]
    Mapper(MapperError),

    #[error("SUT process error: {0}")]
    Process(String),

    #[error("Launcher adapter error: {0}")]
    Adapter(String),

    #[error("Invalid SUT configuration: {0}")]
    Config(#[from] ChainError),

    #[error("SUT {0} limit reached")]
    LimitReached(LimitKind),

    #[error("step called outside of a pre/post session")]
    NoSession,
}

impl SulError {
    /// Failures that mean the SUT can no longer respond in this query.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Io(_))
    }

    pub fn is_limit(&self) -> bool {
        matches!(self, Self::LimitReached(_))
    }
}

impl From<MapperError> for SulError {
    fn from(err: MapperError) -> Self {
        match err {
            MapperError::Io(io) => Self::Io(io),
            other => Self::Mapper(other),
        }
    }
}

/// A system under test, driven one query at a time.
///
/// A query is `pre()`, any number of `step()`s, then `post()`.
pub trait Sul {
    type Message: Clone + std::fmt::Debug;

    /// Prepare a fresh SUT instance for a query.
    fn pre(&mut self) -> Result<(), SulError>;

    /// Tear down the instance used by the current query.
    fn post(&mut self) -> Result<(), SulError>;

    /// Execute one input and return the output observed.
    fn step(&mut self, input: &InputSymbol) -> Result<OutputSymbol<Self::Message>, SulError>;

    /// Receive the chain's shared handles. Called once on the innermost SUT
    /// before any wrapper is applied.
    fn attach(&mut self, _handles: &SulHandles) {}
}

pub type BoxedSul<M> = Box<dyn Sul<Message = M>>;

impl<S: Sul + ?Sized> Sul for Box<S> {
    type Message = S::Message;

    fn pre(&mut self) -> Result<(), SulError> {
        (**self).pre()
    }

    fn post(&mut self) -> Result<(), SulError> {
        (**self).post()
    }

    fn step(&mut self, input: &InputSymbol) -> Result<OutputSymbol<Self::Message>, SulError> {
        (**self).step(input)
    }

    fn attach(&mut self, handles: &SulHandles) {
        (**self).attach(handles)
    }
}
