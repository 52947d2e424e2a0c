//! Abstract symbols exchanged with the learning/testing layer.
//!
//! Inputs are plain named tokens. Outputs are a closed set of special kinds
//! plus one "ordinary" case carrying the protocol-specific payload. Special
//! kinds are matched structurally, never by comparing names.

use serde::{Deserialize, Serialize};

/// Separator between atomic names inside a composite output name.
pub const MESSAGE_SEPARATOR: &str = ";";

/// Marker appended to an atomic name that stands for a run of repeats.
pub const REPEATING_INDICATOR: &str = "*";

pub const TIMEOUT: &str = "TIMEOUT";
pub const SOCKET_CLOSED: &str = "SOCKET_CLOSED";
pub const DISABLED: &str = "DISABLED";
pub const UNKNOWN: &str = "UNKNOWN";
pub const UNSUPPORTED: &str = "UNSUPPORTED";

/// An abstract input symbol, identified by its name within an alphabet.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InputSymbol {
    name: String,
}

impl InputSymbol {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Display for InputSymbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

/// An abstract output symbol.
///
/// `M` is the protocol's concrete message type. Coalesced outputs keep the
/// underlying messages so the input side can inspect them after a step.
#[derive(Debug, Clone, PartialEq)]
pub enum OutputSymbol<M> {
    /// Nothing arrived within the response wait.
    Timeout,
    /// The SUT closed its connection or its process died.
    SocketClosed,
    /// The input was not executed because it is disabled in the current context.
    Disabled,
    /// The SUT answered with something the mapper could not abstract.
    Unknown,
    /// The input cannot be rendered for this SUT.
    Unsupported,
    /// An ordinary protocol output.
    Named {
        name: String,
        messages: Option<Vec<M>>,
    },
}

impl<M> OutputSymbol<M> {
    /// Build an output from a textual name.
    ///
    /// Reserved tokens map to their special variant, so an ordinary output
    /// can never be named like one.
    pub fn named(name: impl Into<String>, messages: Option<Vec<M>>) -> Self {
        let name = name.into();
        match name.as_str() {
            TIMEOUT => Self::Timeout,
            SOCKET_CLOSED => Self::SocketClosed,
            DISABLED => Self::Disabled,
            UNKNOWN => Self::Unknown,
            UNSUPPORTED => Self::Unsupported,
            _ => Self::Named { name, messages },
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Timeout => TIMEOUT,
            Self::SocketClosed => SOCKET_CLOSED,
            Self::Disabled => DISABLED,
            Self::Unknown => UNKNOWN,
            Self::Unsupported => UNSUPPORTED,
            Self::Named { name, .. } => name,
        }
    }

    /// Concrete messages behind this output, if it carries any.
    pub fn messages(&self) -> Option<&[M]> {
        match self {
            Self::Named {
                messages: Some(messages),
                ..
            } => Some(messages),
            _ => None,
        }
    }

    pub fn has_messages(&self) -> bool {
        self.messages().is_some()
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }

    pub fn is_socket_closed(&self) -> bool {
        matches!(self, Self::SocketClosed)
    }

    pub fn is_disabled(&self) -> bool {
        matches!(self, Self::Disabled)
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }

    /// True for every variant except `Named`.
    pub fn is_special(&self) -> bool {
        !matches!(self, Self::Named { .. })
    }

    /// Split the name into atomic names.
    ///
    /// Each `X*` atom expands into `repeats` copies of `X`.
    pub fn atomic_names(&self, repeats: usize) -> Vec<String> {
        let mut atoms = Vec::new();
        for atom in self.name().split(MESSAGE_SEPARATOR) {
            match atom.strip_suffix(REPEATING_INDICATOR) {
                Some(repeated) => {
                    atoms.extend(std::iter::repeat(repeated.to_string()).take(repeats))
                }
                None => atoms.push(atom.to_string()),
            }
        }
        atoms
    }
}

impl<M> std::fmt::Display for OutputSymbol<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Constructs output symbols. Protocols override `build_output` when an
/// abstract name needs protocol-specific interpretation.
pub trait OutputBuilder<M> {
    fn build_timeout(&self) -> OutputSymbol<M> {
        OutputSymbol::Timeout
    }

    fn build_socket_closed(&self) -> OutputSymbol<M> {
        OutputSymbol::SocketClosed
    }

    fn build_disabled(&self) -> OutputSymbol<M> {
        OutputSymbol::Disabled
    }

    fn build_unknown(&self) -> OutputSymbol<M> {
        OutputSymbol::Unknown
    }

    fn build_output(&self, name: &str, messages: Option<Vec<M>>) -> OutputSymbol<M> {
        OutputSymbol::named(name, messages)
    }
}

/// Queries on outputs handed to the input side after each step.
pub trait OutputChecker<M> {
    fn is_timeout(&self, output: &OutputSymbol<M>) -> bool {
        output.is_timeout()
    }

    fn is_socket_closed(&self, output: &OutputSymbol<M>) -> bool {
        output.is_socket_closed()
    }

    fn is_disabled(&self, output: &OutputSymbol<M>) -> bool {
        output.is_disabled()
    }

    fn is_unknown(&self, output: &OutputSymbol<M>) -> bool {
        output.is_unknown()
    }

    /// Whether the output contains the message a client sends first.
    /// Only meaningful for protocols where the SUT plays the client role.
    fn has_initial_client_message(&self, _output: &OutputSymbol<M>) -> bool {
        false
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultOutputBuilder;

impl<M> OutputBuilder<M> for DefaultOutputBuilder {}

#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultOutputChecker;

impl<M> OutputChecker<M> for DefaultOutputChecker {}
