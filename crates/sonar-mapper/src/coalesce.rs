//! Output coalescing.
//!
//! Merges two outputs observed for the same input into one. `TIMEOUT` is an
//! identity on either side; `DISABLED` and `SOCKET_CLOSED` can never be merged.
//! Everything else is flattened into atomic names and merged left to right.

use sonar_types::symbol::{MESSAGE_SEPARATOR, REPEATING_INDICATOR};
use sonar_types::{OutputBuilder, OutputSymbol};

use crate::config::MapperConfig;

/// Copies of a repeated atom produced when flattening an `X*` atom. Two is the
/// smallest count that re-merges into `X*`.
const REPEAT_EXPANSION: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoalesceError {
    #[error("Cannot coalesce special output {0}")]
    SpecialOutput(String),
}

/// Join atomic names into one output name.
///
/// With `merge_repeating`, every run of two or more equal consecutive names
/// becomes a single `X*` atom.
pub fn merge_names<S: AsRef<str>>(names: &[S], merge_repeating: bool) -> String {
    let mut atoms: Vec<String> = Vec::with_capacity(names.len());
    let mut i = 0;
    while i < names.len() {
        let current = names[i].as_ref();
        let mut run = 1;
        if merge_repeating {
            while i + run < names.len() && names[i + run].as_ref() == current {
                run += 1;
            }
        }
        if run > 1 {
            atoms.push(format!("{current}{REPEATING_INDICATOR}"));
        } else {
            atoms.push(current.to_string());
        }
        i += run;
    }
    atoms.join(MESSAGE_SEPARATOR)
}

/// Merge `first` and `second` into one output, `first` coming first.
pub fn coalesce_outputs<M: Clone>(
    first: &OutputSymbol<M>,
    second: &OutputSymbol<M>,
    config: &MapperConfig,
    builder: &dyn OutputBuilder<M>,
) -> Result<OutputSymbol<M>, CoalesceError> {
    for output in [first, second] {
        if output.is_disabled() || output.is_socket_closed() {
            return Err(CoalesceError::SpecialOutput(output.name().to_string()));
        }
    }
    if first.is_timeout() {
        return Ok(second.clone());
    }
    if second.is_timeout() {
        return Ok(first.clone());
    }

    let mut atoms = first.atomic_names(REPEAT_EXPANSION);
    atoms.extend(second.atomic_names(REPEAT_EXPANSION));
    let merged = merge_names(&atoms, config.merge_repeating);

    let messages = match (first.messages(), second.messages()) {
        (Some(a), Some(b)) => Some(a.iter().chain(b).cloned().collect()),
        _ => None,
    };
    Ok(builder.build_output(&merged, messages))
}
