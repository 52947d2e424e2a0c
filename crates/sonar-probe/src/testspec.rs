//! Reader for test files.
//!
//! A test file is a sequence of lines, each one of:
//!
//! - a comment, starting with `#` or `!`
//! - `reset`, ending the current test
//! - input names separated by spaces
//! - an `@`-prefixed mutated input encoding (not supported here)
//!
//! Reading stops at the first blank line or at the end of the file. A last
//! test without a closing `reset` is kept.

use std::path::Path;

use sonar_types::{Alphabet, InputSymbol};

#[derive(Debug, thiserror::Error)]
pub enum TestFileError {
    #[error("Cannot read test file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Line {line}: unknown input symbol '{name}'")]
    UnknownSymbol { line: usize, name: String },

    #[error("Line {line}: mutated inputs are not supported")]
    MutatedInput { line: usize },
}

/// Parse test file contents against `alphabet`. Line numbers in errors start at 1.
pub fn parse_tests(text: &str, alphabet: &Alphabet) -> Result<Vec<Vec<InputSymbol>>, TestFileError> {
    let mut tests = Vec::new();
    let mut current = Vec::new();

    for (index, raw) in text.lines().enumerate() {
        let line = raw.trim();
        let number = index + 1;
        if line.is_empty() {
            break;
        }
        if line.starts_with('#') || line.starts_with('!') {
            continue;
        }
        if line.starts_with('@') {
            return Err(TestFileError::MutatedInput { line: number });
        }
        if line == "reset" {
            tests.push(std::mem::take(&mut current));
            continue;
        }
        for name in line.split_whitespace() {
            let input = alphabet.get(name).ok_or_else(|| TestFileError::UnknownSymbol {
                line: number,
                name: name.to_string(),
            })?;
            current.push(input.clone());
        }
    }

    if !current.is_empty() {
        tests.push(current);
    }
    Ok(tests)
}

pub fn read_test_file(
    path: impl AsRef<Path>,
    alphabet: &Alphabet,
) -> Result<Vec<Vec<InputSymbol>>, TestFileError> {
    let text = std::fs::read_to_string(path)?;
    parse_tests(&text, alphabet)
}
