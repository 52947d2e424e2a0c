use std::collections::HashMap;

use crate::symbol::InputSymbol;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AlphabetError {
    #[error("Duplicate input symbol: {0}")]
    Duplicate(String),

    #[error("Empty input symbol name at position {0}")]
    EmptyName(usize),
}

/// Supplies the input alphabet. Implemented by whatever reads alphabet files.
pub trait AlphabetProvider {
    fn build(&self) -> Result<Alphabet, AlphabetError>;
}

/// Ordered set of input symbols, unique by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Alphabet {
    inputs: Vec<InputSymbol>,
    by_name: HashMap<String, usize>,
}

impl Alphabet {
    pub fn new(inputs: Vec<InputSymbol>) -> Result<Self, AlphabetError> {
        let mut by_name = HashMap::with_capacity(inputs.len());
        for (i, input) in inputs.iter().enumerate() {
            if input.name().is_empty() {
                return Err(AlphabetError::EmptyName(i));
            }
            if by_name.insert(input.name().to_string(), i).is_some() {
                return Err(AlphabetError::Duplicate(input.name().to_string()));
            }
        }
        Ok(Self { inputs, by_name })
    }

    pub fn from_names<I, S>(names: I) -> Result<Self, AlphabetError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(names.into_iter().map(InputSymbol::new).collect())
    }

    /// Look up an input by name.
    pub fn get(&self, name: &str) -> Option<&InputSymbol> {
        self.by_name.get(name).map(|&i| &self.inputs[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn inputs(&self) -> &[InputSymbol] {
        &self.inputs
    }

    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }
}

impl AlphabetProvider for Alphabet {
    fn build(&self) -> Result<Alphabet, AlphabetError> {
        Ok(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_preserves_order() {
        let alphabet = Alphabet::from_names(["HELLO", "FINISHED", "CLOSE"]).unwrap();
        let names: Vec<&str> = alphabet.inputs().iter().map(|i| i.name()).collect();
        assert_eq!(names, vec!["HELLO", "FINISHED", "CLOSE"]);
        assert_eq!(alphabet.get("FINISHED").map(|i| i.name()), Some("FINISHED"));
        assert!(alphabet.get("finished").is_none());
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let err = Alphabet::from_names(["A", "B", "A"]).unwrap_err();
        assert_eq!(err, AlphabetError::Duplicate("A".to_string()));
    }

    #[test]
    fn test_empty_name_rejected() {
        assert_eq!(
            Alphabet::from_names(["A", ""]).unwrap_err(),
            AlphabetError::EmptyName(1)
        );
    }
}
