use sonar_types::{Alphabet, AlphabetError, AlphabetProvider, ExecutionContext, InputSymbol};

/// Alphabet stored as a JSON list of input names.
struct JsonAlphabet(&'static str);

impl AlphabetProvider for JsonAlphabet {
    fn build(&self) -> Result<Alphabet, AlphabetError> {
        let inputs: Vec<InputSymbol> = serde_json::from_str(self.0).unwrap_or_default();
        Alphabet::new(inputs)
    }
}

#[test]
fn test_provider_preserves_order_and_uniqueness() {
    let alphabet = JsonAlphabet(r#"["CLIENT_HELLO", "FINISHED", "APPLICATION"]"#)
        .build()
        .unwrap();
    assert_eq!(alphabet.len(), 3);
    assert_eq!(alphabet.inputs()[1].name(), "FINISHED");
    assert_eq!(serde_json::to_string(alphabet.inputs()).unwrap(), r#"["CLIENT_HELLO","FINISHED","APPLICATION"]"#);

    let err = JsonAlphabet(r#"["A", "A"]"#).build().unwrap_err();
    assert_eq!(err, AlphabetError::Duplicate("A".to_string()));
}

#[test]
fn test_context_records_one_step_per_input() {
    let alphabet = Alphabet::from_names(["HELLO", "DATA"]).unwrap();
    let mut ctx = ExecutionContext::new(Vec::<String>::new());

    for input in alphabet.inputs() {
        ctx.state_mut().push(input.name().to_lowercase());
        ctx.add_step(input.clone());
    }
    ctx.disable();
    ctx.add_step(alphabet.inputs()[0].clone()).disable();

    assert_eq!(ctx.step_count(), 3);
    let disabled: Vec<bool> = ctx.steps().iter().map(|s| s.is_disabled()).collect();
    assert_eq!(disabled, vec![false, false, true]);
    assert_eq!(ctx.current_step().map(|s| s.index()), Some(2));
    assert!(!ctx.is_enabled());
    assert_eq!(ctx.into_state(), vec!["hello", "data"]);
}
