use sonar_sul::{Sul, SulError};
use sonar_types::InputSymbol;

/// Textual outputs of one test, in order.
pub type Trace = Vec<String>;

/// Executes tests against a SUT, one query per test.
pub struct TestRunner<S> {
    sul: S,
}

impl<S: Sul> TestRunner<S> {
    pub fn new(sul: S) -> Self {
        Self { sul }
    }

    /// Run one test. `post` runs even when a step fails.
    pub fn run_test(&mut self, test: &[InputSymbol]) -> Result<Trace, SulError> {
        self.sul.pre()?;
        let mut trace = Vec::with_capacity(test.len());
        let mut failure = None;
        for input in test {
            match self.sul.step(input) {
                Ok(output) => trace.push(output.to_string()),
                Err(e) => {
                    failure = Some(e);
                    break;
                }
            }
        }
        let post = self.sul.post();
        if let Some(e) = failure {
            return Err(e);
        }
        post?;
        Ok(trace)
    }

    /// Run the whole set `repetitions` times. The result is indexed by test,
    /// then by repetition.
    pub fn run_tests(
        &mut self,
        tests: &[Vec<InputSymbol>],
        repetitions: usize,
    ) -> Result<Vec<Vec<Trace>>, SulError> {
        let mut results: Vec<Vec<Trace>> = vec![Vec::with_capacity(repetitions); tests.len()];
        for _ in 0..repetitions {
            for (test, traces) in tests.iter().zip(results.iter_mut()) {
                traces.push(self.run_test(test)?);
            }
        }
        Ok(results)
    }

    pub fn into_inner(self) -> S {
        self.sul
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sonar_types::OutputSymbol;

    /// Fails on `FAIL`, otherwise echoes the input; counts queries.
    #[derive(Default)]
    struct Echo {
        pres: usize,
        posts: usize,
    }

    impl Sul for Echo {
        type Message = ();

        fn pre(&mut self) -> Result<(), SulError> {
            self.pres += 1;
            Ok(())
        }

        fn post(&mut self) -> Result<(), SulError> {
            self.posts += 1;
            Ok(())
        }

        fn step(&mut self, input: &InputSymbol) -> Result<OutputSymbol<()>, SulError> {
            if input.name() == "FAIL" {
                return Err(SulError::Process("crashed".to_string()));
            }
            Ok(OutputSymbol::named(input.name(), None))
        }
    }

    fn test(names: &[&str]) -> Vec<InputSymbol> {
        names.iter().map(|n| InputSymbol::new(*n)).collect()
    }

    #[test]
    fn test_run_tests_repeats_the_set() {
        let mut runner = TestRunner::new(Echo::default());
        let results = runner
            .run_tests(&[test(&["A", "B"]), test(&["C"])], 2)
            .unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0], vec![vec!["A", "B"], vec!["A", "B"]]);
        assert_eq!(results[1], vec![vec!["C"], vec!["C"]]);

        let echo = runner.into_inner();
        assert_eq!((echo.pres, echo.posts), (4, 4));
    }

    #[test]
    fn test_post_runs_after_failed_step() {
        let mut runner = TestRunner::new(Echo::default());
        assert!(runner.run_test(&test(&["A", "FAIL", "B"])).is_err());
        let echo = runner.into_inner();
        assert_eq!((echo.pres, echo.posts), (1, 1));
    }
}
