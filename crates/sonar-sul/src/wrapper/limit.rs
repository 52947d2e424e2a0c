//! Run budgets. Once a budget is exhausted, `pre` and `step` fail fast with
//! `SulError::LimitReached` without reaching the wrapped layer.

use std::time::{Duration, Instant};

use sonar_types::{InputSymbol, OutputSymbol};

use crate::sul::{LimitKind, Sul, SulError};

/// Stops the run once a wall-clock budget, counted from construction, is spent.
pub struct TimeLimitWrapper<S> {
    inner: S,
    limit: Duration,
    start: Instant,
    exhausted: bool,
    in_query: bool,
}

impl<S: Sul> TimeLimitWrapper<S> {
    pub fn new(inner: S, limit: Duration) -> Self {
        Self {
            inner,
            limit,
            start: Instant::now(),
            exhausted: false,
            in_query: false,
        }
    }

    fn check(&mut self) -> Result<(), SulError> {
        if !self.exhausted && self.start.elapsed() >= self.limit {
            tracing::info!(limit_ms = self.limit.as_millis() as u64, "time limit reached");
            self.exhausted = true;
        }
        if self.exhausted {
            Err(SulError::LimitReached(LimitKind::Time))
        } else {
            Ok(())
        }
    }
}

impl<S: Sul> Sul for TimeLimitWrapper<S> {
    type Message = S::Message;

    fn pre(&mut self) -> Result<(), SulError> {
        self.check()?;
        self.inner.pre()?;
        self.in_query = true;
        Ok(())
    }

    fn post(&mut self) -> Result<(), SulError> {
        if std::mem::take(&mut self.in_query) {
            self.inner.post()
        } else {
            Ok(())
        }
    }

    fn step(&mut self, input: &InputSymbol) -> Result<OutputSymbol<Self::Message>, SulError> {
        self.check()?;
        self.inner.step(input)
    }
}

/// Stops the run after a fixed number of tests (resets).
pub struct TestLimitWrapper<S> {
    inner: S,
    limit: u64,
    tests: u64,
    exhausted: bool,
    in_query: bool,
}

impl<S: Sul> TestLimitWrapper<S> {
    pub fn new(inner: S, limit: u64) -> Self {
        Self {
            inner,
            limit,
            tests: 0,
            exhausted: false,
            in_query: false,
        }
    }

    /// Tests started so far, counting the one that exhausted the budget.
    pub fn tests(&self) -> u64 {
        self.tests
    }
}

impl<S: Sul> Sul for TestLimitWrapper<S> {
    type Message = S::Message;

    fn pre(&mut self) -> Result<(), SulError> {
        if !self.exhausted {
            self.tests += 1;
            if self.tests > self.limit {
                tracing::info!(limit = self.limit, "test limit reached");
                self.exhausted = true;
            }
        }
        if self.exhausted {
            return Err(SulError::LimitReached(LimitKind::Test));
        }
        self.inner.pre()?;
        self.in_query = true;
        Ok(())
    }

    fn post(&mut self) -> Result<(), SulError> {
        if std::mem::take(&mut self.in_query) {
            self.inner.post()
        } else {
            Ok(())
        }
    }

    fn step(&mut self, input: &InputSymbol) -> Result<OutputSymbol<Self::Message>, SulError> {
        if self.exhausted {
            return Err(SulError::LimitReached(LimitKind::Test));
        }
        self.inner.step(input)
    }
}
