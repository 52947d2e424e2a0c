//! Timing probe: finds, per timing parameter, the smallest value for which
//! repeated runs of a fixed test set are deterministic.

use std::fmt;

use sonar_sul::{SulBuilder, SulConfig, SulError};
use sonar_types::{Alphabet, CleanupTasks, InputSymbol};

use crate::config::ProbeConfig;
use crate::range::find_limit;
use crate::runner::{TestRunner, Trace};

#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("Unknown probe target '{0}'")]
    UnknownTarget(String),

    #[error("Invalid probe bounds: {0}")]
    InvalidBounds(String),

    #[error("No tests to probe with")]
    NoTests,

    #[error("Outputs are non-deterministic even with every target at {0} ms")]
    Infeasible(u64),

    #[error(transparent)]
    Sul(#[from] SulError),
}

/// A timing parameter of `SulConfig`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeTarget {
    /// `response_wait_ms`.
    ResponseWait,
    /// `start_wait_ms`.
    StartWait,
    /// The `input_response_timeout` entry of one input.
    Input(String),
}

impl ProbeTarget {
    /// Resolve a target name. Input names must belong to `alphabet`.
    pub fn parse(name: &str, alphabet: &Alphabet) -> Result<Self, ProbeError> {
        match name {
            "responseWait" => Ok(Self::ResponseWait),
            "startWait" => Ok(Self::StartWait),
            input if alphabet.contains(input) => Ok(Self::Input(input.to_string())),
            other => Err(ProbeError::UnknownTarget(other.to_string())),
        }
    }

    pub fn apply(&self, config: &mut SulConfig, value: u64) {
        match self {
            Self::ResponseWait => config.response_wait_ms = value,
            Self::StartWait => config.start_wait_ms = value,
            Self::Input(name) => {
                config.input_response_timeout.insert(name.clone(), value);
            }
        }
    }
}

impl fmt::Display for ProbeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ResponseWait => f.write_str("responseWait"),
            Self::StartWait => f.write_str("startWait"),
            Self::Input(name) => f.write_str(name),
        }
    }
}

/// Result of a probe run.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeReport {
    /// Found value per target, in probing order.
    pub values: Vec<(ProbeTarget, u64)>,
    /// The SUT configuration with every target fixed at its found value.
    pub config: SulConfig,
    /// Determinism checks executed, control run included.
    pub checks: u64,
}

impl fmt::Display for ProbeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (target, value) in &self.values {
            writeln!(f, "{target}={value}")?;
        }
        Ok(())
    }
}

pub struct TimingProbe<B> {
    config: ProbeConfig,
    targets: Vec<ProbeTarget>,
    builder: B,
    tests: Vec<Vec<InputSymbol>>,
    cached: Option<Vec<Trace>>,
    checks: u64,
}

impl<B> TimingProbe<B> {
    /// Validate `config` and resolve its targets against `alphabet`.
    ///
    /// `builder` must produce a SUT ready to run tests, wrapper chain included.
    pub fn new(
        config: ProbeConfig,
        alphabet: &Alphabet,
        builder: B,
        tests: Vec<Vec<InputSymbol>>,
    ) -> Result<Self, ProbeError> {
        if config.probe_min == 0 {
            return Err(ProbeError::InvalidBounds("probe_min must be positive".to_string()));
        }
        if config.probe_lo > config.probe_hi {
            return Err(ProbeError::InvalidBounds(format!(
                "probe_lo {} exceeds probe_hi {}",
                config.probe_lo, config.probe_hi
            )));
        }
        if config.repetitions == 0 {
            return Err(ProbeError::InvalidBounds("repetitions must be positive".to_string()));
        }
        if tests.is_empty() {
            return Err(ProbeError::NoTests);
        }
        let targets = config
            .targets
            .iter()
            .map(|name| ProbeTarget::parse(name, alphabet))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            config,
            targets,
            builder,
            tests,
            cached: None,
            checks: 0,
        })
    }

    pub fn targets(&self) -> &[ProbeTarget] {
        &self.targets
    }

    /// Probe every target in order, starting from `base`.
    pub fn run<M>(mut self, base: &SulConfig) -> Result<ProbeReport, ProbeError>
    where
        B: SulBuilder<M>,
        M: Clone + fmt::Debug,
    {
        let hi = self.config.probe_hi;
        let mut current = base.clone();
        for target in &self.targets {
            target.apply(&mut current, hi);
        }

        tracing::info!(probe_hi = hi, "control run");
        if !self.is_deterministic::<M>(&current, true)? {
            tracing::error!(probe_hi = hi, "non-deterministic at the upper bound, probe infeasible");
            return Err(ProbeError::Infeasible(hi));
        }

        let targets = std::mem::take(&mut self.targets);
        let mut values = Vec::with_capacity(targets.len());
        for target in targets {
            let (lo, min) = (self.config.probe_lo, self.config.probe_min);
            let range = find_limit(lo, hi, min, |value| {
                let mut candidate = current.clone();
                target.apply(&mut candidate, value);
                let deterministic = self.is_deterministic::<M>(&candidate, false)?;
                tracing::info!(parameter = %target, value, deterministic, "probed candidate");
                Ok::<_, ProbeError>(deterministic)
            })?;
            tracing::info!(
                parameter = %target,
                value = range.hi,
                pre_determined = range.pre_determined,
                "target stabilized"
            );
            target.apply(&mut current, range.hi);
            values.push((target, range.hi));
        }

        Ok(ProbeReport {
            values,
            config: current,
            checks: self.checks,
        })
    }

    /// Run the test set against a fresh SUT built from `config`.
    ///
    /// Non-deterministic if any test yields differing traces across the
    /// repetitions, or a trace differing from the cached control run.
    fn is_deterministic<M>(&mut self, config: &SulConfig, cache: bool) -> Result<bool, ProbeError>
    where
        B: SulBuilder<M>,
        M: Clone + fmt::Debug,
    {
        self.checks += 1;
        let mut cleanup = CleanupTasks::new();
        let sul = self.builder.build(config, &mut cleanup)?;
        let results = TestRunner::new(sul).run_tests(&self.tests, self.config.repetitions);
        cleanup.run_all();
        let results = results?;

        let mut deterministic = true;
        let mut firsts = Vec::with_capacity(results.len());
        for (index, traces) in results.into_iter().enumerate() {
            let Some(first) = traces.first().cloned() else {
                continue;
            };
            if traces.iter().any(|trace| *trace != first) {
                tracing::debug!(test = index, "traces differ across repetitions");
                deterministic = false;
            }
            if let Some(cached) = self.cached.as_ref().and_then(|c| c.get(index)) {
                if *cached != first {
                    tracing::debug!(test = index, "trace differs from control run");
                    deterministic = false;
                }
            }
            firsts.push(first);
        }

        if cache && deterministic {
            self.cached = Some(firsts);
        }
        Ok(deterministic)
    }
}
