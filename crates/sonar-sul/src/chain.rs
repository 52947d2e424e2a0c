//! Assembly of the wrapper chain.
//!
//! The chain is an ordered list of layer constructors folded over the raw SUT,
//! innermost first:
//!
//! 1. process wrapper (if a launch command is configured)
//! 2. adapter wrapper (if a launcher port is configured)
//! 3. liveness wrapper
//! 4. counters
//! 5. caller layers (time limit, test limit, logging, custom) in call order

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use sonar_types::{CleanupTasks, InputSymbol, LivenessTracker, OutputBuilder, OutputSymbol};

use crate::adapter::LauncherAdapter;
use crate::builder::SulWrapperFactory;
use crate::config::SulConfig;
use crate::port::SulHandles;
use crate::process::ProcessHandler;
use crate::sul::{BoxedSul, Sul, SulError};
use crate::wrapper::counter::{SulCounters, SulStats};
use crate::wrapper::logging::LogSink;
use crate::wrapper::{
    AdapterWrapper, CounterWrapper, IsAliveWrapper, LoggingWrapper, ProcessWrapper,
    TestLimitWrapper, TimeLimitWrapper,
};

#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    #[error("Launcher adapter port {0} is configured but no adapter was supplied")]
    MissingAdapter(u16),
}

type Layer<M> = Box<dyn FnOnce(BoxedSul<M>, &mut CleanupTasks) -> BoxedSul<M>>;

fn stage<M, F>(f: F) -> Layer<M>
where
    F: FnOnce(BoxedSul<M>, &mut CleanupTasks) -> BoxedSul<M> + 'static,
{
    Box::new(f)
}

/// Collects the layers of a wrapper chain and applies them to a raw SUT.
pub struct SulChainBuilder<M> {
    config: SulConfig,
    adapter: Option<Box<dyn LauncherAdapter>>,
    output_builder: Option<Box<dyn OutputBuilder<M>>>,
    handles: SulHandles,
    counters: SulCounters,
    layers: Vec<(&'static str, Layer<M>)>,
    time_limit_set: bool,
    test_limit_set: bool,
}

impl<M> SulChainBuilder<M>
where
    M: Clone + std::fmt::Debug + 'static,
{
    pub fn new(config: &SulConfig) -> Self {
        Self {
            config: config.clone(),
            adapter: None,
            output_builder: None,
            handles: SulHandles::default(),
            counters: SulCounters::new(),
            layers: Vec::new(),
            time_limit_set: false,
            test_limit_set: false,
        }
    }

    /// Supply the launcher adapter used when `adapter_port` is configured.
    pub fn with_adapter(mut self, adapter: Box<dyn LauncherAdapter>) -> Self {
        self.adapter = Some(adapter);
        self
    }

    /// Protocol output builder used when the chain substitutes outputs of a
    /// dead SUT.
    pub fn output_builder(&mut self, builder: impl OutputBuilder<M> + 'static) -> &mut Self {
        self.output_builder = Some(Box::new(builder));
        self
    }

    pub fn handles(&self) -> &SulHandles {
        &self.handles
    }

    pub fn counters(&self) -> &SulCounters {
        &self.counters
    }

    /// Stop the run once `limit` has elapsed. Can be set once.
    pub fn time_limit(&mut self, limit: Duration) -> &mut Self {
        if self.time_limit_set {
            tracing::warn!(limit_ms = limit.as_millis() as u64, "time limit already set, ignoring");
            return self;
        }
        self.time_limit_set = true;
        self.layers.push((
            "time limit",
            stage(move |sul, _| Box::new(TimeLimitWrapper::new(sul, limit))),
        ));
        self
    }

    /// Stop the run after `limit` tests. Can be set once.
    pub fn test_limit(&mut self, limit: u64) -> &mut Self {
        if self.test_limit_set {
            tracing::warn!(limit, "test limit already set, ignoring");
            return self;
        }
        self.test_limit_set = true;
        self.layers.push((
            "test limit",
            stage(move |sul, _| Box::new(TestLimitWrapper::new(sul, limit))),
        ));
        self
    }

    /// Mirror traffic at this point of the chain to `sink`.
    pub fn logging(&mut self, prefix: impl Into<String>, sink: impl LogSink + 'static) -> &mut Self {
        let prefix = prefix.into();
        self.layers.push((
            "logging",
            stage(move |sul, _| Box::new(LoggingWrapper::new(sul, prefix, Box::new(sink)))),
        ));
        self
    }

    /// Apply a caller-defined layer at this point of the chain.
    pub fn wrap_with(
        &mut self,
        name: &'static str,
        factory: impl SulWrapperFactory<M> + 'static,
    ) -> &mut Self {
        self.layers
            .push((name, stage(move |sul, _| factory.wrap(sul))));
        self
    }

    /// Wrap `raw` with every configured layer.
    pub fn build(
        self,
        mut raw: BoxedSul<M>,
        cleanup: &mut CleanupTasks,
    ) -> Result<WrappedSul<M>, ChainError> {
        let Self {
            config,
            adapter,
            output_builder,
            handles,
            counters,
            layers,
            ..
        } = self;

        let adapter = match (config.adapter_port, adapter) {
            (Some(port), None) => return Err(ChainError::MissingAdapter(port)),
            (Some(_), Some(adapter)) => Some(adapter),
            (None, Some(_)) => {
                tracing::warn!("launcher adapter supplied without adapter_port, ignoring");
                None
            }
            (None, None) => None,
        };

        raw.attach(&handles);

        let mut stages: Vec<(&'static str, Layer<M>)> = Vec::new();
        if let Some(handler) = ProcessHandler::from_config(&config) {
            let trigger = config.process_trigger;
            let liveness = handles.liveness.clone();
            stages.push((
                "process",
                stage(move |sul, cleanup| {
                    let handler = Arc::new(Mutex::new(handler));
                    let shared = handler.clone();
                    cleanup.push("terminate SUT process", move || {
                        shared
                            .lock()
                            .unwrap_or_else(PoisonError::into_inner)
                            .terminate()
                    });
                    Box::new(ProcessWrapper::new(sul, handler, trigger, liveness))
                }),
            ));
        }
        if let Some(adapter) = adapter {
            let port = handles.port.clone();
            let liveness = handles.liveness.clone();
            stages.push((
                "adapter",
                stage(move |sul, _| Box::new(AdapterWrapper::new(sul, adapter, port, liveness))),
            ));
        }
        let liveness = handles.liveness.clone();
        let mapper_config = config.mapper.clone();
        stages.push((
            "liveness",
            stage(move |sul, _| {
                let wrapper = IsAliveWrapper::new(sul, liveness, mapper_config);
                match output_builder {
                    Some(builder) => Box::new(wrapper.with_builder(builder)),
                    None => Box::new(wrapper),
                }
            }),
        ));
        let shared_counters = counters.clone();
        stages.push((
            "counters",
            stage(move |sul, _| Box::new(CounterWrapper::new(sul, shared_counters))),
        ));
        stages.extend(layers);

        let sul = stages.into_iter().fold(raw, |sul, (name, apply)| {
            tracing::debug!(layer = name, "wrapping SUT");
            apply(sul, &mut *cleanup)
        });

        Ok(WrappedSul {
            sul,
            counters,
            handles,
        })
    }
}

/// The fully wrapped SUT, with access to its shared handles.
pub struct WrappedSul<M> {
    sul: BoxedSul<M>,
    counters: SulCounters,
    handles: SulHandles,
}

impl<M> WrappedSul<M> {
    pub fn counters(&self) -> &SulCounters {
        &self.counters
    }

    pub fn stats(&self) -> SulStats {
        self.counters.stats()
    }

    pub fn liveness(&self) -> &LivenessTracker {
        &self.handles.liveness
    }

    pub fn into_inner(self) -> BoxedSul<M> {
        self.sul
    }
}

impl<M: Clone + std::fmt::Debug> Sul for WrappedSul<M> {
    type Message = M;

    fn pre(&mut self) -> Result<(), SulError> {
        self.sul.pre()
    }

    fn post(&mut self) -> Result<(), SulError> {
        self.sul.post()
    }

    fn step(&mut self, input: &InputSymbol) -> Result<OutputSymbol<M>, SulError> {
        self.sul.step(input)
    }
}
