//! Assembly of a configured SUT and the drivers running against it.

use std::fmt::Debug;

use sonar_listener::{CommandListener, ListenerError};
use sonar_probe::{ProbeError, ProbeReport, TimingProbe};
use sonar_sul::{
    BoxedSul, ChainError, SulBuilder, SulChainBuilder, SulConfig, SulError, TcpLauncherClient,
    WrappedSul,
};
use sonar_types::{Alphabet, CleanupTasks, InputSymbol};

use crate::config::SonarConfig;

#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error(transparent)]
    Sul(#[from] SulError),

    #[error(transparent)]
    Chain(#[from] ChainError),

    #[error(transparent)]
    Listener(#[from] ListenerError),

    #[error(transparent)]
    Probe(#[from] ProbeError),
}

/// Build the raw SUT with `builder` and wrap it in the configured chain.
pub fn build_wrapped_sul<M>(
    config: &SulConfig,
    builder: &dyn SulBuilder<M>,
    cleanup: &mut CleanupTasks,
) -> Result<WrappedSul<M>, SetupError>
where
    M: Clone + Debug + 'static,
{
    build_wrapped_sul_with(config, builder, cleanup, |_| {})
}

/// Like `build_wrapped_sul`; `customize` adds logging or custom layers
/// outside the configured ones.
pub fn build_wrapped_sul_with<M>(
    config: &SulConfig,
    builder: &dyn SulBuilder<M>,
    cleanup: &mut CleanupTasks,
    customize: impl FnOnce(&mut SulChainBuilder<M>),
) -> Result<WrappedSul<M>, SetupError>
where
    M: Clone + Debug + 'static,
{
    let raw = builder.build(config, cleanup)?;
    Ok(wrap(config, raw, cleanup, customize)?)
}

fn wrap<M>(
    config: &SulConfig,
    raw: BoxedSul<M>,
    cleanup: &mut CleanupTasks,
    customize: impl FnOnce(&mut SulChainBuilder<M>),
) -> Result<WrappedSul<M>, ChainError>
where
    M: Clone + Debug + 'static,
{
    let mut chain = SulChainBuilder::new(config);
    if let Some(port) = config.adapter_port {
        chain = chain.with_adapter(Box::new(TcpLauncherClient::new(
            config.adapter_address.clone(),
            port,
        )));
    }
    if let Some(limit) = config.time_limit() {
        chain.time_limit(limit);
    }
    if let Some(limit) = config.test_limit {
        chain.test_limit(limit);
    }
    customize(&mut chain);
    chain.build(raw, cleanup)
}

/// A `SulBuilder` producing fully wrapped SUTs from a raw builder.
pub struct ChainedBuilder<B> {
    raw: B,
}

impl<B> ChainedBuilder<B> {
    pub fn new(raw: B) -> Self {
        Self { raw }
    }
}

impl<M, B> SulBuilder<M> for ChainedBuilder<B>
where
    M: Clone + Debug + 'static,
    B: SulBuilder<M>,
{
    fn build(&self, config: &SulConfig, cleanup: &mut CleanupTasks) -> Result<BoxedSul<M>, SulError> {
        let raw = self.raw.build(config, cleanup)?;
        let wrapped = wrap(config, raw, cleanup, |_| {})?;
        Ok(Box::new(wrapped))
    }
}

/// Build the configured SUT and bind a command listener over it.
pub fn bind_listener<M>(
    config: &SonarConfig,
    builder: &dyn SulBuilder<M>,
    alphabet: Alphabet,
) -> Result<CommandListener<WrappedSul<M>>, SetupError>
where
    M: Clone + Debug + 'static,
{
    let mut cleanup = CleanupTasks::new();
    let sul = build_wrapped_sul(&config.sul, builder, &mut cleanup)?;
    Ok(CommandListener::bind(
        config.listener.clone(),
        sul,
        alphabet,
        cleanup,
    )?)
}

/// Serve the command protocol until the listener terminates.
pub fn serve_commands<M>(
    config: &SonarConfig,
    builder: &dyn SulBuilder<M>,
    alphabet: Alphabet,
) -> Result<(), SetupError>
where
    M: Clone + Debug + 'static,
{
    bind_listener(config, builder, alphabet)?.run()?;
    Ok(())
}

/// Probe the configured timing parameters. Each candidate value runs
/// `tests` against a freshly built and wrapped SUT.
pub fn probe_timing<M, B>(
    config: &SonarConfig,
    builder: B,
    alphabet: &Alphabet,
    tests: Vec<Vec<InputSymbol>>,
) -> Result<ProbeReport, SetupError>
where
    M: Clone + Debug + 'static,
    B: SulBuilder<M>,
{
    let probe = TimingProbe::new(
        config.probe.clone(),
        alphabet,
        ChainedBuilder::new(builder),
        tests,
    )?;
    let report = probe.run::<M>(&config.sul)?;
    tracing::info!(checks = report.checks, "timing probe finished");
    Ok(report)
}
