//! Collaborator seams: how a protocol supplies its raw SUT and extra wrappers.

use sonar_types::CleanupTasks;

use crate::config::SulConfig;
use crate::sul::{BoxedSul, SulError};

/// Builds the innermost SUT for a configuration.
///
/// Release actions for anything acquired while building go into `cleanup`.
pub trait SulBuilder<M> {
    fn build(&self, config: &SulConfig, cleanup: &mut CleanupTasks) -> Result<BoxedSul<M>, SulError>;
}

impl<M, F> SulBuilder<M> for F
where
    F: Fn(&SulConfig, &mut CleanupTasks) -> Result<BoxedSul<M>, SulError>,
{
    fn build(&self, config: &SulConfig, cleanup: &mut CleanupTasks) -> Result<BoxedSul<M>, SulError> {
        self(config, cleanup)
    }
}

/// Decorates a SUT with a caller-defined layer.
pub trait SulWrapperFactory<M> {
    fn wrap(&self, sul: BoxedSul<M>) -> BoxedSul<M>;
}

impl<M, F> SulWrapperFactory<M> for F
where
    F: Fn(BoxedSul<M>) -> BoxedSul<M>,
{
    fn wrap(&self, sul: BoxedSul<M>) -> BoxedSul<M> {
        self(sul)
    }
}
