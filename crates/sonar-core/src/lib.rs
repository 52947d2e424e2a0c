//! Entry points: configuration loading, wrapper chain assembly, and the
//! command listener and timing probe drivers.

pub mod config;
pub mod setup;

pub use config::{ConfigError, SonarConfig};
pub use setup::{
    bind_listener, build_wrapped_sul, build_wrapped_sul_with, probe_timing, serve_commands,
    ChainedBuilder, SetupError,
};

pub use sonar_listener::{CommandListener, ListenerConfig};
pub use sonar_mapper::MapperConfig;
pub use sonar_probe::{ProbeConfig, ProbeReport};
pub use sonar_sul::{SulConfig, WrappedSul};
