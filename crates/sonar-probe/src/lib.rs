pub mod config;
pub mod probe;
pub mod range;
pub mod runner;
pub mod testspec;

pub use config::ProbeConfig;
pub use probe::{ProbeError, ProbeReport, ProbeTarget, TimingProbe};
pub use range::{find_limit, ProbeLimitRange};
pub use runner::{TestRunner, Trace};
pub use testspec::{parse_tests, read_test_file, TestFileError};
