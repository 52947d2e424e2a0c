pub mod adapter;
pub mod builder;
pub mod chain;
pub mod config;
pub mod mapped;
pub mod port;
pub mod process;
pub mod sul;
pub mod wrapper;

pub use adapter::{LauncherAdapter, TcpLauncherClient};
pub use builder::{SulBuilder, SulWrapperFactory};
pub use chain::{ChainError, SulChainBuilder, WrappedSul};
pub use config::{ProcessTrigger, SulConfig};
pub use mapped::{MapperSul, SessionFactory};
pub use port::{DynamicPortProvider, SharedPort, SulHandles};
pub use process::ProcessHandler;
pub use sul::{BoxedSul, LimitKind, Sul, SulError};
pub use wrapper::counter::{SulCounters, SulStats};
pub use wrapper::logging::{LogSink, MemorySink, TracingSink};
