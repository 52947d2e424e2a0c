pub mod config;
pub mod listener;

pub use config::ListenerConfig;
pub use listener::{CommandListener, ListenerError, MAX_LINE_LEN};
