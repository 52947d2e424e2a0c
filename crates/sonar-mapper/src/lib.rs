pub mod coalesce;
pub mod config;
pub mod input;
pub mod mapper;
pub mod output;
pub mod timing;

pub use coalesce::{coalesce_outputs, merge_names, CoalesceError};
pub use config::MapperConfig;
pub use input::InputMapper;
pub use mapper::{Mapper, MapperError};
pub use output::{OutputMapper, Reception};
pub use timing::ResponseTiming;
