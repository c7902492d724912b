pub mod config;
pub mod dispatcher;
pub mod collector;
pub mod coordinator;
pub mod logging;

pub use config::PoolConfig;
pub use dispatcher::{Dispatcher, TaskSource};
pub use collector::{Collector, CollectorReport};
pub use coordinator::{Coordinator, Lifecycle, Phase, RunReport};
pub use logging::{EventLog, MemoryLog};
