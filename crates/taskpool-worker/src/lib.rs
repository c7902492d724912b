pub mod worker;
pub mod handler;
pub mod executor;

pub use worker::{Worker, WorkerReport};
pub use handler::{FaultInjector, FixedLatency, SimulatedLatency, TaskHandler};
pub use executor::{TaskExecutor, TaskFault};
