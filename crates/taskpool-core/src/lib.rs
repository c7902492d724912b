mod task;
mod error;
pub mod queue;

pub use task::{Task, TaskResult, WorkerId};
pub use error::{PoolError, Result};
pub use queue::{queue, QueueReceiver, QueueSender, QueueStats};

/// Channel carrying tasks from the dispatcher to the workers
pub type TaskSender = QueueSender<Task>;
pub type TaskReceiver = QueueReceiver<Task>;

/// Channel carrying results from the workers to the collector
pub type ResultSender = QueueSender<TaskResult>;
pub type ResultReceiver = QueueReceiver<TaskResult>;
