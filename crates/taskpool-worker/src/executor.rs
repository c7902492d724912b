//! Per-task recovery boundary.

use crate::handler::TaskHandler;
use std::any::Any;
use std::sync::Arc;
use taskpool_core::Task;
use thiserror::Error;
use tracing::instrument::WithSubscriber;

/// Why a single task produced no result
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskFault {
    #[error("task failed: {0}")]
    Failed(String),

    #[error("task panicked: {0}")]
    Panicked(String),

    #[error("task was cancelled")]
    Cancelled,
}

/// Runs the handler for one task and turns every failure, panics included,
/// into a `TaskFault`
#[derive(Clone)]
pub struct TaskExecutor {
    handler: Arc<dyn TaskHandler>,
}

impl TaskExecutor {
    pub fn new(handler: Arc<dyn TaskHandler>) -> Self {
        TaskExecutor { handler }
    }

    pub async fn execute(&self, task: &Task) -> Result<(), TaskFault> {
        let handler = self.handler.clone();
        let task = task.clone();

        // The handler runs in its own task so a panic stays contained here
        let handle = tokio::spawn(
            async move { handler.handle(&task).await }.with_current_subscriber(),
        );

        match handle.await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(detail)) => Err(TaskFault::Failed(detail)),
            Err(e) if e.is_panic() => Err(TaskFault::Panicked(panic_message(e.into_panic()))),
            Err(_) => Err(TaskFault::Cancelled),
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_string()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{FaultInjector, FixedLatency, HandlerResult};
    use async_trait::async_trait;
    use std::time::Duration;

    struct PanicHandler;

    #[async_trait]
    impl TaskHandler for PanicHandler {
        async fn handle(&self, task: &Task) -> HandlerResult {
            panic!("boom on {}", task);
        }
    }

    #[tokio::test]
    async fn test_executor_success() {
        let executor = TaskExecutor::new(Arc::new(FixedLatency::new(Duration::ZERO)));
        assert_eq!(executor.execute(&Task::new("RideRequest#1")).await, Ok(()));
    }

    #[tokio::test]
    async fn test_executor_failure() {
        let handler = FaultInjector::new(FixedLatency::new(Duration::ZERO), ["RideRequest#2"]);
        let executor = TaskExecutor::new(Arc::new(handler));

        match executor.execute(&Task::new("RideRequest#2")).await {
            Err(TaskFault::Failed(detail)) => assert!(detail.contains("RideRequest#2")),
            other => panic!("Expected Failed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_executor_recovers_from_panic() {
        let executor = TaskExecutor::new(Arc::new(PanicHandler));

        match executor.execute(&Task::new("RideRequest#3")).await {
            Err(TaskFault::Panicked(message)) => assert_eq!(message, "boom on RideRequest#3"),
            other => panic!("Expected Panicked, got {:?}", other),
        }

        // The executor stays usable after a panic
        match executor.execute(&Task::new("RideRequest#4")).await {
            Err(TaskFault::Panicked(_)) => {}
            other => panic!("Expected Panicked, got {:?}", other),
        }
    }
}
