use crate::executor::{TaskExecutor, TaskFault};
use crate::handler::TaskHandler;
use std::sync::Arc;
use taskpool_core::{ResultSender, Task, TaskReceiver, TaskResult, WorkerId};
use tracing::{error, info};

/// What a worker did before it exited
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerReport {
    pub id: WorkerId,
    pub processed: usize,
    pub faulted: usize,
}

/// Pulls tasks from the task queue until it is closed and drained, pushing
/// one result per successful task
pub struct Worker {
    id: WorkerId,
    executor: TaskExecutor,
    tasks: TaskReceiver,
    results: ResultSender,
}

impl Worker {
    pub fn new(
        id: WorkerId,
        handler: Arc<dyn TaskHandler>,
        tasks: TaskReceiver,
        results: ResultSender,
    ) -> Self {
        Worker {
            id,
            executor: TaskExecutor::new(handler),
            tasks,
            results,
        }
    }

    pub fn id(&self) -> WorkerId {
        self.id
    }

    /// Run the worker loop. The result queue is left open; closing it is up
    /// to whoever owns the pool.
    pub async fn run(self) -> WorkerReport {
        info!("{} started", self.id);

        let mut report = WorkerReport {
            id: self.id,
            processed: 0,
            faulted: 0,
        };

        while let Some(task) = self.tasks.recv().await {
            match self.process(task).await {
                Ok(result) => {
                    info!("{}", result);
                    report.processed += 1;
                }
                Err((task, fault)) => {
                    error!(worker = self.id.get(), task = %task, "{} error: {}", self.id, fault);
                    report.faulted += 1;
                }
            }
        }

        info!(
            "{} exiting (processed: {}, faulted: {})",
            self.id, report.processed, report.faulted
        );
        report
    }

    async fn process(&self, task: Task) -> Result<TaskResult, (Task, TaskFault)> {
        if let Err(fault) = self.executor.execute(&task).await {
            return Err((task, fault));
        }

        let result = TaskResult::new(self.id, task);
        if let Err(e) = self.results.send(result.clone()).await {
            return Err((result.task, TaskFault::Failed(e.to_string())));
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{FaultInjector, FixedLatency};
    use std::time::Duration;
    use taskpool_core::queue;

    fn instant() -> FixedLatency {
        FixedLatency::new(Duration::ZERO)
    }

    #[tokio::test]
    async fn test_worker_drains_queue() {
        let (task_tx, task_rx) = queue::<Task>("tasks", None);
        let (result_tx, result_rx) = queue::<TaskResult>("results", None);

        for i in 1..=3 {
            task_tx.send(Task::new(format!("RideRequest#{}", i))).await.unwrap();
        }
        task_tx.close();

        let worker = Worker::new(WorkerId::new(1), Arc::new(instant()), task_rx, result_tx.clone());
        let report = worker.run().await;

        assert_eq!(report.processed, 3);
        assert_eq!(report.faulted, 0);

        // Worker exit leaves the result queue open
        assert!(!result_tx.is_closed());
        result_tx.close();

        let mut lines = Vec::new();
        while let Some(result) = result_rx.recv().await {
            lines.push(result.to_line());
        }
        assert_eq!(
            lines,
            vec![
                "Worker-1 processed: RideRequest#1",
                "Worker-1 processed: RideRequest#2",
                "Worker-1 processed: RideRequest#3",
            ]
        );
    }

    #[tokio::test]
    async fn test_worker_skips_faulted_task() {
        let (task_tx, task_rx) = queue::<Task>("tasks", None);
        let (result_tx, result_rx) = queue::<TaskResult>("results", None);

        for label in ["a", "b", "c"] {
            task_tx.send(Task::new(label)).await.unwrap();
        }
        task_tx.close();

        let handler = FaultInjector::new(instant(), ["b"]);
        let report = Worker::new(WorkerId::new(2), Arc::new(handler), task_rx, result_tx.clone())
            .run()
            .await;

        assert_eq!(report.processed, 2);
        assert_eq!(report.faulted, 1);

        result_tx.close();
        let mut labels = Vec::new();
        while let Some(result) = result_rx.recv().await {
            assert_eq!(result.worker, WorkerId::new(2));
            labels.push(result.task.label().to_string());
        }
        assert_eq!(labels, vec!["a", "c"]);
    }

    #[tokio::test]
    async fn test_closed_result_queue_counts_as_fault() {
        let (task_tx, task_rx) = queue::<Task>("tasks", None);
        let (result_tx, _result_rx) = queue::<TaskResult>("results", None);

        task_tx.send(Task::new("late")).await.unwrap();
        task_tx.close();
        result_tx.close();

        let report = Worker::new(WorkerId::new(3), Arc::new(instant()), task_rx, result_tx)
            .run()
            .await;

        assert_eq!(report.processed, 0);
        assert_eq!(report.faulted, 1);
    }
}
