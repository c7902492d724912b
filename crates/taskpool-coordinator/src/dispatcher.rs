use crate::config::LABEL_PLACEHOLDER;
use async_trait::async_trait;
use taskpool_core::{Result, Task, TaskSender};
use tracing::debug;

/// Feeds the task queue. Implementations submit in their own order and
/// never close the queue.
#[async_trait]
pub trait TaskSource: Send + Sync {
    /// Submit tasks and return how many were submitted
    async fn dispatch(&self, queue: &TaskSender) -> Result<usize>;
}

/// Feeds sequentially numbered tasks into the task queue
pub struct Dispatcher {
    template: String,
    count: usize,
}

impl Dispatcher {
    pub fn new(template: impl Into<String>, count: usize) -> Self {
        Dispatcher {
            template: template.into(),
            count,
        }
    }

    /// Labels in submission order, numbered from 1
    pub fn labels(&self) -> impl Iterator<Item = String> + '_ {
        (1..=self.count).map(move |n| self.template.replace(LABEL_PLACEHOLDER, &n.to_string()))
    }
}

#[async_trait]
impl TaskSource for Dispatcher {
    /// Submit every task in label order, waiting when a bounded queue is full
    async fn dispatch(&self, queue: &TaskSender) -> Result<usize> {
        let mut submitted = 0;
        for label in self.labels() {
            debug!("Submitting {}", label);
            queue.send(Task::new(label)).await?;
            submitted += 1;
        }
        Ok(submitted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskpool_core::queue;

    #[test]
    fn test_labels() {
        let dispatcher = Dispatcher::new("RideRequest#{n}", 3);
        let labels: Vec<_> = dispatcher.labels().collect();
        assert_eq!(labels, vec!["RideRequest#1", "RideRequest#2", "RideRequest#3"]);
    }

    #[tokio::test]
    async fn test_dispatch_preserves_order_and_leaves_queue_open() {
        let (tx, rx) = queue::<Task>("tasks", None);
        let dispatcher = Dispatcher::new("job-{n}", 4);

        assert_eq!(dispatcher.dispatch(&tx).await.unwrap(), 4);
        assert!(!tx.is_closed());

        tx.close();
        let mut labels = Vec::new();
        while let Some(task) = rx.recv().await {
            labels.push(task.label().to_string());
        }
        assert_eq!(labels, vec!["job-1", "job-2", "job-3", "job-4"]);
    }

    #[tokio::test]
    async fn test_dispatch_into_closed_queue_fails() {
        let (tx, _rx) = queue::<Task>("tasks", None);
        tx.close();

        let dispatcher = Dispatcher::new("job-{n}", 1);
        assert!(dispatcher.dispatch(&tx).await.is_err());
    }
}
