use crate::collector::{Collector, CollectorReport};
use crate::config::PoolConfig;
use crate::dispatcher::{Dispatcher, TaskSource};
use futures::future::join_all;
use std::fmt;
use std::sync::Arc;
use taskpool_core::{queue, PoolError, Result, Task, TaskResult, WorkerId};
use taskpool_worker::{TaskHandler, Worker, WorkerReport};
use tokio::io::AsyncWrite;
use tracing::instrument::WithSubscriber;
use tracing::{debug, error, info, Dispatch};

/// Lifecycle phases of a pool run, in the only order they may occur
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    WorkersStarted,
    Dispatching,
    DrainingWorkers,
    WorkersDone,
    ClosingResults,
    DrainingCollector,
    Done,
}

impl Phase {
    pub fn next(&self) -> Option<Phase> {
        match self {
            Phase::Idle => Some(Phase::WorkersStarted),
            Phase::WorkersStarted => Some(Phase::Dispatching),
            Phase::Dispatching => Some(Phase::DrainingWorkers),
            Phase::DrainingWorkers => Some(Phase::WorkersDone),
            Phase::WorkersDone => Some(Phase::ClosingResults),
            Phase::ClosingResults => Some(Phase::DrainingCollector),
            Phase::DrainingCollector => Some(Phase::Done),
            Phase::Done => None,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Tracks the current phase and refuses any skipped or reordered step
#[derive(Debug)]
pub struct Lifecycle {
    phase: Phase,
    history: Vec<Phase>,
}

impl Lifecycle {
    pub fn new() -> Self {
        Lifecycle {
            phase: Phase::Idle,
            history: vec![Phase::Idle],
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn history(&self) -> &[Phase] {
        &self.history
    }

    pub fn advance(&mut self, next: Phase) -> Result<()> {
        if self.phase.next() != Some(next) {
            return Err(PoolError::InvalidTransition {
                from: self.phase.to_string(),
                to: next.to_string(),
            });
        }
        debug!("Lifecycle: {} -> {}", self.phase, next);
        self.phase = next;
        self.history.push(next);
        Ok(())
    }

    fn into_history(self) -> Vec<Phase> {
        self.history
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

/// Summary of a completed run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub submitted: usize,
    pub processed: usize,
    pub faulted: usize,
    pub persisted: usize,
    pub workers: Vec<WorkerReport>,
    pub collector: CollectorReport,
    pub phases: Vec<Phase>,
}

/// Owns the pool lifecycle: starts the workers and the collector, feeds the
/// task queue, and closes both queues in order
pub struct Coordinator {
    config: PoolConfig,
    handler: Arc<dyn TaskHandler>,
    dispatch: Dispatch,
}

impl Coordinator {
    pub fn new(config: PoolConfig, handler: Arc<dyn TaskHandler>, dispatch: Dispatch) -> Self {
        Coordinator {
            config,
            handler,
            dispatch,
        }
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Run the pipeline to completion, persisting results into `sink`.
    ///
    /// The sink is opened by the caller so that a failure to open it happens
    /// before any worker starts.
    pub async fn run<W>(&self, sink: W) -> Result<RunReport>
    where
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let dispatcher = Dispatcher::new(self.config.label_template.clone(), self.config.tasks);
        self.run_with_source(&dispatcher, sink).await
    }

    /// Run the pipeline with a custom task source.
    ///
    /// If the source fails, the pool still walks every remaining phase so
    /// that submitted tasks are processed and persisted; the source's error
    /// is returned afterwards.
    pub async fn run_with_source<W>(&self, source: &dyn TaskSource, sink: W) -> Result<RunReport>
    where
        W: AsyncWrite + Unpin + Send + 'static,
    {
        self.config.validate()?;
        self.run_phases(source, sink)
            .with_subscriber(self.dispatch.clone())
            .await
    }

    async fn run_phases<W>(&self, source: &dyn TaskSource, sink: W) -> Result<RunReport>
    where
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let worker_count = u32::try_from(self.config.workers)
            .map_err(|_| PoolError::Config(format!("too many workers: {}", self.config.workers)))?;

        let mut lifecycle = Lifecycle::new();
        let mut failure = None;
        let capacity = self.config.queue_capacity;
        let (task_tx, task_rx) = queue::<Task>("task queue", capacity);
        let (result_tx, result_rx) = queue::<TaskResult>("result queue", capacity);

        let worker_handles: Vec<_> = (1..=worker_count)
            .map(|n| {
                let worker = Worker::new(
                    WorkerId::new(n),
                    self.handler.clone(),
                    task_rx.clone(),
                    result_tx.clone(),
                );
                tokio::spawn(worker.run().with_subscriber(self.dispatch.clone()))
            })
            .collect();
        // Workers hold the only readers from here on
        drop(task_rx);
        lifecycle.advance(Phase::WorkersStarted)?;
        info!("Started {} workers", worker_handles.len());

        let collector = Collector::new(sink, result_rx);
        let collector_handle = tokio::spawn(collector.run().with_subscriber(self.dispatch.clone()));
        lifecycle.advance(Phase::Dispatching)?;

        let submitted = match source.dispatch(&task_tx).await {
            Ok(submitted) => submitted,
            Err(e) => {
                let submitted = task_tx.stats().enqueued() as usize;
                error!("Dispatch failed after {} tasks: {}", submitted, e);
                failure = Some(e);
                submitted
            }
        };

        task_tx.close();
        lifecycle.advance(Phase::DrainingWorkers)?;
        info!("Submitted {} tasks, task queue closed", submitted);

        let mut workers = Vec::with_capacity(worker_handles.len());
        for joined in join_all(worker_handles).await {
            match joined {
                Ok(report) => workers.push(report),
                Err(e) => error!("Worker terminated abnormally: {}", e),
            }
        }
        lifecycle.advance(Phase::WorkersDone)?;

        result_tx.close();
        lifecycle.advance(Phase::ClosingResults)?;
        debug!("Result queue closed");

        lifecycle.advance(Phase::DrainingCollector)?;
        let collector = match collector_handle.await {
            Ok(report) => report,
            Err(e) => {
                error!("Collector terminated abnormally: {}", e);
                failure.get_or_insert(PoolError::Join(e.to_string()));
                CollectorReport::default()
            }
        };

        lifecycle.advance(Phase::Done)?;
        info!("Processing done");

        if let Some(e) = failure {
            return Err(e);
        }

        Ok(RunReport {
            submitted,
            processed: workers.iter().map(|w| w.processed).sum(),
            faulted: workers.iter().map(|w| w.faulted).sum(),
            persisted: collector.written,
            workers,
            collector,
            phases: lifecycle.into_history(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle_walks_every_phase() {
        let mut lifecycle = Lifecycle::new();
        let mut phase = Phase::Idle;
        while let Some(next) = phase.next() {
            lifecycle.advance(next).unwrap();
            phase = next;
        }

        assert_eq!(lifecycle.phase(), Phase::Done);
        assert_eq!(lifecycle.history().len(), 8);
        assert_eq!(lifecycle.history().first(), Some(&Phase::Idle));
    }

    #[test]
    fn test_lifecycle_rejects_skipped_step() {
        let mut lifecycle = Lifecycle::new();
        lifecycle.advance(Phase::WorkersStarted).unwrap();
        lifecycle.advance(Phase::Dispatching).unwrap();

        // Closing results before the workers are joined
        match lifecycle.advance(Phase::ClosingResults) {
            Err(PoolError::InvalidTransition { from, to }) => {
                assert_eq!(from, "Dispatching");
                assert_eq!(to, "ClosingResults");
            }
            other => panic!("Expected InvalidTransition, got {:?}", other),
        }
        assert_eq!(lifecycle.phase(), Phase::Dispatching);
    }

    #[test]
    fn test_lifecycle_rejects_going_back() {
        let mut lifecycle = Lifecycle::new();
        lifecycle.advance(Phase::WorkersStarted).unwrap();
        assert!(lifecycle.advance(Phase::Idle).is_err());
        assert!(lifecycle.advance(Phase::WorkersStarted).is_err());
    }
}
