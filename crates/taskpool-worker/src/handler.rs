use async_trait::async_trait;
use rand::Rng;
use std::collections::HashSet;
use std::ops::RangeInclusive;
use std::time::Duration;
use taskpool_core::Task;

/// Result type for task handlers; the error carries the fault detail
pub type HandlerResult = Result<(), String>;

/// The processing step a worker applies to each task
#[async_trait]
pub trait TaskHandler: Send + Sync {
    async fn handle(&self, task: &Task) -> HandlerResult;
}

/// Simulates variable-latency work by sleeping for a random duration drawn
/// uniformly from a millisecond range
pub struct SimulatedLatency {
    range_ms: RangeInclusive<u64>,
}

impl SimulatedLatency {
    pub fn new(min_ms: u64, max_ms: u64) -> Self {
        SimulatedLatency {
            range_ms: min_ms.min(max_ms)..=max_ms.max(min_ms),
        }
    }

    fn next_delay(&self) -> Duration {
        let ms = rand::thread_rng().gen_range(self.range_ms.clone());
        Duration::from_millis(ms)
    }
}

impl Default for SimulatedLatency {
    fn default() -> Self {
        SimulatedLatency::new(500, 999)
    }
}

#[async_trait]
impl TaskHandler for SimulatedLatency {
    async fn handle(&self, _task: &Task) -> HandlerResult {
        let delay = self.next_delay();
        tokio::time::sleep(delay).await;
        Ok(())
    }
}

/// Fixed delay, for deterministic runs
pub struct FixedLatency {
    delay: Duration,
}

impl FixedLatency {
    pub fn new(delay: Duration) -> Self {
        FixedLatency { delay }
    }
}

#[async_trait]
impl TaskHandler for FixedLatency {
    async fn handle(&self, _task: &Task) -> HandlerResult {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(())
    }
}

/// Wraps a handler and fails every task whose label is in the fault set
pub struct FaultInjector<H> {
    inner: H,
    faulty: HashSet<String>,
}

impl<H: TaskHandler> FaultInjector<H> {
    pub fn new<I, S>(inner: H, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FaultInjector {
            inner,
            faulty: labels.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_faulty(&self, task: &Task) -> bool {
        self.faulty.contains(task.label())
    }
}

#[async_trait]
impl<H: TaskHandler> TaskHandler for FaultInjector<H> {
    async fn handle(&self, task: &Task) -> HandlerResult {
        if self.is_faulty(task) {
            return Err(format!("injected fault for {}", task));
        }
        self.inner.handle(task).await
    }
}
