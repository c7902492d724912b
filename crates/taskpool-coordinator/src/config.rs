use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use taskpool_core::{PoolError, Result};

/// Placeholder replaced by the task number in `label_template`
pub const LABEL_PLACEHOLDER: &str = "{n}";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Number of concurrent workers
    pub workers: usize,

    /// Number of tasks the dispatcher submits
    pub tasks: usize,

    /// Simulated per-task latency range, in milliseconds
    pub latency_min_ms: u64,
    pub latency_max_ms: u64,

    /// Task label template, `{n}` is the 1-based task number
    pub label_template: String,

    /// Capacity of both queues (unbounded when absent)
    pub queue_capacity: Option<usize>,

    pub log_file: PathBuf,
    pub output_file: PathBuf,
    pub log_level: String,

    /// Labels whose processing should fault
    pub fail_tasks: Vec<String>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        PoolConfig {
            workers: 5,
            tasks: 20,
            latency_min_ms: 500,
            latency_max_ms: 999,
            label_template: "RideRequest#{n}".to_string(),
            queue_capacity: None,
            log_file: PathBuf::from("rideshare.log"),
            output_file: PathBuf::from("output.txt"),
            log_level: "info".to_string(),
            fail_tasks: vec![],
        }
    }
}

impl PoolConfig {
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: PoolConfig = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(PoolError::Config("workers must be at least 1".to_string()));
        }
        if u32::try_from(self.workers).is_err() {
            return Err(PoolError::Config(format!(
                "workers must be at most {}, got {}",
                u32::MAX,
                self.workers
            )));
        }
        if self.latency_min_ms > self.latency_max_ms {
            return Err(PoolError::Config(format!(
                "latency range is inverted: {}..{} ms",
                self.latency_min_ms, self.latency_max_ms
            )));
        }
        if !self.label_template.contains(LABEL_PLACEHOLDER) {
            return Err(PoolError::Config(format!(
                "label template {:?} has no {} placeholder",
                self.label_template, LABEL_PLACEHOLDER
            )));
        }
        if self.queue_capacity == Some(0) {
            return Err(PoolError::Config("queue capacity must be at least 1".to_string()));
        }
        Ok(())
    }
}
