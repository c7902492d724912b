use std::fmt;

/// Identity of a worker, assigned at startup (1-based)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WorkerId(u32);

impl WorkerId {
    pub fn new(id: u32) -> Self {
        WorkerId(id)
    }

    pub fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Worker-{}", self.0)
    }
}

/// A unit of work, identified by its label
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Task {
    label: String,
}

impl Task {
    pub fn new(label: impl Into<String>) -> Self {
        Task {
            label: label.into(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

/// Record produced by a worker after successfully processing a task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskResult {
    /// Worker that processed the task
    pub worker: WorkerId,

    /// The originating task
    pub task: Task,
}

impl TaskResult {
    pub fn new(worker: WorkerId, task: Task) -> Self {
        TaskResult { worker, task }
    }

    /// Render the result as one output line, without the trailing newline
    pub fn to_line(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for TaskResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} processed: {}", self.worker, self.task)
    }
}
