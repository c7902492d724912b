//! The log stream.
//!
//! `EventLog` owns the subscriber and the underlying sink. Nothing is
//! installed globally: components run under `EventLog::dispatch()` via
//! `WithSubscriber`, and dropping the handle flushes and releases the file.

use parking_lot::Mutex;
use std::fs::OpenOptions;
use std::io;
use std::path::Path;
use std::sync::Arc;
use tracing::Dispatch;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

pub struct EventLog {
    dispatch: Dispatch,
    _guard: Option<WorkerGuard>,
}

impl EventLog {
    /// Append to the log file at `path`, creating it if needed. `RUST_LOG`
    /// takes precedence over `level`.
    pub fn open(path: &Path, level: &str) -> anyhow::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let (writer, guard) = tracing_appender::non_blocking(file);

        let filter = match EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(_) => EnvFilter::try_new(level)?,
        };

        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(writer)
            .with_ansi(false)
            .with_target(false)
            .finish();

        Ok(EventLog {
            dispatch: Dispatch::new(subscriber),
            _guard: Some(guard),
        })
    }

    /// Render the stream into memory instead of a file
    pub fn in_memory(level: &str) -> (Self, MemoryLog) {
        let buffer = MemoryLog::default();
        let writer = buffer.clone();

        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::new(level))
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_target(false)
            .finish();

        let log = EventLog {
            dispatch: Dispatch::new(subscriber),
            _guard: None,
        };
        (log, buffer)
    }

    pub fn dispatch(&self) -> Dispatch {
        self.dispatch.clone()
    }
}

/// Shared buffer holding a rendered log stream
#[derive(Clone, Default)]
pub struct MemoryLog(Arc<Mutex<Vec<u8>>>);

impl MemoryLog {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }
}

impl io::Write for MemoryLog {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_capture() {
        let (log, buffer) = EventLog::in_memory("info");

        tracing::dispatcher::with_default(&log.dispatch(), || {
            tracing::info!("Worker-1 started");
            tracing::debug!("filtered out");
        });

        let lines = buffer.lines();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("INFO"));
        assert!(lines[0].ends_with("Worker-1 started"));
    }

    #[test]
    fn test_open_appends_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pool.log");
        std::fs::write(&path, "earlier run\n").unwrap();

        {
            let log = EventLog::open(&path, "info").unwrap();
            tracing::dispatcher::with_default(&log.dispatch(), || {
                tracing::info!("Processing done");
            });
        }

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("earlier run\n"));
        assert!(contents.contains("Processing done"));
    }

    #[test]
    fn test_open_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("pool.log");
        assert!(EventLog::open(&path, "info").is_err());
    }
}
