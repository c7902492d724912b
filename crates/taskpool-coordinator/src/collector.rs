use taskpool_core::ResultReceiver;
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};
use tracing::{debug, error};

/// Outcome of draining the result queue
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollectorReport {
    /// Results taken off the queue
    pub received: usize,

    /// Results confirmed on the sink by a successful flush
    pub written: usize,

    /// Results whose write or flush failed
    pub failed: usize,

    /// Whether the final flush succeeded
    pub flushed: bool,
}

/// Sole reader of the result queue and sole owner of the output sink
pub struct Collector<W: AsyncWrite + Unpin> {
    sink: BufWriter<W>,
    results: ResultReceiver,
}

impl<W: AsyncWrite + Unpin> Collector<W> {
    pub fn new(sink: W, results: ResultReceiver) -> Self {
        Collector {
            sink: BufWriter::new(sink),
            results,
        }
    }

    /// Use a specific buffer size; 0 writes every line straight through
    #[cfg(test)]
    fn with_buffer_capacity(capacity: usize, sink: W, results: ResultReceiver) -> Self {
        Collector {
            sink: BufWriter::with_capacity(capacity, sink),
            results,
        }
    }

    /// Append one line per result until the queue is closed and drained,
    /// then flush. Write failures are logged and skipped.
    ///
    /// A line only counts as written once the flush that covers it succeeds;
    /// until then it is pending in the buffer.
    pub async fn run(mut self) -> CollectorReport {
        let mut report = CollectorReport::default();
        let mut pending = 0;

        while let Some(result) = self.results.recv().await {
            report.received += 1;

            let mut line = result.to_line();
            line.push('\n');

            match self.sink.write_all(line.as_bytes()).await {
                Ok(()) => pending += 1,
                Err(e) => {
                    error!("Error writing result {:?}: {}", result.to_line(), e);
                    report.failed += 1;
                }
            }
        }

        match self.sink.flush().await {
            Ok(()) => {
                report.flushed = true;
                report.written += pending;
            }
            Err(e) => {
                error!("Error flushing results, {} lines lost: {}", pending, e);
                report.failed += pending;
            }
        }

        debug!(
            "Collector finished (received: {}, written: {}, failed: {})",
            report.received, report.written, report.failed
        );
        report
    }
}
