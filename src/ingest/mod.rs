//! Ingestion pipeline: structure scan, chunked transformation, batch dispatch

pub mod processor;
pub mod scanner;

pub use processor::ChunkedProcessor;
pub use scanner::FileScan;

use thiserror::Error;

use crate::store::WriteSummary;

/// Run-terminating ingestion failures.
///
/// Row-scoped problems never surface here; only unreadable sources and
/// structural file defects end a run.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("header row at position {0} is empty")]
    EmptyHeader(usize),

    #[error("file ended before the header row at position {0}")]
    HeaderNotFound(usize),
}

/// Counters for one ingest run
#[derive(Debug, Clone, Default)]
pub struct IngestStats {
    /// Rows read from the file, header included
    pub rows_read: usize,
    /// Rows that became valid upsert payloads
    pub records_valid: usize,
    /// Rows captured as invalid records
    pub records_invalid: usize,
    /// Rows outside the data range, blank, or dropped on construction errors
    pub rows_skipped: usize,
    /// Chunks dispatched to the store
    pub chunks_flushed: usize,
    /// Batch writes that failed (logged, never retried)
    pub flush_errors: usize,
    /// Aggregated counts reported by the upsert batches
    pub writes: WriteSummary,
    /// Wall-clock processing time in seconds
    pub elapsed_seconds: f64,
    /// Rows read per second
    pub rows_per_second: f64,
}

impl IngestStats {
    pub fn update_rate(&mut self) {
        if self.elapsed_seconds > 0.0 {
            self.rows_per_second = self.rows_read as f64 / self.elapsed_seconds;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_reflects_rows_over_elapsed() {
        let mut stats = IngestStats {
            rows_read: 500,
            elapsed_seconds: 2.0,
            ..Default::default()
        };
        stats.update_rate();
        assert!((stats.rows_per_second - 250.0).abs() < f64::EPSILON);
    }

    #[test]
    fn rate_stays_zero_without_elapsed_time() {
        let mut stats = IngestStats {
            rows_read: 500,
            ..Default::default()
        };
        stats.update_rate();
        assert_eq!(stats.rows_per_second, 0.0);
    }
}
