//! Chunked batch processor: row transformation and batch dispatch

use std::io::{Read, Seek};
use std::time::Instant;

use csv::StringRecord;
use tracing::{debug, error, info, warn};

use crate::config::IngestConfig;
use crate::records::{
    Contract, InvalidRecord, Record, RecordKind, RowOutcome, Schema, INVALID_COLLECTION,
};
use crate::store::DocumentStore;

use super::scanner::FileScan;
use super::{IngestError, IngestStats};

/// Partitions a file's rows into fixed-size chunks and dispatches each chunk
/// as one batch write.
///
/// Only one chunk's rows and derived records are held in memory at a time,
/// so peak memory is bounded by chunk size regardless of file size. A failed
/// flush is logged and never blocks subsequent chunks; upsert-by-identifier
/// makes re-running a whole file safe.
pub struct ChunkedProcessor<'a, S> {
    contract: Contract,
    schema: Schema,
    chunk_size: usize,
    strict_fields: bool,
    store: &'a S,
}

impl<'a, S: DocumentStore> ChunkedProcessor<'a, S> {
    pub fn new(kind: RecordKind, config: &IngestConfig, store: &'a S) -> Self {
        Self {
            contract: kind.contract(),
            schema: kind.schema(),
            chunk_size: config.chunk_size,
            strict_fields: config.strict_fields,
            store,
        }
    }

    /// Run the scan pass, then stream the file chunk by chunk.
    pub async fn process<R: Read + Seek>(&self, source: &mut R) -> Result<IngestStats, IngestError> {
        let started = Instant::now();

        let scan = FileScan::run(source, &self.contract)?;
        info!(
            collection = self.contract.collection,
            end_of_data = scan.end_of_data,
            "processing {} rows as {}",
            scan.total_rows,
            self.contract.kind
        );

        let mut stats = IngestStats::default();
        let mut chunk: Vec<(usize, StringRecord)> = Vec::with_capacity(self.chunk_size);

        let mut reader = self.contract.dialect.reader(&mut *source);
        for (row_number, row) in reader.records().enumerate() {
            stats.rows_read += 1;
            match row {
                Ok(row) => chunk.push((row_number, row)),
                Err(e) => {
                    warn!(row_number, error = %e, "unreadable row, skipping");
                    stats.rows_skipped += 1;
                }
            }
            if chunk.len() >= self.chunk_size {
                self.flush_chunk(&scan, &mut chunk, &mut stats).await;
            }
        }
        if !chunk.is_empty() {
            self.flush_chunk(&scan, &mut chunk, &mut stats).await;
        }

        stats.elapsed_seconds = started.elapsed().as_secs_f64();
        stats.update_rate();
        Ok(stats)
    }

    /// Transform one chunk's rows and dispatch both accumulators, then
    /// discard the chunk.
    async fn flush_chunk(
        &self,
        scan: &FileScan,
        chunk: &mut Vec<(usize, StringRecord)>,
        stats: &mut IngestStats,
    ) {
        let mut valid = Vec::new();
        let mut invalid = Vec::new();

        for (row_number, row) in chunk.iter() {
            match self.process_row(scan, *row_number, row) {
                RowOutcome::Valid(record) => valid.push(record),
                RowOutcome::Invalid(record) => invalid.push(record.into_fields()),
                RowOutcome::Skipped => stats.rows_skipped += 1,
            }
        }
        stats.records_valid += valid.len();
        stats.records_invalid += invalid.len();

        if !valid.is_empty() {
            match self.store.bulk_upsert(self.contract.collection, &valid).await {
                Ok(summary) => {
                    debug!(?summary, "flushed valid batch");
                    stats.writes.merge(&summary);
                }
                Err(e) => {
                    error!(
                        collection = self.contract.collection,
                        error = %e,
                        "bulk upsert failed; continuing with the next chunk"
                    );
                    stats.flush_errors += 1;
                }
            }
        }

        if !invalid.is_empty() {
            match self.store.insert_many(INVALID_COLLECTION, &invalid).await {
                Ok(summary) => debug!(?summary, "flushed invalid batch"),
                Err(e) => {
                    error!(
                        collection = INVALID_COLLECTION,
                        error = %e,
                        "invalid-record insert failed; continuing with the next chunk"
                    );
                    stats.flush_errors += 1;
                }
            }
        }

        stats.chunks_flushed += 1;
        chunk.clear();
    }

    /// Transform one row into its outcome. Construction failures are
    /// contained here: the row is logged and skipped, never the chunk.
    fn process_row(&self, scan: &FileScan, row_number: usize, row: &StringRecord) -> RowOutcome {
        if row_number < self.contract.data_position || row_number >= scan.end_of_data {
            return RowOutcome::Skipped;
        }
        if row.iter().all(|cell| cell.trim().is_empty()) {
            return RowOutcome::Skipped;
        }

        let mut record = match Record::new(
            &self.contract,
            &self.schema,
            &scan.header,
            row_number,
            self.strict_fields,
        ) {
            Ok(record) => record,
            Err(e) => {
                warn!(row_number, error = %e, "skipping row");
                return RowOutcome::Skipped;
            }
        };

        if let Err(e) = record.create(row) {
            warn!(row_number, error = %e, "skipping row");
            return RowOutcome::Skipped;
        }

        let violations = record.validate();
        if violations.is_empty() {
            return record
                .into_valid()
                .map(RowOutcome::Valid)
                .unwrap_or(RowOutcome::Skipped);
        }

        let errors = record.validation_errors(&violations);
        let captured = InvalidRecord::new(errors, self.contract.kind.type_name(), row_number);
        if captured.validate() {
            RowOutcome::Invalid(captured)
        } else {
            warn!(row_number, "invalid-record capture failed its own validation, dropping row");
            RowOutcome::Skipped
        }
    }
}
