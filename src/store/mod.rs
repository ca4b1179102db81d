//! Document persistence: the batch write contract and its adapters

pub mod indexes;
pub mod memory;
pub mod mongo;

pub use memory::MemoryStore;
pub use mongo::MongoStore;

use async_trait::async_trait;
use mongodb::bson::Document;
use thiserror::Error;

use crate::records::ValidRecord;

/// Persistence failures. Batch-level: the processor logs them and moves on
/// to the next chunk; nothing here retries.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] mongodb::error::Error),
}

/// Counts reported by a batch write. Empty when nothing was written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteSummary {
    pub inserted: u64,
    pub matched: u64,
    pub modified: u64,
    pub removed: u64,
    pub upserted: u64,
}

impl WriteSummary {
    pub fn merge(&mut self, other: &WriteSummary) {
        self.inserted += other.inserted;
        self.matched += other.matched;
        self.modified += other.modified;
        self.removed += other.removed;
        self.upserted += other.upserted;
    }
}

/// Batch persistence consumed by the chunk processor.
///
/// Every write is independent; no transaction spans chunks, and the
/// connection is safe for concurrent batch submissions.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Ordered per-record upsert keyed `{_id: record.id}` with `$set`
    /// semantics over the record's full field mapping.
    async fn bulk_upsert(
        &self,
        collection: &str,
        records: &[ValidRecord],
    ) -> Result<WriteSummary, StoreError>;

    /// Unconditioned multi-insert of raw documents.
    async fn insert_many(
        &self,
        collection: &str,
        documents: &[Document],
    ) -> Result<WriteSummary, StoreError>;

    /// Does the collection contain at least one document? Used as the
    /// taxonomy-before-checklist precondition probe.
    async fn contains_documents(&self, collection: &str) -> Result<bool, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_accumulates_counts() {
        let mut total = WriteSummary::default();
        total.merge(&WriteSummary {
            inserted: 1,
            matched: 2,
            modified: 3,
            removed: 0,
            upserted: 4,
        });
        total.merge(&WriteSummary {
            upserted: 6,
            ..Default::default()
        });
        assert_eq!(total.inserted, 1);
        assert_eq!(total.matched, 2);
        assert_eq!(total.modified, 3);
        assert_eq!(total.upserted, 10);
    }
}
