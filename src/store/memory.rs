//! In-process document store
//!
//! Implements the same upsert-by-identifier semantics as the MongoDB
//! adapter; used by the test suite and for dry runs without a server.

use async_trait::async_trait;
use mongodb::bson::Document;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};

use crate::records::ValidRecord;

use super::{DocumentStore, StoreError, WriteSummary};

#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: Mutex<HashMap<String, BTreeMap<String, Document>>>,
    inserts: Mutex<HashMap<String, Vec<Document>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upserted documents of one collection, ordered by identifier
    pub fn documents(&self, collection: &str) -> Vec<(String, Document)> {
        self.collections
            .lock()
            .get(collection)
            .map(|coll| coll.iter().map(|(id, doc)| (id.clone(), doc.clone())).collect())
            .unwrap_or_default()
    }

    pub fn get(&self, collection: &str, id: &str) -> Option<Document> {
        self.collections.lock().get(collection)?.get(id).cloned()
    }

    pub fn len(&self, collection: &str) -> usize {
        self.collections
            .lock()
            .get(collection)
            .map(|coll| coll.len())
            .unwrap_or(0)
    }

    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }

    /// Documents received through `insert_many`, in arrival order
    pub fn inserted(&self, collection: &str) -> Vec<Document> {
        self.inserts
            .lock()
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    /// Pre-populate a collection, e.g. to satisfy the taxonomy precondition
    pub fn seed(&self, collection: &str, id: &str, fields: Document) {
        self.collections
            .lock()
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), fields);
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn bulk_upsert(
        &self,
        collection: &str,
        records: &[ValidRecord],
    ) -> Result<WriteSummary, StoreError> {
        if records.is_empty() {
            return Ok(WriteSummary::default());
        }

        let mut summary = WriteSummary::default();
        let mut collections = self.collections.lock();
        let coll = collections.entry(collection.to_string()).or_default();

        for record in records {
            match coll.get_mut(&record.id) {
                Some(existing) => {
                    summary.matched += 1;
                    let before = existing.clone();
                    // $set semantics: replace listed fields, keep the rest
                    for (key, value) in record.fields.iter() {
                        existing.insert(key.clone(), value.clone());
                    }
                    if *existing != before {
                        summary.modified += 1;
                    }
                }
                None => {
                    coll.insert(record.id.clone(), record.fields.clone());
                    summary.upserted += 1;
                }
            }
        }

        Ok(summary)
    }

    async fn insert_many(
        &self,
        collection: &str,
        documents: &[Document],
    ) -> Result<WriteSummary, StoreError> {
        if documents.is_empty() {
            return Ok(WriteSummary::default());
        }

        self.inserts
            .lock()
            .entry(collection.to_string())
            .or_default()
            .extend(documents.iter().cloned());

        Ok(WriteSummary {
            inserted: documents.len() as u64,
            ..Default::default()
        })
    }

    async fn contains_documents(&self, collection: &str) -> Result<bool, StoreError> {
        Ok(!self.is_empty(collection))
    }
}
