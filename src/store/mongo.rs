//! MongoDB adapter for the document store contract

use async_trait::async_trait;
use mongodb::bson::{doc, Document};
use mongodb::options::{UpdateOneModel, WriteModel};
use mongodb::{Client, Database};
use tracing::info;

use crate::config::StoreConfig;
use crate::records::ValidRecord;

use super::{DocumentStore, StoreError, WriteSummary};

/// Batch persistence backed by a MongoDB database
pub struct MongoStore {
    client: Client,
    db: Database,
}

impl MongoStore {
    /// Connect with the configured host, database and credentials.
    pub async fn connect(config: &StoreConfig) -> Result<Self, StoreError> {
        let client = Client::with_uri_str(config.connection_uri()).await?;
        let db = client.database(&config.database);
        info!(host = %config.host, database = %config.database, "connected to MongoDB");
        Ok(Self { client, db })
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}

#[async_trait]
impl DocumentStore for MongoStore {
    async fn bulk_upsert(
        &self,
        collection: &str,
        records: &[ValidRecord],
    ) -> Result<WriteSummary, StoreError> {
        if records.is_empty() {
            return Ok(WriteSummary::default());
        }

        let namespace = self.db.collection::<Document>(collection).namespace();
        let models: Vec<WriteModel> = records
            .iter()
            .map(|record| {
                WriteModel::UpdateOne(
                    UpdateOneModel::builder()
                        .namespace(namespace.clone())
                        .filter(doc! { "_id": record.id.as_str() })
                        .update(doc! { "$set": record.fields.clone() })
                        .upsert(true)
                        .build(),
                )
            })
            .collect();

        let result = self.client.bulk_write(models).ordered(true).await?;
        Ok(WriteSummary {
            inserted: result.inserted_count as u64,
            matched: result.matched_count as u64,
            modified: result.modified_count as u64,
            removed: result.deleted_count as u64,
            upserted: result.upserted_count as u64,
        })
    }

    async fn insert_many(
        &self,
        collection: &str,
        documents: &[Document],
    ) -> Result<WriteSummary, StoreError> {
        if documents.is_empty() {
            return Ok(WriteSummary::default());
        }

        let result = self
            .db
            .collection::<Document>(collection)
            .insert_many(documents)
            .await?;
        Ok(WriteSummary {
            inserted: result.inserted_ids.len() as u64,
            ..Default::default()
        })
    }

    async fn contains_documents(&self, collection: &str) -> Result<bool, StoreError> {
        let count = self
            .db
            .collection::<Document>(collection)
            .count_documents(doc! {})
            .await?;
        Ok(count > 0)
    }
}
