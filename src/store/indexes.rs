//! Index management for the survey collections
//!
//! Dropped before bulk loads when the store config says so, and rebuilt
//! explicitly with `tern ensure-indexes` afterwards.

use mongodb::bson::{doc, Document};
use mongodb::options::IndexOptions;
use mongodb::{Database, IndexModel};
use tracing::info;

use crate::records::{NODE_COLLECTION, PATH_COLLECTION};

use super::StoreError;

/// Create the query indexes if they do not exist: the 2dsphere index over
/// checklist locations, the year/month/day compound, and the weighted
/// typeahead text index over the taxonomy.
pub async fn ensure_indexes(db: &Database) -> Result<(), StoreError> {
    let migrations = db.collection::<Document>(PATH_COLLECTION);
    migrations
        .create_index(IndexModel::builder().keys(doc! { "loc": "2dsphere" }).build())
        .await?;
    migrations
        .create_index(
            IndexModel::builder()
                .keys(doc! { "year": 1, "month": 1, "day": 1 })
                .build(),
        )
        .await?;

    let typeahead = IndexModel::builder()
        .keys(doc! {
            "primary_com_name": "text",
            "species_name": "text",
            "genus_name": "text",
            "category": "text",
            "family_name": "text",
            "order_name": "text",
            "subfamily_name": "text",
            "taxon_order": "text",
        })
        .options(
            IndexOptions::builder()
                .name("idxTypeahead".to_string())
                .weights(doc! {
                    "taxon_order": 1,
                    "subfamily_name": 2,
                    "order_name": 3,
                    "family_name": 4,
                    "category": 5,
                    "genus_name": 6,
                    "species_name": 7,
                    "primary_com_name": 8,
                })
                .build(),
        )
        .build();
    db.collection::<Document>(NODE_COLLECTION)
        .create_index(typeahead)
        .await?;

    info!("indexes are in place");
    Ok(())
}

/// Drop every index on the survey collections (the `_id` index stays).
pub async fn drop_indexes(db: &Database) -> Result<(), StoreError> {
    db.collection::<Document>(NODE_COLLECTION)
        .drop_indexes()
        .await?;
    db.collection::<Document>(PATH_COLLECTION)
        .drop_indexes()
        .await?;
    info!("dropped existing indexes");
    Ok(())
}
