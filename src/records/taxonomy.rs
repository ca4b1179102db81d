//! Taxonomy contract and schema
//!
//! One row per species; the lowercased scientific name is the upsert key.
//! Taxonomy files are narrow and fixed-width, so row length must match the
//! header exactly and fields outside the schema are rejected.

use super::contract::{Contract, RecordKind, NODE_COLLECTION};
use super::dialect::Dialect;
use super::schema::{FieldSpec, FieldType, Schema};

pub(crate) fn contract() -> Contract {
    Contract::new(
        RecordKind::Taxonomy,
        NODE_COLLECTION,
        "sci_name",
        Dialect::comma(),
        &[
            ("sci_name", "sci_name"),
            ("taxon_order", "taxon_order"),
            ("primary_com_name", "primary_com_name"),
            ("category", "category"),
            ("order_name", "order_name"),
            ("family_name", "family_name"),
            ("subfamily_name", "subfamily_name"),
            ("genus_name", "genus_name"),
            ("species_name", "species_name"),
        ],
        true,
        false,
    )
}

pub(crate) fn schema() -> Schema {
    // _id is the lowercased sci_name
    Schema::new(vec![
        ("taxon_order", FieldSpec::new(FieldType::Number).nullable()),
        ("primary_com_name", FieldSpec::new(FieldType::String).required()),
        ("category", FieldSpec::new(FieldType::String).nullable()),
        ("order_name", FieldSpec::new(FieldType::String).nullable()),
        ("family_name", FieldSpec::new(FieldType::String).nullable()),
        ("subfamily_name", FieldSpec::new(FieldType::String).nullable()),
        ("genus_name", FieldSpec::new(FieldType::String).nullable()),
        ("species_name", FieldSpec::new(FieldType::String).nullable()),
    ])
}
