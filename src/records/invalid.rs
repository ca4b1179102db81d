//! Capture documents for rows that failed validation

use mongodb::bson::{Bson, DateTime as BsonDateTime, Document};

use super::contract::RecordKind;

/// Collection holding invalid-record capture documents
pub const INVALID_COLLECTION: &str = "invalidRecords";

/// Audit document for one row that failed schema validation or identifier
/// assignment. Independent of the record that spawned it.
#[derive(Debug, Clone)]
pub struct InvalidRecord {
    fields: Document,
}

impl InvalidRecord {
    pub fn new(errors: Document, record_type: &str, row_number: usize) -> Self {
        let mut fields = Document::new();
        fields.insert("Date", Bson::DateTime(BsonDateTime::now()));
        fields.insert("Errors", Bson::Document(errors));
        fields.insert("RecordType", Bson::String(record_type.to_string()));
        fields.insert("RowNum", Bson::Int64(row_number as i64));
        Self { fields }
    }

    /// The capture document is itself schema-checked before queueing: a
    /// non-null timestamp, a non-empty error payload, a known source-type
    /// tag, and an integer (or null) row number.
    pub fn validate(&self) -> bool {
        let date_ok = matches!(self.fields.get("Date"), Some(Bson::DateTime(_)));
        let errors_ok = matches!(
            self.fields.get("Errors"),
            Some(Bson::Document(errors)) if !errors.is_empty()
        );
        let type_ok = matches!(
            self.fields.get("RecordType"),
            Some(Bson::String(tag)) if RecordKind::type_names().contains(&tag.as_str())
        );
        let row_ok = matches!(
            self.fields.get("RowNum"),
            Some(Bson::Int32(_) | Bson::Int64(_) | Bson::Null)
        );
        date_ok && errors_ok && type_ok && row_ok
    }

    pub fn fields(&self) -> &Document {
        &self.fields
    }

    pub fn into_fields(self) -> Document {
        self.fields
    }
}
