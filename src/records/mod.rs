//! Records: per-row accumulation, coercion and validation
//!
//! A record is a stateful accumulator that turns one raw row into the
//! canonical field mapping persisted as a document, plus the identifier
//! used for upsert. Variant-specific behavior (identifier casing, strict
//! row length, wide-column fallbacks, derived fields) is driven by the
//! record-type contract.

pub mod checklist;
pub mod coerce;
pub mod contract;
pub mod core;
pub mod dialect;
pub mod invalid;
pub mod schema;
pub mod taxonomy;

pub use contract::{Contract, RecordKind, NODE_COLLECTION, PATH_COLLECTION};
pub use dialect::Dialect;
pub use invalid::{InvalidRecord, INVALID_COLLECTION};
pub use schema::{FieldSpec, FieldType, Schema, Violation};

use csv::StringRecord;
use mongodb::bson::{Bson, Document};
use thiserror::Error;

use self::checklist::CoordinatePair;

/// Construction failures. These are row-scoped: the processor logs them and
/// skips the row, they never abort a run.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("record is missing its header row")]
    MissingHeader,

    #[error("row length {row} does not equal header length {header}")]
    LengthMismatch { header: usize, row: usize },

    #[error("record schema does not have the field \"{0}\"")]
    UnknownField(String),
}

/// Replace every non-alphanumeric character with an underscore, so
/// provider-named measurement columns become stable document keys.
pub fn sanitize_key(raw: &str) -> String {
    raw.trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// A validated row, ready for upsert keyed by its identifier
#[derive(Debug, Clone)]
pub struct ValidRecord {
    pub id: String,
    pub fields: Document,
}

/// Outcome of transforming one data row
#[derive(Debug)]
pub enum RowOutcome {
    Valid(ValidRecord),
    Invalid(InvalidRecord),
    Skipped,
}

/// Field accumulator for one raw row.
///
/// Built per row inside the chunk processor, populated once by `create`,
/// validated once, then consumed; never mutated afterward. The contract,
/// schema and header are shared read-only across all rows of a file.
pub struct Record<'a> {
    contract: &'a Contract,
    schema: &'a Schema,
    header: &'a [String],
    row_number: usize,
    strict_fields: bool,
    id: Option<String>,
    fields: Document,
}

impl<'a> Record<'a> {
    pub fn new(
        contract: &'a Contract,
        schema: &'a Schema,
        header: &'a [String],
        row_number: usize,
        strict_fields: bool,
    ) -> Result<Self, RecordError> {
        if header.is_empty() {
            return Err(RecordError::MissingHeader);
        }
        Ok(Self {
            contract,
            schema,
            header,
            row_number,
            strict_fields,
            id: None,
            fields: Document::new(),
        })
    }

    pub fn row_number(&self) -> usize {
        self.row_number
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn fields(&self) -> &Document {
        &self.fields
    }

    /// Populate the field mapping from one raw row.
    ///
    /// Headers and cells pair positionally; the order of headers within the
    /// file is irrelevant as long as the data matches. The wide variants
    /// tolerate ragged rows, so the walk zips and stops at the shorter side.
    pub fn create(&mut self, row: &StringRecord) -> Result<(), RecordError> {
        if self.contract.strict_length && row.len() != self.header.len() {
            return Err(RecordError::LengthMismatch {
                header: self.header.len(),
                row: row.len(),
            });
        }

        let mut coordinates = CoordinatePair::default();

        for (raw_header, field) in self.header.iter().zip(row.iter()) {
            let Some(canonical) = self.contract.map_header(raw_header) else {
                self.unmapped_fallback(raw_header, field);
                continue;
            };

            if coerce::is_blank(canonical) {
                continue;
            }

            // The identifier column becomes the upsert key, not a field
            if canonical == self.contract.id_field {
                if !coerce::is_blank(field) {
                    let value = field.trim();
                    self.id = Some(match self.contract.kind {
                        RecordKind::Taxonomy => value.to_lowercase(),
                        RecordKind::Checklist | RecordKind::Core => value.to_string(),
                    });
                }
                continue;
            }

            // Checklist coordinates fold into a pending pair for loc
            if self.contract.kind == RecordKind::Checklist {
                match canonical {
                    "longitude" => {
                        coordinates.longitude = coerce::coerce_number(field);
                        continue;
                    }
                    "latitude" => {
                        coordinates.latitude = coerce::coerce_number(field);
                        continue;
                    }
                    _ => {}
                }
            }

            self.set_field_by_schema(canonical, field)?;
        }

        if self.contract.kind == RecordKind::Checklist {
            // Invalid GeoJSON must not reach the store; an unusable pair is
            // an explicit null
            self.fields.insert("loc", checklist::geo_point(&coordinates));
            let date = checklist::computed_date(&self.fields)
                .map(Bson::DateTime)
                .unwrap_or(Bson::Null);
            self.fields.insert("date", date);
        }

        Ok(())
    }

    /// Columns whose header maps to nothing. Taxonomy drops them; the wide
    /// variants keep them under a sanitized name so document shapes stay
    /// stable across providers.
    fn unmapped_fallback(&mut self, raw_header: &str, field: &str) {
        if coerce::is_blank(raw_header) {
            return;
        }
        match self.contract.kind {
            RecordKind::Taxonomy => {}
            // Observation counts: positive integers, anything else null
            RecordKind::Checklist => {
                let value = coerce::coerce_integer(field)
                    .filter(|count| *count > 0)
                    .map(Bson::Int64)
                    .unwrap_or(Bson::Null);
                self.fields.insert(sanitize_key(raw_header), value);
            }
            // Environmental measurements: any number, anything else null
            RecordKind::Core => {
                let value = coerce::coerce_number(field)
                    .map(Bson::Double)
                    .unwrap_or(Bson::Null);
                self.fields.insert(sanitize_key(raw_header), value);
            }
        }
    }

    fn set_field_by_schema(&mut self, canonical: &str, field: &str) -> Result<(), RecordError> {
        let Some(spec) = self.schema.get(canonical) else {
            if self.strict_fields {
                return Err(RecordError::UnknownField(canonical.to_string()));
            }
            return Ok(());
        };
        self.fields.insert(canonical, coerce::coerce(field, spec));
        Ok(())
    }

    /// Violations for this record, identifier check first. Coercion already
    /// happened during `create`, so calling this twice yields the same
    /// result.
    pub fn validate(&self) -> Vec<Violation> {
        let mut violations = Vec::new();
        if self.id.is_none() {
            violations.push(Violation::new(
                self.contract.id_field,
                "identifier column is missing or blank",
            ));
        }
        violations.extend(
            self.schema
                .validate(&self.fields, self.contract.allow_unknown),
        );
        violations
    }

    /// Structured failure detail: one entry per violated field plus a
    /// snapshot of the current field mapping for audit.
    pub fn validation_errors(&self, violations: &[Violation]) -> Document {
        let mut errors = Document::new();
        for violation in violations {
            errors.insert(violation.field.clone(), Bson::String(violation.message.clone()));
        }
        errors.insert("fields", Bson::Document(self.fields.clone()));
        errors
    }

    /// Consume the record as an upsert payload. `None` if no identifier was
    /// ever assigned.
    pub fn into_valid(self) -> Option<ValidRecord> {
        let id = self.id?;
        Some(ValidRecord {
            id,
            fields: self.fields,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_key_replaces_non_alphanumerics() {
        assert_eq!(sanitize_key("nlcd(2006)"), "nlcd_2006_");
        assert_eq!(sanitize_key("corvus corax"), "corvus_corax");
        assert_eq!(sanitize_key(" plain "), "plain");
    }

    #[test]
    fn empty_header_fails_construction() {
        let contract = RecordKind::Taxonomy.contract();
        let schema = RecordKind::Taxonomy.schema();
        let header: Vec<String> = Vec::new();
        assert!(matches!(
            Record::new(&contract, &schema, &header, 0, false),
            Err(RecordError::MissingHeader)
        ));
    }

    #[test]
    fn validation_is_idempotent() {
        let contract = RecordKind::Taxonomy.contract();
        let schema = RecordKind::Taxonomy.schema();
        let header = vec!["sci_name".to_string(), "primary_com_name".to_string()];
        let mut record = Record::new(&contract, &schema, &header, 1, false).unwrap();
        record
            .create(&StringRecord::from(vec!["", "Unknown"]))
            .unwrap();

        let first = record.validate();
        let second = record.validate();
        assert_eq!(first, second);
        assert!(!first.is_empty());
    }

    #[test]
    fn record_without_identifier_never_validates() {
        let contract = RecordKind::Core.contract();
        let schema = RecordKind::Core.schema();
        let header = vec!["loc_id".to_string(), "bcr".to_string()];
        let mut record = Record::new(&contract, &schema, &header, 5, false).unwrap();
        record
            .create(&StringRecord::from(vec!["L1", "30"]))
            .unwrap();

        // Every field is individually valid, but no identifier was assigned
        let violations = record.validate();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].field, "sampling_event_id");
        assert!(record.into_valid().is_none());
    }

    #[test]
    fn validation_errors_carry_a_field_snapshot() {
        let contract = RecordKind::Taxonomy.contract();
        let schema = RecordKind::Taxonomy.schema();
        let header = vec!["sci_name".to_string(), "primary_com_name".to_string()];
        let mut record = Record::new(&contract, &schema, &header, 2, false).unwrap();
        record
            .create(&StringRecord::from(vec!["", "Unknown"]))
            .unwrap();

        let violations = record.validate();
        let errors = record.validation_errors(&violations);
        assert!(errors.get_str("sci_name").is_ok());
        let snapshot = errors.get_document("fields").unwrap();
        assert_eq!(snapshot.get_str("primary_com_name").unwrap(), "Unknown");
    }

    #[test]
    fn strict_fields_mode_rejects_headers_outside_the_schema() {
        // A mapped header missing from the schema only fails in strict mode
        let contract = RecordKind::Checklist.contract();
        let schema = Schema::new(vec![]);
        let header = vec!["sampling_event_id".to_string(), "county".to_string()];

        let mut permissive = Record::new(&contract, &schema, &header, 1, false).unwrap();
        permissive
            .create(&StringRecord::from(vec!["S1", "King"]))
            .unwrap();
        assert!(permissive.fields().get("county").is_none());

        let mut strict = Record::new(&contract, &schema, &header, 1, true).unwrap();
        let err = strict
            .create(&StringRecord::from(vec!["S1", "King"]))
            .unwrap_err();
        assert!(matches!(err, RecordError::UnknownField(field) if field == "county"));
    }

    #[test]
    fn duplicate_headers_keep_the_last_value() {
        let contract = RecordKind::Core.contract();
        let schema = RecordKind::Core.schema();
        let header = vec![
            "sampling_event_id".to_string(),
            "bcr".to_string(),
            "bcr".to_string(),
        ];
        let mut record = Record::new(&contract, &schema, &header, 1, false).unwrap();
        record
            .create(&StringRecord::from(vec!["S1", "10", "30"]))
            .unwrap();
        assert_eq!(record.fields().get("bcr"), Some(&Bson::Int64(30)));
    }
}
