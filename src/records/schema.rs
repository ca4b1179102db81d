//! Field schemas used to validate records before persistence

use mongodb::bson::{Bson, Document};
use std::fmt;

/// Default format for datetime fields that do not declare their own
/// (a month-year form such as "Mar 2012").
pub const DEFAULT_DATETIME_FORMAT: &str = "%b %Y";

/// Declared type of a canonical field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    String,
    Integer,
    Number,
    Boolean,
    DateTime,
    /// GeoJSON point sub-document, `{type: "Point", coordinates: [lon, lat]}`
    Point,
}

impl FieldType {
    pub fn name(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::DateTime => "datetime",
            Self::Point => "point",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Declared type, nullability and presence rules for one canonical field
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub field_type: FieldType,
    pub nullable: bool,
    pub required: bool,
    pub datetime_format: Option<&'static str>,
}

impl FieldSpec {
    pub fn new(field_type: FieldType) -> Self {
        Self {
            field_type,
            nullable: false,
            required: false,
            datetime_format: None,
        }
    }

    /// Allow an explicit Null value
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// The field must be present in every record
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Override the datetime parse format for this field
    pub fn format(mut self, fmt: &'static str) -> Self {
        self.datetime_format = Some(fmt);
        self
    }

    /// Format string used when coercing this field as a datetime
    pub fn datetime_format(&self) -> &'static str {
        self.datetime_format.unwrap_or(DEFAULT_DATETIME_FORMAT)
    }

    fn matches(&self, value: &Bson) -> bool {
        match self.field_type {
            FieldType::String => matches!(value, Bson::String(_)),
            FieldType::Integer => matches!(value, Bson::Int32(_) | Bson::Int64(_)),
            FieldType::Number => {
                matches!(value, Bson::Double(_) | Bson::Int32(_) | Bson::Int64(_))
            }
            FieldType::Boolean => matches!(value, Bson::Boolean(_)),
            FieldType::DateTime => matches!(value, Bson::DateTime(_)),
            FieldType::Point => is_geo_point(value),
        }
    }
}

fn is_geo_point(value: &Bson) -> bool {
    let Bson::Document(doc) = value else {
        return false;
    };
    let type_ok = matches!(doc.get("type"), Some(Bson::String(s)) if s == "Point");
    let coords_ok = matches!(
        doc.get("coordinates"),
        Some(Bson::Array(coords))
            if coords.len() == 2 && coords.iter().all(|c| matches!(c, Bson::Double(_)))
    );
    type_ok && coords_ok
}

/// A single schema violation for one field of one record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub field: String,
    pub message: String,
}

impl Violation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Mapping from canonical field name to its declared spec.
///
/// Declaration order is preserved so violation reports are stable.
#[derive(Debug, Clone)]
pub struct Schema {
    fields: Vec<(&'static str, FieldSpec)>,
}

impl Schema {
    pub fn new(fields: Vec<(&'static str, FieldSpec)>) -> Self {
        Self { fields }
    }

    pub fn get(&self, name: &str) -> Option<&FieldSpec> {
        self.fields
            .iter()
            .find(|(field, _)| *field == name)
            .map(|(_, spec)| spec)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Check a record's field mapping against the declared specs.
    ///
    /// Every required field must be present; every present Null must be
    /// declared nullable; every present value must match its declared type.
    /// With `allow_unknown` set, keys outside the schema pass through (the
    /// wide variants carry dynamically named measurement columns).
    pub fn validate(&self, fields: &Document, allow_unknown: bool) -> Vec<Violation> {
        let mut violations = Vec::new();

        for (name, spec) in &self.fields {
            if spec.required && !fields.contains_key(name) {
                violations.push(Violation::new(*name, "required field is missing"));
            }
        }

        for (key, value) in fields {
            match self.get(key) {
                Some(spec) => match value {
                    Bson::Null if !spec.nullable => {
                        violations.push(Violation::new(key, "null value not allowed"));
                    }
                    Bson::Null => {}
                    other if !spec.matches(other) => {
                        violations.push(Violation::new(
                            key,
                            format!("must be of {} type", spec.field_type),
                        ));
                    }
                    _ => {}
                },
                None if !allow_unknown => {
                    violations.push(Violation::new(key, "unknown field"));
                }
                None => {}
            }
        }

        violations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::doc;

    fn sample_schema() -> Schema {
        Schema::new(vec![
            ("name", FieldSpec::new(FieldType::String).required()),
            ("count", FieldSpec::new(FieldType::Integer).nullable()),
            ("weight", FieldSpec::new(FieldType::Number).nullable()),
            ("flagged", FieldSpec::new(FieldType::Boolean).nullable()),
            ("loc", FieldSpec::new(FieldType::Point).nullable()),
        ])
    }

    #[test]
    fn valid_document_produces_no_violations() {
        let schema = sample_schema();
        let fields = doc! {
            "name": "turdus migratorius",
            "count": 3_i64,
            "weight": 77.5,
            "flagged": true,
            "loc": { "type": "Point", "coordinates": [-122.3, 47.6] },
        };
        assert!(schema.validate(&fields, false).is_empty());
    }

    #[test]
    fn missing_required_field_is_reported() {
        let schema = sample_schema();
        let violations = schema.validate(&doc! { "count": 1_i64 }, false);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].field, "name");
        assert_eq!(violations[0].message, "required field is missing");
    }

    #[test]
    fn null_only_allowed_when_nullable() {
        let schema = sample_schema();
        let violations = schema.validate(&doc! { "name": Bson::Null }, false);
        assert!(violations.iter().any(|v| v.field == "name" && v.message == "null value not allowed"));

        let fields = doc! { "name": "x", "count": Bson::Null };
        assert!(schema.validate(&fields, false).is_empty());
    }

    #[test]
    fn type_mismatch_is_reported() {
        let schema = sample_schema();
        let violations = schema.validate(&doc! { "name": "x", "count": "three" }, false);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].field, "count");
        assert!(violations[0].message.contains("integer"));
    }

    #[test]
    fn number_accepts_integers_too() {
        let schema = sample_schema();
        let fields = doc! { "name": "x", "weight": 12_i32 };
        assert!(schema.validate(&fields, false).is_empty());
    }

    #[test]
    fn unknown_fields_gated_by_flag() {
        let schema = sample_schema();
        let fields = doc! { "name": "x", "nlcd01_42": 0.5 };
        assert_eq!(schema.validate(&fields, false).len(), 1);
        assert!(schema.validate(&fields, true).is_empty());
    }

    #[test]
    fn geo_point_shape_is_checked() {
        let schema = sample_schema();
        let bad = doc! { "name": "x", "loc": { "type": "Polygon", "coordinates": [0.0, 0.0] } };
        assert_eq!(schema.validate(&bad, false).len(), 1);

        let short = doc! { "name": "x", "loc": { "type": "Point", "coordinates": [0.0] } };
        assert_eq!(schema.validate(&short, false).len(), 1);
    }

    #[test]
    fn datetime_format_defaults_to_month_year() {
        let spec = FieldSpec::new(FieldType::DateTime);
        assert_eq!(spec.datetime_format(), DEFAULT_DATETIME_FORMAT);
        let spec = FieldSpec::new(FieldType::DateTime).format("%Y-%m-%d");
        assert_eq!(spec.datetime_format(), "%Y-%m-%d");
    }
}
