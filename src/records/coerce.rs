//! Schema-driven coercion of raw cell values
//!
//! Every function here is total over the string domain: a value that cannot
//! be coerced degrades to Null, it never fails the record.

use chrono::format::{parse, Parsed, StrftimeItems};
use chrono::{DateTime, NaiveTime, Utc};
use mongodb::bson::{Bson, DateTime as BsonDateTime};

use super::schema::{FieldSpec, FieldType};

/// Literal placeholder some providers emit for an unknown string value
const UNKNOWN_PLACEHOLDER: &str = "?";

pub(crate) fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Coerce one raw cell according to the field's declared type.
pub fn coerce(raw: &str, spec: &FieldSpec) -> Bson {
    match spec.field_type {
        FieldType::String => coerce_string(raw),
        FieldType::Integer => coerce_integer(raw).map(Bson::Int64).unwrap_or(Bson::Null),
        FieldType::Number => coerce_number(raw).map(Bson::Double).unwrap_or(Bson::Null),
        FieldType::Boolean => coerce_boolean(raw).map(Bson::Boolean).unwrap_or(Bson::Null),
        FieldType::DateTime => coerce_datetime(raw, spec.datetime_format())
            .map(|dt| Bson::DateTime(BsonDateTime::from_chrono(dt)))
            .unwrap_or(Bson::Null),
        // Points are synthesized from coordinate pairs, never read from a cell
        FieldType::Point => Bson::Null,
    }
}

/// Blank or the `?` placeholder become Null; everything else is trimmed.
pub fn coerce_string(raw: &str) -> Bson {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == UNKNOWN_PLACEHOLDER {
        Bson::Null
    } else {
        Bson::String(trimmed.to_string())
    }
}

pub fn coerce_integer(raw: &str) -> Option<i64> {
    raw.trim().parse().ok()
}

pub fn coerce_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse().ok()
}

/// Accepts `true`/`false` (any case) and `1`/`0`.
pub fn coerce_boolean(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

/// Strict parse against `fmt`, defaulting omitted month/day to 1 so
/// month-year formats resolve to the first of the month.
pub fn coerce_datetime(raw: &str, fmt: &str) -> Option<DateTime<Utc>> {
    let value = raw.trim();
    if value.is_empty() || fmt.is_empty() {
        return None;
    }
    let mut parsed = Parsed::new();
    parse(&mut parsed, value, StrftimeItems::new(fmt)).ok()?;
    // No-ops (rejected) when the format already supplied these
    let _ = parsed.set_month(1);
    let _ = parsed.set_day(1);
    let date = parsed.to_naive_date().ok()?;
    let time = parsed.to_naive_time().unwrap_or(NaiveTime::MIN);
    Some(date.and_time(time).and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::schema::DEFAULT_DATETIME_FORMAT;
    use chrono::{Datelike, Timelike};

    #[test]
    fn blank_and_placeholder_strings_become_null() {
        assert_eq!(coerce_string(""), Bson::Null);
        assert_eq!(coerce_string("   "), Bson::Null);
        assert_eq!(coerce_string("?"), Bson::Null);
        assert_eq!(coerce_string(" robin "), Bson::String("robin".into()));
    }

    #[test]
    fn integer_coercion_is_total() {
        assert_eq!(coerce_integer("42"), Some(42));
        assert_eq!(coerce_integer(" -7 "), Some(-7));
        assert_eq!(coerce_integer("3.5"), None);
        assert_eq!(coerce_integer("abc"), None);
        assert_eq!(coerce_integer(""), None);
    }

    #[test]
    fn number_coercion_is_total() {
        assert_eq!(coerce_number("3.5"), Some(3.5));
        assert_eq!(coerce_number("42"), Some(42.0));
        assert_eq!(coerce_number("1e3"), Some(1000.0));
        assert_eq!(coerce_number("n/a"), None);
        assert_eq!(coerce_number(""), None);
    }

    #[test]
    fn boolean_accepts_words_and_digits() {
        assert_eq!(coerce_boolean("true"), Some(true));
        assert_eq!(coerce_boolean("TRUE"), Some(true));
        assert_eq!(coerce_boolean("1"), Some(true));
        assert_eq!(coerce_boolean("false"), Some(false));
        assert_eq!(coerce_boolean("0"), Some(false));
        assert_eq!(coerce_boolean("yes"), None);
        assert_eq!(coerce_boolean("2"), None);
    }

    #[test]
    fn datetime_parses_month_year_format() {
        let dt = coerce_datetime("Mar 2012", DEFAULT_DATETIME_FORMAT).unwrap();
        assert_eq!((dt.year(), dt.month(), dt.day()), (2012, 3, 1));
        assert_eq!(dt.hour(), 0);
    }

    #[test]
    fn datetime_honors_explicit_formats() {
        let dt = coerce_datetime("2015-06-17", "%Y-%m-%d").unwrap();
        assert_eq!((dt.year(), dt.month(), dt.day()), (2015, 6, 17));
    }

    #[test]
    fn unparseable_datetimes_become_none() {
        assert_eq!(coerce_datetime("March twelve", DEFAULT_DATETIME_FORMAT), None);
        assert_eq!(coerce_datetime("2015-06-17", DEFAULT_DATETIME_FORMAT), None);
        assert_eq!(coerce_datetime("", DEFAULT_DATETIME_FORMAT), None);
        assert_eq!(coerce_datetime("Mar 2012", ""), None);
    }

    #[test]
    fn coercion_is_idempotent_over_rendered_values() {
        // Re-coercing the rendering of a coerced value yields the same value
        let first = coerce_integer("42").unwrap();
        assert_eq!(coerce_integer(&first.to_string()), Some(first));

        let first = coerce_number("3.25").unwrap();
        assert_eq!(coerce_number(&first.to_string()), Some(first));

        let Bson::String(first) = coerce_string(" robin ") else {
            panic!("expected string");
        };
        assert_eq!(coerce_string(&first), Bson::String(first.clone()));
    }

    #[test]
    fn coerce_dispatches_on_declared_type() {
        let spec = FieldSpec::new(FieldType::Integer).nullable();
        assert_eq!(coerce("12", &spec), Bson::Int64(12));
        assert_eq!(coerce("twelve", &spec), Bson::Null);

        let spec = FieldSpec::new(FieldType::Boolean).nullable();
        assert_eq!(coerce("1", &spec), Bson::Boolean(true));

        let spec = FieldSpec::new(FieldType::Number).nullable();
        assert_eq!(coerce("0.5", &spec), Bson::Double(0.5));
    }
}
