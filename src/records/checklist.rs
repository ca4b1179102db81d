//! Migration-checklist contract, schema and derived fields
//!
//! Checklist rows carry a sampling event plus a ragged tail of per-species
//! observation counts. Two fields are synthesized after the row loop: a
//! GeoJSON point built from the longitude/latitude pair, and an observation
//! date computed from the year and day-of-year columns.

use chrono::{NaiveDate, NaiveTime};
use mongodb::bson::{doc, Bson, DateTime as BsonDateTime, Document};
use tracing::debug;

use super::contract::{Contract, RecordKind, PATH_COLLECTION};
use super::dialect::Dialect;
use super::schema::{FieldSpec, FieldType, Schema};

pub(crate) fn contract() -> Contract {
    Contract::new(
        RecordKind::Checklist,
        PATH_COLLECTION,
        "sampling_event_id",
        Dialect::comma(),
        &[
            ("sampling_event_id", "sampling_event_id"),
            ("loc_id", "loc_id"),
            ("latitude", "latitude"),
            ("longitude", "longitude"),
            ("year", "year"),
            ("month", "month"),
            ("day", "day"),
            ("time", "time"),
            ("country", "country"),
            ("state_province", "state_province"),
            ("county", "county"),
            ("count_type", "count_type"),
            ("effort_hrs", "effort_hrs"),
            ("effort_distance_km", "effort_distance_km"),
            ("effort_area_ha", "effort_area_ha"),
            ("observer_id", "observer_id"),
            ("number_observers", "number_observers"),
            ("group_id", "group_id"),
            ("primary_checklist_flag", "primary_checklist_flag"),
        ],
        false,
        true,
    )
}

pub(crate) fn schema() -> Schema {
    // _id is sampling_event_id; latitude/longitude fold into loc
    Schema::new(vec![
        ("loc_id", FieldSpec::new(FieldType::String).nullable()),
        ("loc", FieldSpec::new(FieldType::Point).nullable()),
        ("year", FieldSpec::new(FieldType::Integer).required()),
        ("month", FieldSpec::new(FieldType::Integer).required()),
        ("day", FieldSpec::new(FieldType::Integer).required()),
        ("time", FieldSpec::new(FieldType::Number).nullable()),
        ("country", FieldSpec::new(FieldType::String).nullable()),
        ("state_province", FieldSpec::new(FieldType::String).nullable()),
        ("county", FieldSpec::new(FieldType::String).nullable()),
        ("count_type", FieldSpec::new(FieldType::String).nullable()),
        ("effort_hrs", FieldSpec::new(FieldType::Number).nullable()),
        ("effort_distance_km", FieldSpec::new(FieldType::Number).nullable()),
        ("effort_area_ha", FieldSpec::new(FieldType::Number).nullable()),
        ("observer_id", FieldSpec::new(FieldType::String).nullable()),
        ("number_observers", FieldSpec::new(FieldType::Integer).nullable()),
        ("group_id", FieldSpec::new(FieldType::String).nullable()),
        ("primary_checklist_flag", FieldSpec::new(FieldType::Boolean).nullable()),
        ("date", FieldSpec::new(FieldType::DateTime).nullable()),
    ])
}

/// Longitude/latitude values accumulated while walking a row
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct CoordinatePair {
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
}

impl CoordinatePair {
    /// Both components present and within the valid geographic ranges
    pub(crate) fn is_valid(&self) -> bool {
        match (self.longitude, self.latitude) {
            (Some(lon), Some(lat)) => {
                (-180.0..=180.0).contains(&lon) && (-90.0..=90.0).contains(&lat)
            }
            _ => false,
        }
    }
}

/// GeoJSON point for a coordinate pair, or Null when the pair is unusable.
/// Coordinates are always listed in longitude, latitude order.
pub(crate) fn geo_point(pair: &CoordinatePair) -> Bson {
    match (pair.longitude, pair.latitude) {
        (Some(longitude), Some(latitude)) if pair.is_valid() => Bson::Document(doc! {
            "type": "Point",
            "coordinates": [longitude, latitude],
        }),
        _ => Bson::Null,
    }
}

/// Observation date from the year and day-of-year fields: Jan 1 of the year
/// plus (day - 1) days. Days outside the year's calendar leave the date
/// unset rather than raising.
pub(crate) fn computed_date(fields: &Document) -> Option<BsonDateTime> {
    let year = int_field(fields, "year")?;
    let day = int_field(fields, "day")?;
    let date = i32::try_from(year)
        .ok()
        .zip(u32::try_from(day).ok())
        .and_then(|(y, d)| NaiveDate::from_yo_opt(y, d));
    match date {
        Some(d) => Some(BsonDateTime::from_chrono(
            d.and_time(NaiveTime::MIN).and_utc(),
        )),
        None => {
            debug!(year, day, "year and day-of-year do not form a calendar date");
            None
        }
    }
}

fn int_field(fields: &Document, key: &str) -> Option<i64> {
    match fields.get(key) {
        Some(Bson::Int64(v)) => Some(*v),
        Some(Bson::Int32(v)) => Some(i64::from(*v)),
        _ => None,
    }
}
