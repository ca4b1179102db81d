//! Migration-core contract and schema
//!
//! Core rows describe the environmental attributes of a sampling event.
//! Unmapped trailing columns (land-cover classes and similar provider
//! extras) are retained under sanitized names as number-or-null fields.

use super::contract::{Contract, RecordKind, PATH_COLLECTION};
use super::dialect::Dialect;
use super::schema::{FieldSpec, FieldType, Schema};

pub(crate) fn contract() -> Contract {
    Contract::new(
        RecordKind::Core,
        PATH_COLLECTION,
        "sampling_event_id",
        Dialect::comma(),
        &[
            ("sampling_event_id", "sampling_event_id"),
            ("loc_id", "loc_id"),
            ("pop00_sqmi", "pop00_sqmi"),
            ("housing_density", "housing_density"),
            ("housing_percent_vacant", "housing_percent_vacant"),
            ("elev_gt", "elev_gt"),
            ("elev_ned", "elev_ned"),
            ("bcr", "bcr"),
            ("bailey_ecoregion", "bailey_ecoregion"),
            ("omernik_l3_ecoregion", "omernik_l3_ecoregion"),
            ("caus_temp_avg", "caus_temp_avg"),
            ("caus_temp_min", "caus_temp_min"),
            ("caus_temp_max", "caus_temp_max"),
            ("caus_prec", "caus_prec"),
            ("caus_snow", "caus_snow"),
        ],
        false,
        true,
    )
}

pub(crate) fn schema() -> Schema {
    // _id is sampling_event_id
    Schema::new(vec![
        ("loc_id", FieldSpec::new(FieldType::String).nullable()),
        ("pop00_sqmi", FieldSpec::new(FieldType::Number).nullable()),
        ("housing_density", FieldSpec::new(FieldType::Number).nullable()),
        ("housing_percent_vacant", FieldSpec::new(FieldType::Number).nullable()),
        ("elev_gt", FieldSpec::new(FieldType::Integer).nullable()),
        ("elev_ned", FieldSpec::new(FieldType::Number).nullable()),
        ("bcr", FieldSpec::new(FieldType::Integer).nullable()),
        ("bailey_ecoregion", FieldSpec::new(FieldType::String).nullable()),
        ("omernik_l3_ecoregion", FieldSpec::new(FieldType::Integer).nullable()),
        ("caus_temp_avg", FieldSpec::new(FieldType::Integer).nullable()),
        ("caus_temp_min", FieldSpec::new(FieldType::Integer).nullable()),
        ("caus_temp_max", FieldSpec::new(FieldType::Integer).nullable()),
        ("caus_prec", FieldSpec::new(FieldType::Integer).nullable()),
        ("caus_snow", FieldSpec::new(FieldType::Integer).nullable()),
    ])
}

#[cfg(test)]
mod tests {
    use super::super::Record;
    use super::*;
    use csv::StringRecord;
    use mongodb::bson::Bson;

    fn header() -> Vec<String> {
        vec![
            "sampling_event_id".into(),
            "loc_id".into(),
            "elev_ned".into(),
            "bcr".into(),
            "nlcd2001_fs_c11_7500_pland".into(),
            "nlcd(2006)".into(),
        ]
    }

    #[test]
    fn create_keeps_wide_columns_as_number_or_null() {
        let contract = contract();
        let schema = schema();
        let header = header();
        let mut record = Record::new(&contract, &schema, &header, 1, false).unwrap();
        let row = StringRecord::from(vec!["S1", "L99", "120.5", "30", "0.25", "n/a"]);
        record.create(&row).unwrap();

        assert_eq!(record.id(), Some("S1"));
        assert_eq!(record.fields().get("elev_ned"), Some(&Bson::Double(120.5)));
        assert_eq!(record.fields().get("bcr"), Some(&Bson::Int64(30)));
        assert_eq!(
            record.fields().get("nlcd2001_fs_c11_7500_pland"),
            Some(&Bson::Double(0.25))
        );
        // Failed numeric probe keeps the column, explicitly null
        assert_eq!(record.fields().get("nlcd_2006_"), Some(&Bson::Null));
        assert!(record.validate().is_empty());
    }

    #[test]
    fn non_numeric_mapped_fields_degrade_to_null() {
        let contract = contract();
        let schema = schema();
        let header = header();
        let mut record = Record::new(&contract, &schema, &header, 1, false).unwrap();
        let row = StringRecord::from(vec!["S1", "L99", "unknown", "?", "1", "2"]);
        record.create(&row).unwrap();

        assert_eq!(record.fields().get("elev_ned"), Some(&Bson::Null));
        assert_eq!(record.fields().get("bcr"), Some(&Bson::Null));
        assert!(record.validate().is_empty());
    }
}
