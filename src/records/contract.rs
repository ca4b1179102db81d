//! Record-type contracts: how one file family maps to one collection

use std::collections::HashMap;
use std::fmt;

use super::dialect::Dialect;
use super::schema::Schema;
use super::{checklist, core, taxonomy};

/// Collection holding taxonomy documents
pub const NODE_COLLECTION: &str = "birds";
/// Collection holding migration documents (checklist and core variants)
pub const PATH_COLLECTION: &str = "migrations";

/// The closed set of supported record types.
///
/// Each variant binds a contract and schema as data; selection happens once
/// at startup by exhaustive matching on the CLI type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Taxonomy,
    Checklist,
    Core,
}

impl RecordKind {
    pub fn contract(self) -> Contract {
        match self {
            Self::Taxonomy => taxonomy::contract(),
            Self::Checklist => checklist::contract(),
            Self::Core => core::contract(),
        }
    }

    pub fn schema(self) -> Schema {
        match self {
            Self::Taxonomy => taxonomy::schema(),
            Self::Checklist => checklist::schema(),
            Self::Core => core::schema(),
        }
    }

    /// Source-type tag recorded on captured invalid records
    pub fn type_name(self) -> &'static str {
        match self {
            Self::Taxonomy => "TaxonomyRecord",
            Self::Checklist => "MigrationChecklistRecord",
            Self::Core => "MigrationCoreRecord",
        }
    }

    /// All known source-type tags, for invalid-record self-validation
    pub fn type_names() -> [&'static str; 3] {
        [
            Self::Taxonomy.type_name(),
            Self::Checklist.type_name(),
            Self::Core.type_name(),
        ]
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            Self::Taxonomy => "Taxonomy",
            Self::Checklist => "Checklist",
            Self::Core => "Core",
        };
        f.write_str(tag)
    }
}

/// Declaration of positional rules and the header-to-canonical-field map
/// for one record type.
///
/// Shared read-only by every record built from one file.
#[derive(Debug, Clone)]
pub struct Contract {
    pub kind: RecordKind,
    /// Target collection for valid documents
    pub collection: &'static str,
    /// Header whose value becomes the upsert identifier
    pub id_field: &'static str,
    /// Zero-based row index of the header
    pub header_position: usize,
    /// Zero-based row index where data begins
    pub data_position: usize,
    /// Consecutive blank rows signalling end-of-data; 0 means end of file
    pub empty_rows_eod: usize,
    pub dialect: Dialect,
    /// Require row length to equal header length
    pub strict_length: bool,
    /// Let schema validation pass fields outside the declared schema
    pub allow_unknown: bool,
    map: HashMap<&'static str, &'static str>,
}

impl Contract {
    pub(crate) fn new(
        kind: RecordKind,
        collection: &'static str,
        id_field: &'static str,
        dialect: Dialect,
        headers: &[(&'static str, &'static str)],
        strict_length: bool,
        allow_unknown: bool,
    ) -> Self {
        Self {
            kind,
            collection,
            id_field,
            header_position: 0,
            data_position: 1,
            empty_rows_eod: 0,
            dialect,
            strict_length,
            allow_unknown,
            map: headers.iter().copied().collect(),
        }
    }

    /// Override positional rules. Header must not come after the data.
    #[cfg(test)]
    pub(crate) fn with_positions(mut self, header: usize, data: usize) -> Self {
        assert!(header <= data, "header row must precede data rows");
        self.header_position = header;
        self.data_position = data;
        self
    }

    #[cfg(test)]
    pub(crate) fn with_empty_rows_eod(mut self, rows: usize) -> Self {
        self.empty_rows_eod = rows;
        self
    }

    /// Map a raw header to its canonical field name, case-insensitively.
    /// `None` means the header is unmapped (not necessarily an error; the
    /// wide variants retain unmapped measurement columns).
    pub fn map_header(&self, raw: &str) -> Option<&'static str> {
        let key = raw.trim().to_lowercase();
        self.map.get(key.as_str()).copied()
    }
}
