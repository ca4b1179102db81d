//! Ingestion configuration

use serde::{Deserialize, Serialize};

/// Knobs for the chunked batch processor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Rows per chunk; each chunk is one batch write. Higher values trade
    /// memory for fewer round trips.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// Fail a whole record when a mapped header is missing from the schema.
    /// Off by default: permissive mode ignores such fields, which allows
    /// heterogeneous document shapes.
    #[serde(default)]
    pub strict_fields: bool,
}

fn default_chunk_size() -> usize {
    5000
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            strict_fields: false,
        }
    }
}
