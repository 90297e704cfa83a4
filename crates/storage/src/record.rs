//! Raster metadata records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A unique identifier for a stored record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordId(pub Uuid);

impl RecordId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Metadata extracted from an analyzed raster file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataRecord {
    /// Base name of the analyzed file.
    pub filename: String,
    pub uploaded_at: DateTime<Utc>,
    /// EPSG code of the raster CRS, if it declares one.
    pub epsg: Option<u32>,
    /// Value of the `AREA_OR_POINT` metadata item, verbatim.
    pub area_or_point: Option<String>,
    /// Extent polygon as WKT.
    pub geometry_wkt: String,
    /// Absolute path of the source file.
    pub source_path: String,
    /// File size in MiB, rounded to two decimals.
    pub file_size_mb: f64,
    /// Band classification (`RGB`, `Panchromatic`, or joined band names).
    pub band_type: String,
}

/// A record as read back from the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub id: RecordId,
    #[serde(flatten)]
    pub record: MetadataRecord,
}
