//! Raster tool operations.
//!
//! Each entry point opens its own [`Dataset`], operates on it and drops it
//! before returning, on success and failure alike.

mod crop;
mod sample;

pub use crop::{CropReport, CropWindow, crop, cropped_output_path};
pub use sample::{DemReport, NdviReport, dem, ndvi};

use std::path::Path;
use std::time::Instant;

use serde::Serialize;
use storage::MetadataSink;
use tracing::{info, warn};

use crate::dataset::Dataset;
use crate::error::Result;
use crate::metadata;

/// Result of [`analyze`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyzeReport {
    pub message: String,
    pub minx: f64,
    pub miny: f64,
    pub maxx: f64,
    pub maxy: f64,
    pub filename: String,
    /// Wall-clock seconds spent on the whole analysis.
    pub elapsed_time: f64,
    pub success: bool,
}

/// Extract metadata and extent of a raster, handing the metadata to `sink`.
///
/// A failing sink is logged and otherwise ignored.
pub fn analyze(path: impl AsRef<Path>, sink: &dyn MetadataSink) -> Result<AnalyzeReport> {
    let started = Instant::now();
    let path = path.as_ref();

    let dataset = Dataset::open(path)?;
    let extent = metadata::extent(&dataset);
    let record = metadata::metadata_record(&dataset, &extent)?;
    drop(dataset);

    match sink.save(&record) {
        Ok(id) => info!(%id, filename = %record.filename, "stored raster metadata"),
        Err(e) => warn!(filename = %record.filename, "failed to store raster metadata: {e}"),
    }

    Ok(AnalyzeReport {
        message: "Raster analyzed successfully.".to_string(),
        minx: extent.minx,
        miny: extent.miny,
        maxx: extent.maxx,
        maxy: extent.maxy,
        filename: record.filename,
        elapsed_time: started.elapsed().as_secs_f64(),
        success: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use crate::testutil::{Fixture, write_geotiff};
    use storage::{MetadataRecord, MetadataStore, RecordId};

    struct FailingSink;

    impl MetadataSink for FailingSink {
        fn save(&self, _record: &MetadataRecord) -> storage::Result<RecordId> {
            Err(storage::Error::Poisoned)
        }
    }

    #[test]
    fn analyze_reports_extent_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let fixture = Fixture::gray(4, 2, vec![1.0; 8]).origin(100.0, 50.0).pixel_size(0.5);
        let path = write_geotiff(dir.path(), "dem.tif", &fixture);
        let store = MetadataStore::in_memory().unwrap();

        let report = analyze(&path, &store).unwrap();
        assert!(report.success);
        assert_eq!(report.filename, "dem.tif");
        assert_eq!(
            (report.minx, report.miny, report.maxx, report.maxy),
            (100.0, 49.0, 102.0, 50.0)
        );
        assert!(report.elapsed_time >= 0.0);

        let stored = store.list(1).unwrap();
        assert_eq!(stored[0].record.band_type, "Panchromatic");
    }

    #[test]
    fn analyze_survives_sink_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_geotiff(dir.path(), "a.tif", &Fixture::gray(1, 1, vec![0.0]));
        assert!(analyze(&path, &FailingSink).unwrap().success);
    }

    #[test]
    fn analyze_missing_file() {
        let store = MetadataStore::in_memory().unwrap();
        let err = analyze("/nonexistent/a.tif", &store).unwrap_err();
        assert!(matches!(err, Error::DatasetOpen { .. }));
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn report_serializes_flat() {
        let report = AnalyzeReport {
            message: "ok".into(),
            minx: 0.0,
            miny: 1.0,
            maxx: 2.0,
            maxy: 3.0,
            filename: "x.tif".into(),
            elapsed_time: 0.5,
            success: true,
        };
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["maxy"], 3.0);
        assert_eq!(value["success"], true);
    }
}
