//! SQLite-backed persistence for raster metadata.
//!
//! Every file analyzed by the raster tool service produces one
//! [`MetadataRecord`]: filename, upload time, EPSG code, `AREA_OR_POINT` tag,
//! extent polygon, absolute path, size and band classification. The record is
//! handed to a [`MetadataSink`]; [`MetadataStore`] is the SQLite
//! implementation used by the service and by `geoagent records`.
//!
//! # Example
//!
//! ```no_run
//! use chrono::Utc;
//! use storage::{MetadataRecord, MetadataSink, MetadataStore};
//!
//! let store = MetadataStore::open("geoagent.db")?;
//! store.save(&MetadataRecord {
//!     filename: "scene.tif".into(),
//!     uploaded_at: Utc::now(),
//!     epsg: Some(4326),
//!     area_or_point: Some("Area".into()),
//!     geometry_wkt: "POLYGON ((0 0, 1 0, 1 1, 0 1, 0 0))".into(),
//!     source_path: "/data/scene.tif".into(),
//!     file_size_mb: 0.5,
//!     band_type: "RGB".into(),
//! })?;
//!
//! for stored in store.list(10)? {
//!     println!("{}: {}", stored.id, stored.record.filename);
//! }
//! # Ok::<(), storage::Error>(())
//! ```

mod error;
mod record;
mod store;

pub use error::{Error, Result};
pub use record::{MetadataRecord, RecordId, StoredRecord};
pub use store::{MetadataSink, MetadataStore};
