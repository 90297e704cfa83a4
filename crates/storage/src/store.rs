//! SQLite metadata store implementation.

use crate::{Error, MetadataRecord, RecordId, Result, StoredRecord};
use rusqlite::{Connection, params};
use std::path::Path;
use std::sync::Mutex;

/// Receiver of raster metadata produced by analysis.
///
/// Implementations persist or forward the record. Callers treat failures as
/// non-fatal.
pub trait MetadataSink {
    fn save(&self, record: &MetadataRecord) -> Result<RecordId>;
}

impl<S: MetadataSink> MetadataSink for Mutex<S> {
    fn save(&self, record: &MetadataRecord) -> Result<RecordId> {
        let inner = self.lock().map_err(|_| Error::Poisoned)?;
        inner.save(record)
    }
}

/// SQLite-backed metadata store.
pub struct MetadataStore {
    conn: Connection,
}

impl MetadataStore {
    /// Open or create a metadata store at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    /// Create an in-memory metadata store (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS raster_metadata (
                id TEXT PRIMARY KEY,
                filename TEXT NOT NULL,
                uploaded_at TEXT NOT NULL,
                epsg INTEGER,
                area_or_point TEXT,
                geometry_wkt TEXT NOT NULL,
                source_path TEXT NOT NULL,
                file_size_mb REAL NOT NULL,
                band_type TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_raster_metadata_uploaded
                ON raster_metadata(uploaded_at);
            "#,
        )?;
        Ok(())
    }

    /// Insert a record and return its generated id.
    pub fn insert(&self, record: &MetadataRecord) -> Result<RecordId> {
        let id = RecordId::new();
        self.conn.execute(
            "INSERT INTO raster_metadata
                (id, filename, uploaded_at, epsg, area_or_point, geometry_wkt,
                 source_path, file_size_mb, band_type)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                id.to_string(),
                record.filename,
                record.uploaded_at.to_rfc3339(),
                record.epsg,
                record.area_or_point,
                record.geometry_wkt,
                record.source_path,
                record.file_size_mb,
                record.band_type,
            ],
        )?;
        Ok(id)
    }

    /// List the most recent records, newest first.
    pub fn list(&self, limit: usize) -> Result<Vec<StoredRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, filename, uploaded_at, epsg, area_or_point, geometry_wkt,
                    source_path, file_size_mb, band_type
             FROM raster_metadata ORDER BY uploaded_at DESC LIMIT ?1",
        )?;

        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let records = stmt
            .query_map([limit], |row| {
                let id: String = row.get(0)?;
                let uploaded_at: String = row.get(2)?;
                Ok((
                    id,
                    uploaded_at,
                    MetadataRecordRow {
                        filename: row.get(1)?,
                        epsg: row.get(3)?,
                        area_or_point: row.get(4)?,
                        geometry_wkt: row.get(5)?,
                        source_path: row.get(6)?,
                        file_size_mb: row.get(7)?,
                        band_type: row.get(8)?,
                    },
                ))
            })?
            .filter_map(|r| r.ok())
            .filter_map(|(id, uploaded_at, row)| {
                Some(StoredRecord {
                    id: RecordId(id.parse().ok()?),
                    record: row.into_record(uploaded_at.parse().ok()?),
                })
            })
            .collect();

        Ok(records)
    }

    /// Count stored records.
    pub fn count(&self) -> Result<usize> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM raster_metadata", [], |row| row.get(0))?;
        Ok(usize::try_from(n).unwrap_or(0))
    }
}

impl MetadataSink for MetadataStore {
    fn save(&self, record: &MetadataRecord) -> Result<RecordId> {
        self.insert(record)
    }
}

struct MetadataRecordRow {
    filename: String,
    epsg: Option<u32>,
    area_or_point: Option<String>,
    geometry_wkt: String,
    source_path: String,
    file_size_mb: f64,
    band_type: String,
}

impl MetadataRecordRow {
    fn into_record(self, uploaded_at: chrono::DateTime<chrono::Utc>) -> MetadataRecord {
        MetadataRecord {
            filename: self.filename,
            uploaded_at,
            epsg: self.epsg,
            area_or_point: self.area_or_point,
            geometry_wkt: self.geometry_wkt,
            source_path: self.source_path,
            file_size_mb: self.file_size_mb,
            band_type: self.band_type,
        }
    }
}
