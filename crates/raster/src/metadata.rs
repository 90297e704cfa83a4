//! Raster metadata extraction.

use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

use chrono::Utc;
use storage::MetadataRecord;

use crate::dataset::Dataset;
use crate::error::Result;
use crate::geometry::Extent;

const BYTES_PER_MIB: f64 = 1024.0 * 1024.0;

/// Summary of what a raster's bands represent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BandType {
    /// Exactly the red, green and blue bands.
    Rgb,
    /// A gray band is present, or there is a single band.
    Panchromatic,
    /// Anything else: the band names joined with commas, in band order.
    Other(String),
}

impl fmt::Display for BandType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rgb => f.write_str("RGB"),
            Self::Panchromatic => f.write_str("Panchromatic"),
            Self::Other(names) => f.write_str(names),
        }
    }
}

/// Extent of the dataset from its geotransform and dimensions.
pub fn extent(dataset: &Dataset) -> Extent {
    dataset
        .geo_transform()
        .extent(dataset.width(), dataset.height())
}

/// Classify the dataset's bands by their color interpretation.
pub fn classify_bands(dataset: &Dataset) -> BandType {
    let names: Vec<String> = (1..=dataset.band_count())
        .filter_map(|n| dataset.color_interpretation(n))
        .map(|interp| capitalize(interp.name()))
        .filter(|name| !name.is_empty())
        .collect();
    classify_names(&names)
}

fn classify_names(names: &[String]) -> BandType {
    let set: BTreeSet<&str> = names.iter().map(String::as_str).collect();
    if set == BTreeSet::from(["Red", "Green", "Blue"]) {
        BandType::Rgb
    } else if set.contains("Gray") || names.len() == 1 {
        BandType::Panchromatic
    } else {
        BandType::Other(names.join(","))
    }
}

/// Upper-case the first character, lower-case the rest.
fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// The `AREA_OR_POINT` tag, verbatim. Absence is not an error.
pub fn area_or_point_tag(dataset: &Dataset) -> Option<String> {
    dataset.area_or_point().map(str::to_string)
}

/// File size in MiB rounded to two decimals.
pub fn file_size_mb(path: impl AsRef<Path>) -> Result<f64> {
    let bytes = std::fs::metadata(path)?.len();
    #[allow(clippy::cast_precision_loss)]
    let mib = bytes as f64 / BYTES_PER_MIB;
    Ok((mib * 100.0).round() / 100.0)
}

/// Build the persistence record for an analyzed dataset.
pub fn metadata_record(dataset: &Dataset, extent: &Extent) -> Result<MetadataRecord> {
    let path = dataset.path();
    let source_path = std::path::absolute(path)?;
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    Ok(MetadataRecord {
        filename,
        uploaded_at: Utc::now(),
        epsg: dataset.epsg(),
        area_or_point: area_or_point_tag(dataset),
        geometry_wkt: extent.to_wkt(),
        source_path: source_path.to_string_lossy().into_owned(),
        file_size_mb: file_size_mb(&source_path)?,
        band_type: classify_bands(dataset).to_string(),
    })
}
