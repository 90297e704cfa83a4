//! Raster analysis primitives for the geoagent tool service.
//!
//! This crate reads GeoTIFF files and implements the four raster tools:
//!
//! - [`analyze`]: extent, band classification, EPSG and `AREA_OR_POINT`,
//!   with the metadata handed to a [`storage::MetadataSink`]
//! - [`crop`]: geographic window to an 8-bit PNG, rescaled from band 1's range
//! - [`ndvi`]: mean NDVI plus the NDVI at a coordinate
//! - [`dem`]: elevation at a coordinate
//!
//! Coordinates are mapped to pixels with the dataset's affine
//! [`GeoTransform`]; queries outside the raster yield `None` rather than an
//! error.
//!
//! # Example
//!
//! ```no_run
//! use raster::{CropWindow, crop, ndvi};
//!
//! let report = ndvi("field.tif", 512_300.0, 4_410_950.0)?;
//! println!("mean NDVI {:.3}, here {:?}", report.ndvi_mean, report.ndvi_point);
//!
//! let window = CropWindow { minx: 512_000.0, miny: 4_410_000.0, maxx: 513_000.0, maxy: 4_411_000.0 };
//! let png = crop("field.tif", window, "static/outputs")?;
//! println!("wrote {}", png.output_path);
//! # Ok::<(), raster::Error>(())
//! ```

mod dataset;
mod error;
pub mod geometry;
pub mod metadata;
mod ops;

#[cfg(test)]
mod testutil;

pub use dataset::{Band, ColorInterp, Dataset};
pub use error::{Error, Result};
pub use geometry::{Extent, GeoTransform, PixelCoord};
pub use metadata::BandType;
pub use ops::{
    AnalyzeReport, CropReport, CropWindow, DemReport, NdviReport, analyze, crop,
    cropped_output_path, dem, ndvi,
};
