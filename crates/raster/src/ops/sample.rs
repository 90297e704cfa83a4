//! Point and aggregate sampling: NDVI and elevation.

use std::path::Path;

use serde::Serialize;

use crate::dataset::{Band, Dataset};
use crate::error::{Error, Result};
use crate::geometry::PixelCoord;

/// Band holding red reflectance.
const RED_BAND: usize = 1;
/// Band holding near-infrared reflectance.
///
/// Band order is a property of the sensor; this service assumes the
/// red/green/NIR layout (band 1 red, band 3 NIR).
const NIR_BAND: usize = 3;

/// Result of [`ndvi`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NdviReport {
    pub ndvi_mean: f64,
    pub px: Option<i64>,
    pub py: Option<i64>,
    /// NDVI at the queried coordinate, `None` outside the raster.
    pub ndvi_point: Option<f64>,
    pub success: bool,
}

/// Result of [`dem`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DemReport {
    /// Elevation at the queried coordinate, `None` outside the raster.
    pub calculated_dem: Option<f64>,
    pub px: Option<i64>,
    pub py: Option<i64>,
    pub success: bool,
}

/// Mean NDVI over the raster plus the NDVI at `(x, y)`.
///
/// Pixels whose NDVI is not finite (both bands zero, or one band infinite)
/// count as `0.0`.
pub fn ndvi(path: impl AsRef<Path>, x: f64, y: f64) -> Result<NdviReport> {
    let mut dataset = Dataset::open(path)?;
    let bands = dataset.band_count();
    if bands < NIR_BAND {
        return Err(Error::InsufficientBands {
            required: NIR_BAND,
            found: bands,
        });
    }

    let red = dataset.read_band(RED_BAND)?;
    let nir = dataset.read_band(NIR_BAND)?;
    let index = ndvi_band(&red, &nir);

    let pixel = dataset.geo_transform().pixel_of(x, y);
    let ndvi_point = lookup(&index, pixel);

    Ok(NdviReport {
        ndvi_mean: mean(&index.data),
        px: pixel.map(|p| p.px),
        py: pixel.map(|p| p.py),
        ndvi_point,
        success: true,
    })
}

/// Elevation from band 1 at `(x, y)`.
pub fn dem(path: impl AsRef<Path>, x: f64, y: f64) -> Result<DemReport> {
    let mut dataset = Dataset::open(path)?;
    let elevation = dataset.read_band(1)?;
    let pixel = dataset.geo_transform().pixel_of(x, y);

    Ok(DemReport {
        calculated_dem: lookup(&elevation, pixel),
        px: pixel.map(|p| p.px),
        py: pixel.map(|p| p.py),
        success: true,
    })
}

/// Per-pixel `(nir - red) / (nir + red)` with non-finite results zeroed.
fn ndvi_band(red: &Band, nir: &Band) -> Band {
    let data = red
        .data
        .iter()
        .zip(&nir.data)
        .map(|(&r, &n)| {
            let v = (n - r) / (n + r);
            if v.is_finite() { v } else { 0.0 }
        })
        .collect();
    Band {
        width: red.width,
        height: red.height,
        data,
    }
}

fn lookup(band: &Band, pixel: Option<PixelCoord>) -> Option<f64> {
    let (col, row) = pixel?.index_in(band.width, band.height)?;
    band.get(col, row)
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let n = values.len() as f64;
    values.iter().sum::<f64>() / n
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{Fixture, write_geotiff};

    /// 10x10 north-up raster at origin (0, 10) with 1-unit pixels.
    fn ndvi_fixture(dir: &Path) -> std::path::PathBuf {
        let mut samples = Vec::with_capacity(300);
        for row in 0..10 {
            for col in 0..10 {
                let (red, nir) = if (row, col) == (0, 0) {
                    (0.0, 0.0)
                } else {
                    (1.0, 3.0)
                };
                samples.extend_from_slice(&[red, 0.0, nir]);
            }
        }
        write_geotiff(dir, "field.tif", &Fixture::rgb(10, 10, samples).origin(0.0, 10.0))
    }

    #[test]
    fn point_inside_raster() {
        let dir = tempfile::tempdir().unwrap();
        let path = ndvi_fixture(dir.path());

        let report = ndvi(&path, 5.5, 4.5).unwrap();
        assert_eq!((report.px, report.py), (Some(5), Some(5)));
        assert_eq!(report.ndvi_point, Some(0.5));
        assert!(report.success);
    }

    #[test]
    fn point_outside_raster_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = ndvi_fixture(dir.path());

        let report = ndvi(&path, -1.0, 4.5).unwrap();
        assert_eq!(report.px, Some(-1));
        assert_eq!(report.ndvi_point, None);
        assert!(report.success);
    }

    #[test]
    fn zero_over_zero_contributes_zero() {
        let dir = tempfile::tempdir().unwrap();
        let path = ndvi_fixture(dir.path());

        let report = ndvi(&path, 0.5, 9.5).unwrap();
        assert_eq!(report.ndvi_point, Some(0.0));
        // 99 pixels at 0.5 and one at 0.0
        assert!((report.ndvi_mean - 0.495).abs() < 1e-12);
        assert!(report.ndvi_mean.is_finite());
    }

    #[test]
    fn ndvi_requires_three_bands() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_geotiff(dir.path(), "gray.tif", &Fixture::gray(2, 2, vec![1.0; 4]));
        assert!(matches!(
            ndvi(&path, 0.5, 0.5),
            Err(Error::InsufficientBands { required: 3, found: 1 })
        ));
    }

    #[test]
    fn infinite_ratio_is_zeroed() {
        let red = Band { width: 2, height: 1, data: vec![1.0, f64::INFINITY] };
        let nir = Band { width: 2, height: 1, data: vec![-1.0, 1.0] };
        assert_eq!(ndvi_band(&red, &nir).data, vec![0.0, 0.0]);
    }

    #[test]
    fn dem_samples_band_one() {
        let dir = tempfile::tempdir().unwrap();
        let heights: Vec<f32> = (0..6).map(|v| 100.0 + v as f32).collect();
        let fixture = Fixture::gray(3, 2, heights).origin(500.0, 200.0).pixel_size(10.0);
        let path = write_geotiff(dir.path(), "dem.tif", &fixture);

        let inside = dem(&path, 525.0, 185.0).unwrap();
        assert_eq!(inside.calculated_dem, Some(105.0));
        assert_eq!((inside.px, inside.py), (Some(2), Some(1)));

        let outside = dem(&path, 525.0, 215.0).unwrap();
        assert_eq!(outside.calculated_dem, None);
        assert!(outside.success);
    }

    #[test]
    fn dem_missing_file() {
        assert!(matches!(
            dem("/nonexistent/dem.tif", 0.0, 0.0),
            Err(Error::DatasetOpen { .. })
        ));
    }
}
