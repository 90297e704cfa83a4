//! Windowed export to an 8-bit PNG.

use std::path::{Path, PathBuf};

use image::{ExtendedColorType, ImageFormat};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::dataset::Dataset;
use crate::error::{Error, Result};
use crate::geometry::GeoTransform;

/// Geographic crop window in the raster's CRS.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct CropWindow {
    pub minx: f64,
    pub miny: f64,
    pub maxx: f64,
    pub maxy: f64,
}

impl CropWindow {
    /// Corners in `[ulx, uly, lrx, lry]` order.
    ///
    /// Rows run top to bottom, so the upper-left corner pairs `minx` with
    /// `maxy`.
    pub fn corners(&self) -> [f64; 4] {
        [self.minx, self.maxy, self.maxx, self.miny]
    }
}

/// Result of [`crop`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CropReport {
    pub output_path: String,
    pub success: bool,
}

/// `<output_dir>/<stem>_cropped.png` for an input raster path.
///
/// Two crops of files sharing a stem write the same output path; the later
/// one wins.
pub fn cropped_output_path(output_dir: impl AsRef<Path>, input: impl AsRef<Path>) -> PathBuf {
    let stem = input
        .as_ref()
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    output_dir.as_ref().join(format!("{stem}_cropped.png"))
}

/// Crop `window` out of the raster and write it as a PNG under `output_dir`.
///
/// Every band is linearly rescaled from band 1's `[min, max]` to `[0, 255]`.
/// The window is clipped to the raster, so the output never exceeds the
/// raster's own size.
pub fn crop(
    path: impl AsRef<Path>,
    window: CropWindow,
    output_dir: impl AsRef<Path>,
) -> Result<CropReport> {
    let path = path.as_ref();
    let output_path = cropped_output_path(&output_dir, path);
    std::fs::create_dir_all(output_dir.as_ref())?;

    let mut dataset = Dataset::open(path)?;
    let (min, max) = dataset
        .read_band(1)?
        .min_max()
        .ok_or_else(|| Error::Translate("band 1 has no valid samples".to_string()))?;

    info!(
        minx = window.minx,
        miny = window.miny,
        maxx = window.maxx,
        maxy = window.maxy,
        "cropping {}",
        path.display()
    );

    let src = PixelWindow::from_corners(
        &dataset.geo_transform(),
        window.corners(),
        dataset.width(),
        dataset.height(),
    )?;

    let color = png_color_type(dataset.band_count())?;
    let bands = (1..=dataset.band_count())
        .map(|n| dataset.read_band(n))
        .collect::<Result<Vec<_>>>()?;
    drop(dataset);

    let mut pixels = Vec::with_capacity(src.width * src.height * bands.len());
    for row in src.row..src.row + src.height {
        for col in src.col..src.col + src.width {
            for band in &bands {
                pixels.push(band.get(col, row).map_or(0, |v| scale_to_byte(v, min, max)));
            }
        }
    }

    let (width, height) = (dimension(src.width)?, dimension(src.height)?);
    image::save_buffer_with_format(&output_path, &pixels, width, height, color, ImageFormat::Png)
        .map_err(|e| Error::Translate(e.to_string()))?;

    Ok(CropReport {
        output_path: output_path.to_string_lossy().into_owned(),
        success: true,
    })
}

/// Source pixel window, clipped to lie inside the raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PixelWindow {
    col: usize,
    row: usize,
    width: usize,
    height: usize,
}

impl PixelWindow {
    fn from_corners(
        gt: &GeoTransform,
        [ulx, uly, lrx, lry]: [f64; 4],
        raster_width: usize,
        raster_height: usize,
    ) -> Result<Self> {
        if gt.is_rotated() {
            return Err(Error::Translate(
                "rotated geotransforms cannot be cropped by coordinates".to_string(),
            ));
        }

        let (x_off, y_off) = gt
            .world_to_pixel(ulx, uly)
            .ok_or_else(|| Error::Translate("degenerate geotransform".to_string()))?;
        let x_size = (lrx - ulx) / gt.pixel_width;
        let y_size = (lry - uly) / gt.pixel_height;
        if !(x_size.is_finite() && y_size.is_finite()) {
            return Err(Error::Translate("degenerate geotransform".to_string()));
        }

        let (col, row, width, height) = (
            (x_off + 0.001).floor(),
            (y_off + 0.001).floor(),
            (x_size + 0.5).floor(),
            (y_size + 0.5).floor(),
        );
        if width <= 0.0 || height <= 0.0 {
            return Err(Error::Translate(format!(
                "window of {width}x{height} pixels is empty"
            )));
        }

        // Clip in float space; integer sizes never exceed the raster.
        match (clip(col, width, raster_width), clip(row, height, raster_height)) {
            (Some((col, width)), Some((row, height))) => Ok(Self {
                col,
                row,
                width,
                height,
            }),
            _ => Err(Error::Translate(
                "window falls completely outside the raster extent".to_string(),
            )),
        }
    }
}

/// Intersect `[start, start + len)` with `[0, limit)`, as `(start, len)`.
fn clip(start: f64, len: f64, limit: usize) -> Option<(usize, usize)> {
    let lo = start.max(0.0);
    #[allow(clippy::cast_precision_loss)]
    let hi = (start + len).min(limit as f64);
    if hi <= lo {
        return None;
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let (lo, hi) = (lo as usize, hi as usize);
    Some((lo, hi - lo))
}

fn png_color_type(bands: usize) -> Result<ExtendedColorType> {
    match bands {
        1 => Ok(ExtendedColorType::L8),
        2 => Ok(ExtendedColorType::La8),
        3 => Ok(ExtendedColorType::Rgb8),
        4 => Ok(ExtendedColorType::Rgba8),
        n => Err(Error::Translate(format!(
            "PNG output supports 1 to 4 bands, dataset has {n}"
        ))),
    }
}

fn dimension(n: usize) -> Result<u32> {
    u32::try_from(n).map_err(|_| Error::Translate(format!("output dimension {n} too large")))
}

/// Linear `[min, max] -> [0, 255]`, rounded and clamped. A zero-width range
/// maps everything to 0.
fn scale_to_byte(value: f64, min: f64, max: f64) -> u8 {
    if !value.is_finite() || max <= min {
        return 0;
    }
    let scaled = ((value - min) * 255.0 / (max - min)).round();
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let byte = scaled.clamp(0.0, 255.0) as u8;
    byte
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{Fixture, write_geotiff};

    fn north_up() -> GeoTransform {
        GeoTransform::from_gdal([0.0, 1.0, 0.0, 10.0, 0.0, -1.0])
    }

    #[test]
    fn output_path_from_basename() {
        assert_eq!(
            cropped_output_path("static/outputs", "/data/in/scene_01.tif"),
            PathBuf::from("static/outputs/scene_01_cropped.png")
        );
    }

    #[test]
    fn corners_are_upper_left_then_lower_right() {
        let window = CropWindow { minx: 1.0, miny: 2.0, maxx: 3.0, maxy: 4.0 };
        assert_eq!(window.corners(), [1.0, 4.0, 3.0, 2.0]);
    }

    #[test]
    fn pixel_window_inside() {
        let window = CropWindow { minx: 2.0, miny: 3.0, maxx: 6.0, maxy: 8.0 };
        let src = PixelWindow::from_corners(&north_up(), window.corners(), 10, 10).unwrap();
        assert_eq!((src.col, src.row, src.width, src.height), (2, 2, 4, 5));
    }

    #[test]
    fn pixel_window_inverted_is_empty() {
        let window = CropWindow { minx: 6.0, miny: 3.0, maxx: 2.0, maxy: 8.0 };
        let err = PixelWindow::from_corners(&north_up(), window.corners(), 10, 10).unwrap_err();
        assert!(matches!(err, Error::Translate(_)));
    }

    #[test]
    fn pixel_window_outside() {
        let window = CropWindow { minx: 20.0, miny: 3.0, maxx: 25.0, maxy: 8.0 };
        assert!(PixelWindow::from_corners(&north_up(), window.corners(), 10, 10).is_err());
    }

    #[test]
    fn partial_window_is_clipped() {
        let window = CropWindow { minx: -2.0, miny: 8.0, maxx: 2.0, maxy: 10.0 };
        let src = PixelWindow::from_corners(&north_up(), window.corners(), 10, 10).unwrap();
        assert_eq!((src.col, src.row, src.width, src.height), (0, 0, 2, 2));
    }

    #[test]
    fn huge_window_is_clipped_to_raster() {
        let window = CropWindow { minx: 0.0, miny: -1e12, maxx: 1e12, maxy: 10.0 };
        let src = PixelWindow::from_corners(&north_up(), window.corners(), 10, 10).unwrap();
        assert_eq!((src.col, src.row, src.width, src.height), (0, 0, 10, 10));

        let window = CropWindow { minx: -1e300, miny: -1e300, maxx: 1e300, maxy: 1e300 };
        let src = PixelWindow::from_corners(&north_up(), window.corners(), 10, 10).unwrap();
        assert_eq!((src.width, src.height), (10, 10));
    }

    #[test]
    fn clip_bounds() {
        assert_eq!(clip(-3.0, 5.0, 10), Some((0, 2)));
        assert_eq!(clip(8.0, 1e300, 10), Some((8, 2)));
        assert_eq!(clip(-1e300, 2e300, 10), Some((0, 10)));
        assert_eq!(clip(10.0, 4.0, 10), None);
        assert_eq!(clip(-5.0, 5.0, 10), None);
    }

    #[test]
    fn scaling_is_linear_and_clamped() {
        assert_eq!(scale_to_byte(0.0, 0.0, 100.0), 0);
        assert_eq!(scale_to_byte(50.0, 0.0, 100.0), 128);
        assert_eq!(scale_to_byte(100.0, 0.0, 100.0), 255);
        assert_eq!(scale_to_byte(7.0, 7.0, 7.0), 0);
        assert_eq!(scale_to_byte(f64::NAN, 0.0, 1.0), 0);
    }

    #[test]
    fn crop_writes_scaled_png() {
        let dir = tempfile::tempdir().unwrap();
        let samples: Vec<f32> = (0..100).map(|v| v as f32).collect();
        let path = write_geotiff(dir.path(), "scene_01.tif", &Fixture::gray(10, 10, samples).origin(0.0, 10.0));
        let out_dir = dir.path().join("outputs");

        let window = CropWindow { minx: 0.0, miny: 8.0, maxx: 3.0, maxy: 10.0 };
        let report = crop(&path, window, &out_dir).unwrap();
        assert!(report.success);
        assert_eq!(
            PathBuf::from(&report.output_path),
            out_dir.join("scene_01_cropped.png")
        );

        let png = image::open(&report.output_path).unwrap().to_luma8();
        assert_eq!(png.dimensions(), (3, 2));
        assert_eq!(png.get_pixel(0, 0).0, [0]);
        // sample 12 of range [0, 99]
        assert_eq!(png.get_pixel(2, 1).0, [31]);
    }

    #[test]
    fn crop_rgb_keeps_three_channels() {
        let dir = tempfile::tempdir().unwrap();
        let samples: Vec<f32> = (0..12).map(|v| v as f32).collect();
        let path = write_geotiff(dir.path(), "rgb.tif", &Fixture::rgb(2, 2, samples));

        let window = CropWindow { minx: 0.0, miny: 0.0, maxx: 2.0, maxy: 2.0 };
        let report = crop(&path, window, dir.path()).unwrap();
        let png = image::open(&report.output_path).unwrap();
        assert_eq!(png.color(), image::ColorType::Rgb8);
    }

    #[test]
    fn crop_with_oversized_window_writes_whole_raster() {
        let dir = tempfile::tempdir().unwrap();
        let samples: Vec<f32> = (0..100).map(|v| v as f32).collect();
        let path = write_geotiff(dir.path(), "wide.tif", &Fixture::gray(10, 10, samples));

        let window = CropWindow { minx: 0.0, miny: -1e12, maxx: 1e300, maxy: 10.0 };
        let report = crop(&path, window, dir.path()).unwrap();
        let png = image::open(&report.output_path).unwrap().to_luma8();
        assert_eq!(png.dimensions(), (10, 10));
        assert_eq!(png.get_pixel(9, 9).0, [255]);
    }

    #[test]
    fn crop_outside_is_translate_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_geotiff(dir.path(), "a.tif", &Fixture::gray(2, 2, vec![0.0, 1.0, 2.0, 3.0]));

        let window = CropWindow { minx: 50.0, miny: 50.0, maxx: 60.0, maxy: 60.0 };
        assert!(matches!(crop(&path, window, dir.path()), Err(Error::Translate(_))));
    }

    #[test]
    fn crop_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let window = CropWindow { minx: 0.0, miny: 0.0, maxx: 1.0, maxy: 1.0 };
        assert!(matches!(
            crop(dir.path().join("missing.tif"), window, dir.path()),
            Err(Error::DatasetOpen { .. })
        ));
    }
}
