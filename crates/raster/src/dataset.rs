//! GeoTIFF dataset access.
//!
//! A [`Dataset`] is opened per operation and owns its file handle; dropping
//! it closes the file, so every exit path of an operation releases it.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use tiff::decoder::{Decoder, DecodingResult, Limits};
use tiff::tags::Tag;
use tracing::debug;

use crate::error::{Error, Result};
use crate::geometry::GeoTransform;

// GeoTIFF tag IDs
const MODEL_PIXEL_SCALE: u16 = 33550;
const MODEL_TIEPOINT: u16 = 33922;
const MODEL_TRANSFORMATION: u16 = 34264;
const GEO_KEY_DIRECTORY: u16 = 34735;

// GeoKey IDs
const GT_RASTER_TYPE_GEO_KEY: u16 = 1025;
const GEOGRAPHIC_TYPE_GEO_KEY: u16 = 2048;
const PROJECTED_CS_TYPE_GEO_KEY: u16 = 3072;

const RASTER_PIXEL_IS_AREA: u16 = 1;
const RASTER_PIXEL_IS_POINT: u16 = 2;
const USER_DEFINED: u16 = 32767;

const JP2_SIGNATURE: [u8; 12] = [
    0x00, 0x00, 0x00, 0x0C, 0x6A, 0x50, 0x20, 0x20, 0x0D, 0x0A, 0x87, 0x0A,
];
const J2K_CODESTREAM: [u8; 4] = [0xFF, 0x4F, 0xFF, 0x51];

/// Color interpretation of a single band, named as GDAL names them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorInterp {
    Undefined,
    Gray,
    Palette,
    Red,
    Green,
    Blue,
    Alpha,
    Cyan,
    Magenta,
    Yellow,
    Black,
    YCbCrY,
    YCbCrCb,
    YCbCrCr,
}

impl ColorInterp {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Undefined => "Undefined",
            Self::Gray => "Gray",
            Self::Palette => "Palette",
            Self::Red => "Red",
            Self::Green => "Green",
            Self::Blue => "Blue",
            Self::Alpha => "Alpha",
            Self::Cyan => "Cyan",
            Self::Magenta => "Magenta",
            Self::Yellow => "Yellow",
            Self::Black => "Black",
            Self::YCbCrY => "YCbCr_Y",
            Self::YCbCrCb => "YCbCr_Cb",
            Self::YCbCrCr => "YCbCr_Cr",
        }
    }
}

/// One band of samples in row-major order.
#[derive(Debug, Clone, PartialEq)]
pub struct Band {
    pub width: usize,
    pub height: usize,
    pub data: Vec<f64>,
}

impl Band {
    pub fn get(&self, col: usize, row: usize) -> Option<f64> {
        if col >= self.width || row >= self.height {
            return None;
        }
        self.data.get(row * self.width + col).copied()
    }

    /// Minimum and maximum sample, ignoring NaN. `None` for an all-NaN band.
    pub fn min_max(&self) -> Option<(f64, f64)> {
        self.data
            .iter()
            .copied()
            .filter(|v| !v.is_nan())
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}

/// An open raster file.
pub struct Dataset {
    path: PathBuf,
    decoder: Decoder<BufReader<File>>,
    width: usize,
    height: usize,
    transform: GeoTransform,
    color_interp: Vec<ColorInterp>,
    geo_keys: Vec<u16>,
    samples: Option<Vec<f64>>,
}

impl std::fmt::Debug for Dataset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dataset")
            .field("path", &self.path)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bands", &self.color_interp.len())
            .finish()
    }
}

impl Dataset {
    /// Open a raster file and read its header.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut file = File::open(path).map_err(|e| Error::open(path, e))?;

        let mut magic = [0u8; 12];
        let read = file.read(&mut magic).map_err(|e| Error::open(path, e))?;
        if is_jpeg2000(&magic[..read]) {
            return Err(Error::open(path, "JPEG 2000 decoding is not supported"));
        }
        drop(file);

        let file = File::open(path).map_err(|e| Error::open(path, e))?;
        let mut decoder = Decoder::new(BufReader::new(file))
            .map_err(|e| Error::open(path, e))?
            .with_limits(Limits::unlimited());

        let (width, height) = decoder.dimensions().map_err(|e| Error::open(path, e))?;
        let header = read_header(&mut decoder).map_err(|e| Error::open(path, e))?;

        if header.planar == 2 {
            return Err(Error::open(
                path,
                "planar-separate sample layout is not supported",
            ));
        }

        let transform = header.transform.unwrap_or(GeoTransform::IDENTITY);
        let color_interp = band_interpretation(header.photometric, header.samples, &header.extra);

        debug!(
            path = %path.display(),
            width,
            height,
            bands = color_interp.len(),
            "opened dataset"
        );

        Ok(Self {
            path: path.to_path_buf(),
            decoder,
            width: width as usize,
            height: height as usize,
            transform,
            color_interp,
            geo_keys: header.geo_keys,
            samples: None,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn band_count(&self) -> usize {
        self.color_interp.len()
    }

    pub fn geo_transform(&self) -> GeoTransform {
        self.transform
    }

    /// Color interpretation of band `number` (1-based).
    pub fn color_interpretation(&self, number: usize) -> Option<ColorInterp> {
        number
            .checked_sub(1)
            .and_then(|i| self.color_interp.get(i))
            .copied()
    }

    /// EPSG code from the projected or geographic CRS GeoKey.
    pub fn epsg(&self) -> Option<u32> {
        [PROJECTED_CS_TYPE_GEO_KEY, GEOGRAPHIC_TYPE_GEO_KEY]
            .into_iter()
            .filter_map(|key| geo_key(&self.geo_keys, key))
            .find(|&code| code != 0 && code != USER_DEFINED)
            .map(u32::from)
    }

    /// The `AREA_OR_POINT` metadata item, if the raster declares one.
    pub fn area_or_point(&self) -> Option<&'static str> {
        match geo_key(&self.geo_keys, GT_RASTER_TYPE_GEO_KEY)? {
            RASTER_PIXEL_IS_AREA => Some("Area"),
            RASTER_PIXEL_IS_POINT => Some("Point"),
            _ => None,
        }
    }

    /// Read band `number` (1-based) in full.
    pub fn read_band(&mut self, number: usize) -> Result<Band> {
        let bands = self.band_count();
        if number == 0 || number > bands {
            return Err(Error::InsufficientBands {
                required: number,
                found: bands,
            });
        }

        let pixels = self.width * self.height;
        let samples = self.samples()?;
        let data = samples
            .iter()
            .skip(number - 1)
            .step_by(bands)
            .take(pixels)
            .copied()
            .collect();

        Ok(Band {
            width: self.width,
            height: self.height,
            data,
        })
    }

    fn samples(&mut self) -> Result<&[f64]> {
        if self.samples.is_none() {
            let image = self
                .decoder
                .read_image()
                .map_err(|e| Error::open(&self.path, e))?;
            let samples = decoding_to_f64(image).ok_or_else(|| {
                Error::open(&self.path, "unsupported sample format")
            })?;

            let expected = self.width * self.height * self.band_count();
            if samples.len() < expected {
                return Err(Error::open(
                    &self.path,
                    format!("truncated image data: {} of {expected} samples", samples.len()),
                ));
            }
            self.samples = Some(samples);
        }
        Ok(self.samples.as_deref().unwrap_or_default())
    }
}

struct Header {
    photometric: Option<u16>,
    samples: usize,
    planar: u16,
    extra: Vec<u16>,
    transform: Option<GeoTransform>,
    geo_keys: Vec<u16>,
}

fn read_header<R: std::io::Read + std::io::Seek>(
    decoder: &mut Decoder<R>,
) -> tiff::TiffResult<Header> {
    let photometric = decoder.find_tag_unsigned::<u16>(Tag::PhotometricInterpretation)?;
    let samples = decoder
        .find_tag_unsigned::<u16>(Tag::SamplesPerPixel)?
        .unwrap_or(1);
    let planar = decoder
        .find_tag_unsigned::<u16>(Tag::PlanarConfiguration)?
        .unwrap_or(1);
    let extra = decoder
        .find_tag_unsigned_vec::<u16>(Tag::ExtraSamples)?
        .unwrap_or_default();

    let transform = match find_f64_vec(decoder, MODEL_TRANSFORMATION)? {
        Some(matrix) if matrix.len() >= 8 => Some(GeoTransform::from_gdal([
            matrix[3], matrix[0], matrix[1], matrix[7], matrix[4], matrix[5],
        ])),
        _ => {
            let tiepoint = find_f64_vec(decoder, MODEL_TIEPOINT)?;
            let scale = find_f64_vec(decoder, MODEL_PIXEL_SCALE)?;
            transform_from_tiepoint(tiepoint.as_deref(), scale.as_deref())
        }
    };

    let geo_keys = decoder
        .find_tag_unsigned_vec::<u16>(Tag::from_u16_exhaustive(GEO_KEY_DIRECTORY))?
        .unwrap_or_default();

    Ok(Header {
        photometric,
        samples: usize::from(samples.max(1)),
        planar,
        extra,
        transform,
        geo_keys,
    })
}

fn find_f64_vec<R: std::io::Read + std::io::Seek>(
    decoder: &mut Decoder<R>,
    tag: u16,
) -> tiff::TiffResult<Option<Vec<f64>>> {
    decoder
        .find_tag(Tag::from_u16_exhaustive(tag))?
        .map(|value| value.into_f64_vec())
        .transpose()
}

/// Tiepoint `[I, J, K, X, Y, Z]` plus scale `[SX, SY, SZ]` to a north-up transform.
fn transform_from_tiepoint(tiepoint: Option<&[f64]>, scale: Option<&[f64]>) -> Option<GeoTransform> {
    let (tp, sc) = (tiepoint?, scale?);
    if tp.len() < 6 || sc.len() < 2 {
        return None;
    }
    Some(GeoTransform::from_gdal([
        tp[3] - tp[0] * sc[0],
        sc[0],
        0.0,
        tp[4] + tp[1] * sc[1],
        0.0,
        -sc[1],
    ]))
}

fn geo_key(directory: &[u16], key: u16) -> Option<u16> {
    // [version, revision, minor, count, (id, location, count, value)*]
    let count = usize::from(*directory.get(3)?);
    directory
        .get(4..)?
        .chunks_exact(4)
        .take(count)
        .find(|entry| entry[0] == key && entry[1] == 0)
        .map(|entry| entry[3])
}

fn band_interpretation(photometric: Option<u16>, samples: usize, extra: &[u16]) -> Vec<ColorInterp> {
    use ColorInterp::*;

    let base: &[ColorInterp] = match photometric {
        Some(0 | 1) => &[Gray],
        Some(2) => &[Red, Green, Blue],
        Some(3) => &[Palette],
        Some(5) => &[Cyan, Magenta, Yellow, Black],
        Some(6) => &[YCbCrY, YCbCrCb, YCbCrCr],
        _ => &[],
    };

    (0..samples)
        .map(|i| match base.get(i) {
            Some(interp) => *interp,
            None => match i.checked_sub(base.len()).and_then(|e| extra.get(e)) {
                Some(1 | 2) => Alpha,
                _ => Undefined,
            },
        })
        .collect()
}

fn decoding_to_f64(image: DecodingResult) -> Option<Vec<f64>> {
    fn widen<T: Copy + Into<f64>>(values: Vec<T>) -> Vec<f64> {
        values.into_iter().map(Into::into).collect()
    }

    #[allow(clippy::cast_precision_loss, unreachable_patterns)]
    let samples = match image {
        DecodingResult::U8(v) => widen(v),
        DecodingResult::U16(v) => widen(v),
        DecodingResult::U32(v) => widen(v),
        DecodingResult::U64(v) => v.into_iter().map(|s| s as f64).collect(),
        DecodingResult::I8(v) => widen(v),
        DecodingResult::I16(v) => widen(v),
        DecodingResult::I32(v) => widen(v),
        DecodingResult::I64(v) => v.into_iter().map(|s| s as f64).collect(),
        DecodingResult::F32(v) => widen(v),
        DecodingResult::F64(v) => v,
        // Dead with tiff 0.9; catches sample formats added by later releases.
        _ => return None,
    };
    Some(samples)
}

fn is_jpeg2000(magic: &[u8]) -> bool {
    magic.starts_with(&JP2_SIGNATURE) || magic.starts_with(&J2K_CODESTREAM)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{Fixture, write_geotiff};

    #[test]
    fn reads_georeferencing_and_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_geotiff(
            dir.path(),
            "dem.tif",
            &Fixture::gray(4, 3, (0..12).map(|v| v as f32).collect())
                .origin(100.0, 50.0)
                .pixel_size(2.0)
                .epsg(32635),
        );

        let mut ds = Dataset::open(&path).unwrap();
        assert_eq!((ds.width(), ds.height(), ds.band_count()), (4, 3, 1));
        assert_eq!(
            ds.geo_transform().to_gdal(),
            [100.0, 2.0, 0.0, 50.0, 0.0, -2.0]
        );
        assert_eq!(ds.epsg(), Some(32635));
        assert_eq!(ds.area_or_point(), Some("Area"));
        assert_eq!(ds.color_interpretation(1), Some(ColorInterp::Gray));

        let band = ds.read_band(1).unwrap();
        assert_eq!(band.get(3, 2), Some(11.0));
        assert_eq!(band.min_max(), Some((0.0, 11.0)));
    }

    #[test]
    fn deinterleaves_rgb_bands() {
        let dir = tempfile::tempdir().unwrap();
        let fixture = Fixture::rgb(2, 1, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let path = write_geotiff(dir.path(), "rgb.tif", &fixture);

        let mut ds = Dataset::open(&path).unwrap();
        assert_eq!(ds.band_count(), 3);
        assert_eq!(ds.read_band(1).unwrap().data, vec![1.0, 4.0]);
        assert_eq!(ds.read_band(3).unwrap().data, vec![3.0, 6.0]);
        assert!(matches!(
            ds.read_band(4),
            Err(Error::InsufficientBands { required: 4, found: 3 })
        ));
    }

    #[test]
    fn missing_georeferencing_uses_identity() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_geotiff(
            dir.path(),
            "plain.tif",
            &Fixture::gray(2, 2, vec![0.0; 4]).without_georeferencing(),
        );

        let ds = Dataset::open(&path).unwrap();
        assert_eq!(ds.geo_transform(), GeoTransform::IDENTITY);
        assert_eq!(ds.epsg(), None);
        assert_eq!(ds.area_or_point(), None);
    }

    #[test]
    fn missing_file_is_open_error() {
        let err = Dataset::open("/nonexistent/scene.tif").unwrap_err();
        assert!(matches!(err, Error::DatasetOpen { .. }));
    }

    #[test]
    fn garbage_file_is_open_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.tif");
        std::fs::write(&path, b"definitely not a tiff").unwrap();
        assert!(matches!(
            Dataset::open(&path),
            Err(Error::DatasetOpen { .. })
        ));
    }

    #[test]
    fn jpeg2000_is_recognised_and_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scene.jp2");
        let mut bytes = JP2_SIGNATURE.to_vec();
        bytes.extend_from_slice(&[0; 32]);
        std::fs::write(&path, bytes).unwrap();

        let err = Dataset::open(&path).unwrap_err();
        assert!(err.to_string().contains("JPEG 2000"));
    }

    #[test]
    fn interpretation_of_extra_samples() {
        use ColorInterp::*;
        assert_eq!(band_interpretation(Some(2), 4, &[2]), [Red, Green, Blue, Alpha]);
        assert_eq!(band_interpretation(Some(1), 3, &[0, 0]), [Gray, Undefined, Undefined]);
        assert_eq!(band_interpretation(None, 2, &[]), [Undefined, Undefined]);
    }

    #[test]
    fn geo_key_lookup_skips_indirect_entries() {
        let dir = [1, 1, 0, 2, 1025, 0, 1, 2, 2048, 34736, 1, 0];
        assert_eq!(geo_key(&dir, 1025), Some(2));
        assert_eq!(geo_key(&dir, 2048), None);
    }

    #[test]
    fn tiepoint_with_offset_pixel() {
        let gt = transform_from_tiepoint(Some(&[1.0, 2.0, 0.0, 10.0, 20.0, 0.0]), Some(&[0.5, 0.5, 0.0]))
            .unwrap();
        assert_eq!(gt.to_gdal(), [9.5, 0.5, 0.0, 21.0, 0.0, -0.5]);
    }
}
