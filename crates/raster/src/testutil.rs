//! Synthetic GeoTIFF fixtures for tests.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use tiff::encoder::TiffEncoder;
use tiff::encoder::colortype::{Gray32Float, RGB32Float};
use tiff::tags::Tag;

const MODEL_PIXEL_SCALE: u16 = 33550;
const MODEL_TIEPOINT: u16 = 33922;
const GEO_KEY_DIRECTORY: u16 = 34735;

pub(crate) struct Fixture {
    width: u32,
    height: u32,
    rgb: bool,
    samples: Vec<f32>,
    origin: (f64, f64),
    pixel_size: f64,
    epsg: Option<u16>,
    georeferenced: bool,
}

impl Fixture {
    pub(crate) fn gray(width: u32, height: u32, samples: Vec<f32>) -> Self {
        Self::new(width, height, false, samples)
    }

    /// Interleaved band-1/band-2/band-3 samples.
    pub(crate) fn rgb(width: u32, height: u32, samples: Vec<f32>) -> Self {
        Self::new(width, height, true, samples)
    }

    fn new(width: u32, height: u32, rgb: bool, samples: Vec<f32>) -> Self {
        Self {
            width,
            height,
            rgb,
            samples,
            origin: (0.0, f64::from(height)),
            pixel_size: 1.0,
            epsg: None,
            georeferenced: true,
        }
    }

    pub(crate) fn origin(mut self, x: f64, y: f64) -> Self {
        self.origin = (x, y);
        self
    }

    pub(crate) fn pixel_size(mut self, size: f64) -> Self {
        self.pixel_size = size;
        self
    }

    pub(crate) fn epsg(mut self, code: u16) -> Self {
        self.epsg = Some(code);
        self
    }

    pub(crate) fn without_georeferencing(mut self) -> Self {
        self.georeferenced = false;
        self
    }
}

pub(crate) fn write_geotiff(dir: &Path, name: &str, fixture: &Fixture) -> PathBuf {
    let path = dir.join(name);
    let file = BufWriter::new(File::create(&path).unwrap());
    let mut encoder = TiffEncoder::new(file).unwrap();

    macro_rules! write_image {
        ($color:ty) => {{
            let mut image = encoder
                .new_image::<$color>(fixture.width, fixture.height)
                .unwrap();
            if fixture.georeferenced {
                let scale = [fixture.pixel_size, fixture.pixel_size, 0.0];
                let tiepoint = [0.0, 0.0, 0.0, fixture.origin.0, fixture.origin.1, 0.0];
                let mut keys: Vec<u16> = vec![1, 1, 0, 1, 1025, 0, 1, 1];
                if let Some(code) = fixture.epsg {
                    keys[3] = 2;
                    keys.extend_from_slice(&[3072, 0, 1, code]);
                }
                let dir = image.encoder();
                dir.write_tag(Tag::from_u16_exhaustive(MODEL_PIXEL_SCALE), scale.as_slice())
                    .unwrap();
                dir.write_tag(Tag::from_u16_exhaustive(MODEL_TIEPOINT), tiepoint.as_slice())
                    .unwrap();
                dir.write_tag(Tag::from_u16_exhaustive(GEO_KEY_DIRECTORY), keys.as_slice())
                    .unwrap();
            }
            image.write_data(&fixture.samples).unwrap();
        }};
    }

    if fixture.rgb {
        write_image!(RGB32Float);
    } else {
        write_image!(Gray32Float);
    }
    path
}
