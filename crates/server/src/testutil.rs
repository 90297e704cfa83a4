//! GeoTIFF fixtures for tool service tests.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use tiff::encoder::TiffEncoder;
use tiff::encoder::colortype::Gray32Float;
use tiff::tags::Tag;

/// A 2x2 elevation raster with origin (0, 2) and 1-unit pixels:
/// `[[1, 4], [9, 16]]`.
pub(crate) fn write_dem(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    let file = BufWriter::new(File::create(&path).unwrap());
    let mut encoder = TiffEncoder::new(file).unwrap();
    let mut image = encoder.new_image::<Gray32Float>(2, 2).unwrap();

    let scale = [1.0f64, 1.0, 0.0];
    let tiepoint = [0.0f64, 0.0, 0.0, 0.0, 2.0, 0.0];
    let keys: [u16; 8] = [1, 1, 0, 1, 1025, 0, 1, 1];
    let tags = image.encoder();
    tags.write_tag(Tag::from_u16_exhaustive(33550), scale.as_slice()).unwrap();
    tags.write_tag(Tag::from_u16_exhaustive(33922), tiepoint.as_slice()).unwrap();
    tags.write_tag(Tag::from_u16_exhaustive(34735), keys.as_slice()).unwrap();

    image.write_data(&[1.0, 4.0, 9.0, 16.0]).unwrap();
    path
}
