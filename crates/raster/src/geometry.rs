//! Affine pixel/geographic coordinate mapping.
//!
//! A [`GeoTransform`] carries the six GDAL-ordered coefficients
//! `(origin_x, pixel_width, rot_x, origin_y, rot_y, pixel_height)`. For
//! north-up rasters `pixel_height` is negative: row indices grow downwards
//! while geographic Y grows upwards.

use serde::Serialize;

/// Six-coefficient affine transform between pixel and world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoTransform {
    pub origin_x: f64,
    pub pixel_width: f64,
    pub rot_x: f64,
    pub origin_y: f64,
    pub rot_y: f64,
    pub pixel_height: f64,
}

impl GeoTransform {
    /// Transform used for rasters without georeferencing.
    pub const IDENTITY: Self = Self {
        origin_x: 0.0,
        pixel_width: 1.0,
        rot_x: 0.0,
        origin_y: 0.0,
        rot_y: 0.0,
        pixel_height: 1.0,
    };

    /// Build from GDAL coefficient order.
    pub fn from_gdal(gt: [f64; 6]) -> Self {
        Self {
            origin_x: gt[0],
            pixel_width: gt[1],
            rot_x: gt[2],
            origin_y: gt[3],
            rot_y: gt[4],
            pixel_height: gt[5],
        }
    }

    pub fn to_gdal(&self) -> [f64; 6] {
        [
            self.origin_x,
            self.pixel_width,
            self.rot_x,
            self.origin_y,
            self.rot_y,
            self.pixel_height,
        ]
    }

    pub fn is_rotated(&self) -> bool {
        self.rot_x != 0.0 || self.rot_y != 0.0
    }

    /// Map a world coordinate to fractional pixel/line offsets.
    ///
    /// Rotation terms are ignored. Returns `None` when the transform is
    /// degenerate (zero pixel size) or the offsets are not finite.
    pub fn world_to_pixel(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        let px = (x - self.origin_x) / self.pixel_width;
        let py = (y - self.origin_y) / self.pixel_height;
        (px.is_finite() && py.is_finite()).then_some((px, py))
    }

    /// Map a world coordinate to the integer pixel containing it.
    ///
    /// Offsets are floored, so a coordinate exactly on a cell edge belongs to
    /// the cell to its right/below in pixel space. Unlike truncation toward
    /// zero, a coordinate half a pixel left of the origin maps to `-1`, i.e.
    /// outside the raster, not to column 0.
    pub fn pixel_of(&self, x: f64, y: f64) -> Option<PixelCoord> {
        let (px, py) = self.world_to_pixel(x, y)?;
        #[allow(clippy::cast_possible_truncation)]
        Some(PixelCoord {
            px: px.floor() as i64,
            py: py.floor() as i64,
        })
    }

    /// World coordinate of a pixel corner.
    pub fn pixel_to_world(&self, px: f64, py: f64) -> (f64, f64) {
        (
            self.origin_x + px * self.pixel_width + py * self.rot_x,
            self.origin_y + px * self.rot_y + py * self.pixel_height,
        )
    }

    /// Extent of a `width` x `height` raster under this transform.
    pub fn extent(&self, width: usize, height: usize) -> Extent {
        #[allow(clippy::cast_precision_loss)]
        let (w, h) = (width as f64, height as f64);
        let minx = self.origin_x;
        let maxy = self.origin_y;
        Extent {
            minx,
            miny: maxy + h * self.pixel_height,
            maxx: minx + w * self.pixel_width,
            maxy,
        }
    }
}

/// Integer pixel position, possibly outside the raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PixelCoord {
    pub px: i64,
    pub py: i64,
}

impl PixelCoord {
    /// Column/row indices when the pixel lies inside a `width` x `height` grid.
    pub fn index_in(&self, width: usize, height: usize) -> Option<(usize, usize)> {
        let col = usize::try_from(self.px).ok()?;
        let row = usize::try_from(self.py).ok()?;
        (col < width && row < height).then_some((col, row))
    }
}

/// Axis-aligned geographic extent.
///
/// Derived as `maxx = minx + width * pixel_width` and
/// `miny = maxy + height * pixel_height`; no reordering is applied, so a
/// south-up raster reports `miny > maxy`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Extent {
    pub minx: f64,
    pub miny: f64,
    pub maxx: f64,
    pub maxy: f64,
}

impl Extent {
    pub fn new(minx: f64, miny: f64, maxx: f64, maxy: f64) -> Self {
        Self {
            minx,
            miny,
            maxx,
            maxy,
        }
    }

    /// The extent as a closed WKT polygon ring.
    pub fn to_wkt(&self) -> String {
        let Self {
            minx,
            miny,
            maxx,
            maxy,
        } = *self;
        format!(
            "POLYGON (({minx} {miny}, {maxx} {miny}, {maxx} {maxy}, {minx} {maxy}, {minx} {miny}))"
        )
    }
}
