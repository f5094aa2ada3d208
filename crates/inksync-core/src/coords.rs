//! Conversion between surface pixels and viewport-relative ratio coordinates.
//!
//! Every point that crosses the wire is a [`RatioPoint`]: a fraction of the
//! logical viewport extent. Pixels are only ever produced by multiplying with
//! the extent that is current at the moment of drawing.

use kurbo::{Point, Size};
use serde::{Deserialize, Serialize};

/// A point relative to the logical viewport extent, each axis nominally in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RatioPoint {
    pub x: f64,
    pub y: f64,
}

impl RatioPoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Logical (un-scaled) size of the drawing surface.
///
/// A zero extent means the surface has not been measured yet.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ViewportExtent {
    pub width: f64,
    pub height: f64,
}

impl ViewportExtent {
    pub const ZERO: Self = Self { width: 0.0, height: 0.0 };

    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Whether both dimensions are known and non-zero.
    pub fn is_measured(&self) -> bool {
        self.width != 0.0 && self.height != 0.0
    }

    pub fn to_size(self) -> Size {
        Size::new(self.width, self.height)
    }
}

impl From<Size> for ViewportExtent {
    fn from(size: Size) -> Self {
        Self::new(size.width, size.height)
    }
}

/// Converts between pixel and ratio space against the current extent.
///
/// The extent is replaced wholesale on every resize; conversions always read
/// whatever value is current when they run.
#[derive(Debug, Clone, Default)]
pub struct CoordinateNormalizer {
    extent: ViewportExtent,
}

impl CoordinateNormalizer {
    pub fn new(extent: ViewportExtent) -> Self {
        Self { extent }
    }

    /// Current logical extent.
    pub fn extent(&self) -> ViewportExtent {
        self.extent
    }

    /// Replace the reference extent.
    pub fn set_extent(&mut self, extent: ViewportExtent) {
        self.extent = extent;
    }

    pub fn is_measured(&self) -> bool {
        self.extent.is_measured()
    }

    /// Pixel position to ratio coordinates.
    ///
    /// Before the surface is measured the input is passed through unchanged,
    /// so the result is not a ratio in that case.
    pub fn to_relative(&self, pixel: Point) -> RatioPoint {
        if !self.extent.is_measured() {
            return RatioPoint::new(pixel.x, pixel.y);
        }
        RatioPoint::new(pixel.x / self.extent.width, pixel.y / self.extent.height)
    }

    /// Ratio coordinates to a pixel position under the current extent.
    pub fn to_absolute(&self, point: RatioPoint) -> Point {
        Point::new(point.x * self.extent.width, point.y * self.extent.height)
    }
}
