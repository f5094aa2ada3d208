//! Fixed-aspect viewport sizing.

use crate::coords::ViewportExtent;
use serde::{Deserialize, Serialize};

/// Width-to-height ratio of the drawing area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AspectRatio {
    pub width: u32,
    pub height: u32,
}

impl AspectRatio {
    pub const WIDESCREEN: Self = Self { width: 16, height: 9 };

    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Height for a given width, rounded to whole logical units.
    pub fn height_for(&self, width: f64) -> f64 {
        if self.width == 0 {
            return 0.0;
        }
        (width * f64::from(self.height) / f64::from(self.width)).round()
    }
}

impl Default for AspectRatio {
    fn default() -> Self {
        Self::WIDESCREEN
    }
}

/// Computed drawing-area dimensions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportLayout {
    /// Extent used for all ratio math.
    pub logical: ViewportExtent,
    /// Backing store size in device pixels.
    pub physical: (u32, u32),
    pub scale_factor: f64,
}

/// Derives the logical extent from the container width.
#[derive(Debug, Clone, Copy, Default)]
pub struct ViewportSizer {
    aspect: AspectRatio,
}

impl ViewportSizer {
    pub fn new(aspect: AspectRatio) -> Self {
        Self { aspect }
    }

    pub fn aspect(&self) -> AspectRatio {
        self.aspect
    }

    pub fn layout(&self, container_width: f64, scale_factor: f64) -> ViewportLayout {
        let width = if container_width.is_finite() { container_width.max(0.0) } else { 0.0 };
        let scale_factor = if scale_factor.is_finite() && scale_factor > 0.0 {
            scale_factor
        } else {
            log::warn!("Invalid device pixel ratio {}, using 1.0", scale_factor);
            1.0
        };

        let logical = ViewportExtent::new(width, self.aspect.height_for(width));
        let physical = (
            (logical.width * scale_factor).round() as u32,
            (logical.height * scale_factor).round() as u32,
        );
        ViewportLayout { logical, physical, scale_factor }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_widescreen_layout() {
        let layout = ViewportSizer::default().layout(800.0, 1.0);
        assert_eq!(layout.logical, ViewportExtent::new(800.0, 450.0));
        assert_eq!(layout.physical, (800, 450));
    }

    #[test]
    fn test_height_is_rounded() {
        let layout = ViewportSizer::default().layout(1001.0, 1.0);
        // 1001 * 9 / 16 = 563.0625
        assert_eq!(layout.logical.height, 563.0);
    }

    #[test]
    fn test_device_pixel_ratio_scales_physical_only() {
        let layout = ViewportSizer::default().layout(400.0, 2.0);
        assert_eq!(layout.logical, ViewportExtent::new(400.0, 225.0));
        assert_eq!(layout.physical, (800, 450));
        assert_eq!(layout.scale_factor, 2.0);
    }

    #[test]
    fn test_invalid_inputs() {
        let layout = ViewportSizer::default().layout(f64::NAN, 0.0);
        assert_eq!(layout.logical, ViewportExtent::ZERO);
        assert_eq!(layout.scale_factor, 1.0);
    }

    #[test]
    fn test_custom_aspect() {
        let layout = ViewportSizer::new(AspectRatio::new(4, 3)).layout(400.0, 1.0);
        assert_eq!(layout.logical.height, 300.0);
    }
}
