//! The drawing context: an optional surface plus the coordinate mapping used
//! to reach it.

use crate::coords::{CoordinateNormalizer, RatioPoint, ViewportExtent};
use crate::render::StrokeRenderer;
use crate::style::StrokeStyle;
use crate::surface::RasterSurface;
use kurbo::Point;

/// Surface, normalizer and renderer bundled together.
///
/// The surface is optional: until the host attaches one (or after it detaches
/// it), every draw and clear is a silent no-op.
#[derive(Debug)]
pub struct Canvas<S> {
    surface: Option<S>,
    normalizer: CoordinateNormalizer,
    scale_factor: f64,
    renderer: StrokeRenderer,
}

impl<S: RasterSurface> Canvas<S> {
    pub fn new(renderer: StrokeRenderer) -> Self {
        Self {
            surface: None,
            normalizer: CoordinateNormalizer::default(),
            scale_factor: 1.0,
            renderer,
        }
    }

    pub fn with_surface(surface: S, renderer: StrokeRenderer) -> Self {
        Self {
            surface: Some(surface),
            normalizer: CoordinateNormalizer::default(),
            scale_factor: 1.0,
            renderer,
        }
    }

    /// Attach a surface, sizing it to the current extent if one is known.
    pub fn attach(&mut self, mut surface: S) {
        if self.normalizer.is_measured() {
            surface.resize(self.normalizer.extent(), self.scale_factor);
        }
        self.surface = Some(surface);
    }

    pub fn detach(&mut self) -> Option<S> {
        self.surface.take()
    }

    pub fn surface(&self) -> Option<&S> {
        self.surface.as_ref()
    }

    pub fn surface_mut(&mut self) -> Option<&mut S> {
        self.surface.as_mut()
    }

    pub fn normalizer(&self) -> &CoordinateNormalizer {
        &self.normalizer
    }

    pub fn extent(&self) -> ViewportExtent {
        self.normalizer.extent()
    }

    pub fn scale_factor(&self) -> f64 {
        self.scale_factor
    }

    /// Replace the logical extent and resize the backing surface.
    pub fn resize(&mut self, extent: ViewportExtent, scale_factor: f64) {
        self.normalizer.set_extent(extent);
        self.scale_factor = scale_factor;
        if let Some(surface) = self.surface.as_mut() {
            surface.resize(extent, scale_factor);
        }
    }

    /// Draw a segment given in pixels.
    pub fn draw_pixels(&mut self, from: Point, to: Point, style: &StrokeStyle) {
        match self.surface.as_mut() {
            Some(surface) => self.renderer.draw_segment(surface, from, to, style),
            None => log::trace!("No surface attached, dropping segment"),
        }
    }

    /// Draw a segment given in ratio coordinates, mapped through the current extent.
    pub fn draw_ratio(&mut self, from: RatioPoint, to: RatioPoint, style: &StrokeStyle) {
        let from = self.normalizer.to_absolute(from);
        let to = self.normalizer.to_absolute(to);
        self.draw_pixels(from, to, style);
    }

    pub fn clear(&mut self) {
        if let Some(surface) = self.surface.as_mut() {
            surface.clear();
        }
    }
}
