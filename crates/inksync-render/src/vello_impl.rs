//! Vello-based drawing surface.

use inksync_core::coords::ViewportExtent;
use inksync_core::surface::{CompositeMode, Pen, RasterSurface};
use kurbo::{Affine, Cap, Circle, Join, PathSeg, Point, Rect, Stroke};
use peniko::{BlendMode, Color, Compose, Fill, Mix};
use vello::Scene;

/// Retained drawing surface backed by a Vello scene.
///
/// Geometry arrives in logical pixels and is scaled by the device pixel
/// ratio. Eraser segments are drawn inside a `DestOut` layer so they remove
/// whatever is underneath. A [`ScenePresenter`](crate::ScenePresenter) renders
/// [`VelloSurface::scene`] every frame.
pub struct VelloSurface {
    scene: Scene,
    composite: CompositeMode,
    logical: ViewportExtent,
    scale_factor: f64,
}

impl Default for VelloSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl VelloSurface {
    pub fn new() -> Self {
        Self {
            scene: Scene::new(),
            composite: CompositeMode::default(),
            logical: ViewportExtent::ZERO,
            scale_factor: 1.0,
        }
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Physical size of the render target in device pixels.
    pub fn physical_size(&self) -> (u32, u32) {
        (
            (self.logical.width * self.scale_factor).round() as u32,
            (self.logical.height * self.scale_factor).round() as u32,
        )
    }

    fn transform(&self) -> Affine {
        Affine::scale(self.scale_factor)
    }

    /// Clip for eraser layers: the whole logical area.
    fn bounds(&self) -> Rect {
        Rect::new(0.0, 0.0, self.logical.width, self.logical.height)
    }

    /// Run `draw` inside a `DestOut` layer when erasing.
    fn with_composite(&mut self, draw: impl FnOnce(&mut Scene, Affine)) {
        let transform = self.transform();
        match self.composite {
            CompositeMode::SourceOver => draw(&mut self.scene, transform),
            CompositeMode::DestinationOut => {
                let clip = self.bounds();
                self.scene.push_layer(
                    BlendMode::new(Mix::Normal, Compose::DestOut),
                    1.0,
                    transform,
                    &clip,
                );
                draw(&mut self.scene, transform);
                self.scene.pop_layer();
            }
        }
    }
}

fn pen_stroke(width: f64) -> Stroke {
    Stroke::new(width).with_caps(Cap::Round).with_join(Join::Round)
}

impl RasterSurface for VelloSurface {
    fn stroke_segment(&mut self, segment: PathSeg, pen: Pen) {
        let color = Color::from(pen.color);
        let stroke = pen_stroke(pen.width);
        self.with_composite(|scene, transform| {
            scene.stroke(&stroke, transform, color, None, &segment);
        });
    }

    fn fill_dot(&mut self, center: Point, pen: Pen) {
        let color = Color::from(pen.color);
        let dot = Circle::new(center, pen.width / 2.0);
        self.with_composite(|scene, transform| {
            scene.fill(Fill::NonZero, transform, color, None, &dot);
        });
    }

    fn composite(&self) -> CompositeMode {
        self.composite
    }

    fn set_composite(&mut self, mode: CompositeMode) {
        self.composite = mode;
    }

    fn clear(&mut self) {
        self.scene.reset();
    }

    fn resize(&mut self, logical: ViewportExtent, scale_factor: f64) {
        log::debug!(
            "Resizing Vello surface to {}x{} (dpr {})",
            logical.width,
            logical.height,
            scale_factor
        );
        self.logical = logical;
        self.scale_factor = scale_factor;
        self.scene.reset();
    }
}
