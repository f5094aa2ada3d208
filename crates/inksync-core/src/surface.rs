//! Raster surface contract consumed from the host, plus an in-memory recorder.

use crate::coords::ViewportExtent;
use crate::style::StrokeColor;
use kurbo::{ParamCurve, PathSeg, Point};

/// How new pixels combine with what is already on the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompositeMode {
    /// Paint over existing pixels.
    #[default]
    SourceOver,
    /// Remove existing pixels where the new shape is drawn.
    DestinationOut,
}

/// Stroke attributes for a single surface call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pen {
    pub color: StrokeColor,
    pub width: f64,
}

/// A 2D raster surface that strokes are drawn onto.
///
/// All geometry is in logical pixels; implementations apply the device pixel
/// ratio themselves. Strokes use round caps and round joins.
pub trait RasterSurface {
    /// Stroke one path segment.
    fn stroke_segment(&mut self, segment: PathSeg, pen: Pen);

    /// Fill a round dot centered on `center` with diameter `pen.width`.
    fn fill_dot(&mut self, center: Point, pen: Pen);

    /// Current composite mode.
    fn composite(&self) -> CompositeMode;

    /// Switch the composite mode used by subsequent calls.
    fn set_composite(&mut self, mode: CompositeMode);

    /// Erase everything.
    fn clear(&mut self);

    /// Adopt a new logical extent and device pixel ratio. Implementations may
    /// discard their contents.
    fn resize(&mut self, logical: ViewportExtent, scale_factor: f64);
}

/// Shape of a recorded call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DrawOp {
    Segment(PathSeg),
    Dot(Point),
}

/// A draw call captured by [`RecordingSurface`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawCall {
    pub op: DrawOp,
    pub pen: Pen,
    pub composite: CompositeMode,
}

impl DrawCall {
    /// First and last point of the call; equal for dots.
    pub fn endpoints(&self) -> (Point, Point) {
        match self.op {
            DrawOp::Segment(seg) => (seg.start(), seg.end()),
            DrawOp::Dot(center) => (center, center),
        }
    }

    pub fn is_dot(&self) -> bool {
        matches!(self.op, DrawOp::Dot(_))
    }
}

/// Surface that records calls instead of rasterizing them.
///
/// Used for headless replay and in tests.
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    calls: Vec<DrawCall>,
    composite: CompositeMode,
    logical: ViewportExtent,
    scale_factor: f64,
    clears: usize,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self {
            scale_factor: 1.0,
            ..Self::default()
        }
    }

    /// Calls drawn since the last clear.
    pub fn calls(&self) -> &[DrawCall] {
        &self.calls
    }

    /// Drain the recorded calls without counting it as a clear.
    pub fn take_calls(&mut self) -> Vec<DrawCall> {
        std::mem::take(&mut self.calls)
    }

    /// Number of times the surface was cleared (including by resize).
    pub fn clear_count(&self) -> usize {
        self.clears
    }

    pub fn logical_extent(&self) -> ViewportExtent {
        self.logical
    }

    pub fn scale_factor(&self) -> f64 {
        self.scale_factor
    }

    /// Physical pixel size of the backing store.
    pub fn physical_size(&self) -> (u32, u32) {
        let w = (self.logical.width * self.scale_factor).round().max(0.0);
        let h = (self.logical.height * self.scale_factor).round().max(0.0);
        (w as u32, h as u32)
    }

    fn record(&mut self, op: DrawOp, pen: Pen) {
        self.calls.push(DrawCall {
            op,
            pen,
            composite: self.composite,
        });
    }
}

impl RasterSurface for RecordingSurface {
    fn stroke_segment(&mut self, segment: PathSeg, pen: Pen) {
        self.record(DrawOp::Segment(segment), pen);
    }

    fn fill_dot(&mut self, center: Point, pen: Pen) {
        self.record(DrawOp::Dot(center), pen);
    }

    fn composite(&self) -> CompositeMode {
        self.composite
    }

    fn set_composite(&mut self, mode: CompositeMode) {
        self.composite = mode;
    }

    fn clear(&mut self) {
        self.calls.clear();
        self.clears += 1;
    }

    fn resize(&mut self, logical: ViewportExtent, scale_factor: f64) {
        // Resizing a canvas backing store wipes it.
        self.logical = logical;
        self.scale_factor = scale_factor;
        self.clear();
    }
}
