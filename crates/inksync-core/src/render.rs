//! Single-segment stroke rendering.

use crate::style::StrokeStyle;
use crate::surface::{CompositeMode, Pen, RasterSurface};
use kurbo::{Line, PathSeg, Point, QuadBez};
use serde::{Deserialize, Serialize};

/// How a segment between two samples is shaped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Smoothing {
    /// Straight line from sample to sample.
    #[default]
    Straight,
    /// Quadratic curve with its control point at the segment midpoint.
    Midpoint,
}

/// Draws individual stroke segments onto a [`RasterSurface`].
#[derive(Debug, Clone, Copy, Default)]
pub struct StrokeRenderer {
    smoothing: Smoothing,
}

impl StrokeRenderer {
    pub fn new(smoothing: Smoothing) -> Self {
        Self { smoothing }
    }

    pub fn smoothing(&self) -> Smoothing {
        self.smoothing
    }

    /// Segment geometry for `from → to`; depends only on the two points.
    pub fn segment(&self, from: Point, to: Point) -> PathSeg {
        match self.smoothing {
            Smoothing::Straight => PathSeg::Line(Line::new(from, to)),
            Smoothing::Midpoint => PathSeg::Quad(QuadBez::new(from, from.midpoint(to), to)),
        }
    }

    /// Render one segment in pixel space.
    ///
    /// A zero-length segment renders as a dot. The surface is always left in
    /// [`CompositeMode::SourceOver`] afterwards.
    pub fn draw_segment<S: RasterSurface + ?Sized>(
        &self,
        surface: &mut S,
        from: Point,
        to: Point,
        style: &StrokeStyle,
    ) {
        let mode = if style.is_eraser {
            CompositeMode::DestinationOut
        } else {
            CompositeMode::SourceOver
        };
        surface.set_composite(mode);

        let pen = Pen {
            color: style.color,
            width: style.width,
        };
        if from == to {
            surface.fill_dot(from, pen);
        } else {
            surface.stroke_segment(self.segment(from, to), pen);
        }

        surface.set_composite(CompositeMode::SourceOver);
    }
}
