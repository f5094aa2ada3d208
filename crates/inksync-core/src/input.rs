//! Local pointer input: turns press/move/release into rendered segments and
//! outgoing stroke messages.

use crate::canvas::Canvas;
use crate::coords::CoordinateNormalizer;
use crate::protocol::{ClientMessage, DrawPoint};
use crate::style::StrokeStyle;
use crate::surface::RasterSurface;
use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// Pointer event type for unified mouse/touch handling.
///
/// Positions are in logical pixels relative to the surface origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PointerEvent {
    Down { position: Point, button: MouseButton },
    Up { position: Point, button: MouseButton },
    Move { position: Point },
}

/// Where the controller is in a local stroke.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum InputPhase {
    #[default]
    Idle,
    Drawing {
        /// Last rendered pixel position.
        last: Point,
    },
}

/// State machine for the local participant's strokes.
///
/// Every accepted event renders synchronously and yields the message to
/// publish. Events that do not apply to the current phase yield nothing.
#[derive(Debug, Clone, Default)]
pub struct LocalInputController {
    phase: InputPhase,
}

impl LocalInputController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> InputPhase {
        self.phase
    }

    pub fn is_drawing(&self) -> bool {
        matches!(self.phase, InputPhase::Drawing { .. })
    }

    /// Dispatch a pointer event.
    pub fn handle<S: RasterSurface>(
        &mut self,
        event: PointerEvent,
        canvas: &mut Canvas<S>,
        style: &StrokeStyle,
        can_draw: bool,
    ) -> Option<ClientMessage> {
        match event {
            PointerEvent::Down { position, button: MouseButton::Left } => {
                self.press(position, canvas, style, can_draw)
            }
            PointerEvent::Down { button, .. } => {
                log::trace!("Ignoring {:?} button press", button);
                None
            }
            PointerEvent::Move { position } => self.move_to(position, canvas, style),
            PointerEvent::Up { button: MouseButton::Left, .. } => self.release(),
            PointerEvent::Up { .. } => None,
        }
    }

    /// Start a stroke at `position`.
    pub fn press<S: RasterSurface>(
        &mut self,
        position: Point,
        canvas: &mut Canvas<S>,
        style: &StrokeStyle,
        can_draw: bool,
    ) -> Option<ClientMessage> {
        if !can_draw {
            log::debug!("Press ignored: drawing not allowed");
            return None;
        }
        if !canvas.normalizer().is_measured() {
            log::debug!("Press ignored: viewport not measured yet");
            return None;
        }
        if self.is_drawing() {
            return None;
        }

        canvas.draw_pixels(position, position, style);
        self.phase = InputPhase::Drawing { last: position };

        let point = canvas.normalizer().to_relative(position);
        Some(ClientMessage::DrawStart(DrawPoint::new(point, *style)))
    }

    /// Extend the current stroke to `position` using the style in effect now.
    pub fn move_to<S: RasterSurface>(
        &mut self,
        position: Point,
        canvas: &mut Canvas<S>,
        style: &StrokeStyle,
    ) -> Option<ClientMessage> {
        let InputPhase::Drawing { last } = self.phase else {
            return None;
        };

        canvas.draw_pixels(last, position, style);
        self.phase = InputPhase::Drawing { last: position };

        let point = canvas.normalizer().to_relative(position);
        Some(ClientMessage::DrawMove(DrawPoint::new(point, *style)))
    }

    /// Move the in-progress stroke's anchor from one extent to another.
    ///
    /// Called when the surface is resized mid-stroke so the next move starts
    /// from the same relative position.
    pub fn rescale(&mut self, from: &CoordinateNormalizer, to: &CoordinateNormalizer) {
        let InputPhase::Drawing { last } = self.phase else {
            return;
        };
        if !from.is_measured() {
            return;
        }
        let last = to.to_absolute(from.to_relative(last));
        log::trace!("Local stroke anchor rescaled to {:?}", last);
        self.phase = InputPhase::Drawing { last };
    }

    /// Finish the current stroke.
    pub fn release(&mut self) -> Option<ClientMessage> {
        match self.phase {
            InputPhase::Drawing { .. } => {
                self.phase = InputPhase::Idle;
                Some(ClientMessage::DrawEnd)
            }
            InputPhase::Idle => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::{RatioPoint, ViewportExtent};
    use crate::render::StrokeRenderer;
    use crate::style::StrokeColor;
    use crate::surface::{DrawOp, RecordingSurface};

    fn canvas(width: f64, height: f64) -> Canvas<RecordingSurface> {
        let mut canvas = Canvas::with_surface(RecordingSurface::new(), StrokeRenderer::default());
        canvas.resize(ViewportExtent::new(width, height), 1.0);
        canvas
    }

    fn down(x: f64, y: f64) -> PointerEvent {
        PointerEvent::Down { position: Point::new(x, y), button: MouseButton::Left }
    }

    fn up() -> PointerEvent {
        PointerEvent::Up { position: Point::ZERO, button: MouseButton::Left }
    }

    fn mv(x: f64, y: f64) -> PointerEvent {
        PointerEvent::Move { position: Point::new(x, y) }
    }

    #[test]
    fn test_full_stroke_emits_start_move_end() {
        let mut canvas = canvas(1000.0, 1000.0);
        let mut input = LocalInputController::new();
        let style = StrokeStyle::default();

        let start = input.handle(down(100.0, 100.0), &mut canvas, &style, true);
        let moved = input.handle(mv(200.0, 100.0), &mut canvas, &style, true);
        let end = input.handle(up(), &mut canvas, &style, true);

        assert_eq!(
            start,
            Some(ClientMessage::DrawStart(DrawPoint::new(RatioPoint::new(0.1, 0.1), style)))
        );
        assert_eq!(
            moved,
            Some(ClientMessage::DrawMove(DrawPoint::new(RatioPoint::new(0.2, 0.1), style)))
        );
        assert_eq!(end, Some(ClientMessage::DrawEnd));
        assert_eq!(input.phase(), InputPhase::Idle);

        let calls = canvas.surface().unwrap().calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].op, DrawOp::Dot(Point::new(100.0, 100.0)));
        assert_eq!(calls[1].endpoints(), (Point::new(100.0, 100.0), Point::new(200.0, 100.0)));
    }

    #[test]
    fn test_idle_ignores_move_and_release() {
        let mut canvas = canvas(100.0, 100.0);
        let mut input = LocalInputController::new();
        let style = StrokeStyle::default();

        assert_eq!(input.handle(mv(10.0, 10.0), &mut canvas, &style, true), None);
        assert_eq!(input.handle(up(), &mut canvas, &style, true), None);
        assert!(canvas.surface().unwrap().calls().is_empty());
    }

    #[test]
    fn test_press_gated_by_predicate() {
        let mut canvas = canvas(100.0, 100.0);
        let mut input = LocalInputController::new();
        let style = StrokeStyle::default();

        assert_eq!(input.handle(down(10.0, 10.0), &mut canvas, &style, false), None);
        assert!(!input.is_drawing());
        assert!(canvas.surface().unwrap().calls().is_empty());
    }

    #[test]
    fn test_press_deferred_until_measured() {
        let mut canvas = Canvas::with_surface(RecordingSurface::new(), StrokeRenderer::default());
        let mut input = LocalInputController::new();
        let style = StrokeStyle::default();

        assert_eq!(input.handle(down(10.0, 10.0), &mut canvas, &style, true), None);
        assert!(!input.is_drawing());
    }

    #[test]
    fn test_secondary_button_does_not_draw() {
        let mut canvas = canvas(100.0, 100.0);
        let mut input = LocalInputController::new();
        let press = PointerEvent::Down { position: Point::new(5.0, 5.0), button: MouseButton::Right };

        assert_eq!(input.handle(press, &mut canvas, &StrokeStyle::default(), true), None);
        assert!(!input.is_drawing());
    }

    #[test]
    fn test_style_read_on_each_move() {
        let mut canvas = canvas(100.0, 100.0);
        let mut input = LocalInputController::new();
        let pen = StrokeStyle::default();
        let red = StrokeStyle::pen(StrokeColor::rgb(255, 0, 0), 4.0);

        input.handle(down(10.0, 10.0), &mut canvas, &pen, true);
        let msg = input.handle(mv(20.0, 10.0), &mut canvas, &red, true);

        let Some(ClientMessage::DrawMove(point)) = msg else {
            panic!("expected draw:move");
        };
        assert_eq!(point.style, red);
        let calls = canvas.surface().unwrap().calls();
        assert_eq!(calls[1].pen.color, StrokeColor::rgb(255, 0, 0));
        assert!((calls[1].pen.width - 4.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_eraser_payload() {
        let mut canvas = canvas(100.0, 100.0);
        let mut input = LocalInputController::new();
        let eraser = StrokeStyle::eraser(20.0);

        let Some(ClientMessage::DrawStart(point)) =
            input.handle(down(50.0, 50.0), &mut canvas, &eraser, true)
        else {
            panic!("expected draw:start");
        };
        assert!(point.style.is_eraser);
        assert_eq!(point.style.color, StrokeColor::WHITE);
    }

    #[test]
    fn test_rescale_keeps_relative_anchor() {
        let mut canvas = canvas(800.0, 450.0);
        let mut input = LocalInputController::new();
        let style = StrokeStyle::default();
        input.handle(down(400.0, 225.0), &mut canvas, &style, true);

        let before = canvas.normalizer().clone();
        canvas.resize(ViewportExtent::new(400.0, 225.0), 1.0);
        input.rescale(&before, canvas.normalizer());
        input.handle(mv(300.0, 112.5), &mut canvas, &style, true);

        let calls = canvas.surface().unwrap().calls();
        assert_eq!(calls[1].endpoints(), (Point::new(200.0, 112.5), Point::new(300.0, 112.5)));
    }

    #[test]
    fn test_rescale_while_idle_is_noop() {
        let mut input = LocalInputController::new();
        let from = CoordinateNormalizer::new(ViewportExtent::new(800.0, 450.0));
        let to = CoordinateNormalizer::new(ViewportExtent::new(400.0, 225.0));
        input.rescale(&from, &to);
        assert_eq!(input.phase(), InputPhase::Idle);
    }
}
