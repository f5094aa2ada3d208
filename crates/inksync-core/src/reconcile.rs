//! Remote stroke reconciliation.
//!
//! Each remote peer's live stroke is tracked as the list of points already
//! rendered. Incoming updates are turned into the full list so far and only
//! the indices not yet rendered are drawn, so repeated or overlapping
//! deliveries never draw a segment twice.

use crate::canvas::Canvas;
use crate::coords::RatioPoint;
use crate::protocol::{RemoteDraw, StrokeUpdate};
use crate::stroke::{DrawStroke, PeerId};
use crate::style::StrokeStyle;
use crate::surface::RasterSurface;
use std::collections::HashMap;

/// Points of a peer's current stroke that are already on the surface.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PeerBuffer {
    pub points: Vec<RatioPoint>,
}

/// Reconciles forwarded `draw:*` messages against per-peer buffers.
#[derive(Debug, Default)]
pub struct RemoteStrokeReconciler {
    local_peer: Option<PeerId>,
    buffers: HashMap<PeerId, PeerBuffer>,
}

impl RemoteStrokeReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Identity of the local participant; messages from it are discarded.
    pub fn set_local_peer(&mut self, peer: impl Into<PeerId>) {
        self.local_peer = Some(peer.into());
    }

    pub fn local_peer(&self) -> Option<&str> {
        self.local_peer.as_deref()
    }

    fn is_local(&self, peer: &str) -> bool {
        self.local_peer.as_deref() == Some(peer)
    }

    pub fn buffer(&self, peer: &str) -> Option<&PeerBuffer> {
        self.buffers.get(peer)
    }

    /// Number of peers with a live stroke.
    pub fn live_peers(&self) -> usize {
        self.buffers.len()
    }

    /// A peer began a new stroke. Returns the number of segments drawn.
    pub fn on_draw_start<S: RasterSurface>(&mut self, draw: &RemoteDraw, canvas: &mut Canvas<S>) -> usize {
        if self.is_local(&draw.from) {
            log::trace!("Discarding echoed draw:start");
            return 0;
        }
        self.buffers.insert(draw.from.clone(), PeerBuffer::default());
        self.on_update(draw, canvas)
    }

    /// A peer extended its stroke. Returns the number of segments drawn.
    pub fn on_draw_move<S: RasterSurface>(&mut self, draw: &RemoteDraw, canvas: &mut Canvas<S>) -> usize {
        if self.is_local(&draw.from) {
            log::trace!("Discarding echoed draw:move");
            return 0;
        }
        self.on_update(draw, canvas)
    }

    fn on_update<S: RasterSurface>(&mut self, draw: &RemoteDraw, canvas: &mut Canvas<S>) -> usize {
        let Some(update) = draw.update() else {
            log::warn!("draw message from {} carries no point", draw.from);
            return 0;
        };
        let full = match update {
            StrokeUpdate::Full(points) => points,
            StrokeUpdate::Point(point) => {
                let mut points = self
                    .buffers
                    .get(&draw.from)
                    .map(|b| b.points.clone())
                    .unwrap_or_default();
                points.push(point);
                points
            }
        };
        self.apply_points(&draw.from, full, &draw.style, canvas)
    }

    /// Draw the part of `full` not yet rendered for `peer` and adopt it as
    /// the peer's buffer. A list shorter than the buffer draws nothing and
    /// leaves the buffer as is.
    pub fn apply_points<S: RasterSurface>(
        &mut self,
        peer: &str,
        full: Vec<RatioPoint>,
        style: &StrokeStyle,
        canvas: &mut Canvas<S>,
    ) -> usize {
        let buffer = self.buffers.entry(peer.to_string()).or_default();
        let drawn = draw_new_points(&buffer.points, &full, style, canvas);
        if full.len() >= buffer.points.len() {
            buffer.points = full;
        } else {
            log::debug!(
                "Ignoring shorter stroke update from {} ({} < {})",
                peer,
                full.len(),
                buffer.points.len()
            );
        }
        drawn
    }

    /// A peer finished its stroke.
    pub fn on_draw_end(&mut self, peer: &str) {
        if self.buffers.remove(peer).is_none() {
            log::trace!("draw:end from {} without a live stroke", peer);
        }
    }

    /// The board was reset: clear the surface and forget every live stroke.
    pub fn on_reset<S: RasterSurface>(&mut self, canvas: &mut Canvas<S>) {
        canvas.clear();
        self.buffers.clear();
    }

    /// Replay a persisted stroke onto a freshly cleared surface.
    ///
    /// Every point is drawn. Afterwards the owning peer's buffer holds the
    /// stroke, so live updates that continue it only draw what is new. A
    /// buffer that already extends this stroke is kept.
    pub fn replay<S: RasterSurface>(&mut self, stroke: &DrawStroke, canvas: &mut Canvas<S>) -> usize {
        let drawn = draw_new_points(&[], &stroke.points, &stroke.style, canvas);
        if self.is_local(&stroke.peer_id) {
            return drawn;
        }

        let buffer = self.buffers.entry(stroke.peer_id.clone()).or_default();
        let extends = buffer.points.len() > stroke.points.len()
            && buffer.points.starts_with(&stroke.points);
        if !extends {
            buffer.points = stroke.points.clone();
        }
        drawn
    }
}

/// Draw segments for every index of `full` beyond `rendered`.
fn draw_new_points<S: RasterSurface>(
    rendered: &[RatioPoint],
    full: &[RatioPoint],
    style: &StrokeStyle,
    canvas: &mut Canvas<S>,
) -> usize {
    let mut drawn = 0;
    for i in rendered.len()..full.len() {
        let from = if i == 0 { full[0] } else { full[i - 1] };
        canvas.draw_ratio(from, full[i], style);
        drawn += 1;
    }
    drawn
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::ViewportExtent;
    use crate::protocol::DrawPoint;
    use crate::render::StrokeRenderer;
    use crate::surface::{DrawOp, RecordingSurface};
    use kurbo::Point;

    fn canvas() -> Canvas<RecordingSurface> {
        let mut canvas = Canvas::with_surface(RecordingSurface::new(), StrokeRenderer::default());
        canvas.resize(ViewportExtent::new(100.0, 100.0), 1.0);
        canvas
    }

    fn p(x: f64, y: f64) -> RatioPoint {
        RatioPoint::new(x, y)
    }

    fn single(from: &str, x: f64, y: f64) -> RemoteDraw {
        RemoteDraw::point(from, DrawPoint::new(p(x, y), StrokeStyle::default()))
    }

    fn full(from: &str, points: Vec<RatioPoint>) -> RemoteDraw {
        RemoteDraw::full(from, points, StrokeStyle::default())
    }

    fn calls(canvas: &Canvas<RecordingSurface>) -> usize {
        canvas.surface().unwrap().calls().len()
    }

    #[test]
    fn test_growing_full_lists_draw_each_segment_once() {
        let mut canvas = canvas();
        let mut rec = RemoteStrokeReconciler::new();

        rec.on_draw_start(&full("b", vec![p(0.1, 0.1)]), &mut canvas);
        rec.on_draw_move(&full("b", vec![p(0.1, 0.1), p(0.2, 0.1)]), &mut canvas);
        rec.on_draw_move(&full("b", vec![p(0.1, 0.1), p(0.2, 0.1), p(0.3, 0.1)]), &mut canvas);

        let surface = canvas.surface().unwrap();
        assert_eq!(surface.calls().len(), 3);
        assert_eq!(surface.calls()[0].op, DrawOp::Dot(Point::new(10.0, 10.0)));
        assert_eq!(surface.calls()[1].endpoints(), (Point::new(10.0, 10.0), Point::new(20.0, 10.0)));
        assert_eq!(surface.calls()[2].endpoints(), (Point::new(20.0, 10.0), Point::new(30.0, 10.0)));
    }

    #[test]
    fn test_single_point_payloads_accumulate() {
        let mut canvas = canvas();
        let mut rec = RemoteStrokeReconciler::new();

        assert_eq!(rec.on_draw_start(&single("b", 0.1, 0.1), &mut canvas), 1);
        assert_eq!(rec.on_draw_move(&single("b", 0.2, 0.1), &mut canvas), 1);
        assert_eq!(rec.on_draw_move(&single("b", 0.3, 0.1), &mut canvas), 1);

        assert_eq!(calls(&canvas), 3);
        assert_eq!(rec.buffer("b").unwrap().points.len(), 3);
    }

    #[test]
    fn test_duplicate_full_list_draws_nothing() {
        let mut canvas = canvas();
        let mut rec = RemoteStrokeReconciler::new();
        let points = vec![p(0.1, 0.1), p(0.2, 0.2)];

        assert_eq!(rec.on_draw_start(&full("b", points.clone()), &mut canvas), 2);
        assert_eq!(rec.on_draw_move(&full("b", points), &mut canvas), 0);
        assert_eq!(calls(&canvas), 2);
    }

    #[test]
    fn test_self_echo_is_discarded() {
        let mut canvas = canvas();
        let mut rec = RemoteStrokeReconciler::new();
        rec.set_local_peer("me");

        rec.on_draw_start(&single("me", 0.1, 0.1), &mut canvas);
        rec.on_draw_move(&single("me", 0.2, 0.1), &mut canvas);
        rec.on_draw_end("me");

        assert_eq!(calls(&canvas), 0);
        assert!(rec.buffer("me").is_none());
    }

    #[test]
    fn test_end_removes_buffer_and_restart_draws_from_zero() {
        let mut canvas = canvas();
        let mut rec = RemoteStrokeReconciler::new();

        rec.on_draw_start(&full("b", vec![p(0.1, 0.1), p(0.2, 0.1)]), &mut canvas);
        rec.on_draw_end("b");
        assert!(rec.buffer("b").is_none());

        let drawn = rec.on_draw_start(&full("b", vec![p(0.5, 0.5)]), &mut canvas);
        assert_eq!(drawn, 1);
        let last = canvas.surface().unwrap().calls()[2];
        assert_eq!(last.op, DrawOp::Dot(Point::new(50.0, 50.0)));
    }

    #[test]
    fn test_start_resets_unterminated_stroke() {
        let mut canvas = canvas();
        let mut rec = RemoteStrokeReconciler::new();

        rec.on_draw_start(&single("b", 0.1, 0.1), &mut canvas);
        rec.on_draw_move(&single("b", 0.2, 0.1), &mut canvas);
        rec.on_draw_start(&single("b", 0.9, 0.9), &mut canvas);

        assert_eq!(rec.buffer("b").unwrap().points, vec![p(0.9, 0.9)]);
    }

    #[test]
    fn test_shorter_list_never_retracts() {
        let mut canvas = canvas();
        let mut rec = RemoteStrokeReconciler::new();
        let long = vec![p(0.1, 0.1), p(0.2, 0.1), p(0.3, 0.1)];

        rec.on_draw_start(&full("b", long.clone()), &mut canvas);
        assert_eq!(rec.on_draw_move(&full("b", long[..1].to_vec()), &mut canvas), 0);
        assert_eq!(rec.buffer("b").unwrap().points, long);
    }

    #[test]
    fn test_peers_are_independent() {
        let mut canvas = canvas();
        let mut rec = RemoteStrokeReconciler::new();

        rec.on_draw_start(&single("b", 0.1, 0.1), &mut canvas);
        rec.on_draw_start(&single("c", 0.5, 0.5), &mut canvas);
        rec.on_draw_move(&single("b", 0.2, 0.1), &mut canvas);

        let last = canvas.surface().unwrap().calls()[2];
        assert_eq!(last.endpoints(), (Point::new(10.0, 10.0), Point::new(20.0, 10.0)));
        assert_eq!(rec.live_peers(), 2);
    }

    #[test]
    fn test_reset_clears_surface_and_buffers() {
        let mut canvas = canvas();
        let mut rec = RemoteStrokeReconciler::new();
        rec.on_draw_start(&single("b", 0.1, 0.1), &mut canvas);

        rec.on_reset(&mut canvas);

        assert_eq!(rec.live_peers(), 0);
        assert_eq!(calls(&canvas), 0);
    }

    #[test]
    fn test_replay_seeds_buffer() {
        let mut canvas = canvas();
        let mut rec = RemoteStrokeReconciler::new();
        let mut stroke = DrawStroke::new("b", p(0.1, 0.1), StrokeStyle::default());
        stroke.add_point(p(0.2, 0.1));

        assert_eq!(rec.replay(&stroke, &mut canvas), 2);
        assert_eq!(rec.on_draw_move(&single("b", 0.3, 0.1), &mut canvas), 1);
        assert_eq!(calls(&canvas), 3);
    }

    #[test]
    fn test_replay_of_own_stroke_draws_without_seeding() {
        let mut canvas = canvas();
        let mut rec = RemoteStrokeReconciler::new();
        rec.set_local_peer("me");
        let stroke = DrawStroke::new("me", p(0.1, 0.1), StrokeStyle::default());

        assert_eq!(rec.replay(&stroke, &mut canvas), 1);
        assert!(rec.buffer("me").is_none());
    }

    #[test]
    fn test_move_without_point_is_skipped() {
        let mut canvas = canvas();
        let mut rec = RemoteStrokeReconciler::new();
        let draw = RemoteDraw {
            from: "b".into(),
            x: None,
            y: None,
            points: None,
            style: StrokeStyle::default(),
        };
        assert_eq!(rec.on_draw_move(&draw, &mut canvas), 0);
    }
}
