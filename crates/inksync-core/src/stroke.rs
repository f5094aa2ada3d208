//! Freehand strokes as they are persisted and replayed.

use crate::coords::RatioPoint;
use crate::style::StrokeStyle;
use serde::{Deserialize, Serialize};

/// Identity of a participant on the transport channel.
pub type PeerId = String;

/// A stroke in ratio coordinates, owned by the peer that drew it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawStroke {
    #[serde(alias = "socketId")]
    pub peer_id: PeerId,
    #[serde(default)]
    pub points: Vec<RatioPoint>,
    #[serde(flatten)]
    pub style: StrokeStyle,
}

impl DrawStroke {
    /// Start a stroke at its first point.
    pub fn new(peer_id: impl Into<PeerId>, first: RatioPoint, style: StrokeStyle) -> Self {
        Self {
            peer_id: peer_id.into(),
            points: vec![first],
            style,
        }
    }

    /// Append a point while the stroke is live.
    pub fn add_point(&mut self, point: RatioPoint) {
        self.points.push(point);
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::StrokeColor;

    #[test]
    fn test_stroke_accumulates_points() {
        let mut stroke = DrawStroke::new("peer", RatioPoint::new(0.1, 0.1), StrokeStyle::default());
        stroke.add_point(RatioPoint::new(0.2, 0.1));
        assert_eq!(stroke.len(), 2);
        assert!(!stroke.is_empty());
    }

    #[test]
    fn test_deserialize_relay_format() {
        let json = r##"{
            "socketId": "abc",
            "points": [{"x": 0.5, "y": 0.5}],
            "strokeWidth": 3,
            "color": "#FF0000"
        }"##;
        let stroke: DrawStroke = serde_json::from_str(json).unwrap();
        assert_eq!(stroke.peer_id, "abc");
        assert_eq!(stroke.points, vec![RatioPoint::new(0.5, 0.5)]);
        assert_eq!(stroke.style.color, StrokeColor::rgb(255, 0, 0));
        assert!((stroke.style.width - 3.0).abs() < f64::EPSILON);
        assert!(!stroke.style.is_eraser);
    }

    #[test]
    fn test_serialize_uses_peer_id() {
        let stroke = DrawStroke::new("me", RatioPoint::new(0.0, 1.0), StrokeStyle::eraser(20.0));
        let json = serde_json::to_value(&stroke).unwrap();
        assert_eq!(json["peerId"], "me");
        assert_eq!(json["isEraser"], true);
        assert_eq!(json["points"][0]["y"], 1.0);
    }
}
