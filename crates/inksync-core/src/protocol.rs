//! Wire protocol between drawing clients and the relay.
//!
//! Messages are JSON objects tagged by `"type"`:
//! ```json
//! { "type": "draw:start", "x": 0.1, "y": 0.1, "strokeWidth": 2, "color": "#000000", "isEraser": false }
//! { "type": "draw:move", "x": 0.2, "y": 0.1, "strokeWidth": 2, "color": "#000000", "isEraser": false }
//! { "type": "draw:end" }
//! { "type": "strokes", "requestId": 3 }
//! ```
//! The relay adds the sender identity (`from`) when forwarding.

use crate::coords::RatioPoint;
use crate::error::ProtocolError;
use crate::stroke::{DrawStroke, PeerId};
use crate::style::StrokeStyle;
use serde::{Deserialize, Serialize};

/// One sampled point of a local stroke, as emitted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DrawPoint {
    pub x: f64,
    pub y: f64,
    #[serde(flatten)]
    pub style: StrokeStyle,
}

impl DrawPoint {
    pub fn new(point: RatioPoint, style: StrokeStyle) -> Self {
        Self {
            x: point.x,
            y: point.y,
            style,
        }
    }

    pub fn point(&self) -> RatioPoint {
        RatioPoint::new(self.x, self.y)
    }
}

/// Messages sent to the relay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// Join a room
    #[serde(rename = "join")]
    Join { room: String },
    /// Leave current room
    #[serde(rename = "leave")]
    Leave,
    #[serde(rename = "draw:start")]
    DrawStart(DrawPoint),
    #[serde(rename = "draw:move")]
    DrawMove(DrawPoint),
    /// The relay correlates the end with the sender.
    #[serde(rename = "draw:end")]
    DrawEnd,
    #[serde(rename = "canvas:reset")]
    CanvasReset,
    /// Ask for the full stroke history.
    #[serde(rename = "strokes")]
    RequestStrokes {
        #[serde(rename = "requestId")]
        request_id: u64,
    },
}

impl ClientMessage {
    pub fn to_json(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// A forwarded `draw:start` / `draw:move`.
///
/// Carries either the latest point (`x`, `y`) or the whole stroke so far
/// (`points`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteDraw {
    #[serde(alias = "socketId")]
    pub from: PeerId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points: Option<Vec<RatioPoint>>,
    #[serde(flatten)]
    pub style: StrokeStyle,
}

/// What a [`RemoteDraw`] says about the sender's current stroke.
#[derive(Debug, Clone, PartialEq)]
pub enum StrokeUpdate {
    /// One more point to append.
    Point(RatioPoint),
    /// The complete list of points so far.
    Full(Vec<RatioPoint>),
}

impl RemoteDraw {
    /// Single-point form.
    pub fn point(from: impl Into<PeerId>, point: DrawPoint) -> Self {
        Self {
            from: from.into(),
            x: Some(point.x),
            y: Some(point.y),
            points: None,
            style: point.style,
        }
    }

    /// Full-list form.
    pub fn full(from: impl Into<PeerId>, points: Vec<RatioPoint>, style: StrokeStyle) -> Self {
        Self {
            from: from.into(),
            x: None,
            y: None,
            points: Some(points),
            style,
        }
    }

    /// `None` when the payload carries neither form.
    pub fn update(&self) -> Option<StrokeUpdate> {
        if let Some(points) = &self.points {
            return Some(StrokeUpdate::Full(points.clone()));
        }
        match (self.x, self.y) {
            (Some(x), Some(y)) => Some(StrokeUpdate::Point(RatioPoint::new(x, y))),
            _ => None,
        }
    }
}

/// Response to [`ClientMessage::RequestStrokes`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrokesResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strokes: Option<Vec<DrawStroke>>,
}

/// Messages received from the relay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    /// Confirms a room join and tells the client its own identity.
    #[serde(rename = "joined")]
    Joined {
        room: String,
        #[serde(rename = "peerId")]
        peer_id: PeerId,
        #[serde(rename = "peerCount", default)]
        peer_count: usize,
    },
    #[serde(rename = "draw:start")]
    DrawStart(RemoteDraw),
    #[serde(rename = "draw:move")]
    DrawMove(RemoteDraw),
    #[serde(rename = "draw:end")]
    DrawEnd {
        #[serde(alias = "socketId")]
        from: PeerId,
    },
    #[serde(rename = "canvas:reset")]
    CanvasReset {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        from: Option<PeerId>,
    },
    #[serde(rename = "strokes")]
    Strokes(StrokesResponse),
    #[serde(rename = "error")]
    Error { message: String },
}

impl ServerMessage {
    pub fn from_json(json: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::StrokeColor;

    #[test]
    fn test_draw_start_wire_shape() {
        let msg = ClientMessage::DrawStart(DrawPoint::new(
            RatioPoint::new(0.1, 0.1),
            StrokeStyle::pen(StrokeColor::BLACK, 2.0),
        ));
        let json: serde_json::Value = serde_json::from_str(&msg.to_json().unwrap()).unwrap();
        assert_eq!(json["type"], "draw:start");
        assert_eq!(json["x"], 0.1);
        assert_eq!(json["y"], 0.1);
        assert_eq!(json["strokeWidth"], 2.0);
        assert_eq!(json["color"], "#000000");
        assert_eq!(json["isEraser"], false);
    }

    #[test]
    fn test_draw_end_has_no_payload() {
        let json = ClientMessage::DrawEnd.to_json().unwrap();
        assert_eq!(json, r#"{"type":"draw:end"}"#);
    }

    #[test]
    fn test_request_strokes_serialize() {
        let json = ClientMessage::RequestStrokes { request_id: 7 }.to_json().unwrap();
        assert!(json.contains(r#""type":"strokes""#));
        assert!(json.contains(r#""requestId":7"#));
    }

    #[test]
    fn test_remote_single_point() {
        let json = r##"{"type":"draw:move","from":"b","x":0.2,"y":0.1,"strokeWidth":2,"color":"#00FF00"}"##;
        let msg = ServerMessage::from_json(json).unwrap();
        match msg {
            ServerMessage::DrawMove(draw) => {
                assert_eq!(draw.from, "b");
                assert_eq!(draw.update(), Some(StrokeUpdate::Point(RatioPoint::new(0.2, 0.1))));
                assert_eq!(draw.style.color, StrokeColor::rgb(0, 255, 0));
            }
            other => panic!("Wrong message type: {other:?}"),
        }
    }

    #[test]
    fn test_remote_full_list_with_socket_id() {
        let json = r##"{"type":"draw:move","socketId":"b","points":[{"x":0.1,"y":0.1},{"x":0.2,"y":0.2}],"strokeWidth":2,"color":"#000000","isEraser":true}"##;
        let msg = ServerMessage::from_json(json).unwrap();
        let ServerMessage::DrawMove(draw) = msg else {
            panic!("Wrong message type");
        };
        assert_eq!(draw.from, "b");
        assert!(draw.style.is_eraser);
        assert_eq!(
            draw.update(),
            Some(StrokeUpdate::Full(vec![RatioPoint::new(0.1, 0.1), RatioPoint::new(0.2, 0.2)]))
        );
    }

    #[test]
    fn test_remote_zero_width_uses_pen_default() {
        let json = r##"{"type":"draw:start","from":"b","x":0.5,"y":0.5,"strokeWidth":0,"color":"#000000"}"##;
        let ServerMessage::DrawStart(draw) = ServerMessage::from_json(json).unwrap() else {
            panic!("Wrong message type");
        };
        assert!((draw.style.width - crate::style::DEFAULT_PEN_WIDTH).abs() < f64::EPSILON);
    }

    #[test]
    fn test_remote_without_point_has_no_update() {
        let draw = RemoteDraw {
            from: "b".to_string(),
            x: Some(0.5),
            y: None,
            points: None,
            style: StrokeStyle::default(),
        };
        assert_eq!(draw.update(), None);
    }

    #[test]
    fn test_strokes_response_absent_list() {
        let msg = ServerMessage::from_json(r#"{"type":"strokes","requestId":1}"#).unwrap();
        assert_eq!(
            msg,
            ServerMessage::Strokes(StrokesResponse { request_id: Some(1), strokes: None })
        );
    }

    #[test]
    fn test_joined_deserialize() {
        let msg = ServerMessage::from_json(r#"{"type":"joined","room":"r","peerId":"p1","peerCount":2}"#)
            .unwrap();
        assert_eq!(
            msg,
            ServerMessage::Joined { room: "r".into(), peer_id: "p1".into(), peer_count: 2 }
        );
    }

    #[test]
    fn test_unknown_type_is_error() {
        assert!(ServerMessage::from_json(r#"{"type":"cursor","x":1}"#).is_err());
    }
}
