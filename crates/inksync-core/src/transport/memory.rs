//! In-process relay for tests and headless use.
//!
//! Behaves like the WebSocket relay: every message is forwarded to all
//! connected peers (the sender included), strokes are accumulated into a
//! history, and `strokes` requests are answered from that history.

use super::{ConnectionState, Transport, TransportEvent, track_state};
use crate::error::{TransportError, TransportResult};
use crate::protocol::{ClientMessage, DrawPoint, RemoteDraw, ServerMessage, StrokesResponse};
use crate::stroke::{DrawStroke, PeerId};
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;
use uuid::Uuid;

/// How the relay forwards stroke points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RelayMode {
    /// Forward only the latest point.
    #[default]
    LatestPoint,
    /// Forward the whole stroke accumulated so far.
    FullStroke,
}

#[derive(Default)]
struct RelayState {
    mode: RelayMode,
    /// Connected peers in connection order.
    peers: Vec<PeerId>,
    inboxes: HashMap<PeerId, VecDeque<TransportEvent>>,
    history: Vec<DrawStroke>,
    /// Index into `history` of each peer's live stroke.
    live: HashMap<PeerId, usize>,
    hold_snapshots: bool,
    held: Vec<(PeerId, ServerMessage)>,
}

impl RelayState {
    fn deliver(&mut self, peer: &str, msg: ServerMessage) {
        if let Some(inbox) = self.inboxes.get_mut(peer) {
            inbox.push_back(TransportEvent::Message(msg));
        }
    }

    fn broadcast(&mut self, msg: &ServerMessage) {
        for peer in &self.peers {
            if let Some(inbox) = self.inboxes.get_mut(peer) {
                inbox.push_back(TransportEvent::Message(msg.clone()));
            }
        }
    }

    fn forward_draw(&self, from: &str, latest: DrawPoint, index: usize) -> RemoteDraw {
        match self.mode {
            RelayMode::LatestPoint => RemoteDraw::point(from, latest),
            RelayMode::FullStroke => {
                let stroke = &self.history[index];
                RemoteDraw::full(from, stroke.points.clone(), stroke.style)
            }
        }
    }

    fn handle(&mut self, from: &str, msg: &ClientMessage) {
        match msg {
            ClientMessage::Join { room } => {
                let joined = ServerMessage::Joined {
                    room: room.clone(),
                    peer_id: from.to_string(),
                    peer_count: self.peers.len(),
                };
                self.deliver(from, joined);
            }
            ClientMessage::Leave => {
                self.live.remove(from);
            }
            ClientMessage::DrawStart(point) => {
                self.history.push(DrawStroke::new(from, point.point(), point.style));
                let index = self.history.len() - 1;
                self.live.insert(from.to_string(), index);
                let draw = self.forward_draw(from, *point, index);
                self.broadcast(&ServerMessage::DrawStart(draw));
            }
            ClientMessage::DrawMove(point) => {
                let index = match self.live.get(from) {
                    Some(&index) => {
                        self.history[index].add_point(point.point());
                        index
                    }
                    None => {
                        log::warn!("draw:move from {} without a live stroke", from);
                        self.history.push(DrawStroke::new(from, point.point(), point.style));
                        let index = self.history.len() - 1;
                        self.live.insert(from.to_string(), index);
                        index
                    }
                };
                let draw = self.forward_draw(from, *point, index);
                self.broadcast(&ServerMessage::DrawMove(draw));
            }
            ClientMessage::DrawEnd => {
                self.live.remove(from);
                self.broadcast(&ServerMessage::DrawEnd { from: from.to_string() });
            }
            ClientMessage::CanvasReset => {
                self.history.clear();
                self.live.clear();
                self.broadcast(&ServerMessage::CanvasReset { from: Some(from.to_string()) });
            }
            ClientMessage::RequestStrokes { request_id } => {
                let response = ServerMessage::Strokes(StrokesResponse {
                    request_id: Some(*request_id),
                    strokes: Some(self.history.clone()),
                });
                if self.hold_snapshots {
                    self.held.push((from.to_string(), response));
                } else {
                    self.deliver(from, response);
                }
            }
        }
    }
}

/// Shared in-memory relay. Cloning yields another handle to the same relay.
#[derive(Clone, Default)]
pub struct MemoryRelay {
    state: Rc<RefCell<RelayState>>,
}

impl MemoryRelay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mode(mode: RelayMode) -> Self {
        let relay = Self::new();
        relay.state.borrow_mut().mode = mode;
        relay
    }

    /// Connect a new peer with a fresh identity.
    pub fn connect(&self) -> MemoryTransport {
        let peer_id = Uuid::new_v4().to_string();
        let mut state = self.state.borrow_mut();
        state.peers.push(peer_id.clone());
        state
            .inboxes
            .insert(peer_id.clone(), VecDeque::from([TransportEvent::Connected]));
        log::debug!("Memory relay: peer {} connected", peer_id);

        MemoryTransport {
            peer_id,
            relay: Rc::clone(&self.state),
            state: ConnectionState::Connecting,
        }
    }

    /// Snapshot of the accumulated history.
    pub fn history(&self) -> Vec<DrawStroke> {
        self.state.borrow().history.clone()
    }

    /// Replace the history, e.g. to simulate a persisted board.
    pub fn set_history(&self, strokes: Vec<DrawStroke>) {
        let mut state = self.state.borrow_mut();
        state.history = strokes;
        state.live.clear();
    }

    /// Hold `strokes` responses until [`MemoryRelay::release_snapshots`].
    pub fn hold_snapshots(&self, hold: bool) {
        self.state.borrow_mut().hold_snapshots = hold;
    }

    /// Deliver held `strokes` responses in the order they were requested.
    pub fn release_snapshots(&self) -> usize {
        let mut state = self.state.borrow_mut();
        let held = std::mem::take(&mut state.held);
        let count = held.len();
        for (peer, msg) in held {
            state.deliver(&peer, msg);
        }
        count
    }

    pub fn peer_count(&self) -> usize {
        self.state.borrow().peers.len()
    }
}

/// One peer's connection to a [`MemoryRelay`].
pub struct MemoryTransport {
    peer_id: PeerId,
    relay: Rc<RefCell<RelayState>>,
    state: ConnectionState,
}

impl MemoryTransport {
    /// Identity assigned by the relay.
    pub fn peer_id(&self) -> &str {
        &self.peer_id
    }

    /// Disconnect from the relay. Further sends fail.
    pub fn disconnect(&mut self) {
        let mut relay = self.relay.borrow_mut();
        relay.peers.retain(|p| p != &self.peer_id);
        relay.inboxes.remove(&self.peer_id);
        relay.live.remove(&self.peer_id);
        self.state = ConnectionState::Disconnected;
    }
}

impl Transport for MemoryTransport {
    fn send(&self, message: &ClientMessage) -> TransportResult<()> {
        let mut relay = self.relay.borrow_mut();
        if !relay.inboxes.contains_key(&self.peer_id) {
            return Err(TransportError::NotConnected);
        }
        relay.handle(&self.peer_id, message);
        Ok(())
    }

    fn poll_events(&mut self) -> Vec<TransportEvent> {
        let events: Vec<TransportEvent> = self
            .relay
            .borrow_mut()
            .inboxes
            .get_mut(&self.peer_id)
            .map(|inbox| inbox.drain(..).collect())
            .unwrap_or_default();
        for event in &events {
            track_state(&mut self.state, event);
        }
        events
    }

    fn state(&self) -> ConnectionState {
        self.state
    }
}

impl Drop for MemoryTransport {
    fn drop(&mut self) {
        if self.state != ConnectionState::Disconnected {
            self.disconnect();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::RatioPoint;
    use crate::protocol::{DrawPoint, StrokeUpdate};
    use crate::style::StrokeStyle;

    fn point(x: f64, y: f64) -> DrawPoint {
        DrawPoint::new(RatioPoint::new(x, y), StrokeStyle::default())
    }

    fn messages(transport: &mut MemoryTransport) -> Vec<ServerMessage> {
        transport
            .poll_events()
            .into_iter()
            .filter_map(|e| match e {
                TransportEvent::Message(m) => Some(m),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_connect_emits_connected() {
        let relay = MemoryRelay::new();
        let mut a = relay.connect();
        assert_eq!(a.state(), ConnectionState::Connecting);
        assert_eq!(a.poll_events(), vec![TransportEvent::Connected]);
        assert!(a.is_connected());
    }

    #[test]
    fn test_join_reports_identity() {
        let relay = MemoryRelay::new();
        let mut a = relay.connect();
        a.send(&ClientMessage::Join { room: "r".into() }).unwrap();
        let msgs = messages(&mut a);
        assert_eq!(
            msgs,
            vec![ServerMessage::Joined {
                room: "r".into(),
                peer_id: a.peer_id().to_string(),
                peer_count: 1
            }]
        );
    }

    #[test]
    fn test_broadcast_includes_sender() {
        let relay = MemoryRelay::new();
        let mut a = relay.connect();
        let mut b = relay.connect();

        a.send(&ClientMessage::DrawStart(point(0.1, 0.1))).unwrap();

        let for_a = messages(&mut a);
        let for_b = messages(&mut b);
        assert_eq!(for_a.len(), 1);
        assert_eq!(for_a, for_b);
        match &for_b[0] {
            ServerMessage::DrawStart(draw) => assert_eq!(draw.from, a.peer_id()),
            other => panic!("Wrong message type: {other:?}"),
        }
    }

    #[test]
    fn test_history_accumulates() {
        let relay = MemoryRelay::new();
        let a = relay.connect();
        a.send(&ClientMessage::DrawStart(point(0.1, 0.1))).unwrap();
        a.send(&ClientMessage::DrawMove(point(0.2, 0.1))).unwrap();
        a.send(&ClientMessage::DrawEnd).unwrap();
        a.send(&ClientMessage::DrawStart(point(0.5, 0.5))).unwrap();

        let history = relay.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].points.len(), 2);
        assert_eq!(history[1].points, vec![RatioPoint::new(0.5, 0.5)]);
    }

    #[test]
    fn test_full_stroke_mode() {
        let relay = MemoryRelay::with_mode(RelayMode::FullStroke);
        let a = relay.connect();
        let mut b = relay.connect();
        a.send(&ClientMessage::DrawStart(point(0.1, 0.1))).unwrap();
        a.send(&ClientMessage::DrawMove(point(0.2, 0.1))).unwrap();

        let msgs = messages(&mut b);
        let ServerMessage::DrawMove(draw) = &msgs[1] else {
            panic!("expected draw:move");
        };
        assert_eq!(
            draw.update(),
            Some(StrokeUpdate::Full(vec![RatioPoint::new(0.1, 0.1), RatioPoint::new(0.2, 0.1)]))
        );
    }

    #[test]
    fn test_reset_clears_history() {
        let relay = MemoryRelay::new();
        let a = relay.connect();
        a.send(&ClientMessage::DrawStart(point(0.1, 0.1))).unwrap();
        a.send(&ClientMessage::CanvasReset).unwrap();
        assert!(relay.history().is_empty());
    }

    #[test]
    fn test_held_snapshots() {
        let relay = MemoryRelay::new();
        let mut a = relay.connect();
        a.poll_events();
        relay.hold_snapshots(true);
        a.send(&ClientMessage::RequestStrokes { request_id: 1 }).unwrap();
        assert!(messages(&mut a).is_empty());

        assert_eq!(relay.release_snapshots(), 1);
        let msgs = messages(&mut a);
        assert!(matches!(
            msgs.as_slice(),
            [ServerMessage::Strokes(StrokesResponse { request_id: Some(1), .. })]
        ));
    }

    #[test]
    fn test_send_after_disconnect_fails() {
        let relay = MemoryRelay::new();
        let mut a = relay.connect();
        a.disconnect();
        assert!(matches!(a.send(&ClientMessage::DrawEnd), Err(TransportError::NotConnected)));
        assert_eq!(relay.peer_count(), 0);
    }
}
