//! Transport channel abstraction.
//!
//! A transport is a reliable, ordered, bidirectional message channel to the
//! relay. Clients are polled: the session pushes [`ClientMessage`]s with
//! [`Transport::send`] and drains [`TransportEvent`]s with
//! [`Transport::poll_events`].

mod memory;

#[cfg(not(target_arch = "wasm32"))]
mod native;

#[cfg(target_arch = "wasm32")]
mod wasm;

pub use memory::{MemoryRelay, MemoryTransport, RelayMode};

#[cfg(not(target_arch = "wasm32"))]
pub use native::NativeWebSocket;

#[cfg(target_arch = "wasm32")]
pub use wasm::WasmWebSocket;

use crate::error::TransportResult;
use crate::protocol::{ClientMessage, ServerMessage};

/// Connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Error,
}

/// Events from a transport
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    /// Connected to server
    Connected,
    /// Disconnected from server
    Disconnected,
    /// A decoded message from the relay
    Message(ServerMessage),
    /// Error occurred
    Error { message: String },
}

/// A polled message channel to the relay.
pub trait Transport {
    /// Queue a message for delivery.
    fn send(&self, message: &ClientMessage) -> TransportResult<()>;

    /// Drain pending events (non-blocking).
    fn poll_events(&mut self) -> Vec<TransportEvent>;

    /// Get current connection state.
    fn state(&self) -> ConnectionState;

    /// Check if connected.
    fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }
}

/// Update a connection state from an event, as every client does while polling.
pub(crate) fn track_state(state: &mut ConnectionState, event: &TransportEvent) {
    match event {
        TransportEvent::Connected => *state = ConnectionState::Connected,
        TransportEvent::Disconnected => *state = ConnectionState::Disconnected,
        TransportEvent::Error { .. } => *state = ConnectionState::Error,
        TransportEvent::Message(_) => {}
    }
}

/// Decode a text frame into an event; undecodable frames are logged and dropped.
pub(crate) fn decode_frame(text: &str) -> Option<TransportEvent> {
    match ServerMessage::from_json(text) {
        Ok(msg) => Some(TransportEvent::Message(msg)),
        Err(e) => {
            log::warn!("Failed to parse server message: {} ({})", preview(text), e);
            None
        }
    }
}

/// First 100 characters of a frame, for logging.
pub(crate) fn preview(text: &str) -> &str {
    match text.char_indices().nth(100) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}
