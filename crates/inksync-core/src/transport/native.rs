//! Blocking `tungstenite` socket driven from a worker thread.
//!
//! The session side never blocks: outgoing frames go down one channel and
//! decoded events come back up another, drained by [`Transport::poll_events`].

use super::{ConnectionState, Transport, TransportEvent, decode_frame, preview, track_state};
use crate::error::{TransportError, TransportResult};
use crate::protocol::ClientMessage;
use std::io::ErrorKind;
use std::net::TcpStream;
use std::ops::ControlFlow;
use std::sync::mpsc::{Receiver, Sender, TryRecvError, channel};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tungstenite::stream::MaybeTlsStream;
use tungstenite::{Message, WebSocket};
use url::Url;

/// How long a read may block before the worker checks for outgoing frames.
const READ_POLL: Duration = Duration::from_millis(50);
const WRITE_TIMEOUT: Duration = Duration::from_secs(5);

type Socket = WebSocket<MaybeTlsStream<TcpStream>>;

enum Outbound {
    Frame(String),
    Close,
}

/// Relay connection for native builds.
pub struct NativeWebSocket {
    state: ConnectionState,
    outbound: Option<Sender<Outbound>>,
    inbound: Option<Receiver<TransportEvent>>,
    worker: Option<JoinHandle<()>>,
}

impl NativeWebSocket {
    pub fn new() -> Self {
        Self {
            state: ConnectionState::Disconnected,
            outbound: None,
            inbound: None,
            worker: None,
        }
    }

    /// Start connecting to a `ws://` or `wss://` relay. The outcome arrives
    /// as a `Connected` or `Error` event.
    pub fn connect(&mut self, url: &str) -> TransportResult<()> {
        if self.outbound.is_some() {
            return Err(TransportError::AlreadyConnected);
        }
        let url = validate_url(url)?;

        let (outbound_tx, outbound_rx) = channel();
        let (inbound_tx, inbound_rx) = channel();
        let worker = thread::Builder::new()
            .name("inksync-relay".into())
            .spawn(move || {
                SocketWorker { outbound: outbound_rx, inbound: inbound_tx }.run(url.as_str())
            })
            .map_err(|e| TransportError::ConnectFailed(e.to_string()))?;

        self.state = ConnectionState::Connecting;
        self.outbound = Some(outbound_tx);
        self.inbound = Some(inbound_rx);
        self.worker = Some(worker);
        Ok(())
    }

    /// Close the socket. The worker thread finishes on its own.
    pub fn disconnect(&mut self) {
        if let Some(outbound) = self.outbound.take() {
            let _ = outbound.send(Outbound::Close);
        }
        self.inbound = None;
        self.worker = None;
        self.state = ConnectionState::Disconnected;
    }
}

fn validate_url(url: &str) -> TransportResult<Url> {
    let parsed = Url::parse(url).map_err(|e| TransportError::InvalidUrl(e.to_string()))?;
    match parsed.scheme() {
        "ws" | "wss" => Ok(parsed),
        other => Err(TransportError::InvalidUrl(format!("Unsupported scheme: {}", other))),
    }
}

/// Owns the worker's ends of both channels.
struct SocketWorker {
    outbound: Receiver<Outbound>,
    inbound: Sender<TransportEvent>,
}

impl SocketWorker {
    fn run(self, url: &str) {
        log::info!("Connecting to relay at {}", url);
        let mut socket = match tungstenite::connect(url) {
            Ok((socket, response)) => {
                log::info!("Relay handshake complete ({})", response.status());
                socket
            }
            Err(e) => {
                log::error!("Relay connection failed: {}", e);
                self.emit(TransportEvent::Error { message: format!("Connection failed: {}", e) });
                return;
            }
        };
        self.emit(TransportEvent::Connected);
        set_poll_timeouts(&mut socket);

        while self.flush_outbound(&mut socket).is_continue()
            && self.read_inbound(&mut socket).is_continue()
        {}

        log::info!("Relay connection closed");
        self.emit(TransportEvent::Disconnected);
    }

    fn emit(&self, event: TransportEvent) {
        let _ = self.inbound.send(event);
    }

    /// Write every queued frame.
    fn flush_outbound(&self, socket: &mut Socket) -> ControlFlow<()> {
        loop {
            match self.outbound.try_recv() {
                Ok(Outbound::Frame(text)) => {
                    log::debug!("-> {}", preview(&text));
                    if let Err(e) = socket.send(Message::text(text)) {
                        log::error!("Relay send failed: {}", e);
                        return ControlFlow::Break(());
                    }
                }
                Ok(Outbound::Close) | Err(TryRecvError::Disconnected) => {
                    let _ = socket.close(None);
                    return ControlFlow::Break(());
                }
                Err(TryRecvError::Empty) => return ControlFlow::Continue(()),
            }
        }
    }

    /// Wait up to [`READ_POLL`] for one frame.
    fn read_inbound(&self, socket: &mut Socket) -> ControlFlow<()> {
        match socket.read() {
            Ok(Message::Text(text)) => {
                log::debug!("<- {}", preview(&text));
                if let Some(event) = decode_frame(&text) {
                    self.emit(event);
                }
                ControlFlow::Continue(())
            }
            Ok(Message::Close(_)) => ControlFlow::Break(()),
            Ok(_) => ControlFlow::Continue(()),
            Err(tungstenite::Error::Io(e))
                if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) =>
            {
                ControlFlow::Continue(())
            }
            Err(e) => {
                log::error!("Relay read failed: {}", e);
                ControlFlow::Break(())
            }
        }
    }
}

fn set_poll_timeouts(socket: &mut Socket) {
    if let MaybeTlsStream::Plain(tcp) = socket.get_mut() {
        let _ = tcp.set_read_timeout(Some(READ_POLL));
        let _ = tcp.set_write_timeout(Some(WRITE_TIMEOUT));
    } else {
        log::debug!("Encrypted relay stream, reads block until a frame arrives");
    }
}

impl Transport for NativeWebSocket {
    fn send(&self, message: &ClientMessage) -> TransportResult<()> {
        let outbound = self.outbound.as_ref().ok_or(TransportError::NotConnected)?;
        outbound
            .send(Outbound::Frame(message.to_json()?))
            .map_err(|e| TransportError::SendFailed(e.to_string()))
    }

    fn poll_events(&mut self) -> Vec<TransportEvent> {
        let Some(inbound) = &self.inbound else {
            return Vec::new();
        };
        let events: Vec<_> = inbound.try_iter().collect();
        for event in &events {
            track_state(&mut self.state, event);
        }
        events
    }

    fn state(&self) -> ConnectionState {
        self.state
    }
}

impl Default for NativeWebSocket {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for NativeWebSocket {
    fn drop(&mut self) {
        self.disconnect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_non_websocket_scheme() {
        let mut ws = NativeWebSocket::new();
        assert!(matches!(ws.connect("http://localhost:3030"), Err(TransportError::InvalidUrl(_))));
        assert!(matches!(ws.connect("not a url"), Err(TransportError::InvalidUrl(_))));
        assert_eq!(ws.state(), ConnectionState::Disconnected);
    }

    #[test]
    fn test_send_without_connection() {
        let ws = NativeWebSocket::new();
        assert!(matches!(ws.send(&ClientMessage::DrawEnd), Err(TransportError::NotConnected)));
    }

    #[test]
    fn test_poll_without_connection_is_empty() {
        let mut ws = NativeWebSocket::new();
        assert!(ws.poll_events().is_empty());
    }

    #[test]
    fn test_validate_url() {
        assert_eq!(validate_url("ws://localhost:3030/ws").unwrap().port(), Some(3030));
        assert!(validate_url("wss://example.com").is_ok());
    }
}
