//! Browser `WebSocket` transport.
//!
//! Socket callbacks push decoded events into a shared queue that
//! [`Transport::poll_events`] drains once per frame.

use super::{ConnectionState, Transport, TransportEvent, decode_frame, track_state};
use crate::error::{TransportError, TransportResult};
use crate::protocol::ClientMessage;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::JsCast;
use wasm_bindgen::convert::FromWasmAbi;
use wasm_bindgen::prelude::*;
use web_sys::{CloseEvent, Event, MessageEvent, WebSocket};

type EventQueue = Rc<RefCell<Vec<TransportEvent>>>;

/// Callbacks registered on the socket. They must live as long as it does.
struct SocketHandlers {
    _open: Closure<dyn FnMut(Event)>,
    _message: Closure<dyn FnMut(MessageEvent)>,
    _close: Closure<dyn FnMut(CloseEvent)>,
    _error: Closure<dyn FnMut(Event)>,
}

impl SocketHandlers {
    fn install(ws: &WebSocket, queue: &EventQueue) -> Self {
        let open = listener(queue, |_: Event| Some(TransportEvent::Connected));
        let message = listener(queue, |e: MessageEvent| {
            let text: String = e.data().dyn_into::<js_sys::JsString>().ok()?.into();
            decode_frame(&text)
        });
        let close = listener(queue, |e: CloseEvent| {
            log::info!("Relay socket closed ({})", e.code());
            Some(TransportEvent::Disconnected)
        });
        let error = listener(queue, |_: Event| {
            Some(TransportEvent::Error { message: "WebSocket error".to_string() })
        });

        ws.set_onopen(Some(open.as_ref().unchecked_ref()));
        ws.set_onmessage(Some(message.as_ref().unchecked_ref()));
        ws.set_onclose(Some(close.as_ref().unchecked_ref()));
        ws.set_onerror(Some(error.as_ref().unchecked_ref()));

        Self { _open: open, _message: message, _close: close, _error: error }
    }
}

/// Wrap `map` as a socket callback that queues whatever event it yields.
fn listener<T, F>(queue: &EventQueue, mut map: F) -> Closure<dyn FnMut(T)>
where
    T: FromWasmAbi + 'static,
    F: FnMut(T) -> Option<TransportEvent> + 'static,
{
    let queue = Rc::clone(queue);
    Closure::wrap(Box::new(move |e: T| {
        if let Some(event) = map(e) {
            queue.borrow_mut().push(event);
        }
    }) as Box<dyn FnMut(T)>)
}

/// Relay connection for browser builds.
pub struct WasmWebSocket {
    ws: Option<WebSocket>,
    state: ConnectionState,
    queue: EventQueue,
    handlers: Option<SocketHandlers>,
}

impl WasmWebSocket {
    pub fn new() -> Self {
        Self {
            ws: None,
            state: ConnectionState::Disconnected,
            queue: Rc::default(),
            handlers: None,
        }
    }

    /// Open a socket to the relay. The outcome arrives as a `Connected` or
    /// `Error` event.
    pub fn connect(&mut self, url: &str) -> TransportResult<()> {
        if self.ws.is_some() {
            return Err(TransportError::AlreadyConnected);
        }
        let ws = WebSocket::new(url).map_err(|e| TransportError::ConnectFailed(format!("{:?}", e)))?;
        ws.set_binary_type(web_sys::BinaryType::Arraybuffer);

        self.handlers = Some(SocketHandlers::install(&ws, &self.queue));
        self.ws = Some(ws);
        self.state = ConnectionState::Connecting;
        Ok(())
    }

    pub fn disconnect(&mut self) {
        if let Some(ws) = self.ws.take() {
            ws.set_onopen(None);
            ws.set_onmessage(None);
            ws.set_onclose(None);
            ws.set_onerror(None);
            let _ = ws.close();
        }
        self.handlers = None;
        self.state = ConnectionState::Disconnected;
    }
}

impl Transport for WasmWebSocket {
    fn send(&self, message: &ClientMessage) -> TransportResult<()> {
        let ws = self.ws.as_ref().ok_or(TransportError::NotConnected)?;
        ws.send_with_str(&message.to_json()?)
            .map_err(|e| TransportError::SendFailed(format!("{:?}", e)))
    }

    fn poll_events(&mut self) -> Vec<TransportEvent> {
        let events = self.queue.take();
        for event in &events {
            track_state(&mut self.state, event);
        }
        events
    }

    fn state(&self) -> ConnectionState {
        self.state
    }
}

impl Default for WasmWebSocket {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for WasmWebSocket {
    fn drop(&mut self) {
        self.disconnect();
    }
}
