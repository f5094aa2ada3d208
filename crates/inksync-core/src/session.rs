//! A participant's drawing session.
//!
//! [`DrawSession`] owns the canvas and every stroke component. The host feeds
//! it pointer events, toolbar changes, resize notifications and transport
//! events; the session renders synchronously and queues the messages to
//! publish, which are drained with [`DrawSession::take_outgoing`] or sent
//! directly with [`DrawSession::pump`].

use crate::canvas::Canvas;
use crate::config::SessionConfig;
use crate::input::{LocalInputController, PointerEvent};
use crate::protocol::{ClientMessage, ServerMessage};
use crate::reconcile::RemoteStrokeReconciler;
use crate::render::StrokeRenderer;
use crate::snapshot::{SnapshotLoader, SnapshotOutcome};
use crate::style::{ConfigChange, SessionContext};
use crate::surface::RasterSurface;
use crate::transport::{Transport, TransportEvent};
use crate::viewport::{ViewportLayout, ViewportSizer};

/// Decides whether the local participant may start a stroke.
pub type DrawGate = Box<dyn Fn() -> bool>;

pub struct DrawSession<S> {
    canvas: Canvas<S>,
    context: SessionContext,
    input: LocalInputController,
    reconciler: RemoteStrokeReconciler,
    snapshots: SnapshotLoader,
    sizer: ViewportSizer,
    layout: Option<ViewportLayout>,
    outgoing: Vec<ClientMessage>,
    draw_gate: Option<DrawGate>,
    room: Option<String>,
    joined: bool,
    /// Rejoin the room on the next connect.
    rejoin: bool,
    last_snapshot: Option<SnapshotOutcome>,
}

impl<S: RasterSurface> DrawSession<S> {
    /// Create a session with no surface attached yet.
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            canvas: Canvas::new(StrokeRenderer::new(config.smoothing)),
            context: config.session_context(),
            input: LocalInputController::new(),
            reconciler: RemoteStrokeReconciler::new(),
            snapshots: SnapshotLoader::new(),
            sizer: ViewportSizer::new(config.aspect_ratio),
            layout: None,
            outgoing: Vec::new(),
            draw_gate: None,
            room: config.room.clone(),
            joined: false,
            rejoin: false,
            last_snapshot: None,
        }
    }

    pub fn with_surface(surface: S, config: &SessionConfig) -> Self {
        let mut session = Self::new(config);
        session.canvas.attach(surface);
        session
    }

    /// Attach a surface. Once the viewport is measured the surface is sized
    /// and the history reloaded onto it.
    pub fn attach_surface(&mut self, surface: S) {
        self.canvas.attach(surface);
        if self.canvas.normalizer().is_measured() {
            self.load_snapshot();
        }
    }

    pub fn detach_surface(&mut self) -> Option<S> {
        self.canvas.detach()
    }

    pub fn canvas(&self) -> &Canvas<S> {
        &self.canvas
    }

    pub fn surface(&self) -> Option<&S> {
        self.canvas.surface()
    }

    pub fn surface_mut(&mut self) -> Option<&mut S> {
        self.canvas.surface_mut()
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    pub fn input(&self) -> &LocalInputController {
        &self.input
    }

    pub fn reconciler(&self) -> &RemoteStrokeReconciler {
        &self.reconciler
    }

    pub fn layout(&self) -> Option<ViewportLayout> {
        self.layout
    }

    pub fn local_peer(&self) -> Option<&str> {
        self.reconciler.local_peer()
    }

    pub fn is_joined(&self) -> bool {
        self.joined
    }

    pub fn room(&self) -> Option<&str> {
        self.room.as_deref()
    }

    /// Outcome of the most recently completed snapshot load.
    pub fn last_snapshot(&self) -> Option<SnapshotOutcome> {
        self.last_snapshot
    }

    /// A history request is still waiting for its response.
    pub fn is_loading(&self) -> bool {
        self.snapshots.pending() > 0
    }

    /// Replace the "may draw" predicate. Without one, drawing is allowed once
    /// the relay has confirmed the room join.
    pub fn set_draw_gate(&mut self, gate: impl Fn() -> bool + 'static) {
        self.draw_gate = Some(Box::new(gate));
    }

    pub fn can_draw(&self) -> bool {
        match &self.draw_gate {
            Some(gate) => gate(),
            None => self.joined,
        }
    }

    /// First measurement of the container.
    pub fn mount(&mut self, container_width: f64, scale_factor: f64) -> ViewportLayout {
        log::debug!("Mounting at width {} (dpr {})", container_width, scale_factor);
        self.resize(container_width, scale_factor)
    }

    /// Recompute the layout, resize the surface and reload the history.
    pub fn resize(&mut self, container_width: f64, scale_factor: f64) -> ViewportLayout {
        let layout = self.sizer.layout(container_width, scale_factor);
        let before = self.canvas.normalizer().clone();
        self.canvas.resize(layout.logical, layout.scale_factor);
        self.input.rescale(&before, self.canvas.normalizer());
        self.layout = Some(layout);
        self.load_snapshot();
        layout
    }

    fn load_snapshot(&mut self) {
        let request = self.snapshots.begin(&mut self.canvas);
        self.outgoing.push(request);
    }

    pub fn handle_pointer(&mut self, event: PointerEvent) {
        let style = self.context.active_style();
        let can_draw = self.can_draw();
        if let Some(msg) = self.input.handle(event, &mut self.canvas, &style, can_draw) {
            self.outgoing.push(msg);
        }
    }

    /// Apply a toolbar change. Takes effect on the next pointer event.
    pub fn apply_config(&mut self, change: ConfigChange) {
        self.context.apply(change);
    }

    /// Join a room on the relay.
    pub fn join_room(&mut self, room: impl Into<String>) {
        let room = room.into();
        log::info!("Joining room: {}", room);
        self.room = Some(room.clone());
        self.joined = false;
        self.outgoing.push(ClientMessage::Join { room });
    }

    pub fn leave_room(&mut self) {
        if self.room.take().is_some() {
            self.joined = false;
            self.outgoing.push(ClientMessage::Leave);
        }
    }

    /// Clear the board for everyone.
    pub fn request_reset(&mut self) {
        self.snapshots.cancel();
        self.reconciler.on_reset(&mut self.canvas);
        self.outgoing.push(ClientMessage::CanvasReset);
    }

    /// Messages waiting to be published.
    pub fn take_outgoing(&mut self) -> Vec<ClientMessage> {
        std::mem::take(&mut self.outgoing)
    }

    pub fn handle_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Connected => {
                log::info!("Connected to relay");
                if std::mem::take(&mut self.rejoin) {
                    if let Some(room) = self.room.clone() {
                        log::info!("Rejoining room: {}", room);
                        self.outgoing.push(ClientMessage::Join { room });
                    }
                }
            }
            TransportEvent::Disconnected => {
                log::warn!("Disconnected from relay");
                self.joined = false;
                self.rejoin = self.room.is_some();
            }
            TransportEvent::Error { message } => {
                log::warn!("Transport error: {}", message);
            }
            TransportEvent::Message(msg) => self.handle_message(msg),
        }
    }

    pub fn handle_message(&mut self, msg: ServerMessage) {
        match msg {
            ServerMessage::Joined { room, peer_id, peer_count } => {
                log::info!("Joined room {} as {} ({} peers)", room, peer_id, peer_count);
                self.reconciler.set_local_peer(peer_id);
                self.room = Some(room);
                self.joined = true;
                // The room's history is only reachable once joined.
                if self.canvas.normalizer().is_measured() {
                    self.load_snapshot();
                }
            }
            ServerMessage::DrawStart(draw) => {
                self.reconciler.on_draw_start(&draw, &mut self.canvas);
            }
            ServerMessage::DrawMove(draw) => {
                self.reconciler.on_draw_move(&draw, &mut self.canvas);
            }
            ServerMessage::DrawEnd { from } => self.reconciler.on_draw_end(&from),
            ServerMessage::CanvasReset { from } => {
                if from.is_some() && from.as_deref() == self.local_peer() {
                    log::trace!("Discarding echoed canvas:reset");
                    return;
                }
                log::debug!("Canvas reset by {}", from.as_deref().unwrap_or("relay"));
                self.snapshots.cancel();
                self.reconciler.on_reset(&mut self.canvas);
            }
            ServerMessage::Strokes(response) => {
                if let Some(outcome) =
                    self.snapshots.complete(&response, &mut self.canvas, &mut self.reconciler)
                {
                    self.last_snapshot = Some(outcome);
                }
            }
            ServerMessage::Error { message } => {
                log::warn!("Relay error: {}", message);
            }
        }
    }

    /// Send queued messages, then process everything the transport delivered.
    ///
    /// Send failures are logged and the message is dropped. Returns the number
    /// of events handled.
    pub fn pump<T: Transport + ?Sized>(&mut self, transport: &mut T) -> usize {
        self.flush(transport);
        let events = transport.poll_events();
        let count = events.len();
        for event in events {
            self.handle_event(event);
        }
        self.flush(transport);
        count
    }

    fn flush<T: Transport + ?Sized>(&mut self, transport: &T) {
        for msg in self.take_outgoing() {
            if let Err(e) = transport.send(&msg) {
                log::warn!("Dropping outgoing message: {}", e);
            }
        }
    }
}
