//! WebAssembly entry point and page bindings.
//!
//! The page creates a [`WebBoard`] for its `<canvas>`, forwards pointer,
//! toolbar and resize events to it, and calls [`WebBoard::tick`] once per
//! animation frame. Each tick exchanges messages with the relay and presents
//! the board's scene to the canvas.

use inksync_core::{
    ConfigChange, DrawSession, MouseButton, PointerEvent, SessionConfig, StrokeColor, Tool,
    Transport, ViewportLayout, WasmWebSocket,
};
use inksync_render::{ScenePresenter, VelloSurface, wgpu};
use kurbo::Point;
use wasm_bindgen::prelude::*;
use web_sys::HtmlCanvasElement;

/// Initialize panic reporting and logging.
#[wasm_bindgen(start)]
pub fn run_wasm() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        return;
    }
    log::info!("Starting InkSync (WASM)");
}

fn js_error(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Size the canvas backing store to the layout's device pixels.
fn fit_canvas(canvas: &HtmlCanvasElement, layout: &ViewportLayout) {
    let (width, height) = layout.physical;
    canvas.set_width(width);
    canvas.set_height(height);
}

/// A board bound to the page: session, relay connection and presenter.
#[wasm_bindgen]
pub struct WebBoard {
    session: DrawSession<VelloSurface>,
    ws: WasmWebSocket,
    presenter: ScenePresenter,
    canvas: HtmlCanvasElement,
}

#[wasm_bindgen]
impl WebBoard {
    /// Connect using `?room=...&server=...` from the page URL and draw into
    /// `canvas`.
    pub async fn create(
        canvas: HtmlCanvasElement,
        container_width: f64,
        device_pixel_ratio: f64,
    ) -> Result<WebBoard, JsValue> {
        let mut config = SessionConfig::default();
        config.apply_location();
        let url = config
            .server_url()
            .ok_or_else(|| JsValue::from_str("No relay server in page URL"))?;

        let mut session = DrawSession::new(&config);
        let layout = session.mount(container_width, device_pixel_ratio);
        fit_canvas(&canvas, &layout);

        let target = wgpu::SurfaceTarget::Canvas(canvas.clone());
        let presenter = ScenePresenter::new(target, layout.physical).await.map_err(js_error)?;
        session.attach_surface(VelloSurface::new());

        let mut ws = WasmWebSocket::new();
        ws.connect(&url).map_err(js_error)?;
        if let Some(room) = config.room.clone() {
            log::info!("Room from URL: {}", room);
            session.join_room(room);
        }

        Ok(WebBoard { session, ws, presenter, canvas })
    }

    pub fn resize(&mut self, container_width: f64, device_pixel_ratio: f64) {
        let layout = self.session.resize(container_width, device_pixel_ratio);
        fit_canvas(&self.canvas, &layout);
        self.presenter.resize(layout.physical);
    }

    pub fn pointer_down(&mut self, x: f64, y: f64) {
        self.session.handle_pointer(PointerEvent::Down {
            position: Point::new(x, y),
            button: MouseButton::Left,
        });
    }

    pub fn pointer_move(&mut self, x: f64, y: f64) {
        self.session.handle_pointer(PointerEvent::Move { position: Point::new(x, y) });
    }

    pub fn pointer_up(&mut self, x: f64, y: f64) {
        self.session.handle_pointer(PointerEvent::Up {
            position: Point::new(x, y),
            button: MouseButton::Left,
        });
    }

    pub fn set_eraser(&mut self, eraser: bool) {
        let tool = if eraser { Tool::Eraser } else { Tool::Pen };
        self.session.apply_config(ConfigChange::Tool(tool));
    }

    /// Set the pen color from a `#RRGGBB` string.
    pub fn set_color(&mut self, color: &str) -> Result<(), JsValue> {
        let color = StrokeColor::from_hex(color).map_err(js_error)?;
        self.session.apply_config(ConfigChange::Color(color));
        Ok(())
    }

    pub fn set_stroke_width(&mut self, width: f64) {
        self.session.apply_config(ConfigChange::Width(width));
    }

    pub fn reset(&mut self) {
        self.session.request_reset();
    }

    pub fn is_connected(&self) -> bool {
        self.ws.is_connected()
    }

    /// Exchange pending messages with the relay and present the scene.
    pub fn tick(&mut self) {
        self.session.pump(&mut self.ws);
        let Some(surface) = self.session.surface() else {
            return;
        };
        if let Err(e) = self.presenter.present(surface.scene()) {
            log::warn!("Frame skipped: {}", e);
        }
    }
}
