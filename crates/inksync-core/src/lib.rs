//! InkSync Core Library
//!
//! Platform-agnostic stroke synchronization and coordinate normalization for
//! InkSync shared drawing boards.

pub mod canvas;
pub mod config;
pub mod coords;
pub mod error;
pub mod input;
pub mod protocol;
pub mod reconcile;
pub mod render;
pub mod session;
pub mod snapshot;
pub mod stroke;
pub mod style;
pub mod surface;
pub mod transport;
pub mod viewport;

pub use canvas::Canvas;
pub use config::SessionConfig;
pub use coords::{CoordinateNormalizer, RatioPoint, ViewportExtent};
pub use error::{ColorError, ConfigError, ProtocolError, TransportError};
pub use input::{InputPhase, LocalInputController, MouseButton, PointerEvent};
pub use protocol::{ClientMessage, DrawPoint, RemoteDraw, ServerMessage, StrokesResponse};
pub use reconcile::RemoteStrokeReconciler;
pub use render::{Smoothing, StrokeRenderer};
pub use session::DrawSession;
pub use snapshot::{SnapshotLoader, SnapshotOutcome};
pub use stroke::{DrawStroke, PeerId};
pub use style::{ConfigChange, SessionContext, StrokeColor, StrokeStyle, Tool};
pub use surface::{CompositeMode, Pen, RasterSurface, RecordingSurface};
pub use transport::{ConnectionState, MemoryRelay, MemoryTransport, Transport, TransportEvent};
pub use viewport::{AspectRatio, ViewportLayout, ViewportSizer};

#[cfg(not(target_arch = "wasm32"))]
pub use transport::NativeWebSocket;

#[cfg(target_arch = "wasm32")]
pub use transport::WasmWebSocket;
