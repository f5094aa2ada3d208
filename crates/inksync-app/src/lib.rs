//! InkSync Application
//!
//! Native builds provide a headless replay of a board's history; WASM builds
//! expose a board to the hosting page.

#[cfg(not(target_arch = "wasm32"))]
mod replay;

#[cfg(not(target_arch = "wasm32"))]
pub use replay::{AppError, DEFAULT_ROOM, DEFAULT_WIDTH, ReplaySummary, replay_board, resolve_config};

#[cfg(target_arch = "wasm32")]
mod web;

#[cfg(target_arch = "wasm32")]
pub use web::{WebBoard, run_wasm};
