//! InkSync Render Library
//!
//! GPU-backed drawing surface for InkSync boards.
//! The default implementation records strokes into a Vello scene, which a
//! [`ScenePresenter`] renders to the screen.

#[cfg(feature = "vello-renderer")]
mod present;
#[cfg(feature = "vello-renderer")]
mod vello_impl;

#[cfg(feature = "vello-renderer")]
pub use present::{PresentError, ScenePresenter};
#[cfg(feature = "vello-renderer")]
pub use vello_impl::VelloSurface;

#[cfg(feature = "vello-renderer")]
pub use vello::{Scene, wgpu};
