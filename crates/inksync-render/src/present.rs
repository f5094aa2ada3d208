//! Presents a board's scene to a window or canvas through wgpu.

use peniko::Color;
use thiserror::Error;
use vello::util::{RenderContext, RenderSurface};
use vello::wgpu::{self, PresentMode};
use vello::{AaConfig, RenderParams, Renderer, RendererOptions, Scene};

#[derive(Debug, Error)]
pub enum PresentError {
    #[error("Failed to create surface: {0}")]
    Surface(String),
    #[error("Failed to create renderer: {0}")]
    Renderer(String),
    #[error("Failed to acquire frame: {0}")]
    Frame(#[from] wgpu::SurfaceError),
    #[error("Failed to render scene: {0}")]
    Render(String),
}

/// GPU state needed to put a [`Scene`] on screen.
///
/// Vello renders into an `Rgba8Unorm` storage texture, which is then blitted
/// onto the surface in whatever format the platform chose.
pub struct ScenePresenter {
    context: RenderContext,
    surface: RenderSurface<'static>,
    renderer: Renderer,
    blitter: wgpu::util::TextureBlitter,
    background: Color,
}

impl ScenePresenter {
    pub async fn new(
        target: impl Into<wgpu::SurfaceTarget<'static>>,
        physical_size: (u32, u32),
    ) -> Result<Self, PresentError> {
        let (width, height) = surface_size(physical_size);
        let mut context = RenderContext::new();
        let surface = context
            .create_surface(target, width, height, PresentMode::AutoVsync)
            .await
            .map_err(|e| PresentError::Surface(e.to_string()))?;

        let device = &context.devices[surface.dev_id].device;
        let renderer = Renderer::new(device, RendererOptions::default())
            .map_err(|e| PresentError::Renderer(e.to_string()))?;
        let blitter = wgpu::util::TextureBlitter::new(device, surface.config.format);

        log::info!("Presenter ready at {}x{} ({:?})", width, height, surface.config.format);
        Ok(Self { context, surface, renderer, blitter, background: Color::WHITE })
    }

    pub fn set_background(&mut self, color: Color) {
        self.background = color;
    }

    pub fn size(&self) -> (u32, u32) {
        (self.surface.config.width, self.surface.config.height)
    }

    /// Match the surface to the board's physical size.
    pub fn resize(&mut self, physical_size: (u32, u32)) {
        let (width, height) = surface_size(physical_size);
        if (width, height) != self.size() {
            log::debug!("Presenter resized to {}x{}", width, height);
            self.context.resize_surface(&mut self.surface, width, height);
        }
    }

    /// Render `scene` and present it.
    pub fn present(&mut self, scene: &Scene) -> Result<(), PresentError> {
        let handle = &self.context.devices[self.surface.dev_id];
        let (device, queue) = (&handle.device, &handle.queue);
        let frame = self.surface.surface.get_current_texture()?;
        let (width, height) = (self.surface.config.width, self.surface.config.height);

        let target = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("inksync scene"),
            size: wgpu::Extent3d { width, height, depth_or_array_layers: 1 },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::STORAGE_BINDING | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let target_view = target.create_view(&wgpu::TextureViewDescriptor::default());

        let params = RenderParams {
            base_color: self.background,
            width,
            height,
            antialiasing_method: AaConfig::Area,
        };
        self.renderer
            .render_to_texture(device, queue, scene, &target_view, &params)
            .map_err(|e| PresentError::Render(e.to_string()))?;

        let frame_view = frame.texture.create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("inksync blit"),
        });
        self.blitter.copy(device, &mut encoder, &target_view, &frame_view);
        queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        Ok(())
    }
}

/// wgpu rejects zero-sized surfaces.
fn surface_size((width, height): (u32, u32)) -> (u32, u32) {
    (width.max(1), height.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_surface_size_never_zero() {
        assert_eq!(surface_size((0, 0)), (1, 1));
        assert_eq!(surface_size((1600, 0)), (1600, 1));
        assert_eq!(surface_size((1600, 900)), (1600, 900));
    }
}
