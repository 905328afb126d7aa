//! Render-to-texture CRT filter.

use super::crt::{CrtParameters, CrtSettings};
use super::crt_pass::CrtPass;
use super::pass::Pass;
use crate::camera::PerspectiveCamera;
use crate::core::{FrameClock, RenderInfo, SceneRenderer, TimeStep};
use crate::scene::Scene;

/// Offscreen color texture with its view.
pub struct RenderTarget {
    /// The texture.
    pub texture: wgpu::Texture,
    /// Texture view.
    pub view: wgpu::TextureView,
}

impl RenderTarget {
    /// Create a sampleable render target.
    pub fn new(device: &wgpu::Device, width: u32, height: u32, format: wgpu::TextureFormat) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("CRT Offscreen Target"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self { texture, view }
    }

    /// Size in pixels.
    pub fn size(&self) -> (u32, u32) {
        (self.texture.width(), self.texture.height())
    }
}

/// Renders the scene offscreen, then draws it through the CRT shader.
///
/// When disabled the scene is drawn straight onto the output.
pub struct CrtFilter {
    clock: FrameClock,
    format: wgpu::TextureFormat,
    target: RenderTarget,
    pass: CrtPass,
}

impl CrtFilter {
    /// Create a filter drawing to surfaces of `format`.
    pub fn new(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        width: u32,
        height: u32,
        settings: CrtSettings,
        time_step: TimeStep,
    ) -> Self {
        let params = CrtParameters::new(settings, width, height);
        let (width, height) = params.size();
        Self {
            target: RenderTarget::new(device, width, height, format),
            pass: CrtPass::new(device, format, &params),
            clock: FrameClock::new(time_step),
            format,
        }
    }

    /// Reallocate the offscreen buffer. Zero sizes are ignored.
    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        if width == 0 || height == 0 {
            log::debug!("Ignoring zero-sized filter resize {}x{}", width, height);
            return;
        }
        self.target = RenderTarget::new(device, width, height, self.format);
        self.pass.resize(width, height);
    }

    /// Whether frames go through the CRT shader.
    #[inline]
    pub fn enabled(&self) -> bool {
        self.pass.enabled()
    }

    /// Turn the CRT shader on or off.
    pub fn set_enabled(&mut self, enabled: bool) {
        if enabled != self.pass.enabled() {
            log::info!("{} pass {}", self.pass.name(), if enabled { "enabled" } else { "disabled" });
        }
        self.pass.set_enabled(enabled);
    }

    /// Advance the clock, draw `scene` offscreen, then composite onto `output`.
    #[allow(clippy::too_many_arguments)]
    pub fn render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        renderer: &mut SceneRenderer,
        scene: &Scene,
        camera: &PerspectiveCamera,
        output: &wgpu::TextureView,
    ) -> RenderInfo {
        self.clock.tick();
        self.pass.set_time(self.clock.elapsed());

        if !self.pass.enabled() {
            return renderer.render(device, queue, encoder, output, scene, camera);
        }

        let info = renderer.render(device, queue, encoder, &self.target.view, scene, camera);
        self.pass.render(encoder, &self.target.view, output, device, queue);
        info
    }

    /// Live parameters.
    #[inline]
    pub fn parameters(&self) -> &CrtParameters {
        self.pass.parameters()
    }

    /// The frame clock, for hosts that supply elapsed time themselves.
    #[inline]
    pub fn clock_mut(&mut self) -> &mut FrameClock {
        &mut self.clock
    }

    /// The offscreen buffer.
    #[inline]
    pub fn target(&self) -> &RenderTarget {
        &self.target
    }
}
