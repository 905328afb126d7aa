//! Full-screen pass trait and quad geometry.

use wgpu::{CommandEncoder, TextureView};

/// A full-screen pass reading one texture and writing another.
pub trait Pass {
    /// Get the name of this pass.
    fn name(&self) -> &str;

    /// Check if this pass is enabled.
    fn enabled(&self) -> bool {
        true
    }

    /// Set whether this pass is enabled.
    fn set_enabled(&mut self, enabled: bool);

    /// Record the pass.
    ///
    /// # Arguments
    /// * `encoder` - Command encoder to record commands
    /// * `input` - Texture to sample
    /// * `output` - Attachment to draw into
    /// * `device` - wgpu device for bind group creation
    /// * `queue` - wgpu queue for uniform updates
    fn render(
        &self,
        encoder: &mut CommandEncoder,
        input: &TextureView,
        output: &TextureView,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
    );

    /// Called when the output size changes.
    fn resize(&mut self, width: u32, height: u32);
}

/// Vertex for fullscreen quad (position + uv).
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct FullscreenVertex {
    /// Clip-space position.
    pub position: [f32; 2],
    /// UV with the origin at the top left.
    pub uv: [f32; 2],
}

impl FullscreenVertex {
    /// Vertex buffer layout.
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        const ATTRIBUTES: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x2];
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Self>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &ATTRIBUTES,
        }
    }
}

/// Two triangles covering the viewport.
pub const FULLSCREEN_QUAD_VERTICES: [FullscreenVertex; 6] = [
    FullscreenVertex { position: [-1.0, -1.0], uv: [0.0, 1.0] },
    FullscreenVertex { position: [1.0, -1.0], uv: [1.0, 1.0] },
    FullscreenVertex { position: [1.0, 1.0], uv: [1.0, 0.0] },
    FullscreenVertex { position: [-1.0, -1.0], uv: [0.0, 1.0] },
    FullscreenVertex { position: [1.0, 1.0], uv: [1.0, 0.0] },
    FullscreenVertex { position: [-1.0, 1.0], uv: [0.0, 0.0] },
];
