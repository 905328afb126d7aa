//! 2D texture implementation.

use super::EquirectImage;
use crate::core::Id;
use wgpu::util::DeviceExt;

/// A sampled 2D texture on the GPU.
pub struct Texture2D {
    /// ID of the source image.
    source: Id,
    /// The GPU texture.
    texture: wgpu::Texture,
    /// Texture view.
    view: wgpu::TextureView,
}

impl Texture2D {
    /// Create a new texture from RGBA8 sRGB data.
    pub fn from_rgba8(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        data: &[u8],
        width: u32,
        height: u32,
        label: Option<&str>,
    ) -> Self {
        let texture = device.create_texture_with_data(
            queue,
            &wgpu::TextureDescriptor {
                label,
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8UnormSrgb,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            data,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Self {
            source: Id::new(),
            texture,
            view,
        }
    }

    /// Upload an equirectangular panorama, clamped to the device's 2D size limit.
    pub fn from_equirect(device: &wgpu::Device, queue: &wgpu::Queue, image: &EquirectImage) -> Self {
        let max = device.limits().max_texture_dimension_2d;
        let mut texture = if image.width() > max || image.height() > max {
            log::warn!(
                "Environment image {}x{} exceeds the {} texel limit; using a black placeholder",
                image.width(),
                image.height(),
                max
            );
            Self::from_rgba8(device, queue, &[0, 0, 0, 255], 1, 1, Some("Environment Placeholder"))
        } else {
            Self::from_rgba8(
                device,
                queue,
                image.pixels(),
                image.width(),
                image.height(),
                Some("Environment Texture"),
            )
        };
        texture.source = image.id();
        texture
    }

    /// A 1x1 opaque black texture, bound while no environment is loaded.
    pub fn black(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        Self::from_rgba8(device, queue, &[0, 0, 0, 255], 1, 1, Some("Black Texture"))
    }

    /// ID of the image this texture was created from.
    #[inline]
    pub fn source(&self) -> Id {
        self.source
    }

    /// Get the underlying wgpu texture.
    #[inline]
    pub fn wgpu_texture(&self) -> &wgpu::Texture {
        &self.texture
    }

    /// Get the texture view.
    #[inline]
    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }
}
