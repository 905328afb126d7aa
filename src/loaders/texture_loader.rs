//! Equirectangular image loader.

use super::{LoadError, Loader};
use crate::texture::EquirectImage;

/// Decodes any supported image format into an [`EquirectImage`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TextureLoader;

impl TextureLoader {
    /// Create a new texture loader.
    pub fn new() -> Self {
        Self
    }
}

impl Loader for TextureLoader {
    type Asset = EquirectImage;

    fn decode(&self, bytes: &[u8]) -> Result<EquirectImage, LoadError> {
        let image = image::load_from_memory(bytes).map_err(|e| LoadError::Decode(format!("invalid image: {e}")))?;
        let rgba = image.to_rgba8();
        let (width, height) = rgba.dimensions();
        if width != height * 2 {
            log::warn!("Equirectangular image is {}x{}, expected a 2:1 aspect", width, height);
        }
        EquirectImage::new(width, height, rgba.into_raw())
            .ok_or_else(|| LoadError::Decode(format!("empty image {width}x{height}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let image = image::RgbaImage::from_fn(width, height, |x, _| image::Rgba([x as u8 * 10, 0, 255, 255]));
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_decode_png() {
        let image = TextureLoader::new().decode(&png(8, 4)).unwrap();
        assert_eq!((image.width(), image.height()), (8, 4));
        assert_eq!(image.pixels().len(), 8 * 4 * 4);
        assert_eq!(&image.pixels()[4..8], &[10, 0, 255, 255]);
    }

    #[test]
    fn test_decode_garbage() {
        let err = TextureLoader::new().decode(b"definitely not an image").unwrap_err();
        assert!(matches!(err, LoadError::Decode(_)));
    }
}
