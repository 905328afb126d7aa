//! Texture module: decoded images and their GPU counterparts.

mod equirect;
mod texture2d;

pub use equirect::EquirectImage;
pub use texture2d::Texture2D;
