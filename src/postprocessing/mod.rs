//! Post-processing: the CRT screen filter.
//!
//! The scene is rasterized into an offscreen color buffer which is then
//! drawn onto the surface through a full-screen CRT shader.

mod crt;
mod crt_pass;
mod filter;
mod pass;

pub use crt::{CrtParameters, CrtSettings, CrtShader, CrtUniform, CORNER_RADIUS};
pub use crt_pass::CrtPass;
pub use filter::{CrtFilter, RenderTarget};
pub use pass::{FullscreenVertex, Pass, FULLSCREEN_QUAD_VERTICES};
