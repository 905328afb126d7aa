//! # CRT Scene - wgpu scene viewer with a CRT filter
//!
//! Loads a glTF model and an equirectangular skybox, renders them with
//! wgpu, and passes every frame through a full-screen CRT effect
//! (barrel distortion, scanlines, vignette, chromatic aberration, rounded
//! corners). Clicking the designated object flies the camera along a
//! Catmull-Rom path.
//!
//! ## Features
//!
//! - **Math / Scene**: glam-based node hierarchy with ray picking
//! - **Loaders**: progress-reporting, cancellable glTF and image loading
//! - **Postprocessing**: the CRT effect as a GPU pass plus a CPU reference
//! - **Animation**: camera fly-through state machine
//! - **Hosts**: native `winit` viewer and a `wasm-bindgen` web binding
//!
//! ## Example
//!
//! ```ignore
//! use crt_scene::prelude::*;
//!
//! let config = SceneConfig::default();
//! let source = FileSource::new(config.assets.base_path.clone());
//! let mut app = App::new(window, 1280, 720, config, &source).await?;
//!
//! loop {
//!     app.frame()?;
//! }
//! ```

#![warn(missing_docs)]

pub mod animation;
pub mod app;
pub mod camera;
pub mod config;
pub mod controls;
pub mod core;
pub mod geometry;
pub mod light;
pub mod loaders;
pub mod math;
pub mod postprocessing;
pub mod scene;
pub mod texture;

#[cfg(all(feature = "web", target_arch = "wasm32"))]
pub mod web;

// Re-export commonly used types
pub mod prelude {
    //! Convenient re-exports of commonly used types.

    pub use crate::animation::{AnimationState, AnimationStatus, CameraPathAnimator, CatmullRomCurve3, PathSettings};
    pub use crate::app::{App, AppError, SceneState};
    pub use crate::camera::PerspectiveCamera;
    pub use crate::config::{ConfigError, SceneConfig};
    pub use crate::controls::{PickHit, Picker};
    pub use crate::core::{Context, FrameClock, RenderConfig, RenderInfo, SceneRenderer, TimeStep};
    pub use crate::geometry::{MeshGeometry, Vertex};
    pub use crate::light::{AmbientLight, DirectionalLight, Light};
    pub use crate::loaders::{AssetSource, GltfLoader, LoadError, LoadEvent, LoadProgress, LoadTask, Loader, MemorySource, TextureLoader};
    #[cfg(not(target_arch = "wasm32"))]
    pub use crate::loaders::FileSource;
    #[cfg(all(feature = "web", target_arch = "wasm32"))]
    pub use crate::loaders::FetchSource;
    pub use crate::math::{Box3, Mat4, Quat, Ray, Raycaster, Vec2, Vec3, Vec4};
    pub use crate::postprocessing::{CrtFilter, CrtParameters, CrtSettings, CrtShader};
    pub use crate::scene::{Mesh, Node, NodeId, NodeKind, Scene, Transform};
    pub use crate::texture::EquirectImage;
}

/// Crate version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
