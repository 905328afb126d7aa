//! Asset loaders for models and environment images.
//!
//! A load is split into a byte fetch ([`AssetSource`]) and a decode
//! ([`Loader`]); the caller polls the resulting [`LoadTask`] each frame.

mod gltf_loader;
mod loader;
mod source;
mod task;
mod texture_loader;

pub use gltf_loader::{GltfLoader, ModelAsset, ModelMesh, ModelNode};
pub use loader::{LoadError, LoadEvent, LoadProgress, Loader};
pub use source::{resolve_path, AssetSource, MemorySource};
#[cfg(all(feature = "web", target_arch = "wasm32"))]
pub use source::FetchSource;
#[cfg(not(target_arch = "wasm32"))]
pub use source::FileSource;
pub use task::{ByteSink, LoadTask};
pub use texture_loader::TextureLoader;

#[cfg(test)]
pub(crate) use gltf_loader::tests::TRIANGLE_GLTF;
