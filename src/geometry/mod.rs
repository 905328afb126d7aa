//! Geometry module for vertex data and CPU-side meshes.

mod mesh_geometry;
mod vertex;

pub use mesh_geometry::MeshGeometry;
pub use vertex::Vertex;
