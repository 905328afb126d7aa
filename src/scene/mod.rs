//! # Scene Module
//!
//! Scene graph stored as an arena of nodes with hierarchical transforms.

mod node;
mod scene;
mod transform;

pub use node::{Mesh, Node, NodeId, NodeKind};
pub use scene::Scene;
pub use transform::Transform;
