//! Scene graph nodes.

use super::Transform;
use crate::geometry::MeshGeometry;
use crate::light::Light;
use crate::math::Mat4;
use std::sync::Arc;

/// Handle to a node inside a [`Scene`](super::Scene).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Raw arena index.
    #[inline]
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Renderable triangle mesh with a flat base color.
#[derive(Debug, Clone)]
pub struct Mesh {
    /// Shared geometry.
    pub geometry: Arc<MeshGeometry>,
    /// Base color (linear RGBA).
    pub color: [f32; 4],
}

impl Mesh {
    /// Create a mesh with a base color.
    pub fn new(geometry: Arc<MeshGeometry>, color: [f32; 4]) -> Self {
        Self { geometry, color }
    }
}

/// What a node contributes to the scene.
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// Pure transform node.
    Group,
    /// A mesh.
    Mesh(Mesh),
    /// A light.
    Light(Light),
}

/// A node in the scene graph.
#[derive(Debug, Clone)]
pub struct Node {
    /// Node name (may be empty).
    pub name: String,
    /// Local transform.
    pub transform: Transform,
    /// Node payload.
    pub kind: NodeKind,
    /// Hidden nodes and their subtrees are skipped when rendering.
    pub visible: bool,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) world_matrix: Mat4,
}

impl Node {
    /// Create a detached node.
    pub fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            transform: Transform::IDENTITY,
            kind,
            visible: true,
            parent: None,
            children: Vec::new(),
            world_matrix: Mat4::IDENTITY,
        }
    }

    /// Create an empty group node.
    pub fn group(name: impl Into<String>) -> Self {
        Self::new(name, NodeKind::Group)
    }

    /// Create a mesh node.
    pub fn mesh(name: impl Into<String>, mesh: Mesh) -> Self {
        Self::new(name, NodeKind::Mesh(mesh))
    }

    /// Create a light node.
    pub fn light(name: impl Into<String>, light: Light) -> Self {
        Self::new(name, NodeKind::Light(light))
    }

    /// Builder-style transform setter.
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    /// Parent node, `None` for the root.
    #[inline]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Child nodes in insertion order.
    #[inline]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// World matrix as of the last [`Scene::update_matrix_world`](super::Scene::update_matrix_world).
    #[inline]
    pub fn world_matrix(&self) -> &Mat4 {
        &self.world_matrix
    }

    /// The mesh payload, if any.
    pub fn as_mesh(&self) -> Option<&Mesh> {
        match &self.kind {
            NodeKind::Mesh(mesh) => Some(mesh),
            _ => None,
        }
    }
}
