//! Scene container - the root of the scene graph.

use super::{Mesh, Node, NodeId, NodeKind};
use crate::light::Light;
use crate::math::Mat4;
use crate::texture::EquirectImage;
use std::sync::Arc;

/// The scene: an arena of nodes rooted at a single group.
#[derive(Debug, Clone)]
pub struct Scene {
    nodes: Vec<Node>,
    root: NodeId,
    background: Option<Arc<EquirectImage>>,
    environment: Option<Arc<EquirectImage>>,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    /// Create an empty scene with a root group.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::group("Scene")],
            root: NodeId(0),
            background: None,
            environment: None,
        }
    }

    /// The root node.
    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of nodes including the root.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when only the root exists.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    /// Add a node under the root.
    pub fn add(&mut self, node: Node) -> NodeId {
        self.add_child(self.root, node)
    }

    /// Add a node under `parent`. Falls back to the root if `parent` is unknown.
    pub fn add_child(&mut self, parent: NodeId, mut node: Node) -> NodeId {
        let parent = if parent.0 < self.nodes.len() { parent } else { self.root };
        let id = NodeId(self.nodes.len());
        node.parent = Some(parent);
        node.children.clear();
        self.nodes.push(node);
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Get a node.
    #[inline]
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    /// Get a node mutably.
    #[inline]
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0)
    }

    /// First node with the given name, in depth-first order.
    pub fn find_by_name(&self, name: &str) -> Option<NodeId> {
        let mut found = None;
        self.traverse(|id, node| {
            if found.is_none() && node.name == name {
                found = Some(id);
            }
        });
        found
    }

    /// Recompute the world matrix of every node from its local transform.
    pub fn update_matrix_world(&mut self) {
        let mut stack = vec![(self.root, Mat4::IDENTITY)];
        while let Some((id, parent_world)) = stack.pop() {
            let node = &mut self.nodes[id.0];
            node.world_matrix = parent_world * node.transform.matrix();
            let world = node.world_matrix;
            for &child in node.children.iter().rev() {
                stack.push((child, world));
            }
        }
    }

    /// Visit every node depth-first, parents before children.
    pub fn traverse(&self, mut visit: impl FnMut(NodeId, &Node)) {
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            let node = &self.nodes[id.0];
            visit(id, node);
            stack.extend(node.children.iter().rev().copied());
        }
    }

    /// Visible meshes with their world matrices.
    pub fn meshes(&self) -> Vec<(NodeId, &Mesh, Mat4)> {
        self.meshes_under(self.root)
    }

    /// Visible meshes in the subtree rooted at `root`, `root` included.
    pub fn meshes_under(&self, root: NodeId) -> Vec<(NodeId, &Mesh, Mat4)> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let Some(node) = self.nodes.get(id.0) else {
                continue;
            };
            if !node.visible {
                continue;
            }
            if let NodeKind::Mesh(mesh) = &node.kind {
                out.push((id, mesh, node.world_matrix));
            }
            stack.extend(node.children.iter().rev().copied());
        }
        out
    }

    /// All lights in the scene.
    pub fn lights(&self) -> impl Iterator<Item = &Light> {
        self.nodes.iter().filter_map(|node| match &node.kind {
            NodeKind::Light(light) if node.visible => Some(light),
            _ => None,
        })
    }

    /// Background image drawn behind everything.
    pub fn background(&self) -> Option<&Arc<EquirectImage>> {
        self.background.as_ref()
    }

    /// Set the background image.
    pub fn set_background(&mut self, image: Option<Arc<EquirectImage>>) {
        self.background = image;
    }

    /// Environment image used for diffuse lighting.
    pub fn environment(&self) -> Option<&Arc<EquirectImage>> {
        self.environment.as_ref()
    }

    /// Set the environment image.
    pub fn set_environment(&mut self, image: Option<Arc<EquirectImage>>) {
        self.environment = image;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::MeshGeometry;
    use crate::light::AmbientLight;
    use crate::math::Vec3;
    use crate::scene::Transform;

    fn cube() -> Mesh {
        Mesh::new(Arc::new(MeshGeometry::cuboid(1.0, 1.0, 1.0)), [1.0; 4])
    }

    #[test]
    fn test_world_matrix_composes() {
        let mut scene = Scene::new();
        let parent = scene.add(Node::group("parent").with_transform(Transform::from_position(Vec3::X)));
        let child = scene.add_child(
            parent,
            Node::mesh("child", cube()).with_transform(Transform::from_position(Vec3::Y)),
        );
        scene.update_matrix_world();

        let world = scene.node(child).map(|n| *n.world_matrix()).unwrap_or(Mat4::IDENTITY);
        let p = world.transform_point3(Vec3::ZERO);
        assert!(p.abs_diff_eq(Vec3::new(1.0, 1.0, 0.0), 1e-6));
        assert_eq!(scene.node(child).and_then(|n| n.parent()), Some(parent));
    }

    #[test]
    fn test_find_by_name() {
        let mut scene = Scene::new();
        let group = scene.add(Node::group("group"));
        let target = scene.add_child(group, Node::mesh("Screen", cube()));
        assert_eq!(scene.find_by_name("Screen"), Some(target));
        assert_eq!(scene.find_by_name("missing"), None);
    }

    #[test]
    fn test_hidden_subtree_skipped() {
        let mut scene = Scene::new();
        let group = scene.add(Node::group("group"));
        scene.add_child(group, Node::mesh("a", cube()));
        scene.add(Node::mesh("b", cube()));
        assert_eq!(scene.meshes().len(), 2);

        if let Some(node) = scene.node_mut(group) {
            node.visible = false;
        }
        assert_eq!(scene.meshes().len(), 1);
    }

    #[test]
    fn test_meshes_under_subtree() {
        let mut scene = Scene::new();
        let screen = scene.add(Node::group("Screen"));
        let a = scene.add_child(screen, Node::mesh("Screen_0", cube()));
        let b = scene.add_child(screen, Node::mesh("Screen_1", cube()));
        scene.add(Node::mesh("other", cube()));

        let ids: Vec<NodeId> = scene.meshes_under(screen).into_iter().map(|(id, _, _)| id).collect();
        assert_eq!(ids, vec![a, b]);
        assert_eq!(scene.meshes_under(a).len(), 1);
        assert!(scene.meshes_under(NodeId(999)).is_empty());
    }

    #[test]
    fn test_lights_and_images() {
        let mut scene = Scene::new();
        assert!(scene.is_empty());
        scene.add(Node::light("ambient", Light::Ambient(AmbientLight::new(Vec3::ONE, 0.6))));
        assert_eq!(scene.lights().count(), 1);

        let image = EquirectImage::new(1, 1, vec![0, 0, 0, 255]).map(Arc::new);
        scene.set_background(image.clone());
        scene.set_environment(image);
        assert!(scene.background().is_some());
        assert!(scene.environment().is_some());
    }
}
