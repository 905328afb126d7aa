//! GLTF/GLB model loader.

use super::{LoadError, Loader};
use crate::geometry::MeshGeometry;
use crate::scene::{Mesh, Node, NodeId, Scene, Transform};
use std::sync::Arc;

const GLB_MAGIC: &[u8; 4] = b"glTF";
const GLB_JSON_CHUNK: u32 = 0x4E4F_534A;

/// One triangle primitive with its material color.
#[derive(Debug, Clone)]
pub struct ModelMesh {
    /// Name of the owning glTF mesh.
    pub name: String,
    /// Triangle geometry.
    pub geometry: Arc<MeshGeometry>,
    /// Base color factor (linear RGBA).
    pub color: [f32; 4],
}

/// A node of the model hierarchy.
#[derive(Debug, Clone)]
pub struct ModelNode {
    /// Node name.
    pub name: String,
    /// Local transform.
    pub transform: Transform,
    /// Indices into [`ModelAsset::meshes`].
    pub meshes: Vec<usize>,
    /// Indices into [`ModelAsset::nodes`].
    pub children: Vec<usize>,
}

/// A decoded model, independent of any scene.
#[derive(Debug, Clone, Default)]
pub struct ModelAsset {
    /// Model name.
    pub name: String,
    /// Flattened primitives.
    pub meshes: Vec<ModelMesh>,
    /// All nodes.
    pub nodes: Vec<ModelNode>,
    /// Root node indices.
    pub roots: Vec<usize>,
}

impl ModelAsset {
    /// Total triangle count.
    pub fn triangle_count(&self) -> usize {
        self.meshes.iter().map(|m| m.geometry.triangle_count()).sum()
    }

    /// Insert the model under `parent` and return the model's root group.
    ///
    /// A node with a single primitive becomes a mesh node carrying the node
    /// name; a node with several becomes a group of mesh children.
    pub fn instantiate(&self, scene: &mut Scene, parent: NodeId) -> NodeId {
        let root = scene.add_child(parent, Node::group(self.name.clone()));
        let mut visited = vec![false; self.nodes.len()];
        let mut stack: Vec<(usize, NodeId)> = self.roots.iter().rev().map(|&i| (i, root)).collect();

        while let Some((index, parent)) = stack.pop() {
            let Some(node) = self.nodes.get(index) else {
                continue;
            };
            if std::mem::replace(&mut visited[index], true) {
                continue;
            }

            let meshes: Vec<Mesh> = node
                .meshes
                .iter()
                .filter_map(|&m| self.meshes.get(m))
                .map(|m| Mesh::new(Arc::clone(&m.geometry), m.color))
                .collect();

            let id = match <[Mesh; 1]>::try_from(meshes) {
                Ok([mesh]) => scene.add_child(parent, Node::mesh(node.name.clone(), mesh).with_transform(node.transform)),
                Err(meshes) => {
                    let group = scene.add_child(parent, Node::group(node.name.clone()).with_transform(node.transform));
                    for (i, mesh) in meshes.into_iter().enumerate() {
                        scene.add_child(group, Node::mesh(format!("{}_{}", node.name, i), mesh));
                    }
                    group
                }
            };

            for &child in node.children.iter().rev() {
                stack.push((child, id));
            }
        }
        root
    }
}

/// GLTF/GLB file loader.
#[derive(Debug, Clone, Copy, Default)]
pub struct GltfLoader;

impl GltfLoader {
    /// Create a new GLTF loader.
    pub fn new() -> Self {
        Self
    }

    /// Parse a GLB or a self-contained glTF document.
    pub fn load_from_bytes(&self, data: &[u8]) -> Result<ModelAsset, LoadError> {
        let stripped = strip_required_extensions(data);
        let (document, buffers, _images) = gltf::import_slice(stripped.as_deref().unwrap_or(data))
            .map_err(|e| LoadError::Decode(format!("invalid glTF: {e}")))?;

        let mut model = ModelAsset {
            name: "Model".to_string(),
            ..Default::default()
        };

        let mut primitives_of_mesh: Vec<Vec<usize>> = Vec::with_capacity(document.meshes().len());
        for mesh in document.meshes() {
            let mut indices = Vec::new();
            for primitive in mesh.primitives() {
                if primitive.mode() != gltf::mesh::Mode::Triangles {
                    log::debug!("Skipping {:?} primitive in mesh {}", primitive.mode(), mesh.index());
                    continue;
                }
                let geometry = read_primitive(&primitive, &buffers)?;
                indices.push(model.meshes.len());
                model.meshes.push(ModelMesh {
                    name: mesh.name().unwrap_or("Mesh").to_string(),
                    geometry: Arc::new(geometry),
                    color: primitive.material().pbr_metallic_roughness().base_color_factor(),
                });
            }
            primitives_of_mesh.push(indices);
        }

        for node in document.nodes() {
            let (translation, rotation, scale) = node.transform().decomposed();
            model.nodes.push(ModelNode {
                name: node.name().map(str::to_string).unwrap_or_else(|| format!("Node{}", node.index())),
                transform: Transform::from_trs(translation, rotation, scale),
                meshes: node
                    .mesh()
                    .and_then(|m| primitives_of_mesh.get(m.index()))
                    .cloned()
                    .unwrap_or_default(),
                children: node.children().map(|c| c.index()).collect(),
            });
        }

        match document.default_scene().or_else(|| document.scenes().next()) {
            Some(scene) => {
                if let Some(name) = scene.name() {
                    model.name = name.to_string();
                }
                model.roots = scene.nodes().map(|n| n.index()).collect();
            }
            None => {
                let mut is_child = vec![false; model.nodes.len()];
                for child in model.nodes.iter().flat_map(|n| n.children.iter()) {
                    if let Some(flag) = is_child.get_mut(*child) {
                        *flag = true;
                    }
                }
                model.roots = (0..model.nodes.len()).filter(|&i| !is_child[i]).collect();
            }
        }

        log::debug!(
            "Decoded glTF: {} nodes, {} primitives, {} triangles",
            model.nodes.len(),
            model.meshes.len(),
            model.triangle_count()
        );
        Ok(model)
    }
}

impl Loader for GltfLoader {
    type Asset = ModelAsset;

    fn decode(&self, bytes: &[u8]) -> Result<ModelAsset, LoadError> {
        self.load_from_bytes(bytes)
    }
}

fn read_primitive(primitive: &gltf::Primitive, buffers: &[gltf::buffer::Data]) -> Result<MeshGeometry, LoadError> {
    let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|data| data.0.as_slice()));

    let positions: Vec<[f32; 3]> = reader
        .read_positions()
        .ok_or_else(|| LoadError::Decode("primitive missing positions".to_string()))?
        .collect();
    let normals: Vec<[f32; 3]> = reader.read_normals().map(|n| n.collect()).unwrap_or_default();
    let indices: Option<Vec<u32>> = reader.read_indices().map(|i| i.into_u32().collect());

    Ok(MeshGeometry::new(positions, normals, indices))
}

/// Remove `extensionsRequired` so files declaring unsupported extensions
/// still load. Returns `None` when the input needs no change.
fn strip_required_extensions(data: &[u8]) -> Option<Vec<u8>> {
    if data.starts_with(GLB_MAGIC) {
        strip_from_glb(data)
    } else {
        strip_from_json(data)
    }
}

fn read_u32(data: &[u8], offset: usize) -> Option<u32> {
    let bytes = data.get(offset..offset + 4)?;
    Some(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

fn strip_from_glb(data: &[u8]) -> Option<Vec<u8>> {
    // Header: magic, version, length. First chunk: length, type, payload.
    let json_length = read_u32(data, 12)? as usize;
    if read_u32(data, 16)? != GLB_JSON_CHUNK {
        return None;
    }
    let json_start = 20;
    let json_end = json_start + json_length;
    let json = strip_from_json(data.get(json_start..json_end)?)?;

    let padded = (json.len() + 3) & !3;
    let rest = &data[json_end..];
    let total = 12 + 8 + padded + rest.len();

    let mut out = Vec::with_capacity(total);
    out.extend_from_slice(&data[0..8]);
    out.extend_from_slice(&(total as u32).to_le_bytes());
    out.extend_from_slice(&(padded as u32).to_le_bytes());
    out.extend_from_slice(&GLB_JSON_CHUNK.to_le_bytes());
    out.extend_from_slice(&json);
    out.resize(20 + padded, b' ');
    out.extend_from_slice(rest);
    Some(out)
}

fn strip_from_json(data: &[u8]) -> Option<Vec<u8>> {
    let mut json: serde_json::Value = serde_json::from_slice(data).ok()?;
    let removed = json.as_object_mut()?.remove("extensionsRequired")?;
    log::warn!("Ignoring required glTF extensions: {}", removed);
    serde_json::to_vec(&json).ok()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// A named triangle under a translated parent, with a required
    /// extension nobody supports.
    pub(crate) const TRIANGLE_GLTF: &str = r#"{
        "asset": { "version": "2.0" },
        "extensionsRequired": ["EXT_not_supported_anywhere"],
        "scene": 0,
        "scenes": [{ "name": "Room", "nodes": [0] }],
        "nodes": [
            { "name": "Group", "translation": [1.0, 0.0, 0.0], "children": [1] },
            { "name": "Screen", "mesh": 0 }
        ],
        "meshes": [{ "name": "ScreenMesh", "primitives": [{ "attributes": { "POSITION": 0 }, "material": 0 }] }],
        "materials": [{ "pbrMetallicRoughness": { "baseColorFactor": [0.5, 0.25, 1.0, 1.0] } }],
        "buffers": [{
            "byteLength": 36,
            "uri": "data:application/octet-stream;base64,AAAAAAAAAAAAAAAAAACAPwAAAAAAAAAAAAAAAAAAgD8AAAAA"
        }],
        "bufferViews": [{ "buffer": 0, "byteLength": 36 }],
        "accessors": [{
            "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
            "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0]
        }]
    }"#;

    pub(crate) fn glb_from_json(json: &str) -> Vec<u8> {
        let mut chunk = json.as_bytes().to_vec();
        chunk.resize((chunk.len() + 3) & !3, b' ');
        let total = 12 + 8 + chunk.len();

        let mut glb = Vec::with_capacity(total);
        glb.extend_from_slice(GLB_MAGIC);
        glb.extend_from_slice(&2u32.to_le_bytes());
        glb.extend_from_slice(&(total as u32).to_le_bytes());
        glb.extend_from_slice(&(chunk.len() as u32).to_le_bytes());
        glb.extend_from_slice(&GLB_JSON_CHUNK.to_le_bytes());
        glb.extend_from_slice(&chunk);
        glb
    }

    #[test]
    fn test_load_gltf_json() {
        let model = GltfLoader::new().load_from_bytes(TRIANGLE_GLTF.as_bytes()).unwrap();
        assert_eq!(model.name, "Room");
        assert_eq!(model.roots, vec![0]);
        assert_eq!(model.nodes.len(), 2);
        assert_eq!(model.meshes.len(), 1);
        assert_eq!(model.triangle_count(), 1);
        assert_eq!(model.meshes[0].color, [0.5, 0.25, 1.0, 1.0]);
        assert_eq!(model.nodes[1].meshes, vec![0]);
    }

    #[test]
    fn test_load_glb() {
        let glb = glb_from_json(TRIANGLE_GLTF);
        let model = GltfLoader::new().decode(&glb).unwrap();
        assert_eq!(model.triangle_count(), 1);
    }

    #[test]
    fn test_strip_leaves_clean_documents_alone() {
        assert!(strip_from_json(br#"{"asset":{"version":"2.0"}}"#).is_none());
        assert!(strip_required_extensions(b"not json").is_none());
    }

    #[test]
    fn test_instantiate_into_scene() {
        let model = GltfLoader::new().load_from_bytes(TRIANGLE_GLTF.as_bytes()).unwrap();
        let mut scene = Scene::new();
        let scene_root = scene.root();
        let root = model.instantiate(&mut scene, scene_root);
        scene.update_matrix_world();

        let screen = scene.find_by_name("Screen").unwrap();
        let node = scene.node(screen).unwrap();
        assert!(node.as_mesh().is_some());
        assert_eq!(scene.node(root).unwrap().name, "Room");

        let origin = node.world_matrix().transform_point3(glam::Vec3::ZERO);
        assert!(origin.abs_diff_eq(glam::Vec3::X, 1e-6));
    }

    #[test]
    fn test_garbage_is_decode_error() {
        let err = GltfLoader::new().load_from_bytes(b"garbage").unwrap_err();
        assert!(matches!(err, LoadError::Decode(_)));
    }
}
