//! Indexed triangle mesh kept on the CPU for picking and GPU upload.

use super::Vertex;
use crate::core::Id;
use crate::math::{Box3, Vec3};

/// An indexed triangle mesh in local space.
#[derive(Debug, Clone)]
pub struct MeshGeometry {
    id: Id,
    positions: Vec<[f32; 3]>,
    normals: Vec<[f32; 3]>,
    indices: Vec<u32>,
    bounding_box: Box3,
}

impl MeshGeometry {
    /// Build a mesh from raw attributes.
    ///
    /// Missing indices produce a non-indexed triangle list; missing or
    /// mismatched normals are recomputed from the faces. Indices that point
    /// past the vertex array are dropped together with their triangle.
    pub fn new(positions: Vec<[f32; 3]>, normals: Vec<[f32; 3]>, indices: Option<Vec<u32>>) -> Self {
        let vertex_count = positions.len() as u32;
        let indices: Vec<u32> = match indices {
            Some(indices) => indices
                .chunks_exact(3)
                .filter(|tri| tri.iter().all(|&i| i < vertex_count))
                .flatten()
                .copied()
                .collect(),
            None => (0..vertex_count - vertex_count % 3).collect(),
        };
        let bounding_box = Box3::from_points(positions.iter().map(|&p| Vec3::from(p)));

        let mut geometry = Self {
            id: Id::new(),
            positions,
            normals,
            indices,
            bounding_box,
        };
        if geometry.normals.len() != geometry.positions.len() {
            geometry.compute_vertex_normals();
        }
        geometry
    }

    /// An axis-aligned box centered on the origin, with flat per-face normals.
    pub fn cuboid(width: f32, height: f32, depth: f32) -> Self {
        let h = Vec3::new(width, height, depth) * 0.5;
        let mut positions = Vec::with_capacity(24);
        let mut normals = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);

        for axis in 0..3 {
            for sign in [1.0f32, -1.0] {
                let mut normal = Vec3::ZERO;
                normal[axis] = sign;
                // Two tangent axes chosen so that (u, v, normal) is right-handed
                let u = Vec3::from_array(std::array::from_fn(|i| if i == (axis + 1) % 3 { 1.0 } else { 0.0 })) * sign;
                let v = normal.cross(u);

                let base = positions.len() as u32;
                for (su, sv) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
                    let p = (normal + u * su + v * sv) * h;
                    positions.push(p.to_array());
                    normals.push(normal.to_array());
                }
                indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
            }
        }

        Self::new(positions, normals, Some(indices))
    }

    /// Unique ID, used to share GPU buffers between nodes.
    #[inline]
    pub fn id(&self) -> Id {
        self.id
    }

    /// Local-space bounding box.
    #[inline]
    pub fn bounding_box(&self) -> &Box3 {
        &self.bounding_box
    }

    /// Vertex positions.
    #[inline]
    pub fn positions(&self) -> &[[f32; 3]] {
        &self.positions
    }

    /// Triangle indices.
    #[inline]
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Number of triangles.
    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Iterate over triangles as vertex triples.
    pub fn triangles(&self) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        self.indices.chunks_exact(3).map(|tri| {
            [
                Vec3::from(self.positions[tri[0] as usize]),
                Vec3::from(self.positions[tri[1] as usize]),
                Vec3::from(self.positions[tri[2] as usize]),
            ]
        })
    }

    /// Interleaved vertices for GPU upload.
    pub fn vertices(&self) -> Vec<Vertex> {
        self.positions
            .iter()
            .zip(&self.normals)
            .map(|(&p, &n)| Vertex::new(p, n))
            .collect()
    }

    /// Recompute smooth normals by accumulating face normals.
    pub fn compute_vertex_normals(&mut self) {
        let mut accum = vec![Vec3::ZERO; self.positions.len()];
        for tri in self.indices.chunks_exact(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| Vec3::from(self.positions[i as usize]));
            let n = (b - a).cross(c - a);
            for &i in tri {
                accum[i as usize] += n;
            }
        }
        self.normals = accum
            .into_iter()
            .map(|n| n.try_normalize().unwrap_or(Vec3::Y).to_array())
            .collect();
    }
}
