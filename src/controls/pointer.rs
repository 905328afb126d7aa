//! Pointer to ray to hit test against the clickable object.

use crate::animation::CameraPathAnimator;
use crate::camera::PerspectiveCamera;
use crate::math::{Raycaster, Vec2, Vec3};
use crate::scene::{NodeId, Scene};

/// Result of a successful pick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickHit {
    /// The mesh node that was hit, inside the clickable subtree.
    pub node: NodeId,
    /// World-space distance from the ray origin.
    pub distance: f32,
    /// World-space hit point.
    pub point: Vec3,
}

/// Tracks the pointer and tests clicks against the clickable object and
/// every mesh beneath it.
#[derive(Debug, Clone, Default)]
pub struct Picker {
    pointer: Vec2,
    target: Option<NodeId>,
    target_name: Option<String>,
}

impl Picker {
    /// Create a picker whose target is resolved later by node name.
    pub fn new(target_name: Option<String>) -> Self {
        Self {
            target_name,
            ..Default::default()
        }
    }

    /// Designate the clickable node directly.
    pub fn set_target(&mut self, target: Option<NodeId>) {
        self.target = target;
    }

    /// The clickable node, once known.
    #[inline]
    pub fn target(&self) -> Option<NodeId> {
        self.target
    }

    /// Name the target is resolved by.
    #[inline]
    pub fn target_name(&self) -> Option<&str> {
        self.target_name.as_deref()
    }

    /// Look the target up by name in `scene`. Keeps the current target if
    /// no name is configured or nothing matches.
    pub fn resolve_target(&mut self, scene: &Scene) -> Option<NodeId> {
        let Some(name) = self.target_name.as_deref() else {
            return self.target;
        };
        match scene.find_by_name(name) {
            Some(id) => {
                let meshes = scene.meshes_under(id).len();
                if meshes == 0 {
                    log::warn!("Clickable node '{}' has no meshes", name);
                }
                log::info!("Clickable '{}' resolved to node {} ({} meshes)", name, id.index(), meshes);
                self.target = Some(id);
            }
            None => log::debug!("Clickable '{}' not in scene yet", name),
        }
        self.target
    }

    /// Last pointer position in NDC.
    #[inline]
    pub fn pointer(&self) -> Vec2 {
        self.pointer
    }

    /// Record a pointer move in client pixels. Ignored for an empty viewport.
    pub fn pointer_move(&mut self, x: f32, y: f32, width: f32, height: f32) -> bool {
        match Raycaster::screen_to_ndc(x, y, width, height) {
            Some(ndc) => {
                self.pointer = ndc;
                true
            }
            None => false,
        }
    }

    /// Handle a click: refresh world matrices, cast a ray, and start the
    /// animator when the clickable object is hit.
    #[allow(clippy::too_many_arguments)]
    pub fn click(
        &mut self,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        scene: &mut Scene,
        camera: &PerspectiveCamera,
        animator: &mut CameraPathAnimator,
    ) -> Option<PickHit> {
        if !self.pointer_move(x, y, width, height) {
            return None;
        }
        scene.update_matrix_world();
        let hit = self.pick(scene, camera, self.pointer)?;
        log::debug!("Clicked node {} at distance {:.3}", hit.node.index(), hit.distance);
        animator.start();
        Some(hit)
    }

    /// Nearest hit on any visible mesh in the clickable subtree along the
    /// ray through `ndc`. World matrices must be current.
    pub fn pick(&self, scene: &Scene, camera: &PerspectiveCamera, ndc: Vec2) -> Option<PickHit> {
        let target = self.target?;
        let ray = Raycaster::ray_from_ndc(ndc, &camera.view_projection_matrix().inverse());

        scene
            .meshes_under(target)
            .into_iter()
            .filter_map(|(id, mesh, world)| {
                let local_ray = ray.apply_matrix4(&world.inverse());
                local_ray.intersect_box(mesh.geometry.bounding_box())?;

                let local_t = mesh
                    .geometry
                    .triangles()
                    .filter_map(|[a, b, c]| local_ray.intersect_triangle(a, b, c))
                    .map(|hit| hit.distance)
                    .min_by(f32::total_cmp)?;

                let point = world.transform_point3(local_ray.at(local_t));
                Some(PickHit {
                    node: id,
                    distance: point.distance(ray.origin),
                    point,
                })
            })
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }
}
