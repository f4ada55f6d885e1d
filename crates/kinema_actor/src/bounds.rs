use glam::Vec3;
use kinema_core::Obb;

use crate::actor::Actor;
use crate::instance::ActorInstance;

impl Actor {
    /// Fits an OBB to the bind pose geometry of a node at one LOD.
    ///
    /// - unskinned mesh on the node: its original vertex positions
    /// - skinned mesh on the node: nothing, the geometry belongs to the bones
    /// - no mesh: every render vertex of the LOD skinned to this node, moved
    ///   into the node's bind pose frame
    ///
    /// An empty point set gives [`Obb::RESET`].
    #[must_use]
    pub fn compute_obb_from_bind_pose(&self, lod: usize, node: usize) -> Obb {
        let points = self.collect_bind_pose_points(lod, node);
        if points.is_empty() {
            Obb::RESET
        } else {
            Obb::from_points(&points)
        }
    }

    /// Stores [`Actor::compute_obb_from_bind_pose`] as the node's OBB.
    pub fn calc_obb_from_bind_pose(&mut self, lod: usize, node: usize) {
        self.node_infos[node].obb = self.compute_obb_from_bind_pose(lod, node);
    }

    /// Refits the OBB of every node from the given LOD.
    pub fn update_node_bind_pose_obbs(&mut self, lod: usize) {
        for node in 0..self.num_nodes() {
            self.calc_obb_from_bind_pose(lod, node);
        }
    }

    fn collect_bind_pose_points(&self, lod: usize, node: usize) -> Vec<Vec3> {
        let level = &self.lods[lod];
        if let Some(mesh) = &level.node_infos[node].mesh {
            return if mesh.is_skinned() {
                Vec::new()
            } else {
                mesh.extract_original_vertex_positions()
            };
        }

        let inv_bind = self.inverse_bind_or_calc(node);
        let mut points = Vec::new();
        for mesh in level.node_infos.iter().filter_map(|info| info.mesh.as_ref()) {
            let Some(layer) = mesh.skinning() else {
                continue;
            };
            for (vertex, &position) in mesh.positions().iter().enumerate() {
                let org = mesh.org_vertex(vertex);
                for influence in layer.influences(org) {
                    if influence.node_index == node {
                        points.push(inv_bind.transform_point3(position));
                    }
                }
            }
        }
        points
    }

    /// Computes the static AABB if it is not valid yet.
    ///
    /// A transient [`ActorInstance`] evaluates the bind pose at LOD 0 and its
    /// static based bounds are stored on the actor.
    pub fn update_static_aabb(&mut self) {
        if self.static_aabb.is_valid() {
            return;
        }
        let aabb = ActorInstance::new(self).static_based_aabb();
        self.static_aabb = aabb;
    }

    /// Marks the static AABB for recomputation.
    pub fn invalidate_static_aabb(&mut self) {
        self.static_aabb.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kinema_core::Transform;
    use kinema_resources::{Mesh, SkinningLayer};

    #[test]
    fn bone_obb_contains_its_skinned_vertices() {
        let mut actor = Actor::new("Arm");
        actor.add_node("Body", None, Transform::IDENTITY).unwrap();
        actor
            .add_node("Arm", Some(0), Transform::from_translation(Vec3::new(2.0, 0.0, 0.0)))
            .unwrap();
        actor.add_lod_level(false);

        let positions = vec![
            Vec3::new(2.0, -0.5, -0.5),
            Vec3::new(3.0, 0.5, 0.5),
            Vec3::new(2.0, 0.5, -0.5),
            Vec3::new(0.0, 0.0, 0.0),
        ];
        let mut layer = SkinningLayer::new(4);
        for v in 0..3 {
            layer.add_influence(v, 1, 1.0);
        }
        layer.add_influence(3, 0, 1.0);
        actor.set_mesh(0, 0, Some(Mesh::new(positions, vec![]).with_skinning(layer)));
        actor.update_inverse_bind_pose();

        let arm = actor.compute_obb_from_bind_pose(0, 1);
        assert!(arm.is_valid());
        // Points are moved into the arm's frame, two units left of model space.
        assert!(arm.contains(Vec3::new(1.0, 0.5, 0.5), 1e-4));
        assert!(arm.contains(Vec3::new(0.0, -0.5, -0.5), 1e-4));

        // The body owns a skinned mesh, which contributes nothing to its own box.
        assert!(!actor.compute_obb_from_bind_pose(0, 0).is_valid());
    }
}
