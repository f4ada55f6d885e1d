//! Runtime view of an actor.
//!
//! An [`ActorInstance`] borrows its actor immutably and owns everything that
//! changes per frame: the current pose and the skinning matrices derived from
//! it. Creating one never mutates the actor.

use glam::{Affine3A, Vec3};
use kinema_core::BoundingBox;
use kinema_resources::DeformContext;
use kinema_skeleton::Pose;

use crate::actor::Actor;

#[derive(Debug, Clone)]
pub struct ActorInstance<'a> {
    actor: &'a Actor,
    lod_level: usize,
    pose: Pose,
    /// `model_space(node) * inverse_bind(node)` for every node.
    skinning_matrices: Vec<Affine3A>,
}

impl<'a> ActorInstance<'a> {
    /// Creates an instance in the actor's bind pose at LOD 0.
    #[must_use]
    pub fn new(actor: &'a Actor) -> Self {
        let mut instance = Self {
            actor,
            lod_level: 0,
            pose: actor.bind_pose().clone(),
            skinning_matrices: Vec::new(),
        };
        instance.update_transforms();
        instance
    }

    #[inline]
    #[must_use]
    pub fn actor(&self) -> &'a Actor {
        self.actor
    }

    #[inline]
    #[must_use]
    pub fn lod_level(&self) -> usize {
        self.lod_level
    }

    /// Selects the geometry LOD. Values past the last LOD are clamped.
    pub fn set_lod_level(&mut self, lod: usize) {
        self.lod_level = lod.min(self.actor.num_lod_levels().saturating_sub(1));
    }

    #[inline]
    #[must_use]
    pub fn pose(&self) -> &Pose {
        &self.pose
    }

    /// Mutable pose. Call [`ActorInstance::update_transforms`] after editing.
    #[inline]
    pub fn pose_mut(&mut self) -> &mut Pose {
        &mut self.pose
    }

    /// Recomputes model space transforms and skinning matrices from the pose.
    pub fn update_transforms(&mut self) {
        self.pose.force_update_full_model_space_pose();
        let actor = self.actor;
        self.skinning_matrices = self
            .pose
            .model_space_transforms()
            .iter()
            .enumerate()
            .map(|(node, model)| model.to_affine() * actor.inverse_bind_or_calc(node))
            .collect();
    }

    #[inline]
    #[must_use]
    pub fn skinning_matrices(&self) -> &[Affine3A] {
        &self.skinning_matrices
    }

    /// Model space vertex positions of a node's mesh at the current LOD.
    ///
    /// Meshes with a deformer stack are run through it. Output of a skinning
    /// stack is already in model space; everything else is moved there by the
    /// node's model transform.
    #[must_use]
    pub fn deformed_positions(&self, node: usize) -> Option<Vec<Vec3>> {
        if self.actor.num_lod_levels() == 0 {
            return None;
        }
        let info = &self.actor.lod_level(self.lod_level).node_infos[node];
        let mesh = info.mesh.as_ref()?;
        let node_model = self.pose.model_space_transforms()[node].to_affine();

        let Some(stack) = info.stack.as_ref().filter(|s| !s.is_empty()) else {
            return Some(mesh.positions().iter().map(|&p| node_model.transform_point3(p)).collect());
        };

        let ctx = DeformContext {
            skinning_matrices: &self.skinning_matrices,
            morph_weights: self.pose.morph_weights(),
        };
        let mut positions = stack.update(mesh, &ctx);
        if !stack.has_skinning_deformer() {
            for p in &mut positions {
                *p = node_model.transform_point3(*p);
            }
        }
        Some(positions)
    }

    /// Bounds of every mesh at the current LOD in model space.
    #[must_use]
    pub fn calc_mesh_based_aabb(&self) -> BoundingBox {
        let mut aabb = BoundingBox::RESET;
        for node in 0..self.actor.num_nodes() {
            if !self.actor.skeleton().node(node).include_in_bounds {
                continue;
            }
            for p in self.deformed_positions(node).unwrap_or_default() {
                aabb.add_point(p);
            }
        }
        aabb
    }

    /// Bounds of the model space node positions.
    #[must_use]
    pub fn calc_node_based_aabb(&self) -> BoundingBox {
        let mut aabb = BoundingBox::RESET;
        let models = self.pose.model_space_transforms();
        for (node, model) in models.iter().enumerate() {
            if self.actor.skeleton().node(node).include_in_bounds {
                aabb.add_point(model.position);
            }
        }
        aabb
    }

    /// Mesh based bounds, or node based bounds for an actor without meshes.
    #[must_use]
    pub fn static_based_aabb(&self) -> BoundingBox {
        let aabb = self.calc_mesh_based_aabb();
        if aabb.is_valid() {
            aabb
        } else {
            self.calc_node_based_aabb()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kinema_core::Transform;
    use kinema_resources::{Mesh, MeshDeformerStack, SkinningLayer, SoftSkinDeformer};

    #[test]
    fn skinned_and_static_meshes_land_in_model_space() {
        let mut actor = Actor::new("Bounds");
        actor
            .add_node("Root", None, Transform::from_translation(Vec3::new(0.0, 1.0, 0.0)))
            .unwrap();
        actor
            .add_node("Prop", Some(0), Transform::from_translation(Vec3::new(5.0, 0.0, 0.0)))
            .unwrap();
        actor.add_lod_level(false);

        let mut layer = SkinningLayer::new(1);
        layer.add_influence(0, 0, 1.0);
        actor.set_mesh(0, 0, Some(Mesh::new(vec![Vec3::new(0.0, 2.0, 0.0)], vec![]).with_skinning(layer)));
        actor.set_mesh_deformer_stack(0, 0, Some(MeshDeformerStack::new().with_deformer(SoftSkinDeformer::new())));
        actor.set_mesh(0, 1, Some(Mesh::new(vec![Vec3::new(1.0, 0.0, 0.0)], vec![])));
        actor.update_inverse_bind_pose();

        let instance = ActorInstance::new(&actor);
        let aabb = instance.static_based_aabb();
        assert!((aabb.min - Vec3::new(0.0, 1.0, 0.0)).length() < 1e-5);
        assert!((aabb.max - Vec3::new(6.0, 2.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn falls_back_to_node_positions() {
        let mut actor = Actor::new("Bones");
        actor.add_node("A", None, Transform::from_translation(Vec3::X)).unwrap();
        actor.add_node("B", Some(0), Transform::from_translation(Vec3::Y)).unwrap();
        let aabb = ActorInstance::new(&actor).static_based_aabb();
        assert!((aabb.max - Vec3::new(1.0, 1.0, 0.0)).length() < 1e-5);
    }
}
