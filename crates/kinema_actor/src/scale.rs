use kinema_core::{UnitType, is_float_equal};

use crate::actor::Actor;

impl Actor {
    /// Uniformly scales all spatial data of the actor.
    ///
    /// Bind pose translations, the inverse bind pose, node OBBs, the static
    /// AABB, every mesh and every morph target are scaled. Does nothing for a
    /// factor of 1.
    pub fn scale(&mut self, factor: f32) {
        if is_float_equal(factor, 1.0) {
            return;
        }

        self.skeleton.bind_pose_mut().scale_translations(factor);
        self.update_inverse_bind_pose();

        for info in &mut self.node_infos {
            if info.obb.is_valid() {
                info.obb.scale(factor);
            }
        }
        self.static_aabb.scale(factor);

        for lod in &mut self.lods {
            for mesh in lod.node_infos.iter_mut().filter_map(|info| info.mesh.as_mut()) {
                mesh.scale(factor);
            }
            if let Some(setup) = &mut lod.morph_setup {
                setup.scale(factor);
            }
        }

        self.reinitialize_mesh_deformers();
        log::debug!("Actor '{}' scaled by {factor}", self.name());
    }

    /// Converts the actor from its current unit type into `target`.
    pub fn scale_to_unit_type(&mut self, target: UnitType) {
        let current = self.unit_type();
        if current == target {
            return;
        }

        let factor = UnitType::conversion_factor(current, target) as f32;
        self.scale(factor);
        self.set_unit_type(target);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use kinema_core::Transform;

    #[test]
    fn centimeters_to_meters() {
        let mut actor = Actor::new("Units");
        actor.set_unit_type(UnitType::Centimeters);
        actor
            .add_node("Root", None, Transform::from_translation(Vec3::new(100.0, 0.0, 0.0)))
            .unwrap();
        actor.scale_to_unit_type(UnitType::Meters);

        assert_eq!(actor.unit_type(), UnitType::Meters);
        let position = actor.bind_pose().local_space_transform(0).position;
        assert!((position - Vec3::X).length() < 1e-5);
        assert!(actor.has_valid_inverse_bind_pose());
    }

    #[test]
    fn unit_scale_is_a_no_op() {
        let mut actor = Actor::new("Same");
        actor.add_node("Root", None, Transform::from_translation(Vec3::Y)).unwrap();
        actor.scale(1.0);
        assert!(!actor.has_valid_inverse_bind_pose());
    }
}
