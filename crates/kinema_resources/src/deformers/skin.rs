use std::any::Any;

use glam::{Affine3A, Quat, Vec3};

use crate::deformer::{DeformContext, DeformerContext, DeformerType, MeshDeformer};
use crate::mesh::Mesh;
use crate::skinning::SkinInfluence;

/// Total weight below which a vertex is left undeformed.
const MIN_TOTAL_WEIGHT: f32 = 1.0e-6;

fn total_weight(influences: &[SkinInfluence]) -> f32 {
    influences.iter().map(|i| i.weight).sum()
}

// ============================================================================
// Linear Blend Skinning
// ============================================================================

/// Linear blend skinning.
///
/// Each vertex is transformed by the weighted sum of its bones' skinning
/// matrices. Weights are normalised on the fly.
#[derive(Debug, Clone)]
pub struct SoftSkinDeformer {
    enabled: bool,
}

impl Default for SoftSkinDeformer {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl SoftSkinDeformer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl MeshDeformer for SoftSkinDeformer {
    fn deformer_type(&self) -> DeformerType {
        DeformerType::SoftSkin
    }

    // No cached state; influences are read from the mesh on every deform.
    fn reinitialize(&mut self, _ctx: &DeformerContext<'_>) {}

    fn deform(&self, mesh: &Mesh, positions: &mut [Vec3], ctx: &DeformContext<'_>) {
        let Some(layer) = mesh.skinning() else {
            return;
        };

        for (vertex, position) in positions.iter_mut().enumerate() {
            let influences = layer.influences(mesh.org_vertex(vertex));
            let total = total_weight(influences);
            if total < MIN_TOTAL_WEIGHT {
                continue;
            }

            let source = *position;
            let mut result = Vec3::ZERO;
            for influence in influences {
                let matrix = &ctx.skinning_matrices[influence.node_index];
                result += matrix.transform_point3(source) * (influence.weight / total);
            }
            *position = result;
        }
    }

    fn clone_boxed(&self) -> Box<dyn MeshDeformer> {
        Box::new(self.clone())
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// Dual Quaternion Skinning
// ============================================================================

/// Rigid transform as a unit dual quaternion. Scale is ignored.
#[derive(Debug, Clone, Copy)]
struct DualQuat {
    real: Quat,
    dual: Quat,
}

impl DualQuat {
    fn from_affine(matrix: &Affine3A) -> Self {
        let (_, rotation, translation) = matrix.to_scale_rotation_translation();
        let t = Quat::from_xyzw(translation.x, translation.y, translation.z, 0.0);
        Self {
            real: rotation,
            dual: (t * rotation) * 0.5,
        }
    }

    fn transform_point(&self, point: Vec3) -> Vec3 {
        let length = self.real.length();
        let real = self.real / length;
        let dual = self.dual / length;
        let translation = (dual * real.conjugate()).xyz() * 2.0;
        real * point + translation
    }
}

/// Dual quaternion skinning.
///
/// Blends bone transforms as dual quaternions, which avoids the volume loss
/// of linear blending around twisting joints.
#[derive(Debug, Clone)]
pub struct DualQuatSkinDeformer {
    enabled: bool,
}

impl Default for DualQuatSkinDeformer {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl DualQuatSkinDeformer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl MeshDeformer for DualQuatSkinDeformer {
    fn deformer_type(&self) -> DeformerType {
        DeformerType::DualQuatSkin
    }

    // No cached state; influences are read from the mesh on every deform.
    fn reinitialize(&mut self, _ctx: &DeformerContext<'_>) {}

    fn deform(&self, mesh: &Mesh, positions: &mut [Vec3], ctx: &DeformContext<'_>) {
        let Some(layer) = mesh.skinning() else {
            return;
        };

        for (vertex, position) in positions.iter_mut().enumerate() {
            let influences = layer.influences(mesh.org_vertex(vertex));
            let total = total_weight(influences);
            if total < MIN_TOTAL_WEIGHT {
                continue;
            }

            let mut pivot: Option<Quat> = None;
            let mut blended = DualQuat {
                real: Quat::from_xyzw(0.0, 0.0, 0.0, 0.0),
                dual: Quat::from_xyzw(0.0, 0.0, 0.0, 0.0),
            };
            for influence in influences {
                let dq = DualQuat::from_affine(&ctx.skinning_matrices[influence.node_index]);
                let mut weight = influence.weight / total;
                // Keep all rotations in the same hemisphere as the first one.
                let reference = *pivot.get_or_insert(dq.real);
                if reference.dot(dq.real) < 0.0 {
                    weight = -weight;
                }
                blended.real = blended.real + dq.real * weight;
                blended.dual = blended.dual + dq.dual * weight;
            }

            if blended.real.length_squared() > MIN_TOTAL_WEIGHT {
                *position = blended.transform_point(*position);
            }
        }
    }

    fn clone_boxed(&self) -> Box<dyn MeshDeformer> {
        Box::new(self.clone())
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skinning::SkinningLayer;

    fn two_bone_mesh() -> Mesh {
        let mut layer = SkinningLayer::new(1);
        layer.add_influence(0, 0, 0.5);
        layer.add_influence(0, 1, 0.5);
        Mesh::new(vec![Vec3::new(1.0, 0.0, 0.0)], vec![]).with_skinning(layer)
    }

    #[test]
    fn soft_skin_blends_translations() {
        let mesh = two_bone_mesh();
        let matrices = [
            Affine3A::from_translation(Vec3::new(0.0, 2.0, 0.0)),
            Affine3A::from_translation(Vec3::new(0.0, 4.0, 0.0)),
        ];
        let ctx = DeformContext {
            skinning_matrices: &matrices,
            morph_weights: &[],
        };

        let mut positions = mesh.positions().to_vec();
        SoftSkinDeformer::new().deform(&mesh, &mut positions, &ctx);
        assert!((positions[0] - Vec3::new(1.0, 3.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn dual_quat_matches_soft_skin_for_identity() {
        let mesh = two_bone_mesh();
        let matrices = [Affine3A::IDENTITY, Affine3A::IDENTITY];
        let ctx = DeformContext {
            skinning_matrices: &matrices,
            morph_weights: &[],
        };

        let mut positions = mesh.positions().to_vec();
        DualQuatSkinDeformer::new().deform(&mesh, &mut positions, &ctx);
        assert!((positions[0] - Vec3::new(1.0, 0.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn dual_quat_rotates_rigidly() {
        let mut layer = SkinningLayer::new(1);
        layer.add_influence(0, 0, 1.0);
        let mesh = Mesh::new(vec![Vec3::new(1.0, 0.0, 0.0)], vec![]).with_skinning(layer);

        let matrices = [Affine3A::from_rotation_translation(
            Quat::from_rotation_z(std::f32::consts::FRAC_PI_2),
            Vec3::new(0.0, 0.0, 5.0),
        )];
        let ctx = DeformContext {
            skinning_matrices: &matrices,
            morph_weights: &[],
        };

        let mut positions = mesh.positions().to_vec();
        DualQuatSkinDeformer::new().deform(&mesh, &mut positions, &ctx);
        assert!((positions[0] - Vec3::new(0.0, 1.0, 5.0)).length() < 1e-4);
    }
}
