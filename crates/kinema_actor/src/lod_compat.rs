//! Keeps skinned geometry consistent with the skeletal LODs.
//!
//! Geometry LOD `n` is rendered with skeletal LOD `n`. A vertex influenced by
//! a bone that is disabled in that skeletal LOD would follow a joint that is no
//! longer animated, so its influence is moved to the closest enabled ancestor.

use kinema_skeleton::{MAX_SKELETAL_LODS, Skeleton};

use crate::actor::Actor;
use crate::lod::LodLevel;

/// The skeletal LOD used to render a geometry LOD.
#[inline]
pub(crate) fn skeletal_lod_for(geom_lod: usize) -> usize {
    geom_lod.min(MAX_SKELETAL_LODS - 1)
}

impl Actor {
    /// Moves every skinning influence that references a bone disabled in the
    /// matching skeletal LOD onto the nearest enabled ancestor.
    ///
    /// Influences whose bone has no enabled ancestor are left unchanged and
    /// reported once per bone and LOD. Afterwards duplicate influences are
    /// merged and the submesh bone tables and deformers are rebuilt.
    ///
    /// Returns the number of influences that were moved. Running the pass
    /// a second time moves nothing.
    pub fn make_geom_lods_compatible_with_skeletal_lods(&mut self) -> usize {
        let Self { skeleton, lods, .. } = self;
        let mut total = 0;
        for (geom_lod, lod) in lods.iter_mut().enumerate() {
            total += remap_lod_influences(skeleton, geom_lod, lod);
        }
        if total > 0 {
            self.reinitialize_mesh_deformers();
        }
        total
    }

    /// For one geometry LOD, marks every node that some mesh is skinned to
    /// while the node is disabled in `skeletal_lod`.
    #[must_use]
    pub fn verify_skinning(&self, skeletal_lod: usize, geom_lod: usize) -> Vec<bool> {
        let mut conflicts = vec![false; self.num_nodes()];
        for mesh in self.lods[geom_lod]
            .node_infos
            .iter()
            .filter_map(|info| info.mesh.as_ref())
        {
            let Some(layer) = mesh.skinning() else {
                continue;
            };
            for node in layer.referenced_nodes() {
                if !self.skeleton.node(node).skeletal_lod_status(skeletal_lod) {
                    conflicts[node] = true;
                }
            }
        }
        conflicts
    }

    /// Every node referenced by a skinning influence in the LOD, in order of
    /// first appearance.
    #[must_use]
    pub fn extract_bone_list(&self, lod: usize) -> Vec<usize> {
        let mut bones = Vec::new();
        for mesh in self.lods[lod]
            .node_infos
            .iter()
            .filter_map(|info| info.mesh.as_ref())
        {
            let Some(layer) = mesh.skinning() else {
                continue;
            };
            for (_, influences) in layer.iter() {
                for influence in influences {
                    if !bones.contains(&influence.node_index) {
                        bones.push(influence.node_index);
                    }
                }
            }
        }
        bones
    }
}

fn remap_lod_influences(skeleton: &Skeleton, geom_lod: usize, lod: &mut LodLevel) -> usize {
    let skeletal_lod = skeletal_lod_for(geom_lod);
    let mut remapped = 0;
    let mut reported: Vec<usize> = Vec::new();

    for info in &mut lod.node_infos {
        let Some(mesh) = &mut info.mesh else {
            continue;
        };
        let Some(layer) = mesh.skinning_mut() else {
            continue;
        };

        let mut touched = false;
        for vertex in 0..layer.num_org_vertices() {
            for influence in layer.influences_mut(vertex).iter_mut() {
                let bone = influence.node_index;
                if skeleton.node(bone).skeletal_lod_status(skeletal_lod) {
                    continue;
                }
                match skeleton.find_first_active_parent(skeletal_lod, bone) {
                    Some(parent) => {
                        influence.node_index = parent;
                        remapped += 1;
                        touched = true;
                    }
                    None => {
                        if !reported.contains(&bone) {
                            reported.push(bone);
                            log::warn!(
                                "Bone '{}' is disabled in skeletal LOD {skeletal_lod} and has no enabled ancestor, skinning left unchanged",
                                skeleton.node(bone).name()
                            );
                        }
                    }
                }
            }
            layer.collapse_influences(vertex);
        }

        if touched {
            mesh.reinit_submesh_bones();
        }
    }
    remapped
}
