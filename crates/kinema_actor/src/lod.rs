//! LOD-indexed geometry storage.
//!
//! Each [`LodLevel`] owns one [`NodeLodInfo`] slot per skeleton node together
//! with the materials and morph setup of that LOD, so the LOD count of meshes,
//! materials and morph setups can never diverge.

use kinema_core::{KinemaError, Result};
use kinema_resources::{
    DeformerContext, DeformerType, Material, Mesh, MeshDeformerStack, MorphSetup,
};
use kinema_skeleton::MAX_SKELETAL_LODS;

use crate::actor::Actor;

/// The owned geometry of one node at one LOD.
#[derive(Debug, Clone, Default)]
pub struct NodeLodInfo {
    pub mesh: Option<Mesh>,
    pub stack: Option<MeshDeformerStack>,
}

impl NodeLodInfo {
    /// A node is deformable when it carries a non-empty deformer stack.
    #[inline]
    #[must_use]
    pub fn is_deformable(&self) -> bool {
        self.stack.as_ref().is_some_and(|s| !s.is_empty())
    }
}

/// All geometry, materials and morph targets of one LOD tier.
#[derive(Debug, Clone, Default)]
pub struct LodLevel {
    pub node_infos: Vec<NodeLodInfo>,
    pub materials: Vec<Material>,
    pub morph_setup: Option<MorphSetup>,
}

impl LodLevel {
    /// An empty tier with one slot per node.
    #[must_use]
    pub fn with_num_nodes(num_nodes: usize) -> Self {
        Self {
            node_infos: vec![NodeLodInfo::default(); num_nodes],
            materials: Vec::new(),
            morph_setup: None,
        }
    }
}

/// Summed mesh sizes over a LOD.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MeshTotals {
    pub polygons: u32,
    pub vertices: u32,
    pub indices: u32,
}

impl MeshTotals {
    fn add(&mut self, mesh: &Mesh) {
        self.polygons += mesh.num_polygons();
        self.vertices += mesh.num_vertices();
        self.indices += mesh.num_indices();
    }
}

/// Which meshes [`Actor::calc_mesh_totals`] sums over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MeshFilter {
    All,
    Static,
    Deformable,
}

impl Actor {
    // ========================================================================
    // LOD Levels
    // ========================================================================

    #[inline]
    #[must_use]
    pub fn num_lod_levels(&self) -> usize {
        self.lods.len()
    }

    #[inline]
    #[must_use]
    pub fn lod_level(&self, lod: usize) -> &LodLevel {
        &self.lods[lod]
    }

    /// Checked variant of [`Actor::lod_level`] for callers holding untrusted indices.
    pub fn try_lod_level(&self, lod: usize) -> Result<&LodLevel> {
        self.lods.get(lod).ok_or(KinemaError::LodOutOfRange {
            lod,
            num_lods: self.lods.len(),
        })
    }

    /// Appends a LOD level sized to the current node count.
    ///
    /// With `copy_from_previous` and an existing previous LOD, meshes, stacks,
    /// materials and the morph setup are deep-cloned from it, and every node's
    /// skeletal LOD flag for the new level is copied from the previous level.
    pub fn add_lod_level(&mut self, copy_from_previous: bool) {
        let num_nodes = self.num_nodes();
        let new_lod = self.lods.len();

        let level = match self.lods.last() {
            Some(previous) if copy_from_previous => previous.clone(),
            _ => LodLevel::with_num_nodes(num_nodes),
        };
        self.lods.push(level);

        if copy_from_previous && new_lod > 0 && new_lod < MAX_SKELETAL_LODS {
            for node in 0..num_nodes {
                let enabled = self.skeleton.node(node).skeletal_lod_status(new_lod - 1);
                self.skeleton
                    .node_mut(node)
                    .set_skeletal_lod_status(new_lod, enabled);
            }
        }
    }

    /// Inserts an empty LOD level at `position`, shifting later levels up.
    pub fn insert_lod_level(&mut self, position: usize) {
        let level = LodLevel::with_num_nodes(self.num_nodes());
        self.lods.insert(position, level);
    }

    /// Removes a LOD level and everything it owns.
    pub fn remove_lod_level(&mut self, lod: usize) -> LodLevel {
        self.lods.remove(lod)
    }

    /// Keeps only LOD 0.
    pub fn remove_all_lod_levels(&mut self) {
        self.lods.truncate(1);
    }

    /// Resizes to `count` LOD levels. Existing levels are kept, new ones are empty.
    pub fn set_num_lod_levels(&mut self, count: usize) {
        let num_nodes = self.num_nodes();
        self.lods
            .resize_with(count, || LodLevel::with_num_nodes(num_nodes));
    }

    /// Copies one LOD of `source` into `target_lod` of this actor, matching
    /// nodes by name.
    ///
    /// Nodes of this actor without a counterpart in `source` keep an empty
    /// slot and are reported with a warning. The materials and morph setup of
    /// the target LOD are replaced. With `copy_skeletal_lod_flags` the
    /// skeletal LOD flag of every matched node is taken from the source node.
    ///
    /// Skinning influences and morph deform data are renumbered into this
    /// actor's skeleton. Influences on a source node without a match move to
    /// its nearest matched ancestor and are dropped when there is none.
    ///
    /// Returns the indices of the nodes that had no match.
    pub fn copy_lod_level(
        &mut self,
        source: &Actor,
        copy_lod: usize,
        target_lod: usize,
        copy_skeletal_lod_flags: bool,
    ) -> Vec<usize> {
        let source_level = &source.lods[copy_lod];
        let mut source_to_target = vec![None; source.num_nodes()];
        let mut unmatched = Vec::new();

        for node in 0..self.num_nodes() {
            let target_node = self.skeleton.node(node);
            let Some(source_node) = source.skeleton.find_node_by_id(target_node.id()) else {
                log::warn!(
                    "copy_lod_level: node '{}' has no match in actor '{}', LOD {target_lod} slot left empty",
                    target_node.name(),
                    source.name()
                );
                self.lods[target_lod].node_infos[node] = NodeLodInfo::default();
                unmatched.push(node);
                continue;
            };

            source_to_target[source_node] = Some(node);
            self.lods[target_lod].node_infos[node] = source_level.node_infos[source_node].clone();

            if copy_skeletal_lod_flags
                && target_lod < MAX_SKELETAL_LODS
                && copy_lod < MAX_SKELETAL_LODS
            {
                let enabled = source
                    .skeleton
                    .node(source_node)
                    .skeletal_lod_status(copy_lod);
                self.skeleton
                    .node_mut(node)
                    .set_skeletal_lod_status(target_lod, enabled);
            }
        }

        let nearest_match = |mut node: usize| loop {
            if let Some(target) = source_to_target.get(node).copied().flatten() {
                return Some(target);
            }
            node = source.skeleton.nodes().get(node)?.parent()?;
        };

        let target = &mut self.lods[target_lod];
        for (node, info) in target.node_infos.iter_mut().enumerate() {
            let Some(mesh) = &mut info.mesh else {
                continue;
            };
            if let Some(layer) = mesh.skinning_mut() {
                let mut dropped = 0;
                layer.remap_nodes(|n| {
                    let mapped = nearest_match(n);
                    if mapped.is_none() {
                        dropped += 1;
                    }
                    mapped
                });
                if dropped > 0 {
                    log::warn!(
                        "copy_lod_level: dropped {dropped} skinning influences of node {node} with no matched bone in actor '{}'",
                        source.name()
                    );
                }
            }
            mesh.reinit_submesh_bones();
        }

        target.materials.clone_from(&source_level.materials);
        target.morph_setup.clone_from(&source_level.morph_setup);
        if let Some(setup) = &mut target.morph_setup {
            let dropped = setup.remap_nodes(|n| source_to_target.get(n).copied().flatten());
            if dropped > 0 {
                log::warn!(
                    "copy_lod_level: dropped {dropped} morph deform datas of unmatched nodes in actor '{}'",
                    source.name()
                );
            }
        }

        self.reinitialize_lod_deformers(target_lod);
        unmatched
    }

    /// Like [`Actor::copy_lod_level`], consuming the source actor afterwards.
    pub fn take_lod_level(
        &mut self,
        source: Actor,
        copy_lod: usize,
        target_lod: usize,
        copy_skeletal_lod_flags: bool,
    ) -> Vec<usize> {
        self.copy_lod_level(&source, copy_lod, target_lod, copy_skeletal_lod_flags)
    }

    // ========================================================================
    // Meshes & Deformer Stacks
    // ========================================================================

    #[inline]
    #[must_use]
    pub fn mesh(&self, lod: usize, node: usize) -> Option<&Mesh> {
        self.lods[lod].node_infos[node].mesh.as_ref()
    }

    #[inline]
    pub fn mesh_mut(&mut self, lod: usize, node: usize) -> Option<&mut Mesh> {
        self.lods[lod].node_infos[node].mesh.as_mut()
    }

    /// Replaces the mesh of a node, returning the previous one.
    pub fn set_mesh(&mut self, lod: usize, node: usize, mesh: Option<Mesh>) -> Option<Mesh> {
        std::mem::replace(&mut self.lods[lod].node_infos[node].mesh, mesh)
    }

    #[inline]
    #[must_use]
    pub fn has_mesh(&self, lod: usize, node: usize) -> bool {
        self.lods[lod].node_infos[node].mesh.is_some()
    }

    #[inline]
    #[must_use]
    pub fn mesh_deformer_stack(&self, lod: usize, node: usize) -> Option<&MeshDeformerStack> {
        self.lods[lod].node_infos[node].stack.as_ref()
    }

    #[inline]
    pub fn mesh_deformer_stack_mut(&mut self, lod: usize, node: usize) -> Option<&mut MeshDeformerStack> {
        self.lods[lod].node_infos[node].stack.as_mut()
    }

    pub fn set_mesh_deformer_stack(
        &mut self,
        lod: usize,
        node: usize,
        stack: Option<MeshDeformerStack>,
    ) -> Option<MeshDeformerStack> {
        std::mem::replace(&mut self.lods[lod].node_infos[node].stack, stack)
    }

    /// Drops the mesh of a node, and its deformer stack when `destroy_stack` is set.
    pub fn remove_node_mesh_for_lod(&mut self, lod: usize, node: usize, destroy_stack: bool) {
        let info = &mut self.lods[lod].node_infos[node];
        info.mesh = None;
        if destroy_stack {
            info.stack = None;
        }
    }

    /// Clears every mesh and stack slot of every LOD.
    pub fn remove_all_node_meshes(&mut self) {
        for lod in &mut self.lods {
            for info in &mut lod.node_infos {
                *info = NodeLodInfo::default();
            }
        }
    }

    /// Drops every mesh whose stack has no morph deformer, together with its
    /// stack. Returns the number of meshes removed.
    pub fn remove_all_meshes_without_morphing(&mut self, lod: usize) -> usize {
        let mut removed = 0;
        for info in &mut self.lods[lod].node_infos {
            if info.mesh.is_none() {
                continue;
            }
            let morphing = info
                .stack
                .as_ref()
                .is_some_and(|s| s.has_deformer_of_type(DeformerType::Morph));
            if !morphing {
                *info = NodeLodInfo::default();
                removed += 1;
            }
        }
        removed
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Returns `true` when the node has a mesh with a non-empty deformer stack.
    #[must_use]
    pub fn has_deformable_mesh(&self, lod: usize, node: usize) -> bool {
        let info = &self.lods[lod].node_infos[node];
        info.mesh.is_some() && info.is_deformable()
    }

    #[must_use]
    pub fn has_meshes(&self, lod: usize) -> bool {
        self.lods[lod].node_infos.iter().any(|i| i.mesh.is_some())
    }

    #[must_use]
    pub fn check_if_has_morph_deformer(&self, lod: usize, node: usize) -> bool {
        self.mesh_deformer_stack(lod, node)
            .is_some_and(|s| s.has_deformer_of_type(DeformerType::Morph))
    }

    #[must_use]
    pub fn check_if_has_skinning_deformer(&self, lod: usize, node: usize) -> bool {
        self.mesh_deformer_stack(lod, node)
            .is_some_and(MeshDeformerStack::has_skinning_deformer)
    }

    fn calc_mesh_totals(&self, lod: usize, filter: MeshFilter) -> MeshTotals {
        let mut totals = MeshTotals::default();
        for info in &self.lods[lod].node_infos {
            let Some(mesh) = &info.mesh else {
                continue;
            };
            let include = match filter {
                MeshFilter::All => true,
                MeshFilter::Static => !info.is_deformable(),
                MeshFilter::Deformable => info.is_deformable(),
            };
            if include {
                totals.add(mesh);
            }
        }
        totals
    }

    /// Polygon, vertex and index totals over every mesh of a LOD.
    #[must_use]
    pub fn mesh_totals(&self, lod: usize) -> MeshTotals {
        self.calc_mesh_totals(lod, MeshFilter::All)
    }

    /// Totals over meshes without a deformer stack.
    #[must_use]
    pub fn static_mesh_totals(&self, lod: usize) -> MeshTotals {
        self.calc_mesh_totals(lod, MeshFilter::Static)
    }

    /// Totals over meshes with a non-empty deformer stack.
    #[must_use]
    pub fn deformable_mesh_totals(&self, lod: usize) -> MeshTotals {
        self.calc_mesh_totals(lod, MeshFilter::Deformable)
    }

    /// Largest number of skinning influences on any vertex of the LOD.
    #[must_use]
    pub fn calc_max_num_influences(&self, lod: usize) -> usize {
        self.lods[lod]
            .node_infos
            .iter()
            .filter_map(|i| i.mesh.as_ref())
            .map(Mesh::calc_max_num_influences)
            .max()
            .unwrap_or(0)
    }

    /// Like [`Actor::calc_max_num_influences`], also returning a histogram
    /// where `counts[n]` is the number of render vertices with `n` influences.
    pub fn calc_max_num_influences_with_counts(&self, lod: usize, counts: &mut Vec<usize>) -> usize {
        counts.clear();
        let mut max = 0;
        let mut mesh_counts = Vec::new();
        for mesh in self.lods[lod].node_infos.iter().filter_map(|i| i.mesh.as_ref()) {
            max = max.max(mesh.calc_max_num_influences_with_counts(&mut mesh_counts));
            if counts.len() < mesh_counts.len() {
                counts.resize(mesh_counts.len(), 0);
            }
            for (total, count) in counts.iter_mut().zip(&mesh_counts) {
                *total += count;
            }
        }
        max
    }

    /// Rebuilds the internal tables of every deformer in every LOD.
    pub fn reinitialize_mesh_deformers(&mut self) {
        for lod in 0..self.lods.len() {
            self.reinitialize_lod_deformers(lod);
        }
    }

    /// Rebuilds the internal tables of every deformer in one LOD.
    pub fn reinitialize_lod_deformers(&mut self, lod_level: usize) {
        let LodLevel {
            node_infos,
            morph_setup,
            ..
        } = &mut self.lods[lod_level];
        for (node_index, info) in node_infos.iter_mut().enumerate() {
            let (Some(mesh), Some(stack)) = (&info.mesh, &mut info.stack) else {
                continue;
            };
            stack.reinitialize_deformers(&DeformerContext {
                node_index,
                lod_level,
                mesh,
                morph_setup: morph_setup.as_ref(),
            });
        }
    }
}
