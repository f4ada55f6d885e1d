use glam::{Affine3A, Vec3};
use kinema_core::BoundingBox;

use crate::skinning::SkinningLayer;

/// A contiguous vertex/index range of a mesh drawn with one material.
#[derive(Debug, Clone, PartialEq)]
pub struct SubMesh {
    pub start_vertex: u32,
    pub num_vertices: u32,
    pub start_index: u32,
    pub num_indices: u32,
    /// Index into the actor's material list for the mesh's LOD.
    pub material: usize,
    /// Compact table of node indices used by skinning influences in this range.
    bones: Vec<usize>,
}

impl SubMesh {
    #[must_use]
    pub fn new(start_vertex: u32, num_vertices: u32, start_index: u32, num_indices: u32, material: usize) -> Self {
        Self {
            start_vertex,
            num_vertices,
            start_index,
            num_indices,
            material,
            bones: Vec::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn bones(&self) -> &[usize] {
        &self.bones
    }

    #[inline]
    #[must_use]
    pub fn num_bones(&self) -> usize {
        self.bones.len()
    }

    /// Position of `node_index` in the bone table, if present.
    #[must_use]
    pub fn find_bone_index(&self, node_index: usize) -> Option<usize> {
        self.bones.iter().position(|&b| b == node_index)
    }

    /// Rebuilds the bone table from the skinning influences of this range.
    pub fn reinit_bones(&mut self, layer: &SkinningLayer, org_vertex_numbers: &[u32]) {
        self.bones.clear();
        let start = self.start_vertex as usize;
        let end = start + self.num_vertices as usize;
        for &org in &org_vertex_numbers[start..end] {
            for influence in layer.influences(org as usize) {
                if !self.bones.contains(&influence.node_index) {
                    self.bones.push(influence.node_index);
                }
            }
        }
    }

    #[inline]
    #[must_use]
    pub fn num_polygons(&self) -> u32 {
        self.num_indices / 3
    }
}

/// Triangle mesh owned by one node at one geometry LOD.
///
/// Positions of skinned meshes are stored in model space (bind pose);
/// positions of static meshes are local to the owning node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    positions: Vec<Vec3>,
    normals: Vec<Vec3>,
    /// For every render vertex, the original (pre-split) vertex it came from.
    org_vertex_numbers: Vec<u32>,
    indices: Vec<u32>,
    submeshes: Vec<SubMesh>,
    num_org_vertices: u32,
    skinning: Option<SkinningLayer>,
}

impl Mesh {
    /// Creates a mesh where every render vertex is its own original vertex.
    #[must_use]
    pub fn new(positions: Vec<Vec3>, indices: Vec<u32>) -> Self {
        let count = positions.len() as u32;
        Self {
            positions,
            normals: Vec::new(),
            org_vertex_numbers: (0..count).collect(),
            indices,
            submeshes: Vec::new(),
            num_org_vertices: count,
            skinning: None,
        }
    }

    /// Replaces the original vertex number layer.
    ///
    /// # Panics
    /// If the layer length differs from the vertex count.
    #[must_use]
    pub fn with_original_vertex_numbers(mut self, org_vertex_numbers: Vec<u32>) -> Self {
        assert_eq!(
            org_vertex_numbers.len(),
            self.positions.len(),
            "original vertex numbers must cover every vertex"
        );
        self.num_org_vertices = org_vertex_numbers.iter().max().map_or(0, |m| m + 1);
        self.org_vertex_numbers = org_vertex_numbers;
        self
    }

    #[must_use]
    pub fn with_normals(mut self, normals: Vec<Vec3>) -> Self {
        self.normals = normals;
        self
    }

    #[must_use]
    pub fn with_skinning(mut self, layer: SkinningLayer) -> Self {
        self.set_skinning(Some(layer));
        self
    }

    #[must_use]
    pub fn with_submesh(mut self, submesh: SubMesh) -> Self {
        self.add_submesh(submesh);
        self
    }

    pub fn add_submesh(&mut self, mut submesh: SubMesh) {
        if let Some(layer) = &self.skinning {
            submesh.reinit_bones(layer, &self.org_vertex_numbers);
        }
        self.submeshes.push(submesh);
    }

    /// Attaches or removes the skinning layer and refreshes submesh bone tables.
    pub fn set_skinning(&mut self, layer: Option<SkinningLayer>) {
        if let Some(layer) = &layer {
            debug_assert!(
                layer.num_org_vertices() >= self.num_org_vertices as usize,
                "skinning layer must cover every original vertex"
            );
        }
        self.skinning = layer;
        self.reinit_submesh_bones();
    }

    #[inline]
    #[must_use]
    pub fn skinning(&self) -> Option<&SkinningLayer> {
        self.skinning.as_ref()
    }

    #[inline]
    pub fn skinning_mut(&mut self) -> Option<&mut SkinningLayer> {
        self.skinning.as_mut()
    }

    #[inline]
    #[must_use]
    pub fn is_skinned(&self) -> bool {
        self.skinning.is_some()
    }

    /// Rebuilds the bone table of every submesh from the skinning layer.
    pub fn reinit_submesh_bones(&mut self) {
        let Some(layer) = &self.skinning else {
            for submesh in &mut self.submeshes {
                submesh.bones.clear();
            }
            return;
        };
        for submesh in &mut self.submeshes {
            submesh.reinit_bones(layer, &self.org_vertex_numbers);
        }
    }

    #[inline]
    #[must_use]
    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    #[inline]
    pub fn positions_mut(&mut self) -> &mut [Vec3] {
        &mut self.positions
    }

    #[inline]
    #[must_use]
    pub fn normals(&self) -> &[Vec3] {
        &self.normals
    }

    #[inline]
    #[must_use]
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    #[inline]
    #[must_use]
    pub fn org_vertex_numbers(&self) -> &[u32] {
        &self.org_vertex_numbers
    }

    /// Original vertex of render vertex `vertex`.
    #[inline]
    #[must_use]
    pub fn org_vertex(&self, vertex: usize) -> usize {
        self.org_vertex_numbers[vertex] as usize
    }

    #[inline]
    #[must_use]
    pub fn submeshes(&self) -> &[SubMesh] {
        &self.submeshes
    }

    #[inline]
    #[must_use]
    pub fn submesh(&self, index: usize) -> &SubMesh {
        &self.submeshes[index]
    }

    #[inline]
    pub fn submesh_mut(&mut self, index: usize) -> &mut SubMesh {
        &mut self.submeshes[index]
    }

    #[inline]
    #[must_use]
    pub fn num_vertices(&self) -> u32 {
        self.positions.len() as u32
    }

    #[inline]
    #[must_use]
    pub fn num_org_vertices(&self) -> u32 {
        self.num_org_vertices
    }

    #[inline]
    #[must_use]
    pub fn num_indices(&self) -> u32 {
        self.indices.len() as u32
    }

    #[inline]
    #[must_use]
    pub fn num_polygons(&self) -> u32 {
        self.num_indices() / 3
    }

    /// One position per original vertex (the first render vertex that maps to it).
    #[must_use]
    pub fn extract_original_vertex_positions(&self) -> Vec<Vec3> {
        let mut result = vec![None; self.num_org_vertices as usize];
        for (vertex, &org) in self.org_vertex_numbers.iter().enumerate() {
            let slot = &mut result[org as usize];
            if slot.is_none() {
                *slot = Some(self.positions[vertex]);
            }
        }
        result.into_iter().flatten().collect()
    }

    /// Largest number of influences on any vertex, 0 for unskinned meshes.
    #[must_use]
    pub fn calc_max_num_influences(&self) -> usize {
        self.skinning.as_ref().map_or(0, SkinningLayer::max_num_influences)
    }

    /// Like [`Mesh::calc_max_num_influences`], also filling a histogram where
    /// `counts[n]` is the number of render vertices with `n` influences.
    pub fn calc_max_num_influences_with_counts(&self, counts: &mut Vec<usize>) -> usize {
        let max = self.calc_max_num_influences();
        counts.clear();
        counts.resize(max + 1, 0);

        match &self.skinning {
            Some(layer) => {
                for &org in &self.org_vertex_numbers {
                    counts[layer.num_influences(org as usize)] += 1;
                }
            }
            None => counts[0] = self.positions.len(),
        }
        max
    }

    /// Axis-aligned bounds of the positions, optionally transformed first.
    #[must_use]
    pub fn calc_aabb(&self, transform: Option<&Affine3A>) -> BoundingBox {
        let mut bb = BoundingBox::RESET;
        for &p in &self.positions {
            bb.add_point(transform.map_or(p, |m| m.transform_point3(p)));
        }
        bb
    }

    /// Scales all positions around the mesh origin.
    pub fn scale(&mut self, factor: f32) {
        for p in &mut self.positions {
            *p *= factor;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split_quad() -> Mesh {
        // Four render vertices, three original vertices (vertex 3 duplicates 0).
        Mesh::new(
            vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(1.0, 1.0, 0.0),
                Vec3::new(0.0, 0.0, 0.0),
            ],
            vec![0, 1, 2, 2, 3, 0],
        )
        .with_original_vertex_numbers(vec![0, 1, 2, 0])
    }

    #[test]
    fn original_positions_deduplicate_split_vertices() {
        let mesh = split_quad();
        assert_eq!(mesh.num_org_vertices(), 3);
        assert_eq!(mesh.extract_original_vertex_positions().len(), 3);
        assert_eq!(mesh.num_polygons(), 2);
    }

    #[test]
    fn submesh_bones_follow_skinning() {
        let mut layer = SkinningLayer::new(3);
        layer.add_influence(0, 4, 1.0);
        layer.add_influence(1, 5, 1.0);
        layer.add_influence(2, 4, 1.0);

        let mesh = split_quad()
            .with_skinning(layer)
            .with_submesh(SubMesh::new(0, 4, 0, 6, 0));
        assert_eq!(mesh.submesh(0).bones(), &[4, 5]);

        let mut counts = Vec::new();
        assert_eq!(mesh.calc_max_num_influences_with_counts(&mut counts), 1);
        assert_eq!(counts, vec![0, 4]);
    }
}
