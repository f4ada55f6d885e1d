use std::any::Any;
use std::fmt;

use glam::{Affine3A, Vec3};

use crate::mesh::Mesh;
use crate::morph::MorphSetup;

/// Kind of a mesh deformer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeformerType {
    /// Linear blend skinning.
    SoftSkin,
    /// Dual quaternion skinning.
    DualQuatSkin,
    /// Morph target blending.
    Morph,
}

impl DeformerType {
    #[inline]
    #[must_use]
    pub fn is_skinning(self) -> bool {
        matches!(self, DeformerType::SoftSkin | DeformerType::DualQuatSkin)
    }
}

/// What a deformer sees when it is (re)initialised.
#[derive(Debug, Clone, Copy)]
pub struct DeformerContext<'a> {
    /// Node that owns the deformed mesh.
    pub node_index: usize,
    pub lod_level: usize,
    pub mesh: &'a Mesh,
    pub morph_setup: Option<&'a MorphSetup>,
}

/// Per-evaluation inputs.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeformContext<'a> {
    /// One matrix per skeleton node: `model_space(node) * inverse_bind(node)`.
    pub skinning_matrices: &'a [Affine3A],
    /// One weight per morph target of the LOD's morph setup.
    pub morph_weights: &'a [f32],
}

// ============================================================================
// MeshDeformer
// ============================================================================

/// A deformation step applied to the positions of one mesh.
pub trait MeshDeformer: Any + Send + Sync + fmt::Debug {
    fn deformer_type(&self) -> DeformerType;

    /// Rebuilds cached data after the mesh or skeleton changed.
    fn reinitialize(&mut self, ctx: &DeformerContext<'_>);

    /// Deforms `positions` in place. `positions` has one entry per render vertex of `mesh`.
    fn deform(&self, mesh: &Mesh, positions: &mut [Vec3], ctx: &DeformContext<'_>);

    fn clone_boxed(&self) -> Box<dyn MeshDeformer>;

    fn is_enabled(&self) -> bool;

    fn set_enabled(&mut self, enabled: bool);

    fn as_any(&self) -> &dyn Any;
}

// ============================================================================
// MeshDeformerStack
// ============================================================================

/// Ordered list of deformers owned by one (LOD, node) slot.
///
/// Deformers run in list order, each one reading the output of the previous.
#[derive(Debug, Default)]
pub struct MeshDeformerStack {
    deformers: Vec<Box<dyn MeshDeformer>>,
}

impl Clone for MeshDeformerStack {
    fn clone(&self) -> Self {
        Self {
            deformers: self.deformers.iter().map(|d| d.clone_boxed()).collect(),
        }
    }
}

impl MeshDeformerStack {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_deformer(mut self, deformer: impl MeshDeformer) -> Self {
        self.add_deformer(Box::new(deformer));
        self
    }

    pub fn add_deformer(&mut self, deformer: Box<dyn MeshDeformer>) {
        self.deformers.push(deformer);
    }

    pub fn insert_deformer(&mut self, position: usize, deformer: Box<dyn MeshDeformer>) {
        self.deformers.insert(position, deformer);
    }

    pub fn remove_deformer(&mut self, index: usize) -> Box<dyn MeshDeformer> {
        self.deformers.remove(index)
    }

    /// Removes every deformer of the given type and returns how many were removed.
    pub fn remove_all_deformers_by_type(&mut self, deformer_type: DeformerType) -> usize {
        let before = self.deformers.len();
        self.deformers.retain(|d| d.deformer_type() != deformer_type);
        before - self.deformers.len()
    }

    pub fn remove_all_deformers(&mut self) {
        self.deformers.clear();
    }

    #[must_use]
    pub fn has_deformer_of_type(&self, deformer_type: DeformerType) -> bool {
        self.deformers.iter().any(|d| d.deformer_type() == deformer_type)
    }

    /// `true` when the stack contains a linear or dual quaternion skinning deformer.
    #[must_use]
    pub fn has_skinning_deformer(&self) -> bool {
        self.deformers.iter().any(|d| d.deformer_type().is_skinning())
    }

    #[inline]
    #[must_use]
    pub fn num_deformers(&self) -> usize {
        self.deformers.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.deformers.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn deformer(&self, index: usize) -> &dyn MeshDeformer {
        self.deformers[index].as_ref()
    }

    #[inline]
    pub fn deformer_mut(&mut self, index: usize) -> &mut dyn MeshDeformer {
        self.deformers[index].as_mut()
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn MeshDeformer> {
        self.deformers.iter().map(|d| &**d)
    }

    pub fn reinitialize_deformers(&mut self, ctx: &DeformerContext<'_>) {
        for deformer in &mut self.deformers {
            deformer.reinitialize(ctx);
        }
    }

    /// Runs every enabled deformer over a copy of the mesh positions.
    #[must_use]
    pub fn update(&self, mesh: &Mesh, ctx: &DeformContext<'_>) -> Vec<Vec3> {
        let mut positions = mesh.positions().to_vec();
        for deformer in self.deformers.iter().filter(|d| d.is_enabled()) {
            deformer.deform(mesh, &mut positions, ctx);
        }
        positions
    }
}
