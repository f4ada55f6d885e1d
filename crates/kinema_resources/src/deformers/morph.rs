use std::any::Any;

use glam::Vec3;

use crate::deformer::{DeformContext, DeformerContext, DeformerType, MeshDeformer};
use crate::mesh::Mesh;
use crate::morph::VertexDelta;

#[derive(Debug, Clone)]
struct MorphEntry {
    target: usize,
    range_min: f32,
    range_max: f32,
    deltas: Vec<VertexDelta>,
}

/// Applies the morph targets of a LOD's morph setup to one mesh.
///
/// The per-node deltas are gathered at reinitialisation time. Weights come
/// from [`DeformContext::morph_weights`], indexed by morph target.
#[derive(Debug, Clone)]
pub struct MorphDeformer {
    enabled: bool,
    entries: Vec<MorphEntry>,
}

impl Default for MorphDeformer {
    fn default() -> Self {
        Self {
            enabled: true,
            entries: Vec::new(),
        }
    }
}

impl MorphDeformer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of morph targets that affect the deformed mesh.
    #[inline]
    #[must_use]
    pub fn num_active_targets(&self) -> usize {
        self.entries.len()
    }
}

impl MeshDeformer for MorphDeformer {
    fn deformer_type(&self) -> DeformerType {
        DeformerType::Morph
    }

    fn reinitialize(&mut self, ctx: &DeformerContext<'_>) {
        self.entries.clear();
        let Some(setup) = ctx.morph_setup else {
            return;
        };

        for (target_index, target) in setup.morph_targets().iter().enumerate() {
            if let Some(data) = target.deform_data_for_node(ctx.node_index) {
                self.entries.push(MorphEntry {
                    target: target_index,
                    range_min: target.range_min,
                    range_max: target.range_max,
                    deltas: data.deltas.clone(),
                });
            }
        }
    }

    fn deform(&self, mesh: &Mesh, positions: &mut [Vec3], ctx: &DeformContext<'_>) {
        for entry in &self.entries {
            let weight = ctx
                .morph_weights
                .get(entry.target)
                .map_or(0.0, |w| w.clamp(entry.range_min, entry.range_max));
            if weight.abs() < f32::EPSILON {
                continue;
            }
            for delta in &entry.deltas {
                let vertex = delta.vertex as usize;
                if vertex < positions.len() {
                    positions[vertex] += delta.position * weight;
                } else {
                    log::warn!(
                        "Morph delta for vertex {vertex} is outside a mesh of {} vertices",
                        mesh.num_vertices()
                    );
                }
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
