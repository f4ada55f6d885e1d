use glam::Vec3;

/// Position offset applied to one render vertex by a morph target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VertexDelta {
    pub vertex: u32,
    pub position: Vec3,
}

/// The deltas a morph target applies to the mesh of one node.
#[derive(Debug, Clone, PartialEq)]
pub struct MorphDeformData {
    pub node_index: usize,
    pub deltas: Vec<VertexDelta>,
}

impl MorphDeformData {
    #[must_use]
    pub fn new(node_index: usize, deltas: Vec<VertexDelta>) -> Self {
        Self { node_index, deltas }
    }
}

/// A named blend shape.
#[derive(Debug, Clone, PartialEq)]
pub struct MorphTarget {
    pub name: String,
    pub range_min: f32,
    pub range_max: f32,
    deform_datas: Vec<MorphDeformData>,
}

impl MorphTarget {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            range_min: 0.0,
            range_max: 1.0,
            deform_datas: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_deform_data(mut self, data: MorphDeformData) -> Self {
        self.deform_datas.push(data);
        self
    }

    pub fn add_deform_data(&mut self, data: MorphDeformData) {
        self.deform_datas.push(data);
    }

    #[inline]
    #[must_use]
    pub fn deform_datas(&self) -> &[MorphDeformData] {
        &self.deform_datas
    }

    /// Deform data for the mesh of `node_index`, if this target touches it.
    #[must_use]
    pub fn deform_data_for_node(&self, node_index: usize) -> Option<&MorphDeformData> {
        self.deform_datas.iter().find(|d| d.node_index == node_index)
    }

    /// Clamps a weight into the target's range.
    #[inline]
    #[must_use]
    pub fn clamp_weight(&self, weight: f32) -> f32 {
        weight.clamp(self.range_min, self.range_max)
    }

    pub fn scale(&mut self, factor: f32) {
        for data in &mut self.deform_datas {
            for delta in &mut data.deltas {
                delta.position *= factor;
            }
        }
    }
}

/// All morph targets of one LOD level.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MorphSetup {
    targets: Vec<MorphTarget>,
}

impl MorphSetup {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_morph_target(&mut self, target: MorphTarget) -> usize {
        self.targets.push(target);
        self.targets.len() - 1
    }

    #[inline]
    #[must_use]
    pub fn num_morph_targets(&self) -> usize {
        self.targets.len()
    }

    #[inline]
    #[must_use]
    pub fn morph_target(&self, index: usize) -> &MorphTarget {
        &self.targets[index]
    }

    #[inline]
    #[must_use]
    pub fn morph_targets(&self) -> &[MorphTarget] {
        &self.targets
    }

    #[must_use]
    pub fn find_morph_target_by_name(&self, name: &str) -> Option<usize> {
        self.targets.iter().position(|t| t.name == name)
    }

    /// `true` when any target carries deltas for the mesh of `node_index`.
    #[must_use]
    pub fn affects_node(&self, node_index: usize) -> bool {
        self.targets
            .iter()
            .any(|t| t.deform_data_for_node(node_index).is_some())
    }

    pub fn scale(&mut self, factor: f32) {
        for target in &mut self.targets {
            target.scale(factor);
        }
    }

    /// Drops the deltas of a removed node and shifts higher node indices down.
    pub fn remove_node(&mut self, node_index: usize) {
        self.remap_nodes(|n| match n.cmp(&node_index) {
            std::cmp::Ordering::Less => Some(n),
            std::cmp::Ordering::Equal => None,
            std::cmp::Ordering::Greater => Some(n - 1),
        });
    }

    /// Rewrites the node index of every deform data through `remap`.
    ///
    /// Deform data whose node maps to `None` is dropped. Returns the number of
    /// deform datas dropped.
    pub fn remap_nodes(&mut self, mut remap: impl FnMut(usize) -> Option<usize>) -> usize {
        let mut dropped = 0;
        for target in &mut self.targets {
            target.deform_datas.retain_mut(|data| match remap(data.node_index) {
                Some(new_index) => {
                    data.node_index = new_index;
                    true
                }
                None => {
                    dropped += 1;
                    false
                }
            });
        }
        dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remove_node_renumbers_deform_data() {
        let mut setup = MorphSetup::new();
        setup.add_morph_target(
            MorphTarget::new("Smile")
                .with_deform_data(MorphDeformData::new(1, vec![]))
                .with_deform_data(MorphDeformData::new(3, vec![])),
        );

        setup.remove_node(1);
        let target = setup.morph_target(0);
        assert_eq!(target.deform_datas().len(), 1);
        assert_eq!(target.deform_datas()[0].node_index, 2);
        assert!(setup.affects_node(2));
        assert!(!setup.affects_node(1));
    }
}
