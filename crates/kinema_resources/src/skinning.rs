use smallvec::SmallVec;

/// One bone influence on a vertex.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkinInfluence {
    /// Skeleton node index of the influencing bone.
    pub node_index: usize,
    pub weight: f32,
}

impl SkinInfluence {
    #[inline]
    #[must_use]
    pub fn new(node_index: usize, weight: f32) -> Self {
        Self { node_index, weight }
    }
}

/// Influences of a single original vertex. Most vertices carry four or fewer.
pub type InfluenceList = SmallVec<[SkinInfluence; 4]>;

/// Skinning influences, stored per *original* vertex.
///
/// Render vertices map to original vertices through the mesh's original vertex
/// number layer, so vertices split for UV or normal seams share one entry.
/// Weights are stored as authored; deformers normalise them when blending.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SkinningLayer {
    influences: Vec<InfluenceList>,
}

impl SkinningLayer {
    /// Creates a layer with `num_org_vertices` empty influence lists.
    #[must_use]
    pub fn new(num_org_vertices: usize) -> Self {
        Self {
            influences: vec![InfluenceList::new(); num_org_vertices],
        }
    }

    #[inline]
    #[must_use]
    pub fn num_org_vertices(&self) -> usize {
        self.influences.len()
    }

    #[inline]
    #[must_use]
    pub fn num_influences(&self, org_vertex: usize) -> usize {
        self.influences[org_vertex].len()
    }

    #[inline]
    #[must_use]
    pub fn influences(&self, org_vertex: usize) -> &[SkinInfluence] {
        &self.influences[org_vertex]
    }

    #[inline]
    pub fn influences_mut(&mut self, org_vertex: usize) -> &mut InfluenceList {
        &mut self.influences[org_vertex]
    }

    pub fn add_influence(&mut self, org_vertex: usize, node_index: usize, weight: f32) {
        self.influences[org_vertex].push(SkinInfluence::new(node_index, weight));
    }

    pub fn remove_influence(&mut self, org_vertex: usize, influence: usize) -> SkinInfluence {
        self.influences[org_vertex].remove(influence)
    }

    /// Iterates over `(org_vertex, influences)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &[SkinInfluence])> {
        self.influences.iter().enumerate().map(|(v, list)| (v, list.as_slice()))
    }

    /// Merges influences of the same bone on one vertex.
    ///
    /// Weights of duplicate bones are summed. When a single bone remains it
    /// receives the full weight of 1.0.
    pub fn collapse_influences(&mut self, org_vertex: usize) {
        let list = &mut self.influences[org_vertex];
        if list.len() < 2 {
            if let Some(only) = list.first_mut() {
                only.weight = 1.0;
            }
            return;
        }

        let mut merged = InfluenceList::new();
        for influence in list.iter() {
            match merged.iter_mut().find(|m| m.node_index == influence.node_index) {
                Some(existing) => existing.weight += influence.weight,
                None => merged.push(*influence),
            }
        }

        if merged.len() == 1 {
            merged[0].weight = 1.0;
        }
        *list = merged;
    }

    /// Largest number of influences on any vertex.
    #[must_use]
    pub fn max_num_influences(&self) -> usize {
        self.influences.iter().map(SmallVec::len).max().unwrap_or(0)
    }

    /// Sorted list of every node index referenced by the layer.
    #[must_use]
    pub fn referenced_nodes(&self) -> Vec<usize> {
        let mut nodes: Vec<usize> = self
            .influences
            .iter()
            .flat_map(|list| list.iter().map(|i| i.node_index))
            .collect();
        nodes.sort_unstable();
        nodes.dedup();
        nodes
    }

    /// Rewrites every influence through `remap`.
    ///
    /// `remap` returns the new node index, or `None` to drop the influence.
    /// Touched vertices are collapsed afterwards. Returns the number of
    /// influences that were changed or dropped.
    pub fn remap_nodes(&mut self, mut remap: impl FnMut(usize) -> Option<usize>) -> usize {
        let mut changed = 0;
        for v in 0..self.influences.len() {
            let list = &mut self.influences[v];
            let before = list.len();
            let mut touched = false;
            list.retain(|influence| match remap(influence.node_index) {
                Some(new_index) => {
                    if new_index != influence.node_index {
                        influence.node_index = new_index;
                        changed += 1;
                        touched = true;
                    }
                    true
                }
                None => false,
            });
            if list.len() != before {
                changed += before - list.len();
                touched = true;
            }
            if touched {
                self.collapse_influences(v);
            }
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapse_merges_same_bone() {
        let mut layer = SkinningLayer::new(1);
        layer.add_influence(0, 2, 0.25);
        layer.add_influence(0, 2, 0.75);
        layer.collapse_influences(0);
        assert_eq!(layer.influences(0), &[SkinInfluence::new(2, 1.0)]);
    }

    #[test]
    fn collapse_keeps_distinct_bones() {
        let mut layer = SkinningLayer::new(1);
        layer.add_influence(0, 1, 0.5);
        layer.add_influence(0, 3, 0.25);
        layer.add_influence(0, 1, 0.25);
        layer.collapse_influences(0);
        assert_eq!(layer.num_influences(0), 2);
        assert!((layer.influences(0)[0].weight - 0.75).abs() < 1e-6);
    }

    #[test]
    fn remap_drops_and_renumbers() {
        let mut layer = SkinningLayer::new(2);
        layer.add_influence(0, 0, 1.0);
        layer.add_influence(1, 1, 0.5);
        layer.add_influence(1, 2, 0.5);

        let changed = layer.remap_nodes(|n| match n {
            1 => None,
            2 => Some(1),
            other => Some(other),
        });

        assert_eq!(changed, 2);
        assert_eq!(layer.influences(0), &[SkinInfluence::new(0, 1.0)]);
        assert_eq!(layer.influences(1), &[SkinInfluence::new(1, 1.0)]);
    }
}
