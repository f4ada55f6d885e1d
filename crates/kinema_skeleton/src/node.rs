use uuid::Uuid;

/// Number of skeletal LOD levels a node can be enabled or disabled for.
pub const MAX_SKELETAL_LODS: usize = 32;

/// Namespace for node IDs. IDs are derived from node names so the same name
/// always yields the same ID, across actors and across runs.
const NODE_ID_NAMESPACE: Uuid = Uuid::from_u128(0x6b69_6e65_6d61_4e6f_6465_4964_0000_0001);

/// A joint in a [`Skeleton`](crate::Skeleton).
///
/// # Hierarchy
///
/// - `parent`: index of the parent node (`None` for roots)
/// - `children`: ordered child indices
///
/// Indices are dense positions in the skeleton's node array and are kept up
/// to date by the skeleton when nodes are removed.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    name: String,
    id: Uuid,

    // === Hierarchy ===
    pub(crate) index: usize,
    pub(crate) parent: Option<usize>,
    pub(crate) children: Vec<usize>,

    // === Flags ===
    /// Bit `n` set means the node is enabled in skeletal LOD `n`.
    skeletal_lods: u32,
    /// Whether the node contributes to bounding volume calculations.
    pub include_in_bounds: bool,
}

impl Node {
    #[must_use]
    pub(crate) fn new(name: &str, index: usize, parent: Option<usize>) -> Self {
        Self {
            name: name.to_string(),
            id: Self::id_from_name(name),
            index,
            parent,
            children: Vec::new(),
            skeletal_lods: u32::MAX,
            include_in_bounds: true,
        }
    }

    /// The ID every node named `name` receives.
    #[must_use]
    pub fn id_from_name(name: &str) -> Uuid {
        Uuid::new_v5(&NODE_ID_NAMESPACE, name.as_bytes())
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
        self.id = Self::id_from_name(name);
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    #[inline]
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<usize> {
        self.parent
    }

    #[inline]
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    #[inline]
    #[must_use]
    pub fn children(&self) -> &[usize] {
        &self.children
    }

    #[inline]
    #[must_use]
    pub fn num_children(&self) -> usize {
        self.children.len()
    }

    #[inline]
    #[must_use]
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Returns whether the node is enabled in skeletal LOD `lod`.
    ///
    /// # Panics
    /// If `lod >= MAX_SKELETAL_LODS`.
    #[inline]
    #[must_use]
    pub fn skeletal_lod_status(&self, lod: usize) -> bool {
        assert!(lod < MAX_SKELETAL_LODS, "skeletal LOD {lod} out of range");
        self.skeletal_lods & (1 << lod) != 0
    }

    pub fn set_skeletal_lod_status(&mut self, lod: usize, enabled: bool) {
        assert!(lod < MAX_SKELETAL_LODS, "skeletal LOD {lod} out of range");
        if enabled {
            self.skeletal_lods |= 1 << lod;
        } else {
            self.skeletal_lods &= !(1 << lod);
        }
    }

    /// Raw enable mask, one bit per skeletal LOD.
    #[inline]
    #[must_use]
    pub fn skeletal_lods(&self) -> u32 {
        self.skeletal_lods
    }

    #[inline]
    pub fn set_skeletal_lods(&mut self, mask: u32) {
        self.skeletal_lods = mask;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_is_derived_from_name() {
        let a = Node::new("Spine", 0, None);
        let b = Node::new("Spine", 7, Some(2));
        assert_eq!(a.id(), b.id());
        assert_ne!(a.id(), Node::id_from_name("spine"));
    }

    #[test]
    fn skeletal_lods_default_to_enabled() {
        let mut node = Node::new("Hand", 0, None);
        assert!((0..MAX_SKELETAL_LODS).all(|lod| node.skeletal_lod_status(lod)));

        node.set_skeletal_lod_status(3, false);
        assert!(!node.skeletal_lod_status(3));
        assert!(node.skeletal_lod_status(2));
        assert_eq!(node.skeletal_lods(), !(1 << 3));
    }
}
