use kinema_core::{KinemaError, Result, Transform};
use rustc_hash::FxHashMap;
use uuid::Uuid;

use crate::node::Node;
use crate::pose::Pose;

/// Node hierarchy of an actor together with its bind pose.
///
/// Nodes live in a dense array and reference each other by index. A parent
/// always exists when a child is added, so every parent index is smaller than
/// the indices of its children.
#[derive(Debug, Clone, Default)]
pub struct Skeleton {
    nodes: Vec<Node>,
    root_nodes: Vec<usize>,
    bind_pose: Pose,
    /// First node with a given name.
    name_lookup: FxHashMap<String, usize>,
}

impl Skeleton {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Node Management
    // ========================================================================

    /// Appends a node and its bind pose local transform. Returns the new index.
    pub fn add_node(&mut self, name: &str, parent: Option<usize>, local: Transform) -> Result<usize> {
        if let Some(parent) = parent
            && parent >= self.nodes.len()
        {
            return Err(KinemaError::InvalidParent {
                parent,
                num_nodes: self.nodes.len(),
            });
        }

        let index = self.nodes.len();
        self.nodes.push(Node::new(name, index, parent));
        match parent {
            Some(parent) => self.nodes[parent].children.push(index),
            None => self.root_nodes.push(index),
        }
        self.name_lookup.entry(name.to_string()).or_insert(index);
        self.bind_pose.push_transform(parent, local);
        Ok(index)
    }

    /// Removes a node and returns it.
    ///
    /// Children of the removed node are re-parented to its parent (or become
    /// roots) and keep their bind pose model space transforms. Every index
    /// above `index` shifts down by one.
    ///
    /// # Panics
    /// If `index` is out of range.
    pub fn remove_node(&mut self, index: usize) -> Node {
        let removed_parent = self.nodes[index].parent;
        let removed_local = *self.bind_pose.local_space_transform(index);
        let children = std::mem::take(&mut self.nodes[index].children);

        match removed_parent {
            Some(parent) => self.nodes[parent].children.retain(|&c| c != index),
            None => self.root_nodes.retain(|&r| r != index),
        }

        for &child in &children {
            self.nodes[child].parent = removed_parent;
            let child_local = *self.bind_pose.local_space_transform(child);
            self.bind_pose
                .set_local_space_transform(child, removed_local * child_local);
            match removed_parent {
                Some(parent) => self.nodes[parent].children.push(child),
                None => self.root_nodes.push(child),
            }
        }

        let mut removed = self.nodes.remove(index);
        self.bind_pose.remove_transform(index);

        let shift = |i: usize| if i > index { i - 1 } else { i };
        for node in &mut self.nodes {
            node.index = shift(node.index);
            node.parent = node.parent.map(shift);
            for child in &mut node.children {
                *child = shift(*child);
            }
        }
        for root in &mut self.root_nodes {
            *root = shift(*root);
        }
        self.root_nodes.sort_unstable();

        self.rebuild_name_lookup();
        self.bind_pose.set_parents(self.nodes.iter().map(Node::parent));

        log::debug!(
            "Removed node '{}', re-parented {} children",
            removed.name(),
            children.len()
        );
        removed.children = children;
        removed
    }

    /// Removes every node and clears the bind pose.
    pub fn remove_all_nodes(&mut self) {
        self.nodes.clear();
        self.root_nodes.clear();
        self.name_lookup.clear();
        self.bind_pose.clear();
    }

    /// Renames a node. Its ID follows the new name.
    pub fn set_node_name(&mut self, index: usize, name: &str) {
        self.nodes[index].set_name(name);
        self.rebuild_name_lookup();
    }

    fn rebuild_name_lookup(&mut self) {
        self.name_lookup.clear();
        for node in &self.nodes {
            self.name_lookup
                .entry(node.name().to_string())
                .or_insert(node.index);
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    #[inline]
    #[must_use]
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    #[must_use]
    pub fn node(&self, index: usize) -> &Node {
        &self.nodes[index]
    }

    #[inline]
    pub fn node_mut(&mut self, index: usize) -> &mut Node {
        &mut self.nodes[index]
    }

    #[inline]
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    #[inline]
    #[must_use]
    pub fn root_nodes(&self) -> &[usize] {
        &self.root_nodes
    }

    #[inline]
    #[must_use]
    pub fn num_root_nodes(&self) -> usize {
        self.root_nodes.len()
    }

    #[inline]
    #[must_use]
    pub fn bind_pose(&self) -> &Pose {
        &self.bind_pose
    }

    #[inline]
    pub fn bind_pose_mut(&mut self) -> &mut Pose {
        &mut self.bind_pose
    }

    // ========================================================================
    // Lookups
    // ========================================================================

    #[must_use]
    pub fn find_node_by_name(&self, name: &str) -> Option<usize> {
        self.name_lookup.get(name).copied()
    }

    #[must_use]
    pub fn find_node_by_name_no_case(&self, name: &str) -> Option<usize> {
        self.nodes
            .iter()
            .position(|n| n.name().eq_ignore_ascii_case(name))
    }

    #[must_use]
    pub fn find_node_by_id(&self, id: Uuid) -> Option<usize> {
        self.nodes.iter().position(|n| n.id() == id)
    }

    // ========================================================================
    // Hierarchy Queries
    // ========================================================================

    /// Number of ancestors of a node. Roots have depth 0.
    #[must_use]
    pub fn calc_hierarchy_depth(&self, index: usize) -> usize {
        let mut depth = 0;
        let mut current = self.nodes[index].parent;
        while let Some(parent) = current {
            depth += 1;
            current = self.nodes[parent].parent;
        }
        depth
    }

    /// Number of descendants of a node, at any depth.
    #[must_use]
    pub fn num_child_nodes_recursive(&self, index: usize) -> usize {
        let mut count = 0;
        let mut stack: Vec<usize> = self.nodes[index].children.clone();
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend_from_slice(&self.nodes[node].children);
        }
        count
    }

    /// The node itself followed by its ancestors up to the root.
    #[must_use]
    pub fn path_to_root(&self, index: usize) -> Vec<usize> {
        let mut path = vec![index];
        let mut current = self.nodes[index].parent;
        while let Some(parent) = current {
            path.push(parent);
            current = self.nodes[parent].parent;
        }
        path
    }

    /// Returns `true` if `ancestor` lies on the path from `node` to its root.
    #[must_use]
    pub fn is_ancestor_of(&self, ancestor: usize, node: usize) -> bool {
        let mut current = self.nodes[node].parent;
        while let Some(parent) = current {
            if parent == ancestor {
                return true;
            }
            current = self.nodes[parent].parent;
        }
        false
    }

    /// Nearest strict ancestor of `start` that is enabled in `skeletal_lod`.
    #[must_use]
    pub fn find_first_active_parent(&self, skeletal_lod: usize, start: usize) -> Option<usize> {
        let mut current = self.nodes[start].parent;
        while let Some(parent) = current {
            if self.nodes[parent].skeletal_lod_status(skeletal_lod) {
                return Some(parent);
            }
            current = self.nodes[parent].parent;
        }
        None
    }

    /// Checks index, parent/child and root list consistency.
    pub fn validate(&self) -> Result<()> {
        if self.bind_pose.num_transforms() != self.nodes.len() {
            return Err(KinemaError::NodeCountMismatch {
                context: "bind pose".to_string(),
                expected: self.nodes.len(),
                found: self.bind_pose.num_transforms(),
            });
        }

        for (i, node) in self.nodes.iter().enumerate() {
            if node.index != i {
                return Err(KinemaError::BrokenHierarchy(format!(
                    "node '{}' stores index {} but lives at {i}",
                    node.name(),
                    node.index
                )));
            }
            match node.parent {
                Some(parent) => {
                    if parent >= i || !self.nodes[parent].children.contains(&i) {
                        return Err(KinemaError::BrokenHierarchy(format!(
                            "node '{}' is not a child of its parent {parent}",
                            node.name()
                        )));
                    }
                }
                None => {
                    if !self.root_nodes.contains(&i) {
                        return Err(KinemaError::BrokenHierarchy(format!(
                            "root node '{}' missing from the root list",
                            node.name()
                        )));
                    }
                }
            }
            for &child in &node.children {
                if self.nodes.get(child).and_then(Node::parent) != Some(i) {
                    return Err(KinemaError::BrokenHierarchy(format!(
                        "child {child} of '{}' does not point back",
                        node.name()
                    )));
                }
            }
        }

        let num_roots = self.nodes.iter().filter(|n| n.is_root()).count();
        if num_roots != self.root_nodes.len() {
            return Err(KinemaError::BrokenHierarchy(format!(
                "root list has {} entries, {num_roots} roots exist",
                self.root_nodes.len()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn arm() -> Skeleton {
        let mut skeleton = Skeleton::new();
        let root = skeleton.add_node("Root", None, Transform::IDENTITY).unwrap();
        let upper = skeleton
            .add_node("UpperArm", Some(root), Transform::from_translation(Vec3::X))
            .unwrap();
        let lower = skeleton
            .add_node("LowerArm", Some(upper), Transform::from_translation(Vec3::X))
            .unwrap();
        skeleton
            .add_node("Hand", Some(lower), Transform::from_translation(Vec3::X))
            .unwrap();
        skeleton
    }

    #[test]
    fn add_node_rejects_missing_parent() {
        let mut skeleton = Skeleton::new();
        let err = skeleton.add_node("A", Some(0), Transform::IDENTITY);
        assert!(matches!(err, Err(KinemaError::InvalidParent { parent: 0, num_nodes: 0 })));
    }

    #[test]
    fn depth_and_descendants() {
        let skeleton = arm();
        assert_eq!(skeleton.calc_hierarchy_depth(0), 0);
        assert_eq!(skeleton.calc_hierarchy_depth(3), 3);
        assert_eq!(skeleton.num_child_nodes_recursive(0), 3);
        assert_eq!(skeleton.num_child_nodes_recursive(3), 0);
        assert_eq!(skeleton.path_to_root(2), vec![2, 1, 0]);
    }

    #[test]
    fn remove_middle_node_reattaches_children() {
        let mut skeleton = arm();
        let removed = skeleton.remove_node(1);
        assert_eq!(removed.name(), "UpperArm");

        assert_eq!(skeleton.num_nodes(), 3);
        assert_eq!(skeleton.find_node_by_name("LowerArm"), Some(1));
        assert_eq!(skeleton.node(1).parent(), Some(0));
        assert_eq!(skeleton.node(0).children(), &[1]);
        assert_eq!(skeleton.node(2).parent(), Some(1));
        skeleton.validate().unwrap();

        // The hand keeps its model space bind position.
        let hand = skeleton.bind_pose().calc_model_space_transform(2);
        assert!((hand.position - Vec3::new(3.0, 0.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn remove_root_promotes_children() {
        let mut skeleton = arm();
        skeleton.remove_node(0);
        assert_eq!(skeleton.root_nodes(), &[0]);
        assert!(skeleton.node(0).is_root());
        skeleton.validate().unwrap();
    }

    #[test]
    fn lookups() {
        let skeleton = arm();
        assert_eq!(skeleton.find_node_by_name("hand"), None);
        assert_eq!(skeleton.find_node_by_name_no_case("hand"), Some(3));
        assert_eq!(skeleton.find_node_by_id(Node::id_from_name("Hand")), Some(3));
    }

    #[test]
    fn first_active_parent_skips_disabled_nodes() {
        let mut skeleton = arm();
        skeleton.node_mut(2).set_skeletal_lod_status(1, false);
        skeleton.node_mut(1).set_skeletal_lod_status(1, false);
        assert_eq!(skeleton.find_first_active_parent(1, 3), Some(0));
        assert_eq!(skeleton.find_first_active_parent(0, 3), Some(2));
        assert_eq!(skeleton.find_first_active_parent(1, 0), None);
    }
}
