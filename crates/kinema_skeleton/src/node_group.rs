/// A named set of nodes that can be enabled or disabled together.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NodeGroup {
    pub name: String,
    nodes: Vec<usize>,
    /// Whether the group starts out enabled on new actor instances.
    pub enabled_on_default: bool,
}

impl NodeGroup {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            nodes: Vec::new(),
            enabled_on_default: true,
        }
    }

    #[must_use]
    pub fn with_nodes(mut self, nodes: impl IntoIterator<Item = usize>) -> Self {
        for node in nodes {
            self.add_node(node);
        }
        self
    }

    /// Adds a node unless it is already a member.
    pub fn add_node(&mut self, node: usize) {
        if !self.nodes.contains(&node) {
            self.nodes.push(node);
        }
    }

    #[inline]
    #[must_use]
    pub fn nodes(&self) -> &[usize] {
        &self.nodes
    }

    #[inline]
    #[must_use]
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, node: usize) -> bool {
        self.nodes.contains(&node)
    }

    /// Drops a removed skeleton node and shifts higher indices down.
    pub fn remove_node(&mut self, node: usize) {
        self.nodes.retain(|&n| n != node);
        for n in &mut self.nodes {
            if *n > node {
                *n -= 1;
            }
        }
    }

    pub fn remove_all_nodes(&mut self) {
        self.nodes.clear();
    }
}
