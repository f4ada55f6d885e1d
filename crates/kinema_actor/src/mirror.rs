//! Left/right node pairing and mirror axis detection.
//!
//! Mirroring an animation plays each node's motion on its *source* node,
//! reflected over the model space YZ plane. [`NodeMirrorInfo`] stores the
//! source node of every node and the local axis and flags that reproduce the
//! reflection in the node's own frame.

use glam::Vec3;
use kinema_core::{Axis, KinemaError, MirrorFlags, Result, Transform};
use kinema_skeleton::Pose;

use crate::actor::Actor;

/// Model space mirror plane normal.
const MIRROR_PLANE_NORMAL: Vec3 = Vec3::X;

/// Mirror configuration of one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeMirrorInfo {
    /// Node whose motion this node plays when mirrored. A node mapped to
    /// itself mirrors its own motion.
    pub source_node: usize,
    /// Local mirror axis, `None` until detected.
    pub axis: Option<Axis>,
    pub flags: MirrorFlags,
}

impl NodeMirrorInfo {
    #[must_use]
    pub fn new(node: usize) -> Self {
        Self {
            source_node: node,
            axis: None,
            flags: MirrorFlags::empty(),
        }
    }
}

/// A node for which no axis reproduced the mirrored motion within tolerance.
///
/// The closest combination was stored anyway.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MirrorFallback {
    pub node: usize,
    pub axis: Axis,
    pub flags: MirrorFlags,
    /// Model space distance left by the chosen combination.
    pub residual: f32,
}

/// Fixed local perturbation used to probe mirror axes.
fn probe_delta() -> Transform {
    Transform::from_euler_translation(0.1, 0.2, 0.3, Vec3::new(1.1, 2.2, 3.3))
}

impl Actor {
    // ========================================================================
    // Mirror Info Management
    // ========================================================================

    /// Resets the mirror table so every node is its own source.
    pub fn allocate_node_mirror_infos(&mut self) {
        self.mirror_infos = (0..self.num_nodes()).map(NodeMirrorInfo::new).collect();
    }

    pub fn remove_node_mirror_infos(&mut self) {
        self.mirror_infos.clear();
    }

    #[inline]
    #[must_use]
    pub fn has_mirror_info(&self) -> bool {
        !self.mirror_infos.is_empty()
    }

    /// `true` when every node has a detected mirror axis.
    #[must_use]
    pub fn has_mirror_axes_detected(&self) -> bool {
        self.has_mirror_info() && self.mirror_infos.iter().all(|m| m.axis.is_some())
    }

    #[inline]
    #[must_use]
    pub fn node_mirror_info(&self, node: usize) -> &NodeMirrorInfo {
        &self.mirror_infos[node]
    }

    #[inline]
    pub fn node_mirror_info_mut(&mut self, node: usize) -> &mut NodeMirrorInfo {
        &mut self.mirror_infos[node]
    }

    #[inline]
    #[must_use]
    pub fn node_mirror_infos(&self) -> &[NodeMirrorInfo] {
        &self.mirror_infos
    }

    /// Replaces the whole mirror table. An empty table disables mirroring.
    pub fn set_node_mirror_infos(&mut self, infos: Vec<NodeMirrorInfo>) {
        debug_assert!(infos.is_empty() || infos.len() == self.num_nodes());
        self.mirror_infos = infos;
    }

    // ========================================================================
    // Source Mapping
    // ========================================================================

    /// Pairs two nodes: each becomes the other's motion source.
    pub fn map_node_motion_source(&mut self, source: usize, target: usize) {
        if self.mirror_infos.is_empty() {
            self.allocate_node_mirror_infos();
        }
        self.mirror_infos[target].source_node = source;
        self.mirror_infos[source].source_node = target;
    }

    /// Pairs two nodes by case-insensitive name.
    pub fn map_node_motion_source_by_name(&mut self, source: &str, target: &str) -> Result<()> {
        let find = |name: &str| {
            self.skeleton
                .find_node_by_name_no_case(name)
                .ok_or_else(|| KinemaError::NodeNotFound(name.to_string()))
        };
        let source_index = find(source)?;
        let target_index = find(target)?;
        self.map_node_motion_source(source_index, target_index);
        Ok(())
    }

    /// Finds the node whose name equals `name` with one occurrence of `sub_a`
    /// replaced by `sub_b`, or the other way around.
    ///
    /// For example `"Bip01 L Hand"` matches `"Bip01 R Hand"` with `" L "` and `" R "`.
    #[must_use]
    pub fn find_best_match_for_node(&self, name: &str, sub_a: &str, sub_b: &str) -> Option<usize> {
        self.find_substituted_node(name, sub_a, sub_b)
            .or_else(|| self.find_substituted_node(name, sub_b, sub_a))
    }

    fn find_substituted_node(&self, name: &str, from: &str, to: &str) -> Option<usize> {
        if from.is_empty() {
            return None;
        }
        self.skeleton
            .nodes()
            .iter()
            .filter(|node| node.name().contains(to))
            .find(|node| {
                name.match_indices(from).any(|(offset, _)| {
                    let substituted = format!("{}{to}{}", &name[..offset], &name[offset + from.len()..]);
                    node.name() == substituted
                })
            })
            .map(|node| node.index())
    }

    /// Pairs every node with its name counterpart, for example `"Left"` with `"Right"`.
    ///
    /// Returns the number of nodes that found a counterpart.
    pub fn match_node_motion_sources(&mut self, sub_a: &str, sub_b: &str) -> usize {
        let mut matched = 0;
        for node in 0..self.num_nodes() {
            let name = self.skeleton.node(node).name().to_string();
            if let Some(best) = self.find_best_match_for_node(&name, sub_a, sub_b) {
                log::debug!("{name} <---> {}", self.skeleton.node(best).name());
                self.map_node_motion_source(node, best);
                matched += 1;
            }
        }
        matched
    }

    /// The node whose bind pose model space position equals the mirrored
    /// position of `node`.
    ///
    /// Roots never match. A match must be unique, have the same scale length
    /// and sit at the same hierarchy depth.
    #[must_use]
    pub fn find_best_mirror_match_for_node(&self, node: usize) -> Option<usize> {
        let mut pose = self.bind_pose().clone();
        self.find_mirror_match_in_pose(node, &mut pose)
    }

    fn find_mirror_match_in_pose(&self, node: usize, pose: &mut Pose) -> Option<usize> {
        if self.skeleton.node(node).is_root() {
            return None;
        }

        let epsilon = self.settings().mirror_epsilon;
        let mirrored = pose.model_space_transform(node).mirrored(MIRROR_PLANE_NORMAL);
        let mirrored_scale = mirrored.scale.length();

        let mut result = None;
        let mut num_matches = 0;
        for candidate in (0..self.num_nodes()).filter(|&c| c != node) {
            let transform = pose.model_space_transform(candidate);
            let close = (transform.position - mirrored.position)
                .abs()
                .max_element()
                <= epsilon
                && (transform.scale.length() - mirrored_scale).abs() <= epsilon;
            if close {
                num_matches += 1;
                result = Some(candidate);
            }
        }

        let matched = result.filter(|_| num_matches == 1)?;
        (self.skeleton.calc_hierarchy_depth(node) == self.skeleton.calc_hierarchy_depth(matched))
            .then_some(matched)
    }

    /// Pairs every node with its geometric mirror counterpart in the bind pose.
    ///
    /// Returns the number of nodes that found a counterpart.
    pub fn match_node_motion_sources_geometrical(&mut self) -> usize {
        let mut pose = self.bind_pose().clone();
        let mut matched = 0;
        for node in 0..self.num_nodes() {
            if let Some(best) = self.find_mirror_match_in_pose(node, &mut pose) {
                self.map_node_motion_source(node, best);
                matched += 1;
            }
        }
        matched
    }

    // ========================================================================
    // Axis Detection
    // ========================================================================

    /// Detects the local mirror axis and flags of every node.
    ///
    /// The motion source of each node is displaced by a fixed local delta and
    /// its model space position is reflected over the YZ plane. The node is
    /// then displaced by the same delta mirrored over each local axis (and,
    /// failing that, over each axis with each half turn correction) until the
    /// result lands on the reflected position within
    /// [`ActorSettings::mirror_epsilon`](crate::ActorSettings::mirror_epsilon).
    ///
    /// Nodes where nothing lands within tolerance get the closest combination
    /// and are returned as [`MirrorFallback`]s.
    pub fn auto_detect_mirror_axes(&mut self) -> Vec<MirrorFallback> {
        if self.mirror_infos.is_empty() {
            self.allocate_node_mirror_infos();
        }

        let epsilon = self.settings().mirror_epsilon;
        let delta = probe_delta();
        let mut fallbacks = Vec::new();

        for node in 0..self.num_nodes() {
            let source = self.mirror_infos[node].source_node;
            let target = self
                .perturbed_model_transform(source, &delta)
                .mirrored(MIRROR_PLANE_NORMAL)
                .position;
            let distance = |probe: &Transform| {
                (self.perturbed_model_transform(node, probe).position - target).length()
            };

            let mut candidates = Axis::ALL
                .into_iter()
                .map(|axis| (axis, MirrorFlags::empty()))
                .chain(Axis::ALL.into_iter().flat_map(|axis| {
                    Axis::ALL
                        .into_iter()
                        .map(move |flip| (axis, flip.invert_flag()))
                }));

            let mut best = (Axis::X, MirrorFlags::empty(), f32::MAX);
            let found = candidates.find_map(|(axis, flags)| {
                let mut probe = delta;
                probe.mirror_with_flags(axis.unit(), flags);
                let dist = distance(&probe);
                if dist <= epsilon {
                    return Some((axis, flags));
                }
                if dist < best.2 {
                    best = (axis, flags, dist);
                }
                None
            });

            let (axis, flags) = match found {
                Some(hit) => hit,
                None => {
                    let (axis, flags, residual) = best;
                    log::warn!(
                        "No exact mirror axis for node '{}', using {axis:?} {flags:?} (residual {residual})",
                        self.skeleton.node(node).name()
                    );
                    fallbacks.push(MirrorFallback {
                        node,
                        axis,
                        flags,
                        residual,
                    });
                    (axis, flags)
                }
            };
            let info = &mut self.mirror_infos[node];
            info.axis = Some(axis);
            info.flags = flags;
        }
        fallbacks
    }

    /// Bind pose model space transform of `node` with its local transform
    /// displaced by `delta` in the node's own frame.
    fn perturbed_model_transform(&self, node: usize, delta: &Transform) -> Transform {
        let bind_pose = self.bind_pose();
        let local = *bind_pose.local_space_transform(node) * *delta;
        match self.skeleton.node(node).parent() {
            Some(parent) => bind_pose.calc_model_space_transform(parent) * local,
            None => local,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hands() -> Actor {
        let mut actor = Actor::new("Hands");
        actor.add_node("Pelvis", None, Transform::IDENTITY).unwrap();
        actor
            .add_node("Bip01 L Hand", Some(0), Transform::from_translation(Vec3::new(1.0, 1.0, 0.0)))
            .unwrap();
        actor
            .add_node("Bip01 R Hand", Some(0), Transform::from_translation(Vec3::new(-1.0, 1.0, 0.0)))
            .unwrap();
        actor
    }

    #[test]
    fn name_substitution_works_both_ways() {
        let actor = hands();
        assert_eq!(actor.find_best_match_for_node("Bip01 L Hand", " L ", " R "), Some(2));
        assert_eq!(actor.find_best_match_for_node("Bip01 R Hand", " L ", " R "), Some(1));
        assert_eq!(actor.find_best_match_for_node("Pelvis", " L ", " R "), None);
    }

    #[test]
    fn geometric_match_skips_roots() {
        let mut actor = hands();
        assert_eq!(actor.find_best_mirror_match_for_node(0), None);
        assert_eq!(actor.match_node_motion_sources_geometrical(), 2);
        assert_eq!(actor.node_mirror_info(1).source_node, 2);
        assert_eq!(actor.node_mirror_info(0).source_node, 0);
    }

    #[test]
    fn by_name_mapping_reports_missing_nodes() {
        let mut actor = hands();
        assert!(actor.map_node_motion_source_by_name("bip01 l hand", "BIP01 R HAND").is_ok());
        assert_eq!(actor.node_mirror_info(2).source_node, 1);
        assert!(matches!(
            actor.map_node_motion_source_by_name("Left Foot", "Bip01 R Hand"),
            Err(KinemaError::NodeNotFound(_))
        ));
    }
}
