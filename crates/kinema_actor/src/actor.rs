use std::sync::Arc;

use glam::{Affine3A, Mat3, Vec3};
use kinema_core::{Axis, BoundingBox, KinemaError, Obb, Result, Transform, UnitType};
use kinema_resources::{Material, Mesh, MorphSetup, MorphTarget};
use kinema_skeleton::{NodeGroup, Pose, Skeleton};
use parking_lot::RwLock;
use uuid::Uuid;

use crate::lod::{LodLevel, NodeLodInfo};
use crate::mirror::NodeMirrorInfo;
use crate::settings::ActorSettings;
use crate::setup::{PhysicsSetup, SharedSetup, SimulatedObjectSetup};

/// Another actor whose instances are required at runtime by this actor's instances.
#[derive(Debug, Clone)]
pub struct Dependency {
    pub actor: Arc<Actor>,
}

/// Per-node data that does not depend on the LOD level.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NodeInfo {
    /// Bounds of the node's geometry in its bind pose local frame.
    pub obb: Obb,
}

/// A skinned character: skeleton, bind pose and LOD-indexed geometry.
///
/// # Structure
///
/// - one [`Skeleton`] with its bind pose
/// - one [`LodLevel`] per geometry LOD (0 = highest detail), each holding a
///   [`NodeLodInfo`] per node plus the LOD's materials and morph setup
/// - one inverse bind pose matrix and one [`NodeInfo`] per node
/// - an optional [`NodeMirrorInfo`] table (empty means "no mirroring")
///
/// Every per-node array is resized together with the skeleton, so their
/// lengths always match the node count.
///
/// # Sharing
///
/// After construction an actor is read-only and shared as `Arc<Actor>` by
/// its instances. [`PhysicsSetup`] and [`SimulatedObjectSetup`] are shared
/// with every duplicate of the actor.
#[derive(Debug)]
pub struct Actor {
    // === Identity ===
    id: Uuid,
    name: String,
    file_name: String,
    unit_type: UnitType,
    file_unit_type: UnitType,
    thread_index: Option<u32>,
    dirty: bool,
    used_for_visualization: bool,
    owned_by_runtime: bool,

    // === Hierarchy & Transforms ===
    pub(crate) skeleton: Skeleton,
    pub(crate) node_infos: Vec<NodeInfo>,
    pub(crate) inv_bind_pose: Vec<Affine3A>,
    inv_bind_pose_valid: bool,
    pub(crate) mirror_infos: Vec<NodeMirrorInfo>,
    motion_extraction_node: Option<usize>,
    retarget_root_node: Option<usize>,

    // === LOD Content ===
    pub(crate) lods: Vec<LodLevel>,
    pub(crate) static_aabb: BoundingBox,
    node_groups: Vec<NodeGroup>,
    dependencies: Vec<Dependency>,

    // === Shared Setups ===
    physics_setup: SharedSetup<PhysicsSetup>,
    simulated_object_setup: SharedSetup<SimulatedObjectSetup>,

    settings: ActorSettings,
}

impl Actor {
    /// Creates an empty actor with default settings.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self::with_settings(name, ActorSettings::default())
    }

    #[must_use]
    pub fn with_settings(name: &str, settings: ActorSettings) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            file_name: String::new(),
            unit_type: UnitType::Meters,
            file_unit_type: UnitType::Meters,
            thread_index: None,
            dirty: false,
            used_for_visualization: false,
            owned_by_runtime: false,

            skeleton: Skeleton::new(),
            node_infos: Vec::new(),
            inv_bind_pose: Vec::new(),
            inv_bind_pose_valid: false,
            mirror_infos: Vec::new(),
            motion_extraction_node: None,
            retarget_root_node: None,

            lods: Vec::new(),
            static_aabb: BoundingBox::RESET,
            node_groups: Vec::new(),
            dependencies: Vec::new(),

            physics_setup: Arc::new(RwLock::new(PhysicsSetup::new())),
            simulated_object_setup: Arc::new(RwLock::new(SimulatedObjectSetup::new())),

            settings,
        }
    }

    /// Deep copy of this actor under a new ID.
    ///
    /// Skeleton, LOD content, materials, morph setups, node groups, transforms
    /// and mirror infos are copied. Dependencies are flattened. Physics and
    /// simulated object setups are shared with `self`.
    #[must_use]
    pub fn duplicate(&self) -> Actor {
        let mut result = Actor::with_settings(&self.name, self.settings.clone());
        result.file_name.clone_from(&self.file_name);
        result.unit_type = self.unit_type;
        result.file_unit_type = self.file_unit_type;
        result.thread_index = self.thread_index;
        result.motion_extraction_node = self.motion_extraction_node;
        result.retarget_root_node = self.retarget_root_node;
        result.static_aabb = self.static_aabb;

        result.recursive_add_dependencies(self);
        result.node_groups.clone_from(&self.node_groups);

        result.skeleton = self.skeleton.clone();
        result.node_infos.clone_from(&self.node_infos);
        result.lods.clone_from(&self.lods);
        result.copy_transforms_from(self);

        debug_assert_eq!(
            result.skeleton.num_root_nodes(),
            self.skeleton.num_root_nodes()
        );

        result.mirror_infos.clone_from(&self.mirror_infos);
        result.physics_setup = Arc::clone(&self.physics_setup);
        result.simulated_object_setup = Arc::clone(&self.simulated_object_setup);
        result
    }

    // ========================================================================
    // Identity & Flags
    // ========================================================================

    #[inline]
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    #[inline]
    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn set_file_name(&mut self, file_name: &str) {
        self.file_name = file_name.to_string();
    }

    #[inline]
    #[must_use]
    pub fn unit_type(&self) -> UnitType {
        self.unit_type
    }

    pub fn set_unit_type(&mut self, unit_type: UnitType) {
        self.unit_type = unit_type;
    }

    /// Unit type the source file was authored in.
    #[inline]
    #[must_use]
    pub fn file_unit_type(&self) -> UnitType {
        self.file_unit_type
    }

    pub fn set_file_unit_type(&mut self, unit_type: UnitType) {
        self.file_unit_type = unit_type;
    }

    /// Worker that runtime instances of this actor are updated on.
    #[inline]
    #[must_use]
    pub fn thread_index(&self) -> Option<u32> {
        self.thread_index
    }

    pub fn set_thread_index(&mut self, index: u32) {
        self.thread_index = Some(index);
    }

    #[inline]
    #[must_use]
    pub fn dirty_flag(&self) -> bool {
        self.dirty
    }

    pub fn set_dirty_flag(&mut self, dirty: bool) {
        self.dirty = dirty;
    }

    #[inline]
    #[must_use]
    pub fn is_used_for_visualization(&self) -> bool {
        self.used_for_visualization
    }

    pub fn set_used_for_visualization(&mut self, flag: bool) {
        self.used_for_visualization = flag;
    }

    #[inline]
    #[must_use]
    pub fn is_owned_by_runtime(&self) -> bool {
        self.owned_by_runtime
    }

    pub fn set_owned_by_runtime(&mut self, owned: bool) {
        self.owned_by_runtime = owned;
    }

    #[inline]
    #[must_use]
    pub fn settings(&self) -> &ActorSettings {
        &self.settings
    }

    #[inline]
    pub fn settings_mut(&mut self) -> &mut ActorSettings {
        &mut self.settings
    }

    // ========================================================================
    // Skeleton & Nodes
    // ========================================================================

    #[inline]
    #[must_use]
    pub fn skeleton(&self) -> &Skeleton {
        &self.skeleton
    }

    #[inline]
    #[must_use]
    pub fn num_nodes(&self) -> usize {
        self.skeleton.num_nodes()
    }

    /// Enables or disables a node in a skeletal LOD.
    pub fn set_skeletal_lod_status(&mut self, node: usize, skeletal_lod: usize, enabled: bool) {
        self.skeleton
            .node_mut(node)
            .set_skeletal_lod_status(skeletal_lod, enabled);
    }

    pub fn set_node_name(&mut self, node: usize, name: &str) {
        self.skeleton.set_node_name(node, name);
    }

    /// Includes or excludes a node from instance bounds. Invalidates the static AABB.
    pub fn set_node_include_in_bounds(&mut self, node: usize, include: bool) {
        self.skeleton.node_mut(node).include_in_bounds = include;
        self.static_aabb.reset();
    }

    /// Appends a node to the skeleton and an empty slot to every per-node array.
    ///
    /// The inverse bind pose is stale until
    /// [`Actor::update_inverse_bind_pose`] runs again.
    pub fn add_node(&mut self, name: &str, parent: Option<usize>, local: Transform) -> Result<usize> {
        let index = self.skeleton.add_node(name, parent, local)?;
        for lod in &mut self.lods {
            lod.node_infos.push(NodeLodInfo::default());
        }
        self.node_infos.push(NodeInfo::default());
        self.inv_bind_pose.push(Affine3A::IDENTITY);
        self.inv_bind_pose_valid = false;
        if !self.mirror_infos.is_empty() {
            self.mirror_infos.push(NodeMirrorInfo::new(index));
        }
        Ok(index)
    }

    /// Removes a node and everything that is stored for it.
    ///
    /// Children are re-parented to the removed node's parent. Every per-node
    /// array shrinks by one entry at `index`, the meshes and stacks of the
    /// node are dropped, and node references above `index` shift down.
    /// Skinning influences on the removed node move to its parent, or are
    /// dropped with a warning when the node was a root.
    ///
    /// # Panics
    /// If `index` is out of range.
    pub fn remove_node(&mut self, index: usize) {
        let parent = self.skeleton.node(index).parent();
        let name = self.skeleton.node(index).name().to_string();
        self.skeleton.remove_node(index);

        let shift = |n: usize| if n > index { n - 1 } else { n };
        for (lod_index, lod) in self.lods.iter_mut().enumerate() {
            lod.node_infos.remove(index);
            if let Some(setup) = &mut lod.morph_setup {
                setup.remove_node(index);
            }

            for info in &mut lod.node_infos {
                let Some(layer) = info.mesh.as_mut().and_then(Mesh::skinning_mut) else {
                    continue;
                };
                let mut dropped = 0;
                layer.remap_nodes(|n| {
                    if n == index {
                        if parent.is_none() {
                            dropped += 1;
                        }
                        parent.map(shift)
                    } else {
                        Some(shift(n))
                    }
                });
                if dropped > 0 {
                    log::warn!(
                        "Dropped {dropped} skinning influences on removed root node '{name}' in LOD {lod_index}"
                    );
                }
                if let Some(mesh) = &mut info.mesh {
                    mesh.reinit_submesh_bones();
                }
            }
        }

        self.node_infos.remove(index);
        if index < self.inv_bind_pose.len() {
            self.inv_bind_pose.remove(index);
        }
        self.inv_bind_pose_valid = false;

        if !self.mirror_infos.is_empty() {
            self.mirror_infos.remove(index);
            for (i, info) in self.mirror_infos.iter_mut().enumerate() {
                info.source_node = if info.source_node == index {
                    i
                } else {
                    shift(info.source_node)
                };
            }
        }

        for group in &mut self.node_groups {
            group.remove_node(index);
        }

        let fix = |node: Option<usize>| node.filter(|&n| n != index).map(shift);
        self.motion_extraction_node = fix(self.motion_extraction_node);
        self.retarget_root_node = fix(self.retarget_root_node);

        self.simulated_object_setup
            .write()
            .init_after_load(&self.skeleton);
        self.static_aabb.reset();
        self.reinitialize_mesh_deformers();
    }

    /// Removes every node together with all per-node data.
    pub fn delete_all_nodes(&mut self) {
        self.skeleton.remove_all_nodes();
        for lod in &mut self.lods {
            lod.node_infos.clear();
        }
        self.node_infos.clear();
        self.inv_bind_pose.clear();
        self.inv_bind_pose_valid = false;
        self.mirror_infos.clear();
        for group in &mut self.node_groups {
            group.remove_all_nodes();
        }
        self.motion_extraction_node = None;
        self.retarget_root_node = None;
        self.static_aabb.reset();
    }

    /// The node itself followed by its ancestors up to the root.
    #[must_use]
    pub fn generate_update_path_to_root(&self, end_node: usize) -> Vec<usize> {
        self.skeleton.path_to_root(end_node)
    }

    // ========================================================================
    // Transforms
    // ========================================================================

    #[inline]
    #[must_use]
    pub fn bind_pose(&self) -> &Pose {
        self.skeleton.bind_pose()
    }

    /// Mutable bind pose. Marks the inverse bind pose as stale.
    pub fn bind_pose_mut(&mut self) -> &mut Pose {
        self.inv_bind_pose_valid = false;
        self.skeleton.bind_pose_mut()
    }

    /// Resizes the inverse bind pose to the node count. New entries are stale.
    pub fn resize_transform_data(&mut self) {
        let num_nodes = self.skeleton.num_nodes();
        if self.inv_bind_pose.len() != num_nodes {
            self.inv_bind_pose.resize(num_nodes, Affine3A::IDENTITY);
            self.inv_bind_pose_valid = false;
        }
        self.skeleton.bind_pose_mut().invalidate_model_space();
    }

    /// Drops the inverse bind pose and the bind pose morph weights.
    pub fn release_transform_data(&mut self) {
        self.inv_bind_pose.clear();
        self.inv_bind_pose_valid = false;
        let bind_pose = self.skeleton.bind_pose_mut();
        bind_pose.resize_num_morphs(0);
        bind_pose.invalidate_model_space();
    }

    /// Copies the bind pose and inverse bind pose from an actor with the same node count.
    ///
    /// # Panics
    /// If the node counts differ.
    pub fn copy_transforms_from(&mut self, other: &Actor) {
        assert_eq!(
            other.num_nodes(),
            self.num_nodes(),
            "copy_transforms_from requires equal node counts"
        );
        self.resize_transform_data();
        self.inv_bind_pose.clone_from(&other.inv_bind_pose);
        self.inv_bind_pose_valid = other.inv_bind_pose_valid;
        self.skeleton
            .bind_pose_mut()
            .copy_from(other.skeleton.bind_pose());
    }

    /// Recomputes every inverse bind pose matrix from the bind pose model
    /// space transforms.
    pub fn update_inverse_bind_pose(&mut self) {
        let bind_pose = self.skeleton.bind_pose_mut();
        bind_pose.force_update_full_model_space_pose();
        self.inv_bind_pose = bind_pose
            .model_space_transforms()
            .iter()
            .map(|model| model.to_affine().inverse())
            .collect();
        self.inv_bind_pose_valid = true;
    }

    /// `false` after any topology or bind pose edit until
    /// [`Actor::update_inverse_bind_pose`] runs.
    #[inline]
    #[must_use]
    pub fn has_valid_inverse_bind_pose(&self) -> bool {
        self.inv_bind_pose_valid && self.inv_bind_pose.len() == self.num_nodes()
    }

    #[inline]
    #[must_use]
    pub fn inverse_bind_pose_transform(&self, node: usize) -> &Affine3A {
        &self.inv_bind_pose[node]
    }

    #[inline]
    #[must_use]
    pub fn inverse_bind_pose_transforms(&self) -> &[Affine3A] {
        &self.inv_bind_pose
    }

    /// Inverse bind pose of a node, computed from the bind pose when the
    /// stored array is stale.
    pub(crate) fn inverse_bind_or_calc(&self, node: usize) -> Affine3A {
        if self.has_valid_inverse_bind_pose() {
            self.inv_bind_pose[node]
        } else {
            self.skeleton
                .bind_pose()
                .calc_model_space_transform(node)
                .to_affine()
                .inverse()
        }
    }

    // ========================================================================
    // Node Infos & Static Bounds
    // ========================================================================

    #[inline]
    #[must_use]
    pub fn node_obb(&self, node: usize) -> &Obb {
        &self.node_infos[node].obb
    }

    #[inline]
    pub fn node_obb_mut(&mut self, node: usize) -> &mut Obb {
        &mut self.node_infos[node].obb
    }

    #[inline]
    #[must_use]
    pub fn static_aabb(&self) -> &BoundingBox {
        &self.static_aabb
    }

    pub fn set_static_aabb(&mut self, aabb: BoundingBox) {
        self.static_aabb = aabb;
    }

    // ========================================================================
    // Materials
    // ========================================================================

    /// Appends a material to a LOD and returns its index.
    pub fn add_material(&mut self, lod: usize, material: Material) -> usize {
        let materials = &mut self.lods[lod].materials;
        materials.push(material);
        materials.len() - 1
    }

    #[inline]
    #[must_use]
    pub fn material(&self, lod: usize, index: usize) -> &Material {
        &self.lods[lod].materials[index]
    }

    #[inline]
    pub fn material_mut(&mut self, lod: usize, index: usize) -> &mut Material {
        &mut self.lods[lod].materials[index]
    }

    pub fn set_material(&mut self, lod: usize, index: usize, material: Material) {
        self.lods[lod].materials[index] = material;
    }

    #[inline]
    #[must_use]
    pub fn num_materials(&self, lod: usize) -> usize {
        self.lods[lod].materials.len()
    }

    pub fn reserve_materials(&mut self, lod: usize, additional: usize) {
        self.lods[lod].materials.reserve(additional);
    }

    /// Removes a material. Submesh material indices are left untouched.
    pub fn remove_material(&mut self, lod: usize, index: usize) -> Material {
        self.lods[lod].materials.remove(index)
    }

    /// Clears the material list of every LOD.
    pub fn remove_all_materials(&mut self) {
        for lod in &mut self.lods {
            lod.materials.clear();
        }
    }

    #[must_use]
    pub fn find_material_index_by_name(&self, lod: usize, name: &str) -> Option<usize> {
        self.lods[lod].materials.iter().position(|m| m.name == name)
    }

    /// Returns `true` when a submesh of any mesh in the LOD uses the material.
    #[must_use]
    pub fn is_material_used(&self, lod: usize, index: usize) -> bool {
        self.lods[lod]
            .node_infos
            .iter()
            .filter_map(|info| info.mesh.as_ref())
            .any(|mesh| Self::is_material_used_by_mesh(mesh, index))
    }

    #[must_use]
    pub fn is_material_used_by_mesh(mesh: &Mesh, index: usize) -> bool {
        mesh.submeshes().iter().any(|s| s.material == index)
    }

    // ========================================================================
    // Morph Setups
    // ========================================================================

    #[inline]
    #[must_use]
    pub fn morph_setup(&self, lod: usize) -> Option<&MorphSetup> {
        self.lods[lod].morph_setup.as_ref()
    }

    #[inline]
    pub fn morph_setup_mut(&mut self, lod: usize) -> Option<&mut MorphSetup> {
        self.lods[lod].morph_setup.as_mut()
    }

    pub fn set_morph_setup(&mut self, lod: usize, setup: Option<MorphSetup>) {
        self.lods[lod].morph_setup = setup;
    }

    /// Drops the morph setup of every LOD.
    ///
    /// With `delete_deformers`, morph deformers are stripped from every stack
    /// and stacks left empty are removed.
    pub fn remove_all_morph_setups(&mut self, delete_deformers: bool) {
        for lod in &mut self.lods {
            lod.morph_setup = None;
            if !delete_deformers {
                continue;
            }
            for info in &mut lod.node_infos {
                if let Some(stack) = &mut info.stack {
                    stack.remove_all_deformers_by_type(kinema_resources::DeformerType::Morph);
                    if stack.is_empty() {
                        info.stack = None;
                    }
                }
            }
        }
    }

    // ========================================================================
    // Node Groups
    // ========================================================================

    pub fn add_node_group(&mut self, group: NodeGroup) -> usize {
        self.node_groups.push(group);
        self.node_groups.len() - 1
    }

    #[inline]
    #[must_use]
    pub fn num_node_groups(&self) -> usize {
        self.node_groups.len()
    }

    #[inline]
    #[must_use]
    pub fn node_group(&self, index: usize) -> &NodeGroup {
        &self.node_groups[index]
    }

    #[inline]
    pub fn node_group_mut(&mut self, index: usize) -> &mut NodeGroup {
        &mut self.node_groups[index]
    }

    pub fn remove_node_group(&mut self, index: usize) -> NodeGroup {
        self.node_groups.remove(index)
    }

    pub fn remove_all_node_groups(&mut self) {
        self.node_groups.clear();
    }

    #[must_use]
    pub fn find_node_group_index_by_name(&self, name: &str) -> Option<usize> {
        self.node_groups.iter().position(|g| g.name == name)
    }

    #[must_use]
    pub fn find_node_group_index_by_name_no_case(&self, name: &str) -> Option<usize> {
        self.node_groups
            .iter()
            .position(|g| g.name.eq_ignore_ascii_case(name))
    }

    #[must_use]
    pub fn find_node_group_by_name(&self, name: &str) -> Option<&NodeGroup> {
        self.find_node_group_index_by_name(name)
            .map(|i| &self.node_groups[i])
    }

    #[must_use]
    pub fn find_node_group_by_name_no_case(&self, name: &str) -> Option<&NodeGroup> {
        self.find_node_group_index_by_name_no_case(name)
            .map(|i| &self.node_groups[i])
    }

    // ========================================================================
    // Dependencies
    // ========================================================================

    /// Adds a dependency unless an actor with the same ID is already listed.
    pub fn add_dependency(&mut self, actor: Arc<Actor>) {
        if self.dependencies.iter().any(|d| d.actor.id() == actor.id()) {
            return;
        }
        self.dependencies.push(Dependency { actor });
    }

    #[inline]
    #[must_use]
    pub fn dependencies(&self) -> &[Dependency] {
        &self.dependencies
    }

    #[inline]
    #[must_use]
    pub fn num_dependencies(&self) -> usize {
        self.dependencies.len()
    }

    /// Adds every dependency of `actor`, and theirs, to this actor's flat list.
    pub fn recursive_add_dependencies(&mut self, actor: &Actor) {
        for dependency in &actor.dependencies {
            self.add_dependency(Arc::clone(&dependency.actor));
            self.recursive_add_dependencies(&dependency.actor);
        }
    }

    // ========================================================================
    // Shared Setups
    // ========================================================================

    #[inline]
    #[must_use]
    pub fn physics_setup(&self) -> &SharedSetup<PhysicsSetup> {
        &self.physics_setup
    }

    pub fn set_physics_setup(&mut self, setup: SharedSetup<PhysicsSetup>) {
        self.physics_setup = setup;
    }

    #[inline]
    #[must_use]
    pub fn simulated_object_setup(&self) -> &SharedSetup<SimulatedObjectSetup> {
        &self.simulated_object_setup
    }

    pub fn set_simulated_object_setup(&mut self, setup: SharedSetup<SimulatedObjectSetup>) {
        self.simulated_object_setup = setup;
    }

    // ========================================================================
    // Motion Extraction & Retargeting
    // ========================================================================

    #[inline]
    #[must_use]
    pub fn motion_extraction_node(&self) -> Option<usize> {
        self.motion_extraction_node
    }

    pub fn set_motion_extraction_node(&mut self, node: Option<usize>) {
        self.motion_extraction_node = node;
    }

    /// The root node with the most descendants.
    #[must_use]
    pub fn find_best_motion_extraction_node(&self) -> Option<usize> {
        let mut best = None;
        let mut max_children = 0;
        for &root in self.skeleton.root_nodes() {
            let count = self.skeleton.num_child_nodes_recursive(root);
            if count > max_children {
                max_children = count;
                best = Some(root);
            }
        }
        best
    }

    pub fn auto_set_motion_extraction_node(&mut self) {
        self.motion_extraction_node = self.find_best_motion_extraction_node();
    }

    /// The local axis of the motion extraction node that points most closely
    /// along model space +Z. Falls back to [`Axis::Y`] without a motion
    /// extraction node.
    #[must_use]
    pub fn find_best_matching_motion_extraction_axis(&self) -> Axis {
        let Some(node) = self.motion_extraction_node else {
            return Axis::Y;
        };

        let rotation = Mat3::from_quat(self.bind_pose().local_space_transform(node).rotation);
        let difference = |basis: Vec3| 1.0 - basis.dot(Vec3::Z).abs().clamp(0.0, 1.0);
        let dif_x = difference(rotation.x_axis);
        let dif_y = difference(rotation.y_axis);
        let dif_z = difference(rotation.z_axis);

        if dif_x <= dif_y && dif_x <= dif_z {
            Axis::X
        } else if dif_y <= dif_z {
            Axis::Y
        } else {
            Axis::Z
        }
    }

    #[inline]
    #[must_use]
    pub fn retarget_root_node(&self) -> Option<usize> {
        self.retarget_root_node
    }

    pub fn set_retarget_root_node(&mut self, node: Option<usize>) {
        self.retarget_root_node = node;
    }

    // ========================================================================
    // Post Create
    // ========================================================================

    /// Builds all derived state once the actor's nodes and LOD content are in place.
    ///
    /// In order: inverse bind pose, skinning LOD compatibility, deformer
    /// reinitialisation, bind pose morph weights, node OBBs from LOD 0,
    /// mirror axes, simulated object joints, static AABB, unit conversion.
    /// Which optional steps run is taken from [`ActorSettings::post_create`].
    pub fn post_create_init(&mut self) {
        let options = self.settings.post_create;
        if self.thread_index.is_none() {
            self.thread_index = Some(0);
        }

        self.update_inverse_bind_pose();

        if options.make_geom_lods_compatible {
            let remapped = self.make_geom_lods_compatible_with_skeletal_lods();
            if remapped > 0 {
                log::debug!("Actor '{}': remapped {remapped} skinning influences", self.name);
            }
        }

        self.reinitialize_mesh_deformers();

        let num_morphs = self
            .lods
            .first()
            .and_then(|lod| lod.morph_setup.as_ref())
            .map(MorphSetup::num_morph_targets);
        let bind_pose = self.skeleton.bind_pose_mut();
        if let Some(count) = num_morphs {
            bind_pose.resize_num_morphs(count);
        }
        bind_pose.force_update_full_model_space_pose();
        bind_pose.zero_morph_weights();

        if options.generate_obbs && !self.lods.is_empty() {
            self.update_node_bind_pose_obbs(0);
        }

        if self.has_mirror_info() && !self.has_mirror_axes_detected() {
            self.auto_detect_mirror_axes();
        }

        self.simulated_object_setup
            .write()
            .init_after_load(&self.skeleton);

        self.update_static_aabb();

        if options.convert_unit_type {
            self.scale_to_unit_type(self.settings.unit_type);
        }

        log::debug!(
            "Actor '{}' initialised: {} nodes, {} LOD levels",
            self.name,
            self.num_nodes(),
            self.lods.len()
        );
    }

    // ========================================================================
    // Validation
    // ========================================================================

    /// Checks every structural invariant and reports the first violation.
    pub fn validate(&self) -> Result<()> {
        self.skeleton.validate()?;
        let num_nodes = self.num_nodes();

        let check_len = |context: &str, found: usize| -> Result<()> {
            if found == num_nodes {
                Ok(())
            } else {
                Err(KinemaError::NodeCountMismatch {
                    context: context.to_string(),
                    expected: num_nodes,
                    found,
                })
            }
        };

        check_len("node infos", self.node_infos.len())?;
        if self.inv_bind_pose_valid {
            check_len("inverse bind pose", self.inv_bind_pose.len())?;
        }
        if !self.mirror_infos.is_empty() {
            check_len("mirror infos", self.mirror_infos.len())?;
            if let Some(info) = self.mirror_infos.iter().find(|m| m.source_node >= num_nodes) {
                return Err(KinemaError::BrokenHierarchy(format!(
                    "mirror source {} out of range",
                    info.source_node
                )));
            }
        }

        for (lod_index, lod) in self.lods.iter().enumerate() {
            check_len(&format!("LOD {lod_index}"), lod.node_infos.len())?;
            for (node, info) in lod.node_infos.iter().enumerate() {
                let Some(mesh) = &info.mesh else {
                    continue;
                };
                if let Some(layer) = mesh.skinning()
                    && let Some(&bad) = layer.referenced_nodes().iter().find(|&&n| n >= num_nodes)
                {
                    return Err(KinemaError::BrokenHierarchy(format!(
                        "mesh of node {node} in LOD {lod_index} is skinned to missing node {bad}"
                    )));
                }
                if let Some(submesh) = mesh.submeshes().iter().find(|s| s.material >= lod.materials.len()) {
                    return Err(KinemaError::NodeCountMismatch {
                        context: format!("materials of LOD {lod_index}"),
                        expected: submesh.material + 1,
                        found: lod.materials.len(),
                    });
                }
            }
            if let Some(bad) = lod
                .morph_setup
                .iter()
                .flat_map(MorphSetup::morph_targets)
                .flat_map(MorphTarget::deform_datas)
                .find(|d| d.node_index >= num_nodes)
            {
                return Err(KinemaError::BrokenHierarchy(format!(
                    "morph deform data in LOD {lod_index} targets missing node {}",
                    bad.node_index
                )));
            }
        }
        Ok(())
    }
}
