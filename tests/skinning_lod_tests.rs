//! Skinning LOD compatibility tests
//!
//! Tests for:
//! - Remapping influences of disabled bones onto the nearest enabled ancestor
//! - Fixed point behaviour on repeated passes
//! - Influence collapsing and submesh bone table rebuilds
//! - Bones without an enabled ancestor
//! - post_create_init running the pass on demand

use glam::Vec3;
use kinema::{Actor, ActorSettings, Mesh, MeshDeformerStack, SkinningLayer, SoftSkinDeformer, SubMesh, Transform};

// ============================================================================
// Helper
// ============================================================================

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn weights(actor: &Actor, lod: usize, node: usize, vertex: usize) -> Vec<(usize, f32)> {
    actor
        .mesh(lod, node)
        .unwrap()
        .skinning()
        .unwrap()
        .influences(vertex)
        .iter()
        .map(|i| (i.node_index, i.weight))
        .collect()
}

/// Root -> Mid -> Tip with Mid disabled in skeletal LOD 1, two geometry LODs.
///
/// The skinned mesh lives on Root. Vertex 0 is fully on Mid, vertex 1 is split
/// between Root and Mid, vertex 2 is on Tip.
fn chain(settings: ActorSettings) -> Actor {
    let mut actor = Actor::with_settings("Chain", settings);
    actor.add_node("Root", None, Transform::IDENTITY).unwrap();
    actor.add_node("Mid", Some(0), Transform::from_translation(Vec3::Y)).unwrap();
    actor.add_node("Tip", Some(1), Transform::from_translation(Vec3::Y)).unwrap();
    actor.set_skeletal_lod_status(1, 1, false);

    actor.add_lod_level(false);
    let mut layer = SkinningLayer::new(3);
    layer.add_influence(0, 1, 1.0);
    layer.add_influence(1, 0, 0.25);
    layer.add_influence(1, 1, 0.75);
    layer.add_influence(2, 2, 1.0);
    let mesh = Mesh::new(vec![Vec3::Y, Vec3::Y * 0.5, Vec3::Y * 2.0], vec![0, 1, 2])
        .with_skinning(layer)
        .with_submesh(SubMesh::new(0, 3, 0, 3, 0));
    actor.set_mesh(0, 0, Some(mesh));
    actor.set_mesh_deformer_stack(0, 0, Some(MeshDeformerStack::new().with_deformer(SoftSkinDeformer::new())));
    actor.add_material(0, kinema::Material::default());

    // LOD 1 starts as a copy of LOD 0; the skeletal flags of LOD 1 stay as set above.
    actor.add_lod_level(false);
    let lod0 = actor.lod_level(0).clone();
    actor.set_mesh(1, 0, lod0.node_infos[0].mesh.clone());
    actor.set_mesh_deformer_stack(1, 0, lod0.node_infos[0].stack.clone());
    actor.add_material(1, kinema::Material::default());
    actor
}

fn manual_settings() -> ActorSettings {
    let mut settings = ActorSettings::default();
    settings.post_create.make_geom_lods_compatible = false;
    settings
}

// ============================================================================
// Remapping
// ============================================================================

#[test]
fn disabled_mid_moves_to_root_and_stays_there() {
    init_logger();
    let mut actor = chain(manual_settings());

    let first = actor.make_geom_lods_compatible_with_skeletal_lods();
    assert_eq!(first, 2);
    assert_eq!(weights(&actor, 1, 0, 0), vec![(0, 1.0)]);

    let second = actor.make_geom_lods_compatible_with_skeletal_lods();
    assert_eq!(second, 0);
    assert_eq!(weights(&actor, 1, 0, 0), vec![(0, 1.0)]);
}

#[test]
fn merged_influences_get_full_weight() {
    let mut actor = chain(manual_settings());
    actor.make_geom_lods_compatible_with_skeletal_lods();

    // Root 0.25 + Mid 0.75 -> Root only.
    assert_eq!(weights(&actor, 1, 0, 1), vec![(0, 1.0)]);
    // Tip stays enabled and untouched.
    assert_eq!(weights(&actor, 1, 0, 2), vec![(2, 1.0)]);
    assert_eq!(actor.mesh(1, 0).unwrap().submesh(0).bones(), &[0, 2]);
}

#[test]
fn highest_detail_lod_is_untouched() {
    let mut actor = chain(manual_settings());
    actor.make_geom_lods_compatible_with_skeletal_lods();
    assert_eq!(weights(&actor, 0, 0, 0), vec![(1, 1.0)]);
    assert_eq!(weights(&actor, 0, 0, 1), vec![(0, 0.25), (1, 0.75)]);
}

#[test]
fn verify_skinning_flags_disabled_bones_in_use() {
    let mut actor = chain(manual_settings());
    assert_eq!(actor.verify_skinning(1, 1), vec![false, true, false]);
    assert_eq!(actor.verify_skinning(0, 1), vec![false; 3]);
    actor.make_geom_lods_compatible_with_skeletal_lods();
    assert_eq!(actor.verify_skinning(1, 1), vec![false; 3]);
}

#[test]
fn disabled_root_is_left_unchanged() {
    init_logger();
    let mut actor = chain(manual_settings());
    actor.set_skeletal_lod_status(0, 1, false);

    actor.make_geom_lods_compatible_with_skeletal_lods();

    // Mid and Root are both disabled: nothing enabled above them.
    assert_eq!(weights(&actor, 1, 0, 0), vec![(1, 1.0)]);
    assert_eq!(weights(&actor, 1, 0, 1), vec![(0, 0.25), (1, 0.75)]);
    assert_eq!(actor.make_geom_lods_compatible_with_skeletal_lods(), 0);
}

// ============================================================================
// Post Create
// ============================================================================

#[test]
fn post_create_init_runs_the_pass_when_enabled() {
    let mut actor = chain(ActorSettings::default());
    actor.post_create_init();
    assert_eq!(weights(&actor, 1, 0, 0), vec![(0, 1.0)]);

    let mut manual = chain(manual_settings());
    manual.post_create_init();
    assert_eq!(weights(&manual, 1, 0, 0), vec![(1, 1.0)]);
}
