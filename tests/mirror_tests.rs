//! Mirror mapping tests
//!
//! Tests for:
//! - Symmetric motion source pairing
//! - Name based pairing with substring substitution
//! - Geometric pairing (uniqueness and hierarchy depth rules)
//! - Mirror axis detection, including the reported fallback
//! - Transform mirroring helpers
//! - Mirror table upkeep when nodes are added or removed

use glam::{Quat, Vec3};
use kinema::{Actor, ActorSettings, Axis, MirrorFlags, Transform};

// ============================================================================
// Helper
// ============================================================================

const EPSILON: f32 = 1e-5;

fn approx_eq(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

fn vec3_approx(a: Vec3, b: Vec3) -> bool {
    approx_eq(a.x, b.x) && approx_eq(a.y, b.y) && approx_eq(a.z, b.z)
}

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Hips with symmetric Left/Right arm chains.
fn symmetric_actor() -> Actor {
    let mut actor = Actor::new("Symmetric");
    let hips = actor.add_node("Hips", None, Transform::from_translation(Vec3::new(0.0, 1.0, 0.0))).unwrap();
    let left = actor
        .add_node("Left Arm", Some(hips), Transform::from_translation(Vec3::new(0.5, 0.4, 0.0)))
        .unwrap();
    actor
        .add_node("Left Hand", Some(left), Transform::from_translation(Vec3::new(0.6, 0.0, 0.0)))
        .unwrap();
    let right = actor
        .add_node("Right Arm", Some(hips), Transform::from_translation(Vec3::new(-0.5, 0.4, 0.0)))
        .unwrap();
    actor
        .add_node("Right Hand", Some(right), Transform::from_translation(Vec3::new(-0.6, 0.0, 0.0)))
        .unwrap();
    actor
}

// ============================================================================
// Transform Mirroring
// ============================================================================

#[test]
fn mirroring_reflects_position_and_rotation() {
    let rotation = Quat::from_rotation_y(0.7);
    let t = Transform::from_rotation_translation(rotation, Vec3::new(1.0, 2.0, 3.0));
    let m = t.mirrored(Vec3::X);

    assert!(vec3_approx(m.position, Vec3::new(-1.0, 2.0, 3.0)));
    // Reflecting a Y rotation over the YZ plane reverses its direction.
    let expected = Quat::from_rotation_y(-0.7);
    assert!(m.rotation.dot(expected).abs() > 1.0 - EPSILON);
    assert!(vec3_approx(m.scale, Vec3::ONE));
}

#[test]
fn mirror_flags_apply_half_turns() {
    let mut t = Transform::from_translation(Vec3::new(1.0, 2.0, 3.0));
    t.apply_mirror_flags(MirrorFlags::INVERT_Y);
    assert!(vec3_approx(t.position, Vec3::new(-1.0, 2.0, -3.0)));
    assert!(approx_eq(t.rotation.w, -1.0));
}

// ============================================================================
// Pairing
// ============================================================================

#[test]
fn explicit_pairing_is_symmetric() {
    let mut actor = symmetric_actor();
    assert!(!actor.has_mirror_info());

    actor.map_node_motion_source(1, 3);
    assert_eq!(actor.node_mirror_info(1).source_node, 3);
    assert_eq!(actor.node_mirror_info(3).source_node, 1);
    // Unpaired nodes map to themselves.
    assert_eq!(actor.node_mirror_info(0).source_node, 0);
    assert_eq!(actor.node_mirror_infos().len(), actor.num_nodes());
}

#[test]
fn every_pairing_is_symmetric() {
    let mut actor = symmetric_actor();
    for (a, b) in [(1, 3), (2, 4), (0, 0)] {
        actor.map_node_motion_source(a, b);
        assert_eq!(actor.node_mirror_info(a).source_node, b);
        assert_eq!(actor.node_mirror_info(b).source_node, a);
    }
}

#[test]
fn name_pairing_substitutes_both_ways() {
    let mut actor = symmetric_actor();
    assert_eq!(actor.find_best_match_for_node("Left Hand", "Left", "Right"), Some(4));
    assert_eq!(actor.find_best_match_for_node("Right Hand", "Left", "Right"), Some(2));

    assert_eq!(actor.match_node_motion_sources("Left", "Right"), 4);
    assert_eq!(actor.node_mirror_info(2).source_node, 4);
    assert_eq!(actor.node_mirror_info(4).source_node, 2);
    assert_eq!(actor.node_mirror_info(0).source_node, 0);
}

#[test]
fn geometric_pairing_requires_unique_match() {
    let mut actor = symmetric_actor();
    assert_eq!(actor.match_node_motion_sources_geometrical(), 4);
    assert_eq!(actor.node_mirror_info(1).source_node, 3);
    assert_eq!(actor.node_mirror_info(2).source_node, 4);

    // A second node on the right hand's spot makes the left hand ambiguous.
    let mut ambiguous = symmetric_actor();
    ambiguous
        .add_node("Right Ring", Some(3), Transform::from_translation(Vec3::new(-0.6, 0.0, 0.0)))
        .unwrap();
    assert_eq!(ambiguous.find_best_mirror_match_for_node(2), None);
    assert_eq!(ambiguous.find_best_mirror_match_for_node(1), Some(3));
}

#[test]
fn geometric_pairing_requires_equal_depth() {
    let mut actor = Actor::new("Depth");
    let root = actor.add_node("Root", None, Transform::IDENTITY).unwrap();
    actor
        .add_node("Left", Some(root), Transform::from_translation(Vec3::new(1.0, 0.0, 0.0)))
        .unwrap();
    let spacer = actor.add_node("Spacer", Some(root), Transform::IDENTITY).unwrap();
    actor
        .add_node("Right", Some(spacer), Transform::from_translation(Vec3::new(-1.0, 0.0, 0.0)))
        .unwrap();

    assert_eq!(actor.find_best_mirror_match_for_node(1), None);
    assert_eq!(actor.find_best_mirror_match_for_node(3), None);
}

// ============================================================================
// Axis Detection
// ============================================================================

#[test]
fn mirrored_roots_detect_the_x_axis() {
    let mut actor = Actor::new("Roots");
    actor.add_node("L", None, Transform::from_translation(Vec3::new(1.0, 0.0, 0.0))).unwrap();
    actor.add_node("R", None, Transform::from_translation(Vec3::new(-1.0, 0.0, 0.0))).unwrap();
    actor.map_node_motion_source(0, 1);
    assert!(!actor.has_mirror_axes_detected());

    let fallbacks = actor.auto_detect_mirror_axes();

    assert!(fallbacks.is_empty());
    assert!(actor.has_mirror_axes_detected());
    for node in 0..2 {
        assert_eq!(actor.node_mirror_info(node).axis, Some(Axis::X));
        assert_eq!(actor.node_mirror_info(node).flags, MirrorFlags::empty());
    }
}

#[test]
fn symmetric_chain_detects_without_fallback() {
    let mut actor = symmetric_actor();
    actor.match_node_motion_sources("Left", "Right");
    let fallbacks = actor.auto_detect_mirror_axes();
    assert!(fallbacks.is_empty(), "{fallbacks:?}");
    assert!(actor.has_mirror_axes_detected());
}

#[test]
fn asymmetric_pair_reports_fallback() {
    init_logger();
    let mut actor = Actor::new("Asymmetric");
    actor.add_node("A", None, Transform::from_translation(Vec3::new(1.0, 0.0, 0.0))).unwrap();
    actor
        .add_node("B", None, Transform::from_translation(Vec3::new(-4.0, 7.0, 2.0)))
        .unwrap();
    actor.map_node_motion_source(0, 1);

    let fallbacks = actor.auto_detect_mirror_axes();

    assert_eq!(fallbacks.len(), 2);
    for fallback in &fallbacks {
        assert!(fallback.residual > EPSILON);
        let info = actor.node_mirror_info(fallback.node);
        assert_eq!(info.axis, Some(fallback.axis));
        assert_eq!(info.flags, fallback.flags);
    }
}

#[test]
fn looser_epsilon_accepts_small_asymmetry() {
    let mut settings = ActorSettings::default();
    settings.mirror_epsilon = 0.1;
    let mut actor = Actor::with_settings("Loose", settings);
    actor.add_node("L", None, Transform::from_translation(Vec3::new(1.0, 0.0, 0.0))).unwrap();
    actor.add_node("R", None, Transform::from_translation(Vec3::new(-1.01, 0.0, 0.0))).unwrap();
    actor.map_node_motion_source(0, 1);
    assert!(actor.auto_detect_mirror_axes().is_empty());
}

#[test]
fn post_create_detects_missing_axes() {
    let mut actor = symmetric_actor();
    actor.add_lod_level(false);
    actor.match_node_motion_sources("Left", "Right");
    actor.post_create_init();
    assert!(actor.has_mirror_axes_detected());
}

// ============================================================================
// Table Upkeep
// ============================================================================

#[test]
fn mirror_table_follows_node_edits() {
    let mut actor = symmetric_actor();
    actor.match_node_motion_sources("Left", "Right");

    let tail = actor.add_node("Tail", Some(0), Transform::IDENTITY).unwrap();
    assert_eq!(actor.node_mirror_info(tail).source_node, tail);

    // Removing Left Arm unpairs Right Arm and shifts the hands down.
    actor.remove_node(1);
    assert_eq!(actor.node_mirror_infos().len(), 5);
    assert_eq!(actor.node_mirror_info(2).source_node, 2);
    assert_eq!(actor.node_mirror_info(1).source_node, 3);
    assert_eq!(actor.node_mirror_info(3).source_node, 1);
    assert_eq!(actor.node_mirror_info(4).source_node, 4);
    assert!(actor.validate().is_ok());
}
