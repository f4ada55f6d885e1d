use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use glam::Vec3;
use kinema::{
    Actor, ActorSettings, Mesh, MeshDeformerStack, SkinningLayer, SoftSkinDeformer, SubMesh,
    Transform,
};

const NUM_BONES: usize = 64;
const NUM_VERTICES: usize = 4096;

/// Two mirrored arm chains under a root with a mesh skinned across all bones.
/// Every other bone is disabled in skeletal LOD 1.
fn build_actor() -> Actor {
    let mut settings = ActorSettings::default();
    settings.post_create.make_geom_lods_compatible = false;
    let mut actor = Actor::with_settings("Bench", settings);
    actor.add_node("Root", None, Transform::IDENTITY).unwrap();

    for side in ["Left", "Right"] {
        let sign = if side == "Left" { 1.0 } else { -1.0 };
        let mut parent = 0;
        for i in 0..NUM_BONES / 2 {
            let local = Transform::from_translation(Vec3::new(sign * 0.1, 0.05, 0.0));
            parent = actor.add_node(&format!("{side} Bone {i}"), Some(parent), local).unwrap();
            if i % 2 == 1 {
                actor.set_skeletal_lod_status(parent, 1, false);
            }
        }
    }

    actor.add_lod_level(false);
    let num_nodes = actor.num_nodes();
    let mut layer = SkinningLayer::new(NUM_VERTICES);
    let positions = (0..NUM_VERTICES)
        .map(|v| {
            layer.add_influence(v, v % num_nodes, 0.6);
            layer.add_influence(v, (v * 7 + 3) % num_nodes, 0.4);
            Vec3::new((v % 64) as f32 * 0.05 - 1.6, (v / 64) as f32 * 0.05, 0.0)
        })
        .collect();
    let indices = (0..NUM_VERTICES as u32 - 2).flat_map(|i| [i, i + 1, i + 2]).collect::<Vec<_>>();
    let num_indices = indices.len() as u32;
    let mesh = Mesh::new(positions, indices)
        .with_skinning(layer)
        .with_submesh(SubMesh::new(0, NUM_VERTICES as u32, 0, num_indices, 0));
    actor.set_mesh(0, 0, Some(mesh));
    actor.set_mesh_deformer_stack(0, 0, Some(MeshDeformerStack::new().with_deformer(SoftSkinDeformer::new())));
    actor.add_material(0, kinema::Material::default());
    actor.add_lod_level(true);
    actor
}

fn bench_actor(c: &mut Criterion) {
    let template = build_actor();

    c.bench_function("post_create_init", |b| {
        b.iter_batched(
            || template.duplicate(),
            |mut actor| {
                actor.post_create_init();
                black_box(actor)
            },
            criterion::BatchSize::LargeInput,
        );
    });

    c.bench_function("make_geom_lods_compatible", |b| {
        b.iter_batched(
            || template.duplicate(),
            |mut actor| black_box(actor.make_geom_lods_compatible_with_skeletal_lods()),
            criterion::BatchSize::LargeInput,
        );
    });

    c.bench_function("mirror_match_and_detect", |b| {
        b.iter_batched(
            || template.duplicate(),
            |mut actor| {
                actor.match_node_motion_sources("Left", "Right");
                black_box(actor.auto_detect_mirror_axes())
            },
            criterion::BatchSize::LargeInput,
        );
    });

    c.bench_function("duplicate", |b| b.iter(|| black_box(template.duplicate())));
}

criterion_group!(benches, bench_actor);
criterion_main!(benches);
