//! Kinema
//!
//! Character actor data model: a skeleton with its bind pose, LOD-indexed
//! meshes and deformer stacks, mirror mapping, bounding volumes and unit
//! scaling.
//!
//! This crate re-exports the workspace members:
//!
//! - [`core`]: transforms, bounds, units and errors
//! - [`resources`]: meshes, skinning, deformers, materials and morph targets
//! - [`skeleton`]: nodes, skeletons, poses and node groups
//! - [`actor`]: the [`Actor`] aggregate, instances and the actor registry
//!
//! # Example
//!
//! ```rust,ignore
//! use kinema::{Actor, Transform};
//!
//! let mut actor = Actor::new("Hero");
//! let hips = actor.add_node("Hips", None, Transform::IDENTITY)?;
//! actor.add_node("Spine", Some(hips), Transform::from_translation(glam::Vec3::Y))?;
//! actor.add_lod_level(false);
//! actor.post_create_init();
//! ```

pub use glam;

pub use kinema_actor as actor;
pub use kinema_core as core;
pub use kinema_resources as resources;
pub use kinema_skeleton as skeleton;

pub use kinema_actor::{
    Actor, ActorInstance, ActorKey, ActorManager, ActorSettings, LodLevel, MeshTotals,
    MirrorFallback, NodeLodInfo, NodeMirrorInfo, PhysicsSetup, PostCreateOptions, SharedSetup,
    SimulatedObjectSetup,
};
pub use kinema_core::{
    Axis, BoundingBox, EPSILON, KinemaError, MirrorFlags, Obb, Result, Transform, UnitType,
    is_float_equal,
};
pub use kinema_resources::{
    DeformerType, DualQuatSkinDeformer, Material, Mesh, MeshDeformer, MeshDeformerStack,
    MorphDeformer, MorphSetup, MorphTarget, SkinningLayer, SoftSkinDeformer, SubMesh,
};
pub use kinema_skeleton::{MAX_SKELETAL_LODS, Node, NodeGroup, Pose, Skeleton};
