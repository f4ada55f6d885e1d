//! Kinema Actor
//!
//! The [`Actor`] aggregate and everything built on top of it:
//!
//! - [`actor`]: identity, node management, transforms, materials, morph
//!   setups, node groups, dependencies, duplication and post-create init
//! - [`lod`]: LOD-indexed mesh and deformer stack storage
//! - [`lod_compat`]: skinning remapping for disabled skeletal LOD bones
//! - [`mirror`]: motion source pairing and mirror axis detection
//! - [`bounds`]: per-node OBBs and the static AABB
//! - [`scale`]: uniform scaling and unit conversion
//! - [`instance`]: transient runtime view used for bounds evaluation
//! - [`manager`]: registry of shared actors
//! - [`setup`], [`settings`]: shared physics/simulation setups and build options

pub mod actor;
pub mod bounds;
pub mod instance;
pub mod lod;
pub mod lod_compat;
pub mod manager;
pub mod mirror;
pub mod scale;
pub mod settings;
pub mod setup;

pub use actor::{Actor, Dependency, NodeInfo};
pub use instance::ActorInstance;
pub use lod::{LodLevel, MeshTotals, NodeLodInfo};
pub use manager::{ActorKey, ActorManager};
pub use mirror::{MirrorFallback, NodeMirrorInfo};
pub use settings::{ActorSettings, PostCreateOptions};
pub use setup::{
    ColliderConfig, ColliderShape, PhysicsSetup, SharedSetup, SimulatedJoint, SimulatedObject,
    SimulatedObjectSetup,
};
