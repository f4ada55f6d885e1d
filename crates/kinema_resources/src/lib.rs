//! Kinema Resources
//!
//! Per-node geometry owned by an actor's LOD levels:
//!
//! - [`mesh`]: [`Mesh`] and [`SubMesh`]
//! - [`skinning`]: per original vertex bone influences
//! - [`deformer`]: the [`MeshDeformer`] trait and [`MeshDeformerStack`]
//! - [`deformers`]: linear, dual quaternion and morph deformers
//! - [`material`], [`morph`]: per-LOD materials and morph targets

pub mod deformer;
pub mod deformers;
pub mod material;
pub mod mesh;
pub mod morph;
pub mod skinning;

pub use deformer::{DeformContext, DeformerContext, DeformerType, MeshDeformer, MeshDeformerStack};
pub use deformers::{DualQuatSkinDeformer, MorphDeformer, SoftSkinDeformer};
pub use material::Material;
pub use mesh::{Mesh, SubMesh};
pub use morph::{MorphDeformData, MorphSetup, MorphTarget, VertexDelta};
pub use skinning::{InfluenceList, SkinInfluence, SkinningLayer};
