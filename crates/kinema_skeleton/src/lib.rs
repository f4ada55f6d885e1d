//! Kinema Skeleton
//!
//! The node hierarchy of an actor:
//!
//! - [`Node`]: a joint with its parent/child links and skeletal LOD mask
//! - [`Skeleton`]: dense node array, root list and bind pose
//! - [`Pose`]: local transforms with a lazily evaluated model space cache
//! - [`NodeGroup`]: named node sets

pub mod node;
pub mod node_group;
pub mod pose;
pub mod skeleton;

pub use node::{MAX_SKELETAL_LODS, Node};
pub use node_group::NodeGroup;
pub use pose::Pose;
pub use skeleton::Skeleton;
