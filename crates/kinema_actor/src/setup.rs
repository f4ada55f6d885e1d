//! Physics and simulated object setups.
//!
//! Both setups are shared between an actor and its duplicates through
//! [`SharedSetup`], so edits made through one actor are visible to all of
//! them. The physics engine and the simulation consume these descriptions;
//! the actor only stores them and resolves node references.

use std::sync::Arc;

use kinema_skeleton::Skeleton;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Reference-counted, lockable setup handle.
pub type SharedSetup<T> = Arc<RwLock<T>>;

// ============================================================================
// Physics
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ColliderShape {
    Sphere { radius: f32 },
    Capsule { radius: f32, height: f32 },
    Box { half_extents: [f32; 3] },
}

/// A collider attached to a named node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColliderConfig {
    pub node_name: String,
    pub shape: ColliderShape,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhysicsSetup {
    pub colliders: Vec<ColliderConfig>,
}

impl PhysicsSetup {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_collider(&mut self, node_name: &str, shape: ColliderShape) {
        self.colliders.push(ColliderConfig {
            node_name: node_name.to_string(),
            shape,
        });
    }

    /// Colliders attached to the node with the given name.
    pub fn colliders_for_node<'a>(&'a self, node_name: &'a str) -> impl Iterator<Item = &'a ColliderConfig> {
        self.colliders.iter().filter(move |c| c.node_name == node_name)
    }
}

// ============================================================================
// Simulated Objects
// ============================================================================

/// A joint driven by the secondary motion simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulatedJoint {
    pub node_name: String,
    /// Resolved by [`SimulatedObjectSetup::init_after_load`].
    #[serde(skip)]
    pub node_index: Option<usize>,
    pub mass: f32,
    pub stiffness: f32,
    pub damping: f32,
}

impl SimulatedJoint {
    #[must_use]
    pub fn new(node_name: &str) -> Self {
        Self {
            node_name: node_name.to_string(),
            node_index: None,
            mass: 1.0,
            stiffness: 0.0,
            damping: 0.001,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulatedObject {
    pub name: String,
    pub joints: Vec<SimulatedJoint>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulatedObjectSetup {
    pub objects: Vec<SimulatedObject>,
}

impl SimulatedObjectSetup {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_object(&mut self, name: &str, joint_names: &[&str]) -> usize {
        self.objects.push(SimulatedObject {
            name: name.to_string(),
            joints: joint_names.iter().map(|n| SimulatedJoint::new(n)).collect(),
        });
        self.objects.len() - 1
    }

    /// Resolves joint node names against `skeleton`.
    ///
    /// Returns the number of joints that could not be resolved.
    pub fn init_after_load(&mut self, skeleton: &Skeleton) -> usize {
        let mut unresolved = 0;
        for object in &mut self.objects {
            for joint in &mut object.joints {
                joint.node_index = skeleton.find_node_by_name(&joint.node_name);
                if joint.node_index.is_none() {
                    unresolved += 1;
                    log::warn!(
                        "Simulated object '{}' references missing joint '{}'",
                        object.name,
                        joint.node_name
                    );
                }
            }
        }
        unresolved
    }
}
