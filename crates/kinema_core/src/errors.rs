//! Error Types
//!
//! This module defines the error types used throughout Kinema.
//!
//! # Overview
//!
//! Most actor operations follow a log-and-degrade policy: lookups that can
//! legitimately miss return `Option`, integrity problems are logged and the
//! operation continues with a safe result, and out-of-range indices panic.
//! [`KinemaError`] covers the remaining failure modes where the caller has to
//! decide what to do:
//! - Hierarchy construction with an invalid parent
//! - Name based lookups exposed as fallible operations
//! - Structural invariant validation
//! - Configuration and unit parsing
//!
//! # Usage
//!
//! ```rust,ignore
//! use kinema_core::errors::{KinemaError, Result};
//!
//! fn find_hand(actor: &Actor) -> Result<usize> {
//!     actor.skeleton().find_node_by_name("Hand").ok_or_else(|| KinemaError::NodeNotFound("Hand".into()))
//! }
//! ```

use thiserror::Error;

/// The main error type for Kinema.
#[derive(Error, Debug)]
pub enum KinemaError {
    // ========================================================================
    // Hierarchy Errors
    // ========================================================================
    /// No node with the given name exists in the skeleton.
    #[error("Node not found: {0}")]
    NodeNotFound(String),

    /// The parent index passed when adding a node does not exist.
    #[error("Invalid parent index {parent} (skeleton has {num_nodes} nodes)")]
    InvalidParent {
        /// The rejected parent index
        parent: usize,
        /// Number of nodes at the time of the call
        num_nodes: usize,
    },

    // ========================================================================
    // Integrity Errors
    // ========================================================================
    /// A LOD level index was outside the LOD array.
    #[error("LOD level out of range: {lod} (actor has {num_lods} LOD levels)")]
    LodOutOfRange {
        /// The rejected LOD index
        lod: usize,
        /// Number of LOD levels
        num_lods: usize,
    },

    /// A per-node array is out of sync with the skeleton.
    #[error("Node count mismatch in {context}: expected {expected}, found {found}")]
    NodeCountMismatch {
        /// Which array was inspected
        context: String,
        /// Number of nodes in the skeleton
        expected: usize,
        /// Length of the inspected array
        found: usize,
    },

    /// The hierarchy links are inconsistent (parent/child mismatch, cycles, bad roots).
    #[error("Broken hierarchy: {0}")]
    BrokenHierarchy(String),

    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// A unit type name could not be parsed.
    #[error("Unknown unit type: {0}")]
    UnknownUnitType(String),

    /// JSON parsing error.
    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Alias for `Result<T, KinemaError>`.
pub type Result<T> = std::result::Result<T, KinemaError>;
