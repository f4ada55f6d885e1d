//! Built-in mesh deformers.

pub mod morph;
pub mod skin;

pub use morph::MorphDeformer;
pub use skin::{DualQuatSkinDeformer, SoftSkinDeformer};
