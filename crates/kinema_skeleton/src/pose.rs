use kinema_core::Transform;

/// Local and model space transforms for every node of a skeleton, plus
/// morph target weights.
///
/// Local transforms are authoritative. Model space transforms are derived on
/// demand and cached until a local transform or the hierarchy changes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pose {
    locals: Vec<Transform>,
    parents: Vec<Option<usize>>,

    // === Model Space Cache ===
    models: Vec<Transform>,
    model_ready: Vec<bool>,

    morph_weights: Vec<f32>,
}

impl Pose {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub fn num_transforms(&self) -> usize {
        self.locals.len()
    }

    pub(crate) fn push_transform(&mut self, parent: Option<usize>, local: Transform) {
        self.locals.push(local);
        self.parents.push(parent);
        self.models.push(Transform::IDENTITY);
        self.model_ready.push(false);
    }

    pub(crate) fn remove_transform(&mut self, index: usize) {
        self.locals.remove(index);
        self.parents.remove(index);
        self.models.remove(index);
        self.model_ready.remove(index);
        self.invalidate_model_space();
    }

    pub(crate) fn set_parents(&mut self, parents: impl IntoIterator<Item = Option<usize>>) {
        self.parents.clear();
        self.parents.extend(parents);
        debug_assert_eq!(self.parents.len(), self.locals.len());
        self.invalidate_model_space();
    }

    pub(crate) fn clear(&mut self) {
        self.locals.clear();
        self.parents.clear();
        self.models.clear();
        self.model_ready.clear();
    }

    #[inline]
    #[must_use]
    pub fn local_space_transform(&self, index: usize) -> &Transform {
        &self.locals[index]
    }

    #[inline]
    #[must_use]
    pub fn local_space_transforms(&self) -> &[Transform] {
        &self.locals
    }

    /// Replaces a local transform and invalidates the model space cache.
    pub fn set_local_space_transform(&mut self, index: usize, transform: Transform) {
        self.locals[index] = transform;
        self.invalidate_model_space();
    }

    /// Copies local transforms and morph weights from a pose of equal size.
    ///
    /// # Panics
    /// If the transform counts differ.
    pub fn copy_from(&mut self, other: &Pose) {
        assert_eq!(
            self.locals.len(),
            other.locals.len(),
            "poses must have the same number of transforms"
        );
        self.locals.copy_from_slice(&other.locals);
        self.morph_weights.clone_from(&other.morph_weights);
        self.invalidate_model_space();
    }

    pub fn invalidate_model_space(&mut self) {
        self.model_ready.fill(false);
    }

    /// Model space transform of a node, computing and caching it (and its
    /// ancestors) when needed.
    pub fn model_space_transform(&mut self, index: usize) -> Transform {
        if self.model_ready[index] {
            return self.models[index];
        }

        // Walk up to the first cached ancestor, then resolve back down.
        let mut chain = vec![index];
        let mut current = index;
        while let Some(parent) = self.parents[current] {
            if self.model_ready[parent] {
                break;
            }
            chain.push(parent);
            current = parent;
        }

        for &node in chain.iter().rev() {
            let model = match self.parents[node] {
                Some(parent) => self.models[parent] * self.locals[node],
                None => self.locals[node],
            };
            self.models[node] = model;
            self.model_ready[node] = true;
        }
        self.models[index]
    }

    /// Model space transform of a node without touching the cache.
    #[must_use]
    pub fn calc_model_space_transform(&self, index: usize) -> Transform {
        let mut result = self.locals[index];
        let mut current = index;
        while let Some(parent) = self.parents[current] {
            result = self.locals[parent] * result;
            current = parent;
        }
        result
    }

    /// Recomputes every model space transform.
    pub fn force_update_full_model_space_pose(&mut self) {
        self.invalidate_model_space();
        for index in 0..self.locals.len() {
            self.model_space_transform(index);
        }
    }

    /// All model space transforms, valid after
    /// [`Pose::force_update_full_model_space_pose`].
    #[inline]
    #[must_use]
    pub fn model_space_transforms(&self) -> &[Transform] {
        debug_assert!(self.model_ready.iter().all(|&ready| ready));
        &self.models
    }

    /// Multiplies every local translation by `factor`.
    pub fn scale_translations(&mut self, factor: f32) {
        for local in &mut self.locals {
            local.position *= factor;
        }
        self.invalidate_model_space();
    }

    // ========================================================================
    // Morph Weights
    // ========================================================================

    #[inline]
    #[must_use]
    pub fn num_morph_weights(&self) -> usize {
        self.morph_weights.len()
    }

    /// Resizes the morph weight array. New weights start at zero.
    pub fn resize_num_morphs(&mut self, count: usize) {
        self.morph_weights.resize(count, 0.0);
    }

    #[inline]
    #[must_use]
    pub fn morph_weight(&self, index: usize) -> f32 {
        self.morph_weights[index]
    }

    #[inline]
    pub fn set_morph_weight(&mut self, index: usize, weight: f32) {
        self.morph_weights[index] = weight;
    }

    #[inline]
    #[must_use]
    pub fn morph_weights(&self) -> &[f32] {
        &self.morph_weights
    }

    pub fn zero_morph_weights(&mut self) {
        self.morph_weights.fill(0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Quat, Vec3};

    fn chain() -> Pose {
        let mut pose = Pose::new();
        pose.push_transform(None, Transform::from_translation(Vec3::new(0.0, 1.0, 0.0)));
        pose.push_transform(
            Some(0),
            Transform::from_rotation_translation(Quat::from_rotation_z(std::f32::consts::FRAC_PI_2), Vec3::X),
        );
        pose.push_transform(Some(1), Transform::from_translation(Vec3::X));
        pose
    }

    #[test]
    fn lazy_and_uncached_model_transforms_agree() {
        let mut pose = chain();
        let uncached = pose.calc_model_space_transform(2);
        let cached = pose.model_space_transform(2);
        assert!((uncached.position - cached.position).length() < 1e-5);
        // Child offset along X is rotated onto Y by the middle joint.
        assert!((cached.position - Vec3::new(1.0, 2.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn local_edit_invalidates_cache() {
        let mut pose = chain();
        pose.force_update_full_model_space_pose();
        pose.set_local_space_transform(0, Transform::IDENTITY);
        let model = pose.model_space_transform(2);
        assert!((model.position - Vec3::new(1.0, 1.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn morph_weights_resize_with_zeroes() {
        let mut pose = Pose::new();
        pose.resize_num_morphs(2);
        pose.set_morph_weight(1, 0.5);
        pose.resize_num_morphs(3);
        assert_eq!(pose.morph_weights(), &[0.0, 0.5, 0.0]);
        pose.zero_morph_weights();
        assert_eq!(pose.morph_weight(1), 0.0);
    }
}
