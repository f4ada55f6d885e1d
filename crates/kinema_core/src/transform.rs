use std::ops::Mul;

use bitflags::bitflags;
use glam::{Affine3A, EulerRot, Quat, Vec3};
use serde::{Deserialize, Serialize};

bitflags! {
    /// Extra per-node corrections applied after mirroring a transform.
    ///
    /// Each flag flips the sign of the rotation's `w` and the named rotation
    /// component, together with the two position components perpendicular to
    /// that axis (a half turn around the axis).
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct MirrorFlags: u8 {
        const INVERT_X = 1 << 0;
        const INVERT_Y = 1 << 1;
        const INVERT_Z = 1 << 2;
    }
}

/// A coordinate axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    /// Unit vector along this axis.
    #[inline]
    #[must_use]
    pub fn unit(self) -> Vec3 {
        match self {
            Axis::X => Vec3::X,
            Axis::Y => Vec3::Y,
            Axis::Z => Vec3::Z,
        }
    }

    /// The mirror flag that inverts this axis.
    #[inline]
    #[must_use]
    pub fn invert_flag(self) -> MirrorFlags {
        match self {
            Axis::X => MirrorFlags::INVERT_X,
            Axis::Y => MirrorFlags::INVERT_Y,
            Axis::Z => MirrorFlags::INVERT_Z,
        }
    }
}

/// Reflects `v` over the plane through the origin with unit normal `normal`.
#[inline]
#[must_use]
pub fn mirror_vector(v: Vec3, normal: Vec3) -> Vec3 {
    v - 2.0 * v.dot(normal) * normal
}

/// Translation / rotation / scale transform.
///
/// Composition follows the column-vector convention: `parent * child`
/// applies `child` first. Model-space transforms are therefore built as
/// `model(parent) * local(node)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Transform {
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    #[inline]
    #[must_use]
    pub fn new(position: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self {
            position,
            rotation,
            scale,
        }
    }

    #[inline]
    #[must_use]
    pub fn from_translation(position: Vec3) -> Self {
        Self {
            position,
            ..Self::IDENTITY
        }
    }

    #[inline]
    #[must_use]
    pub fn from_rotation_translation(rotation: Quat, position: Vec3) -> Self {
        Self {
            position,
            rotation,
            scale: Vec3::ONE,
        }
    }

    /// Builds a rotation from XYZ euler angles in radians.
    #[must_use]
    pub fn from_euler_translation(x: f32, y: f32, z: f32, position: Vec3) -> Self {
        Self::from_rotation_translation(Quat::from_euler(EulerRot::XYZ, x, y, z), position)
    }

    /// Transforms a point (scale, then rotation, then translation).
    #[inline]
    #[must_use]
    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        self.rotation * (point * self.scale) + self.position
    }

    /// Transforms a direction (no translation).
    #[inline]
    #[must_use]
    pub fn transform_vector(&self, vector: Vec3) -> Vec3 {
        self.rotation * (vector * self.scale)
    }

    /// Returns the inverse transform.
    ///
    /// Exact for uniform scale; with non-uniform scale the result is the usual
    /// TRS approximation. Use [`Transform::to_affine`] when an exact inverse of
    /// a sheared result is needed.
    #[must_use]
    pub fn inverse(&self) -> Self {
        let inv_rotation = self.rotation.inverse();
        let inv_scale = self.scale.recip();
        Self {
            position: (inv_rotation * -self.position) * inv_scale,
            rotation: inv_rotation,
            scale: inv_scale,
        }
    }

    #[inline]
    #[must_use]
    pub fn to_affine(&self) -> Affine3A {
        Affine3A::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }

    /// Decomposes an affine matrix. Shear is lost.
    #[must_use]
    pub fn from_affine(affine: &Affine3A) -> Self {
        let (scale, rotation, position) = affine.to_scale_rotation_translation();
        Self {
            position,
            rotation,
            scale,
        }
    }

    /// Returns this transform reflected over the plane with the given normal.
    #[must_use]
    pub fn mirrored(&self, plane_normal: Vec3) -> Self {
        let mut result = *self;
        result.mirror(plane_normal);
        result
    }

    /// Reflects this transform over the plane through the origin with unit
    /// normal `plane_normal`. Scale is unchanged.
    pub fn mirror(&mut self, plane_normal: Vec3) {
        self.position = mirror_vector(self.position, plane_normal);

        let axis = Vec3::new(self.rotation.x, self.rotation.y, self.rotation.z);
        let mirrored = mirror_vector(axis, plane_normal);
        self.rotation = Quat::from_xyzw(mirrored.x, mirrored.y, mirrored.z, -self.rotation.w);
    }

    /// Mirrors over `plane_normal` and then applies the given flag corrections.
    pub fn mirror_with_flags(&mut self, plane_normal: Vec3, flags: MirrorFlags) {
        self.mirror(plane_normal);
        self.apply_mirror_flags(flags);
    }

    /// Applies the half-turn corrections described by `flags`.
    pub fn apply_mirror_flags(&mut self, flags: MirrorFlags) {
        if flags.is_empty() {
            return;
        }

        let [mut x, mut y, mut z, mut w] = self.rotation.to_array();
        for axis in Axis::ALL {
            if !flags.contains(axis.invert_flag()) {
                continue;
            }
            w = -w;
            match axis {
                Axis::X => {
                    x = -x;
                    self.position.y = -self.position.y;
                    self.position.z = -self.position.z;
                }
                Axis::Y => {
                    y = -y;
                    self.position.x = -self.position.x;
                    self.position.z = -self.position.z;
                }
                Axis::Z => {
                    z = -z;
                    self.position.x = -self.position.x;
                    self.position.y = -self.position.y;
                }
            }
        }
        self.rotation = Quat::from_xyzw(x, y, z, w);
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul for Transform {
    type Output = Transform;

    /// `self` is the outer (parent) transform, `child` is applied first.
    fn mul(self, child: Transform) -> Transform {
        Transform {
            position: self.rotation * (child.position * self.scale) + self.position,
            rotation: (self.rotation * child.rotation).normalize(),
            scale: self.scale * child.scale,
        }
    }
}

impl From<Transform> for Affine3A {
    fn from(t: Transform) -> Self {
        t.to_affine()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-5;

    fn vec3_approx(a: Vec3, b: Vec3) -> bool {
        (a - b).abs().max_element() < EPSILON
    }

    #[test]
    fn compose_matches_affine() {
        let parent = Transform::new(
            Vec3::new(1.0, 2.0, 3.0),
            Quat::from_rotation_y(0.7),
            Vec3::splat(2.0),
        );
        let child = Transform::from_euler_translation(0.1, 0.2, 0.3, Vec3::new(-1.0, 0.5, 4.0));

        let composed = (parent * child).to_affine();
        let expected = parent.to_affine() * child.to_affine();
        let p = Vec3::new(0.3, -0.2, 0.9);
        assert!(vec3_approx(
            composed.transform_point3(p),
            expected.transform_point3(p)
        ));
    }

    #[test]
    fn inverse_round_trip() {
        let t = Transform::new(
            Vec3::new(4.0, -2.0, 1.0),
            Quat::from_rotation_z(1.2),
            Vec3::splat(0.5),
        );
        let p = Vec3::new(1.0, 2.0, 3.0);
        assert!(vec3_approx(t.inverse().transform_point(t.transform_point(p)), p));
    }

    #[test]
    fn mirror_over_x_plane_flips_position_and_rotation() {
        let t = Transform::from_rotation_translation(Quat::from_rotation_y(0.5), Vec3::new(2.0, 1.0, 0.0));
        let m = t.mirrored(Vec3::X);
        assert!(vec3_approx(m.position, Vec3::new(-2.0, 1.0, 0.0)));

        // A rotation around Y reverses direction when mirrored over the X plane.
        let expected = Quat::from_rotation_y(-0.5);
        assert!(m.rotation.dot(expected).abs() > 1.0 - EPSILON);
    }

    #[test]
    fn mirror_twice_is_identity() {
        let t = Transform::from_euler_translation(0.3, -0.4, 0.8, Vec3::new(1.0, 2.0, 3.0));
        let back = t.mirrored(Vec3::Z).mirrored(Vec3::Z);
        assert!(vec3_approx(back.position, t.position));
        assert!(back.rotation.dot(t.rotation).abs() > 1.0 - EPSILON);
    }
}
