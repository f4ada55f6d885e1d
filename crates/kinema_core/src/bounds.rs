//! Bounding Volumes
//!
//! - [`BoundingBox`]: axis-aligned box used for actor static bounds
//! - [`Obb`]: oriented box used for per-node bind pose bounds
//!
//! Both volumes have an explicit "reset" state that is distinct from any box
//! fitted to real data, so lazily computed bounds can tell whether they have
//! been evaluated yet.

use glam::{Mat3, Quat, Vec3};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: Vec3,
    pub max: Vec3,
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::RESET
    }
}

impl BoundingBox {
    /// The empty box: min at +inf, max at -inf. Adding any point makes it valid.
    pub const RESET: Self = Self {
        min: Vec3::INFINITY,
        max: Vec3::NEG_INFINITY,
    };

    /// Fits a box around the given points. Returns the reset box for an empty slice.
    #[must_use]
    pub fn from_points(points: &[Vec3]) -> Self {
        let mut bb = Self::RESET;
        for &p in points {
            bb.add_point(p);
        }
        bb
    }

    /// `true` once at least one point has been added.
    #[inline]
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.min.cmple(self.max).all()
    }

    #[inline]
    pub fn reset(&mut self) {
        *self = Self::RESET;
    }

    #[inline]
    pub fn add_point(&mut self, point: Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    /// Scales both corners around the origin.
    pub fn scale(&mut self, factor: f32) {
        if !self.is_valid() {
            return;
        }
        self.min *= factor;
        self.max *= factor;
        if factor < 0.0 {
            std::mem::swap(&mut self.min, &mut self.max);
        }
    }
}

/// Oriented bounding box.
///
/// `extents` are half sizes along the local axes given by `rotation`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Obb {
    pub center: Vec3,
    pub extents: Vec3,
    pub rotation: Quat,
}

impl Default for Obb {
    fn default() -> Self {
        Self::RESET
    }
}

impl Obb {
    /// The empty box. All components are finite; negative extents mark it invalid.
    pub const RESET: Self = Self {
        center: Vec3::ZERO,
        extents: Vec3::NEG_ONE,
        rotation: Quat::IDENTITY,
    };

    #[must_use]
    pub fn new(center: Vec3, extents: Vec3, rotation: Quat) -> Self {
        Self {
            center,
            extents,
            rotation,
        }
    }

    #[inline]
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.extents.min_element() >= 0.0
    }

    #[inline]
    pub fn reset(&mut self) {
        *self = Self::RESET;
    }

    /// Scales the box around the model origin.
    pub fn scale(&mut self, factor: f32) {
        self.center *= factor;
        self.extents *= factor;
    }

    /// Tests whether a point lies inside the box (boundary inclusive, with tolerance).
    #[must_use]
    pub fn contains(&self, point: Vec3, tolerance: f32) -> bool {
        if !self.is_valid() {
            return false;
        }
        let local = self.rotation.inverse() * (point - self.center);
        local.abs().cmple(self.extents + Vec3::splat(tolerance)).all()
    }

    #[must_use]
    pub fn volume(&self) -> f32 {
        if !self.is_valid() {
            return 0.0;
        }
        let size = self.extents * 2.0;
        size.x * size.y * size.z
    }

    /// Fits an oriented box around a point cloud.
    ///
    /// Two candidate frames are evaluated: the principal axes of the point
    /// covariance and the identity frame. The one with the smaller volume wins.
    /// An empty slice yields [`Obb::RESET`].
    #[must_use]
    pub fn from_points(points: &[Vec3]) -> Self {
        if points.is_empty() {
            return Self::RESET;
        }

        let count = points.len() as f32;
        let mean = points.iter().copied().sum::<Vec3>() / count;

        let mut covariance = [[0.0_f32; 3]; 3];
        for p in points {
            let d = (*p - mean).to_array();
            for (r, row) in covariance.iter_mut().enumerate() {
                for (c, value) in row.iter_mut().enumerate() {
                    *value += d[r] * d[c];
                }
            }
        }
        for row in &mut covariance {
            for value in row.iter_mut() {
                *value /= count;
            }
        }

        let principal = Self::fit_in_frame(points, symmetric_eigenvectors(covariance));
        let aligned = Self::fit_in_frame(points, Mat3::IDENTITY);

        if aligned.volume() <= principal.volume() {
            aligned
        } else {
            principal
        }
    }

    fn fit_in_frame(points: &[Vec3], axes: Mat3) -> Self {
        let to_local = axes.transpose();
        let mut min = Vec3::INFINITY;
        let mut max = Vec3::NEG_INFINITY;
        for &p in points {
            let local = to_local * p;
            min = min.min(local);
            max = max.max(local);
        }

        let local_center = (min + max) * 0.5;
        Self {
            center: axes * local_center,
            extents: (max - min) * 0.5,
            rotation: Quat::from_mat3(&axes).normalize(),
        }
    }
}

/// Cyclic Jacobi eigen solver for a symmetric 3x3 matrix.
///
/// Returns the eigenvectors as the columns of a proper rotation matrix.
fn symmetric_eigenvectors(mut a: [[f32; 3]; 3]) -> Mat3 {
    let mut v = [[1.0_f32, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];

    for _ in 0..32 {
        let off_diagonal = a[0][1].abs() + a[0][2].abs() + a[1][2].abs();
        if off_diagonal < 1e-9 {
            break;
        }

        for (p, q) in [(0, 1), (0, 2), (1, 2)] {
            if a[p][q].abs() < 1e-12 {
                continue;
            }

            let theta = (a[q][q] - a[p][p]) / (2.0 * a[p][q]);
            let t = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
            let c = 1.0 / (t * t + 1.0).sqrt();
            let s = t * c;

            for row in &mut a {
                let (akp, akq) = (row[p], row[q]);
                row[p] = c * akp - s * akq;
                row[q] = s * akp + c * akq;
            }
            for k in 0..3 {
                let (apk, aqk) = (a[p][k], a[q][k]);
                a[p][k] = c * apk - s * aqk;
                a[q][k] = s * apk + c * aqk;
            }
            for row in &mut v {
                let (vkp, vkq) = (row[p], row[q]);
                row[p] = c * vkp - s * vkq;
                row[q] = s * vkp + c * vkq;
            }
        }
    }

    Mat3::from_cols(
        Vec3::new(v[0][0], v[1][0], v[2][0]),
        Vec3::new(v[0][1], v[1][1], v[2][1]),
        Vec3::new(v[0][2], v[1][2], v[2][2]),
    )
}
