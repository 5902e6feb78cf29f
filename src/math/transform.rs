use std::ops::Mul;

use super::{Point3, Rotation3, Vector3, GIMBAL_TOLERANCE};

/// Builds the active rotation `Rx(a) · Ry(b) · Rz(c)` from `[a, b, c]` in radians.
#[must_use]
pub fn rotation_from_angles(angles: [f64; 3]) -> Rotation3 {
    let [a, b, c] = angles;
    Rotation3::from_axis_angle(&Vector3::x_axis(), a)
        * Rotation3::from_axis_angle(&Vector3::y_axis(), b)
        * Rotation3::from_axis_angle(&Vector3::z_axis(), c)
}

/// Decomposes a rotation into `[a, b, c]` such that
/// `rotation_from_angles([a, b, c])` reproduces it.
///
/// `b` lies in `[-π/2, π/2]`, `a` and `c` in `(-π, π]`. At gimbal lock
/// (`|cos b| < GIMBAL_TOLERANCE`) only `a ± c` is determined; `c` is pinned
/// to zero and the whole residual rotation goes into `a`.
#[must_use]
pub fn angles_from_rotation(rotation: &Rotation3) -> [f64; 3] {
    let m = rotation.matrix();
    let sin_b = m[(0, 2)].clamp(-1.0, 1.0);
    let cos_b = m[(0, 0)].hypot(m[(0, 1)]);
    let b = sin_b.atan2(cos_b);

    if cos_b < GIMBAL_TOLERANCE {
        let a = m[(2, 1)].atan2(m[(1, 1)]);
        return [a, b, 0.0];
    }

    let a = (-m[(1, 2)]).atan2(m[(2, 2)]);
    let c = (-m[(0, 1)]).atan2(m[(0, 0)]);
    [a, b, c]
}

/// A rigid transform: rotation followed by translation.
///
/// Maps a point `p` in the local frame to `R · p + t` in the parent frame.
/// Composition with `*` places a child frame inside a parent frame:
/// `parent * child` applies `child` first.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    rotation: Rotation3,
    translation: Vector3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform {
    /// The identity transform.
    #[must_use]
    pub fn identity() -> Self {
        Self {
            rotation: Rotation3::identity(),
            translation: Vector3::zeros(),
        }
    }

    /// Creates a transform from a rotation and a translation.
    #[must_use]
    pub fn new(rotation: Rotation3, translation: Vector3) -> Self {
        Self {
            rotation,
            translation,
        }
    }

    /// Pure translation.
    #[must_use]
    pub fn from_translation(x: f64, y: f64, z: f64) -> Self {
        Self::new(Rotation3::identity(), Vector3::new(x, y, z))
    }

    /// Active `x-y-z` angles (radians) plus a position in mm.
    #[must_use]
    pub fn from_angles(angles: [f64; 3], position: [f64; 3]) -> Self {
        Self::new(rotation_from_angles(angles), Vector3::from(position))
    }

    /// Angles in the interchange (GDML) convention, which describes the
    /// rotation of the frame rather than of the object.
    #[must_use]
    pub fn from_gdml(angles: [f64; 3], position: [f64; 3]) -> Self {
        let [a, b, c] = angles;
        Self::from_angles([-a, -b, -c], position)
    }

    /// Rotation about the fixed x, then y, then z axes (`Rz(c) · Ry(b) · Rx(a)`),
    /// the convention the detector drawings are dimensioned in.
    #[must_use]
    pub fn from_extrinsic(angles: [f64; 3], position: [f64; 3]) -> Self {
        let [a, b, c] = angles;
        Self::new(Rotation3::from_euler_angles(a, b, c), Vector3::from(position))
    }

    #[must_use]
    pub fn rotation(&self) -> &Rotation3 {
        &self.rotation
    }

    #[must_use]
    pub fn translation(&self) -> &Vector3 {
        &self.translation
    }

    /// Active `x-y-z` angles of the rotation part.
    #[must_use]
    pub fn angles(&self) -> [f64; 3] {
        angles_from_rotation(&self.rotation)
    }

    /// Rotation angles as written to GDML.
    #[must_use]
    pub fn gdml_angles(&self) -> [f64; 3] {
        self.angles().map(|v| 0.0 - v)
    }

    /// Translation as a plain array.
    #[must_use]
    pub fn position(&self) -> [f64; 3] {
        [self.translation.x, self.translation.y, self.translation.z]
    }

    /// Returns `self ∘ child`: the frame of `child`, given relative to
    /// `self`, expressed in the frame `self` is relative to.
    #[must_use]
    pub fn compose(&self, child: &Self) -> Self {
        Self {
            rotation: self.rotation * child.rotation,
            translation: self.rotation * child.translation + self.translation,
        }
    }

    /// The inverse transform.
    #[must_use]
    pub fn inverse(&self) -> Self {
        let rotation = self.rotation.inverse();
        Self {
            rotation,
            translation: -(rotation * self.translation),
        }
    }

    /// Maps a point from the local frame to the parent frame.
    #[must_use]
    pub fn apply(&self, point: &Point3) -> Point3 {
        self.rotation * point + self.translation
    }

    /// Component-wise comparison of rotation matrix and translation.
    #[must_use]
    pub fn approx_eq(&self, other: &Self, tolerance: f64) -> bool {
        let rot = (self.rotation.matrix() - other.rotation.matrix()).amax();
        let trans = (self.translation - other.translation).amax();
        rot <= tolerance && trans <= tolerance
    }

    #[must_use]
    pub fn is_identity(&self, tolerance: f64) -> bool {
        self.approx_eq(&Self::identity(), tolerance)
    }
}

impl Mul for Transform {
    type Output = Transform;

    fn mul(self, rhs: Transform) -> Transform {
        self.compose(&rhs)
    }
}

impl Mul<&Transform> for &Transform {
    type Output = Transform;

    fn mul(self, rhs: &Transform) -> Transform {
        self.compose(rhs)
    }
}
