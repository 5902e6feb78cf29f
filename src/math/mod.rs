pub mod transform;
pub mod units;

pub use transform::{angles_from_rotation, rotation_from_angles, Transform};
pub use units::{AngleUnit, LengthUnit};

/// 3D point type.
pub type Point3 = nalgebra::Point3<f64>;

/// 3D vector type.
pub type Vector3 = nalgebra::Vector3<f64>;

/// 3x3 matrix type.
pub type Matrix3 = nalgebra::Matrix3<f64>;

/// Proper rotation in 3D.
pub type Rotation3 = nalgebra::Rotation3<f64>;

/// Global geometric tolerance for floating-point comparisons.
pub const TOLERANCE: f64 = 1e-10;

/// Below this `|cos(b)|` the middle angle of an `x-y-z` decomposition is
/// treated as `±π/2` and the first/last angles are no longer independent.
pub const GIMBAL_TOLERANCE: f64 = 1e-9;
