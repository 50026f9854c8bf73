// End-effector target poses.
//
// Orientation is given as Euler angles applied X first, then Y, then Z,
// before the translation. In column-vector form the target frame is
// `T(p) · Rz · Ry · Rx`, which is what `UnitQuaternion::from_euler_angles`
// builds from `(roll, pitch, yaw)`.

use nalgebra::{Isometry3, RealField, Rotation3, Translation3, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

use crate::angle::{to_degrees, to_radians};

/// Target position and orientation of the tool tip.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose<T: RealField = f64> {
    pub position: Vector3<T>,
    pub orientation: UnitQuaternion<T>,
}

impl<T: RealField + Copy> Pose<T> {
    pub fn new(position: Vector3<T>, orientation: UnitQuaternion<T>) -> Self {
        Self {
            position,
            orientation,
        }
    }

    /// Build a pose from Euler angles in radians, `[about x, about y, about z]`.
    pub fn from_euler(position: Vector3<T>, euler: Vector3<T>) -> Self {
        Self::new(
            position,
            UnitQuaternion::from_euler_angles(euler.x, euler.y, euler.z),
        )
    }

    /// Build a pose from Euler angles in degrees.
    pub fn from_euler_degrees(position: Vector3<T>, euler_degrees: Vector3<T>) -> Self {
        Self::from_euler(position, euler_degrees.map(to_radians))
    }

    /// Euler angles in radians, `[about x, about y, about z]`.
    pub fn euler_angles(&self) -> Vector3<T> {
        let (roll, pitch, yaw) = self.orientation.euler_angles();
        Vector3::new(roll, pitch, yaw)
    }

    pub fn euler_angles_degrees(&self) -> Vector3<T> {
        self.euler_angles().map(to_degrees)
    }

    pub fn rotation(&self) -> Rotation3<T> {
        self.orientation.to_rotation_matrix()
    }

    pub fn to_isometry(&self) -> Isometry3<T> {
        Isometry3::from_parts(Translation3::from(self.position), self.orientation)
    }

    /// Linear interpolation of the position and shortest-arc spherical
    /// interpolation of the orientation. `t` is not clamped.
    pub fn interpolate(&self, other: &Self, t: T) -> Self {
        let position = self.position.lerp(&other.position, t);
        let orientation = slerp_shortest(&self.orientation, &other.orientation, t);
        Self::new(position, orientation)
    }
}

impl<T: RealField + Copy> From<Isometry3<T>> for Pose<T> {
    fn from(iso: Isometry3<T>) -> Self {
        Self::new(iso.translation.vector, iso.rotation)
    }
}

impl<T: RealField + Copy> From<Pose<T>> for Isometry3<T> {
    fn from(pose: Pose<T>) -> Self {
        pose.to_isometry()
    }
}

/// `q` and `-q` are the same rotation; pick the representative of `to` on
/// the same hemisphere as `from` so the interpolation takes the short way.
fn slerp_shortest<T: RealField + Copy>(
    from: &UnitQuaternion<T>,
    to: &UnitQuaternion<T>,
    t: T,
) -> UnitQuaternion<T> {
    let to = if from.coords.dot(&to.coords) < T::zero() {
        UnitQuaternion::new_unchecked(-to.into_inner())
    } else {
        *to
    };
    from.try_slerp(&to, t, T::default_epsilon())
        .unwrap_or_else(|| from.nlerp(&to, t))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_euler_order_x_then_y_then_z() {
        let pose = Pose::from_euler(Vector3::zeros(), Vector3::new(0.3, -0.2, 0.9));
        let expected = Rotation3::from_axis_angle(&Vector3::z_axis(), 0.9)
            * Rotation3::from_axis_angle(&Vector3::y_axis(), -0.2)
            * Rotation3::from_axis_angle(&Vector3::x_axis(), 0.3);
        assert_relative_eq!(pose.rotation().matrix(), expected.matrix(), epsilon = 1e-12);
    }

    #[test]
    fn test_degrees_roundtrip() {
        let pose = Pose::from_euler_degrees(Vector3::new(1.0, 2.0, 3.0), Vector3::new(10.0, 20.0, 30.0));
        assert_relative_eq!(pose.euler_angles_degrees(), Vector3::new(10.0, 20.0, 30.0), epsilon = 1e-9);
    }

    #[test]
    fn test_interpolation_endpoints_and_midpoint() {
        let start = Pose::from_euler(Vector3::new(0.0, 0.0, 0.0), Vector3::zeros());
        let end = Pose::from_euler(Vector3::new(2.0, 4.0, -2.0), Vector3::new(0.0, 0.0, FRAC_PI_2));

        let mid = start.interpolate(&end, 0.5);
        assert_relative_eq!(mid.position, Vector3::new(1.0, 2.0, -1.0), epsilon = 1e-12);
        assert_relative_eq!(mid.euler_angles().z, FRAC_PI_2 / 2.0, epsilon = 1e-9);

        let at_end = start.interpolate(&end, 1.0);
        assert_relative_eq!(at_end.orientation.angle_to(&end.orientation), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_interpolation_takes_short_way() {
        let start = UnitQuaternion::from_euler_angles(0.0, 0.0, 0.1);
        let end = UnitQuaternion::from_euler_angles(0.0, 0.0, -0.1);
        // Same rotation, opposite hemisphere.
        let end_flipped = UnitQuaternion::new_unchecked(-end.into_inner());

        let a = Pose::new(Vector3::zeros(), start);
        let b = Pose::new(Vector3::zeros(), end_flipped);
        let mid = a.interpolate(&b, 0.5);
        assert_relative_eq!(mid.orientation.angle(), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_isometry_conversion() {
        let pose = Pose::from_euler(Vector3::new(1.0, -1.0, 0.5), Vector3::new(0.1, 0.2, 0.3));
        let iso: Isometry3<f64> = pose.into();
        let back = Pose::from(iso);
        assert_relative_eq!(back.position, pose.position);
        assert_relative_eq!(back.orientation.angle_to(&pose.orientation), 0.0, epsilon = 1e-12);
    }
}
