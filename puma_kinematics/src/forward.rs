// Forward kinematics for the 5-DOF PUMA chain.
//
// Column-vector convention, each frame built on the previous one:
//   frame1 = Rz(θ1)
//   frame2 = frame1 · Tz(l1)  · Ry(θ2)
//   frame3 = frame2 · Tx(q2)  · Ry(θ3)
//   frame4 = frame3 · Tz(-l3) · Rz(θ4)
//   frame5 = frame4 · Tx(l4)  · Rx(θ5)
// IMPORTANT: the inverse solver reads the target as T(p)·Rz·Ry·Rx and its
// closed-form expressions assume exactly this chain.

use nalgebra::{Matrix3, Matrix4, RealField, Rotation3, Unit, Vector3};

use crate::configuration::JointConfiguration;
use crate::settings::ChainSettings;

/// Number of joint frames in the chain.
pub const JOINT_COUNT: usize = 5;

/// Cumulative frame transforms, one per joint, in joint order.
///
/// Each matrix maps coordinates of its link into the base frame. These are
/// the model matrices a renderer draws the link geometry with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChainTransforms<T: RealField = f64> {
    frames: [Matrix4<T>; JOINT_COUNT],
}

impl<T: RealField + Copy> ChainTransforms<T> {
    pub fn frames(&self) -> &[Matrix4<T>; JOINT_COUNT] {
        &self.frames
    }

    /// Origin of each joint frame in base coordinates.
    pub fn joint_origins(&self) -> [Vector3<T>; JOINT_COUNT] {
        self.frames.map(|frame| translation_of(&frame))
    }

    /// Tool tip position: the origin of the last frame.
    pub fn end_effector(&self) -> Vector3<T> {
        translation_of(&self.frames[JOINT_COUNT - 1])
    }

    /// Tool orientation in base coordinates.
    pub fn end_effector_rotation(&self) -> Rotation3<T> {
        let frame = &self.frames[JOINT_COUNT - 1];
        let rotation: Matrix3<T> = frame.fixed_view::<3, 3>(0, 0).into_owned();
        Rotation3::from_matrix_unchecked(rotation)
    }
}

/// Composes per-joint transforms into the chain of frames.
pub struct ForwardKinematics;

impl ForwardKinematics {
    /// Evaluate every joint frame of `configuration`.
    pub fn evaluate<T: RealField + Copy>(
        configuration: &JointConfiguration<T>,
        settings: &ChainSettings<T>,
    ) -> ChainTransforms<T> {
        let zero = T::zero();

        let frame1 = rotation(&Vector3::z_axis(), configuration.theta1);
        let frame2 = frame1
            * translation(zero, zero, settings.base_height())
            * rotation(&Vector3::y_axis(), configuration.theta2);
        let frame3 = frame2
            * translation(configuration.q2, zero, zero)
            * rotation(&Vector3::y_axis(), configuration.theta3);
        let frame4 = frame3
            * translation(zero, zero, -settings.link3_length())
            * rotation(&Vector3::z_axis(), configuration.theta4);
        let frame5 = frame4
            * translation(settings.link4_length(), zero, zero)
            * rotation(&Vector3::x_axis(), configuration.theta5);

        ChainTransforms {
            frames: [frame1, frame2, frame3, frame4, frame5],
        }
    }

    /// Tool tip position only.
    pub fn end_effector<T: RealField + Copy>(
        configuration: &JointConfiguration<T>,
        settings: &ChainSettings<T>,
    ) -> Vector3<T> {
        Self::evaluate(configuration, settings).end_effector()
    }
}

fn rotation<T: RealField + Copy>(axis: &Unit<Vector3<T>>, angle: T) -> Matrix4<T> {
    Matrix4::from_axis_angle(axis, angle)
}

fn translation<T: RealField + Copy>(x: T, y: T, z: T) -> Matrix4<T> {
    Matrix4::new_translation(&Vector3::new(x, y, z))
}

fn translation_of<T: RealField + Copy>(frame: &Matrix4<T>) -> Vector3<T> {
    Vector3::new(frame[(0, 3)], frame[(1, 3)], frame[(2, 3)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    fn settings() -> ChainSettings<f64> {
        ChainSettings::new(3.0, 1.0, 1.0).unwrap()
    }

    #[test]
    fn test_zero_configuration() {
        // q2 = 1: up the column, out along x, down the forearm, out along x.
        let config = JointConfiguration::new(0.0, 1.0, 0.0, 0.0, 0.0, 0.0);
        let transforms = ForwardKinematics::evaluate(&config, &settings());

        let origins = transforms.joint_origins();
        assert_relative_eq!(origins[0], Vector3::new(0.0, 0.0, 0.0));
        assert_relative_eq!(origins[1], Vector3::new(0.0, 0.0, 3.0));
        assert_relative_eq!(origins[2], Vector3::new(1.0, 0.0, 3.0));
        assert_relative_eq!(origins[3], Vector3::new(1.0, 0.0, 2.0));
        assert_relative_eq!(transforms.end_effector(), Vector3::new(2.0, 0.0, 2.0));

        // With every angle at zero the frames only translate.
        assert_relative_eq!(transforms.frames()[0], Matrix4::identity(), epsilon = 1e-12);
        assert_relative_eq!(transforms.end_effector_rotation(), Rotation3::identity(), epsilon = 1e-12);
    }

    #[test]
    fn test_base_rotation_turns_whole_arm() {
        let config = JointConfiguration::new(FRAC_PI_2, 1.0, 0.0, 0.0, 0.0, 0.0);
        let tip = ForwardKinematics::end_effector(&config, &settings());
        assert_relative_eq!(tip, Vector3::new(0.0, 2.0, 2.0), epsilon = 1e-12);
    }

    #[test]
    fn test_wrist_roll_keeps_tip_position() {
        let base = JointConfiguration::new(0.3, 1.2, 0.4, -0.2, 0.1, 0.0);
        let rolled = JointConfiguration { theta5: 1.3, ..base };

        let a = ForwardKinematics::evaluate(&base, &settings());
        let b = ForwardKinematics::evaluate(&rolled, &settings());
        assert_relative_eq!(a.end_effector(), b.end_effector(), epsilon = 1e-12);

        // Roll is about the tool x axis, so that axis is shared too.
        let x_a = a.end_effector_rotation() * Vector3::x();
        let x_b = b.end_effector_rotation() * Vector3::x();
        assert_relative_eq!(x_a, x_b, epsilon = 1e-12);
    }

    #[test]
    fn test_shoulder_lowers_arm() {
        // Ry(+90°) turns the x axis into -z.
        let config = JointConfiguration::new(0.0, 1.0, FRAC_PI_2, -FRAC_PI_2, 0.0, 0.0);
        let transforms = ForwardKinematics::evaluate(&config, &settings());
        assert_relative_eq!(transforms.joint_origins()[2], Vector3::new(0.0, 0.0, 2.0), epsilon = 1e-12);
        assert_relative_eq!(transforms.end_effector(), Vector3::new(1.0, 0.0, 1.0), epsilon = 1e-12);
    }
}
