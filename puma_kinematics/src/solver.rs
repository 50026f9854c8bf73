// Closed-form inverse kinematics for the 5-DOF PUMA chain.
//
// Notation: the target frame F = T(p)·Rz·Ry·Rx is read column-wise.
// The first column is the tool x axis (xx, xy, xz), the second the tool y
// axis (yx, yy, ...), the third the tool z axis (zx, zy, ...), and p is the
// tool tip. In matrix-index terms xx = R11, xy = R21, xz = R31.
//
// The wrist point P4 = p - l4·x lies in the vertical plane at azimuth θ1,
// which gives θ1 up to a half turn. The tool x axis then fixes θ4 (arcsine,
// two roots) and θ2+θ3, and the P4 coordinates give θ2 (arctangent, two roots)
// and q2. Every combination of the three binary choices is returned.

use nalgebra::{RealField, Rotation3, Vector3};
use tracing::{debug, trace};

use crate::angle::{is_infinite, is_nan, wrap_angle, AngleSolution};
use crate::configuration::{CandidateSet, JointConfiguration};
use crate::pose::Pose;
use crate::settings::{ChainSettings, SolverConfig};

/// Solve for every branch with the default solver configuration.
///
/// `orientation` holds Euler angles in radians, applied X then Y then Z.
pub fn solve<T: RealField + Copy>(
    position: &Vector3<T>,
    orientation: &Vector3<T>,
    settings: &ChainSettings<T>,
) -> CandidateSet<T> {
    InverseKinematics::new(*settings, SolverConfig::default()).solve(position, orientation)
}

/// Entries of the target transform the closed-form expressions use.
#[derive(Debug, Clone, Copy)]
struct TargetFrame<T> {
    xx: T,
    xy: T,
    xz: T,
    yx: T,
    yy: T,
    zx: T,
    zy: T,
    px: T,
    py: T,
    pz: T,
}

impl<T: RealField + Copy> TargetFrame<T> {
    fn new(position: &Vector3<T>, rotation: &Rotation3<T>) -> Self {
        let m = rotation.matrix();
        Self {
            xx: m[(0, 0)],
            xy: m[(1, 0)],
            xz: m[(2, 0)],
            yx: m[(0, 1)],
            yy: m[(1, 1)],
            zx: m[(0, 2)],
            zy: m[(1, 2)],
            px: position.x,
            py: position.y,
            pz: position.z,
        }
    }
}

/// Which root each multi-valued inversion takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Branch {
    theta1_flipped: bool,
    theta4_reflected: bool,
    theta2_flipped: bool,
}

impl Branch {
    /// θ1 splits the set in halves, θ4 in quarters, θ2 alternates.
    fn from_index(index: usize) -> Self {
        Self {
            theta1_flipped: index & 0b100 != 0,
            theta4_reflected: index & 0b010 != 0,
            theta2_flipped: index & 0b001 != 0,
        }
    }
}

/// Inverse kinematics for a fixed chain.
///
/// Stateless apart from the immutable settings; `solve` is a pure function
/// of its inputs and may be called from anywhere.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InverseKinematics<T: RealField + Copy = f64> {
    settings: ChainSettings<T>,
    config: SolverConfig<T>,
}

impl<T: RealField + Copy> InverseKinematics<T> {
    pub fn new(settings: ChainSettings<T>, config: SolverConfig<T>) -> Self {
        Self { settings, config }
    }

    pub fn settings(&self) -> &ChainSettings<T> {
        &self.settings
    }

    pub fn config(&self) -> &SolverConfig<T> {
        &self.config
    }

    /// Solve for a position and Euler angles in radians (X, then Y, then Z).
    pub fn solve(&self, position: &Vector3<T>, orientation: &Vector3<T>) -> CandidateSet<T> {
        let rotation = Rotation3::from_euler_angles(orientation.x, orientation.y, orientation.z);
        self.solve_rotation(position, &rotation)
    }

    pub fn solve_pose(&self, pose: &Pose<T>) -> CandidateSet<T> {
        self.solve_rotation(&pose.position, &pose.rotation())
    }

    /// Solve for a position and a rotation matrix.
    ///
    /// Always returns eight candidates. Degenerate inputs never fail here;
    /// they produce candidates that report `is_valid() == false`.
    pub fn solve_rotation(&self, position: &Vector3<T>, rotation: &Rotation3<T>) -> CandidateSet<T> {
        let target = TargetFrame::new(position, rotation);
        let theta1 = self.principal_theta1(&target);

        let candidates = std::array::from_fn(|index| {
            let candidate = self.solve_branch(&target, theta1, Branch::from_index(index));
            trace!(index, ?candidate, "ik candidate");
            candidate
        });
        CandidateSet::new(candidates)
    }

    /// θ1 = atan(P4y / P4x), principal root.
    ///
    /// An infinite ratio is pushed off the singularity by perturbing both
    /// terms; 0/0 leaves the azimuth undetermined and defaults to 0.
    fn principal_theta1(&self, f: &TargetFrame<T>) -> AngleSolution<T> {
        let l4 = self.settings.link4_length();
        let eps = self.config.singularity_epsilon;

        let numerator = l4 * f.xy - f.py;
        let denominator = l4 * f.xx - f.px;
        let mut ratio = numerator / denominator;
        if is_infinite(ratio) {
            ratio = (numerator + eps) / (denominator + eps);
        }

        if is_nan(ratio) {
            debug!("wrist point on the base axis, defaulting theta1 to 0");
            AngleSolution::zero()
        } else {
            AngleSolution::new(ratio.atan())
        }
    }

    fn solve_branch(
        &self,
        f: &TargetFrame<T>,
        theta1: AngleSolution<T>,
        branch: Branch,
    ) -> JointConfiguration<T> {
        let l1 = self.settings.base_height();
        let l3 = self.settings.link3_length();
        let l4 = self.settings.link4_length();

        // θ1
        let theta1 = if branch.theta1_flipped {
            theta1.shifted_by_pi()
        } else {
            theta1
        };
        let (s1, c1) = (theta1.sin(), theta1.cos());

        // θ4: sin θ4 = c1·xy - s1·xx. Rounding can push the argument just
        // outside [-1, 1], so it is clamped before the inversion.
        let sin4 = (c1 * f.xy - s1 * f.xx).clamp(-T::one(), T::one());
        let theta4 = AngleSolution::new(sin4.asin());
        let theta4 = if branch.theta4_reflected {
            theta4.reflected()
        } else {
            theta4
        };
        let (s4, c4) = (theta4.sin(), theta4.cos());

        // θ5: both atan2 arguments carry a factor of cos θ4.
        let sign4 = if c4 < T::zero() { -T::one() } else { T::one() };
        let theta5 = (sign4 * (s1 * f.zx - c1 * f.zy)).atan2(sign4 * (c1 * f.yy - s1 * f.yx));

        // θ2
        let numerator = -(c1 * c4 * (f.pz - l4 * f.xz - l1) + l3 * (f.xx + s1 * s4));
        let denominator = c4 * (f.px - l4 * f.xx) - c1 * l3 * f.xz;
        let ratio = numerator / denominator;
        let theta2 = if is_nan(ratio) {
            AngleSolution::zero()
        } else {
            AngleSolution::new(ratio.atan())
        };
        let theta2 = if branch.theta2_flipped {
            theta2.shifted_by_pi()
        } else {
            theta2
        };

        // q2, with a negative extension folded into the opposite shoulder root.
        let q2 = denominator / (c1 * theta2.cos() * c4);
        let (q2, theta2) = if q2 < T::zero() {
            (-q2, theta2.shifted_by_pi())
        } else {
            (q2, theta2)
        };

        // θ3 from θ2 + θ3 encoded in the tool x axis.
        let theta23 = (-f.xz / c4).atan2((f.xx + s1 * s4) / (c1 * c4));
        let theta3 = theta23 - theta2.angle();

        JointConfiguration::new(
            theta1.angle(),
            q2,
            theta2.wrapped().angle(),
            wrap_angle(theta3),
            theta4.angle(),
            theta5,
        )
    }
}
