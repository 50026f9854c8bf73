// Trajectories between two resolved waypoints.
//
// Time is normalized: `t = 0` is the start waypoint and `t = 1` the end.
// The previously accepted configuration is passed in by the caller on every
// sample; the interpolator itself holds no per-frame state.

use nalgebra::RealField;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::angle::{is_nan, wrap_angle};
use crate::configuration::JointConfiguration;
use crate::pose::Pose;
use crate::selector::SolutionSelector;
use crate::solver::InverseKinematics;

/// How intermediate configurations are produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InterpolationStrategy {
    /// Shortest-arc interpolation of every joint between the two resolved
    /// configurations. Nothing is re-solved.
    #[default]
    ConfigurationSpace,
    /// Straight-line tip motion with slerped orientation, re-solved at every
    /// sample and resolved to the branch closest to the previous frame.
    CartesianSpace,
}

/// A target pose together with the configuration it was resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Waypoint<T: RealField = f64> {
    pub pose: Pose<T>,
    pub configuration: JointConfiguration<T>,
}

impl<T: RealField + Copy> Waypoint<T> {
    pub fn new(pose: Pose<T>, configuration: JointConfiguration<T>) -> Self {
        Self {
            pose,
            configuration,
        }
    }
}

/// Shortest-arc interpolation of a single angle, wrapped into `[-π, π)`.
///
/// The difference is wrapped before scaling, so the path never covers more
/// than half a turn: 350° to 10° passes through 0°, not 180°.
pub fn interpolate_angle<T: RealField + Copy>(from: T, to: T, t: T) -> T {
    wrap_angle(from + wrap_angle(to - from) * t)
}

/// Joint-wise interpolation. Angles take the shortest arc, q2 is linear.
pub fn interpolate_configurations<T: RealField + Copy>(
    from: &JointConfiguration<T>,
    to: &JointConfiguration<T>,
    t: T,
) -> JointConfiguration<T> {
    JointConfiguration::new(
        interpolate_angle(from.theta1, to.theta1, t),
        from.q2 + (to.q2 - from.q2) * t,
        interpolate_angle(from.theta2, to.theta2, t),
        interpolate_angle(from.theta3, to.theta3, t),
        interpolate_angle(from.theta4, to.theta4, t),
        interpolate_angle(from.theta5, to.theta5, t),
    )
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationInterpolator<T: RealField + Copy = f64> {
    strategy: InterpolationStrategy,
    start: Waypoint<T>,
    end: Waypoint<T>,
    solver: InverseKinematics<T>,
    selector: SolutionSelector<T>,
}

impl<T: RealField + Copy> AnimationInterpolator<T> {
    pub fn new(
        solver: InverseKinematics<T>,
        strategy: InterpolationStrategy,
        start: Waypoint<T>,
        end: Waypoint<T>,
    ) -> Self {
        let selector = SolutionSelector::new(*solver.settings(), solver.config().reach_tolerance);
        Self {
            strategy,
            start,
            end,
            solver,
            selector,
        }
    }

    pub fn strategy(&self) -> InterpolationStrategy {
        self.strategy
    }

    pub fn start(&self) -> &Waypoint<T> {
        &self.start
    }

    pub fn end(&self) -> &Waypoint<T> {
        &self.end
    }

    /// Configuration at normalized time `t`, or `None` when `t` is NaN or
    /// no candidate at `t` is usable.
    ///
    /// `t <= 0` and `t >= 1` return the stored endpoint configurations
    /// exactly.
    pub fn try_sample(&self, t: T, previous: &JointConfiguration<T>) -> Option<JointConfiguration<T>> {
        if is_nan(t) {
            return None;
        }
        if t <= T::zero() {
            return Some(self.start.configuration);
        }
        if t >= T::one() {
            return Some(self.end.configuration);
        }

        match self.strategy {
            InterpolationStrategy::ConfigurationSpace => Some(interpolate_configurations(
                &self.start.configuration,
                &self.end.configuration,
                t,
            )),
            InterpolationStrategy::CartesianSpace => {
                let pose = self.start.pose.interpolate(&self.end.pose, t);
                let candidates = self.solver.solve_pose(&pose);
                let selection =
                    self.selector
                        .select_continuous_within_reach(&candidates, previous, &pose.position);
                if selection.is_none() {
                    debug!(?t, "no usable candidate on the cartesian path");
                }
                selection.map(|selection| selection.configuration)
            }
        }
    }

    /// Like [`try_sample`](Self::try_sample), falling back to `previous`.
    pub fn sample(&self, t: T, previous: &JointConfiguration<T>) -> JointConfiguration<T> {
        self.try_sample(t, previous).unwrap_or(*previous)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forward::ForwardKinematics;
    use crate::settings::{ChainSettings, SolverConfig};
    use approx::assert_relative_eq;
    use nalgebra::Vector3;

    fn solver() -> InverseKinematics<f64> {
        InverseKinematics::new(ChainSettings::default(), SolverConfig::default())
    }

    fn resolve(position: Vector3<f64>, euler: Vector3<f64>) -> Waypoint<f64> {
        let pose = Pose::from_euler(position, euler);
        let candidates = solver().solve_pose(&pose);
        let selection = SolutionSelector::new(ChainSettings::default(), 1e-3)
            .select_absolute(&candidates, &position)
            .unwrap();
        Waypoint::new(pose, selection.configuration)
    }

    #[test]
    fn test_shortest_arc_through_zero() {
        let from = 350.0_f64.to_radians();
        let to = 10.0_f64.to_radians();
        assert_relative_eq!(interpolate_angle(from, to, 0.5), 0.0, epsilon = 1e-12);
        assert_relative_eq!(interpolate_angle(to, from, 0.5), 0.0, epsilon = 1e-12);
        assert_relative_eq!(interpolate_angle(from, to, 0.25), (-5.0_f64).to_radians(), epsilon = 1e-12);
    }

    #[test]
    fn test_configuration_interpolation_is_linear_in_q2() {
        let a = JointConfiguration::new(0.0, 1.0, 0.0, 0.0, 0.0, 0.0);
        let b = JointConfiguration::new(0.4, 3.0, -0.4, 0.2, 0.0, 1.0);
        let mid = interpolate_configurations(&a, &b, 0.5);
        assert_relative_eq!(mid.q2, 2.0);
        assert_relative_eq!(mid.theta1, 0.2, epsilon = 1e-12);
        assert_relative_eq!(mid.theta2, -0.2, epsilon = 1e-12);
        assert_relative_eq!(mid.theta5, 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_endpoints_are_exact() {
        let start = resolve(Vector3::new(2.0, 0.0, 0.0), Vector3::zeros());
        let end = resolve(Vector3::new(1.5, 1.0, 1.0), Vector3::new(0.0, 0.0, 0.5));

        for strategy in [InterpolationStrategy::ConfigurationSpace, InterpolationStrategy::CartesianSpace] {
            let animation = AnimationInterpolator::new(solver(), strategy, start, end);
            let previous = JointConfiguration::default();
            assert_eq!(animation.sample(0.0, &previous), start.configuration);
            assert_eq!(animation.sample(-1.0, &previous), start.configuration);
            assert_eq!(animation.sample(1.0, &previous), end.configuration);
            assert_eq!(animation.sample(7.0, &previous), end.configuration);
        }
    }

    #[test]
    fn test_nan_time_retains_previous() {
        let start = resolve(Vector3::new(2.0, 0.0, 0.0), Vector3::zeros());
        let animation = AnimationInterpolator::new(solver(), InterpolationStrategy::default(), start, start);
        let previous = JointConfiguration::new(0.1, 1.1, 0.2, 0.3, 0.4, 0.5);
        assert!(animation.try_sample(f64::NAN, &previous).is_none());
        assert_eq!(animation.sample(f64::NAN, &previous), previous);
    }

    #[test]
    fn test_cartesian_samples_follow_straight_line() {
        let start = resolve(Vector3::new(2.0, 0.0, 0.0), Vector3::zeros());
        let end = resolve(Vector3::new(2.0, 1.0, 0.5), Vector3::zeros());
        let animation =
            AnimationInterpolator::new(solver(), InterpolationStrategy::CartesianSpace, start, end);

        let mut previous = start.configuration;
        for step in 1..10 {
            let t = f64::from(step) / 10.0;
            let sampled = animation.try_sample(t, &previous).unwrap();
            let tip = ForwardKinematics::end_effector(&sampled, &ChainSettings::default());
            let expected = start.pose.position.lerp(&end.pose.position, t);
            assert_relative_eq!(tip, expected, epsilon = 1e-3);
            previous = sampled;
        }
    }

    #[test]
    fn test_configuration_space_midpoint() {
        let start = resolve(Vector3::new(2.0, 0.0, 0.0), Vector3::zeros());
        let end = resolve(Vector3::new(2.0, 1.0, 0.5), Vector3::zeros());
        let animation =
            AnimationInterpolator::new(solver(), InterpolationStrategy::ConfigurationSpace, start, end);

        let mid = animation.sample(0.5, &start.configuration);
        assert_eq!(
            mid,
            interpolate_configurations(&start.configuration, &end.configuration, 0.5)
        );
    }
}
