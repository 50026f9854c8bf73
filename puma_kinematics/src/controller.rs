// Arm controller
//
// Owns the current joint configuration of the arm and keeps the chain
// transforms in sync with it. Every mutation either applies completely or
// leaves the arm untouched; the arm is renderable after any call.
//
// Angles cross this API in degrees, lengths in chain units.

use nalgebra::{RealField, Vector3};
use tracing::{debug, info, warn};

use crate::angle::{to_degrees, to_radians};
use crate::configuration::JointConfiguration;
use crate::error::SettingsError;
use crate::forward::{ChainTransforms, ForwardKinematics};
use crate::interpolator::{AnimationInterpolator, InterpolationStrategy, Waypoint};
use crate::pose::Pose;
use crate::selector::SolutionSelector;
use crate::settings::{ChainSettings, SolverConfig};
use crate::solver::InverseKinematics;

/// A running animation and the state threaded between its samples.
#[derive(Debug, Clone, Copy)]
struct Animation<T: RealField + Copy> {
    interpolator: AnimationInterpolator<T>,
    last_accepted: JointConfiguration<T>,
    last_t: Option<T>,
}

#[derive(Debug, Clone)]
pub struct ArmController<T: RealField + Copy = f64> {
    settings: ChainSettings<T>,
    solver_config: SolverConfig<T>,
    configuration: JointConfiguration<T>,
    transforms: ChainTransforms<T>,
    strategy: InterpolationStrategy,
    start: Option<Waypoint<T>>,
    end: Option<Waypoint<T>>,
    animation: Option<Animation<T>>,
}

impl<T: RealField + Copy> Default for ArmController<T> {
    fn default() -> Self {
        Self::new(ChainSettings::default(), SolverConfig::default())
    }
}

macro_rules! joint_accessors {
    ($($field:ident: $get:ident, $set:ident;)*) => {
        $(
            pub fn $get(&self) -> T {
                to_degrees(self.configuration.$field)
            }

            /// Set the joint angle in degrees. Non-finite values are rejected.
            pub fn $set(&mut self, degrees: T) -> bool {
                if !degrees.is_finite() {
                    warn!(joint = stringify!($field), "rejecting non-finite joint angle");
                    return false;
                }
                self.configuration.$field = to_radians(degrees);
                self.recompute();
                true
            }
        )*
    };
}

impl<T: RealField + Copy> ArmController<T> {
    pub fn new(settings: ChainSettings<T>, solver_config: SolverConfig<T>) -> Self {
        let configuration = JointConfiguration::default();
        Self {
            transforms: ForwardKinematics::evaluate(&configuration, &settings),
            settings,
            solver_config,
            configuration,
            strategy: InterpolationStrategy::default(),
            start: None,
            end: None,
            animation: None,
        }
    }

    pub fn settings(&self) -> &ChainSettings<T> {
        &self.settings
    }

    pub fn solver_config(&self) -> &SolverConfig<T> {
        &self.solver_config
    }

    pub fn configuration(&self) -> &JointConfiguration<T> {
        &self.configuration
    }

    /// Per-joint frame transforms for drawing the links.
    pub fn joint_transforms(&self) -> &ChainTransforms<T> {
        &self.transforms
    }

    pub fn end_effector(&self) -> Vector3<T> {
        self.transforms.end_effector()
    }

    joint_accessors! {
        theta1: theta1_degrees, set_theta1_degrees;
        theta2: theta2_degrees, set_theta2_degrees;
        theta3: theta3_degrees, set_theta3_degrees;
        theta4: theta4_degrees, set_theta4_degrees;
        theta5: theta5_degrees, set_theta5_degrees;
    }

    pub fn q2(&self) -> T {
        self.configuration.q2
    }

    /// Set the extension. A negative value is folded into a half turn of
    /// the shoulder, as the solver does.
    pub fn set_q2(&mut self, q2: T) -> bool {
        if !q2.is_finite() {
            warn!("rejecting non-finite extension");
            return false;
        }
        self.configuration = JointConfiguration { q2, ..self.configuration }.with_positive_extension();
        self.recompute();
        true
    }

    /// Replace the whole configuration. Non-finite configurations are
    /// rejected and a negative extension is folded.
    pub fn set_configuration(&mut self, configuration: JointConfiguration<T>) -> bool {
        if !configuration.is_finite() {
            warn!(?configuration, "rejecting non-finite configuration");
            return false;
        }
        self.configuration = configuration.with_positive_extension();
        self.recompute();
        true
    }

    pub fn base_height(&self) -> T {
        self.settings.base_height()
    }

    pub fn link3_length(&self) -> T {
        self.settings.link3_length()
    }

    pub fn link4_length(&self) -> T {
        self.settings.link4_length()
    }

    /// Change the link lengths.
    ///
    /// Stored animation endpoints are resolved again against the new chain;
    /// an endpoint that no longer resolves is dropped.
    pub fn set_link_lengths(
        &mut self,
        base_height: T,
        link3_length: T,
        link4_length: T,
    ) -> Result<(), SettingsError> {
        self.settings = ChainSettings::new(base_height, link3_length, link4_length)?;
        self.recompute();
        self.refresh_endpoints();
        Ok(())
    }

    pub fn set_solver_config(&mut self, config: SolverConfig<T>) -> Result<(), SettingsError> {
        config.validate()?;
        self.solver_config = config;
        self.refresh_endpoints();
        Ok(())
    }

    pub fn interpolation_strategy(&self) -> InterpolationStrategy {
        self.strategy
    }

    /// Switching strategy restarts any running animation.
    pub fn set_interpolation_strategy(&mut self, strategy: InterpolationStrategy) {
        self.strategy = strategy;
        self.restart_animation();
    }

    /// Move the arm to the pose given by `position` and Euler angles in
    /// degrees. Returns `false`, leaving the arm where it was, when no
    /// configuration reaches the target.
    pub fn move_to_point(&mut self, position: Vector3<T>, orientation_degrees: Vector3<T>) -> bool {
        match self.resolve(position, orientation_degrees) {
            Some(waypoint) => {
                info!(position = ?waypoint.pose.position, "moved to point");
                self.configuration = waypoint.configuration;
                self.recompute();
                true
            }
            None => false,
        }
    }

    /// Resolve and store the start pose of the animation.
    pub fn set_start_point(&mut self, position: Vector3<T>, orientation_degrees: Vector3<T>) -> bool {
        let Some(waypoint) = self.resolve(position, orientation_degrees) else {
            return false;
        };
        info!(position = ?waypoint.pose.position, "animation start point set");
        self.start = Some(waypoint);
        self.restart_animation();
        true
    }

    /// Resolve and store the end pose of the animation.
    pub fn set_end_point(&mut self, position: Vector3<T>, orientation_degrees: Vector3<T>) -> bool {
        let Some(waypoint) = self.resolve(position, orientation_degrees) else {
            return false;
        };
        info!(position = ?waypoint.pose.position, "animation end point set");
        self.end = Some(waypoint);
        self.restart_animation();
        true
    }

    pub fn start_point(&self) -> Option<&Waypoint<T>> {
        self.start.as_ref()
    }

    pub fn end_point(&self) -> Option<&Waypoint<T>> {
        self.end.as_ref()
    }

    /// Advance the animation to normalized time `t` and apply the sample.
    ///
    /// Returns `false` when no animation is set up, when `t` goes backwards,
    /// or when the sample could not be resolved. In the last case the arm
    /// keeps its configuration and the animation does not advance.
    pub fn advance_animation(&mut self, t: T) -> bool {
        let Some(animation) = self.animation.as_mut() else {
            debug!("advance requested without both animation endpoints");
            return false;
        };

        if let Some(last_t) = animation.last_t {
            if t < last_t {
                debug!(?t, ?last_t, "ignoring animation time going backwards");
                return false;
            }
        }

        match animation.interpolator.try_sample(t, &animation.last_accepted) {
            Some(configuration) => {
                animation.last_accepted = configuration;
                animation.last_t = Some(t);
                self.configuration = configuration;
                self.recompute();
                true
            }
            None => {
                debug!(?t, "animation sample retained previous configuration");
                false
            }
        }
    }

    fn solver(&self) -> InverseKinematics<T> {
        InverseKinematics::new(self.settings, self.solver_config)
    }

    fn resolve(&self, position: Vector3<T>, orientation_degrees: Vector3<T>) -> Option<Waypoint<T>> {
        if !position.iter().chain(orientation_degrees.iter()).all(|v| v.is_finite()) {
            warn!("rejecting non-finite target");
            return None;
        }
        self.resolve_pose(Pose::from_euler_degrees(position, orientation_degrees))
    }

    fn resolve_pose(&self, pose: Pose<T>) -> Option<Waypoint<T>> {
        let candidates = self.solver().solve_pose(&pose);
        let selector = SolutionSelector::new(self.settings, self.solver_config.reach_tolerance);
        match selector.select_absolute(&candidates, &pose.position) {
            Some(selection) => {
                debug!(index = selection.index, distance = ?selection.distance, "target resolved");
                Some(Waypoint::new(pose, selection.configuration))
            }
            None => {
                warn!(position = ?pose.position, "target unreachable");
                None
            }
        }
    }

    fn refresh_endpoints(&mut self) {
        self.start = self.start.and_then(|waypoint| self.resolve_pose(waypoint.pose));
        self.end = self.end.and_then(|waypoint| self.resolve_pose(waypoint.pose));
        self.restart_animation();
    }

    fn restart_animation(&mut self) {
        self.animation = match (self.start, self.end) {
            (Some(start), Some(end)) => Some(Animation {
                interpolator: AnimationInterpolator::new(self.solver(), self.strategy, start, end),
                last_accepted: start.configuration,
                last_t: None,
            }),
            _ => None,
        };
    }

    fn recompute(&mut self) {
        self.transforms = ForwardKinematics::evaluate(&self.configuration, &self.settings);
    }
}
