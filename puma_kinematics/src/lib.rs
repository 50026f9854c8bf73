// Kinematics for a 5-DOF PUMA-style arm with one prismatic joint

pub mod angle;
pub mod configuration;
pub mod controller;
pub mod error;
pub mod forward;
pub mod interpolator;
pub mod pose;
pub mod selector;
pub mod settings;
pub mod solver;

pub use angle::{angular_distance, to_degrees, to_radians, wrap_angle, AngleSolution};
pub use configuration::{CandidateSet, JointConfiguration, CANDIDATE_COUNT};
pub use controller::ArmController;
pub use error::SettingsError;
pub use forward::{ChainTransforms, ForwardKinematics, JOINT_COUNT};
pub use interpolator::{
    interpolate_angle, interpolate_configurations, AnimationInterpolator, InterpolationStrategy,
    Waypoint,
};
pub use pose::Pose;
pub use selector::{configuration_distance, Selection, SolutionSelector};
pub use settings::{ChainSettings, SolverConfig};
pub use solver::{solve, InverseKinematics};
