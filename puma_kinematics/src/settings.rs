// Chain and solver configuration for the PUMA arm
//
// The chain is described by three link lengths. The prismatic joint
// (q2) is part of the joint configuration, not of the settings.
//
// Link | role                               | symbol
// -----|------------------------------------|-------
// L1   | base column, along z               | l1
// Q2   | prismatic arm, along x (variable)  | q2
// L3   | forearm, along -z                  | l3
// L4   | wrist to tool tip, along x         | l4

use nalgebra::RealField;
use serde::{Deserialize, Serialize};

use crate::angle::lit;
use crate::error::SettingsError;

/// Link lengths of the kinematic chain.
///
/// Immutable once constructed. Changing a length means building a new
/// value, which `ChainSettings::new` validates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChainSettings<T = f64> {
    base_height: T,
    link3_length: T,
    link4_length: T,
}

impl<T: RealField + Copy> ChainSettings<T> {
    /// Create settings from the base height (l1) and the lengths of the
    /// forearm (l3) and the wrist link (l4).
    pub fn new(base_height: T, link3_length: T, link4_length: T) -> Result<Self, SettingsError> {
        let settings = Self {
            base_height,
            link3_length,
            link4_length,
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Check that every length is positive and finite.
    ///
    /// Deserialized settings bypass `new`, so loaders call this explicitly.
    pub fn validate(&self) -> Result<(), SettingsError> {
        for (name, value) in [
            ("base_height", self.base_height),
            ("link3_length", self.link3_length),
            ("link4_length", self.link4_length),
        ] {
            if !value.is_finite() || value <= T::zero() {
                return Err(SettingsError::invalid_length(name, value));
            }
        }
        Ok(())
    }

    pub fn base_height(&self) -> T {
        self.base_height
    }

    pub fn link3_length(&self) -> T {
        self.link3_length
    }

    pub fn link4_length(&self) -> T {
        self.link4_length
    }
}

impl<T: RealField + Copy> Default for ChainSettings<T> {
    fn default() -> Self {
        Self {
            base_height: lit(3.0),
            link3_length: lit(1.0),
            link4_length: lit(1.0),
        }
    }
}

/// Numeric knobs of the solver and the selector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig<T: RealField + Copy = f64> {
    /// Perturbation applied to the base-angle ratio when its denominator
    /// vanishes.
    pub singularity_epsilon: T,
    /// Maximum end-effector position error for a candidate to count as
    /// reaching its target.
    pub reach_tolerance: T,
}

impl<T: RealField + Copy> SolverConfig<T> {
    pub fn validate(&self) -> Result<(), SettingsError> {
        if !self.singularity_epsilon.is_finite() || self.singularity_epsilon <= T::zero() {
            return Err(SettingsError::InvalidSolverConfig(format!(
                "singularity_epsilon must be positive, got {}",
                self.singularity_epsilon
            )));
        }
        if !self.reach_tolerance.is_finite() || self.reach_tolerance <= T::zero() {
            return Err(SettingsError::InvalidSolverConfig(format!(
                "reach_tolerance must be positive, got {}",
                self.reach_tolerance
            )));
        }
        Ok(())
    }
}

impl<T: RealField + Copy> Default for SolverConfig<T> {
    fn default() -> Self {
        Self {
            singularity_epsilon: lit(1e-6),
            reach_tolerance: lit(1e-3),
        }
    }
}
