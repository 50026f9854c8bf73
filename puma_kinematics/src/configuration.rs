// Joint configurations and the fixed-size candidate set produced per solve.

use nalgebra::RealField;
use serde::{Deserialize, Serialize};

use crate::angle::{to_degrees, to_radians, wrap_angle};

/// Number of branch combinations enumerated by the inverse solver:
/// two roots each for θ1, θ4 and θ2.
pub const CANDIDATE_COUNT: usize = 8;

/// The six degrees of freedom of the arm.
///
/// Angles are radians unless the value came from [`JointConfiguration::in_degrees`].
/// `q2` is the prismatic extension and is a length in both representations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JointConfiguration<T = f64> {
    /// Base azimuth about z.
    pub theta1: T,
    /// Prismatic extension along the shoulder link.
    pub q2: T,
    /// Shoulder rotation about y.
    pub theta2: T,
    /// Elbow rotation about y.
    pub theta3: T,
    /// Wrist bend about z.
    pub theta4: T,
    /// Wrist roll about x.
    pub theta5: T,
}

impl<T: RealField + Copy> JointConfiguration<T> {
    pub fn new(theta1: T, q2: T, theta2: T, theta3: T, theta4: T, theta5: T) -> Self {
        Self {
            theta1,
            q2,
            theta2,
            theta3,
            theta4,
            theta5,
        }
    }

    /// Build a configuration from angles in degrees.
    pub fn from_degrees(theta1: T, q2: T, theta2: T, theta3: T, theta4: T, theta5: T) -> Self {
        Self::new(
            to_radians(theta1),
            q2,
            to_radians(theta2),
            to_radians(theta3),
            to_radians(theta4),
            to_radians(theta5),
        )
    }

    /// Copy with every angle converted to degrees, for display.
    pub fn in_degrees(&self) -> Self {
        Self::new(
            to_degrees(self.theta1),
            self.q2,
            to_degrees(self.theta2),
            to_degrees(self.theta3),
            to_degrees(self.theta4),
            to_degrees(self.theta5),
        )
    }

    /// The five rotation angles in joint order.
    pub fn angles(&self) -> [T; 5] {
        [self.theta1, self.theta2, self.theta3, self.theta4, self.theta5]
    }

    /// True when no field is NaN or infinite.
    pub fn is_finite(&self) -> bool {
        self.q2.is_finite() && self.angles().iter().all(|angle| angle.is_finite())
    }

    /// A configuration is usable when every field is finite and the
    /// extension is non-negative.
    pub fn is_valid(&self) -> bool {
        self.is_finite() && self.q2 >= T::zero()
    }

    /// Fold a negative extension into the equivalent positive one with the
    /// shoulder turned half a revolution.
    pub fn with_positive_extension(self) -> Self {
        if self.q2 < T::zero() {
            Self {
                q2: -self.q2,
                theta2: wrap_angle(self.theta2 + T::pi()),
                ..self
            }
        } else {
            self
        }
    }
}

impl<T: RealField + Copy> Default for JointConfiguration<T> {
    fn default() -> Self {
        Self::new(
            T::zero(),
            T::one(),
            T::zero(),
            T::zero(),
            T::zero(),
            T::zero(),
        )
    }
}

/// Exactly [`CANDIDATE_COUNT`] configurations in branch order.
///
/// Index bits, most significant first: θ1 branch, θ4 branch, θ2 branch.
/// Degenerate candidates stay in place; callers filter with [`CandidateSet::valid`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CandidateSet<T = f64> {
    candidates: [JointConfiguration<T>; CANDIDATE_COUNT],
}

impl<T: RealField + Copy> CandidateSet<T> {
    pub fn new(candidates: [JointConfiguration<T>; CANDIDATE_COUNT]) -> Self {
        Self { candidates }
    }

    pub fn as_slice(&self) -> &[JointConfiguration<T>] {
        &self.candidates
    }

    /// Always [`CANDIDATE_COUNT`].
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn get(&self, index: usize) -> Option<&JointConfiguration<T>> {
        self.candidates.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, JointConfiguration<T>> {
        self.candidates.iter()
    }

    /// Valid candidates together with their branch index.
    pub fn valid(&self) -> impl Iterator<Item = (usize, &JointConfiguration<T>)> + '_ {
        self.candidates
            .iter()
            .enumerate()
            .filter(|(_, candidate)| candidate.is_valid())
    }
}

impl<T> std::ops::Index<usize> for CandidateSet<T> {
    type Output = JointConfiguration<T>;

    fn index(&self, index: usize) -> &Self::Output {
        &self.candidates[index]
    }
}

impl<'a, T: RealField + Copy> IntoIterator for &'a CandidateSet<T> {
    type Item = &'a JointConfiguration<T>;
    type IntoIter = std::slice::Iter<'a, JointConfiguration<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    #[test]
    fn test_validity() {
        let config = JointConfiguration::new(0.1, 2.0, 0.2, 0.3, 0.4, 0.5);
        assert!(config.is_valid());

        let nan = JointConfiguration { theta3: f64::NAN, ..config };
        assert!(!nan.is_valid());

        let inf = JointConfiguration { q2: f64::INFINITY, ..config };
        assert!(!inf.is_valid());

        let negative = JointConfiguration { q2: -1.0, ..config };
        assert!(negative.is_finite());
        assert!(!negative.is_valid());
    }

    #[test]
    fn test_degree_roundtrip() {
        let config = JointConfiguration::from_degrees(90.0, 1.5, -45.0, 180.0, 30.0, 0.0);
        assert_relative_eq!(config.theta1, PI / 2.0);
        assert_relative_eq!(config.q2, 1.5);

        let degrees = config.in_degrees();
        assert_relative_eq!(degrees.theta2, -45.0, epsilon = 1e-12);
        assert_relative_eq!(degrees.theta3, 180.0, epsilon = 1e-12);
        assert_relative_eq!(degrees.q2, 1.5);
    }

    #[test]
    fn test_negative_extension_folds_into_shoulder() {
        let config = JointConfiguration::new(0.0, -2.0, 0.5, 0.0, 0.0, 0.0).with_positive_extension();
        assert_relative_eq!(config.q2, 2.0);
        assert_relative_eq!(config.theta2, 0.5 - PI, epsilon = 1e-12);
    }

    #[test]
    fn test_candidate_set_filters_invalid() {
        let good = JointConfiguration::<f64>::default();
        let bad = JointConfiguration { theta1: f64::NAN, ..good };
        let set = CandidateSet::new([bad, good, bad, bad, good, bad, bad, bad]);

        assert_eq!(set.len(), CANDIDATE_COUNT);
        let indices: Vec<usize> = set.valid().map(|(index, _)| index).collect();
        assert_eq!(indices, vec![1, 4]);
        assert_eq!(set[1], good);
        assert_eq!(set.get(4), Some(&good));
        assert_eq!(set.get(CANDIDATE_COUNT), None);
    }
}
