// Picking one configuration out of a candidate set.
//
// Absolute mode ranks by end-effector position error and is used for a
// one-off move. Continuity mode ranks by joint-space distance to the previous
// accepted configuration and is used while animating.
// Ties go to the lowest branch index in both modes.

use nalgebra::{RealField, Vector3};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::angle::angular_distance;
use crate::configuration::{CandidateSet, JointConfiguration};
use crate::forward::ForwardKinematics;
use crate::settings::ChainSettings;

/// The chosen candidate together with the score it won with.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Selection<T = f64> {
    /// Branch index in the candidate set.
    pub index: usize,
    pub configuration: JointConfiguration<T>,
    /// Position error in absolute mode, configuration distance in continuity mode.
    pub distance: T,
}

/// Joint-space distance between two configurations.
///
/// Sum of the wrapped angular differences of θ1..θ5 plus the relative
/// difference of the extension magnitudes, `| |a| - |b| | / (|a| + |b|)`,
/// which is 0 when both extensions are 0.
pub fn configuration_distance<T: RealField + Copy>(
    a: &JointConfiguration<T>,
    b: &JointConfiguration<T>,
) -> T {
    let (qa, qb) = (a.q2.abs(), b.q2.abs());
    let total = qa + qb;
    let extension = if total > T::zero() {
        (qa - qb).abs() / total
    } else {
        T::zero()
    };

    a.angles()
        .iter()
        .zip(b.angles().iter())
        .fold(extension, |sum, (&x, &y)| sum + angular_distance(x, y))
}

/// Ranks candidate configurations for a fixed chain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolutionSelector<T: RealField + Copy = f64> {
    settings: ChainSettings<T>,
    reach_tolerance: T,
}

impl<T: RealField + Copy> SolutionSelector<T> {
    pub fn new(settings: ChainSettings<T>, reach_tolerance: T) -> Self {
        Self {
            settings,
            reach_tolerance,
        }
    }

    /// Distance from the tip of `configuration` to `target`.
    pub fn position_error(&self, configuration: &JointConfiguration<T>, target: &Vector3<T>) -> T {
        (ForwardKinematics::end_effector(configuration, &self.settings) - target).norm()
    }

    /// The valid candidate whose tip lands closest to `target`.
    ///
    /// Returns `None` when every candidate is invalid or the closest one
    /// still misses by more than the reach tolerance.
    pub fn select_absolute(
        &self,
        candidates: &CandidateSet<T>,
        target: &Vector3<T>,
    ) -> Option<Selection<T>> {
        let best = minimum(
            candidates
                .valid()
                .map(|(index, candidate)| (index, candidate, self.position_error(candidate, target))),
        )?;

        if best.distance > self.reach_tolerance {
            debug!(index = best.index, "closest candidate misses the target");
            return None;
        }
        Some(best)
    }

    /// The valid candidate closest to `previous` in joint space.
    pub fn select_continuous(
        &self,
        candidates: &CandidateSet<T>,
        previous: &JointConfiguration<T>,
    ) -> Option<Selection<T>> {
        minimum(
            candidates
                .valid()
                .map(|(index, candidate)| (index, candidate, configuration_distance(candidate, previous))),
        )
    }

    /// Like [`select_continuous`](Self::select_continuous), but only among
    /// candidates whose tip lies within the reach tolerance of `target`.
    pub fn select_continuous_within_reach(
        &self,
        candidates: &CandidateSet<T>,
        previous: &JointConfiguration<T>,
        target: &Vector3<T>,
    ) -> Option<Selection<T>> {
        minimum(
            candidates
                .valid()
                .filter(|(_, candidate)| self.position_error(candidate, target) <= self.reach_tolerance)
                .map(|(index, candidate)| (index, candidate, configuration_distance(candidate, previous))),
        )
    }
}

/// First strict minimum over finite scores.
fn minimum<'a, T, I>(scored: I) -> Option<Selection<T>>
where
    T: RealField + Copy,
    I: Iterator<Item = (usize, &'a JointConfiguration<T>, T)>,
{
    scored
        .filter(|(_, _, distance)| distance.is_finite())
        .fold(None, |best: Option<Selection<T>>, (index, candidate, distance)| match best {
            Some(current) if current.distance <= distance => Some(current),
            _ => Some(Selection {
                index,
                configuration: *candidate,
                distance,
            }),
        })
}
