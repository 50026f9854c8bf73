// Joint angle helpers shared by the solver, the selector and the interpolator.
// All angles are radians unless a function name says otherwise.

use nalgebra::RealField;
use serde::{Deserialize, Serialize};

/// Convert an `f64` constant into the working scalar type.
#[inline]
pub(crate) fn lit<T: RealField + Copy>(value: f64) -> T {
    nalgebra::convert(value)
}

/// Returns true when `value` is NaN. Works for any `RealField` scalar.
#[inline]
pub(crate) fn is_nan<T: RealField + Copy>(value: T) -> bool {
    value.partial_cmp(&value).is_none()
}

/// Returns true when `value` is positive or negative infinity.
#[inline]
pub(crate) fn is_infinite<T: RealField + Copy>(value: T) -> bool {
    !value.is_finite() && !is_nan(value)
}

pub fn to_degrees<T: RealField + Copy>(radians: T) -> T {
    radians * lit(180.0) / T::pi()
}

pub fn to_radians<T: RealField + Copy>(degrees: T) -> T {
    degrees * T::pi() / lit(180.0)
}

/// Wrap an angle into `[-π, π)`.
pub fn wrap_angle<T: RealField + Copy>(angle: T) -> T {
    let two_pi = T::two_pi();
    let shifted = (angle + T::pi()) % two_pi;
    let shifted = if shifted < T::zero() {
        shifted + two_pi
    } else {
        shifted
    };
    shifted - T::pi()
}

/// Unsigned angular distance between two angles, accounting for wraparound.
///
/// The raw difference is reduced modulo 2π first, so unwrapped inputs
/// (e.g. `3π` and `-π`) still compare as equal. The result lies in `[0, π]`.
pub fn angular_distance<T: RealField + Copy>(a: T, b: T) -> T {
    let two_pi = T::two_pi();
    let delta = (a - b).abs() % two_pi;
    delta.min(two_pi - delta)
}

/// A joint angle bundled with its sine and cosine.
///
/// The cached values are derived once from the angle. Post-hoc adjustments
/// (adding π, reflecting an arcsine root) update all three together so
/// the trigonometric values always belong to the angle that carries them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AngleSolution<T = f64> {
    angle: T,
    sin: T,
    cos: T,
}

impl<T: RealField + Copy> AngleSolution<T> {
    pub fn new(angle: T) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self { angle, sin, cos }
    }

    /// Build from parts that are already known to be consistent.
    pub(crate) fn from_parts(angle: T, sin: T, cos: T) -> Self {
        Self { angle, sin, cos }
    }

    pub fn zero() -> Self {
        Self::from_parts(T::zero(), T::zero(), T::one())
    }

    pub fn angle(&self) -> T {
        self.angle
    }

    pub fn sin(&self) -> T {
        self.sin
    }

    pub fn cos(&self) -> T {
        self.cos
    }

    /// The second root of a tangent inversion: `angle + π`.
    /// Sine and cosine flip sign exactly instead of being recomputed.
    pub fn shifted_by_pi(self) -> Self {
        Self::from_parts(self.angle + T::pi(), -self.sin, -self.cos)
    }

    /// The second root of a sine inversion.
    ///
    /// Non-negative principal values reflect to `π - angle`, negative ones
    /// to `-π - angle`. The sine is unchanged and the cosine flips.
    pub fn reflected(self) -> Self {
        let angle = if self.angle >= T::zero() {
            T::pi() - self.angle
        } else {
            -T::pi() - self.angle
        };
        Self::from_parts(angle, self.sin, -self.cos)
    }

    /// Same direction with the angle wrapped into `[-π, π)`.
    pub fn wrapped(self) -> Self {
        Self::from_parts(wrap_angle(self.angle), self.sin, self.cos)
    }
}
