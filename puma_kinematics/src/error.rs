// Error types for the kinematics crate.
//
// Numeric degeneracy inside the solver is never an error; it is absorbed by
// substitution and surfaces as an invalid candidate. These errors cover
// structural misuse only: building a chain or solver from bad parameters.

use thiserror::Error;

/// Errors raised when chain settings or solver configuration are rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    /// A link length is zero, negative, NaN or infinite.
    #[error("{name} must be a positive finite length, got {value}")]
    InvalidLength {
        /// Which length was rejected.
        name: &'static str,
        /// The rejected value, formatted.
        value: String,
    },

    /// A solver tolerance is zero, negative, NaN or infinite.
    #[error("invalid solver configuration: {0}")]
    InvalidSolverConfig(String),
}

impl SettingsError {
    pub(crate) fn invalid_length(name: &'static str, value: impl std::fmt::Display) -> Self {
        Self::InvalidLength {
            name,
            value: value.to_string(),
        }
    }
}
