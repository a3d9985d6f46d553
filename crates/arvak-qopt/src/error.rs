//! Error types for the optimisation crate.

use thiserror::Error;

/// Errors produced by the quantum-inspired optimisers.
///
/// Every variant is fatal and is returned before any statevector is
/// allocated. Numerical collapse during evolution is *not* an error: it is
/// recovered in place (see [`crate::state::Normalization::Recovered`]).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QoptError {
    /// The problem definition is structurally unusable.
    #[error("invalid problem: {0}")]
    InvalidProblem(String),

    /// A statevector was requested with no amplitudes or more than
    /// [`MAX_DIMENSIONS`](crate::state::MAX_DIMENSIONS).
    #[error("statevector dimension must lie in [1, 2^20], got {0}")]
    InvalidDimension(usize),

    /// An algorithm parameter lies outside its admissible range.
    #[error("parameter `{name}` out of range ({value}): {reason}")]
    ParameterOutOfRange {
        /// Parameter name as it appears in the configuration.
        name: &'static str,
        /// The offending value, rendered for display.
        value: String,
        /// What the admissible range is.
        reason: &'static str,
    },

    /// A problem or configuration file could not be parsed.
    #[error("configuration error: {0}")]
    Config(String),

    /// A problem or configuration file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl QoptError {
    pub(crate) fn out_of_range(
        name: &'static str,
        value: impl std::fmt::Display,
        reason: &'static str,
    ) -> Self {
        QoptError::ParameterOutOfRange {
            name,
            value: value.to_string(),
            reason,
        }
    }
}

/// Result type for optimisation operations.
pub type QoptResult<T> = Result<T, QoptError>;
