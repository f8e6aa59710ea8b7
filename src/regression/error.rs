use thiserror::Error;

/// Everything that can go wrong while fitting a local polynomial.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FitError {
    #[error("no training points")]
    EmptyInput,

    #[error("x has {x_len} values but y has {y_len}")]
    MismatchedInputs { x_len: usize, y_len: usize },

    #[error("non-finite value: {0}")]
    NonFinite(String),

    #[error("bandwidth must be positive and finite, got {0}")]
    InvalidBandwidth(f64),

    #[error("no training points inside the kernel window at x = {x0:.4} (bandwidth {bandwidth:.4})")]
    NoSupport { x0: f64, bandwidth: f64 },

    #[error("weighted least squares system is singular at x = {x0:.4}")]
    Singular { x0: f64 },

    #[error("no candidate bandwidth could predict every held-out point")]
    NoValidBandwidth,
}

impl FitError {
    /// Whether the failure is tied to a single query point rather than to
    /// the training data or parameters.
    pub fn is_local(&self) -> bool {
        matches!(self, FitError::NoSupport { .. } | FitError::Singular { .. })
    }
}
