/// Regression layer: kernels, local polynomial fits, and bandwidth selection.
///
/// Architecture:
/// ```text
///   training xs / ys + query x0
///        │
///        ▼
///   ┌──────────┐
///   │  kernel   │  distance → relative weight in [0, 1]
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │   fit     │  weighted least squares (QR) → LocalFit at x0
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ bandwidth │  leave-one-out scoring of candidate bandwidths
///   └───────────┘
/// ```

pub mod bandwidth;
pub mod error;
pub mod fit;
pub mod kernel;

pub use error::FitError;
pub use fit::{LocalFit, LocalRegression};
pub use kernel::Kernel;
