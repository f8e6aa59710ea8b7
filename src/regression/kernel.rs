use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::FitError;

// ---------------------------------------------------------------------------
// Kernel profiles
// ---------------------------------------------------------------------------

/// Kernel (weight) function used to weight training points by distance.
///
/// All profiles are un-normalized with `K(0) = 1`; only relative weights
/// matter for a weighted least squares fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kernel {
    /// `exp(-u² / 2)`, infinite support.
    #[default]
    Gaussian,
    /// `1 - u²` on `|u| <= 1`.
    Epanechnikov,
    /// `(1 - |u|³)³` on `|u| <= 1`.
    Tricube,
    /// `1` on `|u| <= 1`.
    Uniform,
}

impl Kernel {
    pub const ALL: [Kernel; 4] = [
        Kernel::Gaussian,
        Kernel::Epanechnikov,
        Kernel::Tricube,
        Kernel::Uniform,
    ];

    /// Evaluate the kernel profile at the scaled distance `u`.
    pub fn evaluate(self, u: f64) -> f64 {
        let a = u.abs();
        match self {
            Kernel::Gaussian => (-0.5 * u * u).exp(),
            _ if a > 1.0 => 0.0,
            Kernel::Epanechnikov => 1.0 - u * u,
            Kernel::Tricube => {
                let t = 1.0 - a * a * a;
                t * t * t
            }
            Kernel::Uniform => 1.0,
        }
    }

    /// Whether the kernel is zero outside `|u| <= 1`.
    pub fn is_compact(self) -> bool {
        !matches!(self, Kernel::Gaussian)
    }

    /// Relative weight of every `xs[i]` for a fit centred at `x0`.
    ///
    /// The result is rescaled so the largest weight is exactly 1. The
    /// Gaussian is evaluated relative to the nearest point, so the nearest
    /// point always keeps weight 1 however small the bandwidth is.
    pub fn weights(self, xs: &[f64], x0: f64, bandwidth: f64) -> Result<Vec<f64>, FitError> {
        if !bandwidth.is_finite() || bandwidth <= 0.0 {
            return Err(FitError::InvalidBandwidth(bandwidth));
        }
        if xs.is_empty() {
            return Err(FitError::EmptyInput);
        }

        let mut weights: Vec<f64> = match self {
            Kernel::Gaussian => {
                let u_min = xs
                    .iter()
                    .map(|&x| ((x - x0) / bandwidth).abs())
                    .fold(f64::INFINITY, f64::min);
                xs.iter()
                    .map(|&x| {
                        let u = ((x - x0) / bandwidth).abs();
                        (-0.5 * (u - u_min) * (u + u_min)).exp()
                    })
                    .collect()
            }
            _ => xs
                .iter()
                .map(|&x| self.evaluate((x - x0) / bandwidth))
                .collect(),
        };

        let max = weights.iter().copied().fold(0.0_f64, f64::max);
        if max <= 0.0 || !max.is_finite() {
            return Err(FitError::NoSupport { x0, bandwidth });
        }
        if max != 1.0 {
            for w in &mut weights {
                *w /= max;
            }
        }
        Ok(weights)
    }
}

impl fmt::Display for Kernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Kernel::Gaussian => "Gaussian",
            Kernel::Epanechnikov => "Epanechnikov",
            Kernel::Tricube => "Tricube",
            Kernel::Uniform => "Uniform",
        };
        f.write_str(name)
    }
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn prop_profiles_are_symmetric(u in -5.0f64..5.0) {
            for kernel in Kernel::ALL {
                prop_assert_eq!(kernel.evaluate(u), kernel.evaluate(-u));
            }
        }

        #[test]
        fn prop_weights_in_unit_interval(
            xs in prop::collection::vec(-10.0f64..10.0, 1..30),
            x0 in -10.0f64..10.0,
            h in 0.01f64..5.0,
        ) {
            let w = Kernel::Gaussian.weights(&xs, x0, h).unwrap();
            prop_assert!(w.iter().all(|&wi| (0.0..=1.0).contains(&wi)));
            prop_assert!(w.iter().any(|&wi| wi == 1.0));
        }
    }
}
