//! Empirical convergence-rate estimation from `(h, E)` samples.
use itertools::Itertools;
use nalgebra::RealField;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single measurement of a convergence study: the mesh size `h` and the scalar error
/// magnitude `E` obtained at that resolution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ErrorSample<T> {
    pub h: T,
    pub error: T,
}

impl<T> ErrorSample<T> {
    pub fn new(h: T, error: T) -> Self {
        Self { h, error }
    }
}

/// Invalid input to rate estimation that would otherwise produce NaN or garbage rates.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RateEstimationError {
    /// The `h` sequence is not strictly decreasing (or contains a non-positive value),
    /// so the rate formula is meaningless.
    #[error("step size h[{index}] is not a strict decrease; rates are undefined")]
    NonDecreasingStepSize { index: usize },
    /// An error sample is zero, negative or non-finite. A zero error typically means exact
    /// recovery of the solution, for which the rate is undefined rather than infinite.
    #[error("error sample E[{index}] is zero, negative or non-finite; rate is undefined")]
    DegenerateSample { index: usize },
}

/// Estimate empirical convergence rates from an ordered sequence of samples with strictly
/// decreasing `h`.
///
/// For each consecutive pair the rate is the closed-form solution of
/// $E_{i-1} = C h_{i-1}^r$, $E_i = C h_i^r$ for `r`:
///
/// $$ r_i = \frac{\ln(E_i / E_{i-1})}{\ln(h_i / h_{i-1})} $$
///
/// Returns `n - 1` rates for `n` samples (and no rates for fewer than two samples). Early
/// entries of the sequence may be noisy on coarse, pre-asymptotic meshes; rates are expected
/// to stabilize toward the theoretical order as `h` decreases.
pub fn estimate_convergence_rates<T>(samples: &[ErrorSample<T>]) -> Result<Vec<T>, RateEstimationError>
where
    T: RealField,
{
    for (index, sample) in samples.iter().enumerate() {
        if !sample.h.is_finite() || sample.h <= T::zero() {
            return Err(RateEstimationError::NonDecreasingStepSize { index });
        }
        if !sample.error.is_finite() || sample.error <= T::zero() {
            return Err(RateEstimationError::DegenerateSample { index });
        }
        if index > 0 && sample.h >= samples[index - 1].h {
            return Err(RateEstimationError::NonDecreasingStepSize { index });
        }
    }

    let rates = samples
        .iter()
        .tuple_windows()
        .map(|(coarse, fine)| {
            let error_ratio = fine.error.clone() / coarse.error.clone();
            let h_ratio = fine.h.clone() / coarse.h.clone();
            error_ratio.ln() / h_ratio.ln()
        })
        .collect();
    Ok(rates)
}
